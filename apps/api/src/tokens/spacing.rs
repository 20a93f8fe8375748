//! Spacing rules: the subset of tokens the layout-compatibility stylesheet consumes.
//!
//! Only spacing tokens become CSS rules. Colors, fonts and sizes stay variables.
//!
//! # Derivation
//! `role-description-margin-top: 4pt` → `.role-description-text { margin-top: 4pt }`
//! 1. Match the longest known property suffix (`margin-top` beats `margin`).
//! 2. Otherwise `-spacing` → `margin-bottom`, `-indent` → `margin-left`.
//! 3. Map the remaining base name through the selector table, else `.<base>`.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::tokens::flatten::render_value;

/// Substrings that mark a flat token name as spacing.
pub const SPACING_KEYWORDS: &[&str] = &[
    "margin",
    "padding",
    "gap",
    "line-height",
    "spacing",
    "indent",
    "block",
];

/// Recognised property suffixes, longest first so the most specific wins.
const PROPERTY_SUFFIXES: &[&str] = &[
    "padding-bottom",
    "letter-spacing",
    "margin-bottom",
    "padding-right",
    "padding-left",
    "margin-right",
    "padding-top",
    "line-height",
    "margin-left",
    "column-gap",
    "margin-top",
    "row-gap",
    "padding",
    "margin",
    "gap",
];

/// Fallback suffixes used only when no property suffix matches.
const SPECIAL_SUFFIXES: &[(&str, &str)] = &[("-spacing", "margin-bottom"), ("-indent", "margin-left")];

/// Token base names whose selector is not simply `.<base>`.
const BASE_SELECTORS: &[(&str, &str)] = &[
    ("role-description", ".role-description-text"),
    ("paragraph", "p"),
    ("body", "body"),
    ("heading", "h2"),
    ("section", ".resume-section"),
    ("section-header", ".section-header"),
    ("role-box", ".role-box"),
    ("role-title", ".role-title"),
    ("bullet", ".bullet-point"),
    ("bullet-list", "ul.bullets"),
    ("contact", ".contact-info"),
    ("summary", ".summary-text"),
    ("skills", ".skills-list"),
    ("name", ".candidate-name"),
];

/// `selector → property → value`. Sorted so serialized output is stable.
pub type RuleMap = BTreeMap<String, BTreeMap<String, String>>;

/// Selector and CSS property derived from a single token name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedRule {
    pub selector: String,
    pub property: &'static str,
}

/// All spacing rules derived from one token document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpacingRuleSet {
    pub rules: RuleMap,
    /// Spacing tokens that produced no rule (no recognisable suffix, or a null value).
    pub skipped: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Extraction and derivation
// ────────────────────────────────────────────────────────────────────────────

/// True when a flat token name contains any spacing keyword.
pub fn is_spacing_key(key: &str) -> bool {
    SPACING_KEYWORDS.iter().any(|kw| key.contains(kw))
}

/// Keeps only spacing tokens, in source order.
pub fn extract_spacing(tokens: &Map<String, Value>) -> Map<String, Value> {
    tokens
        .iter()
        .filter(|(key, _)| is_spacing_key(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Derives the selector/property pair for a flat token name.
/// Returns `None` when the name carries no recognisable spacing suffix; callers skip it.
pub fn derive_rule(key: &str) -> Option<DerivedRule> {
    let (base, property) = split_property(key)?;
    if base.is_empty() {
        return None;
    }
    Some(DerivedRule {
        selector: selector_for(base),
        property,
    })
}

/// Maps a token base name to its CSS selector.
pub fn selector_for(base: &str) -> String {
    BASE_SELECTORS
        .iter()
        .find(|(name, _)| *name == base)
        .map(|(_, selector)| selector.to_string())
        .unwrap_or_else(|| format!(".{base}"))
}

fn split_property(key: &str) -> Option<(&str, &'static str)> {
    for &suffix in PROPERTY_SUFFIXES {
        if key == suffix {
            return Some(("", suffix));
        }
        if let Some(base) = key.strip_suffix(suffix).and_then(|b| b.strip_suffix('-')) {
            return Some((base, suffix));
        }
    }

    SPECIAL_SUFFIXES
        .iter()
        .find_map(|&(suffix, property)| key.strip_suffix(suffix).map(|base| (base, property)))
}

/// Builds the spacing rule set from a flat token mapping.
///
/// Non-spacing tokens are ignored. When two tokens land on the same selector/property
/// the later one in document order wins, mirroring the cascade.
pub fn build_rule_set(flat: &Map<String, Value>) -> SpacingRuleSet {
    let mut set = SpacingRuleSet::default();

    for (key, value) in &extract_spacing(flat) {
        let (Some(rule), Some(rendered)) = (derive_rule(key), render_value(value)) else {
            debug!("Spacing token '{key}' yields no CSS rule");
            set.skipped.push(key.clone());
            continue;
        };

        let properties = set.rules.entry(rule.selector.clone()).or_default();
        if let Some(previous) = properties.insert(rule.property.to_string(), rendered.clone()) {
            if previous != rendered {
                warn!(
                    "Token '{key}' overrides {} {{ {}: {previous} }} with {rendered}",
                    rule.selector, rule.property
                );
            }
        }
    }

    set
}
