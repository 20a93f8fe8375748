//! Bullet metric normalization. Each tailored bullet leaves stating its impact once.
//!
//! A bullet leaving this module carries either at least one concrete number or exactly
//! one `??` placeholder standing in for a metric the user still has to supply. Never both,
//! never neither.
//!
//! # Rules (applied in order)
//! 1. Pre-pass: a placeholder glued to a word (`across??`, `??unit`) is separated by a space.
//! 2. Digits present → every placeholder is dropped.
//! 3. No digits, no placeholder → one `?? %` is injected after the first ` by `, ` to ` or
//!    ` of ` (in that priority), else ` by ?? %` is appended before trailing `.`/`!`/`?`.
//! 4. No digits, several placeholders → only the leftmost survives.
//! 5. Post-pass: whitespace runs collapse, edges are trimmed, length is capped at 130 chars.
//!
//! The `?? %` shape is consumed verbatim by the document renderer. Keep it literal.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Reserved marker for a metric the user has not supplied yet.
pub const PLACEHOLDER: &str = "??";

/// Hard cap on a normalized bullet, in characters.
pub const MAX_BULLET_CHARS: usize = 130;

/// Injection pivots, highest priority first.
const PIVOTS: &[&str] = &[" by ", " to ", " of "];

/// Appended when no pivot phrase exists.
const FALLBACK_SUFFIX: &str = " by ?? %";

const TERMINAL_PUNCTUATION: &[char] = &['.', '!', '?'];

static DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").unwrap());
static GLUED_BEFORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w)\?\?").unwrap());
static GLUED_AFTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?\?(\w)").unwrap());
static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").unwrap());
static MULTI_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// Why the normalizer touched a bullet. Advisory only; callers may log or surface it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NormalizationReason {
    /// A placeholder was glued to an adjacent word and got separated.
    GluedPlaceholder,
    /// The bullet already states a number, so placeholders were removed.
    RedundantPlaceholder,
    /// A placeholder was injected right after a pivot word (`by`, `to`, `of`).
    InjectedAtPivot { pivot: String },
    /// No pivot found; ` by ?? %` was appended.
    InjectedFallback,
    /// Several placeholders and no number; all but the leftmost were removed.
    DuplicatePlaceholders { removed: usize },
    /// Bullet exceeded the character cap and was cut.
    Truncated,
    /// The cut destroyed the bullet's only metric, so a fallback placeholder was re-appended.
    ReanchoredPlaceholder,
}

/// Normalized bullet text plus every change applied to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedBullet {
    pub text: String,
    pub changes: Vec<NormalizationReason>,
}

// ────────────────────────────────────────────────────────────────────────────
// Public API
// ────────────────────────────────────────────────────────────────────────────

/// Normalizes a bullet so it holds exactly one metric statement. Accepts any input.
pub fn normalize(text: &str) -> String {
    normalize_with_report(text).text
}

/// Same as [`normalize`], also returning the reasons for each modification.
pub fn normalize_with_report(text: &str) -> NormalizedBullet {
    let mut changes = Vec::new();

    // Must run before the census: a glued placeholder is otherwise invisible to later passes.
    let mut current = separate_glued_placeholders(text);
    if current != text {
        changes.push(NormalizationReason::GluedPlaceholder);
    }

    let has_digit = DIGIT.is_match(&current);
    let placeholders = current.matches(PLACEHOLDER).count();

    match (has_digit, placeholders) {
        (true, 0) | (false, 1) => {}
        (true, _) => {
            current = strip_placeholders(&current);
            changes.push(NormalizationReason::RedundantPlaceholder);
        }
        (false, 0) => {
            let (injected, reason) = inject_placeholder(&current);
            current = injected;
            changes.push(reason);
        }
        (false, n) => {
            current = keep_first_placeholder(&current);
            changes.push(NormalizationReason::DuplicatePlaceholders { removed: n - 1 });
        }
    }

    current = collapse_whitespace(&current);

    if current.chars().count() > MAX_BULLET_CHARS {
        let (cut, reanchored) = fit_to_limit(&current);
        current = cut;
        changes.push(NormalizationReason::Truncated);
        if reanchored {
            changes.push(NormalizationReason::ReanchoredPlaceholder);
        }
    }

    for reason in &changes {
        debug!(original = text, normalized = %current, reason = ?reason, "Bullet normalized");
    }

    NormalizedBullet {
        text: current,
        changes,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

fn separate_glued_placeholders(text: &str) -> String {
    let spaced = GLUED_BEFORE.replace_all(text, "$1 ??");
    GLUED_AFTER.replace_all(&spaced, "?? $1").into_owned()
}

fn strip_placeholders(text: &str) -> String {
    let removed = text.replace(PLACEHOLDER, "");
    MULTI_SPACE
        .replace_all(&removed, " ")
        .trim_matches(|c: char| matches!(c, ' ' | ',' | '.' | ';'))
        .to_string()
}

fn inject_placeholder(text: &str) -> (String, NormalizationReason) {
    let trimmed = text.trim();

    for pivot in PIVOTS {
        if let Some(idx) = trimmed.find(pivot) {
            let after = idx + pivot.len();
            let injected = format!("{}{pivot}?? % {}", &trimmed[..idx], &trimmed[after..]);
            return (
                injected,
                NormalizationReason::InjectedAtPivot {
                    pivot: pivot.trim().to_string(),
                },
            );
        }
    }

    let injected = match trimmed.chars().last() {
        Some(last) if TERMINAL_PUNCTUATION.contains(&last) => {
            let body = &trimmed[..trimmed.len() - last.len_utf8()];
            format!("{body}{FALLBACK_SUFFIX}{last}")
        }
        _ => format!("{trimmed}{FALLBACK_SUFFIX}"),
    };
    (injected, NormalizationReason::InjectedFallback)
}

fn keep_first_placeholder(text: &str) -> String {
    match text.find(PLACEHOLDER) {
        Some(first) => {
            let head_end = first + PLACEHOLDER.len();
            let tail = text[head_end..].replace(PLACEHOLDER, "");
            format!("{}{tail}", &text[..head_end])
        }
        None => text.to_string(),
    }
}

fn collapse_whitespace(text: &str) -> String {
    MULTI_WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Cuts to the character cap. Returns `true` when the cut removed the bullet's only
/// metric and a fallback placeholder had to be re-appended.
fn fit_to_limit(text: &str) -> (String, bool) {
    let cut: String = text.chars().take(MAX_BULLET_CHARS).collect();
    let cut = cut.trim_end();

    if DIGIT.is_match(cut) || cut.matches(PLACEHOLDER).count() == 1 {
        return (cut.to_string(), false);
    }

    // The half of a severed placeholder may still dangle at the end.
    let body = collapse_whitespace(&cut.replace(PLACEHOLDER, ""));
    let body = body.trim_end_matches(|c: char| c == '?' || c.is_whitespace());
    let room = MAX_BULLET_CHARS - FALLBACK_SUFFIX.chars().count();
    let body: String = body.chars().take(room).collect();

    (format!("{}{FALLBACK_SUFFIX}", body.trim_end()), true)
}
