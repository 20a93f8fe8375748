//! CSS length → DOCX paragraph spacing.
//!
//! Word measures spacing and indentation in twips (1/20 pt). Line spacing is either
//! `auto` in 240ths of a line or an exact height in twips.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::tokens::spacing::RuleMap;

pub const TWIPS_PER_PT: f64 = 20.0;
const TWIPS_PER_PX: f64 = 15.0;
const TWIPS_PER_IN: f64 = 1440.0;
const TWIPS_PER_CM: f64 = 567.0;
const TWIPS_PER_MM: f64 = 56.7;
/// `w:spacing w:lineRule="auto"` unit: 240 = single spacing.
const AUTO_LINE_UNITS: f64 = 240.0;

static LENGTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-?(?:\d+(?:\.\d+)?|\.\d+))\s*([a-z%]*)$").unwrap());

/// Line spacing rule for a DOCX paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", content = "value", rename_all = "snake_case")]
pub enum DocxLine {
    /// Proportional spacing in 240ths of a line.
    Auto(i64),
    /// Fixed line height in twips.
    Exact(i64),
}

/// Paragraph spacing for one selector, in twips.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocxParagraphSpacing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_before: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_after: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent_left: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent_right: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<DocxLine>,
}

impl DocxParagraphSpacing {
    fn is_empty(&self) -> bool {
        *self == DocxParagraphSpacing::default()
    }
}

pub type DocxRuleMap = BTreeMap<String, DocxParagraphSpacing>;

fn parse_length(value: &str) -> Option<(f64, &str)> {
    let caps = LENGTH.captures(value.trim())?;
    let number = caps.get(1)?.as_str().parse::<f64>().ok()?;
    let unit = caps.get(2).map_or("", |m| m.as_str());
    Some((number, unit))
}

/// Converts a single CSS length to twips. `em`/`rem` resolve against `base_font_pt`.
/// Unitless values other than `0`, percentages and keywords have no twips form.
pub fn to_twips(value: &str, base_font_pt: f32) -> Option<i64> {
    let (number, unit) = parse_length(value)?;
    let factor = match unit {
        "pt" => TWIPS_PER_PT,
        "px" => TWIPS_PER_PX,
        "in" => TWIPS_PER_IN,
        "cm" => TWIPS_PER_CM,
        "mm" => TWIPS_PER_MM,
        "em" | "rem" => f64::from(base_font_pt) * TWIPS_PER_PT,
        "" if number == 0.0 => return Some(0),
        _ => return None,
    };
    Some((number * factor).round() as i64)
}

/// Converts a CSS `line-height`. Unitless multipliers become `Auto`, lengths `Exact`.
pub fn line_spacing(value: &str, base_font_pt: f32) -> Option<DocxLine> {
    let (number, unit) = parse_length(value)?;
    if unit.is_empty() {
        return Some(DocxLine::Auto((number * AUTO_LINE_UNITS).round() as i64));
    }
    to_twips(value, base_font_pt).map(DocxLine::Exact)
}

/// Box sides in DOCX field order: before, after, left indent, right indent.
const SIDES: [&str; 4] = ["top", "bottom", "left", "right"];

/// Resolves one box family (`margin` or `padding`) to per-side twips the way the
/// cascade does: the shorthand applies first and a side-specific property replaces it.
/// A side whose winning value has no twips form stays unset.
fn resolve_box(
    selector: &str,
    properties: &BTreeMap<String, String>,
    family: &str,
    base_font_pt: f32,
) -> [Option<i64>; 4] {
    let mut sides = [None; 4];

    if let Some(value) = properties.get(family) {
        let twips = to_twips(value, base_font_pt);
        if twips.is_none() {
            debug!("No DOCX twips for {selector} {family}: {value}");
        }
        sides = [twips; 4];
    }

    for (slot, side) in sides.iter_mut().zip(SIDES) {
        let property = format!("{family}-{side}");
        if let Some(value) = properties.get(&property) {
            *slot = to_twips(value, base_font_pt);
            if slot.is_none() {
                debug!("No DOCX twips for {selector} {property}: {value}");
            }
        }
    }

    sides
}

fn combine(margin: Option<i64>, padding: Option<i64>) -> Option<i64> {
    match (margin, padding) {
        (None, None) => None,
        _ => Some(margin.unwrap_or(0) + padding.unwrap_or(0)),
    }
}

/// Translates screen spacing rules into DOCX paragraph spacing.
///
/// Within a family the side-specific property overrides the shorthand. Margin and
/// padding on the same side then add up, since a DOCX paragraph has no box model.
/// Gap-family and letter-spacing properties have no paragraph counterpart.
pub fn docx_rules(rules: &RuleMap, base_font_pt: f32) -> DocxRuleMap {
    let mut docx = DocxRuleMap::new();

    for (selector, properties) in rules {
        let mut spacing = DocxParagraphSpacing::default();

        if let Some(value) = properties.get("line-height") {
            spacing.line = line_spacing(value, base_font_pt);
            if spacing.line.is_none() {
                debug!("No DOCX line spacing for {selector} line-height: {value}");
            }
        }

        let margin = resolve_box(selector, properties, "margin", base_font_pt);
        let padding = resolve_box(selector, properties, "padding", base_font_pt);
        spacing.space_before = combine(margin[0], padding[0]);
        spacing.space_after = combine(margin[1], padding[1]);
        spacing.indent_left = combine(margin[2], padding[2]);
        spacing.indent_right = combine(margin[3], padding[3]);

        if !spacing.is_empty() {
            docx.insert(selector.clone(), spacing);
        }
    }

    docx
}
