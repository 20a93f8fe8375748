//! Orphan tokens: declared in the document, referenced by no consumer.
//!
//! A token counts as used if any scanner claims it:
//! - translator: the flat name contains a spacing keyword (it becomes a CSS rule)
//! - stylesheets: the flat name appears as an identifier (`$name`, `--name`, bare)
//! - renderers: the dotted path or flat name is a string literal, or every path
//!   segment is (chained dictionary access such as `t["roleBox"]["docx"]`)

use std::collections::{BTreeSet, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::tokens::document::TokenLeaf;
use crate::tokens::manifest::SourceFile;
use crate::tokens::spacing::is_spacing_key;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9_][A-Za-z0-9_-]*").unwrap());
static STRING_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"\\\n]*)"|'([^'\\\n]*)'"#).unwrap());

/// Answers whether one class of consumer references a token.
pub trait UsageScanner {
    fn name(&self) -> &str;
    fn uses(&self, leaf: &TokenLeaf) -> bool;
}

/// Spacing tokens are always consumed by the spacing-rule translator.
pub struct SpacingKeywordScanner;

impl UsageScanner for SpacingKeywordScanner {
    fn name(&self) -> &str {
        "translator"
    }

    fn uses(&self, leaf: &TokenLeaf) -> bool {
        is_spacing_key(&leaf.flat_name)
    }
}

/// Identifier occurrences across hand-written stylesheets.
pub struct StylesheetScanner {
    identifiers: HashSet<String>,
}

impl StylesheetScanner {
    pub fn new(sources: &[SourceFile]) -> Self {
        let identifiers = sources
            .iter()
            .flat_map(|source| IDENTIFIER.find_iter(&source.text))
            .map(|m| m.as_str().to_string())
            .collect();
        StylesheetScanner { identifiers }
    }
}

impl UsageScanner for StylesheetScanner {
    fn name(&self) -> &str {
        "stylesheets"
    }

    fn uses(&self, leaf: &TokenLeaf) -> bool {
        self.identifiers.contains(&leaf.flat_name)
    }
}

/// String literals in renderer sources, kept per file so segment matches stay local.
pub struct RendererScanner {
    literals_per_file: Vec<HashSet<String>>,
}

impl RendererScanner {
    pub fn new(sources: &[SourceFile]) -> Self {
        let literals_per_file = sources
            .iter()
            .map(|source| {
                STRING_LITERAL
                    .captures_iter(&source.text)
                    .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
                    .map(|m| m.as_str().to_string())
                    .collect()
            })
            .collect();
        RendererScanner { literals_per_file }
    }
}

impl UsageScanner for RendererScanner {
    fn name(&self) -> &str {
        "renderers"
    }

    fn uses(&self, leaf: &TokenLeaf) -> bool {
        self.literals_per_file.iter().any(|literals| {
            literals.contains(&leaf.path)
                || literals.contains(&leaf.flat_name)
                || leaf.segments().all(|segment| literals.contains(segment))
        })
    }
}

/// Returns the dotted paths of leaves no scanner claims. Each orphan appears once.
pub fn find_orphans(
    leaves: &[TokenLeaf],
    translator: &dyn UsageScanner,
    stylesheets: &dyn UsageScanner,
    renderers: &dyn UsageScanner,
) -> BTreeSet<String> {
    let scanners = [translator, stylesheets, renderers];
    leaves
        .iter()
        .filter(|leaf| !scanners.iter().any(|scanner| scanner.uses(leaf)))
        .map(|leaf| leaf.path.clone())
        .collect()
}
