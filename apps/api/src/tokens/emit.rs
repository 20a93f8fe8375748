//! Generated artifacts: variable files, spacing rules and their DOCX twin.
//!
//! Every artifact is a pure function of the token document, so `render_artifacts` run
//! twice on the same document yields byte-identical files. That property is what the
//! drift check relies on.

use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::errors::TokenError;
use crate::tokens::document::TokenDocument;
use crate::tokens::flatten::render_value;
use crate::tokens::spacing::{build_rule_set, RuleMap, SpacingRuleSet};
use crate::tokens::units::{docx_rules, DocxRuleMap};

pub const SCSS_VARIABLES_FILE: &str = "_tokens.scss";
pub const CSS_VARIABLES_FILE: &str = "tokens.css";
pub const SPACING_RULES_FILE: &str = "spacing_rules.json";
pub const SPACING_STYLESHEET_FILE: &str = "spacing.generated.css";
pub const DOCX_SPACING_FILE: &str = "docx_spacing.json";

/// Everything derived from one token document in a single run.
#[derive(Debug, Clone, Serialize)]
pub struct Translation {
    #[serde(skip)]
    pub source_name: String,
    #[serde(skip)]
    pub flat: Map<String, Value>,
    /// Live HTML preview rules.
    pub screen: RuleMap,
    /// Print rules. Same rules as `screen`, emitted under `@media print`.
    pub print: RuleMap,
    pub docx: DocxRuleMap,
    pub skipped: Vec<String>,
}

impl Translation {
    pub fn from_document(document: &TokenDocument, base_font_pt: f32) -> Self {
        let flat = document.flat();
        let SpacingRuleSet { rules, skipped } = build_rule_set(&flat);
        let docx = docx_rules(&rules, base_font_pt);

        Translation {
            source_name: document.source_name(),
            flat,
            print: rules.clone(),
            screen: rules,
            docx,
            skipped,
        }
    }
}

/// A generated file, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: &'static str,
    pub contents: String,
}

/// How an on-disk artifact differs from a fresh render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftStatus {
    Missing,
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drift {
    pub path: PathBuf,
    pub status: DriftStatus,
}

// ────────────────────────────────────────────────────────────────────────────
// Rendering
// ────────────────────────────────────────────────────────────────────────────

fn line_header(source: &str) -> String {
    format!(
        "// AUTO-GENERATED from {source} by `tokens build`. DO NOT EDIT.\n\
         // Edit {source} and rerun `tokens build` instead.\n"
    )
}

fn block_header(source: &str) -> String {
    format!(
        "/* AUTO-GENERATED from {source} by `tokens build`. DO NOT EDIT. */\n\
         /* Edit {source} and rerun `tokens build` instead. */\n"
    )
}

/// Renders `(name, value)` pairs for every flat token that has a stylesheet form.
fn variable_lines(flat: &Map<String, Value>) -> Vec<(&str, String)> {
    flat.iter()
        .filter_map(|(name, value)| match render_value(value) {
            Some(rendered) => Some((name.as_str(), rendered)),
            None => {
                warn!("Token '{name}' has no stylesheet value and is not emitted");
                None
            }
        })
        .collect()
}

pub fn render_scss_variables(translation: &Translation) -> String {
    let mut out = line_header(&translation.source_name);
    out.push('\n');
    for (name, value) in variable_lines(&translation.flat) {
        let _ = writeln!(out, "${name}: {value};");
    }
    out
}

pub fn render_css_variables(translation: &Translation) -> String {
    let mut out = block_header(&translation.source_name);
    out.push_str("\n:root {\n");
    for (name, value) in variable_lines(&translation.flat) {
        let _ = writeln!(out, "  --{name}: {value};");
    }
    out.push_str("}\n");
    out
}

fn write_rules(out: &mut String, rules: &RuleMap, indent: &str) {
    for (selector, properties) in rules {
        let _ = writeln!(out, "{indent}{selector} {{");
        for (property, value) in properties {
            let _ = writeln!(out, "{indent}  {property}: {value};");
        }
        let _ = writeln!(out, "{indent}}}");
    }
}

pub fn render_spacing_stylesheet(translation: &Translation) -> String {
    let mut out = block_header(&translation.source_name);
    out.push('\n');
    write_rules(&mut out, &translation.screen, "");
    out.push_str("\n@media print {\n");
    write_rules(&mut out, &translation.print, "  ");
    out.push_str("}\n");
    out
}

fn pretty_json<T: Serialize>(value: &T) -> String {
    // Maps of strings and integers always serialize.
    let mut json = serde_json::to_string_pretty(value).unwrap_or_default();
    json.push('\n');
    json
}

/// Renders every artifact in a fixed order.
pub fn render_artifacts(translation: &Translation) -> Vec<Artifact> {
    vec![
        Artifact {
            file_name: SCSS_VARIABLES_FILE,
            contents: render_scss_variables(translation),
        },
        Artifact {
            file_name: CSS_VARIABLES_FILE,
            contents: render_css_variables(translation),
        },
        Artifact {
            file_name: SPACING_RULES_FILE,
            contents: pretty_json(&translation.screen),
        },
        Artifact {
            file_name: SPACING_STYLESHEET_FILE,
            contents: render_spacing_stylesheet(translation),
        },
        Artifact {
            file_name: DOCX_SPACING_FILE,
            contents: pretty_json(&translation.docx),
        },
    ]
}

// ────────────────────────────────────────────────────────────────────────────
// Disk
// ────────────────────────────────────────────────────────────────────────────

/// Writes every artifact into `out_dir`, overwriting previous output.
pub fn write_artifacts(out_dir: &Path, artifacts: &[Artifact]) -> Result<Vec<PathBuf>, TokenError> {
    fs::create_dir_all(out_dir).map_err(|e| TokenError::io(out_dir, e))?;

    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = out_dir.join(artifact.file_name);
        fs::write(&path, &artifact.contents).map_err(|e| TokenError::io(&path, e))?;
        info!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Compares a fresh render against what is on disk.
pub fn detect_drift(out_dir: &Path, artifacts: &[Artifact]) -> Result<Vec<Drift>, TokenError> {
    let mut drift = Vec::new();

    for artifact in artifacts {
        let path = out_dir.join(artifact.file_name);
        match fs::read_to_string(&path) {
            Ok(on_disk) if on_disk == artifact.contents => {}
            Ok(_) => drift.push(Drift {
                path,
                status: DriftStatus::Stale,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => drift.push(Drift {
                path,
                status: DriftStatus::Missing,
            }),
            Err(e) => return Err(TokenError::io(&path, e)),
        }
    }

    Ok(drift)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TOKENS: &str = r##"{
        "fontFamily": ["Inter", "sans-serif"],
        "roleDescription": { "marginTop": "2pt", "lineHeight": 1.15 },
        "roleBox": { "docx": { "borderColor": "#333333" }, "paddingLeft": "6px" },
        "unused": null
    }"##;

    fn translation() -> Translation {
        let doc = TokenDocument::parse("design_tokens.json", TOKENS).unwrap();
        Translation::from_document(&doc, 11.0)
    }

    #[test]
    fn test_scss_variables() {
        let scss = render_scss_variables(&translation());
        assert!(scss.starts_with("// AUTO-GENERATED from design_tokens.json"));
        assert!(scss.contains("DO NOT EDIT"));
        assert!(scss.contains("$font-family: Inter, sans-serif;\n"));
        assert!(scss.contains("$role-description-margin-top: 2pt;\n"));
        assert!(scss.contains("$role-box-docx-border-color: #333333;\n"));
        assert!(!scss.contains("unused"));
    }

    #[test]
    fn test_css_variables_root_block() {
        let css = render_css_variables(&translation());
        assert!(css.starts_with("/* AUTO-GENERATED"));
        assert!(css.contains(":root {\n  --font-family: Inter, sans-serif;\n"));
        assert!(css.contains("  --role-description-line-height: 1.15;\n"));
        assert!(css.ends_with("}\n"));
    }

    #[test]
    fn test_spacing_stylesheet_has_screen_and_print() {
        let css = render_spacing_stylesheet(&translation());
        assert!(css.contains(".role-description-text {\n  line-height: 1.15;\n  margin-top: 2pt;\n}\n"));
        assert!(css.contains("@media print {\n"));
        assert!(css.contains("  .role-box {\n    padding-left: 6px;\n  }\n"));
    }

    #[test]
    fn test_spacing_rules_json() {
        let artifacts = render_artifacts(&translation());
        let json = &artifacts
            .iter()
            .find(|a| a.file_name == SPACING_RULES_FILE)
            .unwrap()
            .contents;
        let parsed: Value = serde_json::from_str(json).unwrap();
        assert_eq!(parsed[".role-box"]["padding-left"], "6px");
        assert_eq!(parsed[".role-description-text"]["margin-top"], "2pt");
    }

    #[test]
    fn test_docx_spacing_json() {
        let artifacts = render_artifacts(&translation());
        let json = &artifacts
            .iter()
            .find(|a| a.file_name == DOCX_SPACING_FILE)
            .unwrap()
            .contents;
        let parsed: Value = serde_json::from_str(json).unwrap();
        assert_eq!(parsed[".role-description-text"]["space_before"], 40);
        assert_eq!(parsed[".role-description-text"]["line"]["rule"], "auto");
        assert_eq!(parsed[".role-description-text"]["line"]["value"], 276);
        assert_eq!(parsed[".role-box"]["indent_left"], 90);
    }

    #[test]
    fn test_render_is_byte_identical_across_runs() {
        let doc = TokenDocument::parse("design_tokens.json", TOKENS).unwrap();
        let first = render_artifacts(&Translation::from_document(&doc, 11.0));
        let second = render_artifacts(&Translation::from_document(&doc, 11.0));
        assert_eq!(first, second);
    }

    #[test]
    fn test_write_then_no_drift() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("generated");
        let artifacts = render_artifacts(&translation());

        let written = write_artifacts(&out, &artifacts).unwrap();
        assert_eq!(written.len(), 5);
        assert!(detect_drift(&out, &artifacts).unwrap().is_empty());
    }

    #[test]
    fn test_drift_reports_missing_and_stale() {
        let dir = TempDir::new().unwrap();
        let artifacts = render_artifacts(&translation());
        write_artifacts(dir.path(), &artifacts).unwrap();

        fs::remove_file(dir.path().join(CSS_VARIABLES_FILE)).unwrap();
        fs::write(dir.path().join(SCSS_VARIABLES_FILE), "$hand-edited: 1px;\n").unwrap();

        let drift = detect_drift(dir.path(), &artifacts).unwrap();
        assert_eq!(drift.len(), 2);
        assert!(drift.contains(&Drift {
            path: dir.path().join(SCSS_VARIABLES_FILE),
            status: DriftStatus::Stale
        }));
        assert!(drift.contains(&Drift {
            path: dir.path().join(CSS_VARIABLES_FILE),
            status: DriftStatus::Missing
        }));
    }
}
