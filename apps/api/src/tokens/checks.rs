//! Token lint suite. CI checks over the token document and its consumers.
//!
//! Only a missing or malformed token document aborts the run. Every other problem is
//! a finding of the check that hit it, and each check runs to completion regardless of
//! how the others fared, so one run surfaces every defect.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::TokenPaths;
use crate::errors::TokenError;
use crate::tokens::document::TokenDocument;
use crate::tokens::emit::{detect_drift, render_artifacts, DriftStatus, Translation};
use crate::tokens::lockfile::validate_lockfile;
use crate::tokens::manifest::{ConsumerManifest, ConsumerSources};
use crate::tokens::orphans::{find_orphans, RendererScanner, SpacingKeywordScanner, StylesheetScanner};

pub const CONSUMER_MANIFEST_CHECK: &str = "consumer-manifest";
pub const ORPHAN_TOKENS_CHECK: &str = "orphan-tokens";
pub const IMPORT_LOCKFILE_CHECK: &str = "import-lockfile";
pub const GENERATED_DRIFT_CHECK: &str = "generated-drift";

/// Result of one check. `findings` fail the check; `warnings` do not.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub passed: bool,
    pub findings: Vec<String>,
    pub warnings: Vec<String>,
}

impl CheckOutcome {
    fn from_findings(name: &'static str, findings: Vec<String>, warnings: Vec<String>) -> Self {
        CheckOutcome {
            name,
            passed: findings.is_empty(),
            findings,
            warnings,
        }
    }

    fn failed(name: &'static str, error: &TokenError) -> Self {
        CheckOutcome::from_findings(name, vec![error.to_string()], Vec::new())
    }
}

#[derive(Debug, Serialize)]
pub struct SuiteReport {
    pub outcomes: Vec<CheckOutcome>,
}

impl SuiteReport {
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    pub fn outcome(&self, name: &str) -> Option<&CheckOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Suite
// ────────────────────────────────────────────────────────────────────────────

/// Runs every check. Errs only when the token document itself cannot be loaded.
pub fn run_checks(paths: &TokenPaths) -> Result<SuiteReport, TokenError> {
    let document = TokenDocument::load(&paths.token_file)?;
    let consumers = load_consumers(paths);

    let outcomes = vec![
        check_consumer_manifest(&consumers),
        check_orphan_tokens(&document, &consumers),
        check_import_lockfile(&paths.styles_root, &paths.lockfile),
        check_generated_drift(&document, paths),
    ];

    for outcome in &outcomes {
        if outcome.passed {
            info!("[{}] passed", outcome.name);
        } else {
            warn!("[{}] failed with {} finding(s)", outcome.name, outcome.findings.len());
        }
    }

    Ok(SuiteReport { outcomes })
}

/// Reads the consumer manifest and every source it declares.
pub fn load_consumers(paths: &TokenPaths) -> Result<ConsumerSources, TokenError> {
    let manifest = ConsumerManifest::load(&paths.manifest)?;
    let base_dir = match paths.manifest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    manifest.read_sources(base_dir, &paths.output_dir)
}

/// Dotted paths of tokens no declared consumer references.
pub fn orphan_tokens(document: &TokenDocument, consumers: &ConsumerSources) -> BTreeSet<String> {
    find_orphans(
        &document.leaves(),
        &SpacingKeywordScanner,
        &StylesheetScanner::new(&consumers.stylesheets),
        &RendererScanner::new(&consumers.renderers),
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Individual checks
// ────────────────────────────────────────────────────────────────────────────

pub fn check_consumer_manifest(consumers: &Result<ConsumerSources, TokenError>) -> CheckOutcome {
    match consumers {
        Ok(sources) => CheckOutcome::from_findings(
            CONSUMER_MANIFEST_CHECK,
            sources
                .missing
                .iter()
                .map(|p| format!("declared consumer does not exist: {}", p.display()))
                .collect(),
            Vec::new(),
        ),
        Err(e) => CheckOutcome::failed(CONSUMER_MANIFEST_CHECK, e),
    }
}

pub fn check_orphan_tokens(
    document: &TokenDocument,
    consumers: &Result<ConsumerSources, TokenError>,
) -> CheckOutcome {
    match consumers {
        Ok(sources) => CheckOutcome::from_findings(
            ORPHAN_TOKENS_CHECK,
            orphan_tokens(document, sources)
                .into_iter()
                .map(|path| format!("orphan token: {path}"))
                .collect(),
            Vec::new(),
        ),
        Err(e) => CheckOutcome::from_findings(
            ORPHAN_TOKENS_CHECK,
            vec![format!("cannot scan consumers: {e}")],
            Vec::new(),
        ),
    }
}

pub fn check_import_lockfile(styles_root: &Path, lockfile: &Path) -> CheckOutcome {
    let report = match validate_lockfile(styles_root, lockfile) {
        Ok(report) => report,
        Err(e) => return CheckOutcome::failed(IMPORT_LOCKFILE_CHECK, &e),
    };

    let mut findings = Vec::new();
    findings.extend(
        report
            .missing_files
            .iter()
            .map(|p| format!("missing file: {}", p.display())),
    );
    findings.extend(
        report
            .changed_files
            .iter()
            .map(|p| format!("changed file: {}", p.display())),
    );
    findings.extend(
        report
            .unreadable_files
            .iter()
            .map(|p| format!("unreadable file: {}", p.display())),
    );
    findings.extend(
        report
            .unresolved_imports
            .iter()
            .map(|u| format!("unresolved import: {u}")),
    );
    let warnings = report
        .untracked_files
        .iter()
        .map(|p| format!("untracked dependency: {}", p.display()))
        .collect();

    CheckOutcome::from_findings(IMPORT_LOCKFILE_CHECK, findings, warnings)
}

pub fn check_generated_drift(document: &TokenDocument, paths: &TokenPaths) -> CheckOutcome {
    let translation = Translation::from_document(document, paths.base_font_pt);
    let artifacts = render_artifacts(&translation);

    match detect_drift(&paths.output_dir, &artifacts) {
        Ok(drift) => CheckOutcome::from_findings(
            GENERATED_DRIFT_CHECK,
            drift
                .iter()
                .map(|d| match d.status {
                    DriftStatus::Missing => format!("not generated: {}", d.path.display()),
                    DriftStatus::Stale => format!("out of date: {}", d.path.display()),
                })
                .collect(),
            Vec::new(),
        ),
        Err(e) => CheckOutcome::failed(GENERATED_DRIFT_CHECK, &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::emit::write_artifacts;
    use crate::tokens::lockfile::generate_lockfile;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const TOKENS: &str = r##"{
        "accentColor": "#0055aa",
        "roleBox": { "docx": { "borderColor": "#333333" }, "marginTop": "4pt" },
        "legacyShadow": "none"
    }"##;

    /// A project where everything except `legacyShadow` is consumed.
    fn project() -> (TempDir, TokenPaths) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("styles/partials")).unwrap();
        fs::create_dir_all(root.join("renderer")).unwrap();

        fs::write(root.join("design_tokens.json"), TOKENS).unwrap();
        fs::write(
            root.join("styles/main.scss"),
            "@use 'generated/tokens';\n@use 'partials/layout';\n",
        )
        .unwrap();
        fs::write(
            root.join("styles/partials/_layout.scss"),
            "a { color: $accent-color; }\n",
        )
        .unwrap();
        fs::write(
            root.join("renderer/docx.py"),
            "border = tokens['roleBox']['docx']['borderColor']\n",
        )
        .unwrap();
        fs::write(
            root.join("token-consumers.json"),
            r#"{"stylesheets": ["styles"], "renderers": ["renderer"]}"#,
        )
        .unwrap();

        let paths = TokenPaths {
            token_file: root.join("design_tokens.json"),
            styles_root: root.join("styles"),
            output_dir: root.join("styles/generated"),
            lockfile: root.join("styles/imports.lock"),
            manifest: root.join("token-consumers.json"),
            base_font_pt: 11.0,
        };
        (dir, paths)
    }

    fn build(paths: &TokenPaths) {
        let document = TokenDocument::load(&paths.token_file).unwrap();
        let translation = Translation::from_document(&document, paths.base_font_pt);
        write_artifacts(&paths.output_dir, &render_artifacts(&translation)).unwrap();
        generate_lockfile(&paths.styles_root, &paths.lockfile).unwrap();
    }

    #[test]
    fn test_missing_token_file_is_fatal() {
        let (_dir, mut paths) = project();
        paths.token_file = PathBuf::from("/definitely/not/here.json");
        assert!(matches!(
            run_checks(&paths).unwrap_err(),
            TokenError::MissingTokenFile(_)
        ));
    }

    #[test]
    fn test_built_project_reports_only_the_orphan() {
        let (_dir, paths) = project();
        build(&paths);

        let report = run_checks(&paths).unwrap();
        assert!(!report.passed());
        assert!(report.outcome(CONSUMER_MANIFEST_CHECK).unwrap().passed);
        assert!(report.outcome(IMPORT_LOCKFILE_CHECK).unwrap().passed);
        assert!(report.outcome(GENERATED_DRIFT_CHECK).unwrap().passed);

        let orphans = report.outcome(ORPHAN_TOKENS_CHECK).unwrap();
        assert_eq!(orphans.findings, vec!["orphan token: legacyShadow".to_string()]);
    }

    #[test]
    fn test_clean_project_passes() {
        let (_dir, paths) = project();
        fs::write(
            paths.styles_root.join("partials/_shadow.scss"),
            ".card { box-shadow: $legacy-shadow; }\n",
        )
        .unwrap();
        build(&paths);

        let report = run_checks(&paths).unwrap();
        assert!(report.passed(), "unexpected findings: {:?}", report.outcomes);
    }

    #[test]
    fn test_failures_do_not_short_circuit() {
        let (_dir, paths) = project();
        build(&paths);

        // Break three independent things at once.
        fs::remove_file(paths.styles_root.join("partials/_layout.scss")).unwrap();
        fs::write(paths.output_dir.join("tokens.css"), ":root {}\n").unwrap();
        fs::write(
            &paths.manifest,
            r#"{"stylesheets": ["styles", "legacy.scss"], "renderers": ["renderer"]}"#,
        )
        .unwrap();

        let report = run_checks(&paths).unwrap();
        assert_eq!(report.outcomes.len(), 4);
        assert!(!report.outcome(CONSUMER_MANIFEST_CHECK).unwrap().passed);
        assert!(!report.outcome(GENERATED_DRIFT_CHECK).unwrap().passed);

        let lock = report.outcome(IMPORT_LOCKFILE_CHECK).unwrap();
        assert!(!lock.passed);
        assert!(lock.findings.iter().any(|f| f.starts_with("missing file:")));
        assert!(lock.findings.iter().any(|f| f.starts_with("unresolved import:")));

        // accentColor lost its only stylesheet consumer.
        let orphans = report.outcome(ORPHAN_TOKENS_CHECK).unwrap();
        assert!(orphans.findings.contains(&"orphan token: accentColor".to_string()));
    }

    #[test]
    fn test_missing_lockfile_fails_only_that_check() {
        let (_dir, paths) = project();
        let document = TokenDocument::load(&paths.token_file).unwrap();
        write_artifacts(
            &paths.output_dir,
            &render_artifacts(&Translation::from_document(&document, 11.0)),
        )
        .unwrap();

        let report = run_checks(&paths).unwrap();
        let lock = report.outcome(IMPORT_LOCKFILE_CHECK).unwrap();
        assert!(!lock.passed);
        assert!(lock.findings[0].contains("lockfile not found"));
        assert!(report.outcome(GENERATED_DRIFT_CHECK).unwrap().passed);
    }
}
