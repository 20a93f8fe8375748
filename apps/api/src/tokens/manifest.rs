//! Declared token consumers.
//!
//! Orphan detection is only as good as the list of places it searches, so that list is
//! explicit configuration rather than a guess. A declared consumer that is missing on
//! disk is reported, never skipped.
//!
//! ```json
//! { "stylesheets": ["styles"], "renderers": ["renderer/docx.py", "templates"] }
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::errors::TokenError;

const STYLESHEET_EXTENSIONS: &[&str] = &["scss", "css"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsumerManifest {
    /// Hand-written stylesheets (files or directories).
    #[serde(default)]
    pub stylesheets: Vec<PathBuf>,
    /// Renderer sources that read tokens by key (files or directories).
    #[serde(default)]
    pub renderers: Vec<PathBuf>,
}

/// Source text of one consumer file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
}

/// Consumer sources read from disk, plus declared entries that do not exist.
#[derive(Debug, Default)]
pub struct ConsumerSources {
    pub stylesheets: Vec<SourceFile>,
    pub renderers: Vec<SourceFile>,
    pub missing: Vec<PathBuf>,
}

impl ConsumerManifest {
    pub fn load(path: &Path) -> Result<Self, TokenError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(TokenError::ManifestMissing(path.to_path_buf()))
            }
            Err(e) => return Err(TokenError::io(path, e)),
        };
        serde_json::from_str(&raw).map_err(|e| TokenError::MalformedManifest {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Reads every declared consumer. Relative entries resolve against `base_dir`;
    /// anything under `generated_dir` is skipped, since generated files mention every token.
    pub fn read_sources(
        &self,
        base_dir: &Path,
        generated_dir: &Path,
    ) -> Result<ConsumerSources, TokenError> {
        let generated = fs::canonicalize(generated_dir).ok();
        let mut sources = ConsumerSources::default();

        for entry in &self.stylesheets {
            let path = base_dir.join(entry);
            if !path.exists() {
                sources.missing.push(path);
                continue;
            }
            sources.stylesheets.extend(read_tree(
                &path,
                generated.as_deref(),
                Some(STYLESHEET_EXTENSIONS),
            )?);
        }

        for entry in &self.renderers {
            let path = base_dir.join(entry);
            if !path.exists() {
                sources.missing.push(path);
                continue;
            }
            sources
                .renderers
                .extend(read_tree(&path, generated.as_deref(), None)?);
        }

        debug!(
            "Read {} stylesheet and {} renderer consumer files",
            sources.stylesheets.len(),
            sources.renderers.len()
        );
        Ok(sources)
    }
}

fn read_tree(
    root: &Path,
    generated: Option<&Path>,
    extensions: Option<&[&str]>,
) -> Result<Vec<SourceFile>, TokenError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            TokenError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if let (Some(generated), Ok(canonical)) = (generated, fs::canonicalize(path)) {
            if canonical.starts_with(generated) {
                continue;
            }
        }
        if let Some(extensions) = extensions {
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !extensions.contains(&ext) {
                continue;
            }
        }

        let bytes = fs::read(path).map_err(|e| TokenError::io(path, e))?;
        files.push(SourceFile {
            path: path.to_path_buf(),
            text: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let err = ConsumerManifest::load(&dir.path().join("token-consumers.json")).unwrap_err();
        assert!(matches!(err, TokenError::ManifestMissing(_)));
    }

    #[test]
    fn test_load_malformed_manifest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token-consumers.json");
        fs::write(&path, r#"{"stylesheets": "styles"}"#).unwrap();
        assert!(matches!(
            ConsumerManifest::load(&path).unwrap_err(),
            TokenError::MalformedManifest { .. }
        ));
    }

    #[test]
    fn test_read_sources_walks_dirs_and_skips_generated() {
        let dir = TempDir::new().unwrap();
        let styles = dir.path().join("styles");
        fs::create_dir_all(styles.join("generated")).unwrap();
        fs::write(styles.join("_layout.scss"), ".a { margin: $x; }").unwrap();
        fs::write(styles.join("notes.md"), "not a stylesheet").unwrap();
        fs::write(styles.join("generated/_tokens.scss"), "$x: 1px;").unwrap();
        fs::write(dir.path().join("render.py"), "tokens['x']").unwrap();

        let manifest = ConsumerManifest {
            stylesheets: vec![PathBuf::from("styles")],
            renderers: vec![PathBuf::from("render.py")],
        };
        let sources = manifest
            .read_sources(dir.path(), &styles.join("generated"))
            .unwrap();

        assert_eq!(sources.stylesheets.len(), 1);
        assert!(sources.stylesheets[0].path.ends_with("_layout.scss"));
        assert_eq!(sources.renderers.len(), 1);
        assert!(sources.missing.is_empty());
    }

    #[test]
    fn test_read_sources_reports_missing_entries() {
        let dir = TempDir::new().unwrap();
        let manifest = ConsumerManifest {
            stylesheets: vec![PathBuf::from("nope.scss")],
            renderers: vec![PathBuf::from("gone.py")],
        };
        let sources = manifest
            .read_sources(dir.path(), &dir.path().join("generated"))
            .unwrap();
        assert_eq!(sources.missing.len(), 2);
    }
}
