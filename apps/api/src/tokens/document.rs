use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::info;

use crate::errors::TokenError;
use crate::tokens::flatten::{flat_key, flatten};

/// One leaf of the token tree, addressable both ways consumers refer to it.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenLeaf {
    /// Dotted source path, e.g. `roleBox.docx.borderColor`.
    pub path: String,
    /// Flattened kebab name, e.g. `role-box-docx-border-color`.
    pub flat_name: String,
    pub value: Value,
}

impl TokenLeaf {
    /// Source key segments, e.g. `["roleBox", "docx", "borderColor"]`.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('.')
    }
}

/// The hand-authored design token document. Read-only once loaded.
#[derive(Debug, Clone)]
pub struct TokenDocument {
    source: PathBuf,
    root: Map<String, Value>,
}

impl TokenDocument {
    /// Loads and parses the token document. Missing or malformed files are fatal.
    pub fn load(path: &Path) -> Result<Self, TokenError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(TokenError::MissingTokenFile(path.to_path_buf()))
            }
            Err(e) => return Err(TokenError::io(path, e)),
        };

        let document = Self::parse(path, &raw)?;
        info!(
            "Loaded {} design tokens from {}",
            document.leaves().len(),
            path.display()
        );
        Ok(document)
    }

    /// Parses token JSON attributed to `source` (used in diagnostics and generated headers).
    pub fn parse(source: impl Into<PathBuf>, raw: &str) -> Result<Self, TokenError> {
        let source = source.into();
        let value: Value =
            serde_json::from_str(raw).map_err(|e| TokenError::MalformedJson {
                path: source.clone(),
                source: e,
            })?;

        match value {
            Value::Object(root) => Ok(TokenDocument { source, root }),
            _ => Err(TokenError::NotAnObject(source)),
        }
    }

    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    /// File name of the source document, for generated-file headers.
    pub fn source_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }

    /// Flat `kebab-name → value` mapping in document order.
    pub fn flat(&self) -> Map<String, Value> {
        flatten(&self.root, "")
    }

    /// Every leaf in document order.
    pub fn leaves(&self) -> Vec<TokenLeaf> {
        let mut leaves = Vec::new();
        collect_leaves(&self.root, "", "", &mut leaves);
        leaves
    }
}

fn collect_leaves(
    tree: &Map<String, Value>,
    path_prefix: &str,
    flat_prefix: &str,
    out: &mut Vec<TokenLeaf>,
) {
    for (key, value) in tree {
        let path = if path_prefix.is_empty() {
            key.clone()
        } else {
            format!("{path_prefix}.{key}")
        };
        let flat_name = flat_key(flat_prefix, key);

        match value {
            Value::Object(child) => collect_leaves(child, &path, &flat_name, out),
            leaf => out.push(TokenLeaf {
                path,
                flat_name,
                value: leaf.clone(),
            }),
        }
    }
}
