//! Stylesheet import lockfile. Pins the resolved partial graph by content hash.
//!
//! Generation walks every stylesheet under the styles root, follows `@import`, `@use` and
//! `@forward` transitively, and records `absolute-path:md5` for each resolved dependency.
//! Any unresolvable import aborts generation before the lockfile is written.
//!
//! Validation repeats the walk and reports, without stopping at the first problem:
//! - recorded dependencies that no longer exist (missing)
//! - recorded dependencies whose content hash changed (changed)
//! - recorded dependencies that exist but cannot be read (unreadable)
//! - imports that currently resolve to nothing (unresolved)
//! - resolvable dependencies absent from the lockfile (untracked, warning only)

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::errors::TokenError;

pub const PRIMARY_EXTENSION: &str = "scss";
pub const ALTERNATE_EXTENSION: &str = "css";

const LOCKFILE_HEADER: &str = "# Stylesheet import lockfile. Generated by `tokens lock`; do not edit.\n\
                               # Format: <absolute path>:<md5 of file contents>\n";

static IMPORT_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*@(?:import|use|forward)\s+(.+)$").unwrap());
static QUOTED_TARGET: Lazy<Regex> = Lazy::new(|| Regex::new(r#"["']([^"']+)["']"#).unwrap());

// ────────────────────────────────────────────────────────────────────────────
// Import scanning and resolution
// ────────────────────────────────────────────────────────────────────────────

/// One quoted target of an import-like directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDirective {
    /// 1-based line number.
    pub line: usize,
    pub target: String,
}

/// An import that resolved to no file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedImport {
    pub importer: PathBuf,
    pub line: usize,
    pub target: String,
}

impl fmt::Display for UnresolvedImport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: cannot resolve '{}'",
            self.importer.display(),
            self.line,
            self.target
        )
    }
}

fn is_external(target: &str) -> bool {
    target.starts_with("http://")
        || target.starts_with("https://")
        || target.starts_with("//")
        || target.starts_with("url(")
        || target.starts_with("sass:")
}

/// Extracts local import targets, one entry per quoted target.
pub fn scan_imports(source: &str) -> Vec<ImportDirective> {
    let mut directives = Vec::new();

    for (idx, line) in source.lines().enumerate() {
        let Some(caps) = IMPORT_DIRECTIVE.captures(line) else {
            continue;
        };
        let rest = caps.get(1).map_or("", |m| m.as_str());
        if rest.trim_start().starts_with("url(") {
            continue;
        }

        for target in QUOTED_TARGET.captures_iter(rest).filter_map(|c| c.get(1)) {
            let target = target.as_str().trim();
            if !is_external(target) {
                directives.push(ImportDirective {
                    line: idx + 1,
                    target: target.to_string(),
                });
            }
        }
    }

    directives
}

/// Candidate files for `target` imported from `dir`, in resolution order:
/// exact, `.scss`, `.css`, then the same three with a `_`-prefixed file name.
pub fn candidate_paths(dir: &Path, target: &str) -> Vec<PathBuf> {
    let base = dir.join(target);
    let mut candidates = vec![
        base.clone(),
        with_appended_extension(&base, PRIMARY_EXTENSION),
        with_appended_extension(&base, ALTERNATE_EXTENSION),
    ];

    if let Some(name) = base.file_name().and_then(|n| n.to_str()) {
        let partial = base.with_file_name(format!("_{name}"));
        candidates.push(partial.clone());
        candidates.push(with_appended_extension(&partial, PRIMARY_EXTENSION));
        candidates.push(with_appended_extension(&partial, ALTERNATE_EXTENSION));
    }

    candidates
}

fn with_appended_extension(path: &Path, ext: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_os_string();
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}

/// First existing candidate file for `target`, if any.
pub fn resolve_import(dir: &Path, target: &str) -> Option<PathBuf> {
    candidate_paths(dir, target).into_iter().find(|p| p.is_file())
}

/// Lowercase hex MD5 of the file's bytes.
pub fn hash_file(path: &Path) -> Result<String, TokenError> {
    let bytes = fs::read(path).map_err(|e| TokenError::io(path, e))?;
    Ok(format!("{:x}", md5::compute(bytes)))
}

// ────────────────────────────────────────────────────────────────────────────
// Graph discovery
// ────────────────────────────────────────────────────────────────────────────

/// The transitive import graph reachable from the styles root.
#[derive(Debug, Default)]
pub struct ImportGraph {
    /// Canonical paths of every resolved import target.
    pub dependencies: BTreeSet<PathBuf>,
    pub unresolved: Vec<UnresolvedImport>,
    pub files_scanned: usize,
}

fn is_stylesheet(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(PRIMARY_EXTENSION) | Some(ALTERNATE_EXTENSION)
    )
}

fn canonical(path: &Path) -> Result<PathBuf, TokenError> {
    fs::canonicalize(path).map_err(|e| TokenError::io(path, e))
}

/// Scans every stylesheet under `styles_root` and follows resolved imports transitively,
/// including targets that live outside the root.
pub fn discover_imports(styles_root: &Path) -> Result<ImportGraph, TokenError> {
    if !styles_root.is_dir() {
        return Err(TokenError::StylesRootMissing(styles_root.to_path_buf()));
    }

    let mut queue = VecDeque::new();
    for entry in WalkDir::new(styles_root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(styles_root).to_path_buf();
            TokenError::io(path, e.into())
        })?;
        if entry.file_type().is_file() && is_stylesheet(entry.path()) {
            queue.push_back(canonical(entry.path())?);
        }
    }

    let mut graph = ImportGraph::default();
    let mut visited: BTreeSet<PathBuf> = BTreeSet::new();

    while let Some(file) = queue.pop_front() {
        if !visited.insert(file.clone()) {
            continue;
        }
        graph.files_scanned += 1;

        let bytes = fs::read(&file).map_err(|e| TokenError::io(&file, e))?;
        let source = String::from_utf8_lossy(&bytes);
        let dir = file.parent().unwrap_or(Path::new("."));

        for directive in scan_imports(&source) {
            match resolve_import(dir, &directive.target) {
                Some(resolved) => {
                    let resolved = canonical(&resolved)?;
                    debug!("{} imports {}", file.display(), resolved.display());
                    if graph.dependencies.insert(resolved.clone()) {
                        queue.push_back(resolved);
                    }
                }
                None => graph.unresolved.push(UnresolvedImport {
                    importer: file.clone(),
                    line: directive.line,
                    target: directive.target,
                }),
            }
        }
    }

    Ok(graph)
}

// ────────────────────────────────────────────────────────────────────────────
// Lockfile
// ────────────────────────────────────────────────────────────────────────────

/// Recorded `path → md5` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lockfile {
    pub entries: BTreeMap<PathBuf, String>,
}

impl Lockfile {
    /// Parses `path:hash` lines. Blank lines and `#` comments are ignored.
    /// The split is at the last `:` so drive-letter paths survive.
    pub fn parse(text: &str) -> Result<Self, TokenError> {
        let mut entries = BTreeMap::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let malformed = |reason: &str| TokenError::MalformedLockfile {
                line: idx + 1,
                reason: reason.to_string(),
            };

            let (path, hash) = line
                .rsplit_once(':')
                .ok_or_else(|| malformed("expected <path>:<hash>"))?;
            if path.is_empty() {
                return Err(malformed("empty path"));
            }
            if hash.len() != 32 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(malformed("hash must be 32 hex digits"));
            }
            entries.insert(PathBuf::from(path), hash.to_ascii_lowercase());
        }

        Ok(Lockfile { entries })
    }

    pub fn render(&self) -> String {
        let mut out = LOCKFILE_HEADER.to_string();
        for (path, hash) in &self.entries {
            out.push_str(&format!("{}:{hash}\n", path.display()));
        }
        out
    }

    pub fn load(path: &Path) -> Result<Self, TokenError> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(TokenError::LockfileMissing(path.to_path_buf()))
            }
            Err(e) => Err(TokenError::io(path, e)),
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), TokenError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| TokenError::io(parent, e))?;
        }
        fs::write(path, self.render()).map_err(|e| TokenError::io(path, e))
    }
}

/// Resolves and hashes the current import graph, then writes the lockfile.
/// Nothing is written if any import fails to resolve.
pub fn generate_lockfile(styles_root: &Path, lock_path: &Path) -> Result<Lockfile, TokenError> {
    let graph = discover_imports(styles_root)?;
    if !graph.unresolved.is_empty() {
        for unresolved in &graph.unresolved {
            warn!("{unresolved}");
        }
        return Err(TokenError::UnresolvedImports(graph.unresolved));
    }

    let mut lockfile = Lockfile::default();
    for dependency in graph.dependencies {
        let hash = hash_file(&dependency)?;
        lockfile.entries.insert(dependency, hash);
    }

    lockfile.write(lock_path)?;
    info!(
        "Locked {} stylesheet dependencies ({} files scanned) into {}",
        lockfile.entries.len(),
        graph.files_scanned,
        lock_path.display()
    );
    Ok(lockfile)
}

/// Outcome of re-checking a lockfile against the current tree.
#[derive(Debug, Default, Serialize)]
pub struct LockfileReport {
    pub checked: usize,
    pub missing_files: Vec<PathBuf>,
    pub changed_files: Vec<PathBuf>,
    /// Recorded dependencies that exist but could not be hashed.
    pub unreadable_files: Vec<PathBuf>,
    pub unresolved_imports: Vec<UnresolvedImport>,
    pub untracked_files: Vec<PathBuf>,
}

impl LockfileReport {
    /// Untracked dependencies are a warning, not a failure.
    pub fn passed(&self) -> bool {
        self.missing_files.is_empty()
            && self.changed_files.is_empty()
            && self.unreadable_files.is_empty()
            && self.unresolved_imports.is_empty()
    }
}

/// Validates the lockfile, collecting every defect rather than stopping at the first.
pub fn validate_lockfile(styles_root: &Path, lock_path: &Path) -> Result<LockfileReport, TokenError> {
    let lockfile = Lockfile::load(lock_path)?;
    let graph = discover_imports(styles_root)?;

    let mut report = LockfileReport {
        checked: lockfile.entries.len(),
        ..LockfileReport::default()
    };

    for (path, recorded) in &lockfile.entries {
        if !path.exists() {
            report.missing_files.push(path.clone());
            continue;
        }
        match hash_file(path) {
            Ok(hash) if hash == *recorded => {}
            Ok(_) => report.changed_files.push(path.clone()),
            Err(e) => {
                warn!("{e}");
                report.unreadable_files.push(path.clone());
            }
        }
    }

    report.unresolved_imports = graph.unresolved;
    report.untracked_files = graph
        .dependencies
        .into_iter()
        .filter(|dep| !lockfile.entries.contains_key(dep))
        .collect();

    info!(
        "Lockfile check: {} entries, {} missing, {} changed, {} unreadable, {} unresolved, {} untracked",
        report.checked,
        report.missing_files.len(),
        report.changed_files.len(),
        report.unreadable_files.len(),
        report.unresolved_imports.len(),
        report.untracked_files.len()
    );
    Ok(report)
}
