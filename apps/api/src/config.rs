use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default, so a bare checkout starts without a `.env`.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub tokens: TokenPaths,
}

/// File-system locations the token translator reads from and writes to.
#[derive(Debug, Clone)]
pub struct TokenPaths {
    /// Source-of-truth design token document (JSON).
    pub token_file: PathBuf,
    /// Root directory of hand-written stylesheet partials.
    pub styles_root: PathBuf,
    /// Directory receiving generated variable files and spacing artifacts.
    pub output_dir: PathBuf,
    pub lockfile: PathBuf,
    /// Declared list of token consumers (stylesheets and renderer sources).
    pub manifest: PathBuf,
    /// Base font size used to resolve `em`/`rem` spacing into DOCX twips.
    pub base_font_pt: f32,
}

impl Default for TokenPaths {
    fn default() -> Self {
        TokenPaths {
            token_file: PathBuf::from("design_tokens.json"),
            styles_root: PathBuf::from("styles"),
            output_dir: PathBuf::from("styles/generated"),
            lockfile: PathBuf::from("styles/imports.lock"),
            manifest: PathBuf::from("token-consumers.json"),
            base_font_pt: 11.0,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            tokens: TokenPaths::from_env()?,
        })
    }
}

impl TokenPaths {
    pub fn from_env() -> Result<Self> {
        let defaults = TokenPaths::default();

        Ok(TokenPaths {
            token_file: path_env("DESIGN_TOKENS_PATH", defaults.token_file),
            styles_root: path_env("STYLES_ROOT", defaults.styles_root),
            output_dir: path_env("GENERATED_STYLES_DIR", defaults.output_dir),
            lockfile: path_env("IMPORT_LOCKFILE", defaults.lockfile),
            manifest: path_env("TOKEN_CONSUMERS_MANIFEST", defaults.manifest),
            base_font_pt: match std::env::var("DOCX_BASE_FONT_PT") {
                Ok(raw) => raw
                    .parse::<f32>()
                    .context("DOCX_BASE_FONT_PT must be a number of points")?,
                Err(_) => defaults.base_font_pt,
            },
        })
    }
}

fn path_env(key: &str, default: PathBuf) -> PathBuf {
    std::env::var_os(key).map(PathBuf::from).unwrap_or(default)
}
