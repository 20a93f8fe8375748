use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::tokens::lockfile::UnresolvedImport;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Token translation error: {0}")]
    Tokens(#[from] TokenError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Tokens(e @ TokenError::MissingTokenFile(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string())
            }
            AppError::Tokens(e @ (TokenError::MalformedJson { .. } | TokenError::NotAnObject(_))) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                e.to_string(),
            ),
            AppError::Tokens(e) => {
                tracing::error!("Token translation error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "TOKENS_ERROR",
                    "Design tokens could not be translated".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// Failures raised by the design-token translator.
///
/// Resource and parse defects abort the operation that hit them. Structural
/// defects (orphans, drifted lockfile entries) are not errors: they are collected
/// into check reports instead.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token document not found: {}", .0.display())]
    MissingTokenFile(PathBuf),

    #[error("token document {} is not valid JSON: {source}", path.display())]
    MalformedJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("token document {} must be a JSON object at the top level", .0.display())]
    NotAnObject(PathBuf),

    #[error("stylesheet root not found: {}", .0.display())]
    StylesRootMissing(PathBuf),

    #[error("import lockfile not found: {}", .0.display())]
    LockfileMissing(PathBuf),

    #[error("lockfile line {line} is malformed: {reason}")]
    MalformedLockfile { line: usize, reason: String },

    #[error("{} import(s) could not be resolved", .0.len())]
    UnresolvedImports(Vec<UnresolvedImport>),

    #[error("consumer manifest not found: {}", .0.display())]
    ManifestMissing(PathBuf),

    #[error("consumer manifest {} is malformed: {source}", path.display())]
    MalformedManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TokenError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TokenError::Io {
            path: path.into(),
            source,
        }
    }
}
