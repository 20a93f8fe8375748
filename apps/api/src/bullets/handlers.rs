//! Axum route handlers for the Bullets API.

use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::bullets::normalizer::{normalize_with_report, NormalizationReason};
use crate::errors::AppError;

/// Upper bound on bullets per request. A full résumé rarely exceeds a few dozen.
pub const MAX_BULLETS_PER_REQUEST: usize = 200;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NormalizeRequest {
    pub bullets: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NormalizedBulletResponse {
    pub original: String,
    pub normalized: String,
    pub changes: Vec<NormalizationReason>,
}

#[derive(Debug, Serialize)]
pub struct NormalizeResponse {
    pub bullets: Vec<NormalizedBulletResponse>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/bullets/normalize
/// Normalizes each bullet independently; order is preserved.
pub async fn handle_normalize(
    Json(body): Json<NormalizeRequest>,
) -> Result<Json<NormalizeResponse>, AppError> {
    if body.bullets.is_empty() {
        return Err(AppError::Validation("bullets must not be empty".to_string()));
    }
    if body.bullets.len() > MAX_BULLETS_PER_REQUEST {
        return Err(AppError::Validation(format!(
            "at most {MAX_BULLETS_PER_REQUEST} bullets per request, got {}",
            body.bullets.len()
        )));
    }

    let bullets: Vec<NormalizedBulletResponse> = body
        .bullets
        .into_iter()
        .map(|original| {
            let report = normalize_with_report(&original);
            NormalizedBulletResponse {
                original,
                normalized: report.text,
                changes: report.changes,
            }
        })
        .collect();

    let changed = bullets.iter().filter(|b| !b.changes.is_empty()).count();
    info!("Normalized {} bullets ({} changed)", bullets.len(), changed);

    Ok(Json(NormalizeResponse { bullets }))
}
