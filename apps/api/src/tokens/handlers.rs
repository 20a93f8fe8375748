use axum::{extract::State, Json};
use tracing::info;

use crate::errors::AppError;
use crate::state::AppState;
use crate::tokens::document::TokenDocument;
use crate::tokens::emit::Translation;

/// GET /api/v1/tokens/spacing
/// Translates the configured token document on every request, so edits show up without a restart.
pub async fn handle_get_spacing(
    State(state): State<AppState>,
) -> Result<Json<Translation>, AppError> {
    let paths = state.config.tokens.clone();

    // File I/O and regex work: keep it off the async executor.
    let translation = tokio::task::spawn_blocking(move || {
        let document = TokenDocument::load(&paths.token_file)?;
        Ok::<_, AppError>(Translation::from_document(&document, paths.base_font_pt))
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in token translation: {e}")))??;

    info!(
        "Translated {}: {} spacing selector(s), {} skipped",
        translation.source_name,
        translation.screen.len(),
        translation.skipped.len()
    );
    Ok(Json(translation))
}
