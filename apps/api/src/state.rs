use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
/// Handlers are stateless beyond configuration; the token document is re-read per request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Config,
}
