pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::bullets::handlers as bullets;
use crate::state::AppState;
use crate::tokens::handlers as tokens;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Bullets API
        .route("/api/v1/bullets/normalize", post(bullets::handle_normalize))
        // Tokens API
        .route("/api/v1/tokens/spacing", get(tokens::handle_get_spacing))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, TokenPaths};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn state_with_tokens(token_file: &Path) -> AppState {
        AppState {
            config: Config {
                port: 0,
                rust_log: "info".to_string(),
                tokens: TokenPaths {
                    token_file: token_file.to_path_buf(),
                    ..TokenPaths::default()
                },
            },
        }
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(state_with_tokens(Path::new("design_tokens.json")));
        let (status, body) = send(app, get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "tailor-api");
    }

    #[tokio::test]
    async fn test_normalize_preserves_order_and_reports_changes() {
        let app = build_router(state_with_tokens(Path::new("design_tokens.json")));
        let request = post_json(
            "/api/v1/bullets/normalize",
            json!({ "bullets": ["Led a team of 5 engineers.", "Cut p95 latency by 40% ?? "] }),
        );
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);

        let bullets = body["bullets"].as_array().unwrap();
        assert_eq!(bullets.len(), 2);
        assert_eq!(bullets[0]["normalized"], "Led a team of 5 engineers.");
        assert!(bullets[0]["changes"].as_array().unwrap().is_empty());
        assert_eq!(bullets[1]["original"], "Cut p95 latency by 40% ?? ");
        assert!(!bullets[1]["normalized"].as_str().unwrap().contains("??"));
        assert!(!bullets[1]["changes"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_normalize_rejects_empty_batch() {
        let app = build_router(state_with_tokens(Path::new("design_tokens.json")));
        let (status, body) = send(
            app,
            post_json("/api/v1/bullets/normalize", json!({ "bullets": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_spacing_translation() {
        let dir = TempDir::new().unwrap();
        let token_file = dir.path().join("design_tokens.json");
        fs::write(
            &token_file,
            r##"{"roleDescription": {"marginTop": "2pt"}, "accentColor": "#0055aa"}"##,
        )
        .unwrap();

        let app = build_router(state_with_tokens(&token_file));
        let (status, body) = send(app, get_request("/api/v1/tokens/spacing")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["screen"][".role-description-text"]["margin-top"], "2pt");
        assert_eq!(body["print"], body["screen"]);
        assert_eq!(body["docx"][".role-description-text"]["space_before"], 40);
        assert!(body.get("flat").is_none());
    }

    #[tokio::test]
    async fn test_spacing_missing_document_is_not_found() {
        let dir = TempDir::new().unwrap();
        let app = build_router(state_with_tokens(&dir.path().join("nope.json")));
        let (status, body) = send(app, get_request("/api/v1/tokens/spacing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_spacing_malformed_document_is_unprocessable() {
        let dir = TempDir::new().unwrap();
        let token_file = dir.path().join("design_tokens.json");
        fs::write(&token_file, "[1, 2, 3]").unwrap();

        let app = build_router(state_with_tokens(&token_file));
        let (status, _) = send(app, get_request("/api/v1/tokens/spacing")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
