pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::layout::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Layout API
        .route("/api/v1/layout/config", get(handlers::handle_get_config))
        .route("/api/v1/layout/plan", post(handlers::handle_plan))
        .route("/api/v1/layout/simulate", post(handlers::handle_simulate))
        .route("/api/v1/layout/condense", post(handlers::handle_condense))
        .route("/api/v1/layout/compress", post(handlers::handle_compress))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::layout::LayoutConfig;

    fn make_state() -> AppState {
        AppState::new(Config {
            port: 0,
            rust_log: "info".to_string(),
            layout: LayoutConfig::default(),
        })
    }

    async fn post_json(uri: &str, body: Value) -> (StatusCode, Value) {
        let response = build_router(make_state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_ok() {
        let response = build_router(make_state())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_plan_returns_layout() {
        let (status, body) = post_json(
            "/api/v1/layout/plan",
            json!({
                "summary": "Platform engineer.",
                "skills": ["Rust", "Kubernetes"],
                "roles": [{
                    "role_id": "acme",
                    "candidates": [
                        {"text": "Cut deploy time by 40%", "score": 0.9},
                        {"text": "Ran on-call for 12 services", "score": 0.6},
                        {"text": "Wrote docs", "score": 0.1, "line_cost": 1}
                    ]
                }]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["layout"]["fits_in_budget"], json!(true));
        assert_eq!(body["roles"][0]["bullets"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_plan_blank_role_is_bad_request() {
        let (status, body) = post_json(
            "/api/v1/layout/plan",
            json!({"roles": [{"role_id": "", "candidates": []}]}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
    }

    #[tokio::test]
    async fn test_compress_uses_default_target() {
        let (status, body) = post_json(
            "/api/v1/layout/compress",
            json!({
                "bullets": [
                    {"text": "Kept first", "score": 0.9},
                    {"text": "Successfully utilized Terraform in order to provision a wide variety of environments across regions"}
                ]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["bullets"][0]["text"], json!("Kept first"));
        assert_eq!(body["bullets"][1]["was_compressed"], json!(true));
    }

    #[tokio::test]
    async fn test_condense_never_below_floor() {
        let (status, body) = post_json(
            "/api/v1/layout/condense",
            json!({
                "target_lines": 50,
                "roles": [{
                    "role_id": "acme",
                    "header_lines": 2,
                    "bullets": [
                        {"text": "a", "score": 0.5, "line_cost": 2},
                        {"text": "b", "score": 0.5, "line_cost": 1},
                        {"text": "c", "score": 0.5, "line_cost": 1}
                    ]
                }]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["suggestions"][0]["suggested_count"], json!(2));
        assert_eq!(body["lines_saved"], json!(2));
    }
}
