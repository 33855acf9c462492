use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub fn routes() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{self, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_on_both_paths() {
        for uri in ["/health", "/api/health"] {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let response = routes().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let body = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(value, json!({"status": "healthy"}));
        }
    }
}
