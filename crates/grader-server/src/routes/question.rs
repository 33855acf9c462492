use axum::{http::StatusCode, routing::post, Json, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

// the interface can ask for a generated question, but the grader has no such capability
async fn generate_question() -> (StatusCode, Json<ErrorResponse>) {
    tracing::warn!("question generation requested but not available");
    (
        StatusCode::NOT_IMPLEMENTED,
        Json(ErrorResponse {
            error: "Question generation is not available".to_string(),
        }),
    )
}

pub fn routes() -> Router {
    Router::new()
        .route("/generate-question", post(generate_question))
        .route("/api/generate-question", post(generate_question))
}
