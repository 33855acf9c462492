use crate::state::AppState;
use axum::{extract::State, routing::post, Json, Router};
use grader::models::grade::GradeResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
struct GradeRequest {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    question: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct GradeResponse {
    grade: GradeResult,
}

async fn handler(
    State(state): State<AppState>,
    Json(request): Json<GradeRequest>,
) -> Json<GradeResponse> {
    let code = request.code.unwrap_or_default();
    let question = request.question.unwrap_or_default();
    tracing::info!(
        code_len = code.len(),
        question_len = question.len(),
        "received grade request"
    );

    let assessment = state.grader.assess(&code, &question).await;
    Json(GradeResponse {
        grade: assessment.result,
    })
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/grade", post(handler))
        .route("/api/grade", post(handler))
        .with_state(state)
}
