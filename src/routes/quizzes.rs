//! Standalone quiz generation endpoint for solo play.

use axum::{Json, Router, extract::State, routing::post};
use validator::Validate;

use crate::{
    dto::quiz::{GenerateQuizRequest, GeneratedQuizResponse},
    error::AppError,
    services::quiz_service,
    state::SharedState,
};

/// Configure the quiz generation subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/quizzes", post(generate_quiz))
}

/// Generate a quiz from a topic or a supplied source text.
#[utoipa::path(
    post,
    path = "/quizzes",
    tag = "quizzes",
    request_body = GenerateQuizRequest,
    responses(
        (status = 200, description = "Generated quiz", body = GeneratedQuizResponse),
        (status = 400, description = "Invalid payload"),
        (status = 502, description = "All question sources failed")
    )
)]
pub async fn generate_quiz(
    State(state): State<SharedState>,
    Json(payload): Json<GenerateQuizRequest>,
) -> Result<Json<GeneratedQuizResponse>, AppError> {
    payload.validate()?;
    Ok(Json(quiz_service::generate(&state, payload).await?))
}
