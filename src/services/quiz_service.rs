//! Standalone quiz generation for solo play.

use crate::{
    dto::quiz::{GenerateQuizRequest, GeneratedQuizResponse},
    error::ServiceError,
    quizgen::QuizRequest,
    state::SharedState,
};

/// Generate a quiz without attaching it to any room.
pub async fn generate(
    state: &SharedState,
    request: GenerateQuizRequest,
) -> Result<GeneratedQuizResponse, ServiceError> {
    let quiz = state
        .question_sources()
        .generate(QuizRequest {
            topic: request
                .topic
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_owned(),
            difficulty: request.difficulty,
            count: request.count,
            source_text: request.source_text,
        })
        .await?;

    Ok(GeneratedQuizResponse {
        questions: quiz.questions.iter().map(Into::into).collect(),
        source: quiz.source_label,
    })
}
