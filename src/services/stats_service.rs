//! Trending topics and solo result persistence.

use mongodb::bson::DateTime;
use tracing::info;

use crate::{
    dao::models::{QuizProgressEntity, QuizResultEntity},
    dto::stats::{
        ProgressQuery, ProgressView, SaveProgressRequest, SaveScoreRequest, SavedScoreResponse,
        TrackTopicRequest, TrendingTopicView,
    },
    error::ServiceError,
    state::{SharedState, room::Question},
};

/// Bump a topic's popularity counter.
pub async fn track_topic(
    state: &SharedState,
    request: TrackTopicRequest,
) -> Result<(), ServiceError> {
    let stores = state.require_stores().await?;
    let display = request.topic.trim().to_owned();
    let normalized = display.to_lowercase();
    stores.stats.track_topic(&normalized, &display).await?;
    Ok(())
}

/// The ten most requested topics.
pub async fn trending(state: &SharedState) -> Result<Vec<TrendingTopicView>, ServiceError> {
    let stores = state.require_stores().await?;
    let topics = stores.stats.trending().await?;
    Ok(topics.into_iter().map(Into::into).collect())
}

/// Persist one completed solo quiz and return its aggregate points.
pub async fn save_score(
    state: &SharedState,
    request: SaveScoreRequest,
) -> Result<SavedScoreResponse, ServiceError> {
    let stores = state.require_stores().await?;
    let points = state
        .scoring()
        .aggregate_points(request.correct_count, request.difficulty);

    let entity = QuizResultEntity {
        player_name: request.player_name.trim().to_owned(),
        topic: request.topic.trim().to_owned(),
        correct_count: request.correct_count,
        total_questions: request.total_questions,
        difficulty: request.difficulty,
        points,
        completed_at: DateTime::now(),
    };
    stores.stats.save_result(&entity).await?;

    info!(player = %entity.player_name, points, "solo result saved");
    Ok(SavedScoreResponse { points })
}

/// Snapshot an in-flight solo quiz so the player can resume it later.
pub async fn save_progress(
    state: &SharedState,
    request: SaveProgressRequest,
) -> Result<(), ServiceError> {
    let stores = state.require_stores().await?;
    let entity = QuizProgressEntity {
        player_name: request.player_name.trim().to_owned(),
        topic: request.topic.trim().to_owned(),
        difficulty: request.difficulty,
        current_question: request.current_question,
        score: request.score,
        questions: request
            .questions
            .into_iter()
            .map(|view| Question::from(view).into())
            .collect(),
        last_saved: DateTime::now(),
    };
    stores.stats.save_progress(&entity).await?;

    info!(player = %entity.player_name, question = entity.current_question, "progress saved");
    Ok(())
}

/// The saved snapshot for a player/topic/difficulty triple.
pub async fn load_progress(
    state: &SharedState,
    query: ProgressQuery,
) -> Result<ProgressView, ServiceError> {
    let stores = state.require_stores().await?;
    let snapshot = stores
        .stats
        .load_progress(query.player_name.trim(), query.topic.trim(), query.difficulty)
        .await?;

    match snapshot {
        Some(entity) => Ok(entity.into()),
        None => Err(ServiceError::NotFound(
            "no saved progress for this quiz".into(),
        )),
    }
}

/// Drop a saved snapshot. Clearing one that does not exist is not an error.
pub async fn clear_progress(
    state: &SharedState,
    query: ProgressQuery,
) -> Result<(), ServiceError> {
    let stores = state.require_stores().await?;
    let existed = stores
        .stats
        .clear_progress(query.player_name.trim(), query.topic.trim(), query.difficulty)
        .await?;
    if existed {
        info!(player = %query.player_name.trim(), "progress cleared");
    }
    Ok(())
}
