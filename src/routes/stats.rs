//! Trending topics, solo scores and quiz progress endpoints.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use validator::Validate;

use crate::{
    dto::stats::{
        ProgressQuery, ProgressView, SaveProgressRequest, SaveScoreRequest, SavedScoreResponse,
        TrackTopicRequest, TrendingTopicView,
    },
    error::AppError,
    services::stats_service,
    state::SharedState,
};

/// Configure the stats subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/topics/track", post(track_topic))
        .route("/topics/trending", get(trending_topics))
        .route("/scores", post(save_score))
        .route(
            "/progress",
            put(save_progress).get(load_progress).delete(clear_progress),
        )
}

/// Bump a topic's popularity counter.
#[utoipa::path(
    post,
    path = "/topics/track",
    tag = "stats",
    request_body = TrackTopicRequest,
    responses((status = 204, description = "Topic counted"))
)]
pub async fn track_topic(
    State(state): State<SharedState>,
    Json(payload): Json<TrackTopicRequest>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;
    stats_service::track_topic(&state, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The ten most requested topics.
#[utoipa::path(
    get,
    path = "/topics/trending",
    tag = "stats",
    responses((status = 200, description = "Most requested topics", body = [TrendingTopicView]))
)]
pub async fn trending_topics(
    State(state): State<SharedState>,
) -> Result<Json<Vec<TrendingTopicView>>, AppError> {
    Ok(Json(stats_service::trending(&state).await?))
}

/// Persist a completed solo quiz and return its aggregate points.
#[utoipa::path(
    post,
    path = "/scores",
    tag = "stats",
    request_body = SaveScoreRequest,
    responses(
        (status = 200, description = "Result saved", body = SavedScoreResponse),
        (status = 400, description = "Invalid payload")
    )
)]
pub async fn save_score(
    State(state): State<SharedState>,
    Json(payload): Json<SaveScoreRequest>,
) -> Result<Json<SavedScoreResponse>, AppError> {
    payload.validate()?;
    Ok(Json(stats_service::save_score(&state, payload).await?))
}

/// Snapshot an in-flight solo quiz for later resumption.
#[utoipa::path(
    put,
    path = "/progress",
    tag = "stats",
    request_body = SaveProgressRequest,
    responses(
        (status = 204, description = "Progress saved"),
        (status = 400, description = "Invalid payload")
    )
)]
pub async fn save_progress(
    State(state): State<SharedState>,
    Json(payload): Json<SaveProgressRequest>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;
    stats_service::save_progress(&state, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The saved snapshot for a player, topic and difficulty.
#[utoipa::path(
    get,
    path = "/progress",
    tag = "stats",
    params(
        ("player_name" = String, Query, description = "Display name of the player"),
        ("topic" = String, Query, description = "Quiz topic"),
        ("difficulty" = String, Query, description = "easy, medium or hard")
    ),
    responses(
        (status = 200, description = "Saved snapshot", body = ProgressView),
        (status = 404, description = "No saved progress")
    )
)]
pub async fn load_progress(
    State(state): State<SharedState>,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<ProgressView>, AppError> {
    query.validate()?;
    Ok(Json(stats_service::load_progress(&state, query).await?))
}

/// Drop a saved snapshot, typically after the quiz completes.
#[utoipa::path(
    delete,
    path = "/progress",
    tag = "stats",
    params(
        ("player_name" = String, Query, description = "Display name of the player"),
        ("topic" = String, Query, description = "Quiz topic"),
        ("difficulty" = String, Query, description = "easy, medium or hard")
    ),
    responses((status = 204, description = "Progress cleared"))
)]
pub async fn clear_progress(
    State(state): State<SharedState>,
    Query(query): Query<ProgressQuery>,
) -> Result<StatusCode, AppError> {
    query.validate()?;
    stats_service::clear_progress(&state, query).await?;
    Ok(StatusCode::NO_CONTENT)
}
