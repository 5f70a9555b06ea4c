//! Wagered head-to-head match endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::room::{
        AnswerRequest, BetRequest, CreateMatchRequest, CreatedRoomResponse, HostKeyRequest,
        JoinRequest, RoomSummary, RoomView,
    },
    error::AppError,
    routes::check_code,
    services::match_service,
    state::SharedState,
};

/// Configure the match subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/matches", post(create_match))
        .route("/matches/public", get(public_matches))
        .route("/matches/{code}", get(get_match))
        .route("/matches/{code}/join", post(join_match))
        .route("/matches/{code}/bets", post(submit_bet))
        .route("/matches/{code}/answers", post(submit_answer))
        .route("/matches/{code}/advance", post(advance_question))
        .route("/matches/{code}/end", post(end_match))
}

/// Open a new match. The creator takes the first seat and still owes their
/// stake.
#[utoipa::path(
    post,
    path = "/matches",
    tag = "matches",
    request_body = CreateMatchRequest,
    responses(
        (status = 200, description = "Match created", body = CreatedRoomResponse),
        (status = 400, description = "Invalid payload")
    )
)]
pub async fn create_match(
    State(state): State<SharedState>,
    Json(payload): Json<CreateMatchRequest>,
) -> Result<Json<CreatedRoomResponse>, AppError> {
    payload.validate()?;
    Ok(Json(match_service::create_match(&state, payload).await?))
}

/// Joinable public matches, newest first.
#[utoipa::path(
    get,
    path = "/matches/public",
    tag = "matches",
    responses((status = 200, description = "Public waiting matches", body = [RoomSummary]))
)]
pub async fn public_matches(
    State(state): State<SharedState>,
) -> Result<Json<Vec<RoomSummary>>, AppError> {
    Ok(Json(match_service::list_public(&state).await?))
}

/// Full match state for polling clients.
#[utoipa::path(
    get,
    path = "/matches/{code}",
    tag = "matches",
    params(("code" = String, Path, description = "Six-character match code")),
    responses(
        (status = 200, description = "Match state", body = RoomView),
        (status = 404, description = "Unknown match code")
    )
)]
pub async fn get_match(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<RoomView>, AppError> {
    check_code(&code)?;
    Ok(Json(match_service::get_match(&state, &code).await?))
}

/// Take the second seat of a waiting match.
#[utoipa::path(
    post,
    path = "/matches/{code}/join",
    tag = "matches",
    params(("code" = String, Path, description = "Six-character match code")),
    request_body = JoinRequest,
    responses(
        (status = 200, description = "Joined", body = RoomView),
        (status = 409, description = "Match full or already started")
    )
)]
pub async fn join_match(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<JoinRequest>,
) -> Result<Json<RoomView>, AppError> {
    check_code(&code)?;
    payload.validate()?;
    Ok(Json(match_service::join_match(&state, &code, payload).await?))
}

/// Pay one seat's stake; when both stakes are in, the match activates.
#[utoipa::path(
    post,
    path = "/matches/{code}/bets",
    tag = "matches",
    params(("code" = String, Path, description = "Six-character match code")),
    request_body = BetRequest,
    responses(
        (status = 200, description = "Stake recorded", body = RoomView),
        (status = 409, description = "Stake already paid or match started"),
        (status = 502, description = "All question sources failed")
    )
)]
pub async fn submit_bet(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<BetRequest>,
) -> Result<Json<RoomView>, AppError> {
    check_code(&code)?;
    payload.validate()?;
    Ok(Json(match_service::submit_bet(&state, &code, payload).await?))
}

/// Submit one answer, scored with the streak formula.
#[utoipa::path(
    post,
    path = "/matches/{code}/answers",
    tag = "matches",
    params(("code" = String, Path, description = "Six-character match code")),
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer recorded", body = RoomView),
        (status = 409, description = "Question advanced or already answered")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<AnswerRequest>,
) -> Result<Json<RoomView>, AppError> {
    check_code(&code)?;
    payload.validate()?;
    Ok(Json(
        match_service::submit_answer(&state, &code, payload).await?,
    ))
}

/// Creator moves to the next question, or finishes past the last one.
#[utoipa::path(
    post,
    path = "/matches/{code}/advance",
    tag = "matches",
    params(("code" = String, Path, description = "Six-character match code")),
    request_body = HostKeyRequest,
    responses(
        (status = 200, description = "Advanced", body = RoomView),
        (status = 403, description = "Wrong host key")
    )
)]
pub async fn advance_question(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<HostKeyRequest>,
) -> Result<Json<RoomView>, AppError> {
    check_code(&code)?;
    payload.validate()?;
    Ok(Json(match_service::advance(&state, &code, payload).await?))
}

/// Creator tears the match down.
#[utoipa::path(
    post,
    path = "/matches/{code}/end",
    tag = "matches",
    params(("code" = String, Path, description = "Six-character match code")),
    request_body = HostKeyRequest,
    responses(
        (status = 200, description = "Match ended", body = RoomView),
        (status = 409, description = "Match already terminal")
    )
)]
pub async fn end_match(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<HostKeyRequest>,
) -> Result<Json<RoomView>, AppError> {
    check_code(&code)?;
    payload.validate()?;
    Ok(Json(match_service::end(&state, &code, payload).await?))
}
