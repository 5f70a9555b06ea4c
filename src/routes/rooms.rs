//! Multiplayer room endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::room::{
        AnswerRequest, CreateRoomRequest, CreatedRoomResponse, HostKeyRequest, JoinRequest,
        KickRequest, MineQuery, ReadyRequest, RoomSummary, RoomView, SpectateRequest,
    },
    error::AppError,
    routes::check_code,
    services::room_service,
    state::SharedState,
};

/// Configure the multiplayer room subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/rooms", post(create_room))
        .route("/rooms/public", get(public_rooms))
        .route("/rooms/mine", get(my_rooms))
        .route("/rooms/{code}", get(get_room))
        .route("/rooms/{code}/join", post(join_room))
        .route("/rooms/{code}/spectate", post(spectate))
        .route("/rooms/{code}/ready", post(set_ready))
        .route("/rooms/{code}/kick", post(kick_player))
        .route("/rooms/{code}/start", post(start_quiz))
        .route("/rooms/{code}/answers", post(submit_answer))
        .route("/rooms/{code}/advance", post(advance_question))
        .route("/rooms/{code}/end", post(end_room))
}

/// Open a new room. The response is the only place the host key appears.
#[utoipa::path(
    post,
    path = "/rooms",
    tag = "rooms",
    request_body = CreateRoomRequest,
    responses(
        (status = 200, description = "Room created", body = CreatedRoomResponse),
        (status = 400, description = "Invalid payload"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<Json<CreatedRoomResponse>, AppError> {
    payload.validate()?;
    Ok(Json(room_service::create_room(&state, payload).await?))
}

/// Joinable public rooms, newest first. Polled every few seconds by lobby
/// browsers.
#[utoipa::path(
    get,
    path = "/rooms/public",
    tag = "rooms",
    responses((status = 200, description = "Public waiting rooms", body = [RoomSummary]))
)]
pub async fn public_rooms(
    State(state): State<SharedState>,
) -> Result<Json<Vec<RoomSummary>>, AppError> {
    Ok(Json(room_service::list_public(&state).await?))
}

/// Rooms created with the presented host key.
#[utoipa::path(
    get,
    path = "/rooms/mine",
    tag = "rooms",
    params(("host_key" = String, Query, description = "Secret issued at creation time")),
    responses((status = 200, description = "Rooms created with this key", body = [RoomSummary]))
)]
pub async fn my_rooms(
    State(state): State<SharedState>,
    Query(query): Query<MineQuery>,
) -> Result<Json<Vec<RoomSummary>>, AppError> {
    query.validate()?;
    Ok(Json(room_service::list_mine(&state, &query.host_key).await?))
}

/// Full room state; the poller contract is that this response replaces the
/// client's view wholesale.
#[utoipa::path(
    get,
    path = "/rooms/{code}",
    tag = "rooms",
    params(("code" = String, Path, description = "Six-character room code")),
    responses(
        (status = 200, description = "Room state", body = RoomView),
        (status = 404, description = "Unknown room code")
    )
)]
pub async fn get_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<RoomView>, AppError> {
    check_code(&code)?;
    Ok(Json(room_service::get_room(&state, &code).await?))
}

/// Join a waiting room.
#[utoipa::path(
    post,
    path = "/rooms/{code}/join",
    tag = "rooms",
    params(("code" = String, Path, description = "Six-character room code")),
    request_body = JoinRequest,
    responses(
        (status = 200, description = "Joined", body = RoomView),
        (status = 404, description = "Unknown room code"),
        (status = 409, description = "Room full or already started")
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<JoinRequest>,
) -> Result<Json<RoomView>, AppError> {
    check_code(&code)?;
    payload.validate()?;
    Ok(Json(room_service::join_room(&state, &code, payload).await?))
}

/// Attach as a spectator.
#[utoipa::path(
    post,
    path = "/rooms/{code}/spectate",
    tag = "rooms",
    params(("code" = String, Path, description = "Six-character room code")),
    request_body = SpectateRequest,
    responses(
        (status = 200, description = "Attached", body = RoomView),
        (status = 409, description = "Spectators disabled, full, or room started")
    )
)]
pub async fn spectate(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<SpectateRequest>,
) -> Result<Json<RoomView>, AppError> {
    check_code(&code)?;
    payload.validate()?;
    Ok(Json(room_service::spectate(&state, &code, payload).await?))
}

/// Toggle the lobby ready flag.
#[utoipa::path(
    post,
    path = "/rooms/{code}/ready",
    tag = "rooms",
    params(("code" = String, Path, description = "Six-character room code")),
    request_body = ReadyRequest,
    responses((status = 200, description = "Flag updated", body = RoomView))
)]
pub async fn set_ready(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<ReadyRequest>,
) -> Result<Json<RoomView>, AppError> {
    check_code(&code)?;
    payload.validate()?;
    Ok(Json(room_service::set_ready(&state, &code, payload).await?))
}

/// Host removes a player from the lobby.
#[utoipa::path(
    post,
    path = "/rooms/{code}/kick",
    tag = "rooms",
    params(("code" = String, Path, description = "Six-character room code")),
    request_body = KickRequest,
    responses(
        (status = 200, description = "Player removed", body = RoomView),
        (status = 403, description = "Wrong host key or self-kick")
    )
)]
pub async fn kick_player(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<KickRequest>,
) -> Result<Json<RoomView>, AppError> {
    check_code(&code)?;
    payload.validate()?;
    Ok(Json(room_service::kick(&state, &code, payload).await?))
}

/// Host starts the quiz; questions are generated before the transition.
#[utoipa::path(
    post,
    path = "/rooms/{code}/start",
    tag = "rooms",
    params(("code" = String, Path, description = "Six-character room code")),
    request_body = HostKeyRequest,
    responses(
        (status = 200, description = "Quiz started", body = RoomView),
        (status = 403, description = "Wrong host key"),
        (status = 409, description = "Not enough players or already started"),
        (status = 502, description = "All question sources failed")
    )
)]
pub async fn start_quiz(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<HostKeyRequest>,
) -> Result<Json<RoomView>, AppError> {
    check_code(&code)?;
    payload.validate()?;
    Ok(Json(room_service::start(&state, &code, payload).await?))
}

/// Submit one answer for the question in play.
#[utoipa::path(
    post,
    path = "/rooms/{code}/answers",
    tag = "rooms",
    params(("code" = String, Path, description = "Six-character room code")),
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
        room_service::submit_answer(&state, &code, payload).await?,
    ))
}

/// Host moves to the next question, or finishes past the last one.
#[utoipa::path(
    post,
    path = "/rooms/{code}/advance",
    tag = "rooms",
    params(("code" = String, Path, description = "Six-character room code")),
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
    Ok(Json(room_service::advance(&state, &code, payload).await?))
}

/// Host tears the room down.
#[utoipa::path(
    post,
    path = "/rooms/{code}/end",
    tag = "rooms",
    params(("code" = String, Path, description = "Six-character room code")),
    request_body = HostKeyRequest,
    responses(
        (status = 200, description = "Room ended", body = RoomView),
        (status = 409, description = "Room already terminal")
    )
)]
pub async fn end_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<HostKeyRequest>,
) -> Result<Json<RoomView>, AppError> {
    check_code(&code)?;
    payload.validate()?;
    Ok(Json(room_service::end(&state, &code, payload).await?))
}
