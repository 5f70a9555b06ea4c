//! HTTP routing surface.

use axum::Router;

use crate::{dto::validation::validate_room_code, error::AppError, state::SharedState};

pub mod admin;
pub mod docs;
pub mod health;
pub mod matches;
pub mod quizzes;
pub mod rooms;
pub mod stats;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(rooms::router())
        .merge(matches::router())
        .merge(quizzes::router())
        .merge(stats::router())
        .merge(admin::router(state.clone()));

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}

/// Reject path codes that cannot be a room code before touching storage.
pub(crate) fn check_code(code: &str) -> Result<(), AppError> {
    validate_room_code(code)
        .map_err(|err| AppError::BadRequest(format!("invalid room code `{code}`: {err}")))
}
