//! Administrative endpoints guarded by the admin token header.

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::delete,
};

use crate::{dto::admin::PurgeResponse, error::AppError, services::admin_service, state::SharedState};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Admin-only management endpoints.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/rooms", delete(purge_rooms))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// Delete every room and match document.
#[utoipa::path(
    delete,
    path = "/admin/rooms",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Administrative token")),
    responses(
        (status = 200, description = "Rooms purged", body = PurgeResponse),
        (status = 401, description = "Missing or wrong admin token")
    )
)]
pub async fn purge_rooms(
    State(state): State<SharedState>,
) -> Result<Json<PurgeResponse>, AppError> {
    Ok(Json(admin_service::purge_rooms(&state).await?))
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.admin_token() else {
        return Err(AppError::Unauthorized(
            "administrative endpoints are disabled".into(),
        ));
    };

    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    if provided != expected {
        return Err(AppError::Unauthorized("invalid admin token".into()));
    }

    Ok(next.run(req).await)
}
