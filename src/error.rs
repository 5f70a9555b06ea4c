//! Service and HTTP error taxonomy.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::{
    dao::mongodb::MongoDaoError, quizgen::QuizGenError, state::lifecycle::LifecycleError,
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend rejected or lost the operation.
    #[error("storage unavailable")]
    Unavailable(#[source] MongoDaoError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Authenticated but not allowed to perform this action.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// An external collaborator failed.
    #[error("upstream failure")]
    Upstream(#[source] QuizGenError),
}

impl From<MongoDaoError> for ServiceError {
    fn from(err: MongoDaoError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<QuizGenError> for ServiceError {
    fn from(err: QuizGenError) -> Self {
        ServiceError::Upstream(err)
    }
}

impl From<LifecycleError> for ServiceError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::NotHost | LifecycleError::CannotKickSelf => {
                ServiceError::Forbidden(err.to_string())
            }
            LifecycleError::KindMismatch { .. } | LifecycleError::UnknownPlayer { .. } => {
                ServiceError::NotFound(err.to_string())
            }
            LifecycleError::AnswerOutOfRange { .. } => ServiceError::InvalidInput(err.to_string()),
            _ => ServiceError::InvalidState(err.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {err}"))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Authenticated but not allowed to perform this action.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// An external collaborator failed.
    #[error("bad gateway: {0}")]
    BadGateway(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::Forbidden(message) => AppError::Forbidden(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Upstream(source) => AppError::BadGateway(source.to_string()),
        }
    }
}

/// JSON body attached to every error response.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable description of the failure.
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::room::RoomStatus;

    #[test]
    fn kind_mismatch_maps_to_not_found() {
        let err = LifecycleError::KindMismatch {
            code: "ABC123".into(),
            actual: "multiplayer",
        };
        let service: ServiceError = err.into();
        assert!(matches!(service, ServiceError::NotFound(_)));
        assert!(matches!(AppError::from(service), AppError::NotFound(_)));
    }

    #[test]
    fn other_guards_keep_their_classes() {
        assert!(matches!(
            ServiceError::from(LifecycleError::NotHost),
            ServiceError::Forbidden(_)
        ));
        assert!(matches!(
            ServiceError::from(LifecycleError::NotWaiting {
                status: RoomStatus::Playing
            }),
            ServiceError::InvalidState(_)
        ));
    }
}
