//! Health payloads.

use serde::Serialize;
use utoipa::ToSchema;

/// Body of the `/healthcheck` response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `"ok"` when storage is reachable, `"degraded"` while it is not.
    pub status: String,
}

impl HealthResponse {
    /// Storage reachable; the full API is available.
    pub fn ok() -> Self {
        Self {
            status: "ok".into(),
        }
    }

    /// Storage is down; room and stats operations answer 503.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".into(),
        }
    }
}
