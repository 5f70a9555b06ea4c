//! Administrative payloads.

use serde::Serialize;
use utoipa::ToSchema;

/// Response to the administrative room purge.
#[derive(Debug, Serialize, ToSchema)]
pub struct PurgeResponse {
    /// Number of room documents removed.
    pub deleted: u64,
}
