//! Administrative operations.

use tracing::warn;

use crate::{dto::admin::PurgeResponse, error::ServiceError, state::SharedState};

/// Delete every room and match document.
pub async fn purge_rooms(state: &SharedState) -> Result<PurgeResponse, ServiceError> {
    let stores = state.require_stores().await?;
    let deleted = stores.rooms.delete_all().await?;
    warn!(deleted, "all rooms purged by administrator");
    Ok(PurgeResponse { deleted })
}
