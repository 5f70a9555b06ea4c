//! Storage-layer error taxonomy.

use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;

/// Convenience alias used across the storage layer.
pub type Result<T> = std::result::Result<T, MongoDaoError>;

/// Failures surfaced by the MongoDB storage layer.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI did not parse.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// URI as supplied.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Client construction from parsed options failed.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The initial connection ping never succeeded.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Attempts made before giving up.
        attempts: u32,
        /// Driver error from the last attempt.
        #[source]
        source: MongoError,
    },
    /// A periodic health ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Index creation failed at startup.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection involved.
        collection: &'static str,
        /// Index name.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Inserting a new room document failed.
    #[error("failed to insert room `{code}`")]
    InsertRoom {
        /// Room code.
        code: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Loading a room document failed.
    #[error("failed to load room `{code}`")]
    LoadRoom {
        /// Room code.
        code: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A conditional room update failed at the driver level.
    #[error("failed to apply `{op}` to room `{code}`")]
    UpdateRoom {
        /// Operation label.
        op: &'static str,
        /// Room code.
        code: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A room listing query failed.
    #[error("failed to list rooms")]
    ListRooms {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The administrative bulk delete failed.
    #[error("failed to delete rooms")]
    DeleteRooms {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Upserting a trending-topic counter failed.
    #[error("failed to track topic `{topic}`")]
    TrackTopic {
        /// Normalized topic.
        topic: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The trending-topic listing failed.
    #[error("failed to list trending topics")]
    ListTopics {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Upserting an in-flight quiz snapshot failed.
    #[error("failed to save quiz progress for `{player}`")]
    SaveProgress {
        /// Player name on the snapshot.
        player: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Loading an in-flight quiz snapshot failed.
    #[error("failed to load quiz progress for `{player}`")]
    LoadProgress {
        /// Player name queried.
        player: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Deleting an in-flight quiz snapshot failed.
    #[error("failed to clear quiz progress for `{player}`")]
    ClearProgress {
        /// Player name on the snapshot.
        player: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Persisting a completed solo result failed.
    #[error("failed to save quiz result for `{player}`")]
    SaveResult {
        /// Player name on the result.
        player: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
}

/// Whether a driver error is a duplicate-key write rejection. Room codes are
/// the collection's `_id`, so a code collision surfaces this way and the
/// caller retries with a fresh code.
pub fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) => write.code == 11000,
        _ => false,
    }
}
