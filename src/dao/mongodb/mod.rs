//! MongoDB connection management and error types.

mod error;
mod manager;

pub use error::{MongoDaoError, Result, is_duplicate_key};
pub use manager::{
    MongoManager, PROGRESS_COLLECTION, RESULT_COLLECTION, ROOM_COLLECTION, TOPIC_COLLECTION,
    connect, ensure_indexes,
};
