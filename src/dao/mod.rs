//! Persistence layer: connection management, document shapes, repositories.

pub mod models;
pub mod mongodb;
pub mod room;
pub mod stats;
