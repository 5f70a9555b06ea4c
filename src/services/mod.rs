//! Service layer between HTTP handlers and the storage layer.

pub mod admin_service;
pub mod documentation;
pub mod health_service;
pub mod match_service;
pub mod quiz_service;
pub mod room_service;
pub mod stats_service;
