//! Request and response shapes for the HTTP surface.

use mongodb::bson::DateTime;

pub mod admin;
pub mod health;
pub mod quiz;
pub mod room;
pub mod stats;
pub mod validation;

fn format_datetime(time: DateTime) -> String {
    time.try_to_rfc3339_string()
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
