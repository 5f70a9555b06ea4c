//! Validation helpers for DTOs.

use validator::ValidationError;

const ROOM_CODE_LENGTH: usize = 6;
const MAX_NAME_LENGTH: usize = 24;
const MAX_TOPIC_LENGTH: usize = 200;

/// Validates that a room code is exactly 6 uppercase base-36 characters.
///
/// # Examples
///
/// ```ignore
/// validate_room_code("A1B2C3") // Ok
/// validate_room_code("a1b2c3") // Err - lowercase
/// validate_room_code("A1B2C")  // Err - too short
/// ```
pub fn validate_room_code(code: &str) -> Result<(), ValidationError> {
    if code.len() != ROOM_CODE_LENGTH {
        let mut err = ValidationError::new("room_code_length");
        err.message = Some(
            format!(
                "Room code must be exactly {ROOM_CODE_LENGTH} characters (got {})",
                code.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        let mut err = ValidationError::new("room_code_format");
        err.message = Some("Room code must contain only uppercase letters and digits".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a display name.
///
/// Names become keys inside the stored answer map, so the characters BSON
/// forbids in keys (`.` and `$`) are rejected along with anything outside a
/// conservative charset.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_NAME_LENGTH {
        let mut err = ValidationError::new("display_name_length");
        err.message =
            Some(format!("Name must be between 1 and {MAX_NAME_LENGTH} characters").into());
        return Err(err);
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '_' || c == '-')
    {
        let mut err = ValidationError::new("display_name_format");
        err.message =
            Some("Name may contain only letters, digits, spaces, underscores and hyphens".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a quiz topic: non-empty after trimming, bounded length.
pub fn validate_topic(topic: &str) -> Result<(), ValidationError> {
    let trimmed = topic.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_TOPIC_LENGTH {
        let mut err = ValidationError::new("topic_length");
        err.message =
            Some(format!("Topic must be between 1 and {MAX_TOPIC_LENGTH} characters").into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_room_code_valid() {
        assert!(validate_room_code("A1B2C3").is_ok());
        assert!(validate_room_code("ZZZZZZ").is_ok());
        assert!(validate_room_code("000000").is_ok());
    }

    #[test]
    fn test_validate_room_code_invalid() {
        assert!(validate_room_code("A1B2C").is_err()); // too short
        assert!(validate_room_code("A1B2C3D").is_err()); // too long
        assert!(validate_room_code("a1b2c3").is_err()); // lowercase
        assert!(validate_room_code("A1B2C!").is_err()); // punctuation
        assert!(validate_room_code("").is_err()); // empty
    }

    #[test]
    fn test_validate_display_name_valid() {
        assert!(validate_display_name("Ada").is_ok());
        assert!(validate_display_name("Player One").is_ok());
        assert!(validate_display_name("quiz_fan-42").is_ok());
    }

    #[test]
    fn test_validate_display_name_invalid() {
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name("   ").is_err());
        assert!(validate_display_name(&"x".repeat(25)).is_err());
        assert!(validate_display_name("a.b").is_err()); // BSON key separator
        assert!(validate_display_name("$inc").is_err()); // BSON operator prefix
        assert!(validate_display_name("emoji 🦀").is_err());
    }

    #[test]
    fn test_validate_topic() {
        assert!(validate_topic("Roman history").is_ok());
        assert!(validate_topic("   ").is_err());
        assert!(validate_topic(&"t".repeat(201)).is_err());
    }
}
