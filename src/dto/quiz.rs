//! Solo quiz generation payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{room::QuestionView, validation::validate_topic},
    state::room::Difficulty,
};

const MAX_SOURCE_TEXT_LENGTH: usize = 20_000;

/// Payload for generating a standalone quiz.
///
/// Either a topic or a source text must be supplied; when both are present
/// the source text wins.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateQuizRequest {
    /// Free-text topic.
    #[serde(default)]
    pub topic: Option<String>,
    /// Quiz difficulty.
    pub difficulty: Difficulty,
    /// Number of questions to generate.
    pub count: u32,
    /// When set, questions are drawn only from this text.
    #[serde(default)]
    pub source_text: Option<String>,
}

impl Validate for GenerateQuizRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !(1..=20).contains(&self.count) {
            let mut err = validator::ValidationError::new("count_range");
            err.message = Some("Count must be between 1 and 20".into());
            errors.add("count", err);
        }

        match (&self.topic, &self.source_text) {
            (None, None) => {
                let mut err = validator::ValidationError::new("topic_or_source");
                err.message = Some("Either a topic or a source text is required".into());
                errors.add("topic", err);
            }
            (Some(topic), None) => {
                if let Err(err) = validate_topic(topic) {
                    errors.add("topic", err);
                }
            }
            (_, Some(text)) => {
                if text.trim().is_empty() || text.len() > MAX_SOURCE_TEXT_LENGTH {
                    let mut err = validator::ValidationError::new("source_text_length");
                    err.message = Some(
                        format!("Source text must be between 1 and {MAX_SOURCE_TEXT_LENGTH} characters")
                            .into(),
                    );
                    errors.add("source_text", err);
                }
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// A generated quiz ready to play.
#[derive(Debug, Serialize, ToSchema)]
pub struct GeneratedQuizResponse {
    /// The questions.
    pub questions: Vec<QuestionView>,
    /// Label of the source that produced them.
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_topic_or_source_text() {
        let neither = GenerateQuizRequest {
            topic: None,
            difficulty: Difficulty::Easy,
            count: 5,
            source_text: None,
        };
        assert!(neither.validate().is_err());

        let topical = GenerateQuizRequest {
            topic: Some("Chemistry".into()),
            difficulty: Difficulty::Easy,
            count: 5,
            source_text: None,
        };
        assert!(topical.validate().is_ok());

        let sourced = GenerateQuizRequest {
            topic: None,
            difficulty: Difficulty::Easy,
            count: 5,
            source_text: Some("Some lecture notes.".into()),
        };
        assert!(sourced.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_count() {
        let request = GenerateQuizRequest {
            topic: Some("Chemistry".into()),
            difficulty: Difficulty::Easy,
            count: 0,
            source_text: None,
        };
        assert!(request.validate().is_err());
    }
}
