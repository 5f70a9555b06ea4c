//! Trending-topic and solo-result payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{QuizProgressEntity, TrendingTopicEntity},
    dto::{
        format_datetime,
        room::QuestionView,
        validation::{validate_display_name, validate_topic},
    },
    quizgen::OPTIONS_PER_QUESTION,
    state::room::Difficulty,
};

/// Payload for bumping a topic's popularity counter.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct TrackTopicRequest {
    /// Topic as typed by the user.
    #[validate(custom(function = validate_topic))]
    pub topic: String,
}

/// One row of the trending listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct TrendingTopicView {
    /// Topic as last typed by a user.
    pub topic: String,
    /// Number of times the topic was requested.
    pub search_count: i64,
    /// RFC 3339 timestamp of the last request.
    pub last_searched: String,
}

impl From<TrendingTopicEntity> for TrendingTopicView {
    fn from(entity: TrendingTopicEntity) -> Self {
        Self {
            topic: entity.display_topic,
            search_count: entity.search_count,
            last_searched: format_datetime(entity.last_searched),
        }
    }
}

/// Payload for persisting a completed solo quiz.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveScoreRequest {
    /// Display name of the player.
    pub player_name: String,
    /// Quiz topic.
    pub topic: String,
    /// Difficulty played.
    pub difficulty: Difficulty,
    /// Number of correctly answered questions.
    pub correct_count: u32,
    /// Total number of questions in the quiz.
    pub total_questions: u32,
}

impl Validate for SaveScoreRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(err) = validate_display_name(&self.player_name) {
            errors.add("player_name", err);
        }
        if let Err(err) = validate_topic(&self.topic) {
            errors.add("topic", err);
        }
        if !(1..=20).contains(&self.total_questions) {
            let mut err = validator::ValidationError::new("total_questions_range");
            err.message = Some("Total questions must be between 1 and 20".into());
            errors.add("total_questions", err);
        }
        if self.correct_count > self.total_questions {
            let mut err = validator::ValidationError::new("correct_count_range");
            err.message = Some("Correct count cannot exceed the total".into());
            errors.add("correct_count", err);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Payload for saving an in-flight solo quiz.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveProgressRequest {
    /// Display name of the player.
    pub player_name: String,
    /// Quiz topic.
    pub topic: String,
    /// Difficulty being played.
    pub difficulty: Difficulty,
    /// Zero-based index of the next unanswered question.
    pub current_question: usize,
    /// Points accumulated so far.
    pub score: i64,
    /// The generated questions, so resuming replays the same quiz.
    pub questions: Vec<QuestionView>,
}

impl Validate for SaveProgressRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(err) = validate_display_name(&self.player_name) {
            errors.add("player_name", err);
        }
        if let Err(err) = validate_topic(&self.topic) {
            errors.add("topic", err);
        }
        if !(1..=20).contains(&self.questions.len()) {
            let mut err = validator::ValidationError::new("questions_range");
            err.message = Some("A quiz carries between 1 and 20 questions".into());
            errors.add("questions", err);
        } else if self.current_question >= self.questions.len() {
            let mut err = validator::ValidationError::new("current_question_range");
            err.message = Some("Current question is past the end of the quiz".into());
            errors.add("current_question", err);
        }
        for question in &self.questions {
            if question.options.len() != OPTIONS_PER_QUESTION
                || question.correct >= question.options.len()
            {
                let mut err = validator::ValidationError::new("question_shape");
                err.message = Some("Each question carries four options and a valid answer".into());
                errors.add("questions", err);
                break;
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Query identifying one saved quiz snapshot.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ProgressQuery {
    /// Display name of the player.
    #[validate(custom(function = validate_display_name))]
    pub player_name: String,
    /// Quiz topic.
    #[validate(custom(function = validate_topic))]
    pub topic: String,
    /// Difficulty being played.
    pub difficulty: Difficulty,
}

/// A saved quiz snapshot handed back to a resuming client.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProgressView {
    /// Zero-based index of the next unanswered question.
    pub current_question: usize,
    /// Points accumulated so far.
    pub score: i64,
    /// The questions as originally generated.
    pub questions: Vec<QuestionView>,
    /// RFC 3339 timestamp of the last save.
    pub last_saved: String,
}

impl From<QuizProgressEntity> for ProgressView {
    fn from(entity: QuizProgressEntity) -> Self {
        Self {
            current_question: entity.current_question,
            score: entity.score,
            questions: entity
                .questions
                .iter()
                .map(|question| QuestionView {
                    question: question.text.clone(),
                    options: question.options.clone(),
                    correct: question.correct,
                })
                .collect(),
            last_saved: format_datetime(entity.last_saved),
        }
    }
}

/// Response to a persisted solo result.
#[derive(Debug, Serialize, ToSchema)]
pub struct SavedScoreResponse {
    /// Aggregate points after the difficulty multiplier.
    pub points: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress_request() -> SaveProgressRequest {
        SaveProgressRequest {
            player_name: "Ada".into(),
            topic: "Math".into(),
            difficulty: Difficulty::Medium,
            current_question: 1,
            score: 25,
            questions: (0..3)
                .map(|i| QuestionView {
                    question: format!("Q{i}?"),
                    options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    correct: 0,
                })
                .collect(),
        }
    }

    #[test]
    fn progress_save_rejects_position_past_the_end() {
        assert!(progress_request().validate().is_ok());

        let request = SaveProgressRequest {
            current_question: 3,
            ..progress_request()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn progress_view_carries_the_snapshot_back_out() {
        let entity = QuizProgressEntity {
            player_name: "Ada".into(),
            topic: "Math".into(),
            difficulty: Difficulty::Easy,
            current_question: 2,
            score: 40,
            questions: vec![crate::dao::models::QuestionEntity {
                text: "Q?".into(),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct: 1,
            }],
            last_saved: mongodb::bson::DateTime::now(),
        };

        let view = ProgressView::from(entity);
        assert_eq!(view.current_question, 2);
        assert_eq!(view.score, 40);
        assert_eq!(view.questions[0].question, "Q?");
        assert_eq!(view.questions[0].correct, 1);
    }

    #[test]
    fn progress_save_rejects_malformed_questions() {
        let mut request = progress_request();
        request.questions[1].options.pop();
        assert!(request.validate().is_err());

        let mut request = progress_request();
        request.questions[0].correct = 4;
        assert!(request.validate().is_err());
    }

    #[test]
    fn save_score_rejects_impossible_counts() {
        let request = SaveScoreRequest {
            player_name: "Ada".into(),
            topic: "Math".into(),
            difficulty: Difficulty::Hard,
            correct_count: 6,
            total_questions: 5,
        };
        assert!(request.validate().is_err());

        let request = SaveScoreRequest {
            correct_count: 5,
            ..request
        };
        assert!(request.validate().is_ok());
    }
}
