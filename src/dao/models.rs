//! Persisted document shapes shared across the storage layer.

use std::collections::HashMap;

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::state::room::{Difficulty, RoomKind, RoomStatus};

/// Roster entry as stored inside the room document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Display name; duplicate names are distinct roster slots.
    pub name: String,
    /// Accumulated points.
    pub score: i64,
    /// Lobby ready flag.
    pub ready: bool,
    /// Whether the stake was paid (gamble matches only).
    pub bet_paid: bool,
}

/// Generated question as stored inside the room document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Question text.
    #[serde(rename = "question")]
    pub text: String,
    /// Exactly four answer options.
    pub options: Vec<String>,
    /// Zero-based index of the correct option.
    pub correct: usize,
}

/// One recorded answer inside the `player_answers` map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerEntity {
    /// Option index the player picked.
    pub answer: usize,
    /// Whether it matched the correct index.
    pub correct: bool,
    /// Points awarded.
    pub points: i64,
    /// Seconds remaining at submission time.
    pub time_left: u32,
}

/// Aggregate room/match document keyed by its six-character code.
///
/// Player names appear as keys inside `player_answers`, so names are
/// validated at the DTO layer to exclude characters BSON forbids in keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomEntity {
    /// Join code; the collection's primary key.
    #[serde(rename = "_id")]
    pub code: String,
    /// Multiplayer room or gamble match.
    pub kind: RoomKind,
    /// Display label of the creator.
    pub host_name: String,
    /// Secret proving host standing; never exposed in views.
    pub host_key: String,
    /// Quiz topic.
    pub topic: String,
    /// Quiz difficulty.
    pub difficulty: Difficulty,
    /// Number of questions to generate.
    pub question_count: u32,
    /// Seconds allowed per question.
    pub time_per_question: u32,
    /// Excluded from public listings when set.
    pub is_private: bool,
    /// Whether spectators may attach.
    pub allow_spectators: bool,
    /// Stake per player; zero for multiplayer rooms.
    pub bet_amount: i64,
    /// Roster in join order.
    pub players: Vec<PlayerEntity>,
    /// Spectator display names.
    pub spectators: Vec<String>,
    /// Lifecycle state.
    pub status: RoomStatus,
    /// Questions, empty until the quiz starts.
    pub questions: Vec<QuestionEntity>,
    /// Zero-based index of the question in play.
    pub current_question: usize,
    /// Set whenever `current_question` changes.
    pub question_start_time: Option<DateTime>,
    /// Player name → `q{index}` → recorded answer.
    pub player_answers: HashMap<String, HashMap<String, AnswerEntity>>,
    /// Sum of paid stakes.
    pub total_pot: i64,
    /// Creation timestamp.
    pub created_at: DateTime,
    /// Set when the host ends the room.
    pub ended_at: Option<DateTime>,
}

/// Trending topic counter, upserted every time a quiz is generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingTopicEntity {
    /// Normalized (trimmed, lowercased) topic used as the key.
    #[serde(rename = "_id")]
    pub topic: String,
    /// Topic as last typed by a user, for display.
    pub display_topic: String,
    /// Number of times the topic was requested.
    pub search_count: i64,
    /// Last time the topic was requested.
    pub last_searched: DateTime,
}

/// In-flight solo quiz snapshot, one per player/topic/difficulty triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizProgressEntity {
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
    pub questions: Vec<QuestionEntity>,
    /// Last save timestamp.
    pub last_saved: DateTime,
}

/// Completed solo quiz result persisted for history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResultEntity {
    /// Display name of the player.
    pub player_name: String,
    /// Quiz topic.
    pub topic: String,
    /// Number of correctly answered questions.
    pub correct_count: u32,
    /// Total number of questions in the quiz.
    pub total_questions: u32,
    /// Difficulty played.
    pub difficulty: Difficulty,
    /// Aggregate points after the difficulty multiplier.
    pub points: i64,
    /// Completion timestamp.
    pub completed_at: DateTime,
}
