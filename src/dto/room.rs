//! Room and match payloads.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::{
        format_datetime,
        validation::{validate_display_name, validate_topic},
    },
    state::room::{AnswerRecord, Difficulty, Player, Question, Room, RoomKind, RoomStatus},
};

/// Payload used to open a new multiplayer room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateRoomRequest {
    /// Display name of the creator; they join the roster immediately.
    #[validate(custom(function = validate_display_name))]
    pub host_name: String,
    /// Quiz topic the questions are generated for.
    #[validate(custom(function = validate_topic))]
    pub topic: String,
    /// Quiz difficulty.
    pub difficulty: Difficulty,
    /// Number of questions to generate.
    #[validate(range(min = 1, max = 20))]
    pub question_count: u32,
    /// Seconds per question; defaults to 30.
    #[serde(default)]
    #[validate(range(min = 5, max = 120))]
    pub time_per_question: Option<u32>,
    /// Hide the room from public listings.
    #[serde(default)]
    pub is_private: bool,
    /// Whether spectators may attach.
    #[serde(default = "default_allow_spectators")]
    pub allow_spectators: bool,
}

fn default_allow_spectators() -> bool {
    true
}

/// Payload used to open a new wagered head-to-head match.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateMatchRequest {
    /// Display name of the creator; they take the first seat.
    #[validate(custom(function = validate_display_name))]
    pub host_name: String,
    /// Quiz topic the questions are generated for.
    #[validate(custom(function = validate_topic))]
    pub topic: String,
    /// Quiz difficulty.
    pub difficulty: Difficulty,
    /// Number of questions to generate.
    #[validate(range(min = 1, max = 20))]
    pub question_count: u32,
    /// Stake each player must pay before the match starts.
    #[validate(range(min = 1, max = 1_000_000))]
    pub bet_amount: i64,
    /// Hide the match from public listings.
    #[serde(default)]
    pub is_private: bool,
}

/// Payload for joining a room or match.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinRequest {
    /// Display name to register on the roster.
    #[validate(custom(function = validate_display_name))]
    pub player_name: String,
}

/// Payload for attaching as a spectator.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SpectateRequest {
    /// Display name shown in the spectator list.
    #[validate(custom(function = validate_display_name))]
    pub spectator_name: String,
}

/// Payload for toggling the lobby ready flag.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ReadyRequest {
    /// Roster entry to update.
    #[validate(custom(function = validate_display_name))]
    pub player_name: String,
    /// New value of the ready flag.
    pub ready: bool,
}

/// Payload for removing a player from the lobby.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct KickRequest {
    /// Secret issued to the creator.
    #[validate(length(min = 1))]
    pub host_key: String,
    /// Roster entry to remove.
    #[validate(custom(function = validate_display_name))]
    pub target_name: String,
}

/// Payload for host-only actions carrying no other data.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct HostKeyRequest {
    /// Secret issued to the creator.
    #[validate(length(min = 1))]
    pub host_key: String,
}

/// Payload for paying a match stake.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct BetRequest {
    /// Seat the stake is paid for.
    #[validate(custom(function = validate_display_name))]
    pub player_name: String,
}

/// Payload for submitting one answer.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AnswerRequest {
    /// Roster entry answering.
    #[validate(custom(function = validate_display_name))]
    pub player_name: String,
    /// Zero-based index of the question being answered.
    pub question_index: usize,
    /// Zero-based index of the picked option.
    pub answer_index: usize,
    /// Seconds remaining on the question clock at submission.
    #[validate(range(max = 120))]
    pub time_left: u32,
}

/// Query parameters for the creator's own room listing.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct MineQuery {
    /// Secret issued at creation time.
    #[validate(length(min = 1))]
    pub host_key: String,
}

/// One roster entry in a room view.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerView {
    /// Display name.
    pub name: String,
    /// Accumulated points.
    pub score: i64,
    /// Lobby ready flag.
    pub ready: bool,
    /// Whether the stake was paid (matches only).
    pub bet_paid: bool,
}

/// One question in a room view, and in progress snapshots on the way back in.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuestionView {
    /// Question text.
    pub question: String,
    /// The four answer options.
    pub options: Vec<String>,
    /// Zero-based index of the correct option.
    pub correct: usize,
}

/// One recorded answer in a room view.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerView {
    /// Option index the player picked.
    pub answer: usize,
    /// Whether it matched the correct index.
    pub correct: bool,
    /// Points awarded.
    pub points: i64,
    /// Seconds remaining at submission time.
    pub time_left: u32,
}

/// Full state of one room, returned to polling clients.
///
/// The response replaces the client's view wholesale; the host key is never
/// part of it.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomView {
    /// Join code.
    pub code: String,
    /// Multiplayer room or gamble match.
    pub kind: RoomKind,
    /// Display name of the creator.
    pub host_name: String,
    /// Quiz topic.
    pub topic: String,
    /// Quiz difficulty.
    pub difficulty: Difficulty,
    /// Number of questions.
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
    pub players: Vec<PlayerView>,
    /// Spectator display names.
    pub spectators: Vec<String>,
    /// Lifecycle state.
    pub status: RoomStatus,
    /// Questions, empty until the quiz starts.
    pub questions: Vec<QuestionView>,
    /// Zero-based index of the question in play.
    pub current_question: usize,
    /// RFC 3339 timestamp of the last question change.
    pub question_start_time: Option<String>,
    /// Player name → `q{index}` → recorded answer.
    pub player_answers: HashMap<String, HashMap<String, AnswerView>>,
    /// Sum of paid stakes.
    pub total_pot: i64,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// RFC 3339 timestamp set when the host ends the room.
    pub ended_at: Option<String>,
}

/// Response to a successful room or match creation.
///
/// The only place the host key ever appears.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedRoomResponse {
    /// Join code to share with other players.
    pub code: String,
    /// Secret proving host standing on this room.
    pub host_key: String,
    /// Initial room state.
    pub room: RoomView,
}

/// One row in a public or per-host listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomSummary {
    /// Join code.
    pub code: String,
    /// Display name of the creator.
    pub host_name: String,
    /// Quiz topic.
    pub topic: String,
    /// Quiz difficulty.
    pub difficulty: Difficulty,
    /// Number of questions.
    pub question_count: u32,
    /// Current roster size.
    pub player_count: usize,
    /// Roster cap for this kind.
    pub player_cap: usize,
    /// Lifecycle state.
    pub status: RoomStatus,
    /// Stake per player; zero for multiplayer rooms.
    pub bet_amount: i64,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            name: player.name.clone(),
            score: player.score,
            ready: player.ready,
            bet_paid: player.bet_paid,
        }
    }
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        Self {
            question: question.text.clone(),
            options: question.options.clone(),
            correct: question.correct,
        }
    }
}

impl From<QuestionView> for Question {
    fn from(view: QuestionView) -> Self {
        Self {
            text: view.question,
            options: view.options,
            correct: view.correct,
        }
    }
}

impl From<&AnswerRecord> for AnswerView {
    fn from(record: &AnswerRecord) -> Self {
        Self {
            answer: record.answer,
            correct: record.correct,
            points: record.points,
            time_left: record.time_left,
        }
    }
}

impl From<&Room> for RoomView {
    fn from(room: &Room) -> Self {
        Self {
            code: room.code.clone(),
            kind: room.kind,
            host_name: room.host_name.clone(),
            topic: room.config.topic.clone(),
            difficulty: room.config.difficulty,
            question_count: room.config.question_count,
            time_per_question: room.config.time_per_question,
            is_private: room.config.is_private,
            allow_spectators: room.config.allow_spectators,
            bet_amount: room.config.bet_amount,
            players: room.players.iter().map(Into::into).collect(),
            spectators: room.spectators.clone(),
            status: room.status,
            questions: room.questions.iter().map(Into::into).collect(),
            current_question: room.current_question,
            question_start_time: room.question_start_time.map(format_datetime),
            player_answers: room
                .player_answers
                .iter()
                .map(|(name, answers)| {
                    (
                        name.clone(),
                        answers
                            .iter()
                            .map(|(slot, record)| (slot.clone(), record.into()))
                            .collect(),
                    )
                })
                .collect(),
            total_pot: room.total_pot,
            created_at: format_datetime(room.created_at),
            ended_at: room.ended_at.map(format_datetime),
        }
    }
}

impl From<&Room> for RoomSummary {
    fn from(room: &Room) -> Self {
        Self {
            code: room.code.clone(),
            host_name: room.host_name.clone(),
            topic: room.config.topic.clone(),
            difficulty: room.config.difficulty,
            question_count: room.config.question_count,
            player_count: room.players.len(),
            player_cap: room.kind.player_cap(),
            status: room.status,
            bet_amount: room.config.bet_amount,
            created_at: format_datetime(room.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::room::{DEFAULT_TIME_PER_QUESTION, RoomConfig};

    fn sample_room() -> Room {
        Room::new(
            RoomKind::Multiplayer,
            "Ada".into(),
            RoomConfig {
                topic: "Math".into(),
                difficulty: Difficulty::Easy,
                question_count: 5,
                time_per_question: DEFAULT_TIME_PER_QUESTION,
                is_private: false,
                allow_spectators: true,
                bet_amount: 0,
            },
        )
    }

    #[test]
    fn room_view_never_carries_the_host_key() {
        let room = sample_room();
        let view = RoomView::from(&room);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains(&room.host_key));
        assert!(!json.contains("host_key"));
    }

    #[test]
    fn create_room_request_validates_names_and_ranges() {
        let valid = CreateRoomRequest {
            host_name: "Ada".into(),
            topic: "Math".into(),
            difficulty: Difficulty::Easy,
            question_count: 5,
            time_per_question: Some(30),
            is_private: false,
            allow_spectators: true,
        };
        assert!(valid.validate().is_ok());

        let bad_name = CreateRoomRequest {
            host_name: "a.b".into(),
            ..valid_request()
        };
        assert!(bad_name.validate().is_err());

        let bad_count = CreateRoomRequest {
            question_count: 0,
            ..valid_request()
        };
        assert!(bad_count.validate().is_err());
    }

    fn valid_request() -> CreateRoomRequest {
        CreateRoomRequest {
            host_name: "Ada".into(),
            topic: "Math".into(),
            difficulty: Difficulty::Easy,
            question_count: 5,
            time_per_question: None,
            is_private: false,
            allow_spectators: true,
        }
    }

    #[test]
    fn match_request_requires_positive_stake() {
        let request = CreateMatchRequest {
            host_name: "Ada".into(),
            topic: "Math".into(),
            difficulty: Difficulty::Hard,
            question_count: 5,
            bet_amount: 0,
            is_private: false,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn summary_reports_roster_occupancy() {
        let room = sample_room();
        let summary = RoomSummary::from(&room);
        assert_eq!(summary.player_count, 1);
        assert_eq!(summary.player_cap, 8);
    }
}
