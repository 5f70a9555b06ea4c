//! Runtime representation of quiz rooms and wagered matches.

use std::collections::HashMap;
use std::fmt;

use mongodb::bson::DateTime;
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dao::models::{AnswerEntity, PlayerEntity, QuestionEntity, RoomEntity};

/// Number of characters in a room code.
pub const ROOM_CODE_LENGTH: usize = 6;
/// Maximum roster size for a multiplayer room.
pub const MULTIPLAYER_PLAYER_CAP: usize = 8;
/// Maximum roster size for a gamble match (always head-to-head).
pub const GAMBLE_PLAYER_CAP: usize = 2;
/// Maximum number of spectators in a multiplayer room.
pub const SPECTATOR_CAP: usize = 20;
/// Seconds granted per question when the creator does not override it.
pub const DEFAULT_TIME_PER_QUESTION: u32 = 30;

const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const HEX_ALPHABET: &[u8] = b"0123456789abcdef";
const HOST_KEY_LENGTH: usize = 32;

/// Discriminates multiplayer rooms from wagered matches.
///
/// Both share the same document shape and lifecycle; the kind only changes
/// the roster cap and which start guard applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RoomKind {
    /// Free-for-all room, host-started, up to eight players.
    Multiplayer,
    /// Head-to-head match that starts once both bets are paid.
    Gamble,
}

impl RoomKind {
    /// Roster cap for this kind of room.
    pub fn player_cap(self) -> usize {
        match self {
            RoomKind::Multiplayer => MULTIPLAYER_PLAYER_CAP,
            RoomKind::Gamble => GAMBLE_PLAYER_CAP,
        }
    }

    /// Stable string used in persisted documents and update filters.
    pub fn as_str(self) -> &'static str {
        match self {
            RoomKind::Multiplayer => "multiplayer",
            RoomKind::Gamble => "gamble",
        }
    }
}

/// Lifecycle states a room moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Roster is assembling; joins, ready toggles and kicks are legal.
    Waiting,
    /// Quiz in progress; answers and advances are legal.
    Playing,
    /// Quiz ran to completion naturally.
    Finished,
    /// Host tore the room down before completion.
    Ended,
}

impl RoomStatus {
    /// Whether no further roster or answer mutations are accepted.
    pub fn is_terminal(self) -> bool {
        matches!(self, RoomStatus::Finished | RoomStatus::Ended)
    }

    /// Stable string used in persisted documents and update filters.
    pub fn as_str(self) -> &'static str {
        match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Playing => "playing",
            RoomStatus::Finished => "finished",
            RoomStatus::Ended => "ended",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quiz difficulty selected at room creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Basic recall questions.
    Easy,
    /// Application of concepts.
    Medium,
    /// Analysis and synthesis.
    Hard,
}

impl Difficulty {
    /// Stable string used in prompts and persisted documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// A generated multiple-choice question.
///
/// Serde field names follow the contract with the question providers, which
/// return `{"question", "options", "correct"}` objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question text shown to players.
    #[serde(rename = "question")]
    pub text: String,
    /// Exactly four answer options.
    pub options: Vec<String>,
    /// Zero-based index of the correct option.
    pub correct: usize,
}

/// Roster entry tracked during a room's lifetime.
///
/// Names are not unique; duplicate display names are distinct slots and all
/// name-addressed mutations match by exact string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Display name chosen by the player.
    pub name: String,
    /// Accumulated points for this room.
    pub score: i64,
    /// Lobby ready flag, only meaningful while waiting.
    pub ready: bool,
    /// Whether the stake was paid (gamble matches only).
    pub bet_paid: bool,
}

impl Player {
    /// Fresh roster entry with zeroed progress.
    pub fn new(name: String) -> Self {
        Self {
            name,
            score: 0,
            ready: false,
            bet_paid: false,
        }
    }
}

/// One recorded answer for one player on one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    /// Option index the player picked.
    pub answer: usize,
    /// Whether it matched the question's correct index.
    pub correct: bool,
    /// Points awarded for this answer.
    pub points: i64,
    /// Seconds remaining on the client countdown at submission time.
    pub time_left: u32,
}

/// Immutable quiz configuration captured at creation time.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Topic the questions are generated about.
    pub topic: String,
    /// Requested difficulty.
    pub difficulty: Difficulty,
    /// Number of questions to generate.
    pub question_count: u32,
    /// Seconds allowed per question.
    pub time_per_question: u32,
    /// Hidden from public listings (still joinable by code).
    pub is_private: bool,
    /// Whether spectators may attach to the room.
    pub allow_spectators: bool,
    /// Stake per player; zero for multiplayer rooms.
    pub bet_amount: i64,
}

/// Aggregated state for a room or match, addressed by its code.
#[derive(Debug, Clone)]
pub struct Room {
    /// Six-character join code, unique within the store.
    pub code: String,
    /// Multiplayer room or gamble match.
    pub kind: RoomKind,
    /// Display label of the creator.
    pub host_name: String,
    /// Secret issued to the creator; authoritative for host-only actions.
    pub host_key: String,
    /// Quiz configuration, immutable after creation.
    pub config: RoomConfig,
    /// Roster in join order.
    pub players: Vec<Player>,
    /// Spectator display names (multiplayer only).
    pub spectators: Vec<String>,
    /// Current lifecycle state.
    pub status: RoomStatus,
    /// Questions, populated at the waiting → playing transition.
    pub questions: Vec<Question>,
    /// Zero-based index into `questions`; advances monotonically.
    pub current_question: usize,
    /// Set whenever `current_question` changes.
    pub question_start_time: Option<DateTime>,
    /// Per player name, per `q{index}` slot, the recorded answer.
    pub player_answers: HashMap<String, HashMap<String, AnswerRecord>>,
    /// Sum of paid stakes (gamble matches only).
    pub total_pot: i64,
    /// Creation timestamp.
    pub created_at: DateTime,
    /// Set when the host ends the room.
    pub ended_at: Option<DateTime>,
}

impl Room {
    /// Build a fresh room in the waiting state with the creator as the only
    /// roster entry. Code and host key are generated here; code collisions
    /// are left to the store's unique index.
    pub fn new(kind: RoomKind, host_name: String, config: RoomConfig) -> Self {
        Self {
            code: generate_room_code(),
            kind,
            host_key: generate_host_key(),
            config,
            players: vec![Player::new(host_name.clone())],
            spectators: Vec::new(),
            status: RoomStatus::Waiting,
            questions: Vec::new(),
            current_question: 0,
            question_start_time: None,
            player_answers: HashMap::new(),
            total_pot: 0,
            created_at: DateTime::now(),
            ended_at: None,
            host_name,
        }
    }

    /// Look up a roster entry by exact display name.
    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|player| player.name == name)
    }

    /// Whether every roster entry has paid its stake.
    pub fn all_bets_paid(&self) -> bool {
        self.players.iter().all(|player| player.bet_paid)
    }

    /// Whether `name` already has a recorded answer for `question_index`.
    pub fn has_answered(&self, name: &str, question_index: usize) -> bool {
        self.player_answers
            .get(name)
            .is_some_and(|answers| answers.contains_key(&answer_slot(question_index)))
    }

    /// Whether the provided secret matches the creator's host key.
    pub fn is_host_key(&self, key: &str) -> bool {
        self.host_key == key
    }
}

/// Map key used for one question inside a player's answer map.
pub fn answer_slot(question_index: usize) -> String {
    format!("q{question_index}")
}

/// Random base-36 code, uppercased. Collisions against existing rooms are
/// not checked here; the store's unique index rejects the rare duplicate.
pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Random hex secret handed to the room creator exactly once.
pub fn generate_host_key() -> String {
    let mut rng = rand::rng();
    (0..HOST_KEY_LENGTH)
        .map(|_| HEX_ALPHABET[rng.random_range(0..HEX_ALPHABET.len())] as char)
        .collect()
}

impl From<QuestionEntity> for Question {
    fn from(value: QuestionEntity) -> Self {
        Self {
            text: value.text,
            options: value.options,
            correct: value.correct,
        }
    }
}

impl From<Question> for QuestionEntity {
    fn from(value: Question) -> Self {
        Self {
            text: value.text,
            options: value.options,
            correct: value.correct,
        }
    }
}

impl From<PlayerEntity> for Player {
    fn from(value: PlayerEntity) -> Self {
        Self {
            name: value.name,
            score: value.score,
            ready: value.ready,
            bet_paid: value.bet_paid,
        }
    }
}

impl From<Player> for PlayerEntity {
    fn from(value: Player) -> Self {
        Self {
            name: value.name,
            score: value.score,
            ready: value.ready,
            bet_paid: value.bet_paid,
        }
    }
}

impl From<AnswerEntity> for AnswerRecord {
    fn from(value: AnswerEntity) -> Self {
        Self {
            answer: value.answer,
            correct: value.correct,
            points: value.points,
            time_left: value.time_left,
        }
    }
}

impl From<AnswerRecord> for AnswerEntity {
    fn from(value: AnswerRecord) -> Self {
        Self {
            answer: value.answer,
            correct: value.correct,
            points: value.points,
            time_left: value.time_left,
        }
    }
}

impl From<RoomEntity> for Room {
    fn from(value: RoomEntity) -> Self {
        Self {
            code: value.code,
            kind: value.kind,
            host_name: value.host_name,
            host_key: value.host_key,
            config: RoomConfig {
                topic: value.topic,
                difficulty: value.difficulty,
                question_count: value.question_count,
                time_per_question: value.time_per_question,
                is_private: value.is_private,
                allow_spectators: value.allow_spectators,
                bet_amount: value.bet_amount,
            },
            players: value.players.into_iter().map(Into::into).collect(),
            spectators: value.spectators,
            status: value.status,
            questions: value.questions.into_iter().map(Into::into).collect(),
            current_question: value.current_question,
            question_start_time: value.question_start_time,
            player_answers: value
                .player_answers
                .into_iter()
                .map(|(name, answers)| {
                    (
                        name,
                        answers
                            .into_iter()
                            .map(|(slot, record)| (slot, record.into()))
                            .collect(),
                    )
                })
                .collect(),
            total_pot: value.total_pot,
            created_at: value.created_at,
            ended_at: value.ended_at,
        }
    }
}

impl From<Room> for RoomEntity {
    fn from(value: Room) -> Self {
        Self {
            code: value.code,
            kind: value.kind,
            host_name: value.host_name,
            host_key: value.host_key,
            topic: value.config.topic,
            difficulty: value.config.difficulty,
            question_count: value.config.question_count,
            time_per_question: value.config.time_per_question,
            is_private: value.config.is_private,
            allow_spectators: value.config.allow_spectators,
            bet_amount: value.config.bet_amount,
            players: value.players.into_iter().map(Into::into).collect(),
            spectators: value.spectators,
            status: value.status,
            questions: value.questions.into_iter().map(Into::into).collect(),
            current_question: value.current_question,
            question_start_time: value.question_start_time,
            player_answers: value
                .player_answers
                .into_iter()
                .map(|(name, answers)| {
                    (
                        name,
                        answers
                            .into_iter()
                            .map(|(slot, record)| (slot, record.into()))
                            .collect(),
                    )
                })
                .collect(),
            total_pot: value.total_pot,
            created_at: value.created_at,
            ended_at: value.ended_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RoomConfig {
        RoomConfig {
            topic: "Math".into(),
            difficulty: Difficulty::Medium,
            question_count: 5,
            time_per_question: DEFAULT_TIME_PER_QUESTION,
            is_private: false,
            allow_spectators: true,
            bet_amount: 0,
        }
    }

    #[test]
    fn new_room_starts_waiting_with_host_on_roster() {
        let room = Room::new(RoomKind::Multiplayer, "Ada".into(), config());
        assert_eq!(room.status, RoomStatus::Waiting);
        assert_eq!(room.players.len(), 1);
        assert_eq!(room.players[0].name, "Ada");
        assert_eq!(room.players[0].score, 0);
        assert!(!room.players[0].ready);
        assert_eq!(room.total_pot, 0);
        assert!(room.questions.is_empty());
    }

    #[test]
    fn generated_codes_are_uppercase_base36() {
        for _ in 0..50 {
            let code = generate_room_code();
            assert_eq!(code.len(), ROOM_CODE_LENGTH);
            assert!(
                code.chars()
                    .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
            );
        }
    }

    #[test]
    fn host_keys_are_lowercase_hex() {
        let key = generate_host_key();
        assert_eq!(key.len(), HOST_KEY_LENGTH);
        assert!(
            key.chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        );
    }

    #[test]
    fn player_caps_per_kind() {
        assert_eq!(RoomKind::Multiplayer.player_cap(), 8);
        assert_eq!(RoomKind::Gamble.player_cap(), 2);
    }

    #[test]
    fn terminal_statuses() {
        assert!(!RoomStatus::Waiting.is_terminal());
        assert!(!RoomStatus::Playing.is_terminal());
        assert!(RoomStatus::Finished.is_terminal());
        assert!(RoomStatus::Ended.is_terminal());
    }

    #[test]
    fn answered_lookup_uses_question_slot() {
        let mut room = Room::new(RoomKind::Multiplayer, "Ada".into(), config());
        room.player_answers.entry("Ada".into()).or_default().insert(
            answer_slot(2),
            AnswerRecord {
                answer: 1,
                correct: true,
                points: 12,
                time_left: 14,
            },
        );
        assert!(room.has_answered("Ada", 2));
        assert!(!room.has_answered("Ada", 1));
        assert!(!room.has_answered("Bob", 2));
    }

    #[test]
    fn statuses_display_as_stored_strings() {
        assert_eq!(RoomStatus::Waiting.to_string(), "waiting");
        assert_eq!(RoomStatus::Playing.to_string(), "playing");
        assert_eq!(RoomStatus::Finished.to_string(), "finished");
        assert_eq!(RoomStatus::Ended.to_string(), "ended");
    }

    #[test]
    fn round_trips_through_entity() {
        let mut room = Room::new(RoomKind::Gamble, "Ada".into(), config());
        room.players.push(Player::new("Bob".into()));
        room.questions.push(Question {
            text: "2 + 2?".into(),
            options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
            correct: 1,
        });

        let entity: RoomEntity = room.clone().into();
        let back: Room = entity.into();
        assert_eq!(back.code, room.code);
        assert_eq!(back.players, room.players);
        assert_eq!(back.questions, room.questions);
        assert_eq!(back.status, room.status);
    }
}
