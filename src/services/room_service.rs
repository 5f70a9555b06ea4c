//! Multiplayer room operations.
//!
//! Every mutation follows the same shape: load, guard through
//! `state::lifecycle`, apply the matching conditional update, and when the
//! update did not match, re-read once to classify the rejection.

use tracing::info;

use crate::{
    dao::room::InsertOutcome,
    dto::room::{
        AnswerRequest, CreateRoomRequest, CreatedRoomResponse, HostKeyRequest, JoinRequest,
        KickRequest, ReadyRequest, RoomSummary, RoomView, SpectateRequest,
    },
    error::ServiceError,
    quizgen::QuizRequest,
    scoring::Outcome,
    state::{
        SharedState,
        lifecycle::{self, Advance, MIN_PLAYERS_TO_START},
        room::{
            AnswerRecord, DEFAULT_TIME_PER_QUESTION, Player, Room, RoomConfig, RoomKind,
            SPECTATOR_CAP, answer_slot,
        },
    },
};

const CODE_RETRY_LIMIT: usize = 5;

/// Open a new multiplayer room with the creator on the roster.
pub async fn create_room(
    state: &SharedState,
    request: CreateRoomRequest,
) -> Result<CreatedRoomResponse, ServiceError> {
    let config = RoomConfig {
        topic: request.topic.trim().to_owned(),
        difficulty: request.difficulty,
        question_count: request.question_count,
        time_per_question: request.time_per_question.unwrap_or(DEFAULT_TIME_PER_QUESTION),
        is_private: request.is_private,
        allow_spectators: request.allow_spectators,
        bet_amount: 0,
    };
    let host_name = request.host_name.trim().to_owned();

    create(state, RoomKind::Multiplayer, host_name, config).await
}

/// Insert a freshly generated room, regenerating the code on the rare
/// collision against the unique index.
pub(super) async fn create(
    state: &SharedState,
    kind: RoomKind,
    host_name: String,
    config: RoomConfig,
) -> Result<CreatedRoomResponse, ServiceError> {
    let stores = state.require_stores().await?;

    for _ in 0..CODE_RETRY_LIMIT {
        let room = Room::new(kind, host_name.clone(), config.clone());
        let code = room.code.clone();
        let host_key = room.host_key.clone();
        let view = RoomView::from(&room);

        match stores.rooms.insert(&room.into()).await? {
            InsertOutcome::Created => {
                info!(code = %code, kind = kind.as_str(), "room created");
                return Ok(CreatedRoomResponse {
                    code,
                    host_key,
                    room: view,
                });
            }
            InsertOutcome::CodeTaken => continue,
        }
    }

    Err(ServiceError::InvalidState(
        "could not allocate a unique room code".into(),
    ))
}

/// Joinable public multiplayer rooms.
pub async fn list_public(state: &SharedState) -> Result<Vec<RoomSummary>, ServiceError> {
    list_public_of_kind(state, RoomKind::Multiplayer).await
}

pub(super) async fn list_public_of_kind(
    state: &SharedState,
    kind: RoomKind,
) -> Result<Vec<RoomSummary>, ServiceError> {
    let stores = state.require_stores().await?;
    let rooms = stores.rooms.list_public(kind).await?;
    Ok(rooms
        .into_iter()
        .map(|entity| RoomSummary::from(&Room::from(entity)))
        .collect())
}

/// Every room created with this host key, any kind, newest first.
pub async fn list_mine(
    state: &SharedState,
    host_key: &str,
) -> Result<Vec<RoomSummary>, ServiceError> {
    let stores = state.require_stores().await?;
    let rooms = stores.rooms.list_by_host_key(host_key).await?;
    Ok(rooms
        .into_iter()
        .map(|entity| RoomSummary::from(&Room::from(entity)))
        .collect())
}

/// Full state of one room, whatever its kind.
pub async fn get_room(state: &SharedState, code: &str) -> Result<RoomView, ServiceError> {
    let stores = state.require_stores().await?;
    let room = load(&stores, code).await?;
    Ok(RoomView::from(&room))
}

/// Add a player to a waiting multiplayer room.
pub async fn join_room(
    state: &SharedState,
    code: &str,
    request: JoinRequest,
) -> Result<RoomView, ServiceError> {
    let stores = state.require_stores().await?;
    let room = load(&stores, code).await?;
    lifecycle::check_kind(&room, RoomKind::Multiplayer)?;
    lifecycle::check_join(&room)?;

    let name = request.player_name.trim().to_owned();
    let player = Player::new(name.clone());
    let applied = stores
        .rooms
        .push_player(code, &player.into(), room.kind.player_cap())
        .await?;
    if !applied {
        let fresh = load(&stores, code).await?;
        lifecycle::check_join(&fresh)?;
        return Err(stale_retry());
    }

    info!(code = %code, player = %name, "player joined room");
    refreshed_view(&stores, code).await
}

/// Attach a spectator to a waiting multiplayer room.
pub async fn spectate(
    state: &SharedState,
    code: &str,
    request: SpectateRequest,
) -> Result<RoomView, ServiceError> {
    let stores = state.require_stores().await?;
    let room = load(&stores, code).await?;
    lifecycle::check_spectate(&room)?;

    let name = request.spectator_name.trim().to_owned();
    let applied = stores
        .rooms
        .push_spectator(code, &name, SPECTATOR_CAP)
        .await?;
    if !applied {
        let fresh = load(&stores, code).await?;
        lifecycle::check_spectate(&fresh)?;
        return Err(stale_retry());
    }

    refreshed_view(&stores, code).await
}

/// Toggle a roster entry's lobby ready flag.
pub async fn set_ready(
    state: &SharedState,
    code: &str,
    request: ReadyRequest,
) -> Result<RoomView, ServiceError> {
    let stores = state.require_stores().await?;
    let room = load(&stores, code).await?;
    let name = request.player_name.trim();
    lifecycle::check_ready_toggle(&room, name)?;

    let applied = stores.rooms.set_ready(code, name, request.ready).await?;
    if !applied {
        let fresh = load(&stores, code).await?;
        lifecycle::check_ready_toggle(&fresh, name)?;
        return Err(stale_retry());
    }

    refreshed_view(&stores, code).await
}

/// Host removes a roster entry from the lobby.
pub async fn kick(
    state: &SharedState,
    code: &str,
    request: KickRequest,
) -> Result<RoomView, ServiceError> {
    let stores = state.require_stores().await?;
    let room = load(&stores, code).await?;
    let target = request.target_name.trim();
    lifecycle::check_kick(&room, &request.host_key, target)?;

    let applied = stores.rooms.pull_player(code, target).await?;
    if !applied {
        let fresh = load(&stores, code).await?;
        lifecycle::check_kick(&fresh, &request.host_key, target)?;
        return Err(stale_retry());
    }

    info!(code = %code, player = %target, "player kicked from room");
    refreshed_view(&stores, code).await
}

/// Host starts the quiz: generate questions and flip waiting → playing.
pub async fn start(
    state: &SharedState,
    code: &str,
    request: HostKeyRequest,
) -> Result<RoomView, ServiceError> {
    let stores = state.require_stores().await?;
    let room = load(&stores, code).await?;
    lifecycle::check_start(&room, &request.host_key)?;

    let questions = generate_questions(state, &room).await?;
    let applied = stores
        .rooms
        .begin_quiz(code, &questions, MIN_PLAYERS_TO_START)
        .await?;
    if !applied {
        let fresh = load(&stores, code).await?;
        lifecycle::check_start(&fresh, &request.host_key)?;
        return Err(stale_retry());
    }

    info!(code = %code, questions = questions.len(), "quiz started");
    refreshed_view(&stores, code).await
}

/// Record one answer for the question in play, scored with the flat room
/// formula.
pub async fn submit_answer(
    state: &SharedState,
    code: &str,
    request: AnswerRequest,
) -> Result<RoomView, ServiceError> {
    let stores = state.require_stores().await?;
    let room = load(&stores, code).await?;
    lifecycle::check_kind(&room, RoomKind::Multiplayer)?;

    let name = request.player_name.trim();
    lifecycle::check_answer(&room, name, request.question_index, request.answer_index)?;

    let record = score_room_answer(state, &room, &request);
    let applied = stores
        .rooms
        .record_answer(code, name, request.question_index, &record.into())
        .await?;
    if !applied {
        let fresh = load(&stores, code).await?;
        lifecycle::check_answer(&fresh, name, request.question_index, request.answer_index)?;
        return Err(stale_retry());
    }

    refreshed_view(&stores, code).await
}

/// Host moves the room to the next question, or to finished past the last.
pub async fn advance(
    state: &SharedState,
    code: &str,
    request: HostKeyRequest,
) -> Result<RoomView, ServiceError> {
    let stores = state.require_stores().await?;
    let room = load(&stores, code).await?;
    if !room.is_host_key(&request.host_key) {
        return Err(ServiceError::Forbidden(
            "only the host can advance the quiz".into(),
        ));
    }

    match lifecycle::check_advance(&room)? {
        Advance::Next { to } => {
            let applied = stores
                .rooms
                .advance_question(code, room.current_question)
                .await?;
            if !applied {
                let fresh = load(&stores, code).await?;
                lifecycle::check_advance(&fresh)?;
                return Err(stale_retry());
            }
            info!(code = %code, question = to, "advanced to next question");
        }
        Advance::Finish => {
            let applied = stores.rooms.finish_quiz(code, room.current_question).await?;
            if !applied {
                let fresh = load(&stores, code).await?;
                lifecycle::check_advance(&fresh)?;
                return Err(stale_retry());
            }
            info!(code = %code, "quiz finished");
        }
    }

    refreshed_view(&stores, code).await
}

/// Host tears the room down.
pub async fn end(
    state: &SharedState,
    code: &str,
    request: HostKeyRequest,
) -> Result<RoomView, ServiceError> {
    let stores = state.require_stores().await?;
    let room = load(&stores, code).await?;
    lifecycle::check_end(&room, &request.host_key)?;

    let applied = stores.rooms.end_room(code).await?;
    if !applied {
        let fresh = load(&stores, code).await?;
        lifecycle::check_end(&fresh, &request.host_key)?;
        return Err(stale_retry());
    }

    info!(code = %code, "room ended by host");
    refreshed_view(&stores, code).await
}

pub(super) async fn load(
    stores: &crate::state::Stores,
    code: &str,
) -> Result<Room, ServiceError> {
    let Some(entity) = stores.rooms.find_by_code(code).await? else {
        return Err(ServiceError::NotFound(format!("room `{code}` not found")));
    };
    Ok(entity.into())
}

pub(super) async fn refreshed_view(
    stores: &crate::state::Stores,
    code: &str,
) -> Result<RoomView, ServiceError> {
    let room = load(stores, code).await?;
    Ok(RoomView::from(&room))
}

/// The update filter did not match but the guard passes on a fresh read;
/// another writer interleaved and the client should retry.
pub(super) fn stale_retry() -> ServiceError {
    ServiceError::InvalidState("room changed concurrently; retry".into())
}

pub(super) async fn generate_questions(
    state: &SharedState,
    room: &Room,
) -> Result<Vec<crate::dao::models::QuestionEntity>, ServiceError> {
    let quiz = state
        .question_sources()
        .generate(QuizRequest {
            topic: room.config.topic.clone(),
            difficulty: room.config.difficulty,
            count: room.config.question_count,
            source_text: None,
        })
        .await?;
    Ok(quiz.questions.into_iter().map(Into::into).collect())
}

fn score_room_answer(state: &SharedState, room: &Room, request: &AnswerRequest) -> AnswerRecord {
    let question = &room.questions[request.question_index];
    let correct = request.answer_index == question.correct;
    let time_left = request.time_left.min(room.config.time_per_question);
    let outcome = if correct {
        Outcome::Correct { time_left }
    } else {
        Outcome::Wrong
    };

    AnswerRecord {
        answer: request.answer_index,
        correct,
        points: state.scoring().room_points(outcome),
        time_left,
    }
}

/// Consecutive correct answers a player holds going into `upto`.
pub(super) fn current_streak(room: &Room, name: &str, upto: usize) -> u32 {
    let Some(answers) = room.player_answers.get(name) else {
        return 0;
    };
    let mut streak = 0;
    for index in (0..upto).rev() {
        match answers.get(&answer_slot(index)) {
            Some(record) if record.correct => streak += 1,
            _ => break,
        }
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::room::{Difficulty, Question, RoomStatus};

    fn playing_room() -> Room {
        let mut room = Room::new(
            RoomKind::Multiplayer,
            "Ada".into(),
            RoomConfig {
                topic: "Math".into(),
                difficulty: Difficulty::Medium,
                question_count: 3,
                time_per_question: 30,
                is_private: false,
                allow_spectators: true,
                bet_amount: 0,
            },
        );
        room.status = RoomStatus::Playing;
        room.questions = (0..3)
            .map(|i| Question {
                text: format!("Q{i}?"),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct: 1,
            })
            .collect();
        room
    }

    fn record(correct: bool) -> AnswerRecord {
        AnswerRecord {
            answer: 1,
            correct,
            points: 0,
            time_left: 10,
        }
    }

    #[test]
    fn streak_counts_trailing_correct_answers() {
        let mut room = playing_room();
        let answers = room.player_answers.entry("Ada".into()).or_default();
        answers.insert(answer_slot(0), record(true));
        answers.insert(answer_slot(1), record(true));
        assert_eq!(current_streak(&room, "Ada", 2), 2);
    }

    #[test]
    fn streak_breaks_on_wrong_or_missing_answer() {
        let mut room = playing_room();
        let answers = room.player_answers.entry("Ada".into()).or_default();
        answers.insert(answer_slot(0), record(true));
        answers.insert(answer_slot(1), record(false));
        assert_eq!(current_streak(&room, "Ada", 2), 0);

        let mut gap = playing_room();
        let answers = gap.player_answers.entry("Ada".into()).or_default();
        answers.insert(answer_slot(0), record(true));
        // question 1 unanswered
        assert_eq!(current_streak(&gap, "Ada", 2), 0);

        assert_eq!(current_streak(&playing_room(), "Nobody", 2), 0);
    }

    #[test]
    fn room_answers_use_the_flat_formula() {
        let room = playing_room();
        let state = crate::state::AppState::new(
            crate::config::AppConfig::default(),
            crate::quizgen::SourceChain::new(Vec::new()),
            None,
        );
        let request = AnswerRequest {
            player_name: "Ada".into(),
            question_index: 0,
            answer_index: 1,
            time_left: 30,
        };
        let record = score_room_answer(&state, &room, &request);
        assert!(record.correct);
        assert_eq!(record.points, 15);

        let wrong = AnswerRequest {
            answer_index: 0,
            ..request
        };
        let record = score_room_answer(&state, &room, &wrong);
        assert!(!record.correct);
        assert_eq!(record.points, 0);
    }
}
