//! Wagered head-to-head match operations.
//!
//! Matches share the room document shape and most of the room flow; what
//! differs is the start condition (both stakes paid instead of a host
//! action) and the streak-based scoring.

use tracing::info;

use crate::{
    dto::room::{
        AnswerRequest, BetRequest, CreateMatchRequest, CreatedRoomResponse, HostKeyRequest,
        JoinRequest, RoomSummary, RoomView,
    },
    error::ServiceError,
    scoring::Outcome,
    state::{
        SharedState,
        lifecycle::{self, Advance, LifecycleError},
        room::{AnswerRecord, DEFAULT_TIME_PER_QUESTION, Player, Room, RoomConfig, RoomKind},
    },
};

use super::room_service::{
    current_streak, generate_questions, load, refreshed_view, stale_retry,
};

/// Open a new gamble match with the creator in the first seat.
pub async fn create_match(
    state: &SharedState,
    request: CreateMatchRequest,
) -> Result<CreatedRoomResponse, ServiceError> {
    let config = RoomConfig {
        topic: request.topic.trim().to_owned(),
        difficulty: request.difficulty,
        question_count: request.question_count,
        time_per_question: DEFAULT_TIME_PER_QUESTION,
        is_private: request.is_private,
        allow_spectators: false,
        bet_amount: request.bet_amount,
    };
    let host_name = request.host_name.trim().to_owned();

    super::room_service::create(state, RoomKind::Gamble, host_name, config).await
}

/// Joinable public matches.
pub async fn list_public(state: &SharedState) -> Result<Vec<RoomSummary>, ServiceError> {
    super::room_service::list_public_of_kind(state, RoomKind::Gamble).await
}

/// Full state of one match.
pub async fn get_match(state: &SharedState, code: &str) -> Result<RoomView, ServiceError> {
    let stores = state.require_stores().await?;
    let room = load(&stores, code).await?;
    lifecycle::check_kind(&room, RoomKind::Gamble)?;
    Ok(RoomView::from(&room))
}

/// Take the second seat of a waiting match.
pub async fn join_match(
    state: &SharedState,
    code: &str,
    request: JoinRequest,
) -> Result<RoomView, ServiceError> {
    let stores = state.require_stores().await?;
    let room = load(&stores, code).await?;
    lifecycle::check_kind(&room, RoomKind::Gamble)?;
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

    info!(code = %code, player = %name, "player joined match");
    refreshed_view(&stores, code).await
}

/// Pay one seat's stake. When this was the last outstanding stake the match
/// activates: questions are generated and the compare-and-set flips it to
/// playing. A racing opponent may win that flip; losing it is still success.
pub async fn submit_bet(
    state: &SharedState,
    code: &str,
    request: BetRequest,
) -> Result<RoomView, ServiceError> {
    let stores = state.require_stores().await?;
    let room = load(&stores, code).await?;
    let name = request.player_name.trim();
    if let Err(err) = lifecycle::check_bet(&room, name) {
        // A repeat bet on a fully paid waiting match means the earlier
        // activation attempt died between the pot completing and the
        // status flip (question generation can fail). Retry it here so
        // the match is not stuck in waiting.
        if retries_activation(&err, &room) {
            try_activate(state, &stores, code, &room).await?;
            return refreshed_view(&stores, code).await;
        }
        return Err(err.into());
    }

    let applied = stores
        .rooms
        .mark_bet_paid(code, name, room.config.bet_amount)
        .await?;
    if !applied {
        let fresh = load(&stores, code).await?;
        lifecycle::check_bet(&fresh, name)?;
        return Err(stale_retry());
    }
    info!(code = %code, player = %name, "stake paid");

    let paid = load(&stores, code).await?;
    if lifecycle::gamble_ready_to_start(&paid) {
        try_activate(state, &stores, code, &paid).await?;
    }

    refreshed_view(&stores, code).await
}

fn retries_activation(err: &LifecycleError, room: &Room) -> bool {
    matches!(err, LifecycleError::StakeAlreadyPaid { .. }) && lifecycle::gamble_ready_to_start(room)
}

async fn try_activate(
    state: &SharedState,
    stores: &crate::state::Stores,
    code: &str,
    room: &Room,
) -> Result<(), ServiceError> {
    let questions = generate_questions(state, room).await?;
    if stores
        .rooms
        .activate_when_pot_complete(code, &questions)
        .await?
    {
        info!(code = %code, pot = room.total_pot, "match activated");
    }
    Ok(())
}

/// Record one answer, scored with the streak formula.
pub async fn submit_answer(
    state: &SharedState,
    code: &str,
    request: AnswerRequest,
) -> Result<RoomView, ServiceError> {
    let stores = state.require_stores().await?;
    let room = load(&stores, code).await?;
    lifecycle::check_kind(&room, RoomKind::Gamble)?;

    let name = request.player_name.trim();
    lifecycle::check_answer(&room, name, request.question_index, request.answer_index)?;

    let record = score_match_answer(state, &room, name, &request);
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

/// Creator moves the match to the next question, or to finished.
pub async fn advance(
    state: &SharedState,
    code: &str,
    request: HostKeyRequest,
) -> Result<RoomView, ServiceError> {
    let stores = state.require_stores().await?;
    let room = load(&stores, code).await?;
    lifecycle::check_kind(&room, RoomKind::Gamble)?;
    if !room.is_host_key(&request.host_key) {
        return Err(ServiceError::Forbidden(
            "only the match creator can advance".into(),
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
            info!(code = %code, question = to, "match advanced");
        }
        Advance::Finish => {
            let applied = stores.rooms.finish_quiz(code, room.current_question).await?;
            if !applied {
                let fresh = load(&stores, code).await?;
                lifecycle::check_advance(&fresh)?;
                return Err(stale_retry());
            }
            info!(code = %code, "match finished");
        }
    }

    refreshed_view(&stores, code).await
}

/// Creator tears the match down.
pub async fn end(
    state: &SharedState,
    code: &str,
    request: HostKeyRequest,
) -> Result<RoomView, ServiceError> {
    let stores = state.require_stores().await?;
    let room = load(&stores, code).await?;
    lifecycle::check_kind(&room, RoomKind::Gamble)?;
    lifecycle::check_end(&room, &request.host_key)?;

    let applied = stores.rooms.end_room(code).await?;
    if !applied {
        let fresh = load(&stores, code).await?;
        lifecycle::check_end(&fresh, &request.host_key)?;
        return Err(stale_retry());
    }

    info!(code = %code, "match ended by creator");
    refreshed_view(&stores, code).await
}

fn score_match_answer(
    state: &SharedState,
    room: &Room,
    name: &str,
    request: &AnswerRequest,
) -> AnswerRecord {
    let question = &room.questions[request.question_index];
    let correct = request.answer_index == question.correct;
    let time_left = request.time_left.min(room.config.time_per_question);
    let outcome = if correct {
        Outcome::Correct { time_left }
    } else {
        Outcome::Wrong
    };
    let streak = current_streak(room, name, request.question_index);
    let award = state.scoring().streak_award(
        room.config.difficulty,
        room.config.time_per_question,
        streak,
        outcome,
    );

    AnswerRecord {
        answer: request.answer_index,
        correct,
        points: award.points,
        time_left,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::room::{Difficulty, Question, RoomStatus, answer_slot};

    fn playing_match() -> Room {
        let mut room = Room::new(
            RoomKind::Gamble,
            "Ada".into(),
            RoomConfig {
                topic: "Math".into(),
                difficulty: Difficulty::Hard,
                question_count: 3,
                time_per_question: 30,
                is_private: false,
                allow_spectators: false,
                bet_amount: 50,
            },
        );
        room.players.push(Player::new("Bob".into()));
        room.status = RoomStatus::Playing;
        room.questions = (0..3)
            .map(|i| Question {
                text: format!("Q{i}?"),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct: 2,
            })
            .collect();
        room
    }

    fn state() -> SharedState {
        crate::state::AppState::new(
            crate::config::AppConfig::default(),
            crate::quizgen::SourceChain::new(Vec::new()),
            None,
        )
    }

    fn waiting_match() -> Room {
        let mut room = playing_match();
        room.status = RoomStatus::Waiting;
        room.questions.clear();
        room
    }

    /// Applies the same fields the stake update sets on the stored document.
    fn pay(room: &mut Room, name: &str) {
        lifecycle::check_bet(room, name).unwrap();
        let bet = room.config.bet_amount;
        let player = room
            .players
            .iter_mut()
            .find(|player| player.name == name)
            .unwrap();
        player.bet_paid = true;
        room.total_pot += bet;
    }

    #[test]
    fn both_paid_stakes_ready_the_match_with_doubled_pot() {
        let mut room = waiting_match();

        pay(&mut room, "Ada");
        assert!(!lifecycle::gamble_ready_to_start(&room));
        assert_eq!(room.total_pot, room.config.bet_amount);

        pay(&mut room, "Bob");
        assert!(lifecycle::gamble_ready_to_start(&room));
        assert_eq!(room.total_pot, 2 * room.config.bet_amount);

        // Activation flips the status and installs the questions; from
        // here bets are rejected and answers are accepted.
        room.status = RoomStatus::Playing;
        room.questions = playing_match().questions;
        assert!(lifecycle::check_bet(&room, "Ada").is_err());
        assert!(lifecycle::check_answer(&room, "Ada", 0, 2).is_ok());
    }

    #[test]
    fn repeat_bet_retries_activation_once_pot_is_complete() {
        let mut room = waiting_match();
        pay(&mut room, "Ada");

        let err = lifecycle::check_bet(&room, "Ada").unwrap_err();
        assert!(matches!(err, LifecycleError::StakeAlreadyPaid { .. }));
        assert!(!retries_activation(&err, &room));

        pay(&mut room, "Bob");
        let err = lifecycle::check_bet(&room, "Ada").unwrap_err();
        assert!(retries_activation(&err, &room));

        // Once activation has succeeded the repeat bet is a plain rejection.
        room.status = RoomStatus::Playing;
        let err = lifecycle::check_bet(&room, "Ada").unwrap_err();
        assert!(!retries_activation(&err, &room));
    }

    #[test]
    fn match_answers_use_the_streak_formula() {
        let mut room = playing_match();
        let answers = room.player_answers.entry("Ada".into()).or_default();
        answers.insert(
            answer_slot(0),
            AnswerRecord {
                answer: 2,
                correct: true,
                points: 30,
                time_left: 30,
            },
        );
        answers.insert(
            answer_slot(1),
            AnswerRecord {
                answer: 2,
                correct: true,
                points: 35,
                time_left: 30,
            },
        );
        room.current_question = 2;

        let request = AnswerRequest {
            player_name: "Ada".into(),
            question_index: 2,
            answer_index: 2,
            time_left: 30,
        };
        let record = score_match_answer(&state(), &room, "Ada", &request);
        // hard base 20 + full speed bonus 10 + streak 2 * 5
        assert_eq!(record.points, 40);
        assert!(record.correct);
    }

    #[test]
    fn wrong_match_answer_scores_zero() {
        let room = playing_match();
        let request = AnswerRequest {
            player_name: "Bob".into(),
            question_index: 0,
            answer_index: 0,
            time_left: 30,
        };
        let record = score_match_answer(&state(), &room, "Bob", &request);
        assert_eq!(record.points, 0);
        assert!(!record.correct);
    }

    #[test]
    fn reported_time_left_is_clamped_to_the_clock() {
        let room = playing_match();
        let request = AnswerRequest {
            player_name: "Bob".into(),
            question_index: 0,
            answer_index: 2,
            time_left: 120,
        };
        let record = score_match_answer(&state(), &room, "Bob", &request);
        assert_eq!(record.time_left, 30);
        // hard base 20 + capped speed bonus 10, no streak
        assert_eq!(record.points, 30);
    }
}
