//! Guard layer for room lifecycle transitions.
//!
//! Every mutation is validated here against a freshly read room before the
//! repository applies it. The repository re-checks the same guards inside
//! its atomic update filters, so a stale read can never push a room through
//! an illegal transition; this module exists to classify the rejection.

use thiserror::Error;

use crate::state::room::{Room, RoomKind, RoomStatus, SPECTATOR_CAP};

/// Minimum roster size before a multiplayer quiz may start.
pub const MIN_PLAYERS_TO_START: usize = 2;

/// Rejection reasons for illegal room mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// The room is of a different kind than the endpoint expected.
    #[error("`{code}` is a {actual} room")]
    KindMismatch {
        /// Room code that was addressed.
        code: String,
        /// Kind stored in the document.
        actual: &'static str,
    },
    /// A waiting-only mutation arrived after the quiz started or closed.
    #[error("room already {status}")]
    NotWaiting {
        /// Status the room was in.
        status: RoomStatus,
    },
    /// A playing-only mutation arrived outside the playing state.
    #[error("quiz is not active (room is {status})")]
    NotPlaying {
        /// Status the room was in.
        status: RoomStatus,
    },
    /// The roster is at its cap.
    #[error("room is full ({cap} players)")]
    RosterFull {
        /// Cap for this room kind.
        cap: usize,
    },
    /// The room does not accept spectators.
    #[error("spectators are not allowed in this room")]
    SpectatorsDisabled,
    /// The spectator list is at its cap.
    #[error("spectator list is full ({SPECTATOR_CAP} spectators)")]
    SpectatorsFull,
    /// The named player is not on the roster.
    #[error("player `{name}` is not in this room")]
    UnknownPlayer {
        /// Name that failed to match any roster entry.
        name: String,
    },
    /// The presented host key does not match the room's.
    #[error("only the host can perform this action")]
    NotHost,
    /// The host tried to kick their own roster entry.
    #[error("the host cannot kick themselves")]
    CannotKickSelf,
    /// Multiplayer start guard: roster too small.
    #[error("need at least {MIN_PLAYERS_TO_START} players to start")]
    NotEnoughPlayers,
    /// Gamble activation guard: roster incomplete or stakes outstanding.
    #[error("match starts once two players have paid their stake")]
    PotIncomplete,
    /// The player already paid their stake.
    #[error("stake already paid by `{name}`")]
    StakeAlreadyPaid {
        /// Player who tried to pay twice.
        name: String,
    },
    /// The submitted answer targets a question no longer (or not yet) in play.
    #[error("question {submitted} is not in play (current is {current})")]
    QuestionNotInPlay {
        /// Index the client submitted for.
        submitted: usize,
        /// Index currently in play.
        current: usize,
    },
    /// The player already has a recorded answer for this question.
    #[error("`{name}` already answered question {question_index}")]
    AlreadyAnswered {
        /// Player who resubmitted.
        name: String,
        /// Question index involved.
        question_index: usize,
    },
    /// The answer index does not address one of the question's options.
    #[error("answer index {index} is out of range")]
    AnswerOutOfRange {
        /// Index the client submitted.
        index: usize,
    },
    /// The room is already in a terminal state.
    #[error("room is already {status}")]
    AlreadyClosed {
        /// Terminal status the room was in.
        status: RoomStatus,
    },
}

/// Outcome of an advance request computed from the current index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Move to the next question index.
    Next {
        /// Index the room advances to.
        to: usize,
    },
    /// The last question was in play; the quiz completes.
    Finish,
}

/// Reject mutations addressed to the wrong kind of room.
pub fn check_kind(room: &Room, expected: RoomKind) -> Result<(), LifecycleError> {
    if room.kind == expected {
        Ok(())
    } else {
        Err(LifecycleError::KindMismatch {
            code: room.code.clone(),
            actual: room.kind.as_str(),
        })
    }
}

fn require_waiting(room: &Room) -> Result<(), LifecycleError> {
    match room.status {
        RoomStatus::Waiting => Ok(()),
        status => Err(LifecycleError::NotWaiting { status }),
    }
}

fn require_playing(room: &Room) -> Result<(), LifecycleError> {
    match room.status {
        RoomStatus::Playing => Ok(()),
        status => Err(LifecycleError::NotPlaying { status }),
    }
}

fn require_host(room: &Room, host_key: &str) -> Result<(), LifecycleError> {
    if room.is_host_key(host_key) {
        Ok(())
    } else {
        Err(LifecycleError::NotHost)
    }
}

fn require_player(room: &Room, name: &str) -> Result<(), LifecycleError> {
    if room.player(name).is_some() {
        Ok(())
    } else {
        Err(LifecycleError::UnknownPlayer { name: name.into() })
    }
}

/// waiting → waiting: append a player while below the kind's cap.
pub fn check_join(room: &Room) -> Result<(), LifecycleError> {
    require_waiting(room)?;
    let cap = room.kind.player_cap();
    if room.players.len() >= cap {
        return Err(LifecycleError::RosterFull { cap });
    }
    Ok(())
}

/// waiting → waiting: attach a spectator (multiplayer rooms only).
pub fn check_spectate(room: &Room) -> Result<(), LifecycleError> {
    check_kind(room, RoomKind::Multiplayer)?;
    require_waiting(room)?;
    if !room.config.allow_spectators {
        return Err(LifecycleError::SpectatorsDisabled);
    }
    if room.spectators.len() >= SPECTATOR_CAP {
        return Err(LifecycleError::SpectatorsFull);
    }
    Ok(())
}

/// waiting → waiting: flip the ready flag of an existing roster entry.
pub fn check_ready_toggle(room: &Room, name: &str) -> Result<(), LifecycleError> {
    require_waiting(room)?;
    require_player(room, name)
}

/// waiting → waiting: host removes a roster entry other than themselves.
pub fn check_kick(room: &Room, host_key: &str, target: &str) -> Result<(), LifecycleError> {
    require_waiting(room)?;
    require_host(room, host_key)?;
    if target == room.host_name {
        return Err(LifecycleError::CannotKickSelf);
    }
    require_player(room, target)
}

/// waiting → playing: host-initiated start of a multiplayer room.
pub fn check_start(room: &Room, host_key: &str) -> Result<(), LifecycleError> {
    check_kind(room, RoomKind::Multiplayer)?;
    require_waiting(room)?;
    require_host(room, host_key)?;
    if room.players.len() < MIN_PLAYERS_TO_START {
        return Err(LifecycleError::NotEnoughPlayers);
    }
    Ok(())
}

/// waiting → waiting: mark one player's stake as paid.
pub fn check_bet(room: &Room, name: &str) -> Result<(), LifecycleError> {
    check_kind(room, RoomKind::Gamble)?;
    require_waiting(room)?;
    let player = room
        .player(name)
        .ok_or_else(|| LifecycleError::UnknownPlayer { name: name.into() })?;
    if player.bet_paid {
        return Err(LifecycleError::StakeAlreadyPaid { name: name.into() });
    }
    Ok(())
}

/// waiting → playing guard for gamble matches: full roster, all stakes paid.
pub fn gamble_ready_to_start(room: &Room) -> bool {
    room.status == RoomStatus::Waiting
        && room.players.len() == RoomKind::Gamble.player_cap()
        && room.all_bets_paid()
}

/// playing → playing: record one answer for one player on the question in
/// play. Submissions for an already-advanced (or not yet reached) question
/// and repeat submissions are rejected.
pub fn check_answer(
    room: &Room,
    name: &str,
    question_index: usize,
    answer_index: usize,
) -> Result<(), LifecycleError> {
    require_playing(room)?;
    require_player(room, name)?;
    if question_index != room.current_question {
        return Err(LifecycleError::QuestionNotInPlay {
            submitted: question_index,
            current: room.current_question,
        });
    }
    let options = room
        .questions
        .get(question_index)
        .map(|question| question.options.len())
        .unwrap_or(0);
    if answer_index >= options {
        return Err(LifecycleError::AnswerOutOfRange {
            index: answer_index,
        });
    }
    if room.has_answered(name, question_index) {
        return Err(LifecycleError::AlreadyAnswered {
            name: name.into(),
            question_index,
        });
    }
    Ok(())
}

/// playing → playing | finished: compute what an advance from the current
/// index does. `current_question` only ever moves forward.
pub fn check_advance(room: &Room) -> Result<Advance, LifecycleError> {
    require_playing(room)?;
    let next = room.current_question + 1;
    if next >= room.questions.len() {
        Ok(Advance::Finish)
    } else {
        Ok(Advance::Next { to: next })
    }
}

/// waiting | playing → ended: host tears the room down.
pub fn check_end(room: &Room, host_key: &str) -> Result<(), LifecycleError> {
    if room.status.is_terminal() {
        return Err(LifecycleError::AlreadyClosed {
            status: room.status,
        });
    }
    require_host(room, host_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::room::{
        Difficulty, Player, Question, Room, RoomConfig, DEFAULT_TIME_PER_QUESTION,
    };

    fn room(kind: RoomKind) -> Room {
        Room::new(
            kind,
            "Ada".into(),
            RoomConfig {
                topic: "Math".into(),
                difficulty: Difficulty::Medium,
                question_count: 2,
                time_per_question: DEFAULT_TIME_PER_QUESTION,
                is_private: false,
                allow_spectators: true,
                bet_amount: 50,
            },
        )
    }

    fn question() -> Question {
        Question {
            text: "2 + 2?".into(),
            options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
            correct: 1,
        }
    }

    fn playing_room(kind: RoomKind) -> Room {
        let mut room = room(kind);
        room.players.push(Player::new("Bob".into()));
        room.status = RoomStatus::Playing;
        room.questions = vec![question(), question()];
        room
    }

    #[test]
    fn join_allowed_while_waiting_below_cap() {
        let room = room(RoomKind::Multiplayer);
        assert!(check_join(&room).is_ok());
    }

    #[test]
    fn join_rejected_at_cap() {
        let mut room = room(RoomKind::Gamble);
        room.players.push(Player::new("Bob".into()));
        assert_eq!(check_join(&room), Err(LifecycleError::RosterFull { cap: 2 }));

        let mut room = self::room(RoomKind::Multiplayer);
        for i in 0..7 {
            room.players.push(Player::new(format!("P{i}")));
        }
        assert_eq!(check_join(&room), Err(LifecycleError::RosterFull { cap: 8 }));
    }

    #[test]
    fn join_rejected_after_start() {
        let room = playing_room(RoomKind::Multiplayer);
        assert_eq!(
            check_join(&room),
            Err(LifecycleError::NotWaiting {
                status: RoomStatus::Playing
            })
        );
    }

    #[test]
    fn spectate_honours_flag_and_cap() {
        let mut room = room(RoomKind::Multiplayer);
        assert!(check_spectate(&room).is_ok());

        room.config.allow_spectators = false;
        assert_eq!(check_spectate(&room), Err(LifecycleError::SpectatorsDisabled));

        room.config.allow_spectators = true;
        room.spectators = (0..SPECTATOR_CAP).map(|i| format!("S{i}")).collect();
        assert_eq!(check_spectate(&room), Err(LifecycleError::SpectatorsFull));
    }

    #[test]
    fn spectate_rejected_for_gamble_matches() {
        let room = room(RoomKind::Gamble);
        assert!(matches!(
            check_spectate(&room),
            Err(LifecycleError::KindMismatch { .. })
        ));
    }

    #[test]
    fn ready_toggle_requires_roster_membership() {
        let room = room(RoomKind::Multiplayer);
        assert!(check_ready_toggle(&room, "Ada").is_ok());
        assert_eq!(
            check_ready_toggle(&room, "Bob"),
            Err(LifecycleError::UnknownPlayer { name: "Bob".into() })
        );
    }

    #[test]
    fn kick_requires_host_key_and_rejects_self() {
        let mut room = room(RoomKind::Multiplayer);
        room.players.push(Player::new("Bob".into()));
        let key = room.host_key.clone();

        assert!(check_kick(&room, &key, "Bob").is_ok());
        assert_eq!(check_kick(&room, "bogus", "Bob"), Err(LifecycleError::NotHost));
        assert_eq!(
            check_kick(&room, &key, "Ada"),
            Err(LifecycleError::CannotKickSelf)
        );
        assert_eq!(
            check_kick(&room, &key, "Carol"),
            Err(LifecycleError::UnknownPlayer {
                name: "Carol".into()
            })
        );
    }

    #[test]
    fn start_requires_two_players() {
        let mut room = room(RoomKind::Multiplayer);
        let key = room.host_key.clone();
        assert_eq!(
            check_start(&room, &key),
            Err(LifecycleError::NotEnoughPlayers)
        );

        room.players.push(Player::new("Bob".into()));
        assert!(check_start(&room, &key).is_ok());
        assert_eq!(check_start(&room, "bogus"), Err(LifecycleError::NotHost));
    }

    #[test]
    fn bet_rejected_when_already_paid() {
        let mut room = room(RoomKind::Gamble);
        assert!(check_bet(&room, "Ada").is_ok());
        room.players[0].bet_paid = true;
        assert_eq!(
            check_bet(&room, "Ada"),
            Err(LifecycleError::StakeAlreadyPaid { name: "Ada".into() })
        );
    }

    #[test]
    fn gamble_start_needs_full_paid_roster() {
        let mut room = room(RoomKind::Gamble);
        assert!(!gamble_ready_to_start(&room));

        room.players.push(Player::new("Bob".into()));
        assert!(!gamble_ready_to_start(&room));

        room.players[0].bet_paid = true;
        room.players[1].bet_paid = true;
        assert!(gamble_ready_to_start(&room));

        room.status = RoomStatus::Playing;
        assert!(!gamble_ready_to_start(&room));
    }

    #[test]
    fn answer_rejected_for_advanced_question() {
        let mut room = playing_room(RoomKind::Multiplayer);
        room.current_question = 1;
        assert_eq!(
            check_answer(&room, "Bob", 0, 1),
            Err(LifecycleError::QuestionNotInPlay {
                submitted: 0,
                current: 1
            })
        );
    }

    #[test]
    fn answer_rejected_after_terminal_state() {
        let mut room = playing_room(RoomKind::Multiplayer);
        room.status = RoomStatus::Finished;
        assert_eq!(
            check_answer(&room, "Bob", 0, 1),
            Err(LifecycleError::NotPlaying {
                status: RoomStatus::Finished
            })
        );

        room.status = RoomStatus::Ended;
        assert!(matches!(
            check_answer(&room, "Bob", 0, 1),
            Err(LifecycleError::NotPlaying { .. })
        ));
    }

    #[test]
    fn answer_rejected_on_resubmission() {
        let mut room = playing_room(RoomKind::Multiplayer);
        room.player_answers.entry("Bob".into()).or_default().insert(
            "q0".into(),
            crate::state::room::AnswerRecord {
                answer: 1,
                correct: true,
                points: 15,
                time_left: 20,
            },
        );
        assert_eq!(
            check_answer(&room, "Bob", 0, 2),
            Err(LifecycleError::AlreadyAnswered {
                name: "Bob".into(),
                question_index: 0
            })
        );
    }

    #[test]
    fn answer_index_must_address_an_option() {
        let room = playing_room(RoomKind::Multiplayer);
        assert_eq!(
            check_answer(&room, "Bob", 0, 4),
            Err(LifecycleError::AnswerOutOfRange { index: 4 })
        );
        assert!(check_answer(&room, "Bob", 0, 3).is_ok());
    }

    #[test]
    fn spectators_cannot_answer() {
        let mut room = playing_room(RoomKind::Multiplayer);
        room.spectators.push("Eve".into());
        assert_eq!(
            check_answer(&room, "Eve", 0, 1),
            Err(LifecycleError::UnknownPlayer { name: "Eve".into() })
        );
    }

    #[test]
    fn advance_moves_forward_then_finishes() {
        let mut room = playing_room(RoomKind::Multiplayer);
        assert_eq!(check_advance(&room), Ok(Advance::Next { to: 1 }));

        room.current_question = 1;
        assert_eq!(check_advance(&room), Ok(Advance::Finish));
    }

    #[test]
    fn guard_errors_spell_out_the_room_status() {
        let not_waiting = LifecycleError::NotWaiting {
            status: RoomStatus::Playing,
        };
        assert_eq!(not_waiting.to_string(), "room already playing");

        let not_playing = LifecycleError::NotPlaying {
            status: RoomStatus::Waiting,
        };
        assert_eq!(not_playing.to_string(), "quiz is not active (room is waiting)");

        let closed = LifecycleError::AlreadyClosed {
            status: RoomStatus::Ended,
        };
        assert_eq!(closed.to_string(), "room is already ended");
    }

    #[test]
    fn end_requires_host_and_live_room() {
        let mut room = room(RoomKind::Multiplayer);
        let key = room.host_key.clone();
        assert!(check_end(&room, &key).is_ok());
        assert_eq!(check_end(&room, "bogus"), Err(LifecycleError::NotHost));

        room.status = RoomStatus::Finished;
        assert_eq!(
            check_end(&room, &key),
            Err(LifecycleError::AlreadyClosed {
                status: RoomStatus::Finished
            })
        );
    }
}
