//! Room persistence.
//!
//! Every mutation is a single conditional update: the lifecycle guard is
//! repeated inside the filter document, so two racing writers can never both
//! succeed past a cap, a paid stake, or an already-advanced question. A
//! `false` return means the filter did not match; the service layer re-reads
//! the room to classify why.

use futures::TryStreamExt;
use mongodb::{
    Collection,
    bson::{DateTime, doc},
};

use super::{
    models::{AnswerEntity, PlayerEntity, QuestionEntity, RoomEntity},
    mongodb::{MongoDaoError, MongoManager, ROOM_COLLECTION, Result, is_duplicate_key},
};
use crate::state::room::{RoomKind, answer_slot};

const PUBLIC_LISTING_LIMIT: i64 = 20;
const PUBLIC_LISTING_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

/// Result of inserting a freshly generated room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The document was created.
    Created,
    /// Another room already owns this code; retry with a fresh one.
    CodeTaken,
}

/// MongoDB-backed store for room and match documents.
#[derive(Clone)]
pub struct RoomRepository {
    mongo: MongoManager,
}

impl RoomRepository {
    /// Wrap a connection manager.
    pub fn new(mongo: MongoManager) -> Self {
        Self { mongo }
    }

    async fn rooms(&self) -> Collection<RoomEntity> {
        self.mongo.database().await.collection(ROOM_COLLECTION)
    }

    /// Insert a new room. Codes are the `_id`, so a collision surfaces as a
    /// duplicate-key rejection rather than a second document.
    pub async fn insert(&self, room: &RoomEntity) -> Result<InsertOutcome> {
        match self.rooms().await.insert_one(room).await {
            Ok(_) => Ok(InsertOutcome::Created),
            Err(err) if is_duplicate_key(&err) => Ok(InsertOutcome::CodeTaken),
            Err(source) => Err(MongoDaoError::InsertRoom {
                code: room.code.clone(),
                source,
            }),
        }
    }

    /// Load one room by its code.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<RoomEntity>> {
        self.rooms()
            .await
            .find_one(doc! {"_id": code})
            .await
            .map_err(|source| MongoDaoError::LoadRoom {
                code: code.to_owned(),
                source,
            })
    }

    /// Append a player while the room is waiting and the roster is below
    /// `cap`. The size check lives in the filter, so concurrent joins cannot
    /// overshoot the cap.
    pub async fn push_player(&self, code: &str, player: &PlayerEntity, cap: usize) -> Result<bool> {
        let filter = doc! {
            "_id": code,
            "status": "waiting",
            "$expr": { "$lt": [ { "$size": "$players" }, cap as i64 ] },
        };
        let update = doc! {
            "$push": { "players": {
                "name": &player.name,
                "score": player.score,
                "ready": player.ready,
                "bet_paid": player.bet_paid,
            }},
        };
        self.update(code, "push_player", filter, update).await
    }

    /// Attach a spectator to a waiting multiplayer room below `cap`.
    pub async fn push_spectator(&self, code: &str, name: &str, cap: usize) -> Result<bool> {
        let filter = doc! {
            "_id": code,
            "kind": RoomKind::Multiplayer.as_str(),
            "status": "waiting",
            "allow_spectators": true,
            "$expr": { "$lt": [ { "$size": "$spectators" }, cap as i64 ] },
        };
        let update = doc! { "$push": { "spectators": name } };
        self.update(code, "push_spectator", filter, update).await
    }

    /// Set one roster entry's ready flag while the room is waiting.
    pub async fn set_ready(&self, code: &str, name: &str, ready: bool) -> Result<bool> {
        let filter = doc! {
            "_id": code,
            "status": "waiting",
            "players.name": name,
        };
        let update = doc! { "$set": { "players.$.ready": ready } };
        self.update(code, "set_ready", filter, update).await
    }

    /// Remove every roster entry with this exact name from a waiting room.
    pub async fn pull_player(&self, code: &str, name: &str) -> Result<bool> {
        let filter = doc! {
            "_id": code,
            "status": "waiting",
            "players.name": name,
        };
        let update = doc! { "$pull": { "players": { "name": name } } };
        self.update(code, "pull_player", filter, update).await
    }

    /// waiting → playing for a multiplayer room with at least `min_players`
    /// on the roster. Seeds the question set and the first question clock.
    pub async fn begin_quiz(
        &self,
        code: &str,
        questions: &[QuestionEntity],
        min_players: usize,
    ) -> Result<bool> {
        let filter = doc! {
            "_id": code,
            "kind": RoomKind::Multiplayer.as_str(),
            "status": "waiting",
            "$expr": { "$gte": [ { "$size": "$players" }, min_players as i64 ] },
        };
        let update = doc! {
            "$set": {
                "status": "playing",
                "questions": question_docs(questions),
                "current_question": 0_i64,
                "question_start_time": DateTime::now(),
                "player_answers": {},
            },
        };
        self.update(code, "begin_quiz", filter, update).await
    }

    /// Mark one player's stake as paid, exactly once, and grow the pot.
    pub async fn mark_bet_paid(&self, code: &str, name: &str, amount: i64) -> Result<bool> {
        let filter = doc! {
            "_id": code,
            "kind": RoomKind::Gamble.as_str(),
            "status": "waiting",
            "players": { "$elemMatch": { "name": name, "bet_paid": false } },
        };
        let update = doc! {
            "$set": { "players.$.bet_paid": true },
            "$inc": { "total_pot": amount },
        };
        self.update(code, "mark_bet_paid", filter, update).await
    }

    /// waiting → playing for a gamble match, only when both seats are filled
    /// and no stake is outstanding. Exactly one of two racing bettors wins
    /// this compare-and-set.
    pub async fn activate_when_pot_complete(
        &self,
        code: &str,
        questions: &[QuestionEntity],
    ) -> Result<bool> {
        let filter = doc! {
            "_id": code,
            "kind": RoomKind::Gamble.as_str(),
            "status": "waiting",
            "players.1": { "$exists": true },
            "players": { "$not": { "$elemMatch": { "bet_paid": false } } },
        };
        let update = doc! {
            "$set": {
                "status": "playing",
                "questions": question_docs(questions),
                "current_question": 0_i64,
                "question_start_time": DateTime::now(),
                "player_answers": {},
            },
        };
        self.update(code, "activate_when_pot_complete", filter, update)
            .await
    }

    /// Record one answer for the question currently in play. The filter
    /// rejects submissions for advanced questions and repeat submissions
    /// for the same player/question pair.
    pub async fn record_answer(
        &self,
        code: &str,
        name: &str,
        question_index: usize,
        record: &AnswerEntity,
    ) -> Result<bool> {
        let slot = format!("player_answers.{name}.{}", answer_slot(question_index));
        let filter = doc! {
            "_id": code,
            "status": "playing",
            "current_question": question_index as i64,
            "players.name": name,
            slot.as_str(): { "$exists": false },
        };
        let update = doc! {
            "$set": { slot.as_str(): {
                "answer": record.answer as i64,
                "correct": record.correct,
                "points": record.points,
                "time_left": i64::from(record.time_left),
            }},
            "$inc": { "players.$.score": record.points },
        };
        self.update(code, "record_answer", filter, update).await
    }

    /// Move the question pointer forward by one. The compare-and-set on the
    /// current index keeps the pointer monotonic under concurrent advances.
    pub async fn advance_question(&self, code: &str, from_index: usize) -> Result<bool> {
        let filter = doc! {
            "_id": code,
            "status": "playing",
            "current_question": from_index as i64,
        };
        let update = doc! {
            "$set": {
                "current_question": (from_index + 1) as i64,
                "question_start_time": DateTime::now(),
            },
        };
        self.update(code, "advance_question", filter, update).await
    }

    /// playing → finished once an advance runs past the last question.
    pub async fn finish_quiz(&self, code: &str, from_index: usize) -> Result<bool> {
        let filter = doc! {
            "_id": code,
            "status": "playing",
            "current_question": from_index as i64,
        };
        let update = doc! { "$set": { "status": "finished" } };
        self.update(code, "finish_quiz", filter, update).await
    }

    /// waiting | playing → ended. Terminal rooms are left untouched.
    pub async fn end_room(&self, code: &str) -> Result<bool> {
        let filter = doc! {
            "_id": code,
            "status": { "$in": ["waiting", "playing"] },
        };
        let update = doc! {
            "$set": { "status": "ended", "ended_at": DateTime::now() },
        };
        self.update(code, "end_room", filter, update).await
    }

    /// Joinable public rooms of one kind: waiting, not private, created in
    /// the last 24 hours, newest first, at most 20.
    pub async fn list_public(&self, kind: RoomKind) -> Result<Vec<RoomEntity>> {
        let cutoff =
            DateTime::from_millis(DateTime::now().timestamp_millis() - PUBLIC_LISTING_WINDOW_MS);
        let filter = doc! {
            "kind": kind.as_str(),
            "status": "waiting",
            "is_private": false,
            "created_at": { "$gte": cutoff },
        };
        self.rooms()
            .await
            .find(filter)
            .sort(doc! {"created_at": -1})
            .limit(PUBLIC_LISTING_LIMIT)
            .await
            .map_err(|source| MongoDaoError::ListRooms { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListRooms { source })
    }

    /// Every room created with this host key, newest first.
    pub async fn list_by_host_key(&self, host_key: &str) -> Result<Vec<RoomEntity>> {
        self.rooms()
            .await
            .find(doc! {"host_key": host_key})
            .sort(doc! {"created_at": -1})
            .await
            .map_err(|source| MongoDaoError::ListRooms { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListRooms { source })
    }

    /// Administrative bulk delete of every room document.
    pub async fn delete_all(&self) -> Result<u64> {
        self.rooms()
            .await
            .delete_many(doc! {})
            .await
            .map(|outcome| outcome.deleted_count)
            .map_err(|source| MongoDaoError::DeleteRooms { source })
    }

    async fn update(
        &self,
        code: &str,
        op: &'static str,
        filter: mongodb::bson::Document,
        update: mongodb::bson::Document,
    ) -> Result<bool> {
        let outcome = self
            .rooms()
            .await
            .update_one(filter, update)
            .await
            .map_err(|source| MongoDaoError::UpdateRoom {
                op,
                code: code.to_owned(),
                source,
            })?;
        Ok(outcome.matched_count > 0)
    }
}

fn question_docs(questions: &[QuestionEntity]) -> Vec<mongodb::bson::Document> {
    questions
        .iter()
        .map(|question| {
            doc! {
                "question": question.text.clone(),
                "options": question.options.clone(),
                "correct": question.correct as i64,
            }
        })
        .collect()
}
