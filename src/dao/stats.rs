//! Trending topics and completed solo results.

use futures::TryStreamExt;
use mongodb::{
    Collection,
    bson::{DateTime, Document, doc},
};

use super::{
    models::{QuizProgressEntity, QuizResultEntity, TrendingTopicEntity},
    mongodb::{
        MongoDaoError, MongoManager, PROGRESS_COLLECTION, RESULT_COLLECTION, Result,
        TOPIC_COLLECTION,
    },
};
use crate::state::room::Difficulty;

const TRENDING_LIMIT: i64 = 10;

/// MongoDB-backed store for usage statistics.
#[derive(Clone)]
pub struct StatsRepository {
    mongo: MongoManager,
}

impl StatsRepository {
    /// Wrap a connection manager.
    pub fn new(mongo: MongoManager) -> Self {
        Self { mongo }
    }

    async fn topics(&self) -> Collection<TrendingTopicEntity> {
        self.mongo.database().await.collection(TOPIC_COLLECTION)
    }

    async fn results(&self) -> Collection<QuizResultEntity> {
        self.mongo.database().await.collection(RESULT_COLLECTION)
    }

    /// Bump the counter for a topic, creating it on first sight. The
    /// normalized form is the key; the raw form is kept for display.
    pub async fn track_topic(&self, normalized: &str, display: &str) -> Result<()> {
        let update = doc! {
            "$inc": { "search_count": 1_i64 },
            "$set": { "display_topic": display, "last_searched": DateTime::now() },
        };
        self.topics()
            .await
            .update_one(doc! {"_id": normalized}, update)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::TrackTopic {
                topic: normalized.to_owned(),
                source,
            })?;
        Ok(())
    }

    /// The ten most requested topics, most requested first.
    pub async fn trending(&self) -> Result<Vec<TrendingTopicEntity>> {
        self.topics()
            .await
            .find(doc! {})
            .sort(doc! {"search_count": -1})
            .limit(TRENDING_LIMIT)
            .await
            .map_err(|source| MongoDaoError::ListTopics { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListTopics { source })
    }

    async fn progress(&self) -> Collection<QuizProgressEntity> {
        self.mongo.database().await.collection(PROGRESS_COLLECTION)
    }

    fn identity(player: &str, topic: &str, difficulty: Difficulty) -> Document {
        doc! {
            "player_name": player,
            "topic": topic,
            "difficulty": difficulty.as_str(),
        }
    }

    /// Save an in-flight solo quiz, replacing any previous snapshot for the
    /// same player, topic and difficulty.
    pub async fn save_progress(&self, progress: &QuizProgressEntity) -> Result<()> {
        let filter = Self::identity(&progress.player_name, &progress.topic, progress.difficulty);
        self.progress()
            .await
            .replace_one(filter, progress)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveProgress {
                player: progress.player_name.clone(),
                source,
            })?;
        Ok(())
    }

    /// The saved snapshot for a player/topic/difficulty triple, if any.
    pub async fn load_progress(
        &self,
        player: &str,
        topic: &str,
        difficulty: Difficulty,
    ) -> Result<Option<QuizProgressEntity>> {
        self.progress()
            .await
            .find_one(Self::identity(player, topic, difficulty))
            .await
            .map_err(|source| MongoDaoError::LoadProgress {
                player: player.to_owned(),
                source,
            })
    }

    /// Drop the saved snapshot. Returns whether one existed.
    pub async fn clear_progress(
        &self,
        player: &str,
        topic: &str,
        difficulty: Difficulty,
    ) -> Result<bool> {
        let deleted = self
            .progress()
            .await
            .delete_one(Self::identity(player, topic, difficulty))
            .await
            .map_err(|source| MongoDaoError::ClearProgress {
                player: player.to_owned(),
                source,
            })?;
        Ok(deleted.deleted_count > 0)
    }

    /// Persist one completed solo quiz.
    pub async fn save_result(&self, result: &QuizResultEntity) -> Result<()> {
        self.results()
            .await
            .insert_one(result)
            .await
            .map_err(|source| MongoDaoError::SaveResult {
                player: result.player_name.clone(),
                source,
            })?;
        Ok(())
    }
}
