//! Connection lifecycle for the MongoDB backend.

use std::{sync::Arc, time::Duration};

use mongodb::{
    Client, Database,
    bson::doc,
    options::{ClientOptions, IndexOptions},
};
use tokio::{
    sync::RwLock,
    time::{MissedTickBehavior, interval, sleep},
};
use tracing::{info, warn};

use super::error::{MongoDaoError, Result};

const DEFAULT_DB: &str = "quiz_arena";
const MAX_CONNECT_ATTEMPTS: u32 = 10;
const BASE_RETRY_DELAY_MS: u64 = 250;
const HEALTH_CHECK_INTERVAL_SECS: u64 = 30;

/// Collection holding room and match documents.
pub const ROOM_COLLECTION: &str = "rooms";
/// Collection holding trending-topic counters.
pub const TOPIC_COLLECTION: &str = "trending_topics";
/// Collection holding completed solo results.
pub const RESULT_COLLECTION: &str = "quiz_results";
/// Collection holding in-flight solo quiz snapshots.
pub const PROGRESS_COLLECTION: &str = "quiz_progress";

/// Shared handle over a self-healing MongoDB connection.
#[derive(Clone)]
pub struct MongoManager {
    inner: Arc<MongoManagerInner>,
}

struct MongoManagerInner {
    state: RwLock<MongoState>,
    options: ClientOptions,
    database_name: String,
}

struct MongoState {
    client: Client,
    database: Database,
}

/// Connect to MongoDB and start a watcher that keeps the connection healthy.
pub async fn connect(uri: &str, db_name: Option<&str>) -> Result<MongoManager> {
    let database_name = db_name.unwrap_or(DEFAULT_DB).to_owned();
    let options = ClientOptions::parse(uri)
        .await
        .map_err(|source| MongoDaoError::InvalidUri {
            uri: uri.to_owned(),
            source,
        })?;

    let (client, database) = establish_connection(&options, &database_name).await?;

    let state = MongoState { client, database };
    let inner = Arc::new(MongoManagerInner {
        state: RwLock::new(state),
        options,
        database_name,
    });

    MongoManagerInner::spawn_health_task(&inner);

    Ok(MongoManager { inner })
}

/// Ensure the indexes required by the application are present.
///
/// Room codes are the collection `_id`, so uniqueness needs no extra index;
/// the listings get covering indexes instead.
pub async fn ensure_indexes(database: &Database) -> Result<()> {
    let rooms = database.collection::<mongodb::bson::Document>(ROOM_COLLECTION);

    let public_listing = mongodb::IndexModel::builder()
        .keys(doc! {"kind": 1, "status": 1, "is_private": 1, "created_at": -1})
        .options(
            IndexOptions::builder()
                .name(Some("room_public_listing_idx".to_string()))
                .build(),
        )
        .build();
    rooms
        .create_index(public_listing)
        .await
        .map_err(|source| MongoDaoError::EnsureIndex {
            collection: ROOM_COLLECTION,
            index: "room_public_listing_idx",
            source,
        })?;

    let host_key = mongodb::IndexModel::builder()
        .keys(doc! {"host_key": 1})
        .options(
            IndexOptions::builder()
                .name(Some("room_host_key_idx".to_string()))
                .build(),
        )
        .build();
    rooms
        .create_index(host_key)
        .await
        .map_err(|source| MongoDaoError::EnsureIndex {
            collection: ROOM_COLLECTION,
            index: "room_host_key_idx",
            source,
        })?;

    let topics = database.collection::<mongodb::bson::Document>(TOPIC_COLLECTION);
    let trending = mongodb::IndexModel::builder()
        .keys(doc! {"search_count": -1})
        .options(
            IndexOptions::builder()
                .name(Some("topic_search_count_idx".to_string()))
                .build(),
        )
        .build();
    topics
        .create_index(trending)
        .await
        .map_err(|source| MongoDaoError::EnsureIndex {
            collection: TOPIC_COLLECTION,
            index: "topic_search_count_idx",
            source,
        })?;

    let progress = database.collection::<mongodb::bson::Document>(PROGRESS_COLLECTION);
    let identity = mongodb::IndexModel::builder()
        .keys(doc! {"player_name": 1, "topic": 1, "difficulty": 1})
        .options(
            IndexOptions::builder()
                .name(Some("progress_identity_idx".to_string()))
                .unique(Some(true))
                .build(),
        )
        .build();
    progress
        .create_index(identity)
        .await
        .map_err(|source| MongoDaoError::EnsureIndex {
            collection: PROGRESS_COLLECTION,
            index: "progress_identity_idx",
            source,
        })?;

    Ok(())
}

impl MongoManager {
    /// Clone the current database handle.
    pub async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    /// Issue a ping against the current MongoDB connection.
    pub async fn ping(&self) -> Result<()> {
        self.inner.ping().await
    }
}

impl MongoManagerInner {
    fn spawn_health_task(inner: &Arc<Self>) {
        let weak = Arc::downgrade(inner);
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(HEALTH_CHECK_INTERVAL_SECS));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                let Some(inner) = weak.upgrade() else {
                    break;
                };

                if let Err(err) = inner.ping().await {
                    warn!(error = %err, "MongoDB health ping failed; attempting reconnect");
                    inner.reconnect().await;
                }
            }
        });
    }

    async fn ping(&self) -> Result<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;

        Ok(())
    }

    async fn reconnect(&self) {
        let mut attempts = 0;
        let mut delay = Duration::from_millis(BASE_RETRY_DELAY_MS);

        loop {
            attempts += 1;
            match establish_connection(&self.options, &self.database_name).await {
                Ok((client, database)) => {
                    let mut guard = self.state.write().await;
                    guard.client = client;
                    guard.database = database;
                    info!("MongoDB connection re-established");
                    break;
                }
                Err(err) => {
                    warn!(
                        error = %err,
                        attempts,
                        "failed to re-establish MongoDB connection; retrying"
                    );
                    sleep(delay).await;
                    delay = (delay * 2).min(Duration::from_secs(5));
                }
            }
        }
    }
}

async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> Result<(Client, Database)> {
    let client = Client::with_options(options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    let mut attempts = 0;
    let mut interval = Duration::from_millis(BASE_RETRY_DELAY_MS);

    loop {
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => break,
            Err(err) => {
                attempts += 1;
                if attempts >= MAX_CONNECT_ATTEMPTS {
                    return Err(MongoDaoError::InitialPing {
                        attempts,
                        source: err,
                    });
                }
                sleep(interval).await;
                interval = (interval * 2).min(Duration::from_secs(5));
            }
        }
    }

    Ok((client, database))
}
