//! Shared application state and the room domain.

pub mod lifecycle;
pub mod room;

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    config::AppConfig,
    dao::{mongodb::MongoManager, room::RoomRepository, stats::StatsRepository},
    error::ServiceError,
    quizgen::SourceChain,
    scoring::ScoringRules,
};

/// Cheaply cloneable handle to [`AppState`].
pub type SharedState = Arc<AppState>;

/// Repositories sharing one MongoDB connection.
#[derive(Clone)]
pub struct Stores {
    /// Underlying connection, used for health pings.
    pub mongo: MongoManager,
    /// Room and match documents.
    pub rooms: RoomRepository,
    /// Trending topics and solo results.
    pub stats: StatsRepository,
}

impl Stores {
    /// Build both repositories over one connection manager.
    pub fn new(mongo: MongoManager) -> Self {
        Self {
            rooms: RoomRepository::new(mongo.clone()),
            stats: StatsRepository::new(mongo.clone()),
            mongo,
        }
    }
}

/// Central application state: storage handles, scoring tables, question
/// sources, and the admin credential.
pub struct AppState {
    stores: RwLock<Option<Stores>>,
    scoring: ScoringRules,
    questions: SourceChain,
    admin_token: Option<String>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be
    /// cloned cheaply.
    ///
    /// The application starts in degraded mode until storage is installed.
    pub fn new(
        config: AppConfig,
        questions: SourceChain,
        admin_token: Option<String>,
    ) -> SharedState {
        Arc::new(Self {
            stores: RwLock::new(None),
            scoring: config.scoring,
            questions,
            admin_token,
        })
    }

    /// Obtain the current repositories, if storage is installed.
    pub async fn stores(&self) -> Option<Stores> {
        let guard = self.stores.read().await;
        guard.clone()
    }

    /// Obtain the current repositories or fail with the degraded-mode error.
    pub async fn require_stores(&self) -> Result<Stores, ServiceError> {
        self.stores().await.ok_or(ServiceError::Degraded)
    }

    /// Install repositories and leave degraded mode.
    pub async fn install_stores(&self, stores: Stores) {
        let mut guard = self.stores.write().await;
        *guard = Some(stores);
    }

    /// Remove the repositories and enter degraded mode.
    pub async fn clear_stores(&self) {
        let mut guard = self.stores.write().await;
        guard.take();
    }

    /// Whether the application currently runs without storage.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.stores.read().await;
        guard.is_none()
    }

    /// Scoring tables loaded at startup.
    pub fn scoring(&self) -> &ScoringRules {
        &self.scoring
    }

    /// Ordered question sources.
    pub fn question_sources(&self) -> &SourceChain {
        &self.questions
    }

    /// Credential expected on administrative endpoints, when configured.
    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref()
    }
}
