//! libSQL-backed score store, optionally replicated through Turso.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::{ScoreStore, ScoreSubscription, SubscriptionHub};
use crate::db::{Database, LibSqlScoreRepository, ScoreRepository, SyncConfig};
use crate::models::{Participant, ScorePatch, ScoreRecord};
use crate::Result;

/// Thread-safe store over a libSQL database.
///
/// Local writes are fanned out immediately. Writes made by other processes
/// against the same remote database surface through [`Self::refresh`].
#[derive(Clone)]
pub struct LibSqlScoreStore {
    db: Arc<Mutex<Database>>,
    hub: SubscriptionHub,
    published: Arc<Mutex<BTreeMap<Participant, ScoreRecord>>>,
}

impl LibSqlScoreStore {
    /// Open a store at the given path, as a Turso replica when `sync_config` is set.
    pub async fn open_path(
        db_path: impl Into<PathBuf>,
        sync_config: Option<SyncConfig>,
    ) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = if let Some(config) = sync_config {
            tracing::info!(
                "Score store replicating from {}",
                config.url.as_deref().unwrap_or("unknown")
            );
            Database::open_with_sync(&db_path, config).await?
        } else {
            tracing::info!("Score store running local-only at {}", db_path.display());
            Database::open(&db_path).await?
        };
        Ok(Self::from_database(db))
    }

    /// Open an in-memory store (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        Ok(Self::from_database(Database::open_in_memory().await?))
    }

    pub fn from_database(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            hub: SubscriptionHub::default(),
            published: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    pub async fn is_sync_enabled(&self) -> bool {
        self.db.lock().await.is_sync_enabled()
    }

    /// Pull remote changes and push any document that changed to subscribers.
    ///
    /// Returns the participants whose documents changed.
    pub async fn refresh(&self) -> Result<Vec<Participant>> {
        let db = self.db.lock().await;
        db.sync().await?;
        let repo = LibSqlScoreRepository::new(db.connection());

        let mut changed = Vec::new();
        for participant in Participant::ALL {
            let record = repo.load(participant).await?.unwrap_or_default();
            if self.remember(participant, &record).await {
                self.hub.publish(participant, &record);
                changed.push(participant);
            }
        }
        if !changed.is_empty() {
            tracing::debug!(?changed, "Remote score changes published");
        }
        Ok(changed)
    }

    /// Track the last version pushed; returns whether `record` is new.
    async fn remember(&self, participant: Participant, record: &ScoreRecord) -> bool {
        let mut published = self.published.lock().await;
        if published.get(&participant) == Some(record) {
            return false;
        }
        published.insert(participant, record.clone());
        true
    }
}

impl ScoreStore for LibSqlScoreStore {
    async fn read(&self, participant: Participant) -> Result<Option<ScoreRecord>> {
        let db = self.db.lock().await;
        LibSqlScoreRepository::new(db.connection())
            .load(participant)
            .await
    }

    async fn merge_write(&self, participant: Participant, patch: &ScorePatch) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlScoreRepository::new(db.connection());
        repo.merge(participant, patch).await?;

        let record = repo.load(participant).await?.unwrap_or_default();
        self.remember(participant, &record).await;
        let delivered = self.hub.publish(participant, &record);
        tracing::debug!(%participant, ?patch, delivered, "Merged score patch");
        Ok(())
    }

    async fn subscribe(&self, participant: Participant) -> Result<ScoreSubscription> {
        let receiver = self.hub.receiver(participant);
        let initial = self.read(participant).await?.unwrap_or_default();
        Ok(ScoreSubscription::new(participant, initial, receiver))
    }
}
