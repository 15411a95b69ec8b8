//! In-process score store.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::{ScoreStore, ScoreSubscription, SubscriptionHub};
use crate::models::{Participant, ScorePatch, ScoreRecord};
use crate::Result;

/// Shared in-memory document map; clones share the same documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    records: Arc<Mutex<BTreeMap<Participant, ScoreRecord>>>,
    hub: SubscriptionHub,
}

impl MemoryScoreStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self, participant: Participant) -> usize {
        self.hub.subscriber_count(participant)
    }
}

impl ScoreStore for MemoryScoreStore {
    async fn read(&self, participant: Participant) -> Result<Option<ScoreRecord>> {
        let records = self.records.lock().await;
        Ok(records.get(&participant).cloned())
    }

    async fn merge_write(&self, participant: Participant, patch: &ScorePatch) -> Result<()> {
        // Publish under the lock so subscribers see versions in write order.
        let mut records = self.records.lock().await;
        let record = records.entry(participant).or_default();
        record.apply(patch);
        let delivered = self.hub.publish(participant, record);
        tracing::debug!(%participant, ?patch, delivered, "Merged score patch");
        Ok(())
    }

    async fn subscribe(&self, participant: Participant) -> Result<ScoreSubscription> {
        let receiver = self.hub.receiver(participant);
        let initial = self.read(participant).await?.unwrap_or_default();
        Ok(ScoreSubscription::new(participant, initial, receiver))
    }
}
