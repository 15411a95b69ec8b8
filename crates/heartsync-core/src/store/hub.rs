//! Per-participant broadcast fan-out shared by store backends.

use tokio::sync::broadcast;

use crate::models::{Participant, ScoreRecord};

const DEFAULT_CAPACITY: usize = 64;

/// One broadcast channel per participant document.
#[derive(Debug, Clone)]
pub struct SubscriptionHub {
    senders: [broadcast::Sender<ScoreRecord>; 2],
}

impl Default for SubscriptionHub {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl SubscriptionHub {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            senders: [
                broadcast::channel(capacity).0,
                broadcast::channel(capacity).0,
            ],
        }
    }

    pub fn receiver(&self, participant: Participant) -> broadcast::Receiver<ScoreRecord> {
        self.senders[participant.index()].subscribe()
    }

    /// Push a new document version; returns how many subscribers saw it.
    pub fn publish(&self, participant: Participant, record: &ScoreRecord) -> usize {
        // Publishing with nobody listening is normal.
        self.senders[participant.index()]
            .send(record.clone())
            .unwrap_or(0)
    }

    pub fn subscriber_count(&self, participant: Participant) -> usize {
        self.senders[participant.index()].receiver_count()
    }
}
