//! The shared score store and its push subscriptions.
//!
//! Every backend offers the same three operations: a point read, a
//! shallow merge-write, and a subscription that delivers the current document
//! once and then every subsequent version of it.

mod hub;
mod sql;
mod memory;

use tokio::sync::broadcast::{self, error::RecvError};

use crate::models::{Participant, ScorePatch, ScoreRecord};
use crate::Result;

pub use hub::SubscriptionHub;
pub use sql::LibSqlScoreStore;
pub use memory::MemoryScoreStore;

/// Document store keyed by participant.
#[allow(async_fn_in_trait)]
pub trait ScoreStore {
    /// Read a participant's document, `None` if it was never written.
    async fn read(&self, participant: Participant) -> Result<Option<ScoreRecord>>;

    /// Shallow-merge `patch` into the participant's document.
    async fn merge_write(&self, participant: Participant, patch: &ScorePatch) -> Result<()>;

    /// Watch a participant's document. Dropping the subscription unsubscribes.
    async fn subscribe(&self, participant: Participant) -> Result<ScoreSubscription>;
}

/// Live view of one participant's document.
#[derive(Debug)]
pub struct ScoreSubscription {
    participant: Participant,
    initial: Option<ScoreRecord>,
    receiver: broadcast::Receiver<ScoreRecord>,
}

impl ScoreSubscription {
    /// `receiver` must be obtained before `initial` is read so no write
    /// between the two is missed.
    pub fn new(
        participant: Participant,
        initial: ScoreRecord,
        receiver: broadcast::Receiver<ScoreRecord>,
    ) -> Self {
        Self {
            participant,
            initial: Some(initial),
            receiver,
        }
    }

    pub const fn participant(&self) -> Participant {
        self.participant
    }

    /// The document as read at subscribe time, if `recv` has not yielded it yet.
    pub fn take_initial(&mut self) -> Option<ScoreRecord> {
        self.initial.take()
    }

    /// Next version of the document, `None` once the store is gone.
    ///
    /// A lagging receiver skips straight to the newer versions; older ones are
    /// superseded under last-write-wins anyway.
    pub async fn recv(&mut self) -> Option<ScoreRecord> {
        if let Some(initial) = self.initial.take() {
            return Some(initial);
        }

        loop {
            match self.receiver.recv().await {
                Ok(record) => return Some(record),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(
                        participant = %self.participant,
                        skipped,
                        "Score subscription lagged"
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn subscription_yields_initial_then_pushes() {
        let hub = SubscriptionHub::default();
        let receiver = hub.receiver(Participant::A);
        let mut subscription = ScoreSubscription::new(
            Participant::A,
            ScoreRecord {
                hearts: 1,
                ..ScoreRecord::default()
            },
            receiver,
        );

        hub.publish(
            Participant::A,
            &ScoreRecord {
                hearts: 2,
                ..ScoreRecord::default()
            },
        );

        assert_eq!(subscription.recv().await.unwrap().hearts, 1);
        assert_eq!(subscription.recv().await.unwrap().hearts, 2);
        assert_eq!(subscription.participant(), Participant::A);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn taken_initial_is_not_yielded_again() {
        let hub = SubscriptionHub::default();
        let receiver = hub.receiver(Participant::A);
        let mut subscription = ScoreSubscription::new(
            Participant::A,
            ScoreRecord {
                hearts: 7,
                ..ScoreRecord::default()
            },
            receiver,
        );

        assert_eq!(subscription.take_initial().unwrap().hearts, 7);
        assert_eq!(subscription.take_initial(), None);

        hub.publish(
            Participant::A,
            &ScoreRecord {
                hearts: 8,
                ..ScoreRecord::default()
            },
        );
        assert_eq!(subscription.recv().await.unwrap().hearts, 8);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn lagging_subscription_skips_to_newer_versions() {
        let hub = SubscriptionHub::with_capacity(2);
        let receiver = hub.receiver(Participant::B);
        let mut subscription =
            ScoreSubscription::new(Participant::B, ScoreRecord::default(), receiver);

        for hearts in 1..=5 {
            hub.publish(
                Participant::B,
                &ScoreRecord {
                    hearts,
                    ..ScoreRecord::default()
                },
            );
        }

        assert_eq!(subscription.recv().await.unwrap().hearts, 0);
        assert_eq!(subscription.recv().await.unwrap().hearts, 4);
        assert_eq!(subscription.recv().await.unwrap().hearts, 5);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn subscription_ends_when_hub_is_dropped() {
        let hub = SubscriptionHub::default();
        let receiver = hub.receiver(Participant::A);
        let mut subscription =
            ScoreSubscription::new(Participant::A, ScoreRecord::default(), receiver);
        drop(hub);

        assert!(subscription.recv().await.is_some());
        assert!(subscription.recv().await.is_none());
    }
}
