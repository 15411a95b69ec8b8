//! Score synchronizer.
//!
//! Keeps the locally rendered pair of heart counts in step with the shared
//! store. Each participant's document is watched through its own
//! subscription; pushes are folded in last-write-wins order. Sending love
//! writes to the *partner's* document using the locally cached count, so two
//! sessions clicking at the same instant can lose an increment.

use crate::config::ShowcaseConfig;
use crate::models::{
    ImageEntry, ImageSlots, Participant, Pending, ScorePair, ScorePatch, ScoreRecord,
};
use crate::storage::{UploadFile, UploadService};
use crate::store::{ScoreStore, ScoreSubscription};
use crate::{Error, Result};

pub struct ScoreSynchronizer<S, U> {
    store: S,
    uploader: U,
    config: ShowcaseConfig,
    hearts: [Pending<u64>; 2],
    images: [ImageSlots; 2],
    subscriptions: Vec<ScoreSubscription>,
}

impl<S: ScoreStore, U: UploadService> ScoreSynchronizer<S, U> {
    pub fn new(store: S, uploader: U, config: ShowcaseConfig) -> Self {
        let slots = config.slot_count();
        Self {
            store,
            uploader,
            config,
            hearts: [Pending::new(0), Pending::new(0)],
            images: [ImageSlots::empty(slots), ImageSlots::empty(slots)],
            subscriptions: Vec::new(),
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn config(&self) -> &ShowcaseConfig {
        &self.config
    }

    /// Displayed hearts per record, optimistic values included.
    pub fn scores(&self) -> ScorePair {
        ScorePair::new(
            self.hearts[Participant::A.index()].value(),
            self.hearts[Participant::B.index()].value(),
        )
    }

    pub const fn hearts(&self, participant: Participant) -> &Pending<u64> {
        &self.hearts[participant.index()]
    }

    pub const fn images(&self, participant: Participant) -> &ImageSlots {
        &self.images[participant.index()]
    }

    pub fn is_subscribed(&self, participant: Participant) -> bool {
        self.subscriptions
            .iter()
            .any(|subscription| subscription.participant() == participant)
    }

    /// Watch a participant's document; a no-op when already watching it.
    ///
    /// The current document is folded in before this returns, so a send right
    /// after subscribing builds on the stored count. Returns that document, or
    /// `None` when the subscription already existed.
    pub async fn subscribe(&mut self, participant: Participant) -> Result<Option<ScoreRecord>> {
        if self.is_subscribed(participant) {
            return Ok(None);
        }
        let mut subscription = self.store.subscribe(participant).await?;
        let current = subscription.take_initial().unwrap_or_default();
        self.apply_remote(participant, &current);
        self.subscriptions.push(subscription);
        tracing::debug!(%participant, hearts = current.hearts, "Subscribed to score document");
        Ok(Some(current))
    }

    /// Both documents are always watched so either session can show both scores.
    ///
    /// Returns the documents of the newly opened subscriptions.
    pub async fn subscribe_both(&mut self) -> Result<Vec<(Participant, ScoreRecord)>> {
        let mut opened = Vec::new();
        for participant in Participant::ALL {
            if let Some(record) = self.subscribe(participant).await? {
                opened.push((participant, record));
            }
        }
        Ok(opened)
    }

    pub fn unsubscribe_all(&mut self) {
        if !self.subscriptions.is_empty() {
            tracing::debug!(count = self.subscriptions.len(), "Dropping score subscriptions");
        }
        self.subscriptions.clear();
    }

    /// Wait for the next pushed document and fold it into local state.
    ///
    /// Returns `None` once no live subscription remains.
    pub async fn next_update(&mut self) -> Option<(Participant, ScoreRecord)> {
        loop {
            let (index, received) = match self.subscriptions.as_mut_slice() {
                [] => return None,
                [only] => (0, only.recv().await),
                [first, second, ..] => tokio::select! {
                    record = first.recv() => (0, record),
                    record = second.recv() => (1, record),
                },
            };

            let participant = self.subscriptions[index].participant();
            if let Some(record) = received {
                self.apply_remote(participant, &record);
                return Some((participant, record));
            }

            tracing::warn!(%participant, "{}", Error::SubscriptionClosed(participant.to_string()));
            self.subscriptions.remove(index);
        }
    }

    /// A pushed document is authoritative for the hearts it carries.
    pub fn apply_remote(&mut self, participant: Participant, record: &ScoreRecord) {
        self.hearts[participant.index()].confirm(record.hearts);
    }

    /// Record love sent by `sender`: bump the partner's document by one.
    ///
    /// Returns the value written. On failure the optimistic value stays
    /// displayed until the next push.
    pub async fn send_love(&mut self, sender: Participant) -> Result<u64> {
        let recipient = sender.other();
        let slot = &mut self.hearts[recipient.index()];
        let next = slot.value().saturating_add(1);
        slot.propose(next);

        self.store
            .merge_write(recipient, &ScorePatch::hearts(next))
            .await?;
        self.hearts[recipient.index()].settle();
        tracing::debug!(%sender, %recipient, hearts = next, "Love sent");
        Ok(next)
    }

    /// One-shot read of a participant's photos into fixed slots.
    pub async fn load_images(&mut self, participant: Participant) -> Result<ImageSlots> {
        let record = self.store.read(participant).await?.unwrap_or_default();
        let slots = record.image_slots(self.config.slot_count());
        self.images[participant.index()] = slots.clone();
        Ok(slots)
    }

    /// Upload a photo for a prompt slot and record it in the owner's document.
    ///
    /// The local slot is filled as soon as the upload URL is known, ahead of
    /// the document write.
    pub async fn upload_image(
        &mut self,
        participant: Participant,
        slot: usize,
        file: &UploadFile,
        timestamp: i64,
    ) -> Result<ImageEntry> {
        let prompt_label = self
            .config
            .prompt_label(slot)
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "Photo slot {slot} is out of range (0..{})",
                    self.config.slot_count()
                ))
            })?
            .to_string();

        let prefix = self.config.upload_prefix_for(participant);
        let url = self.uploader.upload(file, &prefix).await?;
        let entry = ImageEntry {
            url,
            timestamp,
            prompt_label,
        };

        self.images[participant.index()].set(slot, entry.clone())?;
        self.store
            .merge_write(participant, &ScorePatch::image(slot, entry.clone()))
            .await?;
        tracing::debug!(%participant, slot, url = %entry.url, "Photo recorded");
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryScoreStore;
    use crate::test_support::{FakeUploader, FlakyStore};
    use pretty_assertions::assert_eq;

    fn synchronizer<S: ScoreStore>(store: S) -> ScoreSynchronizer<S, FakeUploader> {
        ScoreSynchronizer::new(store, FakeUploader::default(), ShowcaseConfig::default())
    }

    fn photo() -> UploadFile {
        UploadFile::new("us.png", vec![1, 2, 3])
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn send_love_credits_the_partner_record() {
        let store = MemoryScoreStore::new();
        let mut sync = synchronizer(store.clone());

        for _ in 0..3 {
            sync.send_love(Participant::A).await.unwrap();
        }

        let b = store.read(Participant::B).await.unwrap().unwrap();
        assert_eq!(b.hearts, 3);
        assert!(store.read(Participant::A).await.unwrap().is_none());
        assert_eq!(sync.scores(), ScorePair::new(0, 3));
        assert_eq!(sync.scores().credited(Participant::A), 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn send_love_builds_on_pushed_value() {
        let store = MemoryScoreStore::new();
        store
            .merge_write(Participant::A, &ScorePatch::hearts(10))
            .await
            .unwrap();

        let mut sync = synchronizer(store.clone());
        let current = sync.subscribe(Participant::A).await.unwrap().unwrap();
        assert_eq!(current.hearts, 10);

        assert_eq!(sync.send_love(Participant::B).await.unwrap(), 11);
        assert_eq!(store.read(Participant::A).await.unwrap().unwrap().hearts, 11);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn subscribe_folds_stored_count_before_any_push() {
        let store = MemoryScoreStore::new();
        store
            .merge_write(Participant::B, &ScorePatch::hearts(10))
            .await
            .unwrap();

        let mut sync = synchronizer(store.clone());
        let opened = sync.subscribe_both().await.unwrap();
        assert_eq!(opened.len(), 2);
        assert_eq!(sync.scores(), ScorePair::new(0, 10));
        assert!(sync.subscribe(Participant::B).await.unwrap().is_none());

        sync.send_love(Participant::A).await.unwrap();
        assert_eq!(store.read(Participant::B).await.unwrap().unwrap().hearts, 11);

        // The stored document is not delivered a second time.
        let (participant, record) = sync.next_update().await.unwrap();
        assert_eq!(participant, Participant::B);
        assert_eq!(record.hearts, 11);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_write_keeps_optimistic_value_until_push() {
        let store = FlakyStore::new(MemoryScoreStore::new());
        let mut sync = synchronizer(store.clone());
        sync.subscribe_both().await.unwrap();

        store.fail_next_writes(1);
        assert!(sync.send_love(Participant::A).await.is_err());
        assert_eq!(sync.scores().record(Participant::B), 1);
        assert!(sync.hearts(Participant::B).is_pending());

        store
            .inner()
            .merge_write(Participant::B, &ScorePatch::hearts(0))
            .await
            .unwrap();
        let (participant, _) = sync.next_update().await.unwrap();
        assert_eq!(participant, Participant::B);
        assert_eq!(sync.scores().record(Participant::B), 0);
        assert!(!sync.hearts(Participant::B).is_pending());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn subscribe_is_idempotent_and_unsubscribe_drops_both() {
        let store = MemoryScoreStore::new();
        let mut sync = synchronizer(store.clone());

        sync.subscribe_both().await.unwrap();
        sync.subscribe(Participant::A).await.unwrap();
        assert_eq!(store.subscriber_count(Participant::A), 1);
        assert_eq!(store.subscriber_count(Participant::B), 1);

        sync.unsubscribe_all();
        assert_eq!(store.subscriber_count(Participant::A), 0);
        assert!(!sync.is_subscribed(Participant::B));
        assert!(sync.next_update().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn next_update_reports_which_document_changed() {
        let store = MemoryScoreStore::new();
        let mut sync = synchronizer(store.clone());
        sync.subscribe_both().await.unwrap();

        store
            .merge_write(Participant::A, &ScorePatch::hearts(4))
            .await
            .unwrap();
        let (participant, record) = sync.next_update().await.unwrap();
        assert_eq!(participant, Participant::A);
        assert_eq!(record.hearts, 4);
        assert_eq!(sync.scores(), ScorePair::new(4, 0));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upload_fills_slot_and_leaves_others() {
        let uploader = FakeUploader::default();
        let mut sync = ScoreSynchronizer::new(
            MemoryScoreStore::new(),
            uploader.clone(),
            ShowcaseConfig::default(),
        );

        let first = sync
            .upload_image(Participant::A, 0, &photo(), 100)
            .await
            .unwrap();
        let second = sync
            .upload_image(Participant::A, 3, &photo(), 200)
            .await
            .unwrap();

        let slots = sync.load_images(Participant::A).await.unwrap();
        assert_eq!(slots.get(0), Some(&first));
        assert_eq!(slots.get(3), Some(&second));
        assert_eq!(slots.filled(), 2);
        assert_eq!(uploader.uploads(), 2);
        assert_eq!(second.prompt_label, "Where we go next");
        assert!(first.url.contains("/a/"));
        assert_eq!(sync.load_images(Participant::B).await.unwrap().filled(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upload_rejects_out_of_range_slot() {
        let mut sync = synchronizer(MemoryScoreStore::new());
        let error = sync
            .upload_image(Participant::B, 5, &photo(), 1)
            .await
            .unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upload_failure_leaves_slot_empty() {
        let store = MemoryScoreStore::new();
        let mut sync = ScoreSynchronizer::new(
            store.clone(),
            FakeUploader::failing(),
            ShowcaseConfig::default(),
        );

        assert!(sync
            .upload_image(Participant::A, 1, &photo(), 1)
            .await
            .is_err());
        assert!(sync.images(Participant::A).get(1).is_none());
        assert!(store.read(Participant::A).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn load_images_is_idempotent() {
        let store = MemoryScoreStore::new();
        let mut sync = synchronizer(store);
        sync.upload_image(Participant::B, 2, &photo(), 5)
            .await
            .unwrap();

        let first = sync.load_images(Participant::B).await.unwrap();
        let second = sync.load_images(Participant::B).await.unwrap();
        assert_eq!(first, second);
    }
}
