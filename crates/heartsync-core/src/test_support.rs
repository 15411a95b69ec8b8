//! Test doubles for the store and upload seams.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::models::{Participant, ScorePatch, ScoreRecord};
use crate::storage::{build_object_key, UploadFile, UploadService};
use crate::store::{ScoreStore, ScoreSubscription};
use crate::{Error, Result};

/// Upload service that never touches the network.
#[derive(Debug, Clone, Default)]
pub struct FakeUploader {
    fail: bool,
    uploads: Arc<AtomicUsize>,
}

impl FakeUploader {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

impl UploadService for FakeUploader {
    async fn upload(&self, file: &UploadFile, path_prefix: &str) -> Result<String> {
        if self.fail {
            return Err(Error::Upload("upload service unavailable".to_string()));
        }
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(format!(
            "https://cdn.test/{}",
            build_object_key(path_prefix, &file.file_name)
        ))
    }
}

/// Store wrapper that fails a chosen window of merge-writes.
#[derive(Debug, Clone)]
pub struct FlakyStore<S> {
    inner: S,
    skip: Arc<AtomicUsize>,
    failures: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl<S> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            skip: Arc::new(AtomicUsize::new(0)),
            failures: Arc::new(AtomicUsize::new(0)),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub const fn inner(&self) -> &S {
        &self.inner
    }

    pub fn fail_next_writes(&self, count: usize) {
        self.fail_writes(0, count);
    }

    /// Let `after` writes through, then fail the following `count`.
    pub fn fail_writes(&self, after: usize, count: usize) {
        self.skip.store(after, Ordering::SeqCst);
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Merge-writes that reached the inner store.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn should_fail(&self) -> bool {
        if self.failures.load(Ordering::SeqCst) == 0 {
            return false;
        }
        if self
            .skip
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |skip| skip.checked_sub(1))
            .is_ok()
        {
            return false;
        }
        self.failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

impl<S: ScoreStore> ScoreStore for FlakyStore<S> {
    async fn read(&self, participant: Participant) -> Result<Option<ScoreRecord>> {
        self.inner.read(participant).await
    }

    async fn merge_write(&self, participant: Participant, patch: &ScorePatch) -> Result<()> {
        if self.should_fail() {
            return Err(Error::Database(format!(
                "simulated write failure for {participant}"
            )));
        }
        self.inner.merge_write(participant, patch).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn subscribe(&self, participant: Participant) -> Result<ScoreSubscription> {
        self.inner.subscribe(participant).await
    }
}
