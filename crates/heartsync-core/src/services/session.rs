//! One participant's interactive session.
//!
//! Wires the view state to the synchronizer and the competition controller.
//! Store and upload failures are handled here: logged and dropped, with any
//! optimistic state left in place.

use serde::Serialize;

use crate::clock::Clock;
use crate::competition::{CompetitionController, CompetitionPhase, CompetitionResult};
use crate::config::ShowcaseConfig;
use crate::models::{ImageSlots, Participant, ScorePair, ScoreRecord};
use crate::state::{Effect, Event, ViewState, SPARKLE_MS};
use crate::storage::UploadService;
use crate::store::ScoreStore;
use crate::sync::ScoreSynchronizer;
use crate::Result;

/// Serializable view of everything a front end renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub view: ViewState,
    pub heart_scale: f64,
    /// Hearts stored in each record
    pub scores: ScorePair,
    /// Records with a write still unconfirmed, A then B
    pub pending: [bool; 2],
    pub competition: CompetitionPhase,
    pub remaining_secs: Option<i64>,
    pub images_a: ImageSlots,
    pub images_b: ImageSlots,
}

pub struct Session<S, U, C> {
    view: ViewState,
    sync: ScoreSynchronizer<S, U>,
    competition: CompetitionController,
    clock: C,
    sparkle_until: Option<i64>,
}

impl<S: ScoreStore, U: UploadService, C: Clock> Session<S, U, C> {
    pub fn new(store: S, uploader: U, clock: C, config: ShowcaseConfig) -> Self {
        let view = ViewState::new(config.slot_count());
        let competition =
            CompetitionController::new(Participant::A, config.competition_duration_ms);
        Self {
            view,
            sync: ScoreSynchronizer::new(store, uploader, config),
            competition,
            clock,
            sparkle_until: None,
        }
    }

    pub const fn view(&self) -> &ViewState {
        &self.view
    }

    pub const fn synchronizer(&self) -> &ScoreSynchronizer<S, U> {
        &self.sync
    }

    pub const fn competition(&self) -> &CompetitionController {
        &self.competition
    }

    /// Reduce `event` and run its effects in order.
    ///
    /// Only rejected input is returned as an error; effect failures are
    /// logged.
    pub async fn dispatch(&mut self, event: Event) -> Result<()> {
        let effects = self.view.reduce(event)?;
        if let Some(viewer) = self.view.selected {
            self.competition.set_viewer(viewer);
        }
        for effect in effects {
            self.run(effect).await;
        }
        Ok(())
    }

    /// Wait for one pushed document and fold it in.
    ///
    /// Returns the participant whose document changed, or `None` when no
    /// subscription is live.
    pub async fn pump(&mut self) -> Option<Participant> {
        let (participant, record) = self.sync.next_update().await?;
        self.observe(participant, &record);
        self.tick();
        Some(participant)
    }

    fn observe(&mut self, participant: Participant, record: &ScoreRecord) {
        let had_result = self.competition.result().is_some();
        self.competition
            .observe_end_time(participant, record.competition_end_time);
        if had_result && self.competition.is_running() {
            self.settle(Event::CompetitionRestarted);
        }
    }

    /// Advance timers: the sparkle fade and the competition countdown.
    pub fn tick(&mut self) -> Option<CompetitionResult> {
        let now = self.clock.now_millis();
        if self.sparkle_until.is_some_and(|until| until <= now) {
            self.sparkle_until = None;
            self.settle(Event::SparkleElapsed);
        }

        let result = self.competition.tick(now, &self.sync.scores())?;
        self.settle(Event::CompetitionExpired);
        Some(result)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            view: self.view.clone(),
            heart_scale: self.view.heart_scale(),
            scores: self.sync.scores(),
            pending: Participant::ALL.map(|participant| self.sync.hearts(participant).is_pending()),
            competition: self.competition.phase(),
            remaining_secs: self.competition.remaining_secs(),
            images_a: self.sync.images(Participant::A).clone(),
            images_b: self.sync.images(Participant::B).clone(),
        }
    }

    async fn run(&mut self, effect: Effect) {
        let now = self.clock.now_millis();
        match effect {
            Effect::Unsubscribe => self.sync.unsubscribe_all(),
            Effect::SubscribeBoth => match self.sync.subscribe_both().await {
                Ok(opened) => {
                    for (participant, record) in &opened {
                        self.observe(*participant, record);
                    }
                    self.tick();
                }
                Err(error) => tracing::warn!(%error, "Failed to subscribe to score documents"),
            },
            Effect::LoadImages(participant) => {
                if let Err(error) = self.sync.load_images(participant).await {
                    tracing::warn!(%participant, %error, "Failed to load photos");
                }
                self.settle(Event::ImagesLoaded);
            }
            Effect::SendLove(sender) => {
                self.sparkle_until = Some(now.saturating_add(SPARKLE_MS));
                if let Err(error) = self.sync.send_love(sender).await {
                    tracing::warn!(%sender, %error, "Failed to send love");
                }
            }
            Effect::Upload {
                participant,
                slot,
                file,
            } => {
                if let Err(error) = self
                    .sync
                    .upload_image(participant, slot, &file, now)
                    .await
                {
                    tracing::warn!(%participant, slot, %error, "Failed to upload photo");
                }
                self.settle(Event::UploadFinished);
            }
            Effect::StartCompetition => {
                if let Err(error) = self.competition.start(self.sync.store(), now).await {
                    tracing::warn!(%error, "Failed to start competition");
                }
            }
            Effect::AcknowledgeResult => {
                if let Err(error) = self.competition.acknowledge(self.sync.store()).await {
                    tracing::warn!(%error, "Failed to reset after competition");
                }
            }
        }
    }

    /// Apply an event that only touches view flags.
    fn settle(&mut self, event: Event) {
        if let Err(error) = self.view.reduce(event) {
            tracing::debug!(%error, "Ignored view event");
        }
    }
}
