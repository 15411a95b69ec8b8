//! Timed heart competition.
//!
//! `Idle -> Running -> Expired -> Idle`. Starting resets both records and then
//! stamps the same end time on each; every session runs its own countdown off
//! that timestamp and expires locally.

use serde::Serialize;

use crate::models::{Participant, ScorePair, ScorePatch};
use crate::store::ScoreStore;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Won,
    Lost,
    Tied,
}

/// Scores frozen at the instant a competition expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompetitionResult {
    pub viewer: Participant,
    /// Love the viewer sent during the competition
    pub viewer_score: u64,
    /// Love the partner sent
    pub other_score: u64,
    pub is_winner: bool,
}

impl CompetitionResult {
    #[must_use]
    pub fn new(viewer: Participant, scores: &ScorePair) -> Self {
        Self {
            viewer,
            viewer_score: scores.credited(viewer),
            other_score: scores.credited(viewer.other()),
            is_winner: is_winner(viewer, scores),
        }
    }

    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        if self.is_winner {
            Outcome::Won
        } else if self.viewer_score == self.other_score {
            Outcome::Tied
        } else {
            Outcome::Lost
        }
    }
}

/// Strictly more love sent wins; a tie is a loss for both sides.
///
/// Hearts in the partner's record are the ones the viewer sent.
#[must_use]
pub const fn is_winner(viewer: Participant, scores: &ScorePair) -> bool {
    scores.record(viewer.other()) > scores.record(viewer)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum CompetitionPhase {
    Idle,
    Running { end_time: i64 },
    Expired { result: CompetitionResult },
}

/// Zero both records and clear any end time, A first.
pub async fn reset_scores<S: ScoreStore>(store: &S) -> Result<()> {
    for participant in Participant::ALL {
        store.merge_write(participant, &ScorePatch::reset()).await?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct CompetitionController {
    viewer: Participant,
    duration_ms: i64,
    phase: CompetitionPhase,
    remaining_ms: Option<i64>,
    /// End time of the last expired competition; late pushes carrying it
    /// must not restart the countdown.
    finished_end_time: Option<i64>,
    /// Records whose end-time echo of our own `start` is still outstanding,
    /// indexed by participant. Their reset echo must not stop the countdown.
    awaiting_echo: [bool; 2],
}

impl CompetitionController {
    #[must_use]
    pub const fn new(viewer: Participant, duration_ms: i64) -> Self {
        Self {
            viewer,
            duration_ms,
            phase: CompetitionPhase::Idle,
            remaining_ms: None,
            finished_end_time: None,
            awaiting_echo: [false; 2],
        }
    }

    pub const fn viewer(&self) -> Participant {
        self.viewer
    }

    /// Results are computed from the viewer's side; an expired result stays
    /// as it was computed.
    pub fn set_viewer(&mut self, viewer: Participant) {
        self.viewer = viewer;
    }

    pub const fn phase(&self) -> CompetitionPhase {
        self.phase
    }

    pub const fn is_running(&self) -> bool {
        matches!(self.phase, CompetitionPhase::Running { .. })
    }

    pub const fn result(&self) -> Option<CompetitionResult> {
        match self.phase {
            CompetitionPhase::Expired { result } => Some(result),
            _ => None,
        }
    }

    /// Start a competition: reset both records, then stamp the end time.
    ///
    /// The end time is only written once both resets succeeded. A failed write
    /// leaves the controller where it was; records already written stay written.
    pub async fn start<S: ScoreStore>(&mut self, store: &S, now: i64) -> Result<i64> {
        if self.is_running() {
            return Err(Error::InvalidInput(
                "A competition is already running".to_string(),
            ));
        }

        reset_scores(store).await?;
        let end_time = now.saturating_add(self.duration_ms);
        for participant in Participant::ALL {
            store
                .merge_write(participant, &ScorePatch::competition_end(end_time))
                .await?;
        }

        self.enter_running(end_time);
        self.remaining_ms = Some(self.duration_ms);
        self.awaiting_echo = [true; 2];
        tracing::info!(end_time, duration_ms = self.duration_ms, "Competition started");
        Ok(end_time)
    }

    /// Close the result and reset both records.
    pub async fn acknowledge<S: ScoreStore>(&mut self, store: &S) -> Result<()> {
        if !matches!(self.phase, CompetitionPhase::Expired { .. }) {
            return Err(Error::InvalidInput(
                "No competition result to acknowledge".to_string(),
            ));
        }

        reset_scores(store).await?;
        self.phase = CompetitionPhase::Idle;
        self.remaining_ms = None;
        self.awaiting_echo = [false; 2];
        tracing::info!("Competition result acknowledged");
        Ok(())
    }

    /// Fold the `competitionEndTime` pushed in `source`'s record.
    ///
    /// A shown result gives way to a competition with a newer end time. A
    /// cleared end time stops the countdown, except for the reset our own
    /// `start` wrote ahead of the end time.
    pub fn observe_end_time(&mut self, source: Participant, end_time: Option<i64>) {
        match (self.phase, end_time) {
            (CompetitionPhase::Idle, Some(end)) if self.finished_end_time != Some(end) => {
                tracing::info!(end_time = end, "Competition started remotely");
                self.enter_running(end);
            }
            (CompetitionPhase::Expired { .. }, Some(end)) if self.finished_end_time != Some(end) => {
                tracing::info!(end_time = end, "Next competition started remotely");
                self.enter_running(end);
            }
            (CompetitionPhase::Running { end_time: current }, Some(end)) => {
                self.awaiting_echo[source.index()] = false;
                if current != end {
                    self.enter_running(end);
                }
            }
            (CompetitionPhase::Running { .. }, None) if self.awaiting_echo[source.index()] => {
                tracing::debug!(%source, "Skipped reset echo of our own start");
            }
            (CompetitionPhase::Running { .. }, None) => {
                tracing::debug!("Competition cleared remotely");
                self.phase = CompetitionPhase::Idle;
                self.remaining_ms = None;
            }
            _ => {}
        }
    }

    /// Advance the countdown; returns the result on the tick that expires it.
    pub fn tick(&mut self, now: i64, scores: &ScorePair) -> Option<CompetitionResult> {
        let CompetitionPhase::Running { end_time } = self.phase else {
            return None;
        };

        let remaining = end_time.saturating_sub(now).max(0);
        let remaining = self
            .remaining_ms
            .map_or(remaining, |previous| previous.min(remaining));
        self.remaining_ms = Some(remaining);
        if remaining > 0 {
            return None;
        }

        let result = CompetitionResult::new(self.viewer, scores);
        self.phase = CompetitionPhase::Expired { result };
        self.finished_end_time = Some(end_time);
        tracing::info!(
            viewer = %result.viewer,
            viewer_score = result.viewer_score,
            other_score = result.other_score,
            outcome = ?result.outcome(),
            "Competition expired"
        );
        Some(result)
    }

    /// Milliseconds left; `None` when idle or not yet ticked.
    pub const fn remaining_ms(&self) -> Option<i64> {
        match self.phase {
            CompetitionPhase::Idle => None,
            CompetitionPhase::Running { .. } => self.remaining_ms,
            CompetitionPhase::Expired { .. } => Some(0),
        }
    }

    /// Whole seconds left, rounded up for display.
    pub const fn remaining_secs(&self) -> Option<i64> {
        match self.remaining_ms() {
            Some(ms) => Some((ms + 999) / 1000),
            None => None,
        }
    }

    fn enter_running(&mut self, end_time: i64) {
        self.phase = CompetitionPhase::Running { end_time };
        self.remaining_ms = None;
        self.awaiting_echo = [false; 2];
    }
}
