//! Local view state and its pure transitions.
//!
//! Every user action is reduced to a new state plus a list of effects for the
//! session to run against the store and upload service.

use serde::Serialize;

use crate::models::Participant;
use crate::storage::UploadFile;
use crate::{Error, Result};

/// How long the heart keeps sparkling after the last click.
pub const SPARKLE_MS: i64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    SelectParticipant(Participant),
    Deselect,
    SendLove,
    SparkleElapsed,
    NextPhoto,
    PreviousPhoto,
    OpenImages,
    CloseImages,
    UploadPhoto { slot: usize, file: UploadFile },
    UploadFinished,
    ImagesLoaded,
    StartCompetition,
    CompetitionExpired,
    /// A newer competition replaced the one whose result is shown
    CompetitionRestarted,
    AcknowledgeResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Unsubscribe,
    SubscribeBoth,
    LoadImages(Participant),
    SendLove(Participant),
    Upload {
        participant: Participant,
        slot: usize,
        file: UploadFile,
    },
    StartCompetition,
    AcknowledgeResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub selected: Option<Participant>,
    pub current_photo: usize,
    pub images_open: bool,
    pub result_open: bool,
    pub uploading_slot: Option<usize>,
    pub loading: bool,
    /// Rapid-click counter; grows the heart until the sparkle fades
    pub love_streak: u32,
    pub sparkling: bool,
    photo_count: usize,
}

impl ViewState {
    #[must_use]
    pub const fn new(photo_count: usize) -> Self {
        Self {
            selected: None,
            current_photo: 0,
            images_open: false,
            result_open: false,
            uploading_slot: None,
            loading: false,
            love_streak: 0,
            sparkling: false,
            photo_count,
        }
    }

    pub const fn photo_count(&self) -> usize {
        self.photo_count
    }

    /// Scale applied to the big heart; grows without bound while clicking.
    pub fn heart_scale(&self) -> f64 {
        0.1f64.mul_add(f64::from(self.love_streak), 1.0)
    }

    pub fn reduce(&mut self, event: Event) -> Result<Vec<Effect>> {
        let effects = match event {
            Event::SelectParticipant(participant) => {
                let mut effects = Vec::new();
                if self.selected.is_some_and(|current| current != participant) {
                    effects.push(Effect::Unsubscribe);
                }
                self.selected = Some(participant);
                self.current_photo = 0;
                self.loading = true;
                effects.extend([
                    Effect::SubscribeBoth,
                    Effect::LoadImages(participant),
                    Effect::LoadImages(participant.other()),
                ]);
                effects
            }
            Event::Deselect => {
                self.selected = None;
                self.images_open = false;
                self.loading = false;
                vec![Effect::Unsubscribe]
            }
            Event::SendLove => {
                let sender = self.require_selection()?;
                self.love_streak = self.love_streak.saturating_add(1);
                self.sparkling = true;
                vec![Effect::SendLove(sender)]
            }
            Event::SparkleElapsed => {
                self.sparkling = false;
                self.love_streak = 0;
                Vec::new()
            }
            Event::NextPhoto => {
                if self.photo_count > 0 {
                    self.current_photo = (self.current_photo + 1) % self.photo_count;
                }
                Vec::new()
            }
            Event::PreviousPhoto => {
                if self.photo_count > 0 {
                    self.current_photo =
                        (self.current_photo + self.photo_count - 1) % self.photo_count;
                }
                Vec::new()
            }
            Event::OpenImages => {
                self.images_open = true;
                Vec::new()
            }
            Event::CloseImages => {
                self.images_open = false;
                Vec::new()
            }
            Event::UploadPhoto { slot, file } => {
                let participant = self.require_selection()?;
                if slot >= self.photo_count {
                    return Err(Error::InvalidInput(format!(
                        "Photo slot {slot} is out of range (0..{})",
                        self.photo_count
                    )));
                }
                if let Some(busy) = self.uploading_slot {
                    return Err(Error::InvalidInput(format!(
                        "Photo slot {busy} is still uploading"
                    )));
                }
                self.uploading_slot = Some(slot);
                vec![Effect::Upload {
                    participant,
                    slot,
                    file,
                }]
            }
            Event::UploadFinished => {
                self.uploading_slot = None;
                Vec::new()
            }
            Event::ImagesLoaded => {
                self.loading = false;
                Vec::new()
            }
            Event::StartCompetition => vec![Effect::StartCompetition],
            Event::CompetitionExpired => {
                self.result_open = true;
                Vec::new()
            }
            Event::CompetitionRestarted => {
                self.result_open = false;
                Vec::new()
            }
            Event::AcknowledgeResult => {
                self.result_open = false;
                vec![Effect::AcknowledgeResult]
            }
        };
        Ok(effects)
    }

    fn require_selection(&self) -> Result<Participant> {
        self.selected
            .ok_or_else(|| Error::InvalidInput("No participant selected".to_string()))
    }
}
