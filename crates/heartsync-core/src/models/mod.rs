//! Data models for heartsync

mod participant;
mod pending;
mod score;

pub use participant::Participant;
pub use pending::Pending;
pub use score::{ImageEntry, ImageSlots, ScorePair, ScorePatch, ScoreRecord};
