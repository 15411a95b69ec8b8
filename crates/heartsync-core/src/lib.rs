//! heartsync-core - Core library for heartsync
//!
//! Shared score documents, store backends, photo uploads, the timed
//! competition and the per-session state used by every heartsync front end.

pub mod clock;
pub mod competition;
pub mod config;
pub mod db;
pub mod error;
pub mod media;
pub mod models;
pub mod scene;
pub mod services;
pub mod state;
pub mod storage;
pub mod store;
pub mod sync;
pub mod util;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
pub use models::{Participant, ScorePair, ScoreRecord};
