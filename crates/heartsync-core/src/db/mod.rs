//! libSQL persistence for score documents

mod connection;
mod migrations;
mod repository;

pub use connection::{Database, SyncConfig};
pub use repository::{LibSqlScoreRepository, ScoreRepository};
