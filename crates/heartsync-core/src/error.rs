//! Error types for heartsync-core

use thiserror::Error;

/// Result type alias using heartsync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in heartsync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Media/object storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Upload endpoint error
    #[error("Upload error: {0}")]
    Upload(String),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A push subscription ended because its store went away
    #[error("Subscription closed for participant {0}")]
    SubscriptionClosed(String),
}
