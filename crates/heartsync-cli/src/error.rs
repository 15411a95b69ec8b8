use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] heartsync_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error(
        "Uploads are not configured. Set the R2_* variables, or BLOB_API_URL and BLOB_READ_WRITE_TOKEN."
    )]
    UploadNotConfigured,
    #[error("Not an image file: {0}")]
    NotAnImage(String),
    #[error("Photo slot {slot} does not exist; there are {count} prompts")]
    UnknownSlot { slot: u32, count: usize },
    #[error("The competition is still running ({0}s left)")]
    CompetitionRunning(i64),
    #[error("No competition to acknowledge")]
    NoCompetition,
}
