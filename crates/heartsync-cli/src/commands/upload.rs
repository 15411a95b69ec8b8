use std::path::Path;

use heartsync_core::clock::{Clock, SystemClock};
use heartsync_core::config::ShowcaseConfig;
use heartsync_core::models::ImageEntry;
use heartsync_core::storage::{UploadBackend, UploadFile, UploadService};
use heartsync_core::store::ScoreStore;
use heartsync_core::sync::ScoreSynchronizer;
use heartsync_core::Participant;

use crate::commands::common::{format_upload_line, open_store, resolve_participant, resolve_slot};
use crate::error::CliError;

pub async fn run_upload(
    config: &ShowcaseConfig,
    owner: &str,
    slot: u32,
    file_path: &Path,
    db_path: &Path,
) -> Result<(), CliError> {
    let owner = resolve_participant(config, owner)?;
    let slot = resolve_slot(config, slot)?;
    let uploader = UploadBackend::from_env()?.ok_or(CliError::UploadNotConfigured)?;
    let store = open_store(db_path).await?;

    let mut sync = ScoreSynchronizer::new(store, uploader, config.clone());
    let file = UploadFile::from_path(file_path)?;
    let entry = upload_photo(&mut sync, owner, slot, &file, SystemClock.now_millis()).await?;
    println!("{}", format_upload_line(config, owner, &entry));
    Ok(())
}

/// Only images are accepted; the gallery renders every entry as a photo.
pub async fn upload_photo<S: ScoreStore, U: UploadService>(
    sync: &mut ScoreSynchronizer<S, U>,
    owner: Participant,
    slot: usize,
    file: &UploadFile,
    now_ms: i64,
) -> Result<ImageEntry, CliError> {
    if !file.is_image() {
        return Err(CliError::NotAnImage(file.file_name.clone()));
    }
    Ok(sync.upload_image(owner, slot, file, now_ms).await?)
}
