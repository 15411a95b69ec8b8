use std::path::Path;

use heartsync_core::config::ShowcaseConfig;
use heartsync_core::storage::{UploadBackend, UploadService};
use heartsync_core::store::ScoreStore;
use heartsync_core::sync::ScoreSynchronizer;
use heartsync_core::Participant;

use crate::commands::common::{open_store, pluralize_hearts, resolve_participant};
use crate::error::CliError;

pub async fn run_send_love(
    config: &ShowcaseConfig,
    sender: &str,
    times: u32,
    db_path: &Path,
) -> Result<(), CliError> {
    let sender = resolve_participant(config, sender)?;
    let store = open_store(db_path).await?;
    let mut sync = ScoreSynchronizer::new(store, None::<UploadBackend>, config.clone());

    let total = send_love(&mut sync, sender, times).await?;
    println!(
        "{} sent {times} {} to {} ({total} total)",
        config.display_name(sender),
        pluralize_hearts(u64::from(times)),
        config.display_name(sender.other()),
    );
    Ok(())
}

/// Send `times` hearts one write at a time; returns the partner record's final value.
pub async fn send_love<S: ScoreStore, U: UploadService>(
    sync: &mut ScoreSynchronizer<S, U>,
    sender: Participant,
    times: u32,
) -> Result<u64, CliError> {
    // Subscribing folds the stored value, so the first send builds on it.
    sync.subscribe(sender.other()).await?;

    let mut total = sync.scores().record(sender.other());
    for _ in 0..times {
        total = sync.send_love(sender).await?;
    }
    sync.unsubscribe_all();
    Ok(total)
}
