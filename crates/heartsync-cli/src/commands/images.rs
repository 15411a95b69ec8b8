use std::path::Path;

use heartsync_core::config::ShowcaseConfig;
use heartsync_core::storage::UploadBackend;
use heartsync_core::sync::ScoreSynchronizer;

use crate::commands::common::{format_image_lines, image_items, open_store, resolve_participant};
use crate::error::CliError;

pub async fn run_images(
    config: &ShowcaseConfig,
    owner: &str,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let owner = resolve_participant(config, owner)?;
    let store = open_store(db_path).await?;
    let mut sync = ScoreSynchronizer::new(store, None::<UploadBackend>, config.clone());

    let slots = sync.load_images(owner).await?;
    let items = image_items(config, &slots);
    if as_json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        println!("{}'s photos", config.display_name(owner));
        for line in format_image_lines(&items) {
            println!("{line}");
        }
    }
    Ok(())
}
