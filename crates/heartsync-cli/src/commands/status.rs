use std::path::Path;

use heartsync_core::clock::{Clock, SystemClock};
use heartsync_core::config::ShowcaseConfig;

use crate::commands::common::{collect_status, format_status_lines, open_store};
use crate::error::CliError;

pub async fn run_status(
    config: &ShowcaseConfig,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let report = collect_status(&store, config, SystemClock.now_millis()).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in format_status_lines(&report) {
            println!("{line}");
        }
    }

    Ok(())
}
