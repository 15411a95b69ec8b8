use std::env;
use std::path::{Path, PathBuf};

use heartsync_core::competition::{CompetitionResult, Outcome};
use heartsync_core::config::ShowcaseConfig;
use heartsync_core::db::SyncConfig;
use heartsync_core::models::{ImageEntry, ImageSlots};
use heartsync_core::services::SessionSnapshot;
use heartsync_core::store::{LibSqlScoreStore, ScoreStore};
use heartsync_core::{Participant, ScorePair};
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ParticipantStatus {
    pub key: Participant,
    pub name: String,
    /// Hearts stored in this participant's record
    pub hearts: u64,
    /// Love this participant has sent
    pub sent: u64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CompetitionStatus {
    pub end_time: i64,
    pub end_time_iso: String,
    pub remaining_secs: i64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct StatusReport {
    pub participants: Vec<ParticipantStatus>,
    pub competition: Option<CompetitionStatus>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ImageItem {
    pub slot: usize,
    pub prompt: String,
    pub url: Option<String>,
    pub uploaded_at: Option<String>,
}

pub async fn collect_status<S: ScoreStore>(
    store: &S,
    config: &ShowcaseConfig,
    now_ms: i64,
) -> Result<StatusReport, CliError> {
    let mut scores = ScorePair::default();
    let mut end_time = None;
    for participant in Participant::ALL {
        let record = store.read(participant).await?.unwrap_or_default();
        scores.set_record(participant, record.hearts);
        end_time = end_time.or(record.competition_end_time);
    }

    let participants = Participant::ALL
        .into_iter()
        .map(|participant| ParticipantStatus {
            key: participant,
            name: config.display_name(participant).to_string(),
            hearts: scores.record(participant),
            sent: scores.credited(participant),
        })
        .collect();

    let competition = end_time.map(|end_time| CompetitionStatus {
        end_time,
        end_time_iso: format_timestamp(end_time),
        remaining_secs: remaining_secs(end_time, now_ms),
    });

    Ok(StatusReport {
        participants,
        competition,
    })
}

pub fn format_status_lines(report: &StatusReport) -> Vec<String> {
    let mut lines = report
        .participants
        .iter()
        .map(|status| {
            format!(
                "{:<12} sent {:>4} {}",
                status.name,
                status.sent,
                pluralize_hearts(status.sent)
            )
        })
        .collect::<Vec<_>>();

    match &report.competition {
        Some(competition) if competition.remaining_secs > 0 => lines.push(format!(
            "Competition running: {} left",
            format_countdown(competition.remaining_secs)
        )),
        Some(competition) => lines.push(format!(
            "Competition ended at {}; run `heartsync compete ack` to reset",
            competition.end_time_iso
        )),
        None => lines.push("No competition running".to_string()),
    }
    lines
}

pub fn image_items(config: &ShowcaseConfig, slots: &ImageSlots) -> Vec<ImageItem> {
    slots
        .as_slice()
        .iter()
        .enumerate()
        .map(|(slot, entry)| ImageItem {
            slot: slot + 1,
            prompt: config.prompt_label(slot).unwrap_or_default().to_string(),
            url: entry.as_ref().map(|entry| entry.url.clone()),
            uploaded_at: entry.as_ref().map(|entry| format_timestamp(entry.timestamp)),
        })
        .collect()
}

pub fn format_image_lines(items: &[ImageItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| match &item.url {
            Some(url) => format!("{}. {}: {url}", item.slot, item.prompt),
            None => format!("{}. {}: (no photo yet)", item.slot, item.prompt),
        })
        .collect()
}

pub fn format_upload_line(config: &ShowcaseConfig, owner: Participant, entry: &ImageEntry) -> String {
    format!(
        "Uploaded \"{}\" for {}: {}",
        entry.prompt_label,
        config.display_name(owner),
        entry.url
    )
}

pub fn format_scores_line(config: &ShowcaseConfig, snapshot: &SessionSnapshot) -> String {
    let line = Participant::ALL
        .into_iter()
        .map(|participant| {
            let pending = if snapshot.pending[participant.other().index()] {
                "*"
            } else {
                ""
            };
            format!(
                "{} sent {}{pending}",
                config.display_name(participant),
                snapshot.scores.credited(participant)
            )
        })
        .collect::<Vec<_>>()
        .join(" | ");
    match snapshot.remaining_secs {
        Some(secs) => format!("{line} | {} left", format_countdown(secs)),
        None => line,
    }
}

pub fn format_result_line(config: &ShowcaseConfig, result: &CompetitionResult) -> String {
    let viewer = config.display_name(result.viewer);
    let other = config.display_name(result.viewer.other());
    let verdict = match result.outcome() {
        Outcome::Won => "You win!",
        Outcome::Lost => "You lose.",
        Outcome::Tied => "It's a tie.",
    };
    format!(
        "{verdict} {viewer} sent {}, {other} sent {}",
        result.viewer_score, result.other_score
    )
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_countdown(remaining_secs: i64) -> String {
    let remaining_secs = remaining_secs.max(0);
    format!("{}:{:02}", remaining_secs / 60, remaining_secs % 60)
}

/// Whole seconds until `end_time`, rounded up, never negative.
pub const fn remaining_secs(end_time: i64, now_ms: i64) -> i64 {
    let remaining = end_time.saturating_sub(now_ms);
    if remaining <= 0 {
        0
    } else {
        (remaining + 999) / 1000
    }
}

pub const fn pluralize_hearts(count: u64) -> &'static str {
    if count == 1 {
        "heart"
    } else {
        "hearts"
    }
}

/// Convert a 1-based CLI slot into a prompt index.
pub fn resolve_slot(config: &ShowcaseConfig, slot: u32) -> Result<usize, CliError> {
    let index = usize::try_from(slot)
        .ok()
        .and_then(|slot| slot.checked_sub(1))
        .filter(|index| *index < config.slot_count());
    index.ok_or(CliError::UnknownSlot {
        slot,
        count: config.slot_count(),
    })
}

pub fn resolve_participant(config: &ShowcaseConfig, raw: &str) -> Result<Participant, CliError> {
    Ok(config.resolve_participant(raw)?)
}

pub fn load_config(path: Option<&Path>) -> Result<ShowcaseConfig, CliError> {
    Ok(ShowcaseConfig::load(path)?)
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("HEARTSYNC_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("heartsync")
        .join("heartsync.db")
}

/// Open the score store, as a Turso replica when the env provides one.
pub async fn open_store(path: &Path) -> Result<LibSqlScoreStore, CliError> {
    let store = LibSqlScoreStore::open_path(path.to_path_buf(), SyncConfig::from_env()).await?;
    Ok(store)
}
