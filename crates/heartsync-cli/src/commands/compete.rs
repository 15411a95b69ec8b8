use std::path::Path;

use heartsync_core::clock::{Clock, SystemClock};
use heartsync_core::competition::{CompetitionController, CompetitionPhase, CompetitionResult};
use heartsync_core::config::ShowcaseConfig;
use heartsync_core::store::ScoreStore;
use heartsync_core::{Participant, ScorePair};

use crate::commands::common::{
    format_countdown, format_result_line, format_timestamp, open_store, remaining_secs,
    resolve_participant,
};
use crate::commands::watch::{follow, FollowMode};
use crate::error::CliError;

pub async fn run_compete_start(config: &ShowcaseConfig, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let now_ms = SystemClock.now_millis();
    let end_time = start_competition(&store, config, now_ms).await?;
    println!(
        "Competition started: {} on the clock, ends at {}",
        format_countdown(remaining_secs(end_time, now_ms)),
        format_timestamp(end_time)
    );
    Ok(())
}

pub async fn run_compete_watch(
    config: &ShowcaseConfig,
    viewer: &str,
    db_path: &Path,
) -> Result<(), CliError> {
    let viewer = resolve_participant(config, viewer)?;
    let store = open_store(db_path).await?;
    follow(store, config, viewer, FollowMode::Countdown).await
}

pub async fn run_compete_ack(config: &ShowcaseConfig, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let result = acknowledge_competition(&store, config, SystemClock.now_millis()).await?;
    println!("{}", format_result_line(config, &result));
    println!("Scores reset");
    Ok(())
}

/// Rebuild the controller a running session would hold, from the stored records.
pub async fn controller_from_store<S: ScoreStore>(
    store: &S,
    viewer: Participant,
    config: &ShowcaseConfig,
    now_ms: i64,
) -> Result<CompetitionController, CliError> {
    let mut scores = ScorePair::default();
    let mut controller = CompetitionController::new(viewer, config.competition_duration_ms);
    for participant in Participant::ALL {
        let record = store.read(participant).await?.unwrap_or_default();
        scores.set_record(participant, record.hearts);
        // A record not yet stamped during a start must not hide the other's end time.
        if let Some(end_time) = record.competition_end_time {
            controller.observe_end_time(participant, Some(end_time));
        }
    }
    controller.tick(now_ms, &scores);
    Ok(controller)
}

pub async fn start_competition<S: ScoreStore>(
    store: &S,
    config: &ShowcaseConfig,
    now_ms: i64,
) -> Result<i64, CliError> {
    let mut controller = controller_from_store(store, Participant::A, config, now_ms).await?;
    if let CompetitionPhase::Running { end_time } = controller.phase() {
        return Err(CliError::CompetitionRunning(remaining_secs(end_time, now_ms)));
    }
    Ok(controller.start(store, now_ms).await?)
}

/// Close an expired competition; the result is reported from A's side.
pub async fn acknowledge_competition<S: ScoreStore>(
    store: &S,
    config: &ShowcaseConfig,
    now_ms: i64,
) -> Result<CompetitionResult, CliError> {
    let mut controller = controller_from_store(store, Participant::A, config, now_ms).await?;
    match controller.phase() {
        CompetitionPhase::Idle => Err(CliError::NoCompetition),
        CompetitionPhase::Running { end_time } => Err(CliError::CompetitionRunning(
            remaining_secs(end_time, now_ms),
        )),
        CompetitionPhase::Expired { result } => {
            controller.acknowledge(store).await?;
            Ok(result)
        }
    }
}
