use std::path::Path;
use std::time::Duration;

use heartsync_core::clock::SystemClock;
use heartsync_core::competition::CompetitionPhase;
use heartsync_core::config::ShowcaseConfig;
use heartsync_core::services::Session;
use heartsync_core::state::Event;
use heartsync_core::storage::UploadBackend;
use heartsync_core::store::LibSqlScoreStore;
use heartsync_core::Participant;

use crate::commands::common::{
    format_countdown, format_result_line, format_scores_line, open_store, resolve_participant,
};
use crate::error::CliError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowMode {
    /// Print every score change until interrupted
    Scores,
    /// Print the countdown once a second and stop at expiry
    Countdown,
}

pub async fn run_watch(config: &ShowcaseConfig, viewer: &str, db_path: &Path) -> Result<(), CliError> {
    let viewer = resolve_participant(config, viewer)?;
    let store = open_store(db_path).await?;
    follow(store, config, viewer, FollowMode::Scores).await
}

/// Drive a session against the store, pulling changes from other processes
/// once a second.
pub async fn follow(
    store: LibSqlScoreStore,
    config: &ShowcaseConfig,
    viewer: Participant,
    mode: FollowMode,
) -> Result<(), CliError> {
    let refresher = store.clone();
    let mut session = Session::new(store, None::<UploadBackend>, SystemClock, config.clone());
    session.dispatch(Event::SelectParticipant(viewer)).await?;

    match (mode, session.competition().phase()) {
        (FollowMode::Countdown, CompetitionPhase::Idle) => {
            println!("No competition running");
            return Ok(());
        }
        (FollowMode::Countdown, CompetitionPhase::Expired { result }) => {
            println!("{}", format_result_line(config, &result));
            return Ok(());
        }
        (FollowMode::Scores, _) => println!("{}", format_scores_line(config, &session.snapshot())),
        (FollowMode::Countdown, CompetitionPhase::Running { .. }) => {}
    }

    let mut announced = false;
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            changed = session.pump() => {
                if changed.is_none() {
                    break;
                }
                if mode == FollowMode::Scores {
                    println!("{}", format_scores_line(config, &session.snapshot()));
                }
            }
            _ = ticker.tick() => {
                if let Err(error) = refresher.refresh().await {
                    tracing::warn!(%error, "Failed to refresh scores");
                }
                session.tick();
                if mode == FollowMode::Countdown {
                    if let Some(secs) = session.competition().remaining_secs().filter(|secs| *secs > 0) {
                        println!("{} left", format_countdown(secs));
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }

        match session.competition().phase() {
            CompetitionPhase::Expired { result } if !announced => {
                announced = true;
                println!("{}", format_result_line(config, &result));
                if mode == FollowMode::Countdown {
                    break;
                }
            }
            CompetitionPhase::Expired { .. } => {}
            CompetitionPhase::Idle if mode == FollowMode::Countdown => {
                println!("Competition cleared");
                break;
            }
            _ => announced = false,
        }
    }

    session.dispatch(Event::Deselect).await?;
    Ok(())
}
