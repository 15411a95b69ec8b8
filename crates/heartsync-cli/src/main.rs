//! Heartsync CLI - send love, share photos and race the heart timer
//!
//! Two partners share one score store; every command reads or writes it.

mod cli;
mod commands;
mod error;


use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, CompeteCommands};
use crate::commands::common::{load_config, resolve_db_path};
use crate::commands::compete::{run_compete_ack, run_compete_start, run_compete_watch};
use crate::commands::completions::run_completions;
use crate::commands::images::run_images;
use crate::commands::scene::run_scene;
use crate::commands::send_love::run_send_love;
use crate::commands::status::run_status;
use crate::commands::upload::run_upload;
use crate::commands::watch::run_watch;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "heartsync=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Status { json }) => run_status(&config, json, &db_path).await,
        Some(Commands::SendLove { sender, times }) => {
            run_send_love(&config, &sender, times, &db_path).await
        }
        Some(Commands::Upload { owner, slot, file }) => {
            run_upload(&config, &owner, slot, &file, &db_path).await
        }
        Some(Commands::Images { owner, json }) => run_images(&config, &owner, json, &db_path).await,
        Some(Commands::Compete { command }) => match command {
            CompeteCommands::Start => run_compete_start(&config, &db_path).await,
            CompeteCommands::Watch { viewer } => run_compete_watch(&config, &viewer, &db_path).await,
            CompeteCommands::Ack => run_compete_ack(&config, &db_path).await,
        },
        Some(Commands::Watch { viewer }) => run_watch(&config, &viewer, &db_path).await,
        Some(Commands::Scene { count, seed }) => run_scene(&config, count, seed),
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())
        }
        None => {
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}
