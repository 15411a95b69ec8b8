use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "heartsync")]
#[command(about = "Send love, share photos and race the heart timer")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional showcase config (names, prompts, timing) as JSON
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show both scores and any running competition
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Send hearts to your partner
    SendLove {
        /// Who is sending (a, b or a display name)
        #[arg(long = "as", value_name = "WHO")]
        sender: String,
        /// Number of hearts to send
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..=1000))]
        times: u32,
    },
    /// Upload a photo for one of the prompts
    Upload {
        /// Whose gallery the photo belongs to
        #[arg(long = "as", value_name = "WHO")]
        owner: String,
        /// Prompt slot, starting at 1
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        slot: u32,
        /// Image file to upload
        file: PathBuf,
    },
    /// List a participant's photos by prompt
    Images {
        /// Whose gallery to show
        #[arg(long = "as", value_name = "WHO")]
        owner: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Timed heart competition
    Compete {
        #[command(subcommand)]
        command: CompeteCommands,
    },
    /// Follow live score changes
    Watch {
        /// Whose point of view to show
        #[arg(long = "as", value_name = "WHO")]
        viewer: String,
    },
    /// Print the floating-heart background layout as JSON
    Scene {
        /// Number of hearts, at most 500 (defaults to the configured count)
        #[arg(long, value_parser = clap::value_parser!(u16).range(0..=500))]
        count: Option<u16>,
        /// Seed for a reproducible layout
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum CompeteCommands {
    /// Reset both scores and start the countdown
    Start,
    /// Follow the countdown until it expires
    Watch {
        /// Whose point of view to show
        #[arg(long = "as", value_name = "WHO")]
        viewer: String,
    },
    /// Acknowledge an expired competition and reset the scores
    Ack,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
