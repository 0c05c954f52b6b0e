//! pcmflow - play, record and control volume through ALSA.

#[cfg(target_os = "linux")]
mod commands;
mod config;
mod logging;
mod wav;

use clap::{Parser, Subcommand};
use config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pcmflow")]
#[command(author, version, about = "Period-based PCM playback and capture", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More log output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(target_os = "linux")]
#[derive(Subcommand)]
enum Commands {
    /// Play a WAV file
    Play(commands::play::PlayArgs),

    /// Record from a capture device into a WAV file
    Record(commands::record::RecordArgs),

    /// Get or change the master volume
    Volume(commands::volume::VolumeArgs),
}

#[cfg(not(target_os = "linux"))]
#[derive(Subcommand)]
enum Commands {}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet)?;
    let config = Config::load(cli.config.as_deref())?;
    run(cli.command, &config)
}

#[cfg(target_os = "linux")]
fn run(command: Commands, config: &Config) -> anyhow::Result<()> {
    match command {
        Commands::Play(args) => commands::play::run(args, config),
        Commands::Record(args) => commands::record::run(args, config),
        Commands::Volume(args) => commands::volume::run(args, config),
    }
}

#[cfg(not(target_os = "linux"))]
fn run(command: Commands, _config: &Config) -> anyhow::Result<()> {
    match command {}
}
