//! Master volume command.

use crate::config::Config;
use clap::{Args, Subcommand};
use pcmflow_engine::{AlsaMixer, VolumeControl};

#[derive(Args)]
pub struct VolumeArgs {
    #[command(subcommand)]
    command: Option<VolumeCommand>,

    /// Mixer device name
    #[arg(short, long)]
    device: Option<String>,

    /// Simple-mixer element to control
    #[arg(short, long)]
    element: Option<String>,
}

#[derive(Subcommand)]
enum VolumeCommand {
    /// Set volume to the given fraction (0.0 to 1.0)
    Set { level: f32 },

    /// Increase volume by the given fraction
    Up { step: f32 },

    /// Decrease volume by the given fraction
    Down { step: f32 },

    /// Show the current volume
    Get,
}

pub fn run(args: VolumeArgs, config: &Config) -> anyhow::Result<()> {
    let device = args.device.as_deref().unwrap_or(&config.mixer.device);
    let element = args.element.as_deref().unwrap_or(&config.mixer.element);
    let mut volume = VolumeControl::new(AlsaMixer::open(device, element)?);

    match args.command.unwrap_or(VolumeCommand::Get) {
        VolumeCommand::Set { level } => {
            let level = volume.set_level_pct(level)?;
            println!("Volume was set to {:.0}%.", level * 100.0);
        }
        VolumeCommand::Up { step } => {
            let level = volume.increase_by_pct(step)?;
            println!("Volume was set to {:.0}%.", level * 100.0);
        }
        VolumeCommand::Down { step } => {
            let level = volume.decrease_by_pct(step)?;
            println!("Volume was set to {:.0}%.", level * 100.0);
        }
        VolumeCommand::Get => {
            println!("Volume is {:.0}%.", volume.level_pct()? * 100.0);
        }
    }
    Ok(())
}
