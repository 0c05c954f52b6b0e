//! Subcommand implementations. All of them drive the ALSA backend.

pub mod play;
pub mod record;
pub mod volume;
