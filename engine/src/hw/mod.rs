#[cfg(target_os = "linux")]
pub mod alsa;
pub mod config;
pub mod error_fmt;
pub mod traits;
