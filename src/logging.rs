use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub const LOG_ENV: &str = "PCMFLOW_LOG";

fn parse_level(value: &str) -> Option<Level> {
    match value.trim().to_ascii_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

/// `-q` wins over `-v`; each `-v` raises the level one step above WARN.
fn level_from_flags(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

pub fn init(verbose: u8, quiet: bool) -> anyhow::Result<()> {
    let level = std::env::var(LOG_ENV)
        .ok()
        .and_then(|v| parse_level(&v))
        .unwrap_or_else(|| level_from_flags(verbose, quiet));

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_to_levels() {
        assert_eq!(level_from_flags(0, false), Level::WARN);
        assert_eq!(level_from_flags(2, false), Level::DEBUG);
        assert_eq!(level_from_flags(7, false), Level::TRACE);
        assert_eq!(level_from_flags(3, true), Level::ERROR);
    }

    #[test]
    fn env_level_names() {
        assert_eq!(parse_level(" Debug "), Some(Level::DEBUG));
        assert_eq!(parse_level("warning"), Some(Level::WARN));
        assert_eq!(parse_level("loud"), None);
    }
}
