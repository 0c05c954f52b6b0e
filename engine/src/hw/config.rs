pub const RESUME_MAX_ATTEMPTS_ENV: &str = "PCMFLOW_RESUME_MAX_ATTEMPTS";
pub const RESUME_BACKOFF_MS_ENV: &str = "PCMFLOW_RESUME_BACKOFF_MS";
pub const NONBLOCK_ENV: &str = "PCMFLOW_NONBLOCK";

pub fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| {
            let s = v.trim().to_ascii_lowercase();
            s == "1" || s == "true" || s == "yes" || s == "on"
        })
        .unwrap_or(false)
}

pub fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
