use crate::error::HwError;

pub fn described(desc: &str, err: &HwError) -> String {
    format!("{desc} (ALSA Description: {})", err.description())
}

pub fn backend_open_error(direction: &str, device: &str, err: impl std::fmt::Display) -> String {
    format!("Failed to open ALSA {direction} '{device}': {err}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EPIPE;

    #[test]
    fn pairs_description_with_driver_text() {
        let err = HwError::new("snd_pcm_prepare", -EPIPE);
        let text = described("Attempt to recover from underrun failed.", &err);
        assert!(text.starts_with("Attempt to recover from underrun failed. (ALSA Description: "));
        assert!(text.ends_with(')'));
    }
}
