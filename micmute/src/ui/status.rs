//! Text shown in the tray tooltip and the settings window.

use crate::audio::AudioDevice;
use crate::hotkey::HotkeyBinding;

/// Shown in place of the hotkey when none is bound.
pub const HOTKEY_PROMPT: &str = "Click here and press a key combination";

/// Shown while the window is waiting for a key press.
pub const CAPTURE_PROMPT: &str = "Press a key combination (Esc to cancel)";

pub fn tooltip(muted: bool) -> String {
    format!("Microphone: {}", mute_word(muted))
}

fn mute_word(muted: bool) -> &'static str {
    if muted {
        "Muted"
    } else {
        "Unmuted"
    }
}

/// What the settings window shows about the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub device: String,
    pub state: String,
    pub hotkey: String,
}

impl StatusView {
    pub fn new(
        device: Option<&AudioDevice>,
        muted: bool,
        hotkey: Option<HotkeyBinding>,
        capturing: bool,
    ) -> Self {
        let (device, state) = match device {
            Some(device) => (
                format!("Microphone: {}", device.name),
                format!("State: {}", mute_word(muted)),
            ),
            None => (
                "Microphone: none selected".to_string(),
                "State: unavailable".to_string(),
            ),
        };

        let hotkey = if capturing {
            CAPTURE_PROMPT.to_string()
        } else {
            match hotkey.filter(HotkeyBinding::is_set) {
                Some(binding) => format!("Hotkey: {binding}"),
                None => HOTKEY_PROMPT.to_string(),
            }
        };

        Self { device, state, hotkey }
    }

    pub fn lines(&self) -> [&str; 3] {
        [&self.device, &self.state, &self.hotkey]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::{Code, Modifiers};

    #[test]
    fn tooltip_names_state() {
        assert_eq!(tooltip(true), "Microphone: Muted");
        assert_eq!(tooltip(false), "Microphone: Unmuted");
    }

    #[test]
    fn status_with_device_and_hotkey() {
        let device = AudioDevice::new("id", "Headset Mic");
        let binding = HotkeyBinding::new(Modifiers::CONTROL | Modifiers::ALT, Code::KeyM);

        let view = StatusView::new(Some(&device), true, Some(binding), false);

        assert_eq!(view.device, "Microphone: Headset Mic");
        assert_eq!(view.state, "State: Muted");
        assert_eq!(view.hotkey, format!("Hotkey: {binding}"));
    }

    #[test]
    fn unbound_hotkey_shows_prompt() {
        let view = StatusView::new(None, false, None, false);

        assert_eq!(view.hotkey, HOTKEY_PROMPT);
        assert_eq!(view.state, "State: unavailable");
    }

    #[test]
    fn capture_mode_overrides_hotkey_line() {
        let binding = HotkeyBinding::new(Modifiers::empty(), Code::Pause);

        let view = StatusView::new(None, false, Some(binding), true);

        assert_eq!(view.hotkey, CAPTURE_PROMPT);
    }
}
