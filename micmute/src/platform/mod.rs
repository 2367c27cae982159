//! OS integration that is not audio or hotkeys: icons, autostart, sounds.

pub mod autostart;
pub mod icons;
pub mod sounds;

pub use autostart::AutostartError;
#[cfg(windows)]
pub use autostart::RunKey;
pub use icons::{microphone_icon, IconImage, ICON_SIZE};
pub use sounds::{catalogue, SoundInfo, SoundPlayer};
#[cfg(windows)]
pub use sounds::{system_sounds, SystemSoundPlayer};
