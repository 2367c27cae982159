//! MicMute - Library
//!
//! A background utility that toggles the microphone mute state from a
//! global hotkey.
//!
//! ## Features
//!
//! - One global hotkey that mutes or unmutes the selected capture device
//! - Single running instance; a second launch with `--show` raises the first
//! - Tray icon and feedback sounds that follow the device's mute state
//! - Settings window for the device, hotkey, sounds and startup options

pub mod app;
pub mod args;
pub mod audio;
pub mod hotkey;
pub mod instance;
pub mod logging;
pub mod platform;
pub mod settings;
pub mod ui;

#[cfg(test)]
mod testing;

pub use app::{App, MuteIndicator};
pub use args::LaunchArgs;
pub use audio::{AudioController, AudioDevice, AudioError};
pub use hotkey::{Code, HotkeyBinding, HotkeyRegistrar, Modifiers};
pub use instance::{Ownership, ShowListener, SingletonCoordinator, INSTANCE_EVENT_NAME};
pub use settings::{AppSettings, SettingsError, SettingsStore};
