//! User interface: the settings window, its menu bar and the tray icon.
//!
//! `status` and `menu` hold the platform-neutral text and command tables;
//! the Win32 pieces are compiled on Windows only.

pub mod fault;
pub mod menu;
pub mod status;
#[cfg(windows)]
pub mod tray;
#[cfg(windows)]
pub mod window;

pub use menu::{Command, MenuModel};
pub use status::{StatusView, HOTKEY_PROMPT};
#[cfg(windows)]
pub use tray::{TrayError, TrayEvent, TrayManager};
#[cfg(windows)]
pub use window::{
    report_fatal_panic, run, show_error, LaunchOptions, PostShowDispatcher, WM_APP_SHOW,
};
