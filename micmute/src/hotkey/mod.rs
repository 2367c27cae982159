//! Global hotkey module.
//!
//! One fixed hotkey per process, bound to the settings window and delivered
//! through its message queue.

pub mod binding;
pub mod keycode;
pub mod registrar;
#[cfg(windows)]
pub mod win32;

pub use binding::{is_modifier_key, HotkeyBinding};
pub use global_hotkey::hotkey::{Code, HotKey, Modifiers};
pub use registrar::{HotkeyApi, HotkeyRegistrar, WindowHandle, HOTKEY_ID, WM_HOTKEY};
#[cfg(windows)]
pub use win32::Win32HotkeyApi;
