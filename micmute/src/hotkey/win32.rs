//! `RegisterHotKey`-based implementation of [`HotkeyApi`].

use super::binding::HotkeyBinding;
use super::keycode::{modifier_flags, vk_from_code};
use super::registrar::{HotkeyApi, WindowHandle};
use tracing::warn;
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    RegisterHotKey, UnregisterHotKey, HOT_KEY_MODIFIERS, MOD_NOREPEAT,
};

/// Hotkeys delivered as `WM_HOTKEY` to a window's message queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32HotkeyApi;

impl HotkeyApi for Win32HotkeyApi {
    fn register(&self, window: WindowHandle, id: i32, binding: HotkeyBinding) -> bool {
        let Some(vk) = vk_from_code(binding.key) else {
            warn!(key = ?binding.key, "Key has no virtual-key code");
            return false;
        };

        // Holding the key down must not flip the mute state repeatedly.
        let modifiers = HOT_KEY_MODIFIERS(modifier_flags(binding.modifiers)) | MOD_NOREPEAT;
        unsafe { RegisterHotKey(hwnd(window), id, modifiers, vk).is_ok() }
    }

    fn unregister(&self, window: WindowHandle, id: i32) -> bool {
        unsafe { UnregisterHotKey(hwnd(window), id).is_ok() }
    }
}

pub(crate) fn hwnd(window: WindowHandle) -> HWND {
    HWND(window.0 as *mut core::ffi::c_void)
}

impl From<HWND> for WindowHandle {
    fn from(hwnd: HWND) -> Self {
        WindowHandle(hwnd.0 as isize)
    }
}
