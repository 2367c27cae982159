//! Translation between `global-hotkey` key codes and Windows virtual keys.
//!
//! `RegisterHotKey` takes a virtual-key code and `MOD_*` flags, and
//! `WM_KEYDOWN` reports virtual keys while a new hotkey is captured.

use global_hotkey::hotkey::{Code, Modifiers};

const MOD_ALT: u32 = 0x0001;
const MOD_CONTROL: u32 = 0x0002;
const MOD_SHIFT: u32 = 0x0004;
const MOD_WIN: u32 = 0x0008;

/// Key codes with their virtual-key equivalent. The generic `VK_SHIFT`,
/// `VK_CONTROL` and `VK_MENU` are handled in [`code_from_vk`].
const VIRTUAL_KEYS: &[(Code, u32)] = &[
    (Code::Backspace, 0x08),
    (Code::Tab, 0x09),
    (Code::Enter, 0x0D),
    (Code::Pause, 0x13),
    (Code::CapsLock, 0x14),
    (Code::Escape, 0x1B),
    (Code::Space, 0x20),
    (Code::PageUp, 0x21),
    (Code::PageDown, 0x22),
    (Code::End, 0x23),
    (Code::Home, 0x24),
    (Code::ArrowLeft, 0x25),
    (Code::ArrowUp, 0x26),
    (Code::ArrowRight, 0x27),
    (Code::ArrowDown, 0x28),
    (Code::PrintScreen, 0x2C),
    (Code::Insert, 0x2D),
    (Code::Delete, 0x2E),
    (Code::Digit0, 0x30),
    (Code::Digit1, 0x31),
    (Code::Digit2, 0x32),
    (Code::Digit3, 0x33),
    (Code::Digit4, 0x34),
    (Code::Digit5, 0x35),
    (Code::Digit6, 0x36),
    (Code::Digit7, 0x37),
    (Code::Digit8, 0x38),
    (Code::Digit9, 0x39),
    (Code::KeyA, 0x41),
    (Code::KeyB, 0x42),
    (Code::KeyC, 0x43),
    (Code::KeyD, 0x44),
    (Code::KeyE, 0x45),
    (Code::KeyF, 0x46),
    (Code::KeyG, 0x47),
    (Code::KeyH, 0x48),
    (Code::KeyI, 0x49),
    (Code::KeyJ, 0x4A),
    (Code::KeyK, 0x4B),
    (Code::KeyL, 0x4C),
    (Code::KeyM, 0x4D),
    (Code::KeyN, 0x4E),
    (Code::KeyO, 0x4F),
    (Code::KeyP, 0x50),
    (Code::KeyQ, 0x51),
    (Code::KeyR, 0x52),
    (Code::KeyS, 0x53),
    (Code::KeyT, 0x54),
    (Code::KeyU, 0x55),
    (Code::KeyV, 0x56),
    (Code::KeyW, 0x57),
    (Code::KeyX, 0x58),
    (Code::KeyY, 0x59),
    (Code::KeyZ, 0x5A),
    (Code::MetaLeft, 0x5B),
    (Code::MetaRight, 0x5C),
    (Code::Numpad0, 0x60),
    (Code::Numpad1, 0x61),
    (Code::Numpad2, 0x62),
    (Code::Numpad3, 0x63),
    (Code::Numpad4, 0x64),
    (Code::Numpad5, 0x65),
    (Code::Numpad6, 0x66),
    (Code::Numpad7, 0x67),
    (Code::Numpad8, 0x68),
    (Code::Numpad9, 0x69),
    (Code::NumpadMultiply, 0x6A),
    (Code::NumpadAdd, 0x6B),
    (Code::NumpadSubtract, 0x6D),
    (Code::NumpadDecimal, 0x6E),
    (Code::NumpadDivide, 0x6F),
    (Code::F1, 0x70),
    (Code::F2, 0x71),
    (Code::F3, 0x72),
    (Code::F4, 0x73),
    (Code::F5, 0x74),
    (Code::F6, 0x75),
    (Code::F7, 0x76),
    (Code::F8, 0x77),
    (Code::F9, 0x78),
    (Code::F10, 0x79),
    (Code::F11, 0x7A),
    (Code::F12, 0x7B),
    (Code::F13, 0x7C),
    (Code::F14, 0x7D),
    (Code::F15, 0x7E),
    (Code::F16, 0x7F),
    (Code::F17, 0x80),
    (Code::F18, 0x81),
    (Code::F19, 0x82),
    (Code::F20, 0x83),
    (Code::F21, 0x84),
    (Code::F22, 0x85),
    (Code::F23, 0x86),
    (Code::F24, 0x87),
    (Code::NumLock, 0x90),
    (Code::ScrollLock, 0x91),
    (Code::ShiftLeft, 0xA0),
    (Code::ShiftRight, 0xA1),
    (Code::ControlLeft, 0xA2),
    (Code::ControlRight, 0xA3),
    (Code::AltLeft, 0xA4),
    (Code::AltRight, 0xA5),
    (Code::AudioVolumeMute, 0xAD),
    (Code::AudioVolumeDown, 0xAE),
    (Code::AudioVolumeUp, 0xAF),
    (Code::MediaTrackNext, 0xB0),
    (Code::MediaTrackPrevious, 0xB1),
    (Code::MediaStop, 0xB2),
    (Code::MediaPlayPause, 0xB3),
    (Code::Semicolon, 0xBA),
    (Code::Equal, 0xBB),
    (Code::Comma, 0xBC),
    (Code::Minus, 0xBD),
    (Code::Period, 0xBE),
    (Code::Slash, 0xBF),
    (Code::Backquote, 0xC0),
    (Code::BracketLeft, 0xDB),
    (Code::Backslash, 0xDC),
    (Code::BracketRight, 0xDD),
    (Code::Quote, 0xDE),
];

/// Virtual-key code for `code`, if Windows has one.
pub fn vk_from_code(code: Code) -> Option<u32> {
    VIRTUAL_KEYS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, vk)| *vk)
}

/// Key code for a `WM_KEYDOWN` virtual key. Unknown keys map to
/// `Code::Unidentified`.
pub fn code_from_vk(vk: u32) -> Code {
    match vk {
        0x10 => Code::ShiftLeft,
        0x11 => Code::ControlLeft,
        0x12 => Code::AltLeft,
        _ => VIRTUAL_KEYS
            .iter()
            .find(|(_, v)| *v == vk)
            .map_or(Code::Unidentified, |(c, _)| *c),
    }
}

/// `MOD_*` flags for `RegisterHotKey`. `META` and `SUPER` both mean the
/// Windows key.
pub fn modifier_flags(modifiers: Modifiers) -> u32 {
    let mut flags = 0;
    if modifiers.contains(Modifiers::ALT) {
        flags |= MOD_ALT;
    }
    if modifiers.contains(Modifiers::CONTROL) {
        flags |= MOD_CONTROL;
    }
    if modifiers.contains(Modifiers::SHIFT) {
        flags |= MOD_SHIFT;
    }
    if modifiers.intersects(Modifiers::META | Modifiers::SUPER) {
        flags |= MOD_WIN;
    }
    flags
}
