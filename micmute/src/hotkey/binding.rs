//! Hotkey binding value type.
//!
//! A binding is a `global-hotkey` modifier set plus one physical key code.
//! `Code::Unidentified` stands for "no hotkey".

use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use std::fmt;
use std::str::FromStr;

/// Modifier set plus primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HotkeyBinding {
    pub modifiers: Modifiers,
    pub key: Code,
}

impl HotkeyBinding {
    /// The unregistered binding.
    pub const NONE: HotkeyBinding = HotkeyBinding {
        modifiers: Modifiers::empty(),
        key: Code::Unidentified,
    };

    pub const fn new(modifiers: Modifiers, key: Code) -> Self {
        Self { modifiers, key }
    }

    /// True when the binding names a key and can be registered.
    pub fn is_set(&self) -> bool {
        self.key != Code::Unidentified
    }

    /// The binding captured from a key press, or `None` while only modifier
    /// keys are down.
    pub fn from_key_press(key: Code, modifiers: Modifiers) -> Option<Self> {
        (key != Code::Unidentified && !is_modifier_key(key)).then_some(Self::new(modifiers, key))
    }

    /// The binding as a `global-hotkey` value, for display and persistence.
    pub fn to_hotkey(self) -> Option<HotKey> {
        self.is_set()
            .then(|| HotKey::new(Some(self.modifiers), self.key))
    }
}

impl Default for HotkeyBinding {
    fn default() -> Self {
        Self::NONE
    }
}

impl From<HotKey> for HotkeyBinding {
    fn from(hotkey: HotKey) -> Self {
        Self::new(hotkey.mods, hotkey.key)
    }
}

impl fmt::Display for HotkeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_hotkey() {
            Some(hotkey) => f.write_str(&hotkey.into_string()),
            None => f.write_str("None"),
        }
    }
}

impl FromStr for HotkeyBinding {
    type Err = <HotKey as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return Ok(Self::NONE);
        }
        trimmed.parse::<HotKey>().map(Self::from)
    }
}

/// Shift, Ctrl, Alt and Win on either side. These cannot be the primary key
/// of a binding.
pub fn is_modifier_key(key: Code) -> bool {
    matches!(
        key,
        Code::ShiftLeft
            | Code::ShiftRight
            | Code::ControlLeft
            | Code::ControlRight
            | Code::AltLeft
            | Code::AltRight
            | Code::MetaLeft
            | Code::MetaRight
    )
}
