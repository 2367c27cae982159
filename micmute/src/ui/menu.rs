//! Settings window menu bar.
//!
//! Menu items carry a 16-bit command ID in `WM_COMMAND`. List entries
//! (devices, sounds) are encoded as a base plus their index.

const CMD_START_WITH_WINDOWS: u16 = 10;
const CMD_START_MINIMIZED: u16 = 11;
const CMD_CLOSE_TO_TRAY: u16 = 12;
const CMD_CLEAR_HOTKEY: u16 = 13;
const CMD_SET_HOTKEY: u16 = 14;
const CMD_TOGGLE_MUTE: u16 = 15;
const CMD_EXIT: u16 = 16;

const CMD_DEVICE_BASE: u16 = 1000;
const CMD_MUTE_SOUND_BASE: u16 = 2000;
const CMD_UNMUTE_SOUND_BASE: u16 = 3000;
const LIST_CAPACITY: u16 = 1000;

/// A menu command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SelectDevice(usize),
    MuteSound(usize),
    UnmuteSound(usize),
    StartWithWindows,
    StartMinimized,
    CloseToTray,
    SetHotkey,
    ClearHotkey,
    ToggleMute,
    Exit,
}

impl Command {
    pub fn id(self) -> u16 {
        let last = LIST_CAPACITY as usize - 1;
        let indexed = |base: u16, index: usize| base + index.min(last) as u16;
        match self {
            Command::SelectDevice(i) => indexed(CMD_DEVICE_BASE, i),
            Command::MuteSound(i) => indexed(CMD_MUTE_SOUND_BASE, i),
            Command::UnmuteSound(i) => indexed(CMD_UNMUTE_SOUND_BASE, i),
            Command::StartWithWindows => CMD_START_WITH_WINDOWS,
            Command::StartMinimized => CMD_START_MINIMIZED,
            Command::CloseToTray => CMD_CLOSE_TO_TRAY,
            Command::SetHotkey => CMD_SET_HOTKEY,
            Command::ClearHotkey => CMD_CLEAR_HOTKEY,
            Command::ToggleMute => CMD_TOGGLE_MUTE,
            Command::Exit => CMD_EXIT,
        }
    }

    pub fn from_id(id: u16) -> Option<Self> {
        let list = |base: u16| usize::from(id - base);
        Some(match id {
            CMD_START_WITH_WINDOWS => Command::StartWithWindows,
            CMD_START_MINIMIZED => Command::StartMinimized,
            CMD_CLOSE_TO_TRAY => Command::CloseToTray,
            CMD_SET_HOTKEY => Command::SetHotkey,
            CMD_CLEAR_HOTKEY => Command::ClearHotkey,
            CMD_TOGGLE_MUTE => Command::ToggleMute,
            CMD_EXIT => Command::Exit,
            _ if (CMD_DEVICE_BASE..CMD_MUTE_SOUND_BASE).contains(&id) => {
                Command::SelectDevice(list(CMD_DEVICE_BASE))
            }
            _ if (CMD_MUTE_SOUND_BASE..CMD_UNMUTE_SOUND_BASE).contains(&id) => {
                Command::MuteSound(list(CMD_MUTE_SOUND_BASE))
            }
            _ if (CMD_UNMUTE_SOUND_BASE..CMD_UNMUTE_SOUND_BASE + LIST_CAPACITY).contains(&id) => {
                Command::UnmuteSound(list(CMD_UNMUTE_SOUND_BASE))
            }
            _ => return None,
        })
    }
}

/// Everything the menu bar displays.
#[derive(Debug, Clone, Default)]
pub struct MenuModel {
    pub devices: Vec<String>,
    pub selected_device: Option<usize>,
    pub sounds: Vec<String>,
    pub mute_sound: usize,
    pub unmute_sound: usize,
    pub start_with_windows: bool,
    pub start_minimized: bool,
    pub close_to_tray: bool,
    pub hotkey_set: bool,
}

#[cfg(windows)]
pub use win32::build_menu_bar;

#[cfg(windows)]
mod win32 {
    use super::{Command, MenuModel};
    use windows::core::{Result, HSTRING};
    use windows::Win32::UI::WindowsAndMessaging::{
        AppendMenuW, CreateMenu, CreatePopupMenu, HMENU, MENU_ITEM_FLAGS, MF_CHECKED, MF_GRAYED,
        MF_POPUP, MF_SEPARATOR, MF_STRING,
    };

    fn item(menu: HMENU, command: Command, label: &str, checked: bool) -> Result<()> {
        let flags = if checked { MF_STRING | MF_CHECKED } else { MF_STRING };
        append(menu, flags, usize::from(command.id()), label)
    }

    fn append(menu: HMENU, flags: MENU_ITEM_FLAGS, id: usize, label: &str) -> Result<()> {
        unsafe { AppendMenuW(menu, flags, id, &HSTRING::from(label)) }
    }

    fn popup(bar: HMENU, label: &str) -> Result<HMENU> {
        let menu = unsafe { CreatePopupMenu()? };
        append(bar, MF_POPUP, menu.0 as usize, label)?;
        Ok(menu)
    }

    fn sound_list(
        bar: HMENU,
        label: &str,
        sounds: &[String],
        selected: usize,
        command: fn(usize) -> Command,
    ) -> Result<()> {
        let menu = popup(bar, label)?;
        for (i, name) in sounds.iter().enumerate() {
            item(menu, command(i), name, i == selected)?;
        }
        Ok(())
    }

    /// Build a fresh menu bar. The caller attaches it with `SetMenu`, which
    /// destroys it together with the window.
    pub fn build_menu_bar(model: &MenuModel) -> Result<HMENU> {
        let bar = unsafe { CreateMenu()? };

        let devices = popup(bar, "&Microphone")?;
        if model.devices.is_empty() {
            append(devices, MF_STRING | MF_GRAYED, 0, "No capture devices")?;
        }
        for (i, name) in model.devices.iter().enumerate() {
            item(devices, Command::SelectDevice(i), name, model.selected_device == Some(i))?;
        }
        unsafe { AppendMenuW(devices, MF_SEPARATOR, 0, None)? };
        item(devices, Command::ToggleMute, "&Toggle Mute", false)?;

        sound_list(bar, "Mute &sound", &model.sounds, model.mute_sound, Command::MuteSound)?;
        sound_list(bar, "&Unmute sound", &model.sounds, model.unmute_sound, Command::UnmuteSound)?;

        let options = popup(bar, "&Options")?;
        item(options, Command::StartWithWindows, "Start with &Windows", model.start_with_windows)?;
        item(options, Command::StartMinimized, "Start &minimized", model.start_minimized)?;
        item(options, Command::CloseToTray, "&Close to tray", model.close_to_tray)?;
        unsafe { AppendMenuW(options, MF_SEPARATOR, 0, None)? };
        item(options, Command::SetHotkey, "Set &hotkey...", false)?;
        let clear_flags = if model.hotkey_set { MF_STRING } else { MF_STRING | MF_GRAYED };
        append(options, clear_flags, usize::from(Command::ClearHotkey.id()), "Clear hotke&y")?;

        item(bar, Command::Exit, "E&xit", false)?;

        Ok(bar)
    }
}
