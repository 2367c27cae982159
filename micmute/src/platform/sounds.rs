//! Mute and unmute feedback sounds.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A named sound file. `path == None` is the silent "None" entry.
#[derive(Debug, Clone)]
pub struct SoundInfo {
    pub name: String,
    pub path: Option<PathBuf>,
}

impl SoundInfo {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: Some(path.into()),
        }
    }

    pub fn none() -> Self {
        Self {
            name: "None".to_string(),
            path: None,
        }
    }
}

// The same file listed under two event names is one sound.
impl PartialEq for SoundInfo {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for SoundInfo {}

/// The "None" entry followed by `sounds` sorted by name.
pub fn catalogue(sounds: impl IntoIterator<Item = SoundInfo>) -> Vec<SoundInfo> {
    let mut named: Vec<SoundInfo> = sounds.into_iter().filter(|s| s.path.is_some()).collect();
    named.sort_by_key(|s| s.name.to_lowercase());

    let mut seen = HashSet::new();
    named.retain(|s| seen.insert(s.path.clone()));

    let mut list = Vec::with_capacity(named.len() + 1);
    list.push(SoundInfo::none());
    list.extend(named);
    list
}

/// Index of the entry for `path` in a catalogue, defaulting to "None".
pub fn position_of(catalogue: &[SoundInfo], path: Option<&Path>) -> usize {
    catalogue
        .iter()
        .position(|s| s.path.as_deref() == path)
        .unwrap_or(0)
}

/// Plays sound files without blocking the caller.
pub trait SoundPlayer {
    fn play(&self, path: &Path);
}

#[cfg(windows)]
pub use win32::{system_sounds, SystemSoundPlayer};

#[cfg(windows)]
mod win32 {
    use super::{SoundInfo, SoundPlayer};
    use std::path::Path;
    use tracing::{debug, warn};
    use windows::core::{HSTRING, PCWSTR, PWSTR};
    use windows::Win32::Foundation::{ERROR_NO_MORE_ITEMS, HMODULE};
    use windows::Win32::Media::Audio::{PlaySoundW, SND_ASYNC, SND_FILENAME, SND_NODEFAULT};
    use windows::Win32::System::Registry::{
        RegCloseKey, RegEnumKeyExW, RegGetValueW, RegOpenKeyExW, HKEY, HKEY_CURRENT_USER,
        KEY_READ, RRF_RT_REG_SZ,
    };

    const SCHEME_KEY: &str = r"AppEvents\Schemes\Apps\.Default";

    /// `PlaySound` in async mode; a new sound cuts off the previous one.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemSoundPlayer;

    impl SoundPlayer for SystemSoundPlayer {
        fn play(&self, path: &Path) {
            let wide = HSTRING::from(path.as_os_str());
            let flags = SND_FILENAME | SND_ASYNC | SND_NODEFAULT;
            let played = unsafe { PlaySoundW(&wide, HMODULE::default(), flags) };
            if !played.as_bool() {
                debug!(path = ?path, "PlaySound failed");
            }
        }
    }

    /// Sounds of the current user's scheme, one per event with a file set.
    pub fn system_sounds() -> Vec<SoundInfo> {
        let scheme = HSTRING::from(SCHEME_KEY);
        let mut key = HKEY::default();
        let opened = unsafe { RegOpenKeyExW(HKEY_CURRENT_USER, &scheme, 0, KEY_READ, &mut key) };
        if opened.is_err() {
            warn!("Sound scheme key not readable");
            return Vec::new();
        }

        let mut sounds = Vec::new();
        for index in 0.. {
            let mut name = [0u16; 256];
            let mut len = name.len() as u32;
            let result = unsafe {
                RegEnumKeyExW(
                    key,
                    index,
                    PWSTR(name.as_mut_ptr()),
                    &mut len,
                    None,
                    PWSTR::null(),
                    None,
                    None,
                )
            };
            if result == ERROR_NO_MORE_ITEMS {
                break;
            }
            if result.is_err() {
                continue;
            }

            let event = String::from_utf16_lossy(&name[..len as usize]);
            if let Some(file) = current_file(key, &event) {
                sounds.push(SoundInfo::new(event, file));
            }
        }

        unsafe {
            let _ = RegCloseKey(key);
        }
        sounds
    }

    /// Default value of `<event>\.Current`, environment variables expanded.
    fn current_file(scheme: HKEY, event: &str) -> Option<String> {
        let subkey = HSTRING::from(format!(r"{event}\.Current"));
        let mut buffer = [0u16; 520];
        let mut size = (buffer.len() * 2) as u32;

        unsafe {
            RegGetValueW(
                scheme,
                &subkey,
                PCWSTR::null(),
                RRF_RT_REG_SZ,
                None,
                Some(buffer.as_mut_ptr().cast()),
                Some(&mut size),
            )
        }
        .ok()
        .ok()?;

        let chars = (size as usize / 2).saturating_sub(1);
        let file = String::from_utf16_lossy(&buffer[..chars]);
        (!file.is_empty()).then_some(file)
    }
}
