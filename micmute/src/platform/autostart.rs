//! "Start with Windows" via the per-user Run key.

use std::path::Path;
use thiserror::Error;

/// Value name under the Run key.
pub const RUN_VALUE_NAME: &str = "MicMute";

/// Autostart error types.
#[derive(Debug, Error)]
pub enum AutostartError {
    #[error("Failed to open Run key: {0}")]
    RegistryAccess(String),

    #[error("Failed to write Run entry: {0}")]
    WriteFailed(String),

    #[error("Could not determine the executable path: {0}")]
    ExecutablePath(#[from] std::io::Error),
}

/// The command line stored in the Run key: the quoted executable path.
pub fn run_command(exe: &Path) -> String {
    format!("\"{}\"", exe.display())
}

/// Whether a Run entry launches `exe`. Matched on file name so a stale
/// entry from a moved install still counts.
pub fn entry_launches(entry: &str, exe: &Path) -> bool {
    exe.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| entry.to_lowercase().contains(&name.to_lowercase()))
}

#[cfg(windows)]
pub use registry::RunKey;

#[cfg(windows)]
mod registry {
    use super::{entry_launches, run_command, AutostartError, RUN_VALUE_NAME};
    use tracing::{debug, info};
    use windows::core::PCWSTR;
    use windows::Win32::System::Registry::{
        RegCloseKey, RegDeleteValueW, RegOpenKeyExW, RegQueryValueExW, RegSetValueExW, HKEY,
        HKEY_CURRENT_USER, KEY_READ, KEY_WRITE, REG_SAM_FLAGS, REG_SZ,
    };

    const RUN_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";

    fn to_wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    /// Open HKCU Run key, closed on drop.
    struct OpenKey(HKEY);

    impl OpenKey {
        fn open(access: REG_SAM_FLAGS) -> Result<Self, AutostartError> {
            let path = to_wide(RUN_KEY);
            let mut hkey = HKEY::default();
            unsafe {
                RegOpenKeyExW(
                    HKEY_CURRENT_USER,
                    PCWSTR::from_raw(path.as_ptr()),
                    0,
                    access,
                    &mut hkey,
                )
            }
            .ok()
            .map_err(|e| AutostartError::RegistryAccess(e.to_string()))?;
            Ok(Self(hkey))
        }
    }

    impl Drop for OpenKey {
        fn drop(&mut self) {
            unsafe {
                let _ = RegCloseKey(self.0);
            }
        }
    }

    /// The app's entry in the per-user Run key.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct RunKey;

    impl RunKey {
        /// True when the Run entry exists and points at this executable.
        pub fn is_enabled(&self) -> bool {
            let Ok(exe) = std::env::current_exe() else {
                return false;
            };
            self.read_entry()
                .is_some_and(|entry| entry_launches(&entry, &exe))
        }

        pub fn set_enabled(&self, enabled: bool) -> Result<(), AutostartError> {
            let key = OpenKey::open(KEY_WRITE)?;
            let name = to_wide(RUN_VALUE_NAME);

            if enabled {
                let command = run_command(&std::env::current_exe()?);
                let data = to_wide(&command);
                let bytes: Vec<u8> = data.iter().flat_map(|c| c.to_le_bytes()).collect();

                unsafe {
                    RegSetValueExW(key.0, PCWSTR::from_raw(name.as_ptr()), 0, REG_SZ, Some(&bytes))
                }
                .ok()
                .map_err(|e| AutostartError::WriteFailed(e.to_string()))?;
                info!(command, "Autostart enabled");
            } else {
                // A missing value already means disabled.
                let result = unsafe { RegDeleteValueW(key.0, PCWSTR::from_raw(name.as_ptr())) };
                debug!(?result, "Autostart entry removed");
                info!("Autostart disabled");
            }

            Ok(())
        }

        fn read_entry(&self) -> Option<String> {
            let key = OpenKey::open(KEY_READ).ok()?;
            let name = to_wide(RUN_VALUE_NAME);

            let mut size = 0u32;
            unsafe {
                RegQueryValueExW(
                    key.0,
                    PCWSTR::from_raw(name.as_ptr()),
                    None,
                    None,
                    None,
                    Some(&mut size),
                )
            }
            .ok()
            .ok()?;

            let mut buffer = vec![0u16; (size as usize).div_ceil(2)];
            unsafe {
                RegQueryValueExW(
                    key.0,
                    PCWSTR::from_raw(name.as_ptr()),
                    None,
                    None,
                    Some(buffer.as_mut_ptr().cast()),
                    Some(&mut size),
                )
            }
            .ok()
            .ok()?;

            let text = String::from_utf16_lossy(&buffer);
            Some(text.trim_end_matches('\0').to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn run_command_is_quoted() {
        let exe = PathBuf::from(r"C:\Program Files\MicMute\micmute.exe");

        assert_eq!(run_command(&exe), r#""C:\Program Files\MicMute\micmute.exe""#);
    }

    #[test]
    fn entry_matches_on_file_name() {
        let exe = PathBuf::from("/opt/MicMute/micmute.exe");

        assert!(entry_launches(r#""D:\Apps\MicMute.exe""#, &exe));
        assert!(entry_launches(r#""C:\Tools\micmute.exe" --show"#, &exe));
        assert!(!entry_launches(r#""C:\Tools\other.exe""#, &exe));
        assert!(!entry_launches("", &exe));
    }
}
