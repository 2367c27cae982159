//! Win32 named auto-reset events.

use super::signal::{NamedEventProvider, SignalError, WaitableEvent};
use std::time::Duration;
use windows::core::HSTRING;
use windows::Win32::Foundation::{
    CloseHandle, GetLastError, ERROR_ALREADY_EXISTS, HANDLE, WAIT_OBJECT_0, WAIT_TIMEOUT,
};
use windows::Win32::System::Threading::{
    CreateEventW, OpenEventW, SetEvent, WaitForSingleObject, EVENT_MODIFY_STATE,
    SYNCHRONIZATION_SYNCHRONIZE,
};

/// Owned handle to a kernel event object.
pub struct Win32Event {
    handle: HANDLE,
}

// Event handles may be used from any thread.
unsafe impl Send for Win32Event {}
unsafe impl Sync for Win32Event {}

impl WaitableEvent for Win32Event {
    fn signal(&self) -> Result<(), SignalError> {
        unsafe { SetEvent(self.handle) }.map_err(|e| SignalError::SignalFailed(e.to_string()))
    }

    fn wait(&self, timeout: Duration) -> Result<bool, SignalError> {
        let millis = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX - 1);
        let result = unsafe { WaitForSingleObject(self.handle, millis) };

        if result == WAIT_OBJECT_0 {
            Ok(true)
        } else if result == WAIT_TIMEOUT {
            Ok(false)
        } else {
            Err(SignalError::WaitFailed(format!(
                "WaitForSingleObject returned {:#x}",
                result.0
            )))
        }
    }
}

impl Drop for Win32Event {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}

/// Named events in the session namespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32EventProvider;

impl NamedEventProvider for Win32EventProvider {
    type Event = Win32Event;

    fn create(&self, name: &str) -> Result<(Win32Event, bool), SignalError> {
        let wide = HSTRING::from(name);
        let handle = unsafe { CreateEventW(None, false, false, &wide) }.map_err(|e| {
            SignalError::CreateFailed {
                name: name.to_string(),
                reason: e.to_string(),
            }
        })?;

        // Must be read before any other API call overwrites the last error.
        let created_new = unsafe { GetLastError() } != ERROR_ALREADY_EXISTS;

        Ok((Win32Event { handle }, created_new))
    }

    fn open(&self, name: &str) -> Result<Win32Event, SignalError> {
        let wide = HSTRING::from(name);
        let access = SYNCHRONIZATION_SYNCHRONIZE | EVENT_MODIFY_STATE;

        unsafe { OpenEventW(access, false, &wide) }
            .map(|handle| Win32Event { handle })
            .map_err(|_| SignalError::NotFound {
                name: name.to_string(),
            })
    }
}
