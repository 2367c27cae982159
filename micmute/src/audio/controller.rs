//! The audio endpoint controller.
//!
//! Owns the connection to the audio subsystem and the one capture device
//! the hotkey acts on. Every failure is swallowed here and surfaced as an
//! empty result, `false`, or a no-op so callers never see an OS fault.

use super::device::{AudioBackend, AudioDevice, AudioError, CaptureEndpoint};
use tracing::{debug, info, warn};

/// Controller over a single selected capture device.
pub struct AudioController<B: AudioBackend> {
    backend: Option<B>,
    selected: Option<B::Endpoint>,
}

impl<B: AudioBackend> AudioController<B> {
    /// Create an uninitialized controller. All queries return empty results
    /// until [`initialize`](Self::initialize) succeeds.
    pub fn new() -> Self {
        Self {
            backend: None,
            selected: None,
        }
    }

    /// Connect to the audio subsystem. Returns false on any failure.
    pub fn initialize<F>(&mut self, connect: F) -> bool
    where
        F: FnOnce() -> Result<B, AudioError>,
    {
        match connect() {
            Ok(backend) => {
                self.backend = Some(backend);
                info!("Audio subsystem initialized");
                true
            }
            Err(e) => {
                warn!(error = %e, "Audio subsystem unavailable");
                self.backend = None;
                false
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.backend.is_some()
    }

    /// Snapshot of the active capture devices.
    pub fn list_capture_devices(&self) -> Vec<AudioDevice> {
        let Some(backend) = &self.backend else {
            return Vec::new();
        };

        backend.capture_devices().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to enumerate capture devices");
            Vec::new()
        })
    }

    /// The system default communications capture device.
    pub fn default_device(&self) -> Option<AudioDevice> {
        let backend = self.backend.as_ref()?;

        backend.default_capture_device().unwrap_or_else(|e| {
            debug!(error = %e, "No default capture device");
            None
        })
    }

    /// Make `device` the one the controller acts on, replacing the previous
    /// selection. If the device cannot be opened the selection is cleared.
    pub fn select(&mut self, device: &AudioDevice) {
        let Some(backend) = &self.backend else {
            debug!(device_id = %device.id, "Ignoring selection before initialization");
            return;
        };

        self.selected = match backend.open(&device.id) {
            Ok(endpoint) => {
                info!(device = %device.name, "Selected capture device");
                Some(endpoint)
            }
            Err(e) => {
                warn!(device = %device.name, error = %e, "Failed to open capture device");
                None
            }
        };
    }

    pub fn selected_device(&self) -> Option<AudioDevice> {
        self.selected.as_ref().map(CaptureEndpoint::describe)
    }

    /// Live mute flag of the selected device; false when nothing is selected
    /// or the device cannot be read.
    pub fn is_muted(&self) -> bool {
        self.selected
            .as_ref()
            .and_then(|endpoint| endpoint.is_muted().ok())
            .unwrap_or(false)
    }

    /// Flip the selected device's mute flag.
    ///
    /// Reads the device's current state and writes its negation; there is no
    /// local copy. Two unsynchronized togglers can land on the same state.
    /// Returns the new state, or `None` when nothing changed.
    pub fn toggle_mute(&mut self) -> Option<bool> {
        let endpoint = self.selected.as_ref()?;

        let result = endpoint
            .is_muted()
            .and_then(|current| endpoint.set_muted(!current).map(|()| !current));

        match result {
            Ok(muted) => {
                info!(muted, device = endpoint.name(), "Toggled microphone mute");
                Some(muted)
            }
            Err(e) => {
                warn!(error = %e, "Failed to toggle mute");
                None
            }
        }
    }
}

impl<B: AudioBackend> Default for AudioController<B> {
    fn default() -> Self {
        Self::new()
    }
}
