//! Audio device data models.
//!
//! Defines the capture device snapshot handed to the shell, the error type
//! for the audio layer, and the capability traits the controller drives.

use thiserror::Error;

/// A capture device as seen by the shell.
///
/// Two devices are the same device when their OS identifiers match; display
/// names are not unique (two identical USB headsets share a name).
#[derive(Debug, Clone, Eq)]
pub struct AudioDevice {
    /// Stable Windows endpoint ID (opaque string from IMMDevice::GetId)
    pub id: String,

    /// Human-readable device name (from device properties)
    pub name: String,
}

impl AudioDevice {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl PartialEq for AudioDevice {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl std::hash::Hash for AudioDevice {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A live handle to one capture endpoint.
///
/// Every call goes to the OS; implementations never cache the mute flag.
pub trait CaptureEndpoint {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    /// Read the device's current mute flag.
    fn is_muted(&self) -> Result<bool, AudioError>;

    /// Write the device's mute flag.
    fn set_muted(&self, muted: bool) -> Result<(), AudioError>;

    fn describe(&self) -> AudioDevice {
        AudioDevice::new(self.id(), self.name())
    }
}

/// Entry point into the OS audio subsystem.
pub trait AudioBackend {
    type Endpoint: CaptureEndpoint;

    /// All active capture endpoints, in OS order.
    fn capture_devices(&self) -> Result<Vec<AudioDevice>, AudioError>;

    /// The default capture endpoint for communications, if the system has one.
    fn default_capture_device(&self) -> Result<Option<AudioDevice>, AudioError>;

    /// Open a live handle to the endpoint with the given ID.
    fn open(&self, device_id: &str) -> Result<Self::Endpoint, AudioError>;
}

/// Audio service error types.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Device not found: {device_id}")]
    DeviceNotFound { device_id: String },

    #[error("Audio subsystem not initialized")]
    NotInitialized,

    #[error("Volume control not available for device")]
    VolumeNotAvailable,

    #[cfg(windows)]
    #[error("COM initialization failed: {0}")]
    ComInitFailed(#[source] windows::core::Error),

    #[cfg(windows)]
    #[error("Failed to enumerate devices: {0}")]
    EnumerationFailed(#[source] windows::core::Error),

    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsError(#[source] windows::core::Error),

    #[error("String conversion error: {0}")]
    StringConversion(String),
}
