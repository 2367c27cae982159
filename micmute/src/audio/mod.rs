//! Audio module for the capture device the hotkey mutes.
//!
//! The controller is platform-agnostic; the WASAPI backend that talks to the
//! Windows Core Audio API lives in `enumerator` and `volume`.

pub mod controller;
pub mod device;
#[cfg(windows)]
pub mod enumerator;
#[cfg(windows)]
pub mod volume;

pub use controller::AudioController;
pub use device::{AudioBackend, AudioDevice, AudioError, CaptureEndpoint};
#[cfg(windows)]
pub use enumerator::{ComGuard, DeviceEnumerator, WasapiEndpoint};
