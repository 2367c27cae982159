//! Capture device access using the Windows MMDevice API.
//!
//! Provides COM initialization and the WASAPI implementation of
//! [`AudioBackend`].

use super::device::{AudioBackend, AudioDevice, AudioError, CaptureEndpoint};
use super::volume::VolumeController;
use windows::core::PCWSTR;
use windows::Win32::Devices::Properties::DEVPKEY_Device_FriendlyName;
use windows::Win32::Media::Audio::{
    eCapture, eCommunications, IMMDevice, IMMDeviceEnumerator, MMDeviceEnumerator,
    DEVICE_STATE_ACTIVE,
};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoUninitialize, CLSCTX_ALL, COINIT_APARTMENTTHREADED, STGM,
};
use windows::Win32::UI::Shell::PropertiesSystem::{IPropertyStore, PROPERTYKEY};

/// COM initialization guard that uninitializes COM on drop.
pub struct ComGuard {
    initialized: bool,
}

impl ComGuard {
    /// Initialize COM for the current thread.
    pub fn new() -> Result<Self, AudioError> {
        unsafe {
            // Use apartment-threaded for UI compatibility
            CoInitializeEx(None, COINIT_APARTMENTTHREADED)
                .ok()
                .map_err(AudioError::ComInitFailed)?;
        }
        Ok(Self { initialized: true })
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        if self.initialized {
            unsafe {
                CoUninitialize();
            }
        }
    }
}

/// WASAPI backend over an IMMDeviceEnumerator.
pub struct DeviceEnumerator {
    enumerator: IMMDeviceEnumerator,
}

impl DeviceEnumerator {
    /// Create a new DeviceEnumerator.
    ///
    /// Note: COM must be initialized on this thread before calling this.
    pub fn new() -> Result<Self, AudioError> {
        unsafe {
            let enumerator: IMMDeviceEnumerator =
                CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)
                    .map_err(AudioError::EnumerationFailed)?;

            Ok(Self { enumerator })
        }
    }

    fn describe(&self, device: &IMMDevice) -> Result<AudioDevice, AudioError> {
        unsafe {
            let id = device.GetId().map_err(AudioError::EnumerationFailed)?;
            let id_string = id
                .to_string()
                .map_err(|e| AudioError::StringConversion(e.to_string()))?;

            let props: IPropertyStore = device
                .OpenPropertyStore(STGM(0))
                .map_err(AudioError::EnumerationFailed)?;

            let name = friendly_name(&props).unwrap_or_else(|| "Unknown".to_string());

            Ok(AudioDevice::new(id_string, name))
        }
    }
}

impl AudioBackend for DeviceEnumerator {
    type Endpoint = WasapiEndpoint;

    fn capture_devices(&self) -> Result<Vec<AudioDevice>, AudioError> {
        unsafe {
            let collection = self
                .enumerator
                .EnumAudioEndpoints(eCapture, DEVICE_STATE_ACTIVE)
                .map_err(AudioError::EnumerationFailed)?;

            let count = collection
                .GetCount()
                .map_err(AudioError::EnumerationFailed)?;

            let mut devices = Vec::with_capacity(count as usize);

            for i in 0..count {
                let device = collection.Item(i).map_err(AudioError::EnumerationFailed)?;

                if let Ok(mic) = self.describe(&device) {
                    devices.push(mic);
                }
            }

            Ok(devices)
        }
    }

    fn default_capture_device(&self) -> Result<Option<AudioDevice>, AudioError> {
        unsafe {
            let device = match self
                .enumerator
                .GetDefaultAudioEndpoint(eCapture, eCommunications)
            {
                Ok(d) => d,
                Err(_) => return Ok(None),
            };

            self.describe(&device).map(Some)
        }
    }

    fn open(&self, device_id: &str) -> Result<WasapiEndpoint, AudioError> {
        unsafe {
            let device_id_wide: Vec<u16> =
                device_id.encode_utf16().chain(std::iter::once(0)).collect();

            let device = self
                .enumerator
                .GetDevice(PCWSTR::from_raw(device_id_wide.as_ptr()))
                .map_err(|_| AudioError::DeviceNotFound {
                    device_id: device_id.to_string(),
                })?;

            let info = self.describe(&device)?;
            let volume = VolumeController::new(&device)?;

            Ok(WasapiEndpoint {
                info,
                volume,
                _device: device,
            })
        }
    }
}

/// An opened capture endpoint with its volume interface activated.
pub struct WasapiEndpoint {
    info: AudioDevice,
    volume: VolumeController,
    _device: IMMDevice,
}

impl CaptureEndpoint for WasapiEndpoint {
    fn id(&self) -> &str {
        &self.info.id
    }

    fn name(&self) -> &str {
        &self.info.name
    }

    fn is_muted(&self) -> Result<bool, AudioError> {
        self.volume.get_mute()
    }

    fn set_muted(&self, muted: bool) -> Result<(), AudioError> {
        self.volume.set_mute(muted)
    }
}

/// Get the friendly name of a device from its property store.
fn friendly_name(props: &IPropertyStore) -> Option<String> {
    unsafe {
        // Convert DEVPROPKEY to PROPERTYKEY
        let key = PROPERTYKEY {
            fmtid: DEVPKEY_Device_FriendlyName.fmtid,
            pid: DEVPKEY_Device_FriendlyName.pid,
        };

        let prop = props.GetValue(&key).ok()?;

        let s = prop.to_string();
        if s.is_empty() {
            None
        } else {
            Some(s)
        }
    }
}
