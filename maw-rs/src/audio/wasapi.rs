//! Core Audio backend using the Windows MMDevice and session APIs.
//!
//! Devices come from `IMMDeviceEnumerator`, sessions from each device's
//! `IAudioSessionManager2`, and per-session control from
//! `ISimpleAudioVolume`. COM interfaces release on drop, so every device
//! and session handle lives only as long as the enumeration pass that
//! produced it.

use super::backend::{AudioBackend, AudioEndpoint, SessionVolume};
use super::device::AudioError;
use tracing::{debug, warn};
use windows::Win32::Devices::Properties::DEVPKEY_Device_FriendlyName;
use windows::Win32::Foundation::RPC_E_CHANGED_MODE;
use windows::Win32::Media::Audio::{
    eRender, IAudioSessionControl2, IAudioSessionManager2, IMMDevice, IMMDeviceEnumerator,
    ISimpleAudioVolume, MMDeviceEnumerator, DEVICE_STATE_ACTIVE,
};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoUninitialize, CLSCTX_ALL, COINIT_APARTMENTTHREADED, STGM,
};
use windows::Win32::UI::Shell::PropertiesSystem::{IPropertyStore, PROPERTYKEY};
use windows_core::Interface;

/// COM initialization guard that uninitializes COM on drop.
pub struct ComGuard {
    initialized: bool,
}

impl ComGuard {
    /// Initialize COM for the current thread.
    ///
    /// A thread already initialized in another apartment mode is accepted
    /// as is; the guard then leaves it alone on drop.
    pub fn new() -> Result<Self, AudioError> {
        unsafe {
            // Use apartment-threaded for UI compatibility
            let hr = CoInitializeEx(None, COINIT_APARTMENTTHREADED);
            if hr == RPC_E_CHANGED_MODE {
                debug!("COM already initialized in another mode");
                return Ok(Self { initialized: false });
            }
            hr.ok().map_err(AudioError::ComInitFailed)?;
        }
        Ok(Self { initialized: true })
    }

    fn inactive() -> Self {
        Self { initialized: false }
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

/// Audio backend over the Windows MMDevice API.
///
/// Must be used from the thread that created it.
pub struct WasapiBackend {
    // Dropped before the COM guard.
    enumerator: Option<IMMDeviceEnumerator>,
    _com: ComGuard,
}

impl WasapiBackend {
    /// Initialize COM and create the device enumerator. When either step
    /// fails the backend still constructs and reports the subsystem as
    /// unavailable on every call.
    pub fn new() -> Self {
        let com = ComGuard::new().unwrap_or_else(|e| {
            warn!("{}", e);
            ComGuard::inactive()
        });

        let enumerator = unsafe {
            CoCreateInstance::<_, IMMDeviceEnumerator>(&MMDeviceEnumerator, None, CLSCTX_ALL)
        };
        let enumerator = match enumerator {
            Ok(enumerator) => Some(enumerator),
            Err(e) => {
                warn!("Audio enumerator unavailable: {}", AudioError::EnumerationFailed(e));
                None
            }
        };

        Self {
            enumerator,
            _com: com,
        }
    }
}

impl Default for WasapiBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for WasapiBackend {
    type Device = WasapiDevice;

    fn active_render_devices(&self) -> Result<Vec<WasapiDevice>, AudioError> {
        let enumerator = self
            .enumerator
            .as_ref()
            .ok_or(AudioError::SubsystemUnavailable)?;

        unsafe {
            let collection = enumerator
                .EnumAudioEndpoints(eRender, DEVICE_STATE_ACTIVE)
                .map_err(AudioError::EnumerationFailed)?;

            let count = collection
                .GetCount()
                .map_err(AudioError::EnumerationFailed)?;

            let mut devices = Vec::with_capacity(count as usize);
            for i in 0..count {
                match collection.Item(i) {
                    Ok(device) => devices.push(WasapiDevice { device }),
                    Err(e) => warn!("Failed to get device {}: {}", i, e),
                }
            }

            Ok(devices)
        }
    }
}

/// An active render endpoint.
pub struct WasapiDevice {
    device: IMMDevice,
}

impl WasapiDevice {
    fn property_store(&self) -> Option<IPropertyStore> {
        unsafe { self.device.OpenPropertyStore(STGM(0)).ok() } // STGM_READ = 0
    }
}

impl AudioEndpoint for WasapiDevice {
    type Session = WasapiSession;

    fn friendly_name(&self) -> Option<String> {
        let props = self.property_store()?;
        unsafe {
            // Convert DEVPROPKEY to PROPERTYKEY
            let key = PROPERTYKEY {
                fmtid: DEVPKEY_Device_FriendlyName.fmtid,
                pid: DEVPKEY_Device_FriendlyName.pid,
            };

            let prop = props.GetValue(&key).ok()?;
            let name = prop.to_string();
            if name.is_empty() {
                None
            } else {
                Some(name)
            }
        }
    }

    fn sessions(&self) -> Result<Vec<WasapiSession>, AudioError> {
        unsafe {
            let manager: IAudioSessionManager2 = self
                .device
                .Activate(CLSCTX_ALL, None)
                .map_err(AudioError::SessionManagerUnavailable)?;

            let session_enum = manager
                .GetSessionEnumerator()
                .map_err(AudioError::WindowsError)?;
            let count = session_enum.GetCount().map_err(AudioError::WindowsError)?;

            let mut sessions = Vec::with_capacity(count.max(0) as usize);
            for i in 0..count {
                let control = match session_enum.GetSession(i) {
                    Ok(control) => control,
                    Err(e) => {
                        debug!("Failed to get session {}: {}", i, e);
                        continue;
                    }
                };

                let control: IAudioSessionControl2 = match control.cast() {
                    Ok(control) => control,
                    Err(e) => {
                        debug!("Failed to get IAudioSessionControl2 for session {}: {}", i, e);
                        continue;
                    }
                };

                let pid = match control.GetProcessId() {
                    Ok(0) => None,
                    Ok(pid) => Some(pid),
                    Err(e) => {
                        debug!("Failed to get process ID for session {}: {}", i, e);
                        None
                    }
                };

                sessions.push(WasapiSession { control, pid });
            }

            Ok(sessions)
        }
    }
}

/// One audio session on a render endpoint.
pub struct WasapiSession {
    control: IAudioSessionControl2,
    pid: Option<u32>,
}

impl WasapiSession {
    fn simple_volume(&self) -> Result<ISimpleAudioVolume, AudioError> {
        self.control.cast().map_err(AudioError::VolumeNotAvailable)
    }
}

impl SessionVolume for WasapiSession {
    fn owner_pid(&self) -> Option<u32> {
        self.pid
    }

    fn mute(&self) -> Result<bool, AudioError> {
        let volume = self.simple_volume()?;
        unsafe {
            let muted = volume.GetMute().map_err(AudioError::WindowsError)?;
            Ok(muted.as_bool())
        }
    }

    fn set_mute(&self, muted: bool) -> Result<(), AudioError> {
        let volume = self.simple_volume()?;
        unsafe {
            volume
                .SetMute(muted, std::ptr::null())
                .map_err(AudioError::WindowsError)
        }
    }

    fn volume(&self) -> Result<f32, AudioError> {
        let volume = self.simple_volume()?;
        unsafe { volume.GetMasterVolume().map_err(AudioError::WindowsError) }
    }

    fn set_volume(&self, level: f32) -> Result<(), AudioError> {
        let volume = self.simple_volume()?;
        unsafe {
            volume
                .SetMasterVolume(level, std::ptr::null())
                .map_err(AudioError::WindowsError)
        }
    }
}
