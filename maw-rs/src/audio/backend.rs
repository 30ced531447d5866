//! Capability traits over the OS audio session API.
//!
//! Every handle handed out by these traits is scoped to a single
//! enumeration pass: backends produce fresh devices and sessions on each
//! call and release them when the caller drops them.

use super::device::AudioError;

/// Source of active render (playback) devices.
pub trait AudioBackend {
    type Device: AudioEndpoint;

    /// List the devices currently in the active render state.
    ///
    /// Fails only when the audio subsystem itself is unavailable.
    fn active_render_devices(&self) -> Result<Vec<Self::Device>, AudioError>;
}

/// One render device and the sessions currently attached to it.
pub trait AudioEndpoint {
    type Session: SessionVolume;

    /// Friendly display name, `None` when it cannot be read.
    fn friendly_name(&self) -> Option<String>;

    /// List this device's audio sessions.
    fn sessions(&self) -> Result<Vec<Self::Session>, AudioError>;
}

/// Per-session mute and volume control.
pub trait SessionVolume {
    /// Owning process id, `None` when the session is not attributable to a
    /// live process (system sounds, cross-process sessions).
    fn owner_pid(&self) -> Option<u32>;

    /// Get the current mute state.
    fn mute(&self) -> Result<bool, AudioError>;

    /// Set the mute state.
    fn set_mute(&self, muted: bool) -> Result<(), AudioError>;

    /// Get the current volume level (0.0 to 1.0).
    fn volume(&self) -> Result<f32, AudioError>;

    /// Set the volume level (0.0 to 1.0).
    fn set_volume(&self, level: f32) -> Result<(), AudioError>;
}

impl<B: AudioBackend + ?Sized> AudioBackend for &B {
    type Device = B::Device;

    fn active_render_devices(&self) -> Result<Vec<Self::Device>, AudioError> {
        (**self).active_render_devices()
    }
}
