//! Mute Active Window - Library
//!
//! Mutes or steps the volume of the application that owns keyboard focus,
//! by walking every active render device and acting on the audio sessions
//! that belong to it.
//!
//! ## Features
//!
//! - Target sessions by exact process id or by executable name
//! - Exclude render devices and processes from every operation
//! - Recover the real app behind the packaged-app frame host
//! - Fall back from pid to executable name when a pid has no session
//! - Average volume readings for an on-screen indicator

pub mod app;
pub mod audio;
pub mod config;
pub mod logging;
pub mod platform;

pub use app::{ActionOutcome, HotkeyAction, MatchTier, MuteController, NoIndicator, VolumeIndicator};
pub use audio::{
    AudioBackend, AudioControl, AudioEndpoint, AudioError, DeviceSummary, MatchCriterion,
    SessionVolume, SystemBackend,
};
pub use config::{ConfigError, ConfigProvider, Settings, SharedSettings, Targeting};
pub use platform::{ProcessIdentity, ProcessInspector, SystemInspector};

/// Audio control over the live system, reading `config` on every call.
pub fn system_control<C: ConfigProvider>(
    config: C,
) -> AudioControl<SystemBackend, SystemInspector, C> {
    AudioControl::new(
        audio::system_backend(),
        platform::system_inspector(),
        config,
    )
}
