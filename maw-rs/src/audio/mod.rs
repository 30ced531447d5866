//! Audio module for per-application session control.
//!
//! This module provides device and session enumeration, exclusion, session
//! matching, mute/volume changes, and the façade that ties them together.

pub mod backend;
pub mod control;
pub mod device;
pub mod enumerator;
pub mod matcher;
pub mod memory;
pub mod policy;
pub mod volume;
#[cfg(windows)]
pub mod wasapi;

pub use backend::{AudioBackend, AudioEndpoint, SessionVolume};
pub use control::AudioControl;
pub use device::{AudioError, DeviceSummary, MatchCriterion, UNKNOWN_NAME};
pub use matcher::SessionMatcher;
pub use memory::{MemoryBackend, MemoryDevice, MemorySession};
pub use policy::ExclusionPolicy;
#[cfg(windows)]
pub use wasapi::{ComGuard, WasapiBackend};

/// Audio backend for the current platform.
#[cfg(windows)]
pub type SystemBackend = WasapiBackend;

/// Audio backend for the current platform.
#[cfg(not(windows))]
pub type SystemBackend = MemoryBackend;

/// The live audio subsystem. Off Windows there is none, and every
/// operation reports nothing to do.
#[cfg(windows)]
pub fn system_backend() -> SystemBackend {
    WasapiBackend::new()
}

/// The live audio subsystem. Off Windows there is none, and every
/// operation reports nothing to do.
#[cfg(not(windows))]
pub fn system_backend() -> SystemBackend {
    MemoryBackend::unavailable()
}
