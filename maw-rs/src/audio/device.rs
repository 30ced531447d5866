//! Audio data models.
//!
//! Defines the targeting criterion, the transient device summary used by
//! pickers, and the audio error type shared by every backend.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Name used whenever a device or process cannot be resolved.
pub const UNKNOWN_NAME: &str = "(unknown)";

/// Selects which sessions an operation affects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchCriterion {
    /// Exact owning process id.
    ByProcessId(u32),

    /// Case-insensitive executable file name, e.g. `game.exe`.
    ByExecutableName(String),
}

impl MatchCriterion {
    /// Build a name criterion from anything string-like.
    pub fn by_name(name: impl Into<String>) -> Self {
        MatchCriterion::ByExecutableName(name.into())
    }
}

impl fmt::Display for MatchCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchCriterion::ByProcessId(pid) => write!(f, "pid={}", pid),
            MatchCriterion::ByExecutableName(name) => write!(f, "exe={}", name),
        }
    }
}

/// An active render device as seen by one enumeration pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
    /// Friendly name, or `(unknown)` when the property store had none
    pub name: String,

    /// Whether the exclusion list currently hides this device
    pub is_excluded: bool,
}

/// Audio service error types.
///
/// None of these reach façade callers; they are logged at the level where
/// they occur and the affected device or session is skipped.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Audio subsystem is not available")]
    SubsystemUnavailable,

    #[cfg(windows)]
    #[error("COM initialization failed: {0}")]
    ComInitFailed(#[source] windows::core::Error),

    #[cfg(windows)]
    #[error("Failed to enumerate devices: {0}")]
    EnumerationFailed(#[source] windows::core::Error),

    #[cfg(windows)]
    #[error("Session manager not available for device: {0}")]
    SessionManagerUnavailable(#[source] windows::core::Error),

    #[cfg(windows)]
    #[error("Volume control not available for session: {0}")]
    VolumeNotAvailable(#[source] windows::core::Error),

    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsError(#[source] windows::core::Error),

    #[error("Sessions could not be listed on device {device}")]
    SessionsUnavailable { device: String },

    #[error("Session call failed: {0}")]
    SessionCallFailed(String),
}
