//! Platform-specific module for process and window queries.
//!
//! The Win32 inspector is only built on Windows; elsewhere the system
//! inspector is an empty [`ProcessTable`] that resolves nothing.

pub mod process;
#[cfg(windows)]
pub mod win32;

pub use process::{
    file_name, ProcessIdentity, ProcessInspector, ProcessTable, PACKAGED_APP_HOST, UNKNOWN_NAME,
};
#[cfg(windows)]
pub use win32::Win32Processes;

/// Process inspector for the current platform.
#[cfg(windows)]
pub type SystemInspector = Win32Processes;

/// Process inspector for the current platform.
#[cfg(not(windows))]
pub type SystemInspector = ProcessTable;

pub fn system_inspector() -> SystemInspector {
    SystemInspector::default()
}

/// Pid owning the window that currently has keyboard focus.
#[cfg(windows)]
pub fn foreground_pid() -> Option<u32> {
    win32::foreground_pid()
}

/// Pid owning the window that currently has keyboard focus.
#[cfg(not(windows))]
pub fn foreground_pid() -> Option<u32> {
    None
}
