//! In-memory audio backend.
//!
//! Implements the same capability set as the WASAPI backend over plain
//! values, so hosts and tests can describe a device/session topology and
//! observe what the engine did to it. Session state is shared between the
//! handle kept by the caller and the copies handed out per enumeration.

use super::backend::{AudioBackend, AudioEndpoint, SessionVolume};
use super::device::AudioError;
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug)]
struct SessionState {
    muted: Cell<bool>,
    volume: Cell<f32>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
    writes: Cell<u32>,
}

/// A fake audio session. Clones share state.
#[derive(Debug, Clone)]
pub struct MemorySession {
    pid: Option<u32>,
    state: Rc<SessionState>,
}

impl MemorySession {
    /// A session owned by `pid`, unmuted at full volume.
    pub fn new(pid: u32) -> Self {
        Self::with_owner(Some(pid))
    }

    /// A session not attributable to any process.
    pub fn unowned() -> Self {
        Self::with_owner(None)
    }

    fn with_owner(pid: Option<u32>) -> Self {
        Self {
            pid,
            state: Rc::new(SessionState {
                muted: Cell::new(false),
                volume: Cell::new(1.0),
                fail_reads: Cell::new(false),
                fail_writes: Cell::new(false),
                writes: Cell::new(0),
            }),
        }
    }

    pub fn muted(self, muted: bool) -> Self {
        self.state.muted.set(muted);
        self
    }

    pub fn volume_level(self, level: f32) -> Self {
        self.state.volume.set(level);
        self
    }

    /// Make every read on this session fail.
    pub fn failing_reads(self) -> Self {
        self.state.fail_reads.set(true);
        self
    }

    /// Make every write on this session fail.
    pub fn failing_writes(self) -> Self {
        self.state.fail_writes.set(true);
        self
    }

    pub fn is_muted(&self) -> bool {
        self.state.muted.get()
    }

    pub fn level(&self) -> f32 {
        self.state.volume.get()
    }

    /// Number of successful writes (mute or volume) applied so far.
    pub fn write_count(&self) -> u32 {
        self.state.writes.get()
    }

    fn check_read(&self) -> Result<(), AudioError> {
        if self.state.fail_reads.get() {
            return Err(AudioError::SessionCallFailed(format!(
                "read refused for pid {:?}",
                self.pid
            )));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), AudioError> {
        if self.state.fail_writes.get() {
            return Err(AudioError::SessionCallFailed(format!(
                "write refused for pid {:?}",
                self.pid
            )));
        }
        self.state.writes.set(self.state.writes.get() + 1);
        Ok(())
    }
}

impl SessionVolume for MemorySession {
    fn owner_pid(&self) -> Option<u32> {
        self.pid
    }

    fn mute(&self) -> Result<bool, AudioError> {
        self.check_read()?;
        Ok(self.state.muted.get())
    }

    fn set_mute(&self, muted: bool) -> Result<(), AudioError> {
        self.check_write()?;
        self.state.muted.set(muted);
        Ok(())
    }

    fn volume(&self) -> Result<f32, AudioError> {
        self.check_read()?;
        Ok(self.state.volume.get())
    }

    fn set_volume(&self, level: f32) -> Result<(), AudioError> {
        self.check_write()?;
        self.state.volume.set(level);
        Ok(())
    }
}

/// A fake render device.
#[derive(Debug, Clone)]
pub struct MemoryDevice {
    name: Option<String>,
    sessions: Vec<MemorySession>,
    sessions_fail: bool,
}

impl MemoryDevice {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            sessions: Vec::new(),
            sessions_fail: false,
        }
    }

    /// A device whose friendly name cannot be read.
    pub fn unnamed() -> Self {
        Self {
            name: None,
            sessions: Vec::new(),
            sessions_fail: false,
        }
    }

    pub fn with_session(mut self, session: MemorySession) -> Self {
        self.sessions.push(session);
        self
    }

    /// Make session listing fail, as when the session manager cannot be
    /// activated on the device.
    pub fn failing_sessions(mut self) -> Self {
        self.sessions_fail = true;
        self
    }
}

impl AudioEndpoint for MemoryDevice {
    type Session = MemorySession;

    fn friendly_name(&self) -> Option<String> {
        self.name.clone()
    }

    fn sessions(&self) -> Result<Vec<MemorySession>, AudioError> {
        if self.sessions_fail {
            return Err(AudioError::SessionsUnavailable {
                device: self.name.clone().unwrap_or_default(),
            });
        }
        Ok(self.sessions.clone())
    }
}

/// A fake audio subsystem holding a fixed device list.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    devices: Vec<MemoryDevice>,
    available: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            available: true,
        }
    }

    /// A backend that behaves as if the audio subsystem failed to start.
    pub fn unavailable() -> Self {
        Self {
            devices: Vec::new(),
            available: false,
        }
    }

    pub fn with_device(mut self, device: MemoryDevice) -> Self {
        self.devices.push(device);
        self
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for MemoryBackend {
    type Device = MemoryDevice;

    fn active_render_devices(&self) -> Result<Vec<MemoryDevice>, AudioError> {
        if !self.available {
            return Err(AudioError::SubsystemUnavailable);
        }
        Ok(self.devices.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let session = MemorySession::new(7).volume_level(0.4);
        let backend = MemoryBackend::new()
            .with_device(MemoryDevice::new("Speakers").with_session(session.clone()));

        let devices = backend.active_render_devices().unwrap();
        let sessions = devices[0].sessions().unwrap();
        sessions[0].set_mute(true).unwrap();
        sessions[0].set_volume(0.9).unwrap();

        assert!(session.is_muted());
        assert_eq!(session.level(), 0.9);
        assert_eq!(session.write_count(), 2);
    }

    #[test]
    fn test_failure_switches() {
        let session = MemorySession::new(1).failing_reads().failing_writes();
        assert!(session.mute().is_err());
        assert!(session.set_volume(0.1).is_err());
        assert_eq!(session.write_count(), 0);

        assert!(MemoryDevice::new("Broken")
            .failing_sessions()
            .sessions()
            .is_err());
        assert!(MemoryBackend::unavailable().active_render_devices().is_err());
    }
}
