//! Per-session mute and volume changes.
//!
//! Each call touches one session once, with no retry. Failures are logged
//! and reported as `false`/`None` so the caller can move on to the next
//! session.

use super::backend::SessionVolume;
use tracing::{debug, warn};

/// Flip the session's mute flag. Returns whether the write succeeded.
pub fn toggle_mute<S: SessionVolume>(session: &S) -> bool {
    let current = match session.mute() {
        Ok(muted) => muted,
        Err(e) => {
            warn!("Failed to get mute state: {}", e);
            return false;
        }
    };
    debug!(
        "Current mute state: {}",
        if current { "Muted" } else { "Not muted" }
    );

    let new_state = !current;
    match session.set_mute(new_state) {
        Ok(()) => {
            debug!(
                "Toggled mute to {}",
                if new_state { "Muted" } else { "Unmuted" }
            );
            true
        }
        Err(e) => {
            warn!("Failed to toggle mute: {}", e);
            false
        }
    }
}

/// Volume after applying a percentage step, clamped to 0.0..=1.0.
pub fn stepped_volume(current: f32, step_percent: f32) -> f32 {
    (current + step_percent / 100.0).clamp(0.0, 1.0)
}

/// Move the session's volume by `step_percent` (negative to lower it).
/// Returns the level written.
pub fn adjust_volume<S: SessionVolume>(session: &S, step_percent: f32) -> Option<f32> {
    if !step_percent.is_finite() {
        warn!("Ignoring non-finite volume step: {}", step_percent);
        return None;
    }

    let current = match session.volume() {
        Ok(level) if level.is_finite() => level,
        Ok(level) => {
            warn!("Session reported a non-finite volume: {}", level);
            return None;
        }
        Err(e) => {
            warn!("Failed to get volume: {}", e);
            return None;
        }
    };

    let new_level = stepped_volume(current, step_percent);
    match session.set_volume(new_level) {
        Ok(()) => {
            debug!(
                "Volume {:.0}% -> {:.0}%",
                current * 100.0,
                new_level * 100.0
            );
            Some(new_level)
        }
        Err(e) => {
            warn!("Failed to set volume: {}", e);
            None
        }
    }
}

/// Current linear volume of the session.
pub fn read_volume<S: SessionVolume>(session: &S) -> Option<f32> {
    match session.volume() {
        Ok(level) => Some(level),
        Err(e) => {
            warn!("Failed to get volume: {}", e);
            None
        }
    }
}
