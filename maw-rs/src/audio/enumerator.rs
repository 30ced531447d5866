//! Device and session walking.
//!
//! Lists active render devices, applies the device exclusion, and hands
//! every session on the remaining devices to a visitor. Failures are soft:
//! a device whose sessions cannot be listed is skipped and the walk goes on.

use super::backend::{AudioBackend, AudioEndpoint};
use super::device::{AudioError, DeviceSummary, UNKNOWN_NAME};
use super::policy::ExclusionPolicy;
use crate::config::ConfigProvider;
use tracing::{debug, warn};

/// Call `visit` for every active render device, with its friendly name
/// when one could be read.
pub fn for_each_active_device<B, F>(backend: &B, mut visit: F) -> Result<usize, AudioError>
where
    B: AudioBackend,
    F: FnMut(usize, Option<&str>, &B::Device),
{
    let devices = backend.active_render_devices()?;
    debug!("Found {} active audio render devices", devices.len());

    for (index, device) in devices.iter().enumerate() {
        let name = device.friendly_name();
        visit(index, name.as_deref(), device);
    }

    Ok(devices.len())
}

/// Call `visit` for every session on one device.
///
/// Returns the number of sessions visited, or `None` when the device's
/// sessions could not be listed.
pub fn for_each_session_on_device<D, F>(device: &D, device_name: &str, mut visit: F) -> Option<usize>
where
    D: AudioEndpoint,
    F: FnMut(usize, &D::Session),
{
    let sessions = match device.sessions() {
        Ok(sessions) => sessions,
        Err(e) => {
            warn!("Skipping device {}: {}", device_name, e);
            return None;
        }
    };
    debug!("Total audio sessions on {}: {}", device_name, sessions.len());

    for (index, session) in sessions.iter().enumerate() {
        visit(index, session);
    }

    Some(sessions.len())
}

/// Call `visit` for every session on every active, non-excluded device.
///
/// An unresolvable device name never matches the exclusion list, so such a
/// device stays visible.
pub fn for_each_session<B, C, F>(
    backend: &B,
    policy: &ExclusionPolicy<C>,
    mut visit: F,
) -> Result<(), AudioError>
where
    B: AudioBackend,
    C: ConfigProvider,
    F: FnMut(&str, usize, &<B::Device as AudioEndpoint>::Session),
{
    for_each_active_device(backend, |index, name, device| {
        let excluded = is_excluded(policy, name);
        let name = name.unwrap_or(UNKNOWN_NAME);
        debug!("Scanning device {}: {}", index, name);

        if excluded {
            debug!("Device {} ({}) is excluded, skipping", index, name);
            return;
        }

        for_each_session_on_device(device, name, |session_index, session| {
            visit(name, session_index, session)
        });
    })?;

    Ok(())
}

/// Summaries of the active render devices with their exclusion state.
pub fn list_devices<B, C>(
    backend: &B,
    policy: &ExclusionPolicy<C>,
) -> Result<Vec<DeviceSummary>, AudioError>
where
    B: AudioBackend,
    C: ConfigProvider,
{
    let mut summaries = Vec::new();
    for_each_active_device(backend, |_, name, _| {
        summaries.push(DeviceSummary {
            name: name.unwrap_or(UNKNOWN_NAME).to_string(),
            is_excluded: is_excluded(policy, name),
        });
    })?;
    Ok(summaries)
}

fn is_excluded<C: ConfigProvider>(policy: &ExclusionPolicy<C>, name: Option<&str>) -> bool {
    name.map_or(false, |name| policy.is_device_excluded(name))
}
