//! Device and process exclusion.
//!
//! Both lists are owned by the configuration provider and read fresh on
//! every check, so edits apply to the next hotkey press without a restart.

use crate::config::ConfigProvider;

const EXE_SUFFIX: &str = ".exe";

/// Strip a trailing `.exe` (any case) from a process name.
pub fn strip_exe_suffix(name: &str) -> &str {
    let split = name.len().saturating_sub(EXE_SUFFIX.len());
    match (name.get(..split), name.get(split..)) {
        (Some(stem), Some(suffix)) if suffix.eq_ignore_ascii_case(EXE_SUFFIX) => stem,
        _ => name,
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Case-insensitive exact match against the excluded device names.
pub fn is_device_listed(excluded: &[String], device_name: &str) -> bool {
    excluded.iter().any(|d| eq_ignore_case(d, device_name))
}

/// Match a process name against the excluded process names.
///
/// Users enter exclusions with or without the extension, so a hit on either
/// the raw names or the extension-stripped names excludes the process.
pub fn is_process_listed(excluded: &[String], process_name: &str) -> bool {
    if excluded.iter().any(|p| eq_ignore_case(p, process_name)) {
        return true;
    }

    let candidate = strip_exe_suffix(process_name);
    excluded
        .iter()
        .any(|p| eq_ignore_case(strip_exe_suffix(p), candidate))
}

/// Exclusion policy backed by a live configuration provider.
pub struct ExclusionPolicy<C> {
    config: C,
}

impl<C: ConfigProvider> ExclusionPolicy<C> {
    pub fn new(config: C) -> Self {
        Self { config }
    }

    /// Whether sessions on this device are hidden from every operation.
    pub fn is_device_excluded(&self, device_name: &str) -> bool {
        is_device_listed(&self.config.excluded_devices(), device_name)
    }

    /// Whether this process never participates in any operation.
    pub fn is_process_excluded(&self, process_name: &str) -> bool {
        is_process_listed(&self.config.excluded_processes(), process_name)
    }

    /// The provider this policy reads from.
    pub fn config(&self) -> &C {
        &self.config
    }
}
