//! Process identity resolution.
//!
//! Maps a process id to the executable file name used for matching and
//! exclusion. Packaged (UWP) apps draw their frame from a shared host
//! process, so when the foreground pid belongs to that host the name of the
//! real app is recovered from the foreground window's children.

use std::collections::HashMap;
use tracing::debug;

pub use crate::audio::device::UNKNOWN_NAME;

/// Host process that owns the frame window of packaged apps.
pub const PACKAGED_APP_HOST: &str = "ApplicationFrameHost.exe";

/// Child-window owners whose names contain any of these (any case) are
/// shell or system helpers, never the packaged app itself.
const SHELL_PROCESS_MARKERS: &[&str] = &["system", "svchost", "explorer"];

/// OS queries needed to name processes.
pub trait ProcessInspector {
    /// File name of the process image (`game.exe`), `None` when the process
    /// is gone or cannot be opened.
    fn image_name(&self, pid: u32) -> Option<String>;

    /// Owning pids of the current foreground window's child windows, in
    /// enumeration order.
    fn foreground_child_pids(&self) -> Vec<u32>;
}

impl<I: ProcessInspector + ?Sized> ProcessInspector for &I {
    fn image_name(&self, pid: u32) -> Option<String> {
        (**self).image_name(pid)
    }

    fn foreground_child_pids(&self) -> Vec<u32> {
        (**self).foreground_child_pids()
    }
}

/// Resolves display executable names; never fails.
pub struct ProcessIdentity<I> {
    inspector: I,
}

impl<I: ProcessInspector> ProcessIdentity<I> {
    pub fn new(inspector: I) -> Self {
        Self { inspector }
    }

    /// Image file name of `pid`, or `(unknown)`.
    pub fn image_name(&self, pid: u32) -> String {
        self.inspector
            .image_name(pid)
            .unwrap_or_else(|| UNKNOWN_NAME.to_string())
    }

    /// Executable name of the foreground process `pid`, looking through the
    /// packaged-app host to the app it frames.
    pub fn executable_name(&self, pid: u32) -> String {
        let name = self.image_name(pid);
        if !is_packaged_app_host(&name) {
            return name;
        }

        debug!("Detected {}, looking for the packaged app", name);
        match self.packaged_app_name(pid) {
            Some(app) => {
                debug!("Packaged app detected, using app name: {}", app);
                app
            }
            None => {
                debug!("No suitable child window process found, keeping {}", name);
                name
            }
        }
    }

    /// First acceptable child-window process name under the foreground
    /// window, skipping the host itself.
    fn packaged_app_name(&self, host_pid: u32) -> Option<String> {
        self.inspector
            .foreground_child_pids()
            .into_iter()
            .filter(|&pid| pid != host_pid)
            .filter_map(|pid| {
                let name = self.inspector.image_name(pid)?;
                debug!("Child window PID: {}, EXE: {}", pid, name);
                Some(name)
            })
            .find(|name| is_packaged_app_candidate(name))
    }

    pub fn inspector(&self) -> &I {
        &self.inspector
    }
}

/// Last component of a Windows or POSIX path.
pub fn file_name(path: &str) -> Option<&str> {
    path.rsplit(|c: char| c == '\\' || c == '/').next().filter(|name| !name.is_empty())
}

fn is_packaged_app_host(name: &str) -> bool {
    name.eq_ignore_ascii_case(PACKAGED_APP_HOST)
}

fn is_packaged_app_candidate(name: &str) -> bool {
    if is_packaged_app_host(name) {
        return false;
    }
    let lower = name.to_lowercase();
    !SHELL_PROCESS_MARKERS.iter().any(|m| lower.contains(m))
}

/// Fixed pid-to-name table with a scripted foreground window.
///
/// Stands in for the OS on platforms without a process inspector, and in
/// tests. An empty table resolves nothing.
#[derive(Debug, Clone, Default)]
pub struct ProcessTable {
    names: HashMap<u32, String>,
    foreground_children: Vec<u32>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_process(mut self, pid: u32, name: impl Into<String>) -> Self {
        self.names.insert(pid, name.into());
        self
    }

    /// Owners of the foreground window's children, in enumeration order.
    pub fn with_foreground_children(mut self, pids: impl IntoIterator<Item = u32>) -> Self {
        self.foreground_children = pids.into_iter().collect();
        self
    }
}

impl ProcessInspector for ProcessTable {
    fn image_name(&self, pid: u32) -> Option<String> {
        self.names.get(&pid).cloned()
    }

    fn foreground_child_pids(&self) -> Vec<u32> {
        self.foreground_children.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_file_name() {
        assert_eq!(
            file_name(r"C:\Program Files\Game\game.exe"),
            Some("game.exe")
        );
        assert_eq!(file_name("/usr/bin/game"), Some("game"));
        assert_eq!(file_name("game.exe"), Some("game.exe"));
        assert_eq!(file_name(r"C:\Games\"), None);
        assert_eq!(file_name(""), None);
    }

    #[test]
    fn test_plain_process() {
        let identity = ProcessIdentity::new(ProcessTable::new().with_process(10, "game.exe"));
        assert_eq!(identity.executable_name(10), "game.exe");
        assert_eq!(identity.image_name(10), "game.exe");
    }

    #[test]
    fn test_unknown_process() {
        let identity = ProcessIdentity::new(ProcessTable::new());
        assert_eq!(identity.executable_name(99), UNKNOWN_NAME);
    }

    #[test]
    fn test_packaged_app_unwrap() {
        let table = ProcessTable::new()
            .with_process(1, PACKAGED_APP_HOST)
            .with_process(2, "explorer.exe")
            .with_process(3, "Spotify.exe")
            .with_process(4, "Calculator.exe")
            .with_foreground_children([1, 2, 3, 4]);
        let identity = ProcessIdentity::new(table);

        assert_eq!(identity.executable_name(1), "Spotify.exe");
        // Only the foreground lookup unwraps the host.
        assert_eq!(identity.image_name(1), PACKAGED_APP_HOST);
    }

    #[test]
    fn test_packaged_app_denylist_is_case_insensitive() {
        let table = ProcessTable::new()
            .with_process(1, PACKAGED_APP_HOST)
            .with_process(2, "SystemSettings.exe")
            .with_process(3, "SVCHOST.EXE")
            .with_process(4, "Explorer.EXE")
            .with_foreground_children([2, 3, 4]);
        let identity = ProcessIdentity::new(table);

        assert_eq!(identity.executable_name(1), PACKAGED_APP_HOST);
    }

    #[test]
    fn test_packaged_app_skips_unresolvable_and_host_copies() {
        let table = ProcessTable::new()
            .with_process(1, PACKAGED_APP_HOST)
            .with_process(5, "applicationframehost.exe")
            .with_process(6, "Photos.exe")
            .with_foreground_children([42, 5, 6]);
        let identity = ProcessIdentity::new(table);

        assert_eq!(identity.executable_name(1), "Photos.exe");
    }

    #[test]
    fn test_packaged_app_without_children_keeps_host() {
        let identity =
            ProcessIdentity::new(ProcessTable::new().with_process(1, PACKAGED_APP_HOST));
        assert_eq!(identity.executable_name(1), PACKAGED_APP_HOST);
    }

    struct CountingInspector {
        table: ProcessTable,
        lookups: RefCell<Vec<u32>>,
    }

    impl ProcessInspector for CountingInspector {
        fn image_name(&self, pid: u32) -> Option<String> {
            self.lookups.borrow_mut().push(pid);
            self.table.image_name(pid)
        }

        fn foreground_child_pids(&self) -> Vec<u32> {
            self.table.foreground_child_pids()
        }
    }

    #[test]
    fn test_packaged_app_stops_at_first_match() {
        let inspector = CountingInspector {
            table: ProcessTable::new()
                .with_process(1, PACKAGED_APP_HOST)
                .with_process(2, "Mail.exe")
                .with_process(3, "Photos.exe")
                .with_foreground_children([1, 2, 3]),
            lookups: RefCell::new(Vec::new()),
        };
        let identity = ProcessIdentity::new(&inspector);

        assert_eq!(identity.executable_name(1), "Mail.exe");
        assert_eq!(*inspector.lookups.borrow(), vec![1, 2]);
    }
}
