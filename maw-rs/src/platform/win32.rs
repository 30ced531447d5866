//! Process and window queries through Win32.

use super::process::{file_name, ProcessInspector};
use windows::core::PWSTR;
use windows::Win32::Foundation::{CloseHandle, BOOL, HANDLE, HWND, LPARAM};
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32,
    PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumChildWindows, GetForegroundWindow, GetWindowThreadProcessId,
};

const IMAGE_PATH_CAPACITY: usize = 1024;

/// Process handle closed on drop.
struct ProcessHandle(HANDLE);

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

/// Process inspector backed by the live system.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Processes;

impl Win32Processes {
    pub fn new() -> Self {
        Self
    }

    /// Full image path of `pid`, opened with limited query rights.
    pub fn image_path(&self, pid: u32) -> Option<String> {
        unsafe {
            let handle = ProcessHandle(
                OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid).ok()?,
            );

            let mut buf = [0u16; IMAGE_PATH_CAPACITY];
            let mut len = buf.len() as u32;
            QueryFullProcessImageNameW(
                handle.0,
                PROCESS_NAME_WIN32,
                PWSTR(buf.as_mut_ptr()),
                &mut len,
            )
            .ok()?;

            Some(String::from_utf16_lossy(&buf[..len as usize]))
        }
    }
}

impl ProcessInspector for Win32Processes {
    fn image_name(&self, pid: u32) -> Option<String> {
        let path = self.image_path(pid)?;
        file_name(&path).map(str::to_string)
    }

    fn foreground_child_pids(&self) -> Vec<u32> {
        let mut pids: Vec<u32> = Vec::new();
        unsafe {
            let window = GetForegroundWindow();
            if window.0.is_null() {
                tracing::debug!("Failed to get foreground window for packaged app detection");
                return pids;
            }

            // EnumChildWindows calls our callback for each descendant window
            let _ = EnumChildWindows(
                window,
                Some(collect_window_pid),
                LPARAM(&mut pids as *mut Vec<u32> as isize),
            );
        }
        pids
    }
}

/// Callback for EnumChildWindows: records the owning pid of each window.
unsafe extern "system" fn collect_window_pid(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let pids = &mut *(lparam.0 as *mut Vec<u32>);

    if let Some(pid) = window_pid(hwnd) {
        pids.push(pid);
    }

    BOOL(1) // Continue enumeration
}

fn window_pid(hwnd: HWND) -> Option<u32> {
    let mut pid: u32 = 0;
    unsafe {
        GetWindowThreadProcessId(hwnd, Some(&mut pid));
    }
    (pid != 0).then_some(pid)
}

/// Pid owning the window that currently has keyboard focus.
pub fn foreground_pid() -> Option<u32> {
    let window = unsafe { GetForegroundWindow() };
    if window.0.is_null() {
        return None;
    }
    window_pid(window)
}
