//! FFI bindings for Mute Active Window.
//!
//! This crate provides C ABI functions so a GUI host (tray app, settings
//! window, OSD) can drive the audio engine through P/Invoke or similar.
//! All functions use panic::catch_unwind to prevent Rust panics from
//! unwinding across the FFI boundary.
//!
//! COM objects are created per call on the calling thread, so a handle may
//! be used from any thread.

use maw_rs::{
    logging, system_control, ConfigError, DeviceSummary, HotkeyAction, MuteController, Settings,
    SharedSettings,
};
use serde::Serialize;
use std::cell::RefCell;
use std::ffi::{c_char, c_void, CStr, CString};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

// ============================================================================
// Error Handling
// ============================================================================

/// Error codes returned by FFI functions.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,
    InvalidHandle = -1,
    InvalidArgument = -2,
    ConfigError = -3,
    JsonError = -5,
    Panic = -99,
}

/// A failed call: the code returned to the host and the message kept for
/// maw_engine_last_error_message().
#[derive(Debug)]
struct FfiError {
    code: ErrorCode,
    message: String,
}

impl FfiError {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<ConfigError> for FfiError {
    fn from(err: ConfigError) -> Self {
        FfiError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl From<serde_json::Error> for FfiError {
    fn from(err: serde_json::Error) -> Self {
        FfiError::new(ErrorCode::JsonError, err.to_string())
    }
}

/// Thread-local storage for the last error.
thread_local! {
    static LAST_ERROR: RefCell<Option<(ErrorCode, String)>> = const { RefCell::new(None) };
}

fn set_last_error(code: ErrorCode, message: impl Into<String>) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = Some((code, message.into()));
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

// ============================================================================
// Data Types for JSON Serialization
// ============================================================================

/// Response containing the active render devices.
#[derive(Debug, Serialize)]
pub struct DeviceListResponse {
    pub devices: Vec<DeviceSummary>,
}

// ============================================================================
// Engine Handle Type
// ============================================================================

/// Opaque handle to the engine. Actually points to a MawEngine struct.
pub type MawEngineHandle = *mut c_void;

/// Internal engine state.
struct MawEngine {
    // Only the settings persist; audio objects are created per call
    settings: SharedSettings,
}

impl MawEngine {
    fn new(settings: Settings) -> Self {
        Self {
            settings: SharedSettings::new(settings),
        }
    }

    fn controller(&self) -> MuteController<maw_rs::SystemBackend, maw_rs::SystemInspector, SharedSettings> {
        MuteController::new(system_control(self.settings.clone()))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Allocate a C string from a Rust string. Caller must free with maw_engine_free_string.
fn alloc_c_string(s: &str) -> *mut c_char {
    // Interior nul bytes are dropped rather than failing the call
    let bytes: Vec<u8> = s.bytes().filter(|&b| b != 0).collect();
    match CString::new(bytes) {
        Ok(cs) => cs.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Parse a C string to a Rust string slice.
unsafe fn parse_c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

/// Borrow the engine behind a handle.
unsafe fn engine<'a>(handle: MawEngineHandle) -> Result<&'a MawEngine, FfiError> {
    if handle.is_null() {
        return Err(FfiError::new(ErrorCode::InvalidHandle, "Null engine handle"));
    }
    Ok(&*(handle as *const MawEngine))
}

unsafe fn required_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, FfiError> {
    parse_c_str(ptr).ok_or_else(|| FfiError::new(ErrorCode::InvalidArgument, format!("Invalid {}", what)))
}

fn parse_settings(json: &str) -> Result<Settings, FfiError> {
    let settings: Settings = serde_json::from_str(json)?;
    settings.validate()?;
    Ok(settings)
}

fn finite_step(step_percent: f32) -> Result<f32, FfiError> {
    if step_percent.is_finite() {
        Ok(step_percent)
    } else {
        Err(FfiError::new(
            ErrorCode::InvalidArgument,
            format!("Invalid volume step: {}", step_percent),
        ))
    }
}

fn count_to_i32(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

/// Run an integer-returning call, mapping errors and panics to codes.
fn guard_code<F>(operation: &str, f: F) -> i32
where
    F: FnOnce() -> Result<i32, FfiError>,
{
    clear_last_error();

    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => {
            set_last_error(e.code, e.message);
            e.code as i32
        }
        Err(_) => {
            set_last_error(ErrorCode::Panic, format!("Panic during {}", operation));
            ErrorCode::Panic as i32
        }
    }
}

/// Run a string-returning call. Returns null on failure.
fn guard_string<F>(operation: &str, f: F) -> *mut c_char
where
    F: FnOnce() -> Result<String, FfiError>,
{
    clear_last_error();

    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(s)) => alloc_c_string(&s),
        Ok(Err(e)) => {
            set_last_error(e.code, e.message);
            ptr::null_mut()
        }
        Err(_) => {
            set_last_error(ErrorCode::Panic, format!("Panic during {}", operation));
            ptr::null_mut()
        }
    }
}

// ============================================================================
// FFI Functions - Lifecycle
// ============================================================================

/// Create a new engine instance.
///
/// # Arguments
/// * `config_json` - JSON settings (same fields as settings.toml), or null
///   to load the per-user settings file
///
/// # Returns
/// Handle to the engine, or null on failure. Check maw_engine_last_error_code() on failure.
///
/// # Safety
/// The returned handle must be freed with maw_engine_destroy().
#[no_mangle]
pub extern "C" fn maw_engine_create(config_json: *const c_char) -> MawEngineHandle {
    clear_last_error();

    let result = panic::catch_unwind(|| -> Result<MawEngineHandle, FfiError> {
        let settings = if config_json.is_null() {
            Settings::load(&Settings::default_path()?)?
        } else {
            let json = unsafe { required_str(config_json, "config JSON")? };
            parse_settings(json)?
        };

        if let Err(e) = logging::init(&settings) {
            tracing::debug!("Logging not reinitialized: {}", e);
        }

        let engine = Box::new(MawEngine::new(settings));
        Ok(Box::into_raw(engine) as MawEngineHandle)
    });

    match result {
        Ok(Ok(handle)) => handle,
        Ok(Err(e)) => {
            set_last_error(e.code, e.message);
            ptr::null_mut()
        }
        Err(_) => {
            set_last_error(ErrorCode::Panic, "Panic during engine creation");
            ptr::null_mut()
        }
    }
}

/// Destroy an engine instance.
///
/// # Safety
/// The handle must have been created by maw_engine_create() and must not be used after this call.
#[no_mangle]
pub extern "C" fn maw_engine_destroy(handle: MawEngineHandle) {
    if handle.is_null() {
        return;
    }

    let _ = panic::catch_unwind(|| {
        unsafe {
            let _ = Box::from_raw(handle as *mut MawEngine);
        }
    });
}

/// Replace the engine's settings. Takes effect on the next call.
///
/// # Returns
/// 0 on success, negative error code on failure.
#[no_mangle]
pub extern "C" fn maw_engine_set_config(handle: MawEngineHandle, config_json: *const c_char) -> i32 {
    guard_code("set config", || {
        let engine = unsafe { engine(handle)? };
        let json = unsafe { required_str(config_json, "config JSON")? };
        engine.settings.replace(parse_settings(json)?);
        Ok(ErrorCode::Success as i32)
    })
}

// ============================================================================
// FFI Functions - Session Operations
// ============================================================================

/// Toggle mute on every session owned by `pid`.
///
/// # Returns
/// Number of sessions toggled, or a negative error code.
#[no_mangle]
pub extern "C" fn maw_engine_toggle_mute_by_pid(handle: MawEngineHandle, pid: u32) -> i32 {
    guard_code("toggle mute", || {
        let engine = unsafe { engine(handle)? };
        let count = engine.controller().control().toggle_mute_by_pid(pid);
        Ok(count_to_i32(count))
    })
}

/// Toggle mute on every session of processes named `exe_name`.
///
/// # Returns
/// Number of sessions toggled, or a negative error code.
#[no_mangle]
pub extern "C" fn maw_engine_toggle_mute_by_exe(
    handle: MawEngineHandle,
    exe_name: *const c_char,
) -> i32 {
    guard_code("toggle mute", || {
        let engine = unsafe { engine(handle)? };
        let exe_name = unsafe { required_str(exe_name, "executable name")? };
        let count = engine.controller().control().toggle_mute_by_exe_name(exe_name);
        Ok(count_to_i32(count))
    })
}

/// Raise the volume of every session owned by `pid` by `step_percent`.
///
/// # Returns
/// Number of sessions changed, or a negative error code.
#[no_mangle]
pub extern "C" fn maw_engine_increase_volume_by_pid(
    handle: MawEngineHandle,
    pid: u32,
    step_percent: f32,
) -> i32 {
    guard_code("increase volume", || {
        let engine = unsafe { engine(handle)? };
        let step_percent = finite_step(step_percent)?;
        let count = engine
            .controller()
            .control()
            .increase_volume_by_pid(pid, step_percent);
        Ok(count_to_i32(count))
    })
}

/// Lower the volume of every session owned by `pid` by `step_percent`.
///
/// # Returns
/// Number of sessions changed, or a negative error code.
#[no_mangle]
pub extern "C" fn maw_engine_decrease_volume_by_pid(
    handle: MawEngineHandle,
    pid: u32,
    step_percent: f32,
) -> i32 {
    guard_code("decrease volume", || {
        let engine = unsafe { engine(handle)? };
        let step_percent = finite_step(step_percent)?;
        let count = engine
            .controller()
            .control()
            .decrease_volume_by_pid(pid, step_percent);
        Ok(count_to_i32(count))
    })
}

/// Raise the volume of every session of processes named `exe_name`.
///
/// # Returns
/// Number of sessions changed, or a negative error code.
#[no_mangle]
pub extern "C" fn maw_engine_increase_volume_by_exe(
    handle: MawEngineHandle,
    exe_name: *const c_char,
    step_percent: f32,
) -> i32 {
    guard_code("increase volume", || {
        let engine = unsafe { engine(handle)? };
        let exe_name = unsafe { required_str(exe_name, "executable name")? };
        let step_percent = finite_step(step_percent)?;
        let count = engine
            .controller()
            .control()
            .increase_volume_by_exe_name(exe_name, step_percent);
        Ok(count_to_i32(count))
    })
}

/// Lower the volume of every session of processes named `exe_name`.
///
/// # Returns
/// Number of sessions changed, or a negative error code.
#[no_mangle]
pub extern "C" fn maw_engine_decrease_volume_by_exe(
    handle: MawEngineHandle,
    exe_name: *const c_char,
    step_percent: f32,
) -> i32 {
    guard_code("decrease volume", || {
        let engine = unsafe { engine(handle)? };
        let exe_name = unsafe { required_str(exe_name, "executable name")? };
        let step_percent = finite_step(step_percent)?;
        let count = engine
            .controller()
            .control()
            .decrease_volume_by_exe_name(exe_name, step_percent);
        Ok(count_to_i32(count))
    })
}

fn write_reading(reading: Option<f32>, out_volume: *mut f32) -> Result<i32, FfiError> {
    match reading {
        Some(level) => {
            unsafe {
                *out_volume = level;
            }
            Ok(1)
        }
        None => Ok(0),
    }
}

/// Average volume (0.0 to 1.0) of the sessions owned by `pid`.
///
/// # Returns
/// 1 when a reading was written to `out_volume`, 0 when no session matched,
/// negative error code on failure.
#[no_mangle]
pub extern "C" fn maw_engine_get_volume_by_pid(
    handle: MawEngineHandle,
    pid: u32,
    out_volume: *mut f32,
) -> i32 {
    guard_code("get volume", || {
        let engine = unsafe { engine(handle)? };
        if out_volume.is_null() {
            return Err(FfiError::new(ErrorCode::InvalidArgument, "Null output pointer"));
        }
        write_reading(engine.controller().control().get_volume_by_pid(pid), out_volume)
    })
}

/// Average volume (0.0 to 1.0) of the sessions of processes named `exe_name`.
///
/// # Returns
/// 1 when a reading was written to `out_volume`, 0 when no session matched,
/// negative error code on failure.
#[no_mangle]
pub extern "C" fn maw_engine_get_volume_by_exe(
    handle: MawEngineHandle,
    exe_name: *const c_char,
    out_volume: *mut f32,
) -> i32 {
    guard_code("get volume", || {
        let engine = unsafe { engine(handle)? };
        let exe_name = unsafe { required_str(exe_name, "executable name")? };
        if out_volume.is_null() {
            return Err(FfiError::new(ErrorCode::InvalidArgument, "Null output pointer"));
        }
        write_reading(
            engine.controller().control().get_volume_by_exe_name(exe_name),
            out_volume,
        )
    })
}

// ============================================================================
// FFI Functions - Hotkey Actions
// ============================================================================

/// Handle one hotkey press for the foreground process `pid`, with the
/// pid-then-name fallback and the configured step size.
///
/// # Arguments
/// * `action` - 0 = toggle mute, 1 = volume up, 2 = volume down
///
/// # Returns
/// JSON ActionOutcome (`executable`, `tier`, `affected`, and `volume` when
/// the indicator should show one). Caller must free with maw_engine_free_string().
/// Returns null on failure.
#[no_mangle]
pub extern "C" fn maw_engine_handle_action(
    handle: MawEngineHandle,
    pid: u32,
    action: u32,
) -> *mut c_char {
    guard_string("hotkey action", || {
        let engine = unsafe { engine(handle)? };
        let action = match action {
            0 => HotkeyAction::ToggleMute,
            1 => HotkeyAction::VolumeUp,
            2 => HotkeyAction::VolumeDown,
            _ => return Err(FfiError::new(ErrorCode::InvalidArgument, "Invalid action")),
        };

        let outcome = engine.controller().handle(pid, action);
        Ok(serde_json::to_string(&outcome)?)
    })
}

/// Executable name used for the foreground process `pid`.
///
/// # Returns
/// Name string, `(unknown)` when it cannot be resolved. Caller must free with
/// maw_engine_free_string(). Returns null on failure.
#[no_mangle]
pub extern "C" fn maw_engine_resolve_executable_name(
    handle: MawEngineHandle,
    pid: u32,
) -> *mut c_char {
    guard_string("name resolution", || {
        let engine = unsafe { engine(handle)? };
        Ok(engine.controller().control().executable_name(pid))
    })
}

/// Active render devices with their exclusion state, for a device picker.
///
/// # Returns
/// JSON string containing the device list. Caller must free with maw_engine_free_string().
/// Returns null on failure.
#[no_mangle]
pub extern "C" fn maw_engine_get_devices(handle: MawEngineHandle) -> *mut c_char {
    guard_string("device enumeration", || {
        let engine = unsafe { engine(handle)? };
        let response = DeviceListResponse {
            devices: engine.controller().control().devices(),
        };
        Ok(serde_json::to_string(&response)?)
    })
}

// ============================================================================
// FFI Functions - Memory Management
// ============================================================================

/// Free a string allocated by this library.
///
/// # Safety
/// The pointer must have been returned by one of the maw_engine_* functions.
/// Do not call this on strings from other sources.
#[no_mangle]
pub extern "C" fn maw_engine_free_string(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }

    let _ = panic::catch_unwind(|| {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    });
}

// ============================================================================
// FFI Functions - Error Handling
// ============================================================================

/// Get the last error code.
///
/// # Returns
/// The error code from the last failed operation, or 0 if no error.
#[no_mangle]
pub extern "C" fn maw_engine_last_error_code() -> i32 {
    LAST_ERROR.with(|e| {
        e.borrow()
            .as_ref()
            .map(|(code, _)| *code as i32)
            .unwrap_or(0)
    })
}

/// Get the last error message.
///
/// # Returns
/// Error message string. Caller must free with maw_engine_free_string().
/// Returns null if no error.
#[no_mangle]
pub extern "C" fn maw_engine_last_error_message() -> *mut c_char {
    LAST_ERROR.with(|e| {
        e.borrow()
            .as_ref()
            .map(|(_, msg)| alloc_c_string(msg))
            .unwrap_or(ptr::null_mut())
    })
}

// ============================================================================
// FFI Functions - Utility
// ============================================================================

/// Get the library version.
///
/// # Returns
/// Version string. Caller must free with maw_engine_free_string().
#[no_mangle]
pub extern "C" fn maw_engine_version() -> *mut c_char {
    alloc_c_string(env!("CARGO_PKG_VERSION"))
}

// ============================================================================
// Tests
// ============================================================================
