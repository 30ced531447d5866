//! User settings and the configuration provider seam.
//!
//! Settings persist as TOML under the user's config directory. The engine
//! never caches them: it reads through a [`ConfigProvider`] on every check.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;

const APP_DIR: &str = "MuteActiveWindow";
const SETTINGS_FILE: &str = "settings.toml";
const DEFAULT_VOLUME_STEP: f32 = 5.0;

/// How the caller picks sessions for the foreground process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Targeting {
    /// Try the exact pid first, fall back to the executable name when no
    /// session belongs to that pid
    #[default]
    PidThenName,

    /// Affect every process sharing the executable name
    NameOnly,
}

/// Read-only view of the settings the engine consults.
pub trait ConfigProvider {
    fn excluded_devices(&self) -> Vec<String>;

    fn excluded_processes(&self) -> Vec<String>;

    fn targeting(&self) -> Targeting {
        Targeting::default()
    }

    /// Volume change per hotkey press, in percent.
    fn volume_step_percent(&self) -> f32 {
        DEFAULT_VOLUME_STEP
    }

    fn show_volume_indicator(&self) -> bool {
        true
    }
}

impl<C: ConfigProvider + ?Sized> ConfigProvider for &C {
    fn excluded_devices(&self) -> Vec<String> {
        (**self).excluded_devices()
    }

    fn excluded_processes(&self) -> Vec<String> {
        (**self).excluded_processes()
    }

    fn targeting(&self) -> Targeting {
        (**self).targeting()
    }

    fn volume_step_percent(&self) -> f32 {
        (**self).volume_step_percent()
    }

    fn show_volume_indicator(&self) -> bool {
        (**self).show_volume_indicator()
    }
}

/// Settings service error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No configuration directory available on this system")]
    NoConfigDir,

    #[error("Failed to read settings from {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write settings to {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// User settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Render devices whose sessions are never touched (friendly names)
    pub excluded_devices: Vec<String>,

    /// Processes whose sessions are never touched, with or without `.exe`
    pub excluded_processes: Vec<String>,

    /// Prefer the exact foreground pid before falling back to its
    /// executable name
    pub main_process_only: bool,

    /// Volume change per hotkey press, in percent
    pub volume_step_percent: f32,

    /// Feed the on-screen volume indicator after a volume change
    pub show_volume_indicator: bool,

    /// Tracing filter directive, e.g. `debug` or `maw_rs=trace`
    pub log_level: Option<String>,

    /// Write logs to this file instead of stderr
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            excluded_devices: Vec::new(),
            excluded_processes: Vec::new(),
            main_process_only: true,
            volume_step_percent: DEFAULT_VOLUME_STEP,
            show_volume_indicator: true,
            log_level: None,
            log_file: None,
        }
    }
}

impl Settings {
    /// `<config dir>/MuteActiveWindow/settings.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Load settings from a file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::ReadFailed {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let settings: Settings = toml::from_str(&text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        let text = toml::to_string_pretty(self)?;

        let write_err = |source| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, text).map_err(write_err)?;

        tracing::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let step = self.volume_step_percent;
        if !(step > 0.0 && step <= 100.0) {
            return Err(ConfigError::InvalidValue {
                key: "volume_step_percent",
                reason: format!("{} is outside (0, 100]", step),
            });
        }
        Ok(())
    }

    /// Add a device to the exclusion list unless it is already there.
    pub fn add_excluded_device(&mut self, device: &str) -> bool {
        if self.excluded_devices.iter().any(|d| d == device) {
            return false;
        }
        self.excluded_devices.push(device.to_string());
        tracing::info!("Added excluded device: {}", device);
        true
    }

    /// Remove a device from the exclusion list.
    pub fn remove_excluded_device(&mut self, device: &str) -> bool {
        let before = self.excluded_devices.len();
        self.excluded_devices.retain(|d| d != device);
        let removed = self.excluded_devices.len() != before;
        if removed {
            tracing::info!("Removed excluded device: {}", device);
        }
        removed
    }

    /// Replace the excluded process list.
    pub fn set_excluded_processes<I, S>(&mut self, processes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_processes = processes.into_iter().map(Into::into).collect();
        tracing::info!(
            "Excluded processes saved: {}",
            self.excluded_processes.join(", ")
        );
    }
}

impl ConfigProvider for Settings {
    fn excluded_devices(&self) -> Vec<String> {
        self.excluded_devices.clone()
    }

    fn excluded_processes(&self) -> Vec<String> {
        self.excluded_processes.clone()
    }

    fn targeting(&self) -> Targeting {
        if self.main_process_only {
            Targeting::PidThenName
        } else {
            Targeting::NameOnly
        }
    }

    fn volume_step_percent(&self) -> f32 {
        self.volume_step_percent
    }

    fn show_volume_indicator(&self) -> bool {
        self.show_volume_indicator
    }
}

/// Live settings shared with whatever edits them (a settings window, the
/// FFI host). Each read takes a fresh snapshot.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<Settings>>,
}

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Copy of the current settings.
    pub fn snapshot(&self) -> Settings {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Swap in a whole new settings value.
    pub fn replace(&self, settings: Settings) {
        self.update(|current| *current = settings);
    }

    /// Edit the settings in place.
    pub fn update<R>(&self, f: impl FnOnce(&mut Settings) -> R) -> R {
        match self.inner.write() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    fn read<R>(&self, f: impl FnOnce(&Settings) -> R) -> R {
        match self.inner.read() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }
}

impl ConfigProvider for SharedSettings {
    fn excluded_devices(&self) -> Vec<String> {
        self.read(|s| s.excluded_devices.clone())
    }

    fn excluded_processes(&self) -> Vec<String> {
        self.read(|s| s.excluded_processes.clone())
    }

    fn targeting(&self) -> Targeting {
        self.read(|s| s.targeting())
    }

    fn volume_step_percent(&self) -> f32 {
        self.read(|s| s.volume_step_percent)
    }

    fn show_volume_indicator(&self) -> bool {
        self.read(|s| s.show_volume_indicator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.excluded_devices.is_empty());
        assert_eq!(settings.targeting(), Targeting::PidThenName);
        assert_eq!(settings.volume_step_percent, 5.0);
        assert!(settings.show_volume_indicator);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        let mut settings = Settings::default();
        settings.add_excluded_device("Headset");
        settings.set_excluded_processes(["discord", "obs64.exe"]);
        settings.main_process_only = false;
        settings.volume_step_percent = 2.5;
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.targeting(), Targeting::NameOnly);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "excluded_processes = [\"discord\"]\n").unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.excluded_processes, vec!["discord".to_string()]);
        assert_eq!(loaded.volume_step_percent, 5.0);
        assert!(loaded.main_process_only);
    }

    #[test]
    fn test_rejects_bad_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "volume_step_percent = 0.0\n").unwrap();

        let err = Settings::load(&path).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "volume_step_percent",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "excluded_devices = 3\n").unwrap();
        assert!(matches!(Settings::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_device_list_edits() {
        let mut settings = Settings::default();
        assert!(settings.add_excluded_device("Speakers"));
        assert!(!settings.add_excluded_device("Speakers"));
        assert!(settings.remove_excluded_device("Speakers"));
        assert!(!settings.remove_excluded_device("Speakers"));
    }

    #[test]
    fn test_shared_settings_are_read_fresh() {
        let shared = SharedSettings::new(Settings::default());
        let reader = shared.clone();
        assert!(reader.excluded_processes().is_empty());

        shared.update(|s| s.set_excluded_processes(["discord"]));
        assert_eq!(reader.excluded_processes(), vec!["discord".to_string()]);

        shared.replace(Settings {
            main_process_only: false,
            ..Settings::default()
        });
        assert_eq!(reader.targeting(), Targeting::NameOnly);
        assert!(reader.excluded_processes().is_empty());
    }
}
