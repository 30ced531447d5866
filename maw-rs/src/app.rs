//! Hotkey action handling.
//!
//! Turns one hotkey press for the foreground process into façade calls:
//! pick the tier (exact pid, then executable name), apply the action, and
//! feed the volume indicator after a volume change.

use crate::audio::{AudioBackend, AudioControl, MatchCriterion};
use crate::config::{ConfigProvider, Targeting};
use crate::platform::ProcessInspector;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What a hotkey asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotkeyAction {
    ToggleMute,
    VolumeUp,
    VolumeDown,
}

impl HotkeyAction {
    pub fn is_volume_change(self) -> bool {
        matches!(self, HotkeyAction::VolumeUp | HotkeyAction::VolumeDown)
    }
}

/// Which criterion produced the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    ProcessId,
    ExecutableName,
}

/// Result of handling one hotkey action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionOutcome {
    /// Executable name resolved for the foreground pid
    pub executable: String,

    /// The last tier tried
    pub tier: MatchTier,

    /// Sessions the action changed
    pub affected: usize,

    /// Volume reading shown on the indicator, 0.0..=1.0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,
}

/// Consumer of volume readings after a volume hotkey, typically an
/// on-screen display.
pub trait VolumeIndicator {
    fn show_volume(&self, process_name: &str, percent: f32);
}

impl<V: VolumeIndicator + ?Sized> VolumeIndicator for &V {
    fn show_volume(&self, process_name: &str, percent: f32) {
        (**self).show_volume(process_name, percent)
    }
}

/// Indicator that shows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIndicator;

impl VolumeIndicator for NoIndicator {
    fn show_volume(&self, _process_name: &str, _percent: f32) {}
}

/// Runs hotkey actions against the audio façade.
pub struct MuteController<B, I, C, V = NoIndicator> {
    control: AudioControl<B, I, C>,
    indicator: V,
}

impl<B, I, C> MuteController<B, I, C, NoIndicator>
where
    B: AudioBackend,
    I: ProcessInspector,
    C: ConfigProvider,
{
    pub fn new(control: AudioControl<B, I, C>) -> Self {
        Self::with_indicator(control, NoIndicator)
    }
}

impl<B, I, C, V> MuteController<B, I, C, V>
where
    B: AudioBackend,
    I: ProcessInspector,
    C: ConfigProvider,
    V: VolumeIndicator,
{
    pub fn with_indicator(control: AudioControl<B, I, C>, indicator: V) -> Self {
        Self { control, indicator }
    }

    pub fn control(&self) -> &AudioControl<B, I, C> {
        &self.control
    }

    /// Apply `action` to the audio of foreground process `pid`.
    pub fn handle(&self, pid: u32, action: HotkeyAction) -> ActionOutcome {
        let config = self.control.policy().config();
        let executable = self.control.executable_name(pid);
        info!("{:?} for pid {} ({})", action, pid, executable);

        let (tier, criterion, affected) = match config.targeting() {
            Targeting::PidThenName => {
                let by_pid = MatchCriterion::ByProcessId(pid);
                let affected = self.run(action, &by_pid);
                if affected == 0 {
                    debug!("No session for pid {}, trying {}", pid, executable);
                    self.by_name(action, &executable)
                } else {
                    (MatchTier::ProcessId, by_pid, affected)
                }
            }
            Targeting::NameOnly => self.by_name(action, &executable),
        };

        let volume = if action.is_volume_change() && affected > 0 && config.show_volume_indicator()
        {
            self.control.read_volume(&criterion)
        } else {
            None
        };
        if let Some(level) = volume {
            self.indicator.show_volume(&executable, level * 100.0);
        }

        ActionOutcome {
            executable,
            tier,
            affected,
            volume,
        }
    }

    fn by_name(&self, action: HotkeyAction, name: &str) -> (MatchTier, MatchCriterion, usize) {
        let criterion = MatchCriterion::by_name(name);
        let affected = self.run(action, &criterion);
        (MatchTier::ExecutableName, criterion, affected)
    }

    fn run(&self, action: HotkeyAction, criterion: &MatchCriterion) -> usize {
        let step = self.control.policy().config().volume_step_percent();
        match action {
            HotkeyAction::ToggleMute => self.control.toggle_mute(criterion),
            HotkeyAction::VolumeUp => self.control.adjust_volume(criterion, step),
            HotkeyAction::VolumeDown => self.control.adjust_volume(criterion, -step),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{MemoryBackend, MemoryDevice, MemorySession};
    use crate::config::Settings;
    use crate::platform::{ProcessTable, PACKAGED_APP_HOST};
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingIndicator {
        shown: RefCell<Vec<(String, f32)>>,
    }

    impl VolumeIndicator for RecordingIndicator {
        fn show_volume(&self, process_name: &str, percent: f32) {
            self.shown
                .borrow_mut()
                .push((process_name.to_string(), percent));
        }
    }

    fn table() -> ProcessTable {
        ProcessTable::new()
            .with_process(100, "game.exe")
            .with_process(101, "game.exe")
            .with_process(300, "launcher.exe")
    }

    fn controller<'a>(
        backend: MemoryBackend,
        settings: Settings,
        indicator: &'a RecordingIndicator,
    ) -> MuteController<MemoryBackend, ProcessTable, Settings, &'a RecordingIndicator> {
        MuteController::with_indicator(AudioControl::new(backend, table(), settings), indicator)
    }

    #[test]
    fn test_pid_tier_wins_when_it_matches() {
        let own = MemorySession::new(100);
        let sibling = MemorySession::new(101);
        let backend = MemoryBackend::new().with_device(
            MemoryDevice::new("Speakers")
                .with_session(own.clone())
                .with_session(sibling.clone()),
        );
        let indicator = RecordingIndicator::default();
        let controller = controller(backend, Settings::default(), &indicator);

        let outcome = controller.handle(100, HotkeyAction::ToggleMute);
        assert_eq!(outcome.tier, MatchTier::ProcessId);
        assert_eq!(outcome.affected, 1);
        assert_eq!(outcome.executable, "game.exe");
        assert!(own.is_muted());
        assert!(!sibling.is_muted());
    }

    #[test]
    fn test_falls_back_to_name_when_pid_has_no_session() {
        let child = MemorySession::new(101);
        let backend = MemoryBackend::new()
            .with_device(MemoryDevice::new("Speakers").with_session(child.clone()));
        let indicator = RecordingIndicator::default();
        let controller = controller(backend, Settings::default(), &indicator);

        let outcome = controller.handle(100, HotkeyAction::ToggleMute);
        assert_eq!(outcome.tier, MatchTier::ExecutableName);
        assert_eq!(outcome.affected, 1);
        assert!(child.is_muted());
    }

    #[test]
    fn test_name_only_targeting_skips_pid_tier() {
        let own = MemorySession::new(100);
        let sibling = MemorySession::new(101);
        let backend = MemoryBackend::new().with_device(
            MemoryDevice::new("Speakers")
                .with_session(own.clone())
                .with_session(sibling.clone()),
        );
        let settings = Settings {
            main_process_only: false,
            ..Settings::default()
        };
        let indicator = RecordingIndicator::default();
        let controller = controller(backend, settings, &indicator);

        let outcome = controller.handle(100, HotkeyAction::ToggleMute);
        assert_eq!(outcome.tier, MatchTier::ExecutableName);
        assert_eq!(outcome.affected, 2);
        assert!(own.is_muted() && sibling.is_muted());
    }

    #[test]
    fn test_volume_step_and_indicator() {
        let session = MemorySession::new(100).volume_level(0.5);
        let backend = MemoryBackend::new()
            .with_device(MemoryDevice::new("Speakers").with_session(session.clone()));
        let settings = Settings {
            volume_step_percent: 25.0,
            ..Settings::default()
        };
        let indicator = RecordingIndicator::default();
        let controller = controller(backend, settings, &indicator);

        let outcome = controller.handle(100, HotkeyAction::VolumeUp);
        assert_eq!(outcome.affected, 1);
        assert_eq!(outcome.volume, Some(0.75));
        assert_eq!(session.level(), 0.75);

        let outcome = controller.handle(100, HotkeyAction::VolumeDown);
        assert_eq!(outcome.volume, Some(0.5));

        assert_eq!(
            *indicator.shown.borrow(),
            vec![("game.exe".to_string(), 75.0), ("game.exe".to_string(), 50.0)]
        );
    }

    #[test]
    fn test_indicator_not_fed_when_disabled_or_nothing_changed() {
        let session = MemorySession::new(100).volume_level(0.5);
        let backend = MemoryBackend::new()
            .with_device(MemoryDevice::new("Speakers").with_session(session.clone()));
        let settings = Settings {
            show_volume_indicator: false,
            ..Settings::default()
        };
        let indicator = RecordingIndicator::default();
        let controller = controller(backend, settings, &indicator);

        let outcome = controller.handle(100, HotkeyAction::VolumeUp);
        assert_eq!(outcome.affected, 1);
        assert_eq!(outcome.volume, None);

        let outcome = controller.handle(300, HotkeyAction::VolumeUp);
        assert_eq!(outcome.affected, 0);
        assert_eq!(outcome.tier, MatchTier::ExecutableName);
        assert!(indicator.shown.borrow().is_empty());
    }

    #[test]
    fn test_toggle_never_feeds_indicator() {
        let backend = MemoryBackend::new()
            .with_device(MemoryDevice::new("Speakers").with_session(MemorySession::new(100)));
        let indicator = RecordingIndicator::default();
        let controller = controller(backend, Settings::default(), &indicator);

        let outcome = controller.handle(100, HotkeyAction::ToggleMute);
        assert_eq!(outcome.volume, None);
        assert!(indicator.shown.borrow().is_empty());
    }

    #[test]
    fn test_packaged_app_name_used_for_fallback() {
        let app = MemorySession::new(500);
        let backend = MemoryBackend::new()
            .with_device(MemoryDevice::new("Speakers").with_session(app.clone()));
        let inspector = ProcessTable::new()
            .with_process(400, PACKAGED_APP_HOST)
            .with_process(500, "Spotify.exe")
            .with_foreground_children([400, 500]);
        let controller =
            MuteController::new(AudioControl::new(backend, inspector, Settings::default()));

        let outcome = controller.handle(400, HotkeyAction::ToggleMute);
        assert_eq!(outcome.executable, "Spotify.exe");
        assert_eq!(outcome.tier, MatchTier::ExecutableName);
        assert_eq!(outcome.affected, 1);
        assert!(app.is_muted());
    }
}
