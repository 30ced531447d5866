//! End-to-end behavior of the façade and the hotkey controller against an
//! in-memory audio topology.

use maw_rs::audio::policy::ExclusionPolicy;
use maw_rs::audio::{MemoryBackend, MemoryDevice, MemorySession};
use maw_rs::platform::ProcessTable;
use maw_rs::{
    AudioControl, ConfigProvider, HotkeyAction, MatchTier, MuteController, Settings,
    SharedSettings,
};

fn processes() -> ProcessTable {
    ProcessTable::new()
        .with_process(5, "Discord.exe")
        .with_process(100, "game.exe")
        .with_process(101, "game.exe")
        .with_process(200, "game.exe")
}

#[test]
fn excluded_device_hides_its_sessions() {
    let speakers = MemorySession::new(100);
    let headset = MemorySession::new(200);
    let backend = MemoryBackend::new()
        .with_device(MemoryDevice::new("Speakers").with_session(speakers.clone()))
        .with_device(MemoryDevice::new("Headset (excluded)").with_session(headset.clone()));
    let mut settings = Settings::default();
    settings.add_excluded_device("Headset (excluded)");
    let control = AudioControl::new(backend, processes(), settings);

    assert_eq!(control.toggle_mute_by_exe_name("game.exe"), 1);
    assert!(speakers.is_muted());
    assert!(!headset.is_muted());

    let devices = control.devices();
    assert_eq!(devices.len(), 2);
    assert!(!devices[0].is_excluded);
    assert!(devices[1].is_excluded);
}

#[test]
fn excluded_process_never_matches() {
    let discord = MemorySession::new(5);
    let backend = MemoryBackend::new().with_device(
        MemoryDevice::new("Speakers")
            .with_session(discord.clone())
            .with_session(MemorySession::new(5)),
    );
    let mut settings = Settings::default();
    settings.set_excluded_processes(["discord"]);
    let control = AudioControl::new(backend, processes(), settings);

    assert_eq!(control.toggle_mute_by_exe_name("Discord.exe"), 0);
    assert_eq!(control.toggle_mute_by_pid(5), 0);
    assert_eq!(control.increase_volume_by_pid(5, 5.0), 0);
    assert_eq!(control.get_volume_by_exe_name("Discord.exe"), None);
    assert!(!discord.is_muted());
    assert_eq!(discord.write_count(), 0);
}

#[test]
fn exclusion_ignores_exe_suffix() {
    for configured in ["foo", "foo.exe", "FOO.EXE"] {
        let mut settings = Settings::default();
        settings.set_excluded_processes([configured]);
        let policy = ExclusionPolicy::new(&settings);
        assert!(policy.is_process_excluded("foo.exe"), "{configured}");
        assert_eq!(
            policy.is_process_excluded("foo.exe"),
            policy.is_process_excluded("foo")
        );
    }
}

#[test]
fn fallback_only_after_exact_zero() {
    // Two sessions for pid 100, one of which rejects writes: partial success.
    let own = MemorySession::new(100);
    let own_broken = MemorySession::new(100).failing_writes();
    let sibling = MemorySession::new(101);
    let backend = MemoryBackend::new().with_device(
        MemoryDevice::new("Speakers")
            .with_session(own.clone())
            .with_session(own_broken)
            .with_session(sibling.clone()),
    );
    let controller = MuteController::new(AudioControl::new(
        backend,
        processes(),
        Settings::default(),
    ));

    let outcome = controller.handle(100, HotkeyAction::ToggleMute);
    assert_eq!(outcome.tier, MatchTier::ProcessId);
    assert_eq!(outcome.affected, 1);
    assert!(own.is_muted());
    assert!(!sibling.is_muted());
}

#[test]
fn fallback_reaches_sessions_of_same_executable() {
    let sibling = MemorySession::new(101);
    let other = MemorySession::new(5);
    let backend = MemoryBackend::new().with_device(
        MemoryDevice::new("Speakers")
            .with_session(sibling.clone())
            .with_session(other.clone()),
    );
    let controller = MuteController::new(AudioControl::new(
        backend,
        processes(),
        Settings::default(),
    ));

    let outcome = controller.handle(100, HotkeyAction::ToggleMute);
    assert_eq!(outcome.tier, MatchTier::ExecutableName);
    assert_eq!(outcome.affected, 1);
    assert!(sibling.is_muted());
    assert!(!other.is_muted());
}

#[test]
fn average_volume_over_matching_sessions() {
    let backend = MemoryBackend::new()
        .with_device(
            MemoryDevice::new("Speakers")
                .with_session(MemorySession::new(100).volume_level(0.25))
                .with_session(MemorySession::new(101).volume_level(0.5)),
        )
        .with_device(
            MemoryDevice::new("Headphones")
                .with_session(MemorySession::new(200).volume_level(0.75))
                .with_session(MemorySession::new(5).volume_level(1.0)),
        );
    let control = AudioControl::new(backend, processes(), Settings::default());

    assert_eq!(control.get_volume_by_exe_name("GAME.EXE"), Some(0.5));
    assert_eq!(control.get_volume_by_pid(101), Some(0.5));
    assert_eq!(control.get_volume_by_exe_name("nothing.exe"), None);
}

#[test]
fn toggle_twice_restores_every_session() {
    let a = MemorySession::new(100).muted(true);
    let b = MemorySession::new(200);
    let backend = MemoryBackend::new()
        .with_device(MemoryDevice::new("Speakers").with_session(a.clone()))
        .with_device(MemoryDevice::new("Headphones").with_session(b.clone()));
    let control = AudioControl::new(backend, processes(), Settings::default());

    assert_eq!(control.toggle_mute_by_exe_name("game.exe"), 2);
    assert!(!a.is_muted() && b.is_muted());
    assert_eq!(control.toggle_mute_by_exe_name("game.exe"), 2);
    assert!(a.is_muted() && !b.is_muted());
}

#[test]
fn live_settings_change_between_calls() {
    let session = MemorySession::new(100).volume_level(0.5);
    let backend = MemoryBackend::new()
        .with_device(MemoryDevice::new("Speakers").with_session(session.clone()));
    let settings = SharedSettings::default();
    let controller = MuteController::new(AudioControl::new(
        backend,
        processes(),
        settings.clone(),
    ));

    controller.handle(100, HotkeyAction::VolumeDown);
    assert!((session.level() - 0.45).abs() < 1e-6);

    settings.update(|s| s.volume_step_percent = 50.0);
    assert_eq!(settings.volume_step_percent(), 50.0);
    controller.handle(100, HotkeyAction::VolumeDown);
    assert_eq!(session.level(), 0.0);
}
