//! `maw` - mute or step the volume of the focused application from a
//! terminal or a hotkey launcher.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use maw_rs::{
    logging, platform, system_control, HotkeyAction, MuteController, Settings, SharedSettings,
    VolumeIndicator,
};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "maw", version)]
#[command(about = "Mute or adjust the volume of the focused application", long_about = None)]
struct Cli {
    /// Settings file to use instead of the per-user one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Toggle mute
    Toggle(Target),

    /// Raise the volume by one step
    Up(Step),

    /// Lower the volume by one step
    Down(Step),

    /// Print the average volume
    Volume(Target),

    /// Print the executable name used for a process
    Resolve(Focus),

    /// List active render devices
    Devices,
}

#[derive(Args)]
struct Focus {
    /// Process id to act on instead of the foreground window's owner
    #[arg(long)]
    pid: Option<u32>,

    /// Wait this long before reading the foreground window
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,
}

#[derive(Args)]
struct Target {
    #[command(flatten)]
    focus: Focus,

    /// Executable name to act on, e.g. `game.exe`
    #[arg(long, conflicts_with = "pid")]
    exe: Option<String>,
}

#[derive(Args)]
struct Step {
    #[command(flatten)]
    target: Target,

    /// Step size in percent, overriding the settings
    #[arg(long)]
    step: Option<f32>,
}

/// Prints the reading a volume indicator would show.
struct ConsoleIndicator;

impl VolumeIndicator for ConsoleIndicator {
    fn show_volume(&self, process_name: &str, percent: f32) {
        println!("{}: {:.0}%", process_name, percent);
    }
}

impl Focus {
    fn resolve_pid(&self) -> Result<u32> {
        if let Some(pid) = self.pid {
            return Ok(pid);
        }
        if self.delay_ms > 0 {
            thread::sleep(Duration::from_millis(self.delay_ms));
        }
        platform::foreground_pid().context("No foreground window to act on")
    }
}

fn load_settings(path: Option<PathBuf>) -> Result<Settings> {
    let path = match path {
        Some(path) => path,
        None => Settings::default_path()?,
    };
    Settings::load(&path).with_context(|| format!("Loading settings from {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config)?;
    if let Command::Up(Step { step: Some(step), .. }) | Command::Down(Step { step: Some(step), .. }) =
        &cli.command
    {
        settings.volume_step_percent = *step;
        settings.validate().context("Invalid --step")?;
    }
    logging::init(&settings).context("Failed to initialize logging")?;

    let controller = MuteController::with_indicator(
        system_control(SharedSettings::new(settings)),
        ConsoleIndicator,
    );

    match cli.command {
        Command::Toggle(target) => act(&controller, target, HotkeyAction::ToggleMute),
        Command::Up(step) => act(&controller, step.target, HotkeyAction::VolumeUp),
        Command::Down(step) => act(&controller, step.target, HotkeyAction::VolumeDown),
        Command::Volume(target) => {
            let control = controller.control();
            let reading = match &target.exe {
                Some(exe) => control.get_volume_by_exe_name(exe),
                None => control.get_volume_by_pid(target.focus.resolve_pid()?),
            };
            match reading {
                Some(level) => println!("{:.0}%", level * 100.0),
                None => bail!("No matching audio session"),
            }
            Ok(())
        }
        Command::Resolve(focus) => {
            let pid = focus.resolve_pid()?;
            println!("{}", controller.control().executable_name(pid));
            Ok(())
        }
        Command::Devices => {
            for device in controller.control().devices() {
                if device.is_excluded {
                    println!("{} (excluded)", device.name);
                } else {
                    println!("{}", device.name);
                }
            }
            Ok(())
        }
    }
}

fn act<B, I, C, V>(
    controller: &MuteController<B, I, C, V>,
    target: Target,
    action: HotkeyAction,
) -> Result<()>
where
    B: maw_rs::AudioBackend,
    I: maw_rs::ProcessInspector,
    C: maw_rs::ConfigProvider,
    V: VolumeIndicator,
{
    if let Some(exe) = &target.exe {
        let control = controller.control();
        let step = control.policy().config().volume_step_percent();
        let affected = match action {
            HotkeyAction::ToggleMute => control.toggle_mute_by_exe_name(exe),
            HotkeyAction::VolumeUp => control.increase_volume_by_exe_name(exe, step),
            HotkeyAction::VolumeDown => control.decrease_volume_by_exe_name(exe, step),
        };
        println!("{} session(s) changed", affected);
        return Ok(());
    }

    let pid = target.focus.resolve_pid()?;
    let outcome = controller.handle(pid, action);
    println!(
        "{}: {} session(s) changed by {:?}",
        outcome.executable, outcome.affected, outcome.tier
    );
    Ok(())
}
