#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use micmute::{logging, LaunchArgs};
use std::process::ExitCode;
use tracing::{error, warn};

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let thread = std::thread::current();
        error!(
            thread = thread.name().unwrap_or("unnamed"),
            panic = %info,
            "Unhandled panic"
        );
        #[cfg(windows)]
        micmute::ui::report_fatal_panic(&info.to_string());
        previous(info);
    }));
}

#[cfg(windows)]
fn main() -> ExitCode {
    use micmute::audio::ComGuard;
    use micmute::instance::{
        forward_to_primary, SingletonCoordinator, Win32EventProvider, INSTANCE_EVENT_NAME,
    };
    use micmute::ui::{self, LaunchOptions};
    use std::time::Instant;
    use tracing::info;

    let started_at = Instant::now();
    let args = LaunchArgs::parse(std::env::args().skip(1));
    let _log_guard = logging::init(logging::default_logs_dir().as_deref());
    install_panic_hook();

    for argument in &args.unknown {
        warn!(argument, "Ignoring unknown argument");
    }

    let acquired = SingletonCoordinator::acquire(&Win32EventProvider, INSTANCE_EVENT_NAME);
    let coordinator = match acquired {
        Ok(coordinator) => coordinator,
        Err(e) => {
            error!(error = %e, "Single-instance check failed");
            ui::show_error(&format!("MicMute could not start.\n\n{e}"));
            return ExitCode::FAILURE;
        }
    };

    if forward_to_primary(&coordinator, &args) {
        return ExitCode::SUCCESS;
    }

    let _com = ComGuard::new()
        .map_err(|e| warn!(error = %e, "COM initialization failed; audio will be unavailable"))
        .ok();

    let options = LaunchOptions {
        show_requested: args.show,
        started_at,
    };

    match ui::run(options) {
        Ok(()) => {
            info!("MicMute exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = ?e, "Startup failed");
            ui::show_error(&format!("MicMute could not start.\n\n{e:#}"));
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(windows))]
fn main() -> ExitCode {
    let args = LaunchArgs::parse(std::env::args().skip(1));
    let _log_guard = logging::init(None);
    install_panic_hook();

    if !args.unknown.is_empty() {
        warn!(arguments = ?args.unknown, "Ignoring unknown arguments");
    }
    error!("MicMute needs the Windows audio and hotkey APIs and cannot run on this platform");
    ExitCode::FAILURE
}
