//! Clock daemon: wires the event sources to the app and runs the event loop

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::app::{App, AppEvent, AppOptions};
use crate::config::{DaemonConfig, FilePreferences};
use crate::constants::timing;
use crate::event_loop::SystemClock;
use crate::ipc::{spawn_ipc_listener, ClockServer};
use crate::locale::ChronoLocaleService;
use crate::platform::{spawn_watcher, EnvPlatform};
use crate::surface::FontRenderer;

/// Run the daemon until shutdown, a terminating capture or auto-close
pub fn run(config: DaemonConfig, socket_override: Option<PathBuf>) -> Result<()> {
    let socket_path = match socket_override {
        Some(path) => path,
        None => config.socket_path()?,
    };

    let (tx, rx) = mpsc::channel();

    let server = ClockServer::bind_to(socket_path).context("Failed to start IPC server")?;
    info!(socket = %server.path().display(), "Clock daemon listening");
    let _ipc = spawn_ipc_listener(server, tx.clone(), Duration::from_millis(config.reply_timeout_ms));

    let platform = EnvPlatform::new(config.system_settings_path());
    let _watcher = spawn_watcher(
        platform.clone(),
        Duration::from_millis(config.platform_poll_interval_ms),
        tx.clone(),
    );

    #[cfg(unix)]
    spawn_signal_listener(tx.clone()).context("Failed to install signal handlers")?;
    drop(tx);

    let font = FontRenderer::from_system_font(config.font_path.as_deref())
        .inspect_err(|e| warn!(error = %e, "No font for captures, dumps will be blank"))
        .ok();

    let preferences = FilePreferences::open(config.preferences_path());
    info!(path = %preferences.path().display(), "Preference store opened");

    let mut app = App::new(
        Box::new(platform),
        Box::new(preferences),
        Box::new(ChronoLocaleService),
        Box::new(SystemClock),
        font,
        AppOptions {
            dump_dir: config.dump_dir.clone(),
            window_width: config.window_width,
            window_height: config.window_height,
            exit_after_offscreen_capture: config.exit_after_offscreen_capture,
        },
    );

    app.start(Instant::now());
    run_loop(&mut app, &rx);
    app.teardown();
    info!("Clock daemon stopped");
    Ok(())
}

/// Dispatch timers, inbound events and idle work until the app asks to exit
pub fn run_loop(app: &mut App, rx: &mpsc::Receiver<AppEvent>) {
    while !app.should_exit() {
        let now = Instant::now();
        for event in app.due_timers(now) {
            app.handle(event, now);
        }
        if app.should_exit() {
            break;
        }

        // Drain whatever is already queued before running idle work
        match rx.try_recv() {
            Ok(event) => {
                app.handle(event, Instant::now());
                continue;
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => {
                warn!("All event sources gone, stopping");
                break;
            }
        }

        if let Some(idle) = app.next_idle() {
            app.handle(idle, Instant::now());
            continue;
        }

        let wait = app
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .unwrap_or(timing::MAX_LOOP_WAIT)
            .min(timing::MAX_LOOP_WAIT);

        match rx.recv_timeout(wait) {
            Ok(event) => app.handle(event, Instant::now()),
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                warn!("All event sources gone, stopping");
                break;
            }
        }
    }
}

/// Forward SIGINT/SIGTERM to the loop as a shutdown event
#[cfg(unix)]
fn spawn_signal_listener(tx: mpsc::Sender<AppEvent>) -> Result<()> {
    use signal_hook::consts::signal::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("Failed to register signal handlers")?;
    std::thread::spawn(move || {
        for signal in signals.forever() {
            info!(signal = signal, "Received termination signal");
            if tx.send(AppEvent::Shutdown).is_err() {
                debug!("Event loop gone, stopping signal listener");
                break;
            }
        }
        error!("Signal listener stopped");
    });
    Ok(())
}
