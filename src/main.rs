#![forbid(unsafe_code)]

mod app;
mod capture;
mod config;
mod constants;
mod daemon;
mod event_loop;
mod ipc;
mod locale;
mod platform;
mod render;
mod scheduler;
mod settings;
mod surface;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use config::DaemonConfig;
use constants::operation;
use ipc::{ClockClient, ClockRequest, ClockResponse};
use platform::DisplayState;

#[derive(Parser)]
#[command(name = "idle-clock-digital")]
#[command(version)]
#[command(about = "Digital watchface clock daemon", long_about = None)]
struct Cli {
    /// Config file (defaults to the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Socket path override
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the clock daemon in the foreground
    Run,

    /// Ask the daemon for a snapshot and print the dump path
    Capture {
        #[arg(long, value_enum)]
        target: Option<TargetArg>,
    },

    /// Open the clock window
    Main,

    /// Send a settings-result XML document
    Settings {
        /// File containing the document
        file: PathBuf,
    },

    /// Report a display power state change
    Display {
        #[arg(value_enum)]
        state: DisplayArg,
    },

    /// Check that the daemon is alive
    Ping,

    /// Stop the daemon
    Shutdown,
}

#[derive(Clone, Copy, ValueEnum)]
enum TargetArg {
    Offscreen,
    Minicontrol,
    Window,
}

impl TargetArg {
    fn as_extra(self) -> &'static str {
        match self {
            TargetArg::Offscreen => "offscreen",
            TargetArg::Minicontrol => "minicontrol",
            TargetArg::Window => "window",
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DisplayArg {
    Normal,
    Dim,
    Off,
}

impl From<DisplayArg> for DisplayState {
    fn from(arg: DisplayArg) -> Self {
        match arg {
            DisplayArg::Normal => DisplayState::Normal,
            DisplayArg::Dim => DisplayState::Dim,
            DisplayArg::Off => DisplayState::ScreenOff,
        }
    }
}

fn parse_level(level: &str) -> TraceLevel {
    match level.to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

fn init_logging(config_level: &str) -> Result<()> {
    // LOG_LEVEL takes precedence over the config file
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| config_level.to_string());

    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(&level))
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")
}

fn app_control(op: &str, extra: HashMap<String, String>) -> ClockRequest {
    ClockRequest::AppControl {
        operation: op.to_string(),
        extra,
    }
}

fn send(config: &DaemonConfig, socket: Option<PathBuf>, request: ClockRequest) -> Result<ClockResponse> {
    let path = match socket {
        Some(path) => path,
        None => config.socket_path()?,
    };
    let mut client = ClockClient::connect_to(&path)?;
    // Leave the daemon room to answer with its own timeout error first
    client.set_timeout(Duration::from_millis(config.reply_timeout_ms) + Duration::from_secs(1))?;
    client.request(request)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = DaemonConfig::load(cli.config.as_deref())?;
    init_logging(&config.log_level)?;

    let request = match cli.command {
        Commands::Run => {
            info!(config = ?config, "Starting idle-clock-digital");
            return daemon::run(config, cli.socket);
        }
        Commands::Capture { target } => {
            let mut extra = HashMap::new();
            if let Some(target) = target {
                extra.insert(operation::EXTRA_TARGET.to_string(), target.as_extra().to_string());
            }
            app_control(operation::CAPTURE, extra)
        }
        Commands::Main => app_control(operation::MAIN, HashMap::new()),
        Commands::Settings { file } => {
            let xml = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read settings result: {}", file.display()))?;
            let mut extra = HashMap::new();
            extra.insert(operation::EXTRA_RESULT_XML.to_string(), xml);
            app_control(operation::REMOTE_SETTINGS, extra)
        }
        Commands::Display { state } => ClockRequest::DisplayState(state.into()),
        Commands::Ping => ClockRequest::Ping,
        Commands::Shutdown => ClockRequest::Shutdown,
    };

    match send(&config, cli.socket, request)? {
        ClockResponse::Reply { result: Some(path), .. } => println!("{path}"),
        ClockResponse::Reply { result: None, .. } => println!("ok"),
        ClockResponse::Pong => println!("pong"),
        ClockResponse::Ready => println!("ok"),
        ClockResponse::Error(message) => bail!("Daemon error: {}", message),
    }
    Ok(())
}
