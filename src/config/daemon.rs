//! Daemon configuration
//!
//! Loaded once at startup from `config.json` in the user's config directory.
//! Missing fields take their defaults; out-of-range values are clamped with a warning.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::{face, package, paths, validation};

/// Immutable daemon settings (loaded once at startup)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Socket path override (defaults to XDG_RUNTIME_DIR)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<PathBuf>,

    /// Directory capture dumps are written to
    #[serde(default = "default_dump_dir")]
    pub dump_dir: PathBuf,

    /// Directory holding preferences and the system settings file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    /// TrueType font used for rasterized captures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,

    /// Exit once an off-screen capture has been delivered and no window was requested
    #[serde(default = "default_exit_after_offscreen_capture")]
    pub exit_after_offscreen_capture: bool,

    /// How often the platform watcher samples locale/timezone/clock state
    #[serde(default = "default_platform_poll_interval_ms")]
    pub platform_poll_interval_ms: u64,

    /// How long a client waits for a capture reply
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_dump_dir() -> PathBuf {
    PathBuf::from(paths::DUMP_DIR)
}

fn default_window_width() -> u32 {
    face::WIN_WIDTH
}

fn default_window_height() -> u32 {
    face::WIN_HEIGHT
}

fn default_exit_after_offscreen_capture() -> bool {
    true
}

fn default_platform_poll_interval_ms() -> u64 {
    1000
}

fn default_reply_timeout_ms() -> u64 {
    5000
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            socket_path: None,
            dump_dir: default_dump_dir(),
            data_dir: None,
            window_width: default_window_width(),
            window_height: default_window_height(),
            font_path: None,
            exit_after_offscreen_capture: default_exit_after_offscreen_capture(),
            platform_poll_interval_ms: default_platform_poll_interval_ms(),
            reply_timeout_ms: default_reply_timeout_ms(),
        }
    }
}

impl DaemonConfig {
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(package::APP_DIR);
        path.push(paths::CONFIG_FILENAME);
        path
    }

    /// Load config from `path` (or the default location)
    /// A missing file is not an error: defaults are used
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);

        let mut config = match fs::read_to_string(&config_path) {
            Ok(contents) => {
                info!(path = %config_path.display(), "Loading daemon config");
                Self::from_json(&contents)
                    .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %config_path.display(), "No config file found, using defaults");
                Self::default()
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read config file: {}", config_path.display()));
            }
        };

        config.apply_env_overrides();
        config.validate_and_clamp();
        Ok(config)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let mut config: Self =
            serde_json::from_str(contents).context("Invalid daemon config JSON")?;
        config.validate_and_clamp();
        Ok(config)
    }

    /// Directory for preferences and the system settings file
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(package::APP_DIR);
        path
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir().join(paths::PREFERENCES_FILENAME)
    }

    pub fn system_settings_path(&self) -> PathBuf {
        self.data_dir().join(paths::SYSTEM_SETTINGS_FILENAME)
    }

    /// Resolved socket path (explicit override or runtime-dir default)
    pub fn socket_path(&self) -> Result<PathBuf> {
        match &self.socket_path {
            Some(path) => Ok(path.clone()),
            None => crate::ipc::default_socket_path(),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = env::var("IDLE_CLOCK_DUMP_DIR") {
            info!(dump_dir = %dir, "Using dump directory from IDLE_CLOCK_DUMP_DIR");
            self.dump_dir = PathBuf::from(dir);
        }
        if let Ok(font) = env::var("IDLE_CLOCK_FONT") {
            info!(font_path = %font, "Using font from IDLE_CLOCK_FONT");
            self.font_path = Some(PathBuf::from(font));
        }
    }

    /// Validate and clamp config values to safe ranges
    fn validate_and_clamp(&mut self) {
        use validation::*;

        let (width, height) = (self.window_width, self.window_height);
        self.window_width = clamp_logged("window_width", width, MIN_DIMENSION, MAX_DIMENSION);
        self.window_height = clamp_logged("window_height", height, MIN_DIMENSION, MAX_DIMENSION);

        let poll = self.platform_poll_interval_ms;
        self.platform_poll_interval_ms =
            clamp_logged("platform_poll_interval_ms", poll, MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS);

        let timeout = self.reply_timeout_ms;
        self.reply_timeout_ms =
            clamp_logged("reply_timeout_ms", timeout, MIN_REPLY_TIMEOUT_MS, MAX_REPLY_TIMEOUT_MS);

        if !matches!(
            self.log_level.to_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            warn!(log_level = %self.log_level, "Unknown log_level, using info");
            self.log_level = default_log_level();
        }
    }
}

fn clamp_logged<T: PartialOrd + Copy + std::fmt::Display>(name: &str, value: T, min: T, max: T) -> T {
    if value < min {
        warn!(field = name, value = %value, min = %min, "Value below minimum, clamping");
        min
    } else if value > max {
        warn!(field = name, value = %value, max = %max, "Value exceeds maximum, clamping");
        max
    } else {
        value
    }
}
