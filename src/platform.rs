//! Platform queries and change notifications
//!
//! Locale, timezone and the 24-hour preference come from (first match wins):
//! `IDLE_CLOCK_*` environment overrides, the system settings file, then the usual
//! POSIX sources (`LC_ALL`/`LC_TIME`/`LANG`, `TZ`, `/etc/timezone`, `/etc/localtime`).

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info, trace, warn};

use crate::app::AppEvent;
use crate::constants::{paths, timing};

/// Raw platform values; `None` means the query failed or returned nothing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformSnapshot {
    pub locale: Option<String>,
    pub timezone: Option<String>,
    pub time_24h: Option<bool>,
}

/// Display power state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayState {
    Normal,
    Dim,
    ScreenOff,
}

impl DisplayState {
    pub fn is_on(self) -> bool {
        !matches!(self, DisplayState::ScreenOff)
    }
}

pub trait Platform {
    fn snapshot(&self) -> PlatformSnapshot;
}

/// System settings file written by the device settings app
#[derive(Debug, Default, Deserialize)]
struct SystemSettings {
    #[serde(default)]
    locale: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    time_24h: Option<bool>,
}

/// Platform backed by the process environment and system files
#[derive(Debug, Clone)]
pub struct EnvPlatform {
    system_settings_path: PathBuf,
}

impl EnvPlatform {
    pub fn new(system_settings_path: PathBuf) -> Self {
        Self {
            system_settings_path,
        }
    }

    fn system_settings(&self) -> SystemSettings {
        match fs::read_to_string(&self.system_settings_path) {
            Ok(contents) => serde_json::from_str(&contents)
                .inspect_err(|e| {
                    warn!(path = %self.system_settings_path.display(), error = %e, "Ignoring unreadable system settings")
                })
                .unwrap_or_default(),
            Err(_) => SystemSettings::default(),
        }
    }
}

impl Platform for EnvPlatform {
    fn snapshot(&self) -> PlatformSnapshot {
        let system = self.system_settings();

        let locale = non_empty_env("IDLE_CLOCK_LOCALE")
            .or(system.locale.filter(|s| !s.trim().is_empty()))
            .or_else(|| non_empty_env("LC_ALL"))
            .or_else(|| non_empty_env("LC_TIME"))
            .or_else(|| non_empty_env("LANG"));

        let timezone = non_empty_env("IDLE_CLOCK_TIMEZONE")
            .or(system.timezone.filter(|s| !s.trim().is_empty()))
            .or_else(|| non_empty_env("TZ").map(|tz| tz.trim_start_matches(':').to_string()))
            .or_else(|| read_timezone_file(Path::new(paths::TIMEZONE_FILE)))
            .or_else(|| timezone_from_link(Path::new(paths::LOCALTIME_LINK)));

        let time_24h = non_empty_env("IDLE_CLOCK_24H")
            .and_then(|v| parse_bool(&v))
            .or(system.time_24h);

        PlatformSnapshot {
            locale,
            timezone,
            time_24h,
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            warn!(value = other, "Ignoring unrecognised boolean");
            None
        }
    }
}

fn read_timezone_file(path: &Path) -> Option<String> {
    let contents = fs::read_to_string(path).ok()?;
    let tz = contents.trim();
    (!tz.is_empty()).then(|| tz.to_string())
}

/// `/etc/localtime -> /usr/share/zoneinfo/Europe/Helsinki` gives `Europe/Helsinki`
fn timezone_from_link(path: &Path) -> Option<String> {
    let target = fs::read_link(path).ok()?;
    let target = target.to_string_lossy();
    target
        .split_once("zoneinfo/")
        .map(|(_, name)| name.to_string())
        .filter(|name| !name.is_empty())
}

/// Notifications implied by a change between two snapshots
pub fn diff_snapshots(old: &PlatformSnapshot, new: &PlatformSnapshot) -> Vec<AppEvent> {
    let mut events = Vec::new();
    if old.timezone != new.timezone {
        events.push(AppEvent::TimezoneChanged);
    }
    if old.locale != new.locale {
        events.push(AppEvent::LocaleChanged);
    }
    if old.time_24h != new.time_24h {
        events.push(AppEvent::TimeFormatChanged);
    }
    events
}

/// Wall clock moved by more than the threshold relative to the monotonic clock
fn clock_jumped(wall_elapsed: Option<Duration>, mono_elapsed: Duration) -> bool {
    match wall_elapsed {
        Some(wall) => {
            let drift = if wall > mono_elapsed { wall - mono_elapsed } else { mono_elapsed - wall };
            drift > timing::TIME_JUMP_THRESHOLD
        }
        // Wall clock went backwards
        None => true,
    }
}

/// Poll the platform and forward changes to the event loop
/// The thread exits once the receiving side is gone
pub fn spawn_watcher<P>(platform: P, interval: Duration, tx: Sender<AppEvent>) -> thread::JoinHandle<()>
where
    P: Platform + Send + 'static,
{
    thread::spawn(move || {
        info!(interval_ms = interval.as_millis() as u64, "Platform watcher started");
        let mut last = platform.snapshot();
        let mut wall_mark = SystemTime::now();
        let mut mono_mark = Instant::now();

        loop {
            thread::sleep(interval);

            let now_wall = SystemTime::now();
            let now_mono = Instant::now();
            let wall_elapsed = now_wall.duration_since(wall_mark).ok();
            let mut events = Vec::new();

            if clock_jumped(wall_elapsed, now_mono.duration_since(mono_mark)) {
                debug!("Wall clock jump detected");
                events.push(AppEvent::TimeChanged);
            }
            wall_mark = now_wall;
            mono_mark = now_mono;

            let current = platform.snapshot();
            events.extend(diff_snapshots(&last, &current));
            if current != last {
                info!(snapshot = ?current, "Platform settings changed");
            }
            last = current;

            for event in events {
                trace!(event = ?event, "Platform notification");
                if tx.send(event).is_err() {
                    debug!("Event loop gone, stopping platform watcher");
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(locale: &str, tz: &str, h24: bool) -> PlatformSnapshot {
        PlatformSnapshot {
            locale: Some(locale.to_string()),
            timezone: Some(tz.to_string()),
            time_24h: Some(h24),
        }
    }

    #[test]
    fn test_diff_reports_each_changed_field() {
        let old = snap("en_US", "UTC", false);
        assert!(diff_snapshots(&old, &old).is_empty());

        let events = diff_snapshots(&old, &snap("ko_KR", "Asia/Seoul", true));
        assert!(matches!(
            events.as_slice(),
            [AppEvent::TimezoneChanged, AppEvent::LocaleChanged, AppEvent::TimeFormatChanged]
        ));
    }

    #[test]
    fn test_clock_jump_detection() {
        let second = Duration::from_secs(1);
        assert!(!clock_jumped(Some(second), second));
        assert!(clock_jumped(Some(Duration::from_secs(3600)), second));
        assert!(clock_jumped(None, second));
    }

    #[test]
    fn test_system_settings_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system.json");
        fs::write(&path, r#"{"locale": "fi_FI", "timezone": "Europe/Helsinki", "time_24h": true}"#).unwrap();

        let system = EnvPlatform::new(path).system_settings();
        assert_eq!(system.locale.as_deref(), Some("fi_FI"));
        assert_eq!(system.timezone.as_deref(), Some("Europe/Helsinki"));
        assert_eq!(system.time_24h, Some(true));
    }

    #[test]
    fn test_timezone_from_link() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("localtime");
        std::os::unix::fs::symlink("/usr/share/zoneinfo/Europe/Helsinki", &link).unwrap();
        assert_eq!(timezone_from_link(&link).as_deref(), Some("Europe/Helsinki"));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("False"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
