//! Configuration management for idle-clock-digital
//!
//! - **daemon**: DaemonConfig loaded once at startup (JSON file + env overrides)
//! - **preferences**: key/value preference store shared with the settings app

pub mod daemon;
pub mod preferences;

// Re-export commonly used types
pub use daemon::DaemonConfig;
pub use preferences::{FilePreferences, PreferenceStore};
