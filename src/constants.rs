//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Package identity used in dump file names and the data directory
pub mod package {
    /// Platform package name (prefix of every dump file)
    pub const NAME: &str = "org.tizen.idle-clock-digital";

    /// Directory name under the user's config/data dirs
    pub const APP_DIR: &str = "idle-clock-digital";
}

/// Configuration and persistence file locations
pub mod paths {
    /// Daemon configuration file name
    pub const CONFIG_FILENAME: &str = "config.json";

    /// Preference store file name
    pub const PREFERENCES_FILENAME: &str = "preferences.json";

    /// System settings file read by the platform layer
    pub const SYSTEM_SETTINGS_FILENAME: &str = "system.json";

    /// Socket file name under the runtime dir
    pub const SOCKET_FILENAME: &str = "clock.sock";

    /// Directory capture dumps are written to
    pub const DUMP_DIR: &str = "/tmp";

    /// Suffix of the off-screen capture dump
    pub const DUMP_SUFFIX_OFFSCREEN: &str = "-dump_offscreen.png";

    /// Suffix of the mini-control capture dump
    pub const DUMP_SUFFIX_MINICONTROL: &str = "-dump_minicontrol.png";

    /// Timezone database link inspected when no timezone is configured
    pub const LOCALTIME_LINK: &str = "/etc/localtime";

    /// Plain-text timezone file used by some distributions
    pub const TIMEZONE_FILE: &str = "/etc/timezone";
}

/// Preference keys shared with the settings application
pub mod preference {
    /// Show-date flag (0/1)
    pub const SHOW_DATE: &str = "showdate";

    /// Clock font color palette index (1-12)
    pub const CLOCK_FONT_COLOR: &str = "clock_font_color";
}

/// App-control operations and extras understood by the daemon
pub mod operation {
    pub const MAIN: &str = "http://tizen.org/appcontrol/operation/main";
    pub const CAPTURE: &str = "http://tizen.org/appcontrol/operation/clock/capture";
    pub const REMOTE_SETTINGS: &str = "http://tizen.org/appcontrol/operation/remote_settings";

    /// Extra carrying the settings-result XML document
    pub const EXTRA_RESULT_XML: &str = "http://tizen.org/appcontrol/data/result_xml";

    /// Extra carrying the dump path in a capture reply
    pub const EXTRA_RESULT: &str = "result";

    /// Optional extra selecting the capture surface
    pub const EXTRA_TARGET: &str = "target";
}

/// Skeletons handed to the pattern generator
pub mod skeleton {
    pub const TIME_12: &str = "h:mm";
    pub const TIME_24: &str = "H:mm";
    pub const AMPM_ORDER: &str = "hhmm";
    pub const DATE: &str = "MMMEd";

    /// Formatter pattern that yields only the day period marker
    pub const AMPM_PATTERN: &str = "a";
}

/// Layout part names and theme signals of the clock face
pub mod layout {
    pub const PART_DATE: &str = "default_text_date";
    pub const PART_TIME: &str = "textblock_time";

    pub const SOURCE_DATE: &str = "source_default_text_date";
    pub const SOURCE_TEXT_DATE: &str = "source_text_date";
    pub const SOURCE_TIME: &str = "source_textblock_time";

    /// Prefix of the date color signal, completed with `_<palette index>`
    pub const SIGNAL_SHOW_DATE_PREFIX: &str = "show,default_text_date";
    pub const SIGNAL_HIDE_DATE: &str = "hide,text_date";
    pub const SIGNAL_TIME_DEFAULT: &str = "change,default";
    pub const SIGNAL_TIME_NO_DATE: &str = "change,no_data";
    pub const SIGNAL_SHOW_EFFECT: &str = "show_effect";
    pub const SIGNAL_HIDE_EFFECT: &str = "hide_effect";
}

/// Face geometry and typography
pub mod face {
    /// Default watchface width in pixels
    pub const WIN_WIDTH: u32 = 320;

    /// Default watchface height in pixels
    pub const WIN_HEIGHT: u32 = 320;

    /// Mini-control surface width in pixels
    pub const MINICONTROL_WIDTH: u32 = 384;

    /// Font family requested for the AM/PM span
    pub const FONT_FAMILY: &str = "Tizen:style=Bold";

    /// Default time font size
    pub const FONT_SIZE_TIME: f32 = 80.0;

    /// AM/PM span font size
    pub const FONT_SIZE_AMPM: u32 = 24;

    /// Date line font size
    pub const FONT_SIZE_DATE: f32 = 30.0;
}

/// Timer intervals of the event loop
pub mod timing {
    use std::time::Duration;

    /// Delay between the show transition and the capture flush
    pub const DRAWING_DELAY: Duration = Duration::from_millis(150);

    /// Settle delay after a language change notification
    pub const LANGUAGE_SETTLE_DELAY: Duration = Duration::from_secs(1);

    /// Auto-close delay after a background settings update
    pub const AUTO_CLOSE_DELAY: Duration = Duration::from_secs(3);

    /// Upper bound on a single event-loop wait
    pub const MAX_LOOP_WAIT: Duration = Duration::from_millis(500);

    /// Wall-clock jump that counts as a time change notification
    pub const TIME_JUMP_THRESHOLD: Duration = Duration::from_secs(2);
}

/// Validation ranges for configuration values
pub mod validation {
    pub const MIN_DIMENSION: u32 = 64;
    pub const MAX_DIMENSION: u32 = 4096;

    pub const MIN_POLL_INTERVAL_MS: u64 = 100;
    pub const MAX_POLL_INTERVAL_MS: u64 = 60_000;

    pub const MIN_REPLY_TIMEOUT_MS: u64 = 100;
    pub const MAX_REPLY_TIMEOUT_MS: u64 = 60_000;
}
