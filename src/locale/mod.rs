//! Locale context and formatter management
//!
//! - **service**: locale service seam (pattern generator + date formatter) and its chrono backend
//! - **patterns**: best-fit pattern table per locale
//! - **ldml**: LDML pattern → strftime translation
//! - **formatters**: formatter set construction with per-locale overrides, and its manager

pub mod formatters;
pub mod ldml;
pub mod patterns;
pub mod service;

pub use formatters::{FormatterManager, FormatterSet};
pub use service::{ChronoLocaleService, DateFormat, FormatError, LocaleService, PatternGenerator};

use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::platform::PlatformSnapshot;

/// Locale used when the platform reports none
pub const FALLBACK_LOCALE: &str = "en_US";

/// Timezone used when the platform reports none or an unknown one
pub const FALLBACK_TIMEZONE: &str = "UTC";

/// Locale inputs of a formatter set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleContext {
    pub locale_id: String,
    pub timezone_id: String,
    pub is_24_hour: bool,
}

impl Default for LocaleContext {
    fn default() -> Self {
        Self {
            locale_id: FALLBACK_LOCALE.to_string(),
            timezone_id: FALLBACK_TIMEZONE.to_string(),
            is_24_hour: false,
        }
    }
}

impl LocaleContext {
    /// Build a context from a platform snapshot, substituting fallbacks for missing values
    pub fn resolve(snapshot: &PlatformSnapshot) -> Self {
        let locale_id = match snapshot.locale.as_deref().and_then(normalize_locale) {
            Some(id) => id,
            None => {
                debug!(raw = ?snapshot.locale, fallback = FALLBACK_LOCALE, "No usable locale, using fallback");
                FALLBACK_LOCALE.to_string()
            }
        };

        let timezone_id = match snapshot.timezone.as_deref().map(str::trim) {
            Some(tz) if !tz.is_empty() => {
                if tz.parse::<Tz>().is_ok() {
                    tz.to_string()
                } else {
                    warn!(timezone = tz, fallback = FALLBACK_TIMEZONE, "Unknown timezone, using fallback");
                    FALLBACK_TIMEZONE.to_string()
                }
            }
            _ => FALLBACK_TIMEZONE.to_string(),
        };

        Self {
            locale_id,
            timezone_id,
            is_24_hour: snapshot.time_24h.unwrap_or(false),
        }
    }
}

/// Reduce a POSIX locale value (`ko_KR.UTF-8@euro`) to its `ll_CC` id
/// `C`, `POSIX` and empty values yield `None`
pub fn normalize_locale(raw: &str) -> Option<String> {
    let base = raw.trim();
    let base = base.split('@').next().unwrap_or(base);
    let base = base.split('.').next().unwrap_or(base);
    let base = base.replace('-', "_");

    match base.as_str() {
        "" | "C" | "POSIX" => None,
        _ => Some(base),
    }
}
