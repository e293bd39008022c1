//! Locale service seam and its chrono-backed implementation

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Locale, Timelike, Utc};
use chrono_tz::Tz;
use std::fmt::{self, Write as _};
use thiserror::Error;
use tracing::debug;

use super::{ldml, patterns};

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("unknown locale '{0}'")]
    UnknownLocale(String),

    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("unsupported pattern field '{field}' in '{pattern}'")]
    UnsupportedField { field: String, pattern: String },

    #[error("no best-fit pattern for skeleton '{0}'")]
    UnsupportedSkeleton(String),

    #[error("formatting failed for pattern '{0}'")]
    Format(String),
}

/// Chooses locale-appropriate patterns for skeletons
pub trait PatternGenerator {
    fn best_pattern(&self, skeleton: &str) -> Result<String, FormatError>;
}

/// A date formatter bound to a locale, timezone and pattern
pub trait DateFormat {
    fn format(&self, instant: DateTime<Utc>) -> Result<String, FormatError>;

    /// The LDML pattern this formatter was built from
    fn pattern(&self) -> &str;

    /// Hour of `instant` in the formatter's timezone (0-23)
    fn local_hour(&self, instant: DateTime<Utc>) -> u32;
}

/// Factory for generators and formatters
pub trait LocaleService {
    fn generator(&self, locale_id: &str) -> Result<Box<dyn PatternGenerator>, FormatError>;

    fn formatter(
        &self,
        locale_id: &str,
        timezone_id: &str,
        pattern: &str,
    ) -> Result<Box<dyn DateFormat>, FormatError>;
}

/// Locale service backed by chrono's locale tables, chrono-tz and the best-fit pattern table
#[derive(Debug, Default, Clone, Copy)]
pub struct ChronoLocaleService;

impl LocaleService for ChronoLocaleService {
    fn generator(&self, locale_id: &str) -> Result<Box<dyn PatternGenerator>, FormatError> {
        if locale_id.is_empty() {
            return Err(FormatError::UnknownLocale(locale_id.to_string()));
        }
        let table = patterns::lookup(locale_id);
        debug!(locale = locale_id, table = table.locale, "Pattern generator created");
        Ok(Box::new(TableGenerator { table }))
    }

    fn formatter(
        &self,
        locale_id: &str,
        timezone_id: &str,
        pattern: &str,
    ) -> Result<Box<dyn DateFormat>, FormatError> {
        let locale = chrono_locale(locale_id)?;
        let tz: Tz = timezone_id
            .parse()
            .map_err(|_| FormatError::UnknownTimezone(timezone_id.to_string()))?;

        let strftime = ldml::to_strftime(pattern)?;
        if StrftimeItems::new(&strftime).any(|item| matches!(item, Item::Error)) {
            return Err(FormatError::Format(pattern.to_string()));
        }

        Ok(Box::new(ChronoFormatter {
            locale,
            tz,
            pattern: pattern.to_string(),
            strftime,
        }))
    }
}

/// chrono locale for an `ll_CC` id; ids chrono does not know use POSIX names
fn chrono_locale(locale_id: &str) -> Result<Locale, FormatError> {
    if locale_id.is_empty() {
        return Err(FormatError::UnknownLocale(locale_id.to_string()));
    }
    Ok(Locale::try_from(locale_id).unwrap_or_else(|_| {
        debug!(locale = locale_id, "chrono has no tables for locale, using POSIX names");
        Locale::POSIX
    }))
}

struct TableGenerator {
    table: &'static patterns::LocalePatterns,
}

impl PatternGenerator for TableGenerator {
    fn best_pattern(&self, skeleton: &str) -> Result<String, FormatError> {
        patterns::classify(skeleton)
            .map(|kind| self.table.best(kind).to_string())
            .ok_or_else(|| FormatError::UnsupportedSkeleton(skeleton.to_string()))
    }
}

#[derive(Debug)]
pub struct ChronoFormatter {
    locale: Locale,
    tz: Tz,
    pattern: String,
    strftime: String,
}

impl DateFormat for ChronoFormatter {
    fn format(&self, instant: DateTime<Utc>) -> Result<String, FormatError> {
        let local = instant.with_timezone(&self.tz);
        let mut out = String::new();
        write!(out, "{}", local.format_localized(&self.strftime, self.locale))
            .map_err(|_: fmt::Error| FormatError::Format(self.pattern.clone()))?;
        Ok(out)
    }

    fn pattern(&self) -> &str {
        &self.pattern
    }

    fn local_hour(&self, instant: DateTime<Utc>) -> u32 {
        instant.with_timezone(&self.tz).hour()
    }
}
