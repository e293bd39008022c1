//! Formatter set construction and lifecycle
//!
//! A `FormatterSet` is built in one go from a `LocaleContext` and replaced as a whole.
//! Renders borrow an `Rc` to the current set, so they only ever see a complete set.

use std::rc::Rc;
use tracing::{debug, error, info};

use super::{DateFormat, LocaleContext, LocaleService, PatternGenerator};
use crate::constants::skeleton;

/// Locales whose 12-hour time is always `h:mm`
const FIXED_12H_LOCALES: &[&str] = &["da_DK", "mr_IN"];

/// Locales whose 24-hour time is always `HH:mm`
const FIXED_24H_LOCALES: &[&str] = &["id_ID", "da_DK", "mr_IN"];

/// 24-hour best fit that is replaced with `HH:mm`
const FIXED_24H_BEST_PATTERN: &str = "HH'h'mm";

const FIXED_12H_PATTERN: &str = "h:mm";
const FIXED_24H_PATTERN: &str = "HH:mm";

/// Date pattern overrides, keyed by locale
// Literal data; revalidate against the best-fit table when it changes.
const DATE_OVERRIDES: &[(&str, &str)] = &[("fi_FI", "ccc, d. MMM")];

/// Length of the `ll_CC` prefix compared by the override tables
const OVERRIDE_MATCH_LEN: usize = 5;

fn locale_matches(locale_id: &str, table: &[&str]) -> bool {
    let prefix = locale_id.get(..OVERRIDE_MATCH_LEN).unwrap_or(locale_id);
    table.iter().any(|&entry| entry == prefix)
}

/// Everything the render pass needs to format one frame
pub struct FormatterSet {
    pub locale_id: String,
    pub generator: Option<Box<dyn PatternGenerator>>,
    pub time_12: Option<Box<dyn DateFormat>>,
    pub time_ampm: Option<Box<dyn DateFormat>>,
    pub time_24: Option<Box<dyn DateFormat>>,
    pub date: Option<Box<dyn DateFormat>>,
    /// AM/PM marker goes before the time
    pub is_pre: bool,
}

impl std::fmt::Debug for FormatterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatterSet")
            .field("locale_id", &self.locale_id)
            .field("generator", &self.generator.is_some())
            .field("time_12", &self.time_12.as_ref().map(|fmt| fmt.pattern()))
            .field("time_ampm", &self.time_ampm.as_ref().map(|fmt| fmt.pattern()))
            .field("time_24", &self.time_24.as_ref().map(|fmt| fmt.pattern()))
            .field("date", &self.date.as_ref().map(|fmt| fmt.pattern()))
            .field("is_pre", &self.is_pre)
            .finish()
    }
}

impl FormatterSet {
    /// Set with every slot absent
    pub fn empty(locale_id: &str) -> Self {
        Self {
            locale_id: locale_id.to_string(),
            generator: None,
            time_12: None,
            time_ampm: None,
            time_24: None,
            date: None,
            is_pre: false,
        }
    }

    /// Build all formatters for `ctx`; failed steps leave their slot absent
    pub fn build(service: &dyn LocaleService, ctx: &LocaleContext) -> Self {
        let locale = ctx.locale_id.as_str();
        let tz = ctx.timezone_id.as_str();

        let generator = match service.generator(locale) {
            Ok(generator) => generator,
            Err(e) => {
                error!(locale = locale, error = %e, "Cannot create pattern generator");
                return Self::empty(locale);
            }
        };

        let make = |slot: &str, pattern: Option<String>| -> Option<Box<dyn DateFormat>> {
            let pattern = pattern?;
            service
                .formatter(locale, tz, &pattern)
                .inspect_err(|e| {
                    error!(slot = slot, locale = locale, pattern = %pattern, error = %e, "Cannot create formatter")
                })
                .ok()
        };

        let time_12 = make("time_12", twelve_hour_pattern(generator.as_ref(), locale));
        let time_24 = make("time_24", twenty_four_hour_pattern(generator.as_ref(), locale));
        let date = make("date", date_pattern(generator.as_ref(), locale));

        let is_pre = match generator.best_pattern(skeleton::AMPM_ORDER) {
            Ok(best) => best.starts_with('a'),
            Err(e) => {
                error!(locale = locale, error = %e, "Cannot resolve AM/PM position");
                false
            }
        };
        let time_ampm = make("time_ampm", Some(skeleton::AMPM_PATTERN.to_string()));

        let set = Self {
            locale_id: locale.to_string(),
            generator: Some(generator),
            time_12,
            time_ampm,
            time_24,
            date,
            is_pre,
        };
        info!(formatters = ?set, timezone = tz, "Formatter set built");
        set
    }
}

impl Drop for FormatterSet {
    fn drop(&mut self) {
        debug!(locale = %self.locale_id, "Formatter set released");
    }
}

/// Remove the day-period marker (`a`) and the separators around it
/// `"h:mm a"` → `"h:mm"`, `"a h:mm"` → `"h:mm"`; a pattern with nothing left is kept as is
pub fn strip_day_period(pattern: &str) -> String {
    pattern
        .split('a')
        .find(|segment| !segment.is_empty())
        .and_then(|segment| segment.split(' ').find(|part| !part.is_empty()))
        .unwrap_or(pattern)
        .to_string()
}

fn best_pattern(generator: &dyn PatternGenerator, skeleton: &str, locale: &str) -> Option<String> {
    generator
        .best_pattern(skeleton)
        .inspect_err(|e| error!(locale = locale, skeleton = skeleton, error = %e, "No best-fit pattern"))
        .ok()
}

/// 12-hour time pattern for `locale`, with the day period removed
pub fn twelve_hour_pattern(generator: &dyn PatternGenerator, locale: &str) -> Option<String> {
    let best = best_pattern(generator, skeleton::TIME_12, locale)?;
    if locale_matches(locale, FIXED_12H_LOCALES) {
        debug!(locale = locale, best = %best, "Using fixed 12-hour pattern");
        return Some(FIXED_12H_PATTERN.to_string());
    }
    Some(strip_day_period(&best))
}

/// 24-hour time pattern for `locale`
pub fn twenty_four_hour_pattern(generator: &dyn PatternGenerator, locale: &str) -> Option<String> {
    let best = best_pattern(generator, skeleton::TIME_24, locale)?;
    let stripped = strip_day_period(&best);
    if stripped.starts_with(FIXED_24H_BEST_PATTERN) || locale_matches(locale, FIXED_24H_LOCALES) {
        debug!(locale = locale, best = %best, "Using fixed 24-hour pattern");
        return Some(FIXED_24H_PATTERN.to_string());
    }
    Some(stripped)
}

/// Date pattern for `locale`
pub fn date_pattern(generator: &dyn PatternGenerator, locale: &str) -> Option<String> {
    let best = best_pattern(generator, skeleton::DATE, locale)?;
    let prefix = locale.get(..OVERRIDE_MATCH_LEN).unwrap_or(locale);
    match DATE_OVERRIDES.iter().find(|(id, _)| *id == prefix) {
        Some((_, pattern)) => Some(pattern.to_string()),
        None => Some(best),
    }
}

/// Owns the current formatter set and the context it was built from
pub struct FormatterManager {
    service: Box<dyn LocaleService>,
    context: LocaleContext,
    current: Option<Rc<FormatterSet>>,
}

impl FormatterManager {
    pub fn new(service: Box<dyn LocaleService>) -> Self {
        Self {
            service,
            context: LocaleContext::default(),
            current: None,
        }
    }

    /// Release the current set and install one built for `ctx`
    pub fn rebuild(&mut self, ctx: LocaleContext) -> Rc<FormatterSet> {
        self.teardown();
        let set = Rc::new(FormatterSet::build(self.service.as_ref(), &ctx));
        self.context = ctx;
        self.current = Some(Rc::clone(&set));
        set
    }

    /// Drop the manager's handle on the current set
    pub fn teardown(&mut self) {
        if self.current.take().is_some() {
            debug!(locale = %self.context.locale_id, "Formatter set torn down");
        }
    }

    pub fn current(&self) -> Option<Rc<FormatterSet>> {
        self.current.clone()
    }

    pub fn context(&self) -> &LocaleContext {
        &self.context
    }
}
