//! Best-fit pattern table
//!
//! Locales are matched exactly, then by language, then fall back to the root row.
//! Only the three skeleton families the clock face asks for are covered.

/// Best-fit patterns of one locale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalePatterns {
    pub locale: &'static str,
    /// Best fit for 12-hour skeletons (`h:mm`, `hhmm`)
    pub hour12: &'static str,
    /// Best fit for 24-hour skeletons (`H:mm`)
    pub hour24: &'static str,
    /// Best fit for the abbreviated month/weekday/day skeleton (`MMMEd`)
    pub month_weekday_day: &'static str,
}

const fn row(
    locale: &'static str,
    hour12: &'static str,
    hour24: &'static str,
    month_weekday_day: &'static str,
) -> LocalePatterns {
    LocalePatterns {
        locale,
        hour12,
        hour24,
        month_weekday_day,
    }
}

pub const ROOT: LocalePatterns = row("root", "h:mm a", "HH:mm", "EEE, MMM d");

pub const TABLE: &[LocalePatterns] = &[
    row("en_US", "h:mm a", "HH:mm", "EEE, MMM d"),
    row("en_GB", "h:mm a", "HH:mm", "EEE d MMM"),
    row("ko_KR", "a h:mm", "HH:mm", "MMM d일 (E)"),
    row("ja_JP", "ah:mm", "H:mm", "M月d日(E)"),
    row("zh_CN", "ah:mm", "HH:mm", "M月d日E"),
    row("de_DE", "h:mm a", "HH:mm", "E, d. MMM"),
    row("fr_FR", "h:mm a", "HH:mm", "E d MMM"),
    row("es_ES", "h:mm a", "H:mm", "E, d MMM"),
    row("pt_BR", "h:mm a", "HH'h'mm", "E, d 'de' MMM"),
    row("da_DK", "h.mm a", "HH.mm", "E d. MMM"),
    row("fi_FI", "h.mm a", "H.mm", "ccc d. MMM"),
    row("id_ID", "h.mm a", "HH.mm", "E, d MMM"),
    row("mr_IN", "h:mm a", "H:mm", "E, d MMM"),
    row("ru_RU", "h:mm a", "HH:mm", "ccc, d MMM"),
];

/// Skeleton families understood by the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkeletonKind {
    Hour12,
    Hour24,
    MonthWeekdayDay,
}

/// Classify a skeleton; ordering and punctuation are ignored and hour runs collapse
pub fn classify(skeleton: &str) -> Option<SkeletonKind> {
    match canonical(skeleton).as_str() {
        "hmm" => Some(SkeletonKind::Hour12),
        "Hmm" => Some(SkeletonKind::Hour24),
        "MMMEd" | "EMMMd" | "MMMdE" => Some(SkeletonKind::MonthWeekdayDay),
        _ => None,
    }
}

fn canonical(skeleton: &str) -> String {
    let mut out = String::with_capacity(skeleton.len());
    for c in skeleton.chars().filter(char::is_ascii_alphabetic) {
        if matches!(c, 'h' | 'H') && out.ends_with(c) {
            continue;
        }
        out.push(c);
    }
    out
}

/// Patterns for `locale_id`: exact match, then language match, then root
pub fn lookup(locale_id: &str) -> &'static LocalePatterns {
    if let Some(exact) = TABLE.iter().find(|row| row.locale == locale_id) {
        return exact;
    }

    let language = locale_id.split('_').next().unwrap_or(locale_id);
    TABLE
        .iter()
        .find(|row| row.locale.split('_').next() == Some(language))
        .unwrap_or(&ROOT)
}

impl LocalePatterns {
    pub fn best(&self, kind: SkeletonKind) -> &'static str {
        match kind {
            SkeletonKind::Hour12 => self.hour12,
            SkeletonKind::Hour24 => self.hour24,
            SkeletonKind::MonthWeekdayDay => self.month_weekday_day,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_skeletons() {
        assert_eq!(classify("h:mm"), Some(SkeletonKind::Hour12));
        assert_eq!(classify("hhmm"), Some(SkeletonKind::Hour12));
        assert_eq!(classify("H:mm"), Some(SkeletonKind::Hour24));
        assert_eq!(classify("MMMEd"), Some(SkeletonKind::MonthWeekdayDay));
        assert_eq!(classify("yMd"), None);
    }

    #[test]
    fn test_lookup_prefers_exact_then_language() {
        assert_eq!(lookup("en_GB").locale, "en_GB");
        assert_eq!(lookup("en_AU").locale, "en_US");
        assert_eq!(lookup("ko_KP").locale, "ko_KR");
        assert_eq!(lookup("sw_KE").locale, "root");
    }

    #[test]
    fn test_every_table_pattern_translates() {
        for row in TABLE.iter().chain(std::iter::once(&ROOT)) {
            for pattern in [row.hour12, row.hour24, row.month_weekday_day] {
                assert!(
                    crate::locale::ldml::to_strftime(pattern).is_ok(),
                    "{} pattern {:?} does not translate",
                    row.locale,
                    pattern
                );
            }
        }
    }
}
