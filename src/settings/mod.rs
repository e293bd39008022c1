//! Clock face settings (show-date flag, font color)
//!
//! The in-memory copy is what the last settings result asked for; the preference
//! store is authoritative once a key exists.

mod result_xml;

pub use result_xml::{apply_settings_result, SettingsParseError};

use tracing::{debug, error};

use crate::config::PreferenceStore;
use crate::constants::{layout, preference};
use crate::render::{effective_color_index, DEFAULT_COLOR_INDEX};
use crate::surface::DisplaySurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSettings {
    pub show_date: bool,
    /// Palette index, 1-based; values outside 1..=12 render with the default color
    pub font_color_index: i32,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            show_date: true,
            font_color_index: DEFAULT_COLOR_INDEX,
        }
    }
}

impl ClockSettings {
    /// Settings for one render pass: store values where readable, `self` otherwise
    pub fn for_render(&self, store: &dyn PreferenceStore) -> ClockSettings {
        let font_color_index = store
            .get_int(preference::CLOCK_FONT_COLOR)
            .unwrap_or(self.font_color_index);
        let show_date = store
            .get_int(preference::SHOW_DATE)
            .map(|v| v != 0)
            .unwrap_or(self.show_date);

        ClockSettings {
            show_date,
            font_color_index,
        }
    }

    /// Write keys that do not exist yet (first run after a settings result)
    pub fn persist_missing(&self, store: &mut dyn PreferenceStore) {
        let entries = [
            (preference::SHOW_DATE, i32::from(self.show_date)),
            (preference::CLOCK_FONT_COLOR, self.font_color_index),
        ];

        for (key, value) in entries {
            match store.exists(key) {
                Ok(true) => debug!(key = key, "Preference already set, keeping stored value"),
                Ok(false) => {
                    if let Err(e) = store.set_int(key, value) {
                        error!(key = key, value = value, error = %e, "Cannot store preference");
                    }
                }
                Err(e) => error!(key = key, error = %e, "Cannot check whether preference exists"),
            }
        }
    }

    /// Refresh the in-memory copy from the store, keeping values that cannot be read
    pub fn reload(&mut self, store: &dyn PreferenceStore) {
        match store.get_int(preference::SHOW_DATE) {
            Ok(value) => self.show_date = value != 0,
            Err(e) => error!(error = %e, "Failed to read show-date preference"),
        }
        match store.get_int(preference::CLOCK_FONT_COLOR) {
            Ok(value) => self.font_color_index = value,
            Err(e) => error!(error = %e, "Failed to read clock font color preference"),
        }
        debug!(show_date = self.show_date, font_color = self.font_color_index, "Reloaded clock settings");
    }

    /// Push the date visibility and color signals for these settings to the layout
    pub fn apply_style(&self, surface: &mut dyn DisplaySurface) {
        if self.show_date {
            let signal = format!(
                "{}_{}",
                layout::SIGNAL_SHOW_DATE_PREFIX,
                effective_color_index(self.font_color_index)
            );
            surface.emit_signal(&signal, layout::SOURCE_DATE);
            surface.emit_signal(layout::SIGNAL_TIME_DEFAULT, layout::SOURCE_TIME);
        } else {
            surface.emit_signal(layout::SIGNAL_HIDE_DATE, layout::SOURCE_TEXT_DATE);
            surface.emit_signal(layout::SIGNAL_TIME_NO_DATE, layout::SOURCE_TIME);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::preferences::MemoryPreferences;
    use crate::surface::ClockLayout;

    #[test]
    fn test_defaults() {
        let settings = ClockSettings::default();
        assert!(settings.show_date);
        assert_eq!(settings.font_color_index, 8);
    }

    #[test]
    fn test_for_render_prefers_store() {
        let mut store = MemoryPreferences::default();
        store.values.insert("showdate".into(), 0);
        store.values.insert("clock_font_color".into(), 4);

        let settings = ClockSettings::default().for_render(&store);
        assert!(!settings.show_date);
        assert_eq!(settings.font_color_index, 4);
    }

    #[test]
    fn test_for_render_falls_back_on_read_failure() {
        let store = MemoryPreferences {
            fail_reads: true,
            ..Default::default()
        };
        let fallback = ClockSettings {
            show_date: false,
            font_color_index: 2,
        };
        assert_eq!(fallback.for_render(&store), fallback);
    }

    #[test]
    fn test_persist_missing_only_writes_absent_keys() {
        let mut store = MemoryPreferences::default();
        store.values.insert("clock_font_color".into(), 5);

        let settings = ClockSettings {
            show_date: false,
            font_color_index: 11,
        };
        settings.persist_missing(&mut store);

        assert_eq!(store.writes, vec![("showdate".to_string(), 0)]);
        assert_eq!(store.values["clock_font_color"], 5);
    }

    #[test]
    fn test_persist_missing_keeps_existing_showdate() {
        let mut store = MemoryPreferences::default();
        store.values.insert("showdate".into(), 1);
        store.values.insert("clock_font_color".into(), 8);

        ClockSettings {
            show_date: false,
            font_color_index: 8,
        }
        .persist_missing(&mut store);

        assert!(store.writes.is_empty());
        assert_eq!(store.values["showdate"], 1);
    }

    #[test]
    fn test_reload_overwrites_memory_copy() {
        let mut store = MemoryPreferences::default();
        store.values.insert("showdate".into(), 1);
        store.values.insert("clock_font_color".into(), 3);

        let mut settings = ClockSettings {
            show_date: false,
            font_color_index: 9,
        };
        settings.reload(&store);
        assert!(settings.show_date);
        assert_eq!(settings.font_color_index, 3);
    }

    #[test]
    fn test_style_with_date_shows_colored_date() {
        let mut face = ClockLayout::default();
        ClockSettings {
            show_date: true,
            font_color_index: 3,
        }
        .apply_style(&mut face);

        assert_eq!(
            face.signals(),
            &[
                ("show,default_text_date_3".to_string(), "source_default_text_date".to_string()),
                ("change,default".to_string(), "source_textblock_time".to_string()),
            ]
        );
        assert!(face.date_visible());
    }

    #[test]
    fn test_style_without_date_hides_it() {
        let mut face = ClockLayout::default();
        ClockSettings {
            show_date: false,
            font_color_index: 8,
        }
        .apply_style(&mut face);

        assert_eq!(
            face.signals(),
            &[
                ("hide,text_date".to_string(), "source_text_date".to_string()),
                ("change,no_data".to_string(), "source_textblock_time".to_string()),
            ]
        );
        assert!(!face.date_visible());
    }
}
