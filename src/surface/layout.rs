//! Clock face layout: named text parts plus theme signals

use std::collections::BTreeMap;
use tracing::{debug, trace};

use crate::constants::layout;

/// Signals kept for inspection
const SIGNAL_HISTORY: usize = 32;

/// Target of render and style passes
pub trait DisplaySurface {
    fn set_part_text(&mut self, part: &str, text: &str);

    fn emit_signal(&mut self, signal: &str, source: &str);
}

/// In-memory clock layout, rasterised by the canvas on capture
#[derive(Debug, Clone)]
pub struct ClockLayout {
    parts: BTreeMap<String, String>,
    signals: Vec<(String, String)>,
    shown: bool,
    date_visible: bool,
    date_color_index: i32,
}

impl Default for ClockLayout {
    fn default() -> Self {
        Self {
            parts: BTreeMap::new(),
            signals: Vec::new(),
            shown: false,
            date_visible: true,
            date_color_index: crate::render::DEFAULT_COLOR_INDEX,
        }
    }
}

impl ClockLayout {
    pub fn part_text(&self, part: &str) -> Option<&str> {
        self.parts.get(part).map(String::as_str)
    }

    /// Recent signals as `(signal, source)`, oldest first
    pub fn signals(&self) -> &[(String, String)] {
        &self.signals
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn date_visible(&self) -> bool {
        self.date_visible
    }

    pub fn date_color_index(&self) -> i32 {
        self.date_color_index
    }

    /// Run the show transition
    pub fn show(&mut self) {
        if !self.shown {
            debug!("Showing clock");
        }
        self.shown = true;
        self.emit_signal(layout::SIGNAL_SHOW_EFFECT, "");
    }

    pub fn hide(&mut self) {
        if self.shown {
            debug!("Hiding clock");
        }
        self.shown = false;
        self.emit_signal(layout::SIGNAL_HIDE_EFFECT, "");
    }
}

impl DisplaySurface for ClockLayout {
    fn set_part_text(&mut self, part: &str, text: &str) {
        trace!(part = part, text = text, "Part text");
        self.parts.insert(part.to_string(), text.to_string());
    }

    fn emit_signal(&mut self, signal: &str, source: &str) {
        trace!(signal = signal, source = source, "Signal");

        if let Some(suffix) = signal.strip_prefix(layout::SIGNAL_SHOW_DATE_PREFIX) {
            self.date_visible = true;
            if let Some(index) = suffix.strip_prefix('_').and_then(|n| n.parse().ok()) {
                self.date_color_index = index;
            }
        } else if signal == layout::SIGNAL_HIDE_DATE {
            self.date_visible = false;
        }

        self.signals.push((signal.to_string(), source.to_string()));
        if self.signals.len() > SIGNAL_HISTORY {
            let excess = self.signals.len() - SIGNAL_HISTORY;
            self.signals.drain(..excess);
        }
    }
}
