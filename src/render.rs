//! Render pass: format date/time/AM-PM and push them to the face

use chrono::{DateTime, Utc};
use tracing::{debug, error};

use crate::constants::{face, layout};
use crate::locale::FormatterSet;
use crate::settings::ClockSettings;
use crate::surface::DisplaySurface;

/// Palette index used when the stored index is out of range
pub const DEFAULT_COLOR_INDEX: i32 = 8;

/// Clock font colors, 1-indexed
pub const PALETTE: [&str; 12] = [
    "000000", "CEFF00", "FF6519", "BCFFFB", "F03880", "FFEA00", "673E27", "FFFFFF", "042860", "F2DCC5",
    "F62E00", "595959",
];

/// `index` if it names a palette entry, the default index otherwise
pub fn effective_color_index(index: i32) -> i32 {
    if (1..=PALETTE.len() as i32).contains(&index) { index } else { DEFAULT_COLOR_INDEX }
}

pub fn palette_hex(index: i32) -> &'static str {
    PALETTE[(effective_color_index(index) - 1) as usize]
}

/// Markup color tag value, `#RRGGBBFF`
pub fn color_tag(index: i32) -> String {
    format!("#{}FF", palette_hex(index))
}

pub fn palette_rgba(index: i32) -> [u8; 4] {
    let hex = palette_hex(index);
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
    [channel(0), channel(2), channel(4), 0xFF]
}

/// Textblock markup for the time line
pub fn compose_time_markup(time: &str, ampm: Option<&str>, is_pre: bool, color_index: i32) -> String {
    let color = color_tag(color_index);
    match ampm {
        None => format!("<color={color}>{time}</color>"),
        Some(ampm) if is_pre => format!(
            "<color={color}><font_size={size}><font={family}>{ampm}</font></font_size>{time}</color>",
            size = face::FONT_SIZE_AMPM,
            family = face::FONT_FAMILY,
        ),
        Some(ampm) => format!(
            "<color={color}>{time}<font_size={size}><font={family}> {ampm}</font></font_size></color>",
            size = face::FONT_SIZE_AMPM,
            family = face::FONT_FAMILY,
        ),
    }
}

/// Output of one render pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFace {
    pub date: Option<String>,
    pub time: Option<String>,
    pub ampm: Option<String>,
    /// `None` when the time line was skipped
    pub markup: Option<String>,
    pub color_index: i32,
}

/// Format the face for `now` and push it to `surface`
///
/// Absent formatters skip their field for this pass.
pub fn render(
    settings: &ClockSettings,
    formatters: Option<&FormatterSet>,
    is_24_hour: bool,
    now: DateTime<Utc>,
    surface: &mut dyn DisplaySurface,
) -> RenderedFace {
    let color_index = effective_color_index(settings.font_color_index);
    let mut rendered = RenderedFace {
        date: None,
        time: None,
        ampm: None,
        markup: None,
        color_index,
    };

    let Some(set) = formatters else {
        debug!("No formatter set, skipping render");
        return rendered;
    };

    if settings.show_date {
        if let Some(date_fmt) = &set.date {
            match date_fmt.format(now) {
                Ok(date) => {
                    surface.set_part_text(layout::PART_DATE, &date);
                    let signal = format!("{}_{}", layout::SIGNAL_SHOW_DATE_PREFIX, color_index);
                    surface.emit_signal(&signal, layout::SOURCE_DATE);
                    rendered.date = Some(date);
                }
                Err(e) => error!(error = %e, "Failed to format date"),
            }
        }
    }

    if is_24_hour {
        rendered.time = format_slot(&set.time_24, now, "time_24");
    } else {
        rendered.ampm = set.time_ampm.as_ref().and_then(|fmt| {
            let marker = fmt
                .format(now)
                .inspect_err(|e| error!(error = %e, "Failed to format AM/PM"))
                .ok()?;
            let width = marker.trim().chars().count();
            if width == 0 || width >= 3 {
                // Missing or too wide for the span
                let fallback = if fmt.local_hour(now) < 12 { "AM" } else { "PM" };
                Some(fallback.to_string())
            } else {
                Some(marker)
            }
        });
        rendered.time = format_slot(&set.time_12, now, "time_12");
    }

    if let Some(time) = &rendered.time {
        let markup = compose_time_markup(time, rendered.ampm.as_deref(), set.is_pre, color_index);
        surface.set_part_text(layout::PART_TIME, &markup);
        surface.emit_signal(layout::SIGNAL_TIME_DEFAULT, layout::SOURCE_TIME);
        rendered.markup = Some(markup);
    }

    debug!(date = ?rendered.date, time = ?rendered.time, ampm = ?rendered.ampm, "Rendered");
    rendered
}

fn format_slot(
    slot: &Option<Box<dyn crate::locale::DateFormat>>,
    now: DateTime<Utc>,
    name: &str,
) -> Option<String> {
    slot.as_ref()?
        .format(now)
        .inspect_err(|e| error!(slot = name, error = %e, "Failed to format time"))
        .ok()
}
