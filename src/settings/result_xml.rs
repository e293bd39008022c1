//! Settings-result documents sent by the remote settings application
//!
//! ```xml
//! <Application>
//!   <SettingsResult>
//!     <Item id="showdate"><Opt checked="no"/></Item>
//!     <Item id="clock_font_color"><Opt selected="3"/></Item>
//!   </SettingsResult>
//! </Application>
//! ```

use roxmltree::{Document, Node};
use thiserror::Error;
use tracing::debug;

use super::ClockSettings;
use crate::constants::preference;

#[derive(Debug, Error)]
pub enum SettingsParseError {
    #[error("settings result is not well-formed XML: {0}")]
    Malformed(#[from] roxmltree::Error),

    #[error("settings result has no /Application/SettingsResult/Item nodes")]
    NoItems,

    #[error("settings result item {index} has no id attribute")]
    MissingItemId { index: usize },
}

/// Apply a settings-result document to `settings`
///
/// Items are applied in document order. An item without `id` stops the walk;
/// changes from earlier items stay applied.
pub fn apply_settings_result(
    xml: &str,
    settings: &mut ClockSettings,
) -> Result<usize, SettingsParseError> {
    let doc = Document::parse(xml)?;

    let root = doc.root_element();
    let items: Vec<Node> = if root.has_tag_name("Application") {
        root.children()
            .filter(|n| n.has_tag_name("SettingsResult"))
            .flat_map(|result| result.children().filter(|n| n.has_tag_name("Item")))
            .collect()
    } else {
        Vec::new()
    };

    if items.is_empty() {
        return Err(SettingsParseError::NoItems);
    }
    debug!(count = items.len(), "Settings result items");

    let mut applied = 0;
    for (index, item) in items.iter().enumerate() {
        let id = item
            .attribute("id")
            .ok_or(SettingsParseError::MissingItemId { index })?;

        match id {
            preference::SHOW_DATE => {
                for checked in element_children(item).filter_map(|opt| opt.attribute("checked")) {
                    debug!(checked = checked, "showdate option");
                    match checked {
                        "yes" => settings.show_date = true,
                        "no" => settings.show_date = false,
                        _ => {}
                    }
                }
                applied += 1;
            }
            preference::CLOCK_FONT_COLOR => {
                for selected in element_children(item).filter_map(|opt| opt.attribute("selected")) {
                    debug!(selected = selected, "clock_font_color option");
                    settings.font_color_index = parse_leading_int(selected);
                }
                applied += 1;
            }
            other => debug!(id = other, "Ignoring unknown settings item"),
        }
    }

    Ok(applied)
}

fn element_children<'a, 'input>(node: &Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element())
}

/// Leading-integer parse: optional whitespace and sign, then digits; anything else is 0
fn parse_leading_int(s: &str) -> i32 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i32 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add(i32::from(b - b'0'));
    }
    if negative { -value } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(items: &str) -> String {
        format!("<Application><SettingsResult>{items}</SettingsResult></Application>")
    }

    #[test]
    fn test_showdate_no_clears_flag() {
        let mut settings = ClockSettings::default();
        let applied =
            apply_settings_result(&wrap(r#"<Item id="showdate"><Opt checked="no"/></Item>"#), &mut settings)
                .unwrap();
        assert_eq!(applied, 1);
        assert!(!settings.show_date);
    }

    #[test]
    fn test_last_checked_option_wins() {
        let mut settings = ClockSettings::default();
        let xml = wrap(r#"<Item id="showdate"><Opt checked="no"/><Opt/><Opt checked="yes"/></Item>"#);
        apply_settings_result(&xml, &mut settings).unwrap();
        assert!(settings.show_date);
    }

    #[test]
    fn test_font_color_selected() {
        let mut settings = ClockSettings::default();
        let xml = wrap(r#"<Item id="clock_font_color"><Opt selected="3"/></Item>"#);
        apply_settings_result(&xml, &mut settings).unwrap();
        assert_eq!(settings.font_color_index, 3);
    }

    #[test]
    fn test_font_color_non_numeric_becomes_zero() {
        let mut settings = ClockSettings::default();
        let xml = wrap(r#"<Item id="clock_font_color"><Opt selected="blue"/></Item>"#);
        apply_settings_result(&xml, &mut settings).unwrap();
        assert_eq!(settings.font_color_index, 0);
    }

    #[test]
    fn test_missing_id_keeps_earlier_changes() {
        let mut settings = ClockSettings::default();
        let xml = wrap(
            r#"<Item id="showdate"><Opt checked="no"/></Item>
               <Item><Opt selected="2"/></Item>
               <Item id="clock_font_color"><Opt selected="5"/></Item>"#,
        );
        let err = apply_settings_result(&xml, &mut settings).unwrap_err();
        assert!(matches!(err, SettingsParseError::MissingItemId { index: 1 }));
        assert!(!settings.show_date);
        assert_eq!(settings.font_color_index, 8);
    }

    #[test]
    fn test_malformed_document_changes_nothing() {
        let mut settings = ClockSettings::default();
        let err = apply_settings_result("<Application><SettingsResult>", &mut settings).unwrap_err();
        assert!(matches!(err, SettingsParseError::Malformed(_)));
        assert_eq!(settings, ClockSettings::default());
    }

    #[test]
    fn test_wrong_root_has_no_items() {
        let mut settings = ClockSettings::default();
        let err = apply_settings_result(
            r#"<Other><SettingsResult><Item id="showdate"/></SettingsResult></Other>"#,
            &mut settings,
        )
        .unwrap_err();
        assert!(matches!(err, SettingsParseError::NoItems));
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("12"), 12);
        assert_eq!(parse_leading_int(" 7px"), 7);
        assert_eq!(parse_leading_int("-3"), -3);
        assert_eq!(parse_leading_int(""), 0);
    }
}
