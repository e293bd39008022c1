//! Parser for the textblock markup produced by the render pass
//!
//! Understands `<color=#RRGGBBAA>`, `<font_size=N>` and `<font=NAME>`; other tags are
//! skipped and unbalanced closing tags are ignored.

/// A run of text with uniform style
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub color: [u8; 4],
    /// `None` means the base size of the part
    pub size: Option<f32>,
}

#[derive(Debug, Clone, Copy)]
enum Style {
    Color([u8; 4]),
    Size(f32),
    Other,
}

/// Split markup into styled runs
pub fn parse(markup: &str, default_color: [u8; 4]) -> Vec<TextRun> {
    let mut runs: Vec<TextRun> = Vec::new();
    let mut stack: Vec<(String, Style)> = Vec::new();
    let mut rest = markup;

    while !rest.is_empty() {
        if let Some(tag_body) = rest.strip_prefix('<') {
            let Some(end) = tag_body.find('>') else {
                push_text(&mut runs, rest, &stack, default_color);
                break;
            };
            let tag = &tag_body[..end];
            rest = &tag_body[end + 1..];

            if let Some(name) = tag.strip_prefix('/') {
                if let Some(pos) = stack.iter().rposition(|(open, _)| open == name) {
                    stack.truncate(pos);
                }
            } else {
                let (name, value) = tag.split_once('=').unwrap_or((tag, ""));
                let style = match name {
                    "color" => parse_color(value).map(Style::Color).unwrap_or(Style::Other),
                    "font_size" => value.parse().map(Style::Size).unwrap_or(Style::Other),
                    _ => Style::Other,
                };
                stack.push((name.to_string(), style));
            }
        } else {
            let end = rest.find('<').unwrap_or(rest.len());
            push_text(&mut runs, &rest[..end], &stack, default_color);
            rest = &rest[end..];
        }
    }

    runs
}

fn push_text(runs: &mut Vec<TextRun>, raw: &str, stack: &[(String, Style)], default_color: [u8; 4]) {
    let text = decode_entities(raw);
    if text.is_empty() {
        return;
    }

    let mut color = default_color;
    let mut size = None;
    for (_, style) in stack {
        match *style {
            Style::Color(c) => color = c,
            Style::Size(s) => size = Some(s),
            Style::Other => {}
        }
    }

    match runs.last_mut() {
        Some(last) if last.color == color && last.size == size => last.text.push_str(&text),
        _ => runs.push(TextRun { text, color, size }),
    }
}

fn decode_entities(raw: &str) -> String {
    raw.replace("&lt;", "<").replace("&gt;", ">").replace("&amp;", "&")
}

/// `#RRGGBB` or `#RRGGBBAA`
pub fn parse_color(value: &str) -> Option<[u8; 4]> {
    let hex = value.strip_prefix('#')?;
    if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let alpha = if hex.len() == 8 { channel(6)? } else { 0xFF };
    Some([channel(0)?, channel(2)?, channel(4)?, alpha])
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];

    #[test]
    fn test_suffix_markup() {
        let runs = parse(
            "<color=#CEFF00FF>9:05<font_size=24><font=Tizen:style=Bold> AM</font></font_size></color>",
            WHITE,
        );
        assert_eq!(
            runs,
            vec![
                TextRun { text: "9:05".into(), color: [0xCE, 0xFF, 0x00, 0xFF], size: None },
                TextRun { text: " AM".into(), color: [0xCE, 0xFF, 0x00, 0xFF], size: Some(24.0) },
            ]
        );
    }

    #[test]
    fn test_prefix_markup() {
        let runs = parse(
            "<color=#FFFFFFFF><font_size=24><font=Tizen:style=Bold>오전</font></font_size>9:05</color>",
            [0, 0, 0, 0xFF],
        );
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "오전");
        assert_eq!(runs[0].size, Some(24.0));
        assert_eq!(runs[1].text, "9:05");
        assert_eq!(runs[1].color, WHITE);
    }

    #[test]
    fn test_plain_text_uses_default_color() {
        assert_eq!(
            parse("21:30", WHITE),
            vec![TextRun { text: "21:30".into(), color: WHITE, size: None }]
        );
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#F0388080"), Some([0xF0, 0x38, 0x80, 0x80]));
        assert_eq!(parse_color("#042860"), Some([0x04, 0x28, 0x60, 0xFF]));
        assert_eq!(parse_color("042860"), None);
        assert_eq!(parse_color("#12"), None);
    }
}
