//! LDML date pattern → chrono strftime translation
//!
//! Supported fields: `h hh H HH m mm s ss a d dd M… L… E… c… y…`, quoted literals and `''`.

use super::FormatError;

/// Translate an LDML pattern (`"EEE, MMM d"`) into a strftime string (`"%a, %b %-d"`)
pub fn to_strftime(pattern: &str) -> Result<String, FormatError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            // '' outside quotes is a literal apostrophe
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        out.push('\'');
                        i += 2;
                        continue;
                    }
                    break;
                }
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            // Skip the closing quote (an unterminated quote runs to the end)
            i += 1;
            continue;
        }

        if c.is_ascii_alphabetic() {
            let run = chars[i..].iter().take_while(|&&n| n == c).count();
            out.push_str(field(c, run, pattern)?);
            i += run;
            continue;
        }

        push_literal(&mut out, c);
        i += 1;
    }

    Ok(out)
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

fn field(letter: char, width: usize, pattern: &str) -> Result<&'static str, FormatError> {
    let spec = match (letter, width) {
        ('h', 1) => "%-I",
        ('h', _) => "%I",
        ('H', 1) => "%-H",
        ('H', _) => "%H",
        ('m', 1) => "%-M",
        ('m', _) => "%M",
        ('s', 1) => "%-S",
        ('s', _) => "%S",
        ('a', _) => "%p",
        ('d', 1) => "%-d",
        ('d', _) => "%d",
        ('M' | 'L', 1) => "%-m",
        ('M' | 'L', 2) => "%m",
        ('M' | 'L', 3) => "%b",
        ('M' | 'L', _) => "%B",
        ('E', 1..=3) => "%a",
        ('E', _) => "%A",
        ('c', 1 | 2) => "%u",
        ('c', 3) => "%a",
        ('c', _) => "%A",
        ('y', 2) => "%y",
        ('y', _) => "%Y",
        _ => {
            return Err(FormatError::UnsupportedField {
                field: letter.to_string().repeat(width),
                pattern: pattern.to_string(),
            });
        }
    };
    Ok(spec)
}
