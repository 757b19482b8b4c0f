use std::iter::Peekable;
use std::str::Chars;

use chrono::NaiveDateTime;

/// A `yyyy-MM-dd HH:mm:ss` style date pattern, translated to a chrono format string.
///
/// Letters we don't recognize are kept as literal text, as is anything inside
/// single quotes (`''` is an escaped quote).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePattern {
    strftime: String,
}

impl DatePattern {
    pub fn new(pattern: &str) -> Self {
        let mut strftime = String::with_capacity(pattern.len() * 2);
        let mut chars = pattern.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\'' {
                quoted(&mut chars, &mut strftime);
            } else if c.is_ascii_alphabetic() {
                let mut run = 1;
                while chars.next_if_eq(&c).is_some() {
                    run += 1;
                }
                match specifier(c, run) {
                    Some(spec) => strftime.push_str(spec),
                    None => (0..run).for_each(|_| push_literal(&mut strftime, c)),
                }
            } else {
                push_literal(&mut strftime, c);
            }
        }
        Self { strftime }
    }

    pub fn format(&self, time: NaiveDateTime) -> String {
        time.format(&self.strftime).to_string()
    }
}

// called after an opening quote.
fn quoted(chars: &mut Peekable<Chars>, out: &mut String) {
    if chars.next_if_eq(&'\'').is_some() {
        out.push('\'');
        return;
    }
    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.next_if_eq(&'\'').is_some() {
                out.push('\'');
                continue;
            }
            return;
        }
        push_literal(out, c);
    }
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

fn specifier(c: char, run: usize) -> Option<&'static str> {
    let spec = match (c, run) {
        ('y', 2) => "%y",
        ('y', _) => "%Y",
        ('M', 1) => "%-m",
        ('M', 2) => "%m",
        ('M', 3) => "%b",
        ('M', _) => "%B",
        ('d', 1) => "%-d",
        ('d', _) => "%d",
        ('D', _) => "%j",
        ('H', 1) => "%-H",
        ('H', _) => "%H",
        ('h', 1) => "%-I",
        ('h', _) => "%I",
        ('m', 1) => "%-M",
        ('m', _) => "%M",
        ('s', 1) => "%-S",
        ('s', _) => "%S",
        ('S', _) => "%3f",
        ('E', 1..=3) => "%a",
        ('E', _) => "%A",
        ('a', _) => "%p",
        _ => return None,
    };
    Some(spec)
}

#[cfg(test)]
mod test {
    use super::*;

    fn fmt(pattern: &str) -> String {
        let time =
            NaiveDateTime::parse_from_str("2024-03-05 07:08:09", "%Y-%m-%d %H:%M:%S").unwrap();
        DatePattern::new(pattern).format(time)
    }

    #[test]
    fn test_common_patterns() {
        assert_eq!(fmt("yyyyMMdd"), "20240305");
        assert_eq!(fmt("yyyy-MM-dd HH:mm:ss"), "2024-03-05 07:08:09");
        assert_eq!(fmt("yyyyMMddHHmmss"), "20240305070809");
        assert_eq!(fmt("yy/M/d H:m"), "24/3/5 7:8");
    }

    #[test]
    fn test_literals() {
        assert_eq!(fmt("'day' dd"), "day 05");
        assert_eq!(fmt("dd''"), "05'");
        assert_eq!(fmt("100% yyyy"), "100% 2024");
        assert_eq!(fmt("yyyyQq"), "2024Qq");
    }
}
