//! Text measurement shared by the text-bearing widgets.
//!
//! Widths are terminal columns as reported by `unicode-width`, so a CJK
//! ideograph counts as two and combining marks count as zero.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Strip control characters. Widgets render a single row, so newlines and
/// tabs go too.
pub fn sanitize(s: &str) -> String {
    s.chars().filter(|c| !c.is_control()).collect()
}

/// Display width of `s` in columns.
pub fn display_width(s: &str) -> i32 {
    i32::try_from(UnicodeWidthStr::width(s)).unwrap_or(i32::MAX)
}

/// Cut `s` so that it fits in `max_width` columns, appending `tail` when
/// anything was dropped. A wide character that would straddle the limit is
/// dropped whole.
pub fn truncate(s: &str, max_width: i32, tail: &str) -> String {
    if max_width <= 0 {
        return String::new();
    }
    if display_width(s) <= max_width {
        return s.to_string();
    }
    let budget = max_width - display_width(tail);
    if budget <= 0 {
        return truncate(tail, max_width, "");
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0) as i32;
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push_str(tail);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_counts_columns() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("日本"), 4);
        assert_eq!(display_width(""), 0);
    }

    #[test]
    fn sanitize_drops_controls() {
        assert_eq!(sanitize("a\tb\nc\u{1b}"), "abc");
    }

    #[test]
    fn truncate_fits_and_adds_tail() {
        assert_eq!(truncate("hello", 10, "…"), "hello");
        assert_eq!(truncate("hello world", 6, "…"), "hello…");
        assert_eq!(truncate("hello", 0, "…"), "");
    }

    #[test]
    fn truncate_never_splits_wide_chars() {
        assert_eq!(truncate("日本語", 4, ""), "日本");
        assert_eq!(truncate("日本語", 3, ""), "日");
        assert_eq!(truncate("日本語", 4, "…"), "日…");
    }
}
