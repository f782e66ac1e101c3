use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

fn char_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(0)
}

/// Wrap text to fit within `width` terminal columns.
///
/// Explicit newlines are kept, words are not broken unless a single word is
/// wider than the line, and blank lines stay blank. Wide characters (CJK,
/// emoji) count as two columns.
pub fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();

    for raw_line in text.split('\n') {
        let mut current_line = String::new();
        let mut current_len = 0;

        for word in raw_line.split_whitespace() {
            let mut word = word.to_string();

            // Hard-split words that can never fit
            while word.width() > width {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current_line));
                    current_len = 0;
                }
                let split_at = split_index(&word, width);
                let rest = word.split_off(split_at);
                lines.push(word);
                word = rest;
            }

            let word_len = word.width();
            if word.is_empty() {
                continue;
            }

            if current_len == 0 {
                current_line = word;
                current_len = word_len;
            } else if current_len + 1 + word_len <= width {
                current_line.push(' ');
                current_line.push_str(&word);
                current_len += 1 + word_len;
            } else {
                lines.push(std::mem::take(&mut current_line));
                current_line = word;
                current_len = word_len;
            }
        }

        lines.push(current_line);
    }

    lines
}

/// Byte index of the longest prefix of `s` that fits in `width` columns.
/// Always takes at least one character so a too-wide glyph still advances.
fn split_index(s: &str, width: usize) -> usize {
    let mut used = 0;
    for (i, c) in s.char_indices() {
        let w = char_width(c);
        if used + w > width {
            return if i == 0 { c.len_utf8() } else { i };
        }
        used += w;
    }
    s.len()
}

/// The slice of `text` shown in a `width`-column window that keeps the
/// cursor (a char index) visible, and the cursor's column inside it.
pub fn visible_window(text: &str, cursor: usize, width: usize) -> (String, usize) {
    if width == 0 {
        return (String::new(), 0);
    }

    let chars: Vec<char> = text.chars().collect();
    let cursor = cursor.min(chars.len());

    // Walk back from the cursor until the window is full, leaving one
    // column for the cursor itself.
    let mut start = cursor;
    let mut used = 0;
    while start > 0 {
        let w = char_width(chars[start - 1]);
        if used + w + 1 > width {
            break;
        }
        used += w;
        start -= 1;
    }

    let mut shown = String::new();
    let mut shown_width = 0;
    for &c in &chars[start..] {
        let w = char_width(c);
        if shown_width + w > width {
            break;
        }
        shown.push(c);
        shown_width += w;
    }

    (shown, used)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_on_word_boundaries() {
        assert_eq!(
            wrap_text_to_width("the quick brown fox", 10),
            vec!["the quick", "brown fox"]
        );
    }

    #[test]
    fn test_keeps_explicit_newlines_and_blank_lines() {
        assert_eq!(wrap_text_to_width("a\n\nb", 10), vec!["a", "", "b"]);
    }

    #[test]
    fn test_splits_overlong_words() {
        assert_eq!(
            wrap_text_to_width("abcdefghij xy", 4),
            vec!["abcd", "efgh", "ij", "xy"]
        );
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        assert_eq!(wrap_text_to_width("héllo wörld", 5), vec!["héllo", "wörld"]);
    }

    #[test]
    fn test_wide_characters_count_two_columns() {
        let text = "你好世界".repeat(8);
        let lines = wrap_text_to_width(&text, 16);

        assert_eq!(lines.len(), 4);
        for line in &lines {
            assert!(line.width() <= 16, "{:?} is {} columns", line, line.width());
        }
        assert_eq!(lines.concat(), text);
    }

    #[test]
    fn test_wide_character_never_splits_mid_glyph() {
        // Odd width: each line holds two glyphs and leaves a column spare
        let lines = wrap_text_to_width("你好世界", 5);
        assert_eq!(lines, vec!["你好", "世界"]);
    }

    #[test]
    fn test_zero_width_returns_text() {
        assert_eq!(wrap_text_to_width("abc", 0), vec!["abc"]);
    }

    #[test]
    fn test_visible_window_short_text() {
        assert_eq!(visible_window("hello", 5, 10), ("hello".to_string(), 5));
    }

    #[test]
    fn test_visible_window_scrolls_to_cursor() {
        let (shown, col) = visible_window("abcdefghij", 10, 5);
        assert_eq!(shown, "ghij");
        assert_eq!(col, 4);
    }

    #[test]
    fn test_visible_window_measures_wide_characters() {
        // Cursor on 界: two glyphs fit before it
        let (shown, col) = visible_window("你好世界", 3, 6);
        assert_eq!(shown, "好世界");
        assert_eq!(col, 4);
        assert!(shown.width() <= 6);
    }
}
