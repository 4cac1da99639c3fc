use unicode_width::UnicodeWidthStr;

pub fn prev_char_boundary(s: &str, byte_index: usize) -> usize {
    if byte_index == 0 {
        return 0;
    }
    s.char_indices()
        .rev()
        .find(|(i, _)| *i < byte_index)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

pub fn next_char_boundary(s: &str, byte_index: usize) -> usize {
    if byte_index >= s.len() {
        return s.len();
    }
    s.char_indices()
        .find(|(i, _)| *i > byte_index)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

pub fn prev_word_boundary(s: &str, byte_index: usize) -> usize {
    if byte_index == 0 {
        return 0;
    }

    let chars: Vec<(usize, char)> = s.char_indices().collect();
    let char_pos = chars
        .iter()
        .rposition(|(i, _)| *i < byte_index)
        .unwrap_or(0);

    let mut pos = char_pos;
    while pos > 0 && !is_word_char(chars[pos].1) {
        pos -= 1;
    }
    while pos > 0 && is_word_char(chars[pos - 1].1) {
        pos -= 1;
    }

    chars.get(pos).map(|(i, _)| *i).unwrap_or(0)
}

pub fn next_word_boundary(s: &str, byte_index: usize) -> usize {
    if byte_index >= s.len() {
        return s.len();
    }

    let chars: Vec<(usize, char)> = s.char_indices().collect();
    let char_pos = chars
        .iter()
        .position(|(i, _)| *i >= byte_index)
        .unwrap_or(chars.len());

    let mut pos = char_pos;
    while pos < chars.len() && is_word_char(chars[pos].1) {
        pos += 1;
    }
    while pos < chars.len() && !is_word_char(chars[pos].1) {
        pos += 1;
    }

    chars.get(pos).map(|(i, _)| *i).unwrap_or(s.len())
}

/// Longest prefix of `s` that fits in `max_width` columns, with `…` when cut.
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}
