//! Tag list editing for array fields.
//!
//! The editor keeps a text buffer next to the committed values. Only the
//! values are form data; the buffer is view state.

/// Commit the buffer as a new tag and clear it.
///
/// Returns true if a tag was added. Whitespace-only text is discarded.
pub fn commit(values: &mut Vec<String>, buffer: &mut String) -> bool {
    let tag = buffer.trim().to_string();
    buffer.clear();
    if tag.is_empty() {
        return false;
    }
    values.push(tag);
    true
}

/// Backspace in the tag editor.
///
/// With text in the buffer the last character is deleted; on an empty buffer
/// the last tag is removed. Returns true if the values changed.
pub fn backspace(values: &mut Vec<String>, buffer: &mut String) -> bool {
    if buffer.pop().is_some() {
        return false;
    }
    values.pop().is_some()
}

/// Remove the tag at `index`, keeping the order of the rest.
pub fn remove_at(values: &mut Vec<String>, index: usize) -> Option<String> {
    (index < values.len()).then(|| values.remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tag_editing_sequence() {
        let mut values: Vec<String> = Vec::new();
        let mut buffer = String::new();

        buffer.push('a');
        assert!(commit(&mut values, &mut buffer));
        assert_eq!(values, vec!["a"]);
        assert!(buffer.is_empty());

        buffer.push('b');
        assert!(commit(&mut values, &mut buffer));
        assert_eq!(values, vec!["a", "b"]);

        assert_eq!(remove_at(&mut values, 0), Some("a".to_string()));
        assert_eq!(values, vec!["b"]);

        assert!(backspace(&mut values, &mut buffer));
        assert!(values.is_empty());
    }

    #[test]
    fn test_commit_blank_buffer_is_ignored() {
        let mut values = vec!["x".to_string()];
        let mut buffer = "   ".to_string();
        assert!(!commit(&mut values, &mut buffer));
        assert_eq!(values, vec!["x"]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_backspace_edits_buffer_first() {
        let mut values = vec!["x".to_string()];
        let mut buffer = "ab".to_string();
        assert!(!backspace(&mut values, &mut buffer));
        assert_eq!(buffer, "a");
        assert_eq!(values, vec!["x"]);
    }

    #[test]
    fn test_backspace_on_empty_list() {
        let mut values: Vec<String> = Vec::new();
        let mut buffer = String::new();
        assert!(!backspace(&mut values, &mut buffer));
    }

    #[test]
    fn test_remove_at_preserves_order() {
        let mut values = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        remove_at(&mut values, 1);
        assert_eq!(values, vec!["a", "c"]);
        assert_eq!(remove_at(&mut values, 5), None);
    }
}
