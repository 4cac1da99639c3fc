//! Per-field view state that is not form data.

use std::collections::HashMap;

/// Secret visibility toggles and text buffers, keyed by field path.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    visible_secrets: HashMap<String, bool>,
    tag_buffers: HashMap<String, String>,
    integer_text: HashMap<String, String>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Secrets start masked.
    pub fn is_secret_visible(&self, path: &str) -> bool {
        self.visible_secrets.get(path).copied().unwrap_or(false)
    }

    /// Flip one field's mask. Returns the new visibility.
    pub fn toggle_secret(&mut self, path: &str) -> bool {
        let visible = self.visible_secrets.entry(path.to_string()).or_insert(false);
        *visible = !*visible;
        *visible
    }

    pub fn tag_buffer(&self, path: &str) -> &str {
        self.tag_buffers.get(path).map(String::as_str).unwrap_or("")
    }

    pub fn tag_buffer_mut(&mut self, path: &str) -> &mut String {
        self.tag_buffers.entry(path.to_string()).or_default()
    }

    /// Raw text last typed into an integer field, if any.
    pub fn integer_text(&self, path: &str) -> Option<&str> {
        self.integer_text.get(path).map(String::as_str)
    }

    pub fn set_integer_text(&mut self, path: &str, text: &str) {
        self.integer_text.insert(path.to_string(), text.to_string());
    }

    pub fn clear_integer_text(&mut self, path: &str) {
        self.integer_text.remove(path);
    }

    /// Drop all view state for a field that left the form.
    pub fn forget(&mut self, path: &str) {
        self.visible_secrets.remove(path);
        self.tag_buffers.remove(path);
        self.integer_text.remove(path);
    }

    pub fn clear(&mut self) {
        self.visible_secrets.clear();
        self.tag_buffers.clear();
        self.integer_text.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_toggle_is_per_field() {
        let mut view = ViewState::new();
        assert!(!view.is_secret_visible("a"));

        assert!(view.toggle_secret("a"));
        assert!(view.is_secret_visible("a"));
        assert!(!view.is_secret_visible("b"));

        assert!(!view.toggle_secret("a"));
        assert!(!view.is_secret_visible("a"));
    }

    #[test]
    fn test_forget_resets_field() {
        let mut view = ViewState::new();
        view.toggle_secret("a");
        view.tag_buffer_mut("a").push_str("tag");
        view.set_integer_text("a", "12x");

        view.forget("a");
        assert!(!view.is_secret_visible("a"));
        assert_eq!(view.tag_buffer("a"), "");
        assert_eq!(view.integer_text("a"), None);
    }
}
