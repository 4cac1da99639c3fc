use super::mode::Mode;
use crate::ui::theme::Theme;
use anyhow::{Context, Result};
use conform::form::{Control, ConfigForm, FormError, FormEvent, Widget};
use ratatui::widgets::ListState;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct AppState {
    pub form: ConfigForm,
    /// Widgets of the last render, refreshed after every form change
    pub widgets: Vec<Widget>,
    pub cursor: usize,
    pub list_state: ListState,
    pub mode: Mode,
    pub edit_buffer: String,
    pub edit_cursor_pos: usize,
    pub select_options: Vec<String>,
    pub select_index: usize,
    /// Highlighted chip in the tag editor, `None` while typing
    pub tag_chip: Option<usize>,
    pub theme: Theme,
    pub mask_char: char,
    pub status_message: Option<(String, Instant)>,
    pub output_path: Option<PathBuf>,
    /// Configuration to print after the terminal is restored
    pub pending_output: Option<String>,
    pub unsaved_changes: bool,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(form: ConfigForm, theme: Theme, mask_char: char, output_path: Option<PathBuf>) -> Self {
        let mut state = Self {
            form,
            widgets: Vec::new(),
            cursor: 0,
            list_state: ListState::default(),
            mode: Mode::Navigate,
            edit_buffer: String::new(),
            edit_cursor_pos: 0,
            select_options: Vec::new(),
            select_index: 0,
            tag_chip: None,
            theme,
            mask_char,
            status_message: None,
            output_path,
            pending_output: None,
            unsaved_changes: false,
            should_quit: false,
        };
        state.form.take_events();
        state.refresh();
        state
    }

    /// Re-render the form and keep the cursor on an editable widget.
    pub fn refresh(&mut self) {
        for event in self.form.take_events() {
            debug!("Form event on {}: {:?}", event.path().unwrap_or("-"), event);
            if matches!(event, FormEvent::ValueChanged { .. } | FormEvent::BranchChanged { .. }) {
                self.unsaved_changes = true;
            }
        }

        self.widgets = self.form.render();
        if self.cursor >= self.widgets.len() {
            self.cursor = self.widgets.len().saturating_sub(1);
        }
        if !self.focused().is_some_and(Widget::is_editable) {
            let next = self.next_editable(self.cursor, true).or_else(|| self.next_editable(self.cursor, false));
            if let Some(next) = next {
                self.cursor = next;
            }
        }
        self.list_state.select(Some(self.cursor));
    }

    pub fn focused(&self) -> Option<&Widget> {
        self.widgets.get(self.cursor)
    }

    pub fn focused_field(&self) -> Option<String> {
        self.focused().map(|w| w.field.clone())
    }

    fn next_editable(&self, from: usize, forward: bool) -> Option<usize> {
        if forward {
            (from..self.widgets.len()).find(|&i| self.widgets[i].is_editable())
        } else {
            (0..=from.min(self.widgets.len().saturating_sub(1)))
                .rev()
                .find(|&i| self.widgets.get(i).is_some_and(Widget::is_editable))
        }
    }

    pub fn move_down(&mut self) {
        if let Some(next) = self.next_editable(self.cursor + 1, true) {
            self.cursor = next;
            self.list_state.select(Some(next));
        }
    }

    pub fn move_up(&mut self) {
        if self.cursor == 0 {
            return;
        }
        if let Some(prev) = self.next_editable(self.cursor - 1, false) {
            self.cursor = prev;
            self.list_state.select(Some(prev));
        }
    }

    pub fn move_to_first(&mut self) {
        if let Some(first) = self.next_editable(0, true) {
            self.cursor = first;
            self.list_state.select(Some(first));
        }
    }

    pub fn move_to_last(&mut self) {
        if let Some(last) = self.next_editable(self.widgets.len().saturating_sub(1), false) {
            self.cursor = last;
            self.list_state.select(Some(last));
        }
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    pub fn clear_expired_status_message(&mut self) {
        if let Some((_, time)) = &self.status_message
            && time.elapsed().as_secs() > 3
        {
            self.status_message = None;
        }
    }

    /// Report a rejected form operation in the status bar.
    fn apply(&mut self, result: Result<(), FormError>) {
        if let Err(e) = result {
            warn!("{}", e);
            self.set_status_message(e.to_string());
        }
        self.refresh();
    }

    /// Enter on the focused widget: open the editor that fits its control.
    pub fn activate(&mut self) {
        let Some(widget) = self.focused().cloned() else {
            return;
        };
        match widget.control {
            Control::Text { value, .. } => self.begin_edit(value),
            Control::Integer { text } => self.begin_edit(text),
            Control::Secret { .. } => {
                let value = self
                    .form
                    .value(&widget.field)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                self.begin_edit(value);
            }
            Control::Select { options, selected } | Control::Branch { options, selected } => {
                self.select_index = selected
                    .and_then(|s| options.iter().position(|o| *o == s))
                    .unwrap_or(0);
                self.select_options = options;
                self.mode = Mode::Select;
            }
            Control::Tags { .. } => {
                self.tag_chip = None;
                self.mode = Mode::Tags;
            }
            Control::Switch { .. } => self.toggle_switch(),
            Control::ReadOnly { .. } | Control::Group => {}
        }
    }

    fn begin_edit(&mut self, text: String) {
        self.edit_cursor_pos = text.len();
        self.edit_buffer = text;
        self.mode = Mode::Edit;
    }

    pub fn commit_edit(&mut self) {
        self.mode = Mode::Navigate;
        let text = std::mem::take(&mut self.edit_buffer);
        self.edit_cursor_pos = 0;
        if let Some(field) = self.focused_field() {
            let result = self.form.input_text(&field, &text);
            self.apply(result);
        }
    }

    pub fn cancel_edit(&mut self) {
        self.mode = Mode::Navigate;
        self.edit_buffer.clear();
        self.edit_cursor_pos = 0;
    }

    pub fn commit_select(&mut self) {
        self.mode = Mode::Navigate;
        let options = std::mem::take(&mut self.select_options);
        let (Some(field), Some(option)) = (self.focused_field(), options.get(self.select_index)) else {
            return;
        };
        let result = self.form.select(&field, option);
        self.apply(result);
    }

    pub fn cancel_select(&mut self) {
        self.mode = Mode::Navigate;
        self.select_options.clear();
        self.select_index = 0;
    }

    pub fn toggle_switch(&mut self) {
        let Some(field) = self.focused_field() else {
            return;
        };
        let result = self.form.toggle_bool(&field).map(|_| ());
        self.apply(result);
    }

    pub fn toggle_secret(&mut self) {
        if !matches!(self.focused().map(|w| &w.control), Some(Control::Secret { .. })) {
            return;
        }
        if let Some(field) = self.focused_field() {
            let result = self.form.toggle_secret(&field).map(|_| ());
            self.apply(result);
        }
    }

    /// Values of the focused tag editor.
    pub fn focused_tags(&self) -> (Vec<String>, String) {
        match self.focused().map(|w| &w.control) {
            Some(Control::Tags { values, buffer }) => (values.clone(), buffer.clone()),
            _ => (Vec::new(), String::new()),
        }
    }

    pub fn tag_type(&mut self, c: char) {
        let Some(field) = self.focused_field() else {
            return;
        };
        let (_, mut buffer) = self.focused_tags();
        buffer.push(c);
        self.tag_chip = None;
        let result = self.form.tag_input(&field, &buffer);
        self.apply(result);
    }

    pub fn tag_commit(&mut self) {
        if let Some(field) = self.focused_field() {
            let result = self.form.tag_commit(&field);
            self.apply(result);
        }
    }

    pub fn tag_backspace(&mut self) {
        self.tag_chip = None;
        if let Some(field) = self.focused_field() {
            let result = self.form.tag_backspace(&field);
            self.apply(result);
        }
    }

    pub fn tag_chip_left(&mut self) {
        let count = self.focused_tags().0.len();
        if count == 0 {
            return;
        }
        self.tag_chip = Some(match self.tag_chip {
            None => count - 1,
            Some(i) => i.saturating_sub(1),
        });
    }

    pub fn tag_chip_right(&mut self) {
        let count = self.focused_tags().0.len();
        self.tag_chip = match self.tag_chip {
            Some(i) if i + 1 < count => Some(i + 1),
            _ => None,
        };
    }

    /// Delete the highlighted chip; the highlight moves to its neighbour.
    pub fn tag_delete(&mut self) {
        let (Some(field), Some(chip)) = (self.focused_field(), self.tag_chip) else {
            return;
        };
        let result = self.form.tag_remove(&field, chip);
        self.apply(result);
        let remaining = self.focused_tags().0.len();
        self.tag_chip = if remaining == 0 {
            None
        } else {
            Some(chip.min(remaining - 1))
        };
    }

    /// Validate and write the configuration.
    ///
    /// Without an output path the JSON is kept for printing on exit.
    pub fn save(&mut self) -> Result<()> {
        let report = self.form.validate();
        self.refresh();

        if !report.is_valid() {
            let first = &report.errors[0];
            let message = format!(
                "{} field(s) need attention: {}",
                report.errors.len(),
                first
            );
            if let Some(index) = self.widgets.iter().position(|w| w.field == first.path) {
                self.cursor = index;
                self.list_state.select(Some(index));
            }
            self.set_status_message(message);
            return Ok(());
        }

        let json = serde_json::to_string_pretty(&self.form.to_json())?;
        match &self.output_path {
            Some(path) => {
                fs::write(path, format!("{}\n", json))
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Configuration saved to {}", path.display());
                let message = format!("Saved to {}", path.display());
                self.set_status_message(message);
            }
            None => {
                self.pending_output = Some(json);
                self.set_status_message("Configuration will be printed on exit".to_string());
            }
        }
        self.unsaved_changes = false;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_state(output_path: Option<PathBuf>) -> AppState {
    let schema = serde_json::json!({
        "required": ["host", "ssl_mode"],
        "properties": {
            "title_const": { "const": "postgres", "order": 0 },
            "host": { "type": "string", "title": "Host", "order": 1 },
            "port": { "type": "integer", "default": 5432, "order": 2 },
            "ssl": { "type": "boolean", "order": 3 },
            "schemas": { "type": "array", "order": 4 },
            "ssl_mode": {
                "type": "object",
                "order": 5,
                "oneOf": [
                    { "required": ["mode"], "properties": { "mode": { "const": "disable" } } },
                    {
                        "required": ["mode", "ca_certificate"],
                        "properties": {
                            "mode": { "const": "verify-ca" },
                            "ca_certificate": { "type": "string", "airbyte_secret": true }
                        }
                    }
                ]
            }
        }
    });
    let form = ConfigForm::from_schema(conform::form::FormState::new(), &schema, "config");
    AppState::new(form, Theme::default(), '*', output_path)
}
