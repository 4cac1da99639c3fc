use super::mode::Mode;
use super::state::AppState;
use crate::utils::unicode::{
    next_char_boundary, next_word_boundary, prev_char_boundary, prev_word_boundary,
};
use anyhow::Result;
use conform::form::Control;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::error;

pub fn handle_key_event(key: KeyEvent, state: &mut AppState) -> Result<()> {
    match state.mode {
        Mode::Navigate => handle_navigate_mode(key, state)?,
        Mode::Edit => handle_edit_mode(key, state),
        Mode::Select => handle_select_mode(key, state),
        Mode::Tags => handle_tags_mode(key, state),
    }
    Ok(())
}

fn handle_navigate_mode(key: KeyEvent, state: &mut AppState) -> Result<()> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('s') => {
                if let Err(e) = state.save() {
                    error!("Save failed: {:#}", e);
                    state.set_status_message(format!("Save failed: {:#}", e));
                }
            }
            KeyCode::Char('c') => state.should_quit = true,
            _ => {}
        }
        return Ok(());
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => state.should_quit = true,
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => state.move_down(),
        KeyCode::Up | KeyCode::Char('k') | KeyCode::BackTab => state.move_up(),
        KeyCode::Home | KeyCode::Char('g') => state.move_to_first(),
        KeyCode::End | KeyCode::Char('G') => state.move_to_last(),
        KeyCode::Enter | KeyCode::Char('i') => state.activate(),
        KeyCode::Char(' ') => {
            if matches!(state.focused().map(|w| &w.control), Some(Control::Switch { .. })) {
                state.toggle_switch();
            }
        }
        KeyCode::Char('v') => state.toggle_secret(),
        _ => {}
    }
    Ok(())
}

fn handle_edit_mode(key: KeyEvent, state: &mut AppState) {
    let word = key.modifiers.intersects(KeyModifiers::ALT | KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => state.cancel_edit(),
        KeyCode::Enter => state.commit_edit(),
        KeyCode::Backspace => {
            if state.edit_cursor_pos > 0 {
                let prev_boundary = prev_char_boundary(&state.edit_buffer, state.edit_cursor_pos);
                state.edit_buffer.drain(prev_boundary..state.edit_cursor_pos);
                state.edit_cursor_pos = prev_boundary;
            }
        }
        KeyCode::Delete => {
            if state.edit_cursor_pos < state.edit_buffer.len() {
                let next_boundary = next_char_boundary(&state.edit_buffer, state.edit_cursor_pos);
                state.edit_buffer.drain(state.edit_cursor_pos..next_boundary);
            }
        }
        KeyCode::Left if word => {
            state.edit_cursor_pos = prev_word_boundary(&state.edit_buffer, state.edit_cursor_pos);
        }
        KeyCode::Right if word => {
            state.edit_cursor_pos = next_word_boundary(&state.edit_buffer, state.edit_cursor_pos);
        }
        KeyCode::Left => {
            state.edit_cursor_pos = prev_char_boundary(&state.edit_buffer, state.edit_cursor_pos);
        }
        KeyCode::Right => {
            state.edit_cursor_pos = next_char_boundary(&state.edit_buffer, state.edit_cursor_pos);
        }
        KeyCode::Home => state.edit_cursor_pos = 0,
        KeyCode::End => state.edit_cursor_pos = state.edit_buffer.len(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.edit_buffer.insert(state.edit_cursor_pos, c);
            state.edit_cursor_pos += c.len_utf8();
        }
        _ => {}
    }
}

fn handle_select_mode(key: KeyEvent, state: &mut AppState) {
    match key.code {
        KeyCode::Esc => state.cancel_select(),
        KeyCode::Enter => state.commit_select(),
        KeyCode::Down | KeyCode::Char('j') => {
            if state.select_index + 1 < state.select_options.len() {
                state.select_index += 1;
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.select_index = state.select_index.saturating_sub(1);
        }
        _ => {}
    }
}

fn handle_tags_mode(key: KeyEvent, state: &mut AppState) {
    match key.code {
        KeyCode::Esc => {
            state.tag_chip = None;
            state.mode = Mode::Navigate;
        }
        KeyCode::Enter => state.tag_commit(),
        KeyCode::Backspace => state.tag_backspace(),
        KeyCode::Delete => state.tag_delete(),
        KeyCode::Left => state.tag_chip_left(),
        KeyCode::Right => state.tag_chip_right(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => state.tag_type(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::test_state;
    use conform::form::FieldValue;
    use pretty_assertions::assert_eq;

    fn press(state: &mut AppState, code: KeyCode) {
        handle_key_event(KeyEvent::new(code, KeyModifiers::NONE), state).unwrap();
    }

    fn type_text(state: &mut AppState, text: &str) {
        for c in text.chars() {
            press(state, KeyCode::Char(c));
        }
    }

    fn focus(state: &mut AppState, field: &str) {
        state.cursor = state.widgets.iter().position(|w| w.field == field).unwrap();
    }

    #[test]
    fn test_text_editing_with_cursor() {
        let mut state = test_state(None);
        press(&mut state, KeyCode::Enter);
        type_text(&mut state, "hst");
        press(&mut state, KeyCode::Left);
        press(&mut state, KeyCode::Left);
        type_text(&mut state, "o");
        press(&mut state, KeyCode::End);
        type_text(&mut state, "ö");
        press(&mut state, KeyCode::Backspace);
        press(&mut state, KeyCode::Enter);

        assert_eq!(state.mode, Mode::Navigate);
        assert_eq!(
            state.form.value("config.host"),
            Some(&FieldValue::String("host".to_string()))
        );
    }

    #[test]
    fn test_integer_field_reports_bad_input() {
        let mut state = test_state(None);
        focus(&mut state, "config.port");
        press(&mut state, KeyCode::Enter);
        assert_eq!(state.edit_buffer, "5432");
        type_text(&mut state, "x");
        press(&mut state, KeyCode::Enter);

        assert_eq!(state.form.value("config.port"), Some(&FieldValue::Empty));
        let widget = state.focused().unwrap();
        assert_eq!(widget.control, Control::Integer { text: "5432x".to_string() });
        assert!(widget.error.is_some());
    }

    #[test]
    fn test_space_toggles_switch_only() {
        let mut state = test_state(None);
        focus(&mut state, "config.ssl");
        press(&mut state, KeyCode::Char(' '));
        assert_eq!(state.form.value("config.ssl"), Some(&FieldValue::Boolean(true)));

        focus(&mut state, "config.host");
        press(&mut state, KeyCode::Char(' '));
        assert_eq!(state.mode, Mode::Navigate);
        assert_eq!(state.form.value("config.host"), None);
    }

    #[test]
    fn test_select_popup_switches_branch_and_secret_toggle() {
        let mut state = test_state(None);
        focus(&mut state, "config.ssl_mode.mode");
        press(&mut state, KeyCode::Enter);
        assert_eq!(state.mode, Mode::Select);
        press(&mut state, KeyCode::Down);
        press(&mut state, KeyCode::Down);
        press(&mut state, KeyCode::Enter);

        focus(&mut state, "config.ssl_mode.ca_certificate");
        assert!(matches!(
            state.focused().map(|w| &w.control),
            Some(Control::Secret { masked: true, .. })
        ));
        press(&mut state, KeyCode::Char('v'));
        assert!(matches!(
            state.focused().map(|w| &w.control),
            Some(Control::Secret { masked: false, .. })
        ));
    }

    #[test]
    fn test_tags_keys() {
        let mut state = test_state(None);
        focus(&mut state, "config.schemas");
        press(&mut state, KeyCode::Enter);
        type_text(&mut state, "public");
        press(&mut state, KeyCode::Enter);
        type_text(&mut state, "sales");
        press(&mut state, KeyCode::Enter);
        press(&mut state, KeyCode::Backspace);
        assert_eq!(
            state.form.value("config.schemas"),
            Some(&FieldValue::Array(vec!["public".to_string()]))
        );

        press(&mut state, KeyCode::Left);
        press(&mut state, KeyCode::Delete);
        assert_eq!(state.form.value("config.schemas"), Some(&FieldValue::Array(Vec::new())));

        press(&mut state, KeyCode::Esc);
        assert_eq!(state.mode, Mode::Navigate);
    }

    #[test]
    fn test_quit_keys() {
        let mut state = test_state(None);
        press(&mut state, KeyCode::Char('q'));
        assert!(state.should_quit);

        let mut state = test_state(None);
        press(&mut state, KeyCode::Enter);
        press(&mut state, KeyCode::Esc);
        assert!(!state.should_quit);
        assert_eq!(state.mode, Mode::Navigate);
    }
}
