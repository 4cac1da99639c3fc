use crate::app::mode::Mode;
use crate::app::AppState;
use crate::utils::unicode::next_char_boundary;
use conform::form::{Control, Widget};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Masked secrets always show this many mask characters.
const MASK_WIDTH: usize = 8;

pub fn render(f: &mut Frame, state: &mut AppState, area: Rect) {
    let items: Vec<ListItem> = state
        .widgets
        .iter()
        .enumerate()
        .map(|(i, widget)| ListItem::new(widget_text(state, widget, i == state.cursor)))
        .collect();

    let title = match &state.output_path {
        Some(path) => format!(" conform: {} ", path.display()),
        None => " conform ".to_string(),
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .style(Style::default().bg(state.theme.background)),
        )
        .style(Style::default().fg(state.theme.foreground))
        .highlight_style(Style::default().bg(state.theme.focus_bg));

    let mut list_state = state.list_state.clone();
    f.render_stateful_widget(list, area, &mut list_state);
    state.list_state = list_state;
}

fn widget_text<'a>(state: &'a AppState, widget: &'a Widget, focused: bool) -> Text<'a> {
    let theme = &state.theme;
    let indent = "  ".repeat(widget.depth);

    let mut header = vec![Span::raw(format!(" {}", indent))];
    let label_style = match widget.control {
        Control::Group => Style::default().fg(theme.label).add_modifier(Modifier::BOLD),
        _ => Style::default().fg(theme.label),
    };
    header.push(Span::styled(widget.label.as_str(), label_style));
    if widget.required {
        header.push(Span::styled(" *", Style::default().fg(theme.required)));
    }

    if widget.control != Control::Group {
        header.push(Span::raw(": "));
        if focused && state.mode == Mode::Edit {
            header.extend(edit_spans(state, widget));
        } else {
            header.extend(value_spans(state, widget, focused));
        }
    }

    let mut lines = vec![Line::from(header)];
    if let Some(error) = &widget.error {
        lines.push(Line::from(Span::styled(
            format!(" {}  {}", indent, error),
            Style::default().fg(theme.error),
        )));
    }
    if focused && let Some(helper) = &widget.helper {
        lines.push(Line::from(Span::styled(
            format!(" {}  {}", indent, helper),
            Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC),
        )));
    }
    Text::from(lines)
}

fn value_spans<'a>(state: &'a AppState, widget: &'a Widget, focused: bool) -> Vec<Span<'a>> {
    let theme = &state.theme;
    let muted = Style::default().fg(theme.muted);

    match &widget.control {
        Control::ReadOnly { value } => vec![Span::styled(value.as_str(), muted)],
        Control::Secret { value, masked, filled, .. } => {
            let shown = match value {
                Some(value) if !masked => value.clone(),
                _ if *filled => state.mask_char.to_string().repeat(MASK_WIDTH),
                _ => String::new(),
            };
            let hint = if *masked { "  (v to reveal)" } else { "  (v to hide)" };
            let mut spans = vec![Span::raw(shown)];
            if focused {
                spans.push(Span::styled(hint, muted));
            }
            spans
        }
        Control::Select { selected, .. } | Control::Branch { selected, .. } => match selected {
            Some(selected) => vec![Span::raw(format!("▾ {}", selected))],
            None => vec![Span::styled("▾ choose…", muted)],
        },
        Control::Text {
            value, placeholder, ..
        } => {
            if value.is_empty() {
                let placeholder = placeholder.as_deref().unwrap_or("");
                vec![Span::styled(placeholder, muted)]
            } else {
                vec![Span::raw(value.replace('\n', "⏎"))]
            }
        }
        Control::Integer { text } => vec![Span::raw(text.as_str())],
        Control::Switch { on } => vec![Span::raw(if *on { "[x]" } else { "[ ]" })],
        Control::Tags { values, buffer } => {
            let editing = focused && state.mode == Mode::Tags;
            let mut spans = Vec::new();
            for (i, value) in values.iter().enumerate() {
                let mut style = Style::default().bg(theme.chip_bg);
                if editing && state.tag_chip == Some(i) {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                spans.push(Span::styled(format!(" {} ", value), style));
                spans.push(Span::raw(" "));
            }
            if editing {
                spans.push(Span::raw(buffer.as_str()));
                if state.tag_chip.is_none() {
                    spans.push(cursor_span(state, " "));
                }
            } else if values.is_empty() {
                spans.push(Span::styled("(none)", muted));
            }
            spans
        }
        Control::Group => Vec::new(),
    }
}

fn cursor_span<'a>(state: &AppState, text: &'a str) -> Span<'a> {
    Span::styled(
        if text.is_empty() { "█" } else { text },
        Style::default().bg(state.theme.required).fg(ratatui::style::Color::Black),
    )
}

/// Edit buffer with a block cursor; masked secrets keep their mask.
fn edit_spans<'a>(state: &'a AppState, widget: &Widget) -> Vec<Span<'a>> {
    let buffer = state.edit_buffer.as_str();
    let cursor_pos = state.edit_cursor_pos.min(buffer.len());
    let cursor_end = next_char_boundary(buffer, cursor_pos);

    let masked = matches!(widget.control, Control::Secret { masked: true, .. });
    let show = |s: &'a str| -> Span<'a> {
        if masked {
            Span::raw(state.mask_char.to_string().repeat(s.chars().count()))
        } else {
            Span::raw(s)
        }
    };

    let before_cursor = &buffer[..cursor_pos];
    let at_cursor = &buffer[cursor_pos..cursor_end];
    let after_cursor = &buffer[cursor_end..];

    let cursor = if at_cursor.is_empty() {
        cursor_span(state, "")
    } else if masked {
        Span::styled(
            state.mask_char.to_string(),
            Style::default().bg(state.theme.required).fg(ratatui::style::Color::Black),
        )
    } else {
        cursor_span(state, at_cursor)
    };

    vec![show(before_cursor), cursor, show(after_cursor)]
}
