use crate::app::mode::Mode;
use crate::app::AppState;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn render(f: &mut Frame, state: &AppState, area: Rect) {
    if let Some((message, time)) = &state.status_message
        && time.elapsed().as_secs() <= 3
    {
        render_status_message(f, message, area);
        return;
    }

    let save_indicator = if state.unsaved_changes { " [unsaved]" } else { "" };
    let field_count = state.widgets.iter().filter(|w| w.is_editable()).count();

    let nav_hint = match state.mode {
        Mode::Navigate => "Enter edit  v reveal  ^S save  q quit",
        Mode::Edit => "Enter apply  Esc cancel",
        Mode::Select => "j/k move  Enter select  Esc cancel",
        Mode::Tags => "Enter add  ←/→ chip  Del remove  Esc done",
    };
    let version_text = format!("v{VERSION}");

    let left_content = format!(
        " {} | {} fields{}",
        state.mode, field_count, save_indicator
    );

    let padding = area.width.saturating_sub(
        left_content.chars().count() as u16 + nav_hint.chars().count() as u16 + version_text.len() as u16 + 3,
    );

    let base_style = Style::default()
        .fg(state.theme.status_bar_fg)
        .bg(state.theme.status_bar_bg);

    let status_line = format!(
        "{} {} {:>padding$}{} ",
        left_content,
        nav_hint,
        "",
        version_text,
        padding = padding as usize
    );

    let status = Paragraph::new(Line::from(vec![Span::styled(status_line, base_style)]));

    f.render_widget(status, area);
}

fn render_status_message(f: &mut Frame, message: &str, area: Rect) {
    let display_message = format!(" {message} ");

    let style = Style::default()
        .fg(ratatui::style::Color::White)
        .bg(ratatui::style::Color::Rgb(0, 100, 0))
        .add_modifier(Modifier::BOLD);

    let padding = area.width.saturating_sub(display_message.chars().count() as u16);
    let status_line = format!(
        "{}{:padding$}",
        display_message,
        "",
        padding = padding as usize
    );

    let status = Paragraph::new(Line::from(vec![Span::styled(status_line, style)]));
    f.render_widget(status, area);
}
