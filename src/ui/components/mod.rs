pub mod field_list;
pub mod status_bar;

use crate::app::mode::Mode;
use crate::app::AppState;
use crate::utils::unicode::truncate_to_width;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem},
    Frame,
};

pub fn render(f: &mut Frame, state: &mut AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Field list
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    field_list::render(f, state, chunks[0]);
    status_bar::render(f, state, chunks[1]);

    if state.mode == Mode::Select {
        render_select_popup(f, state);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn render_select_popup(f: &mut Frame, state: &AppState) {
    let area = centered_rect(50, 40, f.area());
    let width = area.width.saturating_sub(4) as usize;
    let title = state
        .focused()
        .map(|w| format!(" {} (Enter to select, Esc to cancel) ", w.label))
        .unwrap_or_default();

    let items: Vec<ListItem> = state
        .select_options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let style = if i == state.select_index {
                Style::default()
                    .fg(state.theme.required)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                Style::default().fg(state.theme.foreground)
            };
            ListItem::new(Line::from(Span::styled(
                format!(" {} ", truncate_to_width(option, width)),
                style,
            )))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .style(Style::default().bg(state.theme.background)),
        )
        .style(Style::default().fg(state.theme.foreground));

    f.render_widget(Clear, area);
    f.render_widget(list, area);
}
