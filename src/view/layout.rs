//! Layout rendering (top bar, sidebar)

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, ListItem, Paragraph},
    Frame,
};
use ratatui::widgets::Padding;

use crate::model::{ActiveSection, AppModel};
use super::utils::{border_style, render_scrollable_list, truncate_string};

pub fn render_top_bar(frame: &mut Frame, area: Rect, model: &AppModel) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // Link input
            Constraint::Length(28), // Account
        ])
        .split(area);

    let focused = model.ui.active_section == ActiveSection::Input;
    let (input_text, input_style) = if model.ui.link_input.is_empty() {
        (
            "Paste a Spotify playlist link...",
            Style::default().fg(Color::DarkGray),
        )
    } else if focused {
        (model.ui.link_input.as_str(), Style::default().fg(Color::Green))
    } else {
        (model.ui.link_input.as_str(), Style::default().fg(Color::White))
    };

    let input = Paragraph::new(input_text).style(input_style).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Playlist ")
            .title_bottom(" Enter: load | Ctrl+S: save ")
            .padding(Padding::horizontal(1))
            .border_style(border_style(focused)),
    );
    frame.render_widget(input, chunks[0]);

    if focused {
        // Cursor after the typed text, inside border and padding
        let x = chunks[0].x + 2 + model.ui.link_input.chars().count() as u16;
        if x < chunks[0].right().saturating_sub(1) {
            frame.set_cursor_position((x, chunks[0].y + 1));
        }
    }

    let (account_text, account_style) = match (&model.user, model.login_pending) {
        (Some(name), _) => (format!("👤 {}", name), Style::default().fg(Color::Cyan)),
        (None, true) => ("Logging in...".to_string(), Style::default().fg(Color::Yellow)),
        (None, false) => ("L to log in".to_string(), Style::default().fg(Color::DarkGray)),
    };
    let inner_width = chunks[1].width.saturating_sub(2) as usize;
    let account = Paragraph::new(truncate_string(&account_text, inner_width))
        .style(account_style)
        .block(Block::default().borders(Borders::ALL).title(" Account "));
    frame.render_widget(account, chunks[1]);
}

pub fn render_sidebar(frame: &mut Frame, area: Rect, model: &AppModel) {
    let focused = model.ui.active_section == ActiveSection::Sidebar;
    let selected = model.ui.sidebar_selected;
    let width = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = model
        .ui
        .sidebar
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let style = if i == selected && focused {
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else if i == selected {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else if entry.is_pinned() {
                Style::default().fg(Color::Magenta)
            } else {
                Style::default().fg(Color::White)
            };
            let marker = if entry.is_pinned() { "♥ " } else { "  " };
            let name = truncate_string(&entry.name, width.saturating_sub(2));
            ListItem::new(format!("{}{}", marker, name)).style(style)
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Playlists ")
        .padding(Padding::horizontal(1))
        .border_style(border_style(focused));

    render_scrollable_list(frame, area, items, selected, block);
}
