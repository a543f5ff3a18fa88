//! Utility functions for rendering UI components

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, List, ListItem, ListState},
    Frame,
};

pub fn render_scrollable_list(
    frame: &mut Frame,
    area: Rect,
    items: Vec<ListItem>,
    selected_index: usize,
    block: Block,
) {
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default()); // Highlight handled by item styles

    let mut list_state = ListState::default();
    list_state.select(Some(selected_index));

    frame.render_stateful_widget(list, area, &mut list_state);
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    }
}

/// Calculate width needed for index column (log10(n) + padding)
pub fn calculate_num_width(item_count: usize) -> usize {
    if item_count == 0 {
        2
    } else {
        let digits = (item_count as f64).log10().floor() as usize + 1;
        digits + 1
    }
}

pub fn truncate_string(s: &str, max_width: usize) -> String {
    if s.chars().count() > max_width {
        let truncated: String = s.chars().take(max_width.saturating_sub(3)).collect();
        format!("{:<width$}", format!("{}...", truncated), width = max_width)
    } else {
        format!("{:<width$}", s, width = max_width)
    }
}

pub const DATE_WIDTH: usize = 10;
pub const DURATION_WIDTH: usize = 8;

/// Column widths for the track table
#[derive(Debug, PartialEq, Eq)]
pub struct TrackColumns {
    pub num: usize,
    pub title: usize,
    pub artist: usize,
    pub album: usize,
}

/// Splits the free width 40/30/30 between title, artist and album.
/// Format: "{num}  {title}  {artist}  {album}  {date}  {duration}"
pub fn calculate_track_columns(content_width: usize, item_count: usize) -> TrackColumns {
    let num = calculate_num_width(item_count) + 1;
    let fixed_width = num + 2 * 5 + DATE_WIDTH + DURATION_WIDTH;
    let remaining = content_width.saturating_sub(fixed_width);
    let title = remaining * 40 / 100;
    let artist = remaining * 30 / 100;
    let album = remaining.saturating_sub(title + artist);

    TrackColumns {
        num,
        title,
        artist,
        album,
    }
}
