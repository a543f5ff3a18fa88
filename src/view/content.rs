//! Track table of the loaded playlist

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, ListItem, Paragraph},
    Frame,
};
use ratatui::widgets::Padding;

use crate::model::{ActiveSection, AppModel, Track};
use super::utils::{
    border_style, calculate_track_columns, render_scrollable_list, truncate_string, TrackColumns,
    DATE_WIDTH, DURATION_WIDTH,
};

pub fn render_track_table(frame: &mut Frame, area: Rect, model: &AppModel) {
    let is_focused = model.ui.active_section == ActiveSection::Tracks;

    let title = if model.loading_playlist {
        " Loading... ".to_string()
    } else if model.session.is_empty() {
        " Tracks ".to_string()
    } else {
        format!(" {} ({} tracks) ", model.session.name(), model.session.len())
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_bottom(" Enter: play | a: play next | n/p: next/prev | ?: help ")
        .padding(Padding::horizontal(1))
        .border_style(border_style(is_focused));

    if model.session.is_empty() {
        let text = if model.loading_playlist {
            "Fetching playlist from Spotify..."
        } else {
            "No playlist loaded\n\nPaste a Spotify playlist link above and press Enter,\nor pick one from the sidebar.\nPress ? for all keybindings."
        };
        let empty = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let content_width = area.width.saturating_sub(4) as usize;
    let items = render_track_items(model, content_width, is_focused);

    // Header occupies the first row
    render_scrollable_list(frame, area, items, model.ui.track_selected + 1, block);
}

fn render_track_items(model: &AppModel, content_width: usize, is_focused: bool) -> Vec<ListItem<'static>> {
    let columns = calculate_track_columns(content_width, model.session.len());
    let playing = model.playing_index();
    let selected = model.ui.track_selected;
    let queued: Vec<usize> = model.session.queued().collect();

    let mut items: Vec<ListItem<'static>> = vec![
        ListItem::new(row_text(&columns, "#", "Title", "Artist", "Album", "Added", "Duration"))
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
    ];

    let track_items = model.session.tracks().iter().enumerate().map(|(i, track)| {
        let is_playing = playing == Some(i);
        let is_resolving = model.resolving == Some(i);
        let style = if i == selected && is_focused {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else if is_playing {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else if is_resolving {
            Style::default().fg(Color::Yellow)
        } else if i == selected {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        let indicator = if is_resolving {
            "…"
        } else if is_playing {
            "▶"
        } else if queued.contains(&i) {
            "»"
        } else {
            " "
        };
        let number = format!("{}{}", indicator, i + 1);
        ListItem::new(track_row(&columns, &number, track)).style(style)
    });

    items.extend(track_items);
    items
}

fn track_row(columns: &TrackColumns, number: &str, track: &Track) -> String {
    row_text(
        columns,
        number,
        &track.title,
        &track.artist,
        &track.album,
        &track.added,
        &track.duration,
    )
}

fn row_text(
    columns: &TrackColumns,
    number: &str,
    title: &str,
    artist: &str,
    album: &str,
    added: &str,
    duration: &str,
) -> String {
    format!(
        "{:<num_width$}  {}  {}  {}  {}  {:>duration_width$}",
        number,
        truncate_string(title, columns.title),
        truncate_string(artist, columns.artist),
        truncate_string(album, columns.album),
        truncate_string(added, DATE_WIDTH),
        duration,
        num_width = columns.num,
        duration_width = DURATION_WIDTH,
    )
}
