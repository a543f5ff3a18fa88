//! Seek bar rendering

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Gauge},
    Frame,
};

use crate::model::{ActiveSection, AppModel, SLIDER_MAX, format_time};
use super::utils::border_style;

pub fn render_progress_bar(frame: &mut Frame, area: Rect, model: &AppModel) {
    let transport = &model.transport;

    let resolving = model
        .resolving
        .and_then(|index| model.session.track(index))
        .map(|track| format!(" ⏳ Finding \"{}\"...", track.title));

    let status_text = match (&model.now_playing, resolving) {
        (_, Some(resolving)) => resolving,
        (Some(track), None) if transport.paused => {
            format!("⏸  {} | {}", track.title, track.artist)
        }
        (Some(track), None) => format!(" ▶ {} | {}", track.title, track.artist),
        (None, None) => " No track playing".to_string(),
    };

    let shuffle_text = if model.session.shuffle { "Shuffle: On" } else { "Shuffle: Off" };
    let repeat_text = format!("Repeat: {}", model.session.repeat.label());
    let volume_text = format!("Vol: {}%", (transport.volume() * 100.0).round() as u32);

    let time_str = format!(
        "{} / {}",
        format_time(transport.displayed_position()),
        format_time(transport.duration_secs())
    );

    let progress_ratio = (transport.slider_value() / SLIDER_MAX).clamp(0.0, 1.0);

    let title = if transport.is_dragging() {
        format!("{}  [seek: Enter to jump, Esc to cancel] ", status_text)
    } else {
        format!("{} ", status_text)
    };
    let controls_info = format!(" {} | {} | {} ", shuffle_text, repeat_text, volume_text);

    let focused = model.ui.active_section == ActiveSection::Seek;
    let gauge_color = if transport.is_dragging() { Color::Yellow } else { Color::Green };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_bottom(Line::from(controls_info).right_aligned())
                .border_style(border_style(focused)),
        )
        .gauge_style(Style::default().fg(gauge_color))
        .ratio(progress_ratio)
        .label(time_str);

    frame.render_widget(gauge, area);
}
