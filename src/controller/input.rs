//! Key event handling

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::model::ActiveSection;
use super::AppController;

const PAGE_SIZE: usize = 10;
const SEEK_STEP: f64 = 1.0;
const SEEK_STEP_LARGE: f64 = 5.0;

impl AppController {
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('c') => self.model.should_quit = true,
                KeyCode::Char('s') => self.save_link(),
                _ => {}
            }
            return;
        }

        // Help popup swallows everything until closed
        if self.model.ui.show_help_popup {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('h')) {
                self.model.ui.show_help_popup = false;
            }
            return;
        }

        if key.code == KeyCode::Esc {
            if self.model.has_error() {
                self.model.clear_error();
            } else if self.model.transport.is_dragging() {
                self.seek_cancel();
            } else if self.model.ui.active_section == ActiveSection::Input {
                self.model.ui.link_input.clear();
            }
            return;
        }

        match key.code {
            KeyCode::Tab => {
                self.model.cycle_section_forward();
                return;
            }
            KeyCode::BackTab => {
                self.model.cycle_section_backward();
                return;
            }
            _ => {}
        }

        match self.model.ui.active_section {
            ActiveSection::Input => self.handle_input_key(key),
            ActiveSection::Sidebar => self.handle_sidebar_key(key),
            ActiveSection::Tracks => self.handle_tracks_key(key),
            ActiveSection::Seek => self.handle_seek_key(key),
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.submit_input(),
            KeyCode::Backspace => {
                self.model.ui.link_input.pop();
            }
            KeyCode::Char(c) => self.model.ui.link_input.push(c),
            _ => {}
        }
    }

    fn handle_sidebar_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.model.move_selection_up(1),
            KeyCode::Down => self.model.move_selection_down(1),
            KeyCode::Enter => self.open_selected_entry(),
            KeyCode::Delete | KeyCode::Char('d') => self.remove_selected_entry(),
            _ => self.handle_global_key(key),
        }
    }

    fn handle_tracks_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.model.move_selection_up(1),
            KeyCode::Down => self.model.move_selection_down(1),
            KeyCode::PageUp => self.model.move_selection_up(PAGE_SIZE),
            KeyCode::PageDown => self.model.move_selection_down(PAGE_SIZE),
            KeyCode::Home => self.model.ui.track_selected = 0,
            KeyCode::End => self.model.ui.track_selected = self.model.session.len().saturating_sub(1),
            KeyCode::Enter => {
                let index = self.model.ui.track_selected;
                self.play_track(index);
            }
            KeyCode::Char('a') => {
                let index = self.model.ui.track_selected;
                self.queue_track(index);
            }
            _ => self.handle_global_key(key),
        }
    }

    fn handle_seek_key(&mut self, key: KeyEvent) {
        let step = if key.modifiers.contains(KeyModifiers::SHIFT) {
            SEEK_STEP_LARGE
        } else {
            SEEK_STEP
        };
        match key.code {
            KeyCode::Left => self.seek_drag(-step),
            KeyCode::Right => self.seek_drag(step),
            KeyCode::Enter => self.seek_commit(),
            _ => self.handle_global_key(key),
        }
    }

    /// Transport and app keys, available outside the text input
    fn handle_global_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.model.should_quit = true,
            KeyCode::Char(' ') => self.toggle_playback(),
            KeyCode::Char('n') => {
                self.next_track();
            }
            KeyCode::Char('p') => {
                self.prev_track();
            }
            KeyCode::Char('s') => self.toggle_shuffle(),
            KeyCode::Char('r') => self.cycle_repeat(),
            KeyCode::Char('R') => self.restart_track(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.change_volume(true),
            KeyCode::Char('-') => self.change_volume(false),
            KeyCode::Char('L') => self.login(),
            KeyCode::Char('O') => self.logout(),
            KeyCode::Char('/') | KeyCode::Char('i') => {
                self.model.set_active_section(ActiveSection::Input);
            }
            KeyCode::Char('?') | KeyCode::Char('h') => self.model.ui.show_help_popup = true,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use super::super::test_support::{Harness, SinkCall, playlist};
    use crate::model::ActiveSection;

    fn press(h: &mut Harness, code: KeyCode) {
        h.controller.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(h: &mut Harness, text: &str) {
        for c in text.chars() {
            press(h, KeyCode::Char(c));
        }
    }

    #[tokio::test]
    async fn typing_in_the_input_does_not_trigger_shortcuts() {
        let mut h = Harness::with_tracks(&["A"]);
        type_text(&mut h, "spotify:playlist:qqq");
        assert_eq!(h.controller.model().ui.link_input, "spotify:playlist:qqq");
        assert!(!h.controller.should_quit());
        assert!(!h.controller.model().session.shuffle);

        press(&mut h, KeyCode::Enter);
        assert_eq!(h.source.requests(), vec!["qqq"]);
        h.source.complete("qqq", Ok(playlist("Typed", &["T"])));
        h.pump().await;
        assert_eq!(h.controller.model().session.name(), "Typed");
    }

    #[tokio::test]
    async fn enter_on_a_track_row_plays_it() {
        let mut h = Harness::with_tracks(&["A", "B", "C"]);
        h.controller.model.set_active_section(ActiveSection::Tracks);
        press(&mut h, KeyCode::Down);
        press(&mut h, KeyCode::Down);
        press(&mut h, KeyCode::Enter);
        assert_eq!(h.resolver.requests(), vec!["C"]);
    }

    #[tokio::test]
    async fn transport_shortcuts_outside_the_input() {
        let mut h = Harness::with_tracks(&["A", "B"]);
        h.controller.model.set_active_section(ActiveSection::Tracks);
        press(&mut h, KeyCode::Char('s'));
        press(&mut h, KeyCode::Char('r'));
        assert!(h.controller.model().session.shuffle);
        assert_eq!(h.controller.model().session.repeat, crate::model::RepeatMode::All);

        press(&mut h, KeyCode::Char('q'));
        assert!(h.controller.should_quit());
    }

    #[tokio::test]
    async fn escape_dismisses_notice_first() {
        let mut h = Harness::new();
        h.controller.model.set_error("boom".to_string());
        press(&mut h, KeyCode::Esc);
        assert!(!h.controller.model().has_error());
    }

    #[tokio::test]
    async fn ctrl_s_saves_the_typed_link() {
        let mut h = Harness::new();
        type_text(&mut h, "spotify:playlist:sss");
        h.controller
            .handle_key_event(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert_eq!(h.source.requests(), vec!["sss"]);
        assert!(h.controller.model().ui.link_input.is_empty());
    }

    #[tokio::test]
    async fn plus_prefix_queues_by_title_instead_of_loading() {
        let mut h = Harness::with_tracks(&["Alpha", "Beta", "Gamma"]);
        type_text(&mut h, "+ gam");
        press(&mut h, KeyCode::Enter);
        assert!(h.source.requests().is_empty());
        assert!(h.controller.model().ui.link_input.is_empty());

        h.controller.model.set_active_section(ActiveSection::Tracks);
        press(&mut h, KeyCode::Down);
        press(&mut h, KeyCode::Char('a'));
        assert_eq!(h.controller.model().session.queued().collect::<Vec<_>>(), vec![2, 1]);

        press(&mut h, KeyCode::Char('n'));
        assert_eq!(h.resolver.requests(), vec!["Gamma"]);
    }

    #[tokio::test]
    async fn shift_r_restarts_the_playing_track() {
        let mut h = Harness::with_tracks(&["A"]);
        h.controller.play_track(0);
        h.resolver.complete("A");
        h.pump().await;

        h.controller.model.set_active_section(ActiveSection::Tracks);
        h.controller
            .handle_key_event(KeyEvent::new(KeyCode::Char('R'), KeyModifiers::SHIFT));
        assert_eq!(h.sink.calls().last(), Some(&SinkCall::Seek(0.0)));
        assert_eq!(h.controller.model().session.repeat, crate::model::RepeatMode::None);
    }
}
