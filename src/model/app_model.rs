//! Main application model with state management
//!
//! Owned by the controller and read by the view once per frame. Background
//! tasks never touch it directly.

use std::time::Instant;

use super::reference::PlaylistRef;
use super::session::{PlaybackSession, ResolutionToken, StalenessGuard};
use super::transport::Transport;
use super::types::{ActiveSection, RepeatMode, SidebarEntry, Track, UiState, UserPlaylist};

/// Notices disappear on their own after this many seconds
const NOTICE_TTL_SECS: u64 = 5;

/// Main application model containing all state
#[derive(Debug)]
pub struct AppModel {
    pub session: PlaybackSession,
    pub transport: Transport,
    /// Metadata of the stream currently in the player
    pub now_playing: Option<Track>,
    /// Token of the resolution that produced the loaded stream
    pub loaded_token: Option<ResolutionToken>,
    /// Row whose stream is being looked up
    pub resolving: Option<usize>,
    pub playlist_loads: StalenessGuard,
    pub loading_playlist: bool,
    pub login_pending: bool,
    /// Display name of the logged in Spotify user
    pub user: Option<String>,
    pub ui: UiState,
    pub should_quit: bool,
}

impl AppModel {
    pub fn new(shuffle: bool, repeat: RepeatMode, volume: f64) -> Self {
        Self {
            session: PlaybackSession::new(shuffle, repeat),
            transport: Transport::with_volume(volume),
            now_playing: None,
            loaded_token: None,
            resolving: None,
            playlist_loads: StalenessGuard::default(),
            loading_playlist: false,
            login_pending: false,
            user: None,
            ui: UiState::default(),
            should_quit: false,
        }
    }

    // ========================================================================
    // Notices
    // ========================================================================

    pub fn set_error(&mut self, message: String) {
        self.ui.error_message = Some(message);
        self.ui.error_timestamp = Some(Instant::now());
    }

    pub fn clear_error(&mut self) {
        self.ui.error_message = None;
        self.ui.error_timestamp = None;
    }

    pub fn has_error(&self) -> bool {
        self.ui.error_message.is_some()
    }

    pub fn auto_clear_old_errors(&mut self) {
        if let Some(timestamp) = self.ui.error_timestamp {
            if timestamp.elapsed().as_secs() > NOTICE_TTL_SECS {
                self.clear_error();
            }
        }
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn cycle_section_forward(&mut self) {
        self.ui.active_section = self.ui.active_section.next();
    }

    pub fn cycle_section_backward(&mut self) {
        self.ui.active_section = self.ui.active_section.prev();
    }

    pub fn set_active_section(&mut self, section: ActiveSection) {
        self.ui.active_section = section;
    }

    pub fn move_selection_up(&mut self, step: usize) {
        match self.ui.active_section {
            ActiveSection::Sidebar => {
                self.ui.sidebar_selected = self.ui.sidebar_selected.saturating_sub(step);
            }
            ActiveSection::Tracks => {
                self.ui.track_selected = self.ui.track_selected.saturating_sub(step);
            }
            _ => {}
        }
    }

    pub fn move_selection_down(&mut self, step: usize) {
        match self.ui.active_section {
            ActiveSection::Sidebar => {
                let last = self.ui.sidebar.len().saturating_sub(1);
                self.ui.sidebar_selected = (self.ui.sidebar_selected + step).min(last);
            }
            ActiveSection::Tracks => {
                let last = self.session.len().saturating_sub(1);
                self.ui.track_selected = (self.ui.track_selected + step).min(last);
            }
            _ => {}
        }
    }

    pub fn selected_sidebar_entry(&self) -> Option<&SidebarEntry> {
        self.ui.sidebar.get(self.ui.sidebar_selected)
    }

    // ========================================================================
    // Sidebar
    // ========================================================================

    /// Appends an entry unless one with the same reference is present.
    /// Returns whether it was added.
    pub fn add_sidebar_entry(&mut self, entry: SidebarEntry) -> bool {
        if self.ui.sidebar.iter().any(|e| e.reference == entry.reference) {
            return false;
        }
        self.ui.sidebar.push(entry);
        true
    }

    /// Removes the entry at `index`. The pinned liked songs entry stays.
    pub fn remove_sidebar_entry(&mut self, index: usize) -> Option<SidebarEntry> {
        if self.ui.sidebar.get(index)?.is_pinned() {
            return None;
        }
        let removed = self.ui.sidebar.remove(index);
        let last = self.ui.sidebar.len().saturating_sub(1);
        self.ui.sidebar_selected = self.ui.sidebar_selected.min(last);
        Some(removed)
    }

    /// Replaces the entries that came from the account with `playlists`,
    /// skipping ones the user already saved by hand.
    pub fn set_account_playlists(&mut self, playlists: Vec<UserPlaylist>) {
        self.clear_account_playlists();
        for playlist in playlists {
            let Ok(reference) = PlaylistRef::parse(&playlist.link) else {
                tracing::debug!(link = %playlist.link, "Skipping account playlist with unusable link");
                continue;
            };
            self.add_sidebar_entry(SidebarEntry {
                name: playlist.name,
                reference,
                from_account: true,
            });
        }
    }

    pub fn clear_account_playlists(&mut self) {
        self.ui.sidebar.retain(|e| !e.from_account);
        let last = self.ui.sidebar.len().saturating_sub(1);
        self.ui.sidebar_selected = self.ui.sidebar_selected.min(last);
    }

    // ========================================================================
    // Playback
    // ========================================================================

    /// Drops the loaded stream from the model.
    pub fn stop_playback(&mut self) {
        self.transport.stop();
        self.now_playing = None;
        self.loaded_token = None;
        self.resolving = None;
    }

    /// Row of the stream in the player, if it still belongs to this playlist
    pub fn playing_index(&self) -> Option<usize> {
        let loaded = self.loaded_token?;
        self.now_playing.as_ref()?;
        (self.session.current_token() == Some(loaded)).then(|| self.session.current_index())
    }
}
