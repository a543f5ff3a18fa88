//! Core type definitions for the application

use std::time::Instant;

use super::reference::PlaylistRef;

/// Which section of the UI is currently active/focused
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveSection {
    Input,
    Sidebar,
    Tracks,
    Seek,
}

impl ActiveSection {
    pub fn next(self) -> Self {
        match self {
            ActiveSection::Input => ActiveSection::Sidebar,
            ActiveSection::Sidebar => ActiveSection::Tracks,
            ActiveSection::Tracks => ActiveSection::Seek,
            ActiveSection::Seek => ActiveSection::Input,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            ActiveSection::Input => ActiveSection::Seek,
            ActiveSection::Sidebar => ActiveSection::Input,
            ActiveSection::Tracks => ActiveSection::Sidebar,
            ActiveSection::Seek => ActiveSection::Tracks,
        }
    }
}

/// A playlist row as fetched from Spotify. Identified only by its position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    /// All artists, comma-joined
    pub artist: String,
    pub album: String,
    /// `YYYY-MM-DD`, empty when Spotify has no date
    pub added: String,
    pub duration: String,
}

impl Track {
    #[cfg(test)]
    pub fn new(title: &str, artist: &str) -> Self {
        Self {
            title: title.to_string(),
            artist: artist.to_string(),
            album: String::new(),
            added: String::new(),
            duration: String::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Playlist {
    pub name: String,
    pub tracks: Vec<Track>,
}

/// Repeat mode state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RepeatMode {
    #[default]
    None,
    All,
    One,
}

impl RepeatMode {
    /// none -> all -> one -> none
    pub fn next(self) -> Self {
        match self {
            RepeatMode::None => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RepeatMode::None => "Off",
            RepeatMode::All => "All",
            RepeatMode::One => "One",
        }
    }
}

/// Where a resolved track can be streamed from
#[derive(Clone, Debug, PartialEq)]
pub struct StreamRef {
    pub url: String,
    pub video_id: String,
    pub title: String,
    pub duration_secs: Option<f64>,
}

/// One of the current user's own playlists
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserPlaylist {
    pub name: String,
    pub link: String,
}

/// A saved pointer shown in the sidebar
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SidebarEntry {
    pub name: String,
    pub reference: PlaylistRef,
    /// Added from the logged in account rather than saved by hand
    pub from_account: bool,
}

impl SidebarEntry {
    pub fn liked() -> Self {
        Self {
            name: LIKED_SONGS.to_string(),
            reference: PlaylistRef::Liked,
            from_account: false,
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.reference == PlaylistRef::Liked
    }
}

pub const LIKED_SONGS: &str = "Liked Songs";

/// UI state for the application
#[derive(Clone, Debug)]
pub struct UiState {
    pub active_section: ActiveSection,
    pub link_input: String,
    pub sidebar: Vec<SidebarEntry>,
    pub sidebar_selected: usize,
    pub track_selected: usize,
    pub error_message: Option<String>,
    pub error_timestamp: Option<Instant>,
    pub show_help_popup: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            active_section: ActiveSection::Input,
            link_input: String::new(),
            sidebar: vec![SidebarEntry::liked()],
            sidebar_selected: 0,
            track_selected: 0,
            error_message: None,
            error_timestamp: None,
            show_help_popup: false,
        }
    }
}

/// Formats milliseconds as `m:ss`
pub fn mmss(ms: i64) -> String {
    let total_secs = ms.max(0) / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_cycles_through_all_modes() {
        let mut mode = RepeatMode::None;
        let mut seen = vec![mode];
        for _ in 0..3 {
            mode = mode.next();
            seen.push(mode);
        }
        assert_eq!(
            seen,
            vec![RepeatMode::None, RepeatMode::All, RepeatMode::One, RepeatMode::None]
        );
    }

    #[test]
    fn mmss_pads_seconds() {
        assert_eq!(mmss(0), "0:00");
        assert_eq!(mmss(65_432), "1:05");
        assert_eq!(mmss(600_000), "10:00");
    }

    #[test]
    fn sidebar_starts_with_pinned_liked_songs() {
        let ui = UiState::default();
        assert_eq!(ui.sidebar.len(), 1);
        assert!(ui.sidebar[0].is_pinned());
        assert_eq!(ui.sidebar[0].name, LIKED_SONGS);
    }
}
