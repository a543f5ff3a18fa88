//! Model module - Application state and data types
//!
//! - `types`: Core type definitions (tracks, playlists, UI state)
//! - `reference`: Parsing of pasted playlist links
//! - `session`: Playback session, staleness guard and next/prev policy
//! - `transport`: Pause, position, seek drag and volume
//! - `spotify_client`: Spotify API client wrapper
//! - `app_model`: Main application model with state management methods

mod types;
mod reference;
mod session;
mod transport;
mod spotify_client;
mod app_model;

pub use types::{
    ActiveSection, LIKED_SONGS, Playlist, RepeatMode, SidebarEntry, StreamRef, Track,
    UiState, UserPlaylist,
};

pub use reference::PlaylistRef;

pub use session::{NextTrack, ResolutionToken};

pub use transport::{SLIDER_MAX, format_time};

pub use spotify_client::{PlaylistSource, SpotifyClient};

pub use app_model::AppModel;
