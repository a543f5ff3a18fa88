//! Error taxonomy shared by the controller and its collaborators
//!
//! Collaborators report narrow errors ([`ResolveError`], [`SourceError`]); the
//! controller maps them onto [`PlayerError`], which is what the user sees as a
//! notice. None of these are fatal to the application.

use thiserror::Error;

/// Failure reported by a track resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no match found")]
    NotFound,
    #[error("{0}")]
    Transient(String),
}

/// Failure reported by the playlist source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("not found")]
    NotFound,
    #[error("access forbidden")]
    Forbidden,
    #[error("not logged in")]
    Unauthenticated,
    #[error("{0}")]
    Transient(String),
}

/// User-facing failures. Each one ends the action that triggered it and
/// nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    #[error("Could not play \"{title}\": {reason}")]
    ResolutionFailed { title: String, reason: ResolveError },

    #[error("{}", playlist_notice(.restricted, .detail))]
    PlaylistUnavailable { restricted: bool, detail: String },

    #[error("Please log in to Spotify first ({0})")]
    Unauthenticated(&'static str),

    #[error("Not a Spotify playlist link: {0}")]
    InvalidReference(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("No track in this playlist matches \"{0}\"")]
    NoMatchingTrack(String),
}

fn playlist_notice(restricted: &bool, detail: &str) -> String {
    if *restricted {
        "Spotify could not access this playlist (private or region-locked)".to_string()
    } else {
        format!("Failed to load playlist: {}", detail)
    }
}

impl PlayerError {
    pub fn resolution(title: &str, reason: ResolveError) -> Self {
        PlayerError::ResolutionFailed {
            title: title.to_string(),
            reason,
        }
    }

    /// Maps a source failure for an action that needs a playlist.
    pub fn from_source(err: SourceError, action: &'static str) -> Self {
        match err {
            SourceError::Unauthenticated => PlayerError::Unauthenticated(action),
            SourceError::NotFound | SourceError::Forbidden => PlayerError::PlaylistUnavailable {
                restricted: true,
                detail: err.to_string(),
            },
            SourceError::Transient(detail) => PlayerError::PlaylistUnavailable {
                restricted: false,
                detail,
            },
        }
    }
}
