//! Controller module - Application logic and event handling
//!
//! The controller owns the model and runs on the UI loop. Slow work (stream
//! lookups, Spotify requests) is spawned onto tokio and reports back as an
//! [`AppEvent`] which the loop feeds into [`AppController::handle_event`].
//!
//! - `input`: Key event handling
//! - `playback`: Track selection and transport controls
//! - `navigation`: Playlist loading, sidebar and account
//! - `player_events`: Applying results and player reports

mod input;
mod playback;
mod navigation;
mod player_events;

#[cfg(test)]
mod test_support;

use std::future::Future;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc::UnboundedSender;

use crate::audio::{AudioSink, PlayerEvent};
use crate::error::{PlayerError, ResolveError, SourceError};
use crate::model::{AppModel, Playlist, PlaylistRef, PlaylistSource, ResolutionToken, StreamRef, UserPlaylist};
use crate::resolver::TrackResolver;

/// Why a playlist was fetched
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchPurpose {
    /// Replace the current playlist, if still the latest load
    Load(ResolutionToken),
    /// Add to the sidebar without loading
    Save,
}

/// Completion reports from background work
#[derive(Debug)]
pub enum AppEvent {
    TrackResolved {
        token: ResolutionToken,
        index: usize,
        result: Result<StreamRef, ResolveError>,
    },
    PlaylistFetched {
        purpose: FetchPurpose,
        reference: PlaylistRef,
        result: Result<Playlist, SourceError>,
    },
    AccountRefreshed {
        user: Result<String, SourceError>,
        playlists: Result<Vec<UserPlaylist>, SourceError>,
    },
    LoggedIn(Result<String, SourceError>),
    LoggedOut,
    Player(PlayerEvent),
}

pub struct AppController {
    pub(crate) model: AppModel,
    resolver: Arc<dyn TrackResolver>,
    source: Arc<dyn PlaylistSource>,
    sink: Box<dyn AudioSink>,
    events: UnboundedSender<AppEvent>,
    rng: StdRng,
}

impl AppController {
    pub fn new(
        model: AppModel,
        resolver: Arc<dyn TrackResolver>,
        source: Arc<dyn PlaylistSource>,
        sink: Box<dyn AudioSink>,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        let mut controller = Self {
            model,
            resolver,
            source,
            sink,
            events,
            rng: StdRng::from_os_rng(),
        };
        let volume = controller.model.transport.volume();
        if let Err(e) = controller.sink.set_volume(volume) {
            tracing::warn!(error = %e, "Could not apply initial volume");
        }
        controller
    }

    /// Replaces the shuffle randomness source.
    #[cfg(test)]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn model(&self) -> &AppModel {
        &self.model
    }

    pub fn should_quit(&self) -> bool {
        self.model.should_quit
    }

    /// Housekeeping run once per frame.
    pub fn tick(&mut self) {
        self.model.auto_clear_old_errors();
    }

    /// Runs `work` in the background and posts its event when done.
    fn spawn_event<F>(&self, work: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let events = self.events.clone();
        tokio::spawn(async move {
            if events.send(work.await).is_err() {
                tracing::debug!("Event loop gone, dropping result");
            }
        });
    }

    /// Shows a failure as a dismissible notice.
    pub(crate) fn report(&mut self, error: PlayerError) {
        tracing::warn!(error = %error, "Action failed");
        let message = Self::format_error(&error);
        self.model.set_error(message);
    }

    pub(crate) fn format_error(error: &PlayerError) -> String {
        let error_str = error.to_string();

        if error_str.contains("429") {
            "Rate limited by Spotify. Please wait a moment.".to_string()
        } else if error_str.contains("Sign in to confirm") {
            "The video service wants a sign-in for this track. Try another one.".to_string()
        } else {
            error_str
        }
    }
}
