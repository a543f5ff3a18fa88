//! Applying background results and player reports to the model

use crate::audio::PlayerEvent;
use crate::error::PlayerError;

use super::{AppController, AppEvent};

impl AppController {
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::TrackResolved { token, index, result } => {
                self.apply_resolution(token, index, result);
            }
            AppEvent::PlaylistFetched {
                purpose,
                reference,
                result,
            } => {
                self.apply_playlist(purpose, reference, result);
            }
            AppEvent::AccountRefreshed { user, playlists } => {
                self.apply_account(user, playlists);
            }
            AppEvent::LoggedIn(result) => self.apply_login(result),
            AppEvent::LoggedOut => self.apply_logout(),
            AppEvent::Player(event) => self.handle_player_event(event),
        }
    }

    pub(crate) fn handle_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Position(secs) => {
                tracing::trace!(secs, "Position");
                if self.model.transport.loaded {
                    self.model.transport.sync_position(secs);
                }
            }
            PlayerEvent::Duration(secs) => {
                tracing::debug!(secs, "Duration");
                if self.model.transport.loaded {
                    self.model.transport.sync_duration(secs);
                }
            }
            PlayerEvent::Paused(paused) => {
                if self.model.transport.loaded {
                    self.model.transport.paused = paused;
                }
            }
            PlayerEvent::EndOfTrack => {
                if !self.model.transport.loaded {
                    return;
                }
                // The pending lookup replaces this stream when it lands
                if let Some(index) = self.model.resolving {
                    tracing::debug!(index, "Stream ended while a newer track is resolving");
                    return;
                }

                tracing::info!(index = self.model.session.current_index(), "Track finished");
                if self.next_track().is_none() {
                    self.stop();
                }
            }
            PlayerEvent::Failed(detail) => {
                tracing::error!(error = %detail, "Player could not play the stream");
                let current = self
                    .model
                    .loaded_token
                    .is_some_and(|token| self.model.session.is_current(token));
                if current {
                    self.model.stop_playback();
                }
                self.report(PlayerError::Playback(detail));
            }
        }
    }
}
