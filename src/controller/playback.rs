//! Playback control methods

use crate::error::{PlayerError, ResolveError};
use crate::model::{NextTrack, ResolutionToken, StreamRef};

use super::{AppController, AppEvent};

const VOLUME_STEP: f64 = 0.05;

impl AppController {
    /// Starts resolving the track at `index`. Returns the token the result
    /// will be checked against, or `None` when the index is out of range.
    pub fn play_track(&mut self, index: usize) -> Option<ResolutionToken> {
        let Some((token, track)) = self.model.session.begin_play(index) else {
            tracing::debug!(index, "Ignoring play request outside the playlist");
            return None;
        };

        tracing::info!(index, token = %token, title = %track.title, "Resolving track");
        self.model.resolving = Some(index);
        self.model.ui.track_selected = index;

        let lookup = self.resolver.resolve(&track.title, &track.artist);
        self.spawn_event(async move {
            AppEvent::TrackResolved {
                token,
                index,
                result: lookup.await,
            }
        });
        Some(token)
    }

    pub(crate) fn apply_resolution(
        &mut self,
        token: ResolutionToken,
        index: usize,
        result: Result<StreamRef, ResolveError>,
    ) {
        if !self.model.session.is_current(token) {
            tracing::debug!(index, token = %token, "Dropping stale resolution");
            return;
        }
        self.model.resolving = None;

        let Some(track) = self.model.session.track(index).cloned() else {
            return;
        };

        match result {
            Ok(stream) => {
                if let Err(e) = self.sink.load(&stream).and_then(|_| self.sink.set_paused(false)) {
                    self.report(e);
                    return;
                }
                tracing::info!(
                    index,
                    token = %token,
                    title = %track.title,
                    video_id = %stream.video_id,
                    "Now playing"
                );
                self.model.transport.start(stream.duration_secs);
                self.model.now_playing = Some(track);
                self.model.loaded_token = Some(token);
            }
            Err(reason) => {
                tracing::warn!(index, title = %track.title, error = %reason, "Could not resolve track");
                self.report(PlayerError::resolution(&track.title, reason));
            }
        }
    }

    pub fn next_track(&mut self) -> Option<ResolutionToken> {
        match self.model.session.next_index(&mut self.rng) {
            NextTrack::Play(index) => self.play_track(index),
            NextTrack::Stop => {
                tracing::debug!("Reached the end of the playlist");
                None
            }
        }
    }

    /// Queues the row at `index` to play after the current track.
    pub fn queue_track(&mut self, index: usize) {
        if self.model.session.enqueue(index) {
            tracing::info!(index, "Queued track");
        } else {
            tracing::debug!(index, "Ignoring queue request outside the playlist");
        }
    }

    /// Queues a track by title text. Title matches play before rows queued
    /// by number.
    pub fn queue_title(&mut self, query: &str) {
        match self.model.session.enqueue_title(query) {
            Some(index) => tracing::info!(index, query, "Queued track by title"),
            None => self.report(PlayerError::NoMatchingTrack(query.trim().to_string())),
        }
    }

    pub fn prev_track(&mut self) -> Option<ResolutionToken> {
        let index = self.model.session.prev_index()?;
        self.play_track(index)
    }

    pub fn toggle_playback(&mut self) {
        let Some(paused) = self.model.transport.toggle_pause() else {
            tracing::debug!("Nothing loaded to pause or resume");
            return;
        };

        if let Err(e) = self.sink.set_paused(paused) {
            self.model.transport.toggle_pause();
            self.report(e);
            return;
        }
        tracing::info!(action = if paused { "paused" } else { "resumed" }, "Playback toggled");
    }

    pub fn toggle_shuffle(&mut self) {
        let shuffle = self.model.session.toggle_shuffle();
        tracing::info!(shuffle, "Shuffle toggled");
    }

    pub fn cycle_repeat(&mut self) {
        let repeat = self.model.session.cycle_repeat();
        tracing::info!(repeat = ?repeat, "Repeat mode changed");
    }

    /// Moves the seek handle without touching the player.
    pub fn seek_drag(&mut self, delta: f64) {
        self.model.transport.drag_by(delta);
    }

    pub fn seek_commit(&mut self) {
        let Some(target) = self.model.transport.release() else {
            return;
        };
        if let Err(e) = self.sink.seek(target) {
            self.report(e);
        }
    }

    pub fn seek_cancel(&mut self) {
        self.model.transport.cancel_drag();
    }

    /// Plays the loaded stream again from the start.
    pub fn restart_track(&mut self) {
        if !self.model.transport.loaded {
            tracing::debug!("Nothing loaded to restart");
            return;
        }
        tracing::info!(from = self.model.transport.position_secs(), "Restarting track");
        self.model.transport.cancel_drag();
        if let Err(e) = self.sink.seek(0.0) {
            self.report(e);
            return;
        }
        self.model.transport.sync_position(0.0);
    }

    pub fn change_volume(&mut self, up: bool) {
        let step = if up { VOLUME_STEP } else { -VOLUME_STEP };
        let current = self.model.transport.volume();
        let volume = self.model.transport.set_volume(current + step);
        tracing::debug!(volume, "Volume changed");
        if let Err(e) = self.sink.set_volume(volume) {
            self.report(e);
        }
    }

    /// Stops the player and forgets the loaded stream.
    pub fn stop(&mut self) {
        self.model.stop_playback();
        if let Err(e) = self.sink.stop() {
            self.report(e);
        }
    }
}
