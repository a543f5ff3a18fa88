//! In-process stand-ins for the resolver, playlist source and audio sink.
//!
//! Resolver and source requests stay pending until the test completes them,
//! so completion order is under the test's control.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{mpsc, oneshot};

use super::{AppController, AppEvent};
use crate::audio::AudioSink;
use crate::error::{PlayerError, ResolveError, SourceError};
use crate::model::{AppModel, Playlist, PlaylistSource, RepeatMode, StreamRef, Track, UserPlaylist};
use crate::resolver::TrackResolver;

type Pending<T> = Arc<Mutex<Vec<(String, oneshot::Sender<T>)>>>;

fn take_pending<T>(pending: &Pending<T>, key: &str) -> oneshot::Sender<T> {
    let mut pending = pending.lock().unwrap();
    let position = pending
        .iter()
        .position(|(k, _)| k == key)
        .unwrap_or_else(|| panic!("no pending request for {key}"));
    pending.remove(position).1
}

pub fn stream_for(title: &str) -> StreamRef {
    StreamRef {
        url: format!("https://stream.test/{title}"),
        video_id: format!("vid-{title}"),
        title: title.to_string(),
        duration_secs: Some(200.0),
    }
}

#[derive(Clone, Default)]
pub struct FakeResolver {
    requests: Arc<Mutex<Vec<String>>>,
    pending: Pending<Result<StreamRef, ResolveError>>,
}

impl FakeResolver {
    /// Titles in the order they were asked for
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn complete(&self, title: &str) {
        let _ = take_pending(&self.pending, title).send(Ok(stream_for(title)));
    }

    pub fn fail(&self, title: &str, error: ResolveError) {
        let _ = take_pending(&self.pending, title).send(Err(error));
    }
}

impl TrackResolver for FakeResolver {
    fn resolve(&self, title: &str, _artist: &str) -> BoxFuture<'static, Result<StreamRef, ResolveError>> {
        let (tx, rx) = oneshot::channel();
        self.requests.lock().unwrap().push(title.to_string());
        self.pending.lock().unwrap().push((title.to_string(), tx));
        Box::pin(async move {
            rx.await
                .unwrap_or_else(|_| Err(ResolveError::Transient("request dropped".to_string())))
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SinkCall {
    Load(String),
    Pause(bool),
    Seek(f64),
    Volume(f64),
    Stop,
}

#[derive(Clone, Default)]
pub struct FakeSink {
    calls: Arc<Mutex<Vec<SinkCall>>>,
}

impl FakeSink {
    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn loads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::Load(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: SinkCall) -> Result<(), PlayerError> {
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

impl AudioSink for FakeSink {
    fn load(&mut self, stream: &StreamRef) -> Result<(), PlayerError> {
        self.record(SinkCall::Load(stream.url.clone()))
    }

    fn set_paused(&mut self, paused: bool) -> Result<(), PlayerError> {
        self.record(SinkCall::Pause(paused))
    }

    fn seek(&mut self, position_secs: f64) -> Result<(), PlayerError> {
        self.record(SinkCall::Seek(position_secs))
    }

    fn set_volume(&mut self, volume: f64) -> Result<(), PlayerError> {
        self.record(SinkCall::Volume(volume))
    }

    fn stop(&mut self) -> Result<(), PlayerError> {
        self.record(SinkCall::Stop)
    }
}

/// Playlist fetches are keyed by id; liked songs use `"liked"`.
#[derive(Clone, Default)]
pub struct FakeSource {
    requests: Arc<Mutex<Vec<String>>>,
    pending: Pending<Result<Playlist, SourceError>>,
    pub user: Arc<Mutex<Option<String>>>,
    pub user_playlists: Arc<Mutex<Vec<UserPlaylist>>>,
}

impl FakeSource {
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn complete(&self, key: &str, result: Result<Playlist, SourceError>) {
        let _ = take_pending(&self.pending, key).send(result);
    }

    fn request(&self, key: &str) -> BoxFuture<'static, Result<Playlist, SourceError>> {
        let (tx, rx) = oneshot::channel();
        self.requests.lock().unwrap().push(key.to_string());
        self.pending.lock().unwrap().push((key.to_string(), tx));
        Box::pin(async move {
            rx.await
                .unwrap_or_else(|_| Err(SourceError::Transient("request dropped".to_string())))
        })
    }
}

impl PlaylistSource for FakeSource {
    fn fetch_playlist(&self, id: &str) -> BoxFuture<'static, Result<Playlist, SourceError>> {
        self.request(id)
    }

    fn fetch_liked_songs(&self) -> BoxFuture<'static, Result<Playlist, SourceError>> {
        self.request("liked")
    }

    fn fetch_user_playlists(&self) -> BoxFuture<'static, Result<Vec<UserPlaylist>, SourceError>> {
        let logged_in = self.user.lock().unwrap().is_some();
        let playlists = self.user_playlists.lock().unwrap().clone();
        Box::pin(async move {
            if logged_in { Ok(playlists) } else { Err(SourceError::Unauthenticated) }
        })
    }

    fn current_user(&self) -> BoxFuture<'static, Result<String, SourceError>> {
        let user = self.user.lock().unwrap().clone();
        Box::pin(async move { user.ok_or(SourceError::Unauthenticated) })
    }

    fn login(&self) -> BoxFuture<'static, Result<String, SourceError>> {
        let user = self.user.clone();
        Box::pin(async move {
            let name = "Test User".to_string();
            *user.lock().unwrap() = Some(name.clone());
            Ok(name)
        })
    }

    fn logout(&self) -> BoxFuture<'static, Result<(), SourceError>> {
        let user = self.user.clone();
        Box::pin(async move {
            *user.lock().unwrap() = None;
            Ok(())
        })
    }
}

pub struct Harness {
    pub controller: AppController,
    pub resolver: FakeResolver,
    pub source: FakeSource,
    pub sink: FakeSink,
    events: mpsc::UnboundedReceiver<AppEvent>,
}

impl Harness {
    pub fn new() -> Self {
        let resolver = FakeResolver::default();
        let source = FakeSource::default();
        let sink = FakeSink::default();
        let (tx, events) = mpsc::unbounded_channel();
        let controller = AppController::new(
            AppModel::new(false, RepeatMode::None, 1.0),
            Arc::new(resolver.clone()),
            Arc::new(source.clone()),
            Box::new(sink.clone()),
            tx,
        )
        .with_rng(StdRng::seed_from_u64(11));
        Self {
            controller,
            resolver,
            source,
            sink,
            events,
        }
    }

    /// A harness with `titles` already loaded as the current playlist
    pub fn with_tracks(titles: &[&str]) -> Self {
        let mut harness = Self::new();
        harness.load(titles);
        harness
    }

    pub fn load(&mut self, titles: &[&str]) {
        let playlist = playlist("Test", titles);
        let controller = &mut self.controller;
        controller.model.session.load(playlist, &mut controller.rng);
    }

    /// Waits for the next background event and applies it.
    pub async fn pump(&mut self) {
        let event = tokio::time::timeout(Duration::from_secs(2), self.events.recv())
            .await
            .expect("timed out waiting for an event")
            .expect("event channel closed");
        self.controller.handle_event(event);
    }

    pub async fn pump_n(&mut self, n: usize) {
        for _ in 0..n {
            self.pump().await;
        }
    }

    /// Lets spawned tasks run without waiting for an event.
    pub async fn settle(&mut self) {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    pub fn now_playing_title(&self) -> Option<String> {
        self.controller.model.now_playing.as_ref().map(|t| t.title.clone())
    }
}

pub fn playlist(name: &str, titles: &[&str]) -> Playlist {
    Playlist {
        name: name.to_string(),
        tracks: titles.iter().map(|t| Track::new(t, "Artist")).collect(),
    }
}
