//! Playback session and track selection policy
//!
//! The session holds the loaded tracks, the current index and the mode flags.
//! Every track change issues a new [`ResolutionToken`]; asynchronous work
//! captures the token at issue time and is applied only while it is still the
//! current one.

use std::collections::VecDeque;

use rand::Rng;

use super::types::{Playlist, RepeatMode, Track};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResolutionToken(u64);

impl std::fmt::Display for ResolutionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic token source. Only the most recently issued token is current.
#[derive(Clone, Debug, Default)]
pub struct StalenessGuard {
    current: u64,
}

impl StalenessGuard {
    pub fn issue(&mut self) -> ResolutionToken {
        self.current += 1;
        ResolutionToken(self.current)
    }

    pub fn is_current(&self, token: ResolutionToken) -> bool {
        token.0 == self.current
    }

    pub fn current(&self) -> Option<ResolutionToken> {
        (self.current > 0).then_some(ResolutionToken(self.current))
    }
}

/// Outcome of asking for the track after the current one
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NextTrack {
    Play(usize),
    Stop,
}

#[derive(Clone, Debug, Default)]
pub struct PlaybackSession {
    name: String,
    tracks: Vec<Track>,
    current_index: usize,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    guard: StalenessGuard,
    /// Rows queued by title, played before `queued`
    by_title: VecDeque<usize>,
    queued: VecDeque<usize>,
}

impl PlaybackSession {
    pub fn new(shuffle: bool, repeat: RepeatMode) -> Self {
        Self {
            shuffle,
            repeat,
            ..Self::default()
        }
    }

    /// Replaces the tracks. The index starts at 0, or at a random row under
    /// shuffle. Nothing is played, and work issued for the old tracks becomes
    /// stale.
    pub fn load<R: Rng>(&mut self, playlist: Playlist, rng: &mut R) {
        self.guard.issue();
        self.by_title.clear();
        self.queued.clear();
        self.name = playlist.name;
        self.tracks = playlist.tracks;
        self.current_index = if self.shuffle && !self.tracks.is_empty() {
            rng.random_range(0..self.tracks.len())
        } else {
            0
        };
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Moves to `index` and issues a fresh token. `None` when out of range,
    /// in which case nothing changes.
    pub fn begin_play(&mut self, index: usize) -> Option<(ResolutionToken, Track)> {
        let track = self.tracks.get(index)?.clone();
        self.current_index = index;
        Some((self.guard.issue(), track))
    }

    pub fn is_current(&self, token: ResolutionToken) -> bool {
        self.guard.is_current(token)
    }

    pub fn current_token(&self) -> Option<ResolutionToken> {
        self.guard.current()
    }

    /// Queues the row at `index` to play next. `false` when out of range.
    pub fn enqueue(&mut self, index: usize) -> bool {
        if index >= self.tracks.len() {
            return false;
        }
        self.queued.push_back(index);
        true
    }

    /// Queues the first row whose title contains `query`, ignoring case.
    /// Title matches play ahead of rows queued with [`Self::enqueue`].
    pub fn enqueue_title(&mut self, query: &str) -> Option<usize> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }
        let index = self
            .tracks
            .iter()
            .position(|track| track.title.to_lowercase().contains(&query))?;
        self.by_title.push_back(index);
        Some(index)
    }

    /// Queued rows in the order they will play
    pub fn queued(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_title.iter().chain(self.queued.iter()).copied()
    }

    /// Takes the next queued row if there is one, otherwise applies the
    /// repeat and shuffle policy.
    pub fn next_index<R: Rng>(&mut self, rng: &mut R) -> NextTrack {
        let len = self.tracks.len();
        if len == 0 {
            return NextTrack::Stop;
        }

        if let Some(index) = self.by_title.pop_front().or_else(|| self.queued.pop_front()) {
            return NextTrack::Play(index);
        }

        if self.repeat == RepeatMode::One {
            return NextTrack::Play(self.current_index);
        }

        if self.shuffle {
            if len == 1 {
                return NextTrack::Play(0);
            }
            // Uniform over the other len - 1 rows
            let mut pick = rng.random_range(0..len - 1);
            if pick >= self.current_index {
                pick += 1;
            }
            return NextTrack::Play(pick);
        }

        let next = self.current_index + 1;
        if next < len {
            NextTrack::Play(next)
        } else if self.repeat == RepeatMode::All {
            NextTrack::Play(0)
        } else {
            NextTrack::Stop
        }
    }

    pub fn prev_index(&self) -> Option<usize> {
        let len = self.tracks.len();
        if len == 0 {
            return None;
        }
        if self.current_index > 0 {
            Some(self.current_index - 1)
        } else if self.repeat == RepeatMode::All {
            Some(len - 1)
        } else {
            Some(0)
        }
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        self.shuffle
    }

    pub fn cycle_repeat(&mut self) -> RepeatMode {
        self.repeat = self.repeat.next();
        self.repeat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn playlist(titles: &[&str]) -> Playlist {
        Playlist {
            name: "Test".to_string(),
            tracks: titles.iter().map(|t| Track::new(t, "Artist")).collect(),
        }
    }

    fn session_at(titles: &[&str], index: usize, repeat: RepeatMode) -> PlaybackSession {
        let mut rng = StdRng::seed_from_u64(7);
        let mut session = PlaybackSession::new(false, repeat);
        session.load(playlist(titles), &mut rng);
        session.begin_play(index).unwrap();
        session
    }

    #[test]
    fn guard_only_accepts_latest_token() {
        let mut guard = StalenessGuard::default();
        assert_eq!(guard.current(), None);
        let first = guard.issue();
        let second = guard.issue();
        assert!(!guard.is_current(first));
        assert!(guard.is_current(second));
        assert!(first < second);
    }

    #[test]
    fn begin_play_out_of_range_changes_nothing() {
        let mut session = session_at(&["A", "B"], 1, RepeatMode::None);
        let token = session.current_token();
        assert!(session.begin_play(2).is_none());
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.current_token(), token);
    }

    #[test]
    fn repeat_none_stops_after_last_track() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut session = session_at(&["A", "B", "C"], 2, RepeatMode::None);
        assert_eq!(session.next_index(&mut rng), NextTrack::Stop);
    }

    #[test]
    fn repeat_all_wraps_to_first_track() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut session = session_at(&["A", "B", "C"], 2, RepeatMode::All);
        assert_eq!(session.next_index(&mut rng), NextTrack::Play(0));
    }

    #[test]
    fn repeat_one_keeps_current_index() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut session = session_at(&["A", "B", "C"], 1, RepeatMode::One);
        session.shuffle = true;
        assert_eq!(session.next_index(&mut rng), NextTrack::Play(1));
    }

    #[test]
    fn shuffle_never_picks_current_track() {
        let mut rng = StdRng::seed_from_u64(42);
        for len in 2..6 {
            let titles: Vec<String> = (0..len).map(|i| format!("T{i}")).collect();
            let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
            for current in 0..len {
                let mut session = session_at(&refs, current, RepeatMode::None);
                session.shuffle = true;
                for _ in 0..50 {
                    match session.next_index(&mut rng) {
                        NextTrack::Play(i) => {
                            assert_ne!(i, current);
                            assert!(i < len);
                        }
                        NextTrack::Stop => panic!("shuffle never stops"),
                    }
                }
            }
        }
    }

    #[test]
    fn shuffle_reaches_every_other_track() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut session = session_at(&["A", "B", "C", "D"], 2, RepeatMode::None);
        session.shuffle = true;
        let mut seen = [false; 4];
        for _ in 0..200 {
            if let NextTrack::Play(i) = session.next_index(&mut rng) {
                seen[i] = true;
            }
        }
        assert_eq!(seen, [true, true, false, true]);
    }

    #[test]
    fn shuffle_with_single_track_replays_it() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut session = session_at(&["A"], 0, RepeatMode::None);
        session.shuffle = true;
        assert_eq!(session.next_index(&mut rng), NextTrack::Play(0));
    }

    #[test]
    fn prev_at_start_depends_on_repeat() {
        let wrapping = session_at(&["A", "B", "C"], 0, RepeatMode::All);
        assert_eq!(wrapping.prev_index(), Some(2));

        let clamped = session_at(&["A", "B", "C"], 0, RepeatMode::None);
        assert_eq!(clamped.prev_index(), Some(0));

        let middle = session_at(&["A", "B", "C"], 2, RepeatMode::One);
        assert_eq!(middle.prev_index(), Some(1));
    }

    #[test]
    fn empty_session_has_nothing_to_select() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut session = PlaybackSession::new(true, RepeatMode::All);
        assert_eq!(session.next_index(&mut rng), NextTrack::Stop);
        assert_eq!(session.prev_index(), None);
    }

    #[test]
    fn load_resets_index_or_randomizes_under_shuffle() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut session = session_at(&["A", "B", "C"], 2, RepeatMode::None);
        session.load(playlist(&["X", "Y"]), &mut rng);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.name(), "Test");

        session.shuffle = true;
        session.load(playlist(&["X", "Y", "Z"]), &mut rng);
        assert!(session.current_index() < 3);

        session.load(playlist(&[]), &mut rng);
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn load_invalidates_outstanding_tokens() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut session = session_at(&["A", "B"], 0, RepeatMode::None);
        let (token, _) = session.begin_play(1).unwrap();
        session.load(playlist(&["X"]), &mut rng);
        assert!(!session.is_current(token));
    }

    #[test]
    fn queued_rows_play_before_the_policy() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut session = session_at(&["A", "B", "C", "D"], 0, RepeatMode::One);
        assert!(session.enqueue(3));
        assert!(session.enqueue(2));
        assert!(!session.enqueue(4));

        assert_eq!(session.next_index(&mut rng), NextTrack::Play(3));
        assert_eq!(session.next_index(&mut rng), NextTrack::Play(2));
        assert_eq!(session.next_index(&mut rng), NextTrack::Play(0));
    }

    #[test]
    fn title_queue_goes_ahead_of_row_queue() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut session = session_at(&["Intro", "Blue Monday", "Outro"], 0, RepeatMode::None);
        session.enqueue(2);
        assert_eq!(session.enqueue_title("  blue "), Some(1));
        assert_eq!(session.enqueue_title("missing"), None);
        assert_eq!(session.enqueue_title(""), None);
        assert_eq!(session.queued().collect::<Vec<_>>(), vec![1, 2]);

        assert_eq!(session.next_index(&mut rng), NextTrack::Play(1));
        assert_eq!(session.next_index(&mut rng), NextTrack::Play(2));
        assert_eq!(session.queued().count(), 0);
    }

    #[test]
    fn load_drops_the_queue() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut session = session_at(&["A", "B", "C"], 0, RepeatMode::None);
        session.enqueue(2);
        session.enqueue_title("B");
        session.load(playlist(&["X", "Y", "Z"]), &mut rng);
        assert_eq!(session.queued().count(), 0);
        assert_eq!(session.next_index(&mut rng), NextTrack::Play(1));
    }
}
