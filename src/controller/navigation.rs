//! Playlist loading, sidebar and account navigation

use crate::error::{PlayerError, SourceError};
use crate::model::{ActiveSection, LIKED_SONGS, Playlist, PlaylistRef, SidebarEntry, UserPlaylist};

use super::{AppController, AppEvent, FetchPurpose};

impl AppController {
    /// Parses a pasted link and loads it. Nothing is fetched for a bad link.
    pub fn load_playlist(&mut self, input: &str) {
        match PlaylistRef::parse(input) {
            Ok(reference) => self.load_reference(reference),
            Err(e) => self.report(e),
        }
    }

    pub fn load_reference(&mut self, reference: PlaylistRef) {
        let token = self.model.playlist_loads.issue();
        self.model.loading_playlist = true;
        tracing::info!(
            link = reference.link().unwrap_or(LIKED_SONGS),
            token = %token,
            "Loading playlist"
        );
        self.fetch(FetchPurpose::Load(token), reference);
    }

    /// Loads the link typed into the input box.
    /// Enter in the input box: `+ title` queues a track by title, anything
    /// else is loaded as a playlist link.
    pub fn submit_input(&mut self) {
        let input = std::mem::take(&mut self.model.ui.link_input);
        if input.trim().is_empty() {
            return;
        }
        if let Some(query) = input.trim_start().strip_prefix('+') {
            self.queue_title(query);
            return;
        }
        self.load_playlist(&input);
    }

    /// Saves the link typed into the input box to the sidebar, without
    /// loading it.
    pub fn save_link(&mut self) {
        let input = std::mem::take(&mut self.model.ui.link_input);
        if input.trim().is_empty() {
            return;
        }
        let reference = match PlaylistRef::parse(&input) {
            Ok(reference) => reference,
            Err(e) => return self.report(e),
        };
        if self.model.ui.sidebar.iter().any(|e| e.reference == reference) {
            tracing::debug!(reference = ?reference, "Playlist already in sidebar");
            return;
        }
        self.fetch(FetchPurpose::Save, reference);
    }

    pub fn open_selected_entry(&mut self) {
        if let Some(entry) = self.model.selected_sidebar_entry() {
            let reference = entry.reference.clone();
            self.load_reference(reference);
        }
    }

    pub fn remove_selected_entry(&mut self) {
        let index = self.model.ui.sidebar_selected;
        if let Some(removed) = self.model.remove_sidebar_entry(index) {
            tracing::info!(name = %removed.name, "Removed sidebar entry");
        }
    }

    fn fetch(&self, purpose: FetchPurpose, reference: PlaylistRef) {
        let request = match &reference {
            PlaylistRef::Liked => self.source.fetch_liked_songs(),
            PlaylistRef::Playlist { id, .. } => self.source.fetch_playlist(id),
        };
        self.spawn_event(async move {
            AppEvent::PlaylistFetched {
                purpose,
                reference,
                result: request.await,
            }
        });
    }

    pub(crate) fn apply_playlist(
        &mut self,
        purpose: FetchPurpose,
        reference: PlaylistRef,
        result: Result<Playlist, SourceError>,
    ) {
        let action = match (&purpose, &reference) {
            (FetchPurpose::Save, _) => "save playlist",
            (FetchPurpose::Load(_), PlaylistRef::Liked) => "liked songs",
            (FetchPurpose::Load(_), PlaylistRef::Playlist { .. }) => "load playlist",
        };

        match purpose {
            FetchPurpose::Load(token) => {
                if !self.model.playlist_loads.is_current(token) {
                    tracing::debug!(token = %token, "Dropping superseded playlist load");
                    return;
                }
                self.model.loading_playlist = false;

                match result {
                    Ok(playlist) => {
                        tracing::info!(name = %playlist.name, tracks = playlist.tracks.len(), "Playlist loaded");
                        self.model.session.load(playlist, &mut self.rng);
                        self.model.resolving = None;
                        self.model.ui.track_selected = self.model.session.current_index();
                        self.model.set_active_section(ActiveSection::Tracks);
                    }
                    Err(e) => self.report(PlayerError::from_source(e, action)),
                }
            }
            FetchPurpose::Save => match result {
                Ok(playlist) => {
                    let added = self.model.add_sidebar_entry(SidebarEntry {
                        name: playlist.name,
                        reference,
                        from_account: false,
                    });
                    tracing::info!(added, "Saved playlist to sidebar");
                }
                Err(e) => self.report(PlayerError::from_source(e, action)),
            },
        }
    }

    // ========================================================================
    // Account
    // ========================================================================

    pub fn login(&mut self) {
        if self.model.user.is_some() || self.model.login_pending {
            return;
        }
        self.model.login_pending = true;
        tracing::info!("Starting Spotify login");
        let request = self.source.login();
        self.spawn_event(async move { AppEvent::LoggedIn(request.await) });
    }

    pub fn logout(&mut self) {
        if self.model.user.is_none() {
            return;
        }
        let request = self.source.logout();
        self.spawn_event(async move {
            if let Err(e) = request.await {
                tracing::warn!(error = %e, "Logout did not complete cleanly");
            }
            AppEvent::LoggedOut
        });
    }

    /// Re-reads the account name and the user's own playlists for the sidebar.
    pub fn refresh_account(&mut self) {
        let user = self.source.current_user();
        let playlists = self.source.fetch_user_playlists();
        self.spawn_event(async move {
            AppEvent::AccountRefreshed {
                user: user.await,
                playlists: playlists.await,
            }
        });
    }

    /// A session restored at startup behaves like a fresh login.
    pub fn session_restored(&mut self, name: String) {
        self.apply_login(Ok(name));
    }

    pub(crate) fn apply_login(&mut self, result: Result<String, SourceError>) {
        self.model.login_pending = false;
        match result {
            Ok(name) => {
                tracing::info!(user = %name, "Logged in");
                self.model.user = Some(name);
                self.refresh_account();
            }
            Err(e) => {
                tracing::error!(error = %e, "Login failed");
                self.model.set_error(format!("Spotify login failed: {}", e));
            }
        }
    }

    pub(crate) fn apply_logout(&mut self) {
        self.model.user = None;
        self.model.clear_account_playlists();
        tracing::info!("Logged out");
    }

    pub(crate) fn apply_account(
        &mut self,
        user: Result<String, SourceError>,
        playlists: Result<Vec<UserPlaylist>, SourceError>,
    ) {
        match user {
            Ok(name) => self.model.user = Some(name),
            Err(SourceError::Unauthenticated) => {
                if self.model.user.is_some() {
                    tracing::warn!("Spotify session no longer valid");
                    self.apply_logout();
                    self.model.set_error("Spotify session expired, press L to log in again".to_string());
                }
                return;
            }
            Err(e) => tracing::warn!(error = %e, "Could not read account name"),
        }
        self.apply_user_playlists(playlists);
    }

    fn apply_user_playlists(&mut self, result: Result<Vec<UserPlaylist>, SourceError>) {
        match result {
            Ok(playlists) => {
                tracing::info!(count = playlists.len(), "Loaded account playlists");
                self.model.set_account_playlists(playlists);
            }
            Err(SourceError::Unauthenticated) => {
                tracing::debug!("Not logged in, no account playlists");
            }
            Err(e) => self.report(PlayerError::from_source(e, "account playlists")),
        }
    }
}
