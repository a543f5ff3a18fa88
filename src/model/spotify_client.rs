//! Spotify API client wrapper
//!
//! Public playlists are read with an app-only token (client credentials),
//! which rspotify refreshes on its own. Once the user logs in, every request
//! goes through their token instead, so private playlists and liked songs
//! become available.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use futures::future::BoxFuture;
use rspotify::{
    AuthCodeSpotify, ClientCredsSpotify, Config as ClientConfig, Credentials,
    model::{PlayableItem, PlaylistId},
    prelude::*,
};
use tokio::sync::RwLock;

use crate::auth::{AuthTokens, Authenticator};
use crate::error::SourceError;
use super::types::{LIKED_SONGS, Playlist, Track, UserPlaylist, mmss};

/// Where playlists come from
pub trait PlaylistSource: Send + Sync {
    fn fetch_playlist(&self, id: &str) -> BoxFuture<'static, Result<Playlist, SourceError>>;
    fn fetch_liked_songs(&self) -> BoxFuture<'static, Result<Playlist, SourceError>>;
    /// The logged in user's own playlists
    fn fetch_user_playlists(&self) -> BoxFuture<'static, Result<Vec<UserPlaylist>, SourceError>>;
    /// Display name of the logged in user
    fn current_user(&self) -> BoxFuture<'static, Result<String, SourceError>>;
    /// Runs the browser login and returns the display name
    fn login(&self) -> BoxFuture<'static, Result<String, SourceError>>;
    fn logout(&self) -> BoxFuture<'static, Result<(), SourceError>>;
}

struct UserSession {
    client: AuthCodeSpotify,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

/// Spotify API client with token refresh support
#[derive(Clone)]
pub struct SpotifyClient {
    app: Arc<ClientCredsSpotify>,
    user: Arc<RwLock<Option<UserSession>>>,
    auth: Arc<Authenticator>,
}

impl SpotifyClient {
    pub fn new(client_id: &str, client_secret: &str, auth: Authenticator) -> Self {
        let app = ClientCredsSpotify::with_config(
            Credentials::new(client_id, client_secret),
            ClientConfig {
                token_cached: false,
                token_refreshing: true,
                ..Default::default()
            },
        );
        Self {
            app: Arc::new(app),
            user: Arc::new(RwLock::new(None)),
            auth: Arc::new(auth),
        }
    }

    /// Exchanges a stored refresh token for a session. Returns the display
    /// name when that worked.
    pub async fn restore_session(&self) -> Option<String> {
        let refresh_token = self.auth.stored_refresh_token()?;
        tracing::info!("Found stored refresh token, restoring session");

        let tokens = match self.auth.refresh_access_token(&refresh_token).await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!(error = %e, "Stored refresh token rejected");
                self.auth.forget_refresh_token();
                return None;
            }
        };

        match self.start_session(tokens).await {
            Ok(name) => Some(name),
            Err(e) => {
                tracing::warn!(error = %e, "Could not restore session");
                None
            }
        }
    }

    async fn start_session(&self, tokens: AuthTokens) -> Result<String, SourceError> {
        let client = AuthCodeSpotify::with_config(
            Credentials::default(),
            Default::default(),
            ClientConfig {
                token_cached: false,
                token_refreshing: false,
                ..Default::default()
            },
        );
        set_token(&client, &tokens).await?;

        let me = client.me().await.map_err(|e| classify_message(&e.to_string()))?;
        let name = me.display_name.unwrap_or_else(|| me.id.id().to_string());
        tracing::info!(user = %name, "Spotify session started");

        *self.user.write().await = Some(UserSession {
            client,
            refresh_token: tokens.refresh_token,
            expires_at: tokens.expires_at,
        });
        Ok(name)
    }

    pub async fn token_needs_refresh(&self) -> bool {
        self.user
            .read()
            .await
            .as_ref()
            .is_some_and(|s| AuthTokens::expires_soon(s.expires_at))
    }

    pub async fn refresh_token_if_needed(&self) -> Result<bool> {
        if !self.token_needs_refresh().await {
            return Ok(false);
        }

        let Some(refresh_token) = self.user.read().await.as_ref().map(|s| s.refresh_token.clone()) else {
            return Ok(false);
        };

        tracing::info!("Token expiring soon, refreshing...");

        let tokens = match self.auth.refresh_access_token(&refresh_token).await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::error!(error = %e, "Failed to refresh token");
                return Err(e);
            }
        };

        let mut user = self.user.write().await;
        if let Some(session) = user.as_mut() {
            set_token(&session.client, &tokens).await?;
            session.refresh_token = tokens.refresh_token;
            session.expires_at = tokens.expires_at;
            tracing::info!("Token refreshed successfully");
        }
        Ok(true)
    }

    async fn user_client(&self) -> Option<AuthCodeSpotify> {
        self.user.read().await.as_ref().map(|s| s.client.clone())
    }

    async fn ensure_app_token(&self) -> Result<(), SourceError> {
        let missing = self
            .app
            .token
            .lock()
            .await
            .map(|token| token.is_none())
            .unwrap_or(true);
        if missing {
            tracing::debug!("Requesting app token");
            self.app
                .request_token()
                .await
                .map_err(|e| classify_message(&e.to_string()))?;
        }
        Ok(())
    }

    pub async fn get_playlist(&self, playlist_id: &str) -> Result<Playlist, SourceError> {
        crate::log_api_request!("playlist", playlist_id = %playlist_id);
        let id = PlaylistId::from_id(playlist_id)
            .map(|id| id.into_static())
            .map_err(|_| SourceError::NotFound)?;

        let result = match self.user_client().await {
            Some(client) => fetch_playlist_with(&client, id).await,
            None => {
                self.ensure_app_token().await?;
                fetch_playlist_with(self.app.as_ref(), id).await
            }
        };
        crate::log_api_result!("playlist", result)
    }

    pub async fn get_liked_songs(&self) -> Result<Playlist, SourceError> {
        let client = self.user_client().await.ok_or(SourceError::Unauthenticated)?;

        let saved_tracks: Vec<_> = client
            .current_user_saved_tracks(None)
            .try_collect()
            .await
            .map_err(|e| classify_message(&e.to_string()))?;

        let tracks = saved_tracks
            .into_iter()
            .map(|saved| {
                let track = saved.track;
                Track {
                    title: track.name,
                    artist: join_artists(track.artists.iter().map(|a| a.name.as_str())),
                    album: track.album.name,
                    added: saved.added_at.format("%Y-%m-%d").to_string(),
                    duration: mmss(track.duration.num_milliseconds()),
                }
            })
            .collect();

        crate::log_api_result!(
            "liked songs",
            Ok::<_, SourceError>(Playlist {
                name: LIKED_SONGS.to_string(),
                tracks,
            })
        )
    }

    pub async fn get_user_playlists(&self) -> Result<Vec<UserPlaylist>, SourceError> {
        let client = self.user_client().await.ok_or(SourceError::Unauthenticated)?;

        let me = client.me().await.map_err(|e| classify_message(&e.to_string()))?;
        let all_playlists: Vec<_> = client
            .current_user_playlists()
            .try_collect()
            .await
            .map_err(|e| classify_message(&e.to_string()))?;

        let playlists = all_playlists
            .into_iter()
            .filter(|p| p.owner.id == me.id)
            .map(|p| UserPlaylist {
                link: p
                    .external_urls
                    .get("spotify")
                    .cloned()
                    .unwrap_or_else(|| format!("https://open.spotify.com/playlist/{}", p.id.id())),
                name: p.name,
            })
            .collect();

        crate::log_api_result!("user playlists", Ok::<_, SourceError>(playlists))
    }

    pub async fn get_current_user(&self) -> Result<String, SourceError> {
        let client = self.user_client().await.ok_or(SourceError::Unauthenticated)?;
        let me = client.me().await.map_err(|e| classify_message(&e.to_string()))?;
        Ok(me.display_name.unwrap_or_else(|| me.id.id().to_string()))
    }

    pub async fn login(&self) -> Result<String, SourceError> {
        let tokens = self
            .auth
            .perform_browser_auth()
            .await
            .map_err(|e| SourceError::Transient(format!("{:#}", e)))?;
        self.start_session(tokens).await
    }

    pub async fn logout(&self) {
        *self.user.write().await = None;
        self.auth.forget_refresh_token();
        tracing::info!("Logged out of Spotify");
    }
}

impl PlaylistSource for SpotifyClient {
    fn fetch_playlist(&self, id: &str) -> BoxFuture<'static, Result<Playlist, SourceError>> {
        let client = self.clone();
        let id = id.to_string();
        Box::pin(async move { client.get_playlist(&id).await })
    }

    fn fetch_liked_songs(&self) -> BoxFuture<'static, Result<Playlist, SourceError>> {
        let client = self.clone();
        Box::pin(async move { client.get_liked_songs().await })
    }

    fn fetch_user_playlists(&self) -> BoxFuture<'static, Result<Vec<UserPlaylist>, SourceError>> {
        let client = self.clone();
        Box::pin(async move { client.get_user_playlists().await })
    }

    fn current_user(&self) -> BoxFuture<'static, Result<String, SourceError>> {
        let client = self.clone();
        Box::pin(async move { client.get_current_user().await })
    }

    fn login(&self) -> BoxFuture<'static, Result<String, SourceError>> {
        let client = self.clone();
        Box::pin(async move { SpotifyClient::login(&client).await })
    }

    fn logout(&self) -> BoxFuture<'static, Result<(), SourceError>> {
        let client = self.clone();
        Box::pin(async move {
            SpotifyClient::logout(&client).await;
            Ok(())
        })
    }
}

async fn set_token(client: &AuthCodeSpotify, tokens: &AuthTokens) -> Result<(), SourceError> {
    let mut guard = client
        .token
        .lock()
        .await
        .map_err(|_| SourceError::Transient("token store unavailable".to_string()))?;
    *guard = Some(tokens.rspotify_token());
    Ok(())
}

async fn fetch_playlist_with<C: BaseClient>(client: &C, id: PlaylistId<'static>) -> Result<Playlist, SourceError> {
    let playlist = client
        .playlist(id.clone(), None, None)
        .await
        .map_err(|e| classify_message(&e.to_string()))?;

    let items: Vec<_> = client
        .playlist_items(id, None, None)
        .try_collect()
        .await
        .map_err(|e| classify_message(&e.to_string()))?;

    let tracks = items
        .into_iter()
        .filter_map(|item| {
            let added = item
                .added_at
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            match item.track? {
                PlayableItem::Track(track) => Some(Track {
                    title: track.name,
                    artist: join_artists(track.artists.iter().map(|a| a.name.as_str())),
                    album: track.album.name,
                    added,
                    duration: mmss(track.duration.num_milliseconds()),
                }),
                PlayableItem::Episode(episode) => Some(Track {
                    title: episode.name,
                    artist: episode.show.name.clone(),
                    album: episode.show.name,
                    added,
                    duration: mmss(episode.duration.num_milliseconds()),
                }),
                PlayableItem::Unknown(_) => None,
            }
        })
        .collect();

    Ok(Playlist {
        name: playlist.name,
        tracks,
    })
}

fn join_artists<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

/// Sorts an API error message into the failure kinds the controller tells
/// apart.
pub fn classify_message(message: &str) -> SourceError {
    if message.contains("401") || message.contains("Unauthorized") {
        SourceError::Unauthenticated
    } else if message.contains("403") || message.contains("Forbidden") {
        SourceError::Forbidden
    } else if message.contains("404") || message.contains("Not Found") {
        SourceError::NotFound
    } else {
        SourceError::Transient(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_source_errors() {
        assert_eq!(
            classify_message("http error: status code 401 Unauthorized"),
            SourceError::Unauthenticated
        );
        assert_eq!(classify_message("status code 403 Forbidden"), SourceError::Forbidden);
        assert_eq!(classify_message("status code 404 Not Found"), SourceError::NotFound);
        assert_eq!(
            classify_message("error sending request: connection reset"),
            SourceError::Transient("error sending request: connection reset".to_string())
        );
    }

    #[test]
    fn artists_are_comma_joined() {
        assert_eq!(join_artists(["A", "B", "C"].into_iter()), "A, B, C");
        assert_eq!(join_artists(std::iter::empty()), "");
    }
}
