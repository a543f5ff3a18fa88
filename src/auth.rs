//! Spotify user login
//!
//! The browser flow and token refresh are delegated to `librespot-oauth`.
//! Only the refresh token is kept on disk, in the cache directory.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use librespot_oauth::{OAuthClient, OAuthClientBuilder, OAuthToken};
use rspotify::Token;

pub const SCOPES: &str = "playlist-read-private user-read-private user-library-read";

const RESPONSE: &str = r#"
<!doctype html>
<html>
<head><title>Success</title></head>
<body><h1>Logged in to S-Potify!</h1><p>You can close this tab.</p><script>window.close();</script></body>
</html>
"#;
const REFRESH_TOKEN_FILE: &str = "refresh_token";

/// Fallback lifetime when the provider reports an expiry we cannot convert
const DEFAULT_TOKEN_SECS: i64 = 3600;

#[derive(Clone, Debug)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthTokens {
    fn from_oauth(token: OAuthToken) -> Self {
        let remaining = token.expires_at.saturating_duration_since(Instant::now());
        let expires_at = chrono::Duration::from_std(remaining)
            .map(|d| Utc::now() + d)
            .unwrap_or_else(|_| Utc::now() + chrono::Duration::seconds(DEFAULT_TOKEN_SECS));
        Self {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at,
        }
    }

    /// Less than five minutes of validity left
    pub fn expires_soon(expires_at: DateTime<Utc>) -> bool {
        (expires_at - Utc::now()).num_seconds() < 300
    }

    pub fn rspotify_token(&self) -> Token {
        Token {
            access_token: self.access_token.clone(),
            expires_in: self.expires_at - Utc::now(),
            expires_at: Some(self.expires_at),
            scopes: SCOPES
                .split_whitespace()
                .map(|s| s.to_string())
                .collect::<HashSet<String>>(),
            refresh_token: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Authenticator {
    client_id: String,
    redirect_uri: String,
    cache_dir: PathBuf,
}

impl Authenticator {
    pub fn new(client_id: &str, redirect_uri: &str, cache_dir: PathBuf) -> Self {
        Self {
            client_id: client_id.to_string(),
            redirect_uri: redirect_uri.to_string(),
            cache_dir,
        }
    }

    fn oauth_client(&self, interactive: bool) -> Result<OAuthClient> {
        let builder = OAuthClientBuilder::new(
            &self.client_id,
            &self.redirect_uri,
            SCOPES.split_whitespace().collect(),
        );
        let builder = if interactive {
            builder.open_in_browser().with_custom_message(RESPONSE)
        } else {
            builder
        };
        builder.build().context("Failed to build OAuth client")
    }

    pub async fn perform_browser_auth(&self) -> Result<AuthTokens> {
        tracing::info!("Starting browser-based OAuth flow");
        let token = self
            .oauth_client(true)?
            .get_access_token_async()
            .await
            .context("Browser login did not complete")?;

        let tokens = AuthTokens::from_oauth(token);
        self.store_refresh_token(&tokens.refresh_token);
        tracing::info!(expires_at = %tokens.expires_at, "Browser authentication completed successfully");
        Ok(tokens)
    }

    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<AuthTokens> {
        let token = self
            .oauth_client(false)?
            .refresh_token_async(refresh_token)
            .await
            .context("Failed to refresh access token")?;

        let tokens = AuthTokens::from_oauth(token);
        self.store_refresh_token(&tokens.refresh_token);
        tracing::debug!(expires_at = %tokens.expires_at, "Token refreshed");
        Ok(tokens)
    }

    pub fn stored_refresh_token(&self) -> Option<String> {
        fs::read_to_string(self.cache_dir.join(REFRESH_TOKEN_FILE))
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    pub fn forget_refresh_token(&self) {
        let path = self.cache_dir.join(REFRESH_TOKEN_FILE);
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %e, path = %path.display(), "Could not remove stored refresh token");
            }
        }
    }

    fn store_refresh_token(&self, refresh_token: &str) {
        let result = fs::create_dir_all(&self.cache_dir)
            .and_then(|_| fs::write(self.cache_dir.join(REFRESH_TOKEN_FILE), refresh_token));
        match result {
            Ok(()) => tracing::debug!("Saved refresh token to disk"),
            Err(e) => tracing::warn!(error = %e, "Could not save refresh token"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator(dir: &str) -> Authenticator {
        let cache_dir = std::env::temp_dir().join(format!("s-potify-auth-{}-{}", dir, std::process::id()));
        Authenticator::new("client", "http://127.0.0.1:8898/login", cache_dir)
    }

    #[test]
    fn refresh_token_is_stored_and_forgotten() {
        let auth = authenticator("store");
        assert_eq!(auth.stored_refresh_token(), None);

        auth.store_refresh_token("secret-refresh\n");
        assert_eq!(auth.stored_refresh_token().as_deref(), Some("secret-refresh"));

        auth.forget_refresh_token();
        assert_eq!(auth.stored_refresh_token(), None);
        auth.forget_refresh_token();
        let _ = fs::remove_dir_all(&auth.cache_dir);
    }

    #[test]
    fn expiry_window_is_five_minutes() {
        assert!(AuthTokens::expires_soon(Utc::now() + chrono::Duration::seconds(120)));
        assert!(!AuthTokens::expires_soon(Utc::now() + chrono::Duration::seconds(900)));
    }

    #[test]
    fn rspotify_token_carries_scopes_and_expiry() {
        let tokens = AuthTokens {
            access_token: "abc".to_string(),
            refresh_token: "def".to_string(),
            expires_at: Utc::now() + chrono::Duration::seconds(3600),
        };
        let token = tokens.rspotify_token();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.expires_at, Some(tokens.expires_at));
        assert!(token.scopes.contains("user-library-read"));
        assert!(token.refresh_token.is_none());
    }
}
