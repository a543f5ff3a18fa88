//! Command line and environment configuration
//!
//! Every option can come from the command line or from an environment
//! variable; a `.env` file in the working directory is loaded first.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;

use crate::model::RepeatMode;

#[derive(Parser, Debug, Clone)]
#[clap(
    version = env!("CARGO_PKG_VERSION"),
    name = env!("CARGO_PKG_NAME"),
    about = "Terminal player for Spotify playlists, streamed from the web"
)]
pub struct Cli {
    /// Playlist link, URI or id to load at startup
    pub playlist: Option<String>,

    /// Start with shuffle enabled
    #[clap(long)]
    pub shuffle: bool,

    /// Initial repeat mode
    #[clap(long, value_enum, default_value_t = RepeatMode::None)]
    pub repeat: RepeatMode,

    /// Initial volume between 0 and 1
    #[clap(long, default_value_t = 1.0)]
    pub volume: f64,

    #[clap(long, env = "SPOTIFY_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    #[clap(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Must match a redirect URI registered for the Spotify app
    #[clap(long, env = "SPOTIFY_REDIRECT_URI", default_value = "http://127.0.0.1:8898/login")]
    pub redirect_uri: String,

    /// Where the login refresh token is kept
    #[clap(long, env = "S_POTIFY_CACHE_DIR", default_value = ".cache")]
    pub cache_dir: PathBuf,

    #[clap(long, env = "YTDLP_PATH", default_value = "yt-dlp")]
    pub ytdlp_path: String,

    #[clap(long, env = "MPV_PATH", default_value = "mpv")]
    pub mpv_path: String,
}

/// Validated settings
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub cache_dir: PathBuf,
    pub ytdlp_path: String,
    pub mpv_path: String,
    pub initial_playlist: Option<String>,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub volume: f64,
}

impl Config {
    /// Loads `.env`, then parses the command line.
    pub fn load() -> Result<Self> {
        if let Err(e) = dotenv::dotenv() {
            tracing::debug!(error = %e, "No .env file loaded");
        }
        Self::from_cli(Cli::parse())
    }

    pub fn from_cli(cli: Cli) -> Result<Self> {
        let Some(client_id) = cli.client_id.filter(|s| !s.trim().is_empty()) else {
            bail!("SPOTIFY_CLIENT_ID is not set (use --client-id or the environment)");
        };
        let Some(client_secret) = cli.client_secret.filter(|s| !s.trim().is_empty()) else {
            bail!("SPOTIFY_CLIENT_SECRET is not set (use --client-secret or the environment)");
        };
        if !cli.volume.is_finite() {
            bail!("--volume must be a number between 0 and 1");
        }

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri: cli.redirect_uri,
            cache_dir: cli.cache_dir,
            ytdlp_path: cli.ytdlp_path,
            mpv_path: cli.mpv_path,
            initial_playlist: cli.playlist.filter(|s| !s.trim().is_empty()),
            shuffle: cli.shuffle,
            repeat: cli.repeat,
            volume: cli.volume.clamp(0.0, 1.0),
        })
    }
}
