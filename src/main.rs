mod audio;
mod auth;
mod config;
mod controller;
mod error;
mod logging;
mod model;
mod resolver;
mod view;

use std::io;
use std::sync::Arc;
use anyhow::Result;
use std::time::{Duration, Instant};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use view::AppView;
use audio::AudioBackend;
use auth::Authenticator;
use config::Config;
use controller::{AppController, AppEvent};
use model::{AppModel, SpotifyClient};
use resolver::YtDlpResolver;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== S-Potify Starting ===");

    let config = Config::load()?;

    let authenticator = Authenticator::new(&config.client_id, &config.redirect_uri, config.cache_dir.clone());
    let spotify_client = SpotifyClient::new(&config.client_id, &config.client_secret, authenticator);

    // A refresh token from an earlier login signs the user back in silently
    let restored_user = spotify_client.restore_session().await;

    let (events_tx, events_rx) = mpsc::unbounded_channel::<AppEvent>();

    let player_events = events_tx.clone();
    let audio_backend = AudioBackend::spawn(&config.mpv_path, move |event| {
        let _ = player_events.send(AppEvent::Player(event));
    })
    .await?;

    let app_model = AppModel::new(config.shuffle, config.repeat, config.volume);
    let mut controller = AppController::new(
        app_model,
        Arc::new(YtDlpResolver::new(config.ytdlp_path.clone())),
        Arc::new(spotify_client.clone()),
        Box::new(audio_backend),
        events_tx,
    );

    if let Some(name) = restored_user {
        controller.session_restored(name);
    }
    if let Some(playlist) = &config.initial_playlist {
        controller.load_playlist(playlist);
    }

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut controller, events_rx, spotify_client).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    tracing::info!("S-Potify shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &mut AppController,
    mut events: UnboundedReceiver<AppEvent>,
    spotify: SpotifyClient,
) -> io::Result<()> {
    // Track when we last checked the token
    let mut last_token_check = Instant::now();
    const TOKEN_CHECK_INTERVAL: Duration = Duration::from_secs(60);

    loop {
        if last_token_check.elapsed() >= TOKEN_CHECK_INTERVAL {
            last_token_check = Instant::now();

            let spotify = spotify.clone();
            tokio::spawn(async move {
                if let Err(e) = spotify.refresh_token_if_needed().await {
                    tracing::warn!("Token refresh check failed: {}", e);
                }
            });
        }

        // Apply everything background work finished since the last frame
        while let Ok(event) = events.try_recv() {
            controller.handle_event(event);
        }

        controller.tick();

        terminal.draw(|f| {
            AppView::render(f, controller.model());
        })?;

        // Handle input with shorter poll time for smoother UI updates
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                controller.handle_key_event(key);
            }
        }

        if controller.should_quit() {
            break;
        }
    }

    Ok(())
}
