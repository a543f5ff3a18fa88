//! Audio output through an `mpv` child process
//!
//! mpv is started idle with a JSON IPC socket. Commands are written as one JSON
//! object per line; property changes and `end-file` events come back the same
//! way and are turned into [`PlayerEvent`]s. mpv fetches the stream itself.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use crate::error::PlayerError;
use crate::model::StreamRef;

const CONNECT_ATTEMPTS: u32 = 50;
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(100);

const OBSERVE_TIME_POS: u64 = 1;
const OBSERVE_DURATION: u64 = 2;
const OBSERVE_PAUSE: u64 = 3;

/// What the player reports back
#[derive(Clone, Debug, PartialEq)]
pub enum PlayerEvent {
    Position(f64),
    Duration(f64),
    Paused(bool),
    /// The stream played to its end
    EndOfTrack,
    /// The stream could not be opened or broke off
    Failed(String),
}

/// Commands the controller sends to the player
pub trait AudioSink: Send {
    fn load(&mut self, stream: &StreamRef) -> Result<(), PlayerError>;
    fn set_paused(&mut self, paused: bool) -> Result<(), PlayerError>;
    fn seek(&mut self, position_secs: f64) -> Result<(), PlayerError>;
    /// `volume` is in `0.0..=1.0`
    fn set_volume(&mut self, volume: f64) -> Result<(), PlayerError>;
    fn stop(&mut self) -> Result<(), PlayerError>;
}

pub struct AudioBackend {
    commands: mpsc::UnboundedSender<Value>,
    socket_path: PathBuf,
    _child: Child,
}

impl AudioBackend {
    /// Starts mpv and wires its IPC socket. `on_event` is called from a
    /// background task for every event mpv reports.
    pub async fn spawn<F>(mpv_path: &str, on_event: F) -> Result<Self>
    where
        F: Fn(PlayerEvent) + Send + 'static,
    {
        let socket_path = std::env::temp_dir().join(format!("s-potify-mpv-{}.sock", std::process::id()));
        let _ = std::fs::remove_file(&socket_path);

        let child = Command::new(mpv_path)
            .arg("--idle=yes")
            .arg("--no-video")
            .arg("--no-terminal")
            .arg("--really-quiet")
            .arg(format!("--input-ipc-server={}", socket_path.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start {}. Is mpv installed?", mpv_path))?;

        tracing::info!(mpv = %mpv_path, socket = %socket_path.display(), "Started mpv");

        let stream = connect(&socket_path).await?;
        let (read_half, mut write_half) = stream.into_split();
        let (commands, mut command_rx) = mpsc::unbounded_channel::<Value>();

        tokio::spawn(async move {
            while let Some(command) = command_rx.recv().await {
                let mut line = command.to_string();
                line.push('\n');
                if let Err(e) = write_half.write_all(line.as_bytes()).await {
                    tracing::error!(error = %e, "Failed to write mpv command");
                    break;
                }
            }
            tracing::debug!("mpv command writer stopped");
        });

        tokio::spawn(async move {
            let mut lines = BufReader::new(read_half).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        tracing::trace!(line = %line, "mpv");
                        if let Some(event) = parse_event(&line) {
                            on_event(event);
                        }
                    }
                    Ok(None) => {
                        tracing::warn!("mpv IPC socket closed");
                        break;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to read from mpv");
                        break;
                    }
                }
            }
        });

        let backend = Self {
            commands,
            socket_path,
            _child: child,
        };
        backend.send(json!(["observe_property", OBSERVE_TIME_POS, "time-pos"]))?;
        backend.send(json!(["observe_property", OBSERVE_DURATION, "duration"]))?;
        backend.send(json!(["observe_property", OBSERVE_PAUSE, "pause"]))?;

        Ok(backend)
    }

    fn send(&self, command: Value) -> Result<(), PlayerError> {
        self.commands
            .send(json!({ "command": command }))
            .map_err(|_| PlayerError::Playback("mpv is not running".to_string()))
    }
}

async fn connect(path: &Path) -> Result<UnixStream> {
    let mut last_error = None;
    for _ in 0..CONNECT_ATTEMPTS {
        match UnixStream::connect(path).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                last_error = Some(e);
                tokio::time::sleep(CONNECT_RETRY_DELAY).await;
            }
        }
    }
    let detail = last_error.map(|e| e.to_string()).unwrap_or_default();
    anyhow::bail!("Could not connect to mpv IPC socket {}: {}", path.display(), detail)
}

impl AudioSink for AudioBackend {
    fn load(&mut self, stream: &StreamRef) -> Result<(), PlayerError> {
        tracing::info!(video_id = %stream.video_id, title = %stream.title, "Loading stream");
        self.send(json!(["loadfile", stream.url, "replace"]))
    }

    fn set_paused(&mut self, paused: bool) -> Result<(), PlayerError> {
        self.send(json!(["set_property", "pause", paused]))
    }

    fn seek(&mut self, position_secs: f64) -> Result<(), PlayerError> {
        tracing::debug!(position_secs, "Seeking");
        self.send(json!(["seek", position_secs, "absolute"]))
    }

    fn set_volume(&mut self, volume: f64) -> Result<(), PlayerError> {
        let percent = (volume.clamp(0.0, 1.0) * 100.0).round();
        self.send(json!(["set_property", "volume", percent]))
    }

    fn stop(&mut self) -> Result<(), PlayerError> {
        self.send(json!(["stop"]))
    }
}

impl Drop for AudioBackend {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Translates one IPC line. Command replies and unrelated events yield `None`.
pub fn parse_event(line: &str) -> Option<PlayerEvent> {
    let message: Value = serde_json::from_str(line).ok()?;
    match message.get("event")?.as_str()? {
        "property-change" => {
            let data = message.get("data")?;
            match message.get("name")?.as_str()? {
                "time-pos" => data.as_f64().map(PlayerEvent::Position),
                "duration" => data.as_f64().map(PlayerEvent::Duration),
                "pause" => data.as_bool().map(PlayerEvent::Paused),
                _ => None,
            }
        }
        "end-file" => match message.get("reason")?.as_str()? {
            "eof" => Some(PlayerEvent::EndOfTrack),
            "error" => {
                let detail = message
                    .get("file_error")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error");
                Some(PlayerEvent::Failed(detail.to_string()))
            }
            _ => None,
        },
        _ => None,
    }
}
