//! Track resolution through `yt-dlp`
//!
//! A track is looked up by "title artist" on the video service and the first
//! hit's best audio format becomes the [`StreamRef`] handed to the player.

use std::process::Stdio;

use futures::future::BoxFuture;
use serde::Deserialize;
use tokio::process::Command;

use crate::error::ResolveError;
use crate::model::StreamRef;

/// Turns track metadata into something the audio sink can load.
pub trait TrackResolver: Send + Sync {
    fn resolve(&self, title: &str, artist: &str) -> BoxFuture<'static, Result<StreamRef, ResolveError>>;
}

pub struct YtDlpResolver {
    binary: String,
}

impl YtDlpResolver {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl TrackResolver for YtDlpResolver {
    fn resolve(&self, title: &str, artist: &str) -> BoxFuture<'static, Result<StreamRef, ResolveError>> {
        let binary = self.binary.clone();
        let query = search_query(title, artist);

        Box::pin(async move {
            crate::log_api_request!("resolve", query = %query);

            let output = Command::new(&binary)
                .arg("--no-playlist")
                .arg("--no-warnings")
                .arg("-f")
                .arg("bestaudio")
                .arg("-j")
                .arg(&query)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output()
                .await
                .map_err(|e| ResolveError::Transient(format!("failed to run {}: {}", binary, e)))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let message = stderr.lines().last().unwrap_or("yt-dlp failed").trim().to_string();
                tracing::warn!(query = %query, error = %message, "yt-dlp exited with an error");
                return Err(ResolveError::Transient(message));
            }

            crate::log_api_result!("resolve", parse_search_output(&String::from_utf8_lossy(&output.stdout)))
        })
    }
}

fn search_query(title: &str, artist: &str) -> String {
    format!("ytsearch1:{} {}", title.trim(), artist.trim())
        .trim_end()
        .to_string()
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    id: String,
    #[serde(default)]
    title: String,
    url: Option<String>,
    webpage_url: Option<String>,
    duration: Option<f64>,
}

/// Reads the first entry of `yt-dlp -j` output. Empty output means the search
/// found nothing.
pub fn parse_search_output(stdout: &str) -> Result<StreamRef, ResolveError> {
    let Some(line) = stdout.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return Err(ResolveError::NotFound);
    };

    let entry: SearchEntry = serde_json::from_str(line)
        .map_err(|e| ResolveError::Transient(format!("unreadable yt-dlp output: {}", e)))?;

    let url = entry
        .url
        .or(entry.webpage_url)
        .filter(|u| !u.is_empty())
        .ok_or(ResolveError::NotFound)?;

    Ok(StreamRef {
        url,
        video_id: entry.id,
        title: entry.title,
        duration_secs: entry.duration.filter(|d| *d > 0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_joins_title_and_artist() {
        assert_eq!(search_query(" Song ", "Band"), "ytsearch1:Song Band");
        assert_eq!(search_query("Song", ""), "ytsearch1:Song");
    }

    #[test]
    fn first_entry_becomes_stream_ref() {
        let stdout = concat!(
            r#"{"id":"abc123","title":"Song (Official Audio)","url":"https://cdn.example/a.webm","duration":215.0,"webpage_url":"https://www.youtube.com/watch?v=abc123"}"#,
            "\n",
            r#"{"id":"zzz","title":"Other","url":"https://cdn.example/z.webm"}"#,
            "\n"
        );
        let stream = parse_search_output(stdout).unwrap();
        assert_eq!(stream.video_id, "abc123");
        assert_eq!(stream.url, "https://cdn.example/a.webm");
        assert_eq!(stream.duration_secs, Some(215.0));
    }

    #[test]
    fn falls_back_to_page_url_without_direct_stream() {
        let stdout = r#"{"id":"abc","title":"Song","webpage_url":"https://www.youtube.com/watch?v=abc","duration":0}"#;
        let stream = parse_search_output(stdout).unwrap();
        assert_eq!(stream.url, "https://www.youtube.com/watch?v=abc");
        assert_eq!(stream.duration_secs, None);
    }

    #[test]
    fn empty_output_is_not_found() {
        assert_eq!(parse_search_output(""), Err(ResolveError::NotFound));
        assert_eq!(parse_search_output("\n  \n"), Err(ResolveError::NotFound));
    }

    #[test]
    fn garbage_output_is_transient() {
        assert!(matches!(
            parse_search_output("ERROR: something"),
            Err(ResolveError::Transient(_))
        ));
    }
}
