//! Parsing of pasted playlist links
//!
//! Accepts `https://open.spotify.com/playlist/<id>` (optionally with a locale
//! segment such as `intl-de/` and a `?si=` query), `spotify:playlist:<id>`
//! URIs and bare ids. URIs and ids are validated by rspotify; only the web
//! link form is taken apart here.

use rspotify::model::{Id, PlaylistId};

use crate::error::PlayerError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaylistRef {
    Liked,
    Playlist { id: String, link: String },
}

impl PlaylistRef {
    pub fn parse(input: &str) -> Result<PlaylistRef, PlayerError> {
        let trimmed = input.trim();
        let invalid = || PlayerError::InvalidReference(trimmed.to_string());

        if trimmed.is_empty() {
            return Err(invalid());
        }

        let id = match PlaylistId::from_id_or_uri(trimmed) {
            Ok(id) => id,
            Err(_) if trimmed.contains('/') => id_from_url(trimmed)
                .and_then(|id| PlaylistId::from_id(id).ok())
                .ok_or_else(invalid)?,
            Err(_) => return Err(invalid()),
        };
        // rspotify accepts an empty id
        if id.id().is_empty() {
            return Err(invalid());
        }

        Ok(PlaylistRef::Playlist {
            id: id.id().to_string(),
            link: id.url(),
        })
    }

    pub fn link(&self) -> Option<&str> {
        match self {
            PlaylistRef::Liked => None,
            PlaylistRef::Playlist { link, .. } => Some(link),
        }
    }
}

/// The segment following `playlist` in the path, without query or fragment.
fn id_from_url(url: &str) -> Option<&str> {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let (host, path) = without_scheme.split_once('/')?;
    if host != "open.spotify.com" {
        return None;
    }

    let path = path.split(['?', '#']).next().unwrap_or_default();
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    segments.find(|s| *s == "playlist")?;
    segments.next()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "37i9dQZF1DXcBWIGoYBM5M";

    fn id_of(input: &str) -> String {
        match PlaylistRef::parse(input) {
            Ok(PlaylistRef::Playlist { id, .. }) => id,
            other => panic!("unexpected parse result for {input}: {other:?}"),
        }
    }

    #[test]
    fn accepts_links_uris_and_bare_ids() {
        assert_eq!(id_of(&format!("https://open.spotify.com/playlist/{ID}")), ID);
        assert_eq!(id_of(&format!("https://open.spotify.com/playlist/{ID}?si=abc123")), ID);
        assert_eq!(id_of(&format!("https://open.spotify.com/intl-de/playlist/{ID}")), ID);
        assert_eq!(id_of(&format!("open.spotify.com/playlist/{ID}#top")), ID);
        assert_eq!(id_of(&format!("spotify:playlist:{ID}")), ID);
        assert_eq!(id_of(&format!("spotify/playlist/{ID}")), ID);
        assert_eq!(id_of(&format!("  {ID}  ")), ID);
    }

    #[test]
    fn normalizes_the_link() {
        let parsed = PlaylistRef::parse(&format!("spotify:playlist:{ID}")).unwrap();
        assert_eq!(
            parsed.link(),
            Some(format!("https://open.spotify.com/playlist/{ID}").as_str())
        );
    }

    #[test]
    fn rejects_everything_else() {
        for input in [
            "",
            "   ",
            "https://open.spotify.com/album/abc",
            "https://example.com/playlist/abc",
            "https://open.spotify.com/playlist/",
            "spotify:album:abc",
            "spotify:playlist:",
            "spotify:playlist:abc def",
            "not a link",
            "abc-def",
        ] {
            assert!(
                matches!(PlaylistRef::parse(input), Err(PlayerError::InvalidReference(_))),
                "{input:?} should be rejected"
            );
        }
    }
}
