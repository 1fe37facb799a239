//! Playlist fetching and master -> media resolution.

use log::debug;
use m3u8_rs::{MediaPlaylist, Playlist};
use reqwest::blocking::Client;
use reqwest::Url;

use crate::constants::hls::MAX_PLAYLIST_DEPTH;
use crate::error::{Error, Result};

/// A parsed playlist, reduced to what the loader needs.
#[derive(Debug, Clone)]
pub enum PlaylistKind {
    /// A master playlist; carries the URI of the variant to follow.
    Master { variant_uri: String },
    Media(MediaPlaylist),
}

/// Parse playlist bytes.
pub fn parse_playlist(content: &[u8]) -> Result<PlaylistKind> {
    match m3u8_rs::parse_playlist(content) {
        Ok((_, Playlist::MasterPlaylist(master))) => match master.variants.first() {
            Some(variant) => Ok(PlaylistKind::Master {
                variant_uri: variant.uri.clone(),
            }),
            None => Err(Error::NoVariants),
        },
        Ok((_, Playlist::MediaPlaylist(media))) => Ok(PlaylistKind::Media(media)),
        Err(e) => Err(Error::Playlist(format!("{:?}", e))),
    }
}

/// Resolve `uri` against the playlist it appeared in.
pub fn make_absolute_url(playlist_url: &str, uri: &str) -> Result<String> {
    let base = Url::parse(playlist_url)
        .map_err(|e| Error::InvalidUrl(format!("{}: {}", playlist_url, e)))?;
    base.join(uri.trim())
        .map(String::from)
        .map_err(|e| Error::InvalidUrl(format!("{}: {}", uri, e)))
}

/// GET `url` and return the body of a successful response.
pub fn fetch(client: &Client, url: &str) -> Result<Vec<u8>> {
    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response.bytes()?.to_vec())
}

/// Follow master playlists until a media playlist is reached.
pub fn resolve_media_playlist(client: &Client, url: &str) -> Result<String> {
    resolve_recursive(client, url, MAX_PLAYLIST_DEPTH)
}

fn resolve_recursive(client: &Client, url: &str, depth: usize) -> Result<String> {
    if depth == 0 {
        return Err(Error::NestingTooDeep);
    }

    let content = fetch(client, url)?;
    match parse_playlist(&content)? {
        PlaylistKind::Master { variant_uri } => {
            let media_url = make_absolute_url(url, &variant_uri)?;
            debug!("following variant {}", media_url);
            resolve_recursive(client, &media_url, depth - 1)
        }
        PlaylistKind::Media(_) => Ok(url.to_string()),
    }
}

/// Fetch and parse a media playlist.
pub fn fetch_media_playlist(client: &Client, url: &str) -> Result<MediaPlaylist> {
    let content = fetch(client, url)?;
    match parse_playlist(&content)? {
        PlaylistKind::Media(media) => Ok(media),
        PlaylistKind::Master { .. } => {
            Err(Error::Playlist("expected a media playlist".to_string()))
        }
    }
}
