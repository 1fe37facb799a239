//! Headless HLS backend.
//!
//! Resolves the playlist, downloads segments into a forward buffer and
//! exposes the resulting buffering state through [`crate::playback::PlayerItem`].
//! Segment payloads are fetched but not demuxed or decoded.

mod loader;
mod playlist;

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;

use crate::constants::network::{CONNECT_TIMEOUT, REQUEST_TIMEOUT, USER_AGENT};
use crate::constants::DEFAULT_TARGET_BUFFER_SECS;
use crate::error::{Error, Result};
use crate::playback::{BufferedItem, ItemPlayer, MediaBackend, MediaPlayer};

pub use loader::{backoff_delay, reload_delay, start_index, SegmentLoader};
pub use playlist::{make_absolute_url, parse_playlist, resolve_media_playlist, PlaylistKind};

/// Backend that loads streams over HTTP.
#[derive(Clone)]
pub struct HlsBackend {
    client: Client,
}

impl HlsBackend {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

impl MediaBackend for HlsBackend {
    /// Validate the address and start loading it in the background.
    ///
    /// Network failures after this point arrive as `FailedToPlayToEnd`.
    fn load(&self, url: &str) -> Result<Box<dyn MediaPlayer>> {
        Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;

        let item = BufferedItem::new(Duration::from_secs_f64(DEFAULT_TARGET_BUFFER_SECS));
        let loader = SegmentLoader::new(self.client.clone(), url.to_string());
        Ok(Box::new(ItemPlayer::spawn(item, move |item| loader.run(item))))
    }
}
