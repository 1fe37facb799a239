//! Error types for the lowlat library.

use thiserror::Error;

/// Errors raised while building a player for a stream.
///
/// Failures after playback has started are not returned through this type;
/// they are delivered as [`crate::playback::PlaybackEvent::FailedToPlayToEnd`].
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Playlist parse error: {0}")]
    Playlist(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HLS playlist nesting too deep")]
    NestingTooDeep,

    #[error("No variants in master playlist")]
    NoVariants,
}

pub type Result<T> = std::result::Result<T, Error>;
