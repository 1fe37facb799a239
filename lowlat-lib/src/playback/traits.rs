//! Contract between the playback session and a media backend.

use std::sync::{mpsc::Receiver, Arc};
use std::time::Duration;

use crate::error::Result;
use crate::playback::PlaybackEvent;

/// A contiguous interval of media that is available for playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeRange {
    pub start: Duration,
    pub duration: Duration,
}

impl TimeRange {
    pub fn new(start: Duration, duration: Duration) -> Self {
        Self { start, duration }
    }

    pub fn end(&self) -> Duration {
        self.start + self.duration
    }
}

/// Buffering state and notifications of one loaded stream.
pub trait PlayerItem: Send + Sync {
    fn preferred_forward_buffer_duration(&self) -> Duration;

    fn set_preferred_forward_buffer_duration(&self, duration: Duration);

    fn is_playback_likely_to_keep_up(&self) -> bool;

    /// Loaded ranges, the one containing the playhead first.
    fn loaded_time_ranges(&self) -> Vec<TimeRange>;

    /// Register an observer. Dropping the receiver detaches it.
    fn subscribe(&self) -> Receiver<PlaybackEvent>;
}

/// Transport control over a loaded item.
pub trait MediaPlayer: Send {
    fn play(&mut self);

    fn pause(&mut self);

    fn item(&self) -> Arc<dyn PlayerItem>;
}

/// Builds players for stream addresses.
pub trait MediaBackend: Send + Sync {
    fn load(&self, url: &str) -> Result<Box<dyn MediaPlayer>>;
}
