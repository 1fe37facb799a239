use std::fmt;

/// Notifications an item delivers to its subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// The playhead reached the end of a finished stream.
    DidPlayToEnd,
    /// Loading failed for good; playback will not reach the end.
    FailedToPlayToEnd { error: String },
    /// The playhead caught up with the loaded media and paused.
    PlaybackStalled,
}

impl fmt::Display for PlaybackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackEvent::DidPlayToEnd => f.write_str("playback reached the end"),
            PlaybackEvent::FailedToPlayToEnd { error } => {
                write!(f, "playback failed: {}", error)
            }
            PlaybackEvent::PlaybackStalled => f.write_str("playback stalled"),
        }
    }
}
