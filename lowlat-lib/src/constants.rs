//! Shared constants for playback monitoring and HLS buffering defaults.

use std::time::Duration;

/// The stream every playback session loads.
///
/// There is no configuration surface for this address; the demo always
/// plays the same public test stream.
pub const DEFAULT_STREAM_URL: &str =
    "https://bitdash-a.akamaihd.net/content/MI201109210084_1/m3u8s/f08e80da-bf1d-4e3d-8899-f0f6155f6efa.m3u8";

/// Lower bound of the target buffer control (seconds).
pub const MIN_TARGET_BUFFER_SECS: f64 = 0.5;

/// Upper bound of the target buffer control (seconds).
pub const MAX_TARGET_BUFFER_SECS: f64 = 10.0;

/// Target buffer used until the user moves the control (seconds).
pub const DEFAULT_TARGET_BUFFER_SECS: f64 = 3.0;

/// Extra latency assumed while the player reports it cannot keep up.
pub const BUFFERING_PENALTY_SECS: f64 = 1.0;

/// Period between monitor ticks.
pub const MONITOR_INTERVAL: Duration = Duration::from_secs(1);

/// Upper edge of the "good" severity tier (exclusive, ms).
pub const GOOD_LATENCY_MS: u64 = 1000;

/// Upper edge of the "warn" severity tier (exclusive, ms).
pub const WARN_LATENCY_MS: u64 = 3000;

/// Period of the playback clock that advances the playhead.
pub const CLOCK_INTERVAL: Duration = Duration::from_millis(100);

/// Cap on the buffered-ahead amount needed to start or resume playback.
pub const RESUME_THRESHOLD_SECS: f64 = 1.0;

/// HTTP settings for the headless HLS backend.
pub mod network {
    use std::time::Duration;

    /// User agent for playlist and segment requests.
    pub const USER_AGENT: &str = concat!("lowlat/", env!("CARGO_PKG_VERSION"));

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Whole-request timeout for a playlist or segment.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
}

/// HLS loader settings.
pub mod hls {
    use std::time::Duration;

    /// Maximum master -> media playlist nesting followed during resolution.
    pub const MAX_PLAYLIST_DEPTH: usize = 5;

    /// Segments behind the live edge where a live stream starts.
    pub const LIVE_START_SEGMENTS: usize = 3;

    /// Floor for the live playlist reload period.
    pub const MIN_RELOAD: Duration = Duration::from_secs(2);

    /// Consecutive request failures before the item is failed.
    pub const MAX_CONSECUTIVE_FAILURES: u32 = 5;

    /// Base delay of the exponential backoff.
    pub const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

    /// Backoff cap.
    pub const MAX_BACKOFF: Duration = Duration::from_secs(8);

    /// How often blocking waits re-check the stop flag.
    pub const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);
}
