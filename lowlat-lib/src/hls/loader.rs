//! Background segment loader.
//!
//! Keeps the item's forward buffer filled up to the preferred duration.
//! Segments are deduplicated by absolute URL, which also copes with
//! servers that never advance `EXT-X-MEDIA-SEQUENCE`.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use reqwest::blocking::Client;

use crate::constants::hls::{
    LIVE_START_SEGMENTS, MAX_BACKOFF, MAX_CONSECUTIVE_FAILURES, MIN_RELOAD, RETRY_BASE_DELAY,
};
use crate::error::Error;
use crate::hls::playlist::{fetch, fetch_media_playlist, make_absolute_url, resolve_media_playlist};
use crate::playback::BufferedItem;

pub struct SegmentLoader {
    client: Client,
    url: String,
    downloaded: HashSet<String>,
    /// Consecutive failures, counted apart. A playlist reload never resets
    /// the segment count.
    playlist_failures: u32,
    segment_failures: u32,
    retry_base: Duration,
    max_backoff: Duration,
}

impl SegmentLoader {
    pub fn new(client: Client, url: String) -> Self {
        Self {
            client,
            url,
            downloaded: HashSet::new(),
            playlist_failures: 0,
            segment_failures: 0,
            retry_base: RETRY_BASE_DELAY,
            max_backoff: MAX_BACKOFF,
        }
    }

    /// Override the backoff base and cap.
    pub fn with_retry_delays(mut self, base: Duration, max: Duration) -> Self {
        self.retry_base = base;
        self.max_backoff = max;
        self
    }

    pub fn run(mut self, item: Arc<BufferedItem>) {
        let media_url = loop {
            if item.is_stopped() {
                return;
            }
            match resolve_media_playlist(&self.client, &self.url) {
                Ok(url) => break url,
                Err(err) => {
                    self.playlist_failures += 1;
                    if !self.backoff(&item, self.playlist_failures, err) {
                        return;
                    }
                }
            }
        };
        info!("Loading media playlist {}", media_url);
        self.playlist_failures = 0;

        let mut first_fetch = true;
        loop {
            if item.is_stopped() {
                return;
            }

            let playlist = match fetch_media_playlist(&self.client, &media_url) {
                Ok(playlist) => playlist,
                Err(err) => {
                    self.playlist_failures += 1;
                    if !self.backoff(&item, self.playlist_failures, err) {
                        return;
                    }
                    continue;
                }
            };
            self.playlist_failures = 0;

            let current: Vec<String> = playlist
                .segments
                .iter()
                .filter_map(|s| make_absolute_url(&media_url, &s.uri).ok())
                .collect();

            let is_live = !playlist.end_list;
            let start_idx = start_index(first_fetch, is_live, playlist.segments.len());
            if start_idx > 0 {
                // Segments behind the live start are never fetched.
                for segment in &playlist.segments[..start_idx] {
                    if let Ok(url) = make_absolute_url(&media_url, &segment.uri) {
                        self.downloaded.insert(url);
                    }
                }
                debug!("live start skips {} segments", start_idx);
            }
            first_fetch = false;

            let mut fetched_new = false;
            for segment in playlist.segments.iter().skip(start_idx) {
                let segment_url = match make_absolute_url(&media_url, &segment.uri) {
                    Ok(url) => url,
                    Err(err) => {
                        warn!("Skipping segment: {}", err);
                        continue;
                    }
                };
                if self.downloaded.contains(&segment_url) {
                    continue;
                }
                if !item.wait_for_room() {
                    return;
                }

                match fetch(&self.client, &segment_url) {
                    Ok(data) => {
                        self.segment_failures = 0;
                        debug!("segment {} ({} bytes)", segment_url, data.len());
                        item.append_segment(Duration::from_secs_f64(segment.duration as f64));
                        self.downloaded.insert(segment_url);
                        fetched_new = true;
                    }
                    Err(err) => {
                        self.segment_failures += 1;
                        if !self.backoff(&item, self.segment_failures, err) {
                            return;
                        }
                        break;
                    }
                }
            }

            if !is_live && current.iter().all(|url| self.downloaded.contains(url)) {
                info!("All {} segments loaded", current.len());
                item.mark_complete();
                return;
            }

            // Live windows rotate; forget URLs that scrolled off.
            self.downloaded.retain(|url| current.contains(url));

            let wait = reload_delay(is_live, playlist.target_duration as f64, fetched_new);
            if !item.sleep(wait) {
                return;
            }
        }
    }

    /// Sleep after a failure. Returns false when the loader should exit.
    fn backoff(&self, item: &BufferedItem, failures: u32, err: Error) -> bool {
        warn!(
            "HLS request failed ({}/{}): {}",
            failures, MAX_CONSECUTIVE_FAILURES, err
        );
        if failures >= MAX_CONSECUTIVE_FAILURES {
            item.fail(err.to_string());
            return false;
        }
        item.sleep(scaled_backoff(failures, self.retry_base, self.max_backoff))
    }
}

/// First segment to load from a playlist.
///
/// Live streams start a few segments behind the edge so the buffer can
/// fill before the next reload; VOD starts at the beginning.
pub fn start_index(first_fetch: bool, is_live: bool, segments: usize) -> usize {
    if first_fetch && is_live {
        segments.saturating_sub(LIVE_START_SEGMENTS.min(segments))
    } else {
        0
    }
}

/// Wait before the next playlist reload (RFC 8216 6.3.4).
pub fn reload_delay(is_live: bool, target_duration_secs: f64, fetched_new: bool) -> Duration {
    if !is_live {
        return Duration::ZERO;
    }
    let target = if target_duration_secs.is_finite() && target_duration_secs > 0.0 {
        Duration::from_secs_f64(target_duration_secs)
    } else {
        Duration::ZERO
    };
    let base = target.max(MIN_RELOAD);
    if fetched_new {
        base
    } else {
        base / 2
    }
}

/// Exponential backoff: min(2^(n-1) * base, max).
pub fn backoff_delay(consecutive_failures: u32) -> Duration {
    scaled_backoff(consecutive_failures, RETRY_BASE_DELAY, MAX_BACKOFF)
}

fn scaled_backoff(consecutive_failures: u32, base: Duration, max: Duration) -> Duration {
    let exp = consecutive_failures.saturating_sub(1).min(5);
    base.saturating_mul(1u32 << exp).min(max)
}
