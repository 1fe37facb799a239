use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_TARGET_BUFFER_SECS, MAX_TARGET_BUFFER_SECS, MIN_TARGET_BUFFER_SECS};
use crate::monitor::estimate::{estimate_latency_secs, latency_ms, Severity};
use crate::playback::PlayerItem;

/// Snapshot pushed to the display layer on every monitor tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyReport {
    pub latency_ms: u64,
    pub severity: Severity,
    pub target_buffer_secs: f64,
    pub is_buffering: bool,
    pub loaded_duration_secs: f64,
}

impl LatencyReport {
    /// Readout text, e.g. `"1500 ms"`.
    pub fn label(&self) -> String {
        format!("{} ms", self.latency_ms)
    }
}

/// Monitor state for one playback.
///
/// `target_buffer_secs` is written by the buffer control; the remaining
/// fields are overwritten from the player on every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackMonitorState {
    pub target_buffer_secs: f64,
    pub is_buffering: bool,
    pub loaded_duration_secs: f64,
    pub estimated_latency_ms: u64,
}

impl Default for PlaybackMonitorState {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_BUFFER_SECS)
    }
}

impl PlaybackMonitorState {
    pub fn new(target_buffer_secs: f64) -> Self {
        Self {
            target_buffer_secs: normalize_target_buffer(target_buffer_secs),
            is_buffering: false,
            loaded_duration_secs: 0.0,
            estimated_latency_ms: 0,
        }
    }

    /// Sample the item and recompute the estimate from scratch.
    pub fn sample(&mut self, item: &dyn PlayerItem) -> LatencyReport {
        let is_buffering = !item.is_playback_likely_to_keep_up();
        let loaded = item
            .loaded_time_ranges()
            .first()
            .map(|range| range.duration.as_secs_f64());
        self.update(is_buffering, loaded)
    }

    /// Recompute the estimate from the given player readings.
    pub fn update(&mut self, is_buffering: bool, loaded_duration_secs: Option<f64>) -> LatencyReport {
        self.is_buffering = is_buffering;
        self.loaded_duration_secs = loaded_duration_secs.unwrap_or(0.0).max(0.0);

        let estimated =
            estimate_latency_secs(self.target_buffer_secs, is_buffering, loaded_duration_secs);
        self.estimated_latency_ms = latency_ms(estimated);

        LatencyReport {
            latency_ms: self.estimated_latency_ms,
            severity: Severity::from_latency_ms(self.estimated_latency_ms),
            target_buffer_secs: self.target_buffer_secs,
            is_buffering: self.is_buffering,
            loaded_duration_secs: self.loaded_duration_secs,
        }
    }
}

/// Clamp a control value to the buffer range and round it to one decimal.
pub fn normalize_target_buffer(secs: f64) -> f64 {
    if !secs.is_finite() {
        return DEFAULT_TARGET_BUFFER_SECS;
    }
    let clamped = secs.clamp(MIN_TARGET_BUFFER_SECS, MAX_TARGET_BUFFER_SECS);
    (clamped * 10.0).round() / 10.0
}
