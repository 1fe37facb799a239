//! Latency heuristic and severity tiers.
//!
//! The estimate is a display heuristic built from the configured target
//! buffer and the player's buffering state. It is not derived from stream
//! timestamps and should not be read as a measured end-to-end latency.

use serde::{Deserialize, Serialize};

use crate::constants::{BUFFERING_PENALTY_SECS, GOOD_LATENCY_MS, WARN_LATENCY_MS};

/// Display tier for an estimated latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Good,
    Warn,
    Bad,
}

impl Severity {
    /// Classify a latency in milliseconds.
    pub fn from_latency_ms(latency_ms: u64) -> Self {
        if latency_ms < GOOD_LATENCY_MS {
            Severity::Good
        } else if latency_ms < WARN_LATENCY_MS {
            Severity::Warn
        } else {
            Severity::Bad
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Good => "good",
            Severity::Warn => "warn",
            Severity::Bad => "bad",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estimate playback latency in seconds.
///
/// # Arguments
///
/// * `target_buffer_secs` - Configured forward buffer target.
/// * `is_buffering` - True when the player reports it is not likely to keep up.
/// * `loaded_duration_secs` - Duration of the first loaded time range, if any.
pub fn estimate_latency_secs(
    target_buffer_secs: f64,
    is_buffering: bool,
    loaded_duration_secs: Option<f64>,
) -> f64 {
    let mut estimated = target_buffer_secs;

    if is_buffering {
        estimated += BUFFERING_PENALTY_SECS;
    }

    // A shorter loaded range replaces the estimate outright, penalty included.
    if let Some(loaded) = loaded_duration_secs {
        if loaded > 0.0 && loaded < target_buffer_secs {
            estimated = loaded;
        }
    }

    estimated
}

/// Convert an estimate in seconds to whole display milliseconds.
pub fn latency_ms(estimated_secs: f64) -> u64 {
    (estimated_secs * 1000.0).round().max(0.0) as u64
}
