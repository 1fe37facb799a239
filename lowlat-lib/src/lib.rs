//! # Lowlat Library
//!
//! Playback monitoring for a low-latency HLS viewer. The library estimates
//! display latency from the player's buffering state, drives start/stop
//! transitions of a single stream, and ships a headless HLS backend plus a
//! simulated one behind a common media contract.

pub mod constants;
pub mod error;
pub mod hls;
pub mod monitor;
pub mod playback;
pub mod simulate;

pub use error::{Error, Result};
