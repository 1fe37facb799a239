//! Loaded-media bookkeeping and the playhead clock of one item.
//!
//! Media time is counted from the first loaded segment. The loader appends
//! segment durations; the playhead is a stopwatch that only runs while
//! playback is requested and enough media is buffered ahead of it.

use std::time::{Duration, Instant};

use crate::constants::RESUME_THRESHOLD_SECS;
use crate::playback::{PlaybackEvent, TimeRange};

#[derive(Debug, Clone)]
pub struct BufferTimeline {
    loaded: Duration,
    played: Duration,
    clock_started: Option<Instant>,
    playing: bool,
    stalled: bool,
    complete: bool,
    ended: bool,
    failed: bool,
}

impl Default for BufferTimeline {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferTimeline {
    pub fn new() -> Self {
        Self {
            loaded: Duration::ZERO,
            played: Duration::ZERO,
            clock_started: None,
            playing: false,
            stalled: false,
            complete: false,
            ended: false,
            failed: false,
        }
    }

    /// Current playhead, never past the loaded edge.
    pub fn playhead(&self, now: Instant) -> Duration {
        let position = match self.clock_started {
            Some(start) => self.played + now.saturating_duration_since(start),
            None => self.played,
        };
        position.min(self.loaded)
    }

    pub fn buffered_ahead(&self, now: Instant) -> Duration {
        self.loaded.saturating_sub(self.playhead(now))
    }

    /// The range from the playhead to the loaded edge, if non-empty.
    pub fn loaded_range(&self, now: Instant) -> Option<TimeRange> {
        let playhead = self.playhead(now);
        let ahead = self.loaded.saturating_sub(playhead);
        if ahead.is_zero() {
            None
        } else {
            Some(TimeRange::new(playhead, ahead))
        }
    }

    pub fn append(&mut self, segment: Duration) {
        self.loaded += segment;
    }

    pub fn mark_complete(&mut self) {
        self.complete = true;
    }

    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// True once the item ended or failed; no further events follow.
    pub fn is_finished(&self) -> bool {
        self.ended || self.failed
    }

    pub fn set_playing(&mut self, playing: bool, now: Instant) {
        if !playing {
            self.pause_clock(now);
        }
        self.playing = playing;
    }

    pub fn is_likely_to_keep_up(&self, now: Instant, preferred: Duration) -> bool {
        if self.failed || self.stalled {
            return false;
        }
        self.complete || self.buffered_ahead(now) >= resume_threshold(preferred)
    }

    /// Advance the state machine; returns at most one event per call.
    pub fn tick(&mut self, now: Instant, preferred: Duration) -> Option<PlaybackEvent> {
        if self.is_finished() || !self.playing {
            return None;
        }

        if let Some(start) = self.clock_started {
            if self.played + now.saturating_duration_since(start) < self.loaded {
                return None;
            }
            self.played = self.loaded;
            self.clock_started = None;
            if self.complete {
                self.ended = true;
                return Some(PlaybackEvent::DidPlayToEnd);
            }
            self.stalled = true;
            return Some(PlaybackEvent::PlaybackStalled);
        }

        let ahead = self.buffered_ahead(now);
        if self.complete && ahead.is_zero() {
            self.ended = true;
            return Some(PlaybackEvent::DidPlayToEnd);
        }
        if ahead >= resume_threshold(preferred) || (self.complete && !ahead.is_zero()) {
            self.stalled = false;
            self.clock_started = Some(now);
        }
        None
    }

    /// Fail the item and stop the clock.
    pub fn fail(&mut self, error: String, now: Instant) -> Option<PlaybackEvent> {
        if self.is_finished() {
            return None;
        }
        self.pause_clock(now);
        self.failed = true;
        Some(PlaybackEvent::FailedToPlayToEnd { error })
    }

    fn pause_clock(&mut self, now: Instant) {
        if self.clock_started.is_some() {
            self.played = self.playhead(now);
            self.clock_started = None;
        }
    }
}

/// Buffered amount needed before the clock starts or resumes.
pub fn resume_threshold(preferred: Duration) -> Duration {
    preferred.min(Duration::from_secs_f64(RESUME_THRESHOLD_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(value: f64) -> Duration {
        Duration::from_secs_f64(value)
    }

    #[test]
    fn waits_for_threshold_before_starting() {
        let t0 = Instant::now();
        let mut timeline = BufferTimeline::new();
        timeline.set_playing(true, t0);

        timeline.append(secs(0.5));
        assert_eq!(timeline.tick(t0, secs(3.0)), None);
        assert_eq!(timeline.playhead(t0 + secs(0.4)), Duration::ZERO);
        assert!(!timeline.is_likely_to_keep_up(t0, secs(3.0)));

        timeline.append(secs(0.5));
        assert_eq!(timeline.tick(t0, secs(3.0)), None);
        assert_eq!(timeline.playhead(t0 + secs(0.4)), secs(0.4));
        assert!(timeline.is_likely_to_keep_up(t0, secs(3.0)));
    }

    #[test]
    fn loaded_range_starts_at_playhead() {
        let t0 = Instant::now();
        let mut timeline = BufferTimeline::new();
        timeline.append(secs(4.0));
        timeline.set_playing(true, t0);
        timeline.tick(t0, secs(3.0));

        let range = timeline
            .loaded_range(t0 + secs(1.5))
            .expect("media buffered ahead");
        assert_eq!(range.start, secs(1.5));
        assert_eq!(range.duration, secs(2.5));
        assert_eq!(range.end(), secs(4.0));
    }

    #[test]
    fn stall_is_reported_once_then_resumes() {
        let t0 = Instant::now();
        let mut timeline = BufferTimeline::new();
        timeline.append(secs(2.0));
        timeline.set_playing(true, t0);
        assert_eq!(timeline.tick(t0, secs(2.0)), None);

        let t1 = t0 + secs(2.5);
        assert_eq!(timeline.tick(t1, secs(2.0)), Some(PlaybackEvent::PlaybackStalled));
        assert_eq!(timeline.tick(t1 + secs(0.1), secs(2.0)), None);
        assert!(timeline.is_stalled());
        assert_eq!(timeline.playhead(t1 + secs(5.0)), secs(2.0));
        assert!(timeline.loaded_range(t1).is_none());

        timeline.append(secs(1.0));
        let t2 = t1 + secs(1.0);
        assert_eq!(timeline.tick(t2, secs(2.0)), None);
        assert!(!timeline.is_stalled());
        assert_eq!(timeline.playhead(t2 + secs(0.5)), secs(2.5));
    }

    #[test]
    fn complete_stream_ends_once() {
        let t0 = Instant::now();
        let mut timeline = BufferTimeline::new();
        timeline.append(secs(0.3));
        timeline.mark_complete();
        timeline.set_playing(true, t0);

        assert_eq!(timeline.tick(t0, secs(3.0)), None);
        assert_eq!(timeline.playhead(t0 + secs(0.2)), secs(0.2));
        assert_eq!(
            timeline.tick(t0 + secs(0.4), secs(3.0)),
            Some(PlaybackEvent::DidPlayToEnd)
        );
        assert_eq!(timeline.tick(t0 + secs(0.5), secs(3.0)), None);
        assert!(timeline.is_finished());
    }

    #[test]
    fn pause_freezes_the_playhead() {
        let t0 = Instant::now();
        let mut timeline = BufferTimeline::new();
        timeline.append(secs(5.0));
        timeline.set_playing(true, t0);
        timeline.tick(t0, secs(3.0));

        timeline.set_playing(false, t0 + secs(1.0));
        assert_eq!(timeline.playhead(t0 + secs(4.0)), secs(1.0));
        assert_eq!(timeline.tick(t0 + secs(4.0), secs(3.0)), None);
    }

    #[test]
    fn failure_is_terminal() {
        let t0 = Instant::now();
        let mut timeline = BufferTimeline::new();
        timeline.set_playing(true, t0);
        let event = timeline.fail("HTTP status 404".to_string(), t0);
        assert_eq!(
            event,
            Some(PlaybackEvent::FailedToPlayToEnd {
                error: "HTTP status 404".to_string()
            })
        );
        assert_eq!(timeline.fail("again".to_string(), t0), None);
        assert!(!timeline.is_likely_to_keep_up(t0, secs(1.0)));
    }

    #[test]
    fn threshold_is_capped() {
        assert_eq!(resume_threshold(secs(0.5)), secs(0.5));
        assert_eq!(resume_threshold(secs(8.0)), secs(1.0));
    }
}
