//! Start/stop transitions and buffer control for a single stream.
//!
//! `PlaybackSession` owns everything one playback needs: the backend used
//! to build players, the active player and its event subscription, and the
//! latency [`Monitor`]. All methods are expected to be called from the UI
//! thread.

use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{error, info, warn};

use crate::constants::{DEFAULT_STREAM_URL, MONITOR_INTERVAL};
use crate::error::Result;
use crate::monitor::{normalize_target_buffer, Monitor, PlaybackMonitorState, ReportFn};
use crate::playback::{MediaBackend, MediaPlayer, PlaybackEvent};

/// What the session last observed about its stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Playing,
    Ended,
    Failed(String),
}

pub struct PlaybackSession {
    backend: Arc<dyn MediaBackend>,
    stream_url: String,
    monitor: Monitor,
    player: Option<Box<dyn MediaPlayer>>,
    events: Option<Receiver<PlaybackEvent>>,
    state: SessionState,
}

impl PlaybackSession {
    pub fn new(backend: Arc<dyn MediaBackend>, report: ReportFn) -> Self {
        Self::with_monitor_interval(backend, report, MONITOR_INTERVAL)
    }

    pub fn with_monitor_interval(
        backend: Arc<dyn MediaBackend>,
        report: ReportFn,
        interval: Duration,
    ) -> Self {
        let state = Arc::new(Mutex::new(PlaybackMonitorState::default()));
        Self {
            backend,
            stream_url: DEFAULT_STREAM_URL.to_string(),
            monitor: Monitor::with_interval(state, report, interval),
            player: None,
            events: None,
            state: SessionState::Idle,
        }
    }

    pub fn stream_url(&self) -> &str {
        &self.stream_url
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.player.is_some()
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    pub fn target_buffer_secs(&self) -> f64 {
        self.monitor_state().target_buffer_secs
    }

    /// Commit a new target buffer from the control.
    ///
    /// The value is clamped and rounded to one decimal, then pushed to the
    /// loaded item. Without a loaded stream it is kept for the next start.
    pub fn set_target_buffer(&mut self, secs: f64) -> f64 {
        let value = normalize_target_buffer(secs);
        self.monitor_state().target_buffer_secs = value;

        if let Some(player) = self.player.as_ref() {
            player
                .item()
                .set_preferred_forward_buffer_duration(Duration::from_secs_f64(value));
        }
        info!("Target buffer set to {:.1}s", value);
        value
    }

    /// Stop any current playback, then load and play the stream.
    pub fn start(&mut self) -> Result<()> {
        self.stop();
        info!("Starting playback of {}", self.stream_url);

        let mut player = match self.backend.load(&self.stream_url) {
            Ok(player) => player,
            Err(err) => {
                error!("Failed to load stream: {}", err);
                self.state = SessionState::Failed(err.to_string());
                return Err(err);
            }
        };

        let item = player.item();
        let target = self.target_buffer_secs();
        item.set_preferred_forward_buffer_duration(Duration::from_secs_f64(target));
        self.events = Some(item.subscribe());

        player.play();
        self.monitor.start(item);
        self.player = Some(player);
        self.state = SessionState::Playing;
        Ok(())
    }

    /// Pause and release the player, detach observers and stop the monitor.
    pub fn stop(&mut self) {
        if let Some(mut player) = self.player.take() {
            info!("Stopping playback");
            player.pause();
        }
        self.events = None;
        self.monitor.stop();
        self.state = SessionState::Idle;
    }

    /// Drain pending item notifications.
    ///
    /// Stalls and failures are logged and returned for display; nothing is
    /// retried.
    pub fn poll_events(&mut self) -> Vec<PlaybackEvent> {
        let Some(events) = self.events.as_ref() else {
            return Vec::new();
        };
        let drained: Vec<PlaybackEvent> = events.try_iter().collect();

        for event in &drained {
            match event {
                PlaybackEvent::DidPlayToEnd => {
                    info!("Stream played to end");
                    self.state = SessionState::Ended;
                }
                PlaybackEvent::FailedToPlayToEnd { error: message } => {
                    error!("Stream failed to play to end: {}", message);
                    self.state = SessionState::Failed(message.clone());
                }
                PlaybackEvent::PlaybackStalled => {
                    warn!("Playback stalled waiting for media");
                }
            }
        }

        drained
    }

    fn monitor_state(&self) -> std::sync::MutexGuard<'_, PlaybackMonitorState> {
        self.monitor.state().lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::LatencyReport;
    use crate::playback::testing::FakeBackend;
    use crate::playback::PlayerItem;
    use crate::simulate::SimulatedBackend;
    use std::time::Instant;

    fn session(backend: Arc<FakeBackend>) -> (PlaybackSession, Arc<Mutex<Vec<LatencyReport>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let report: ReportFn = Arc::new(move |report| seen_clone.lock().unwrap().push(report));
        let session =
            PlaybackSession::with_monitor_interval(backend, report, Duration::from_millis(20));
        (session, seen)
    }

    #[test]
    fn target_change_without_stream_applies_on_next_start() {
        let backend = Arc::new(FakeBackend::new(false, None));
        let (mut session, _) = session(backend.clone());

        assert_eq!(session.set_target_buffer(5.26), 5.3);
        assert!(!session.is_loaded());

        session.start().expect("start");
        let item = backend.last_item().expect("item built");
        assert_eq!(
            item.preferred_forward_buffer_duration(),
            Duration::from_secs_f64(5.3)
        );
        assert!(item.is_playing());
    }

    #[test]
    fn target_change_propagates_to_loaded_item() {
        let backend = Arc::new(FakeBackend::new(false, None));
        let (mut session, _) = session(backend.clone());
        session.start().expect("start");

        session.set_target_buffer(1.24);
        let item = backend.last_item().expect("item built");
        assert_eq!(
            item.preferred_forward_buffer_duration(),
            Duration::from_secs_f64(1.2)
        );
    }

    #[test]
    fn restart_releases_previous_player() {
        let backend = Arc::new(FakeBackend::new(false, None));
        let (mut session, _) = session(backend.clone());

        session.start().expect("first start");
        let first = backend.last_item().expect("first item");
        session.start().expect("second start");

        assert_eq!(backend.loads(), 2);
        assert!(!first.is_playing());
        assert_eq!(session.state(), &SessionState::Playing);
    }

    #[test]
    fn stop_halts_label_updates() {
        let backend = Arc::new(FakeBackend::new(true, None));
        let (mut session, seen) = session(backend);

        session.start().expect("start");
        std::thread::sleep(Duration::from_millis(100));
        session.stop();
        assert!(!session.monitor().is_running());

        let count = seen.lock().unwrap().len();
        assert!(count >= 1);
        assert!(seen.lock().unwrap().iter().all(|r| r.latency_ms == 4000));

        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(seen.lock().unwrap().len(), count);
    }

    #[test]
    fn failure_events_are_surfaced_without_retry() {
        let backend = Arc::new(FakeBackend::new(false, None));
        let (mut session, _) = session(backend.clone());
        session.start().expect("start");

        let item = backend.last_item().expect("item built");
        item.emit(PlaybackEvent::PlaybackStalled);
        item.emit(PlaybackEvent::FailedToPlayToEnd {
            error: "segment 404".to_string(),
        });

        let events = session.poll_events();
        assert_eq!(events.len(), 2);
        assert_eq!(
            session.state(),
            &SessionState::Failed("segment 404".to_string())
        );
        assert_eq!(backend.loads(), 1);
        assert!(session.poll_events().is_empty());
    }

    #[test]
    fn stop_detaches_event_observers() {
        let backend = Arc::new(FakeBackend::new(false, None));
        let (mut session, _) = session(backend.clone());
        session.start().expect("start");
        let item = backend.last_item().expect("item built");

        session.stop();
        item.emit(PlaybackEvent::DidPlayToEnd);
        assert!(session.poll_events().is_empty());
        assert_eq!(session.state(), &SessionState::Idle);
    }

    #[test]
    fn load_errors_mark_the_session_failed() {
        let backend = Arc::new(FakeBackend::failing());
        let (mut session, _) = session(backend.clone());
        assert!(session.start().is_err());
        assert!(matches!(session.state(), SessionState::Failed(_)));
        assert!(!session.monitor().is_running());
        assert!(!session.is_loaded());
        assert!(backend.last_item().is_none());
    }

    fn quick_simulation(total_segments: Option<usize>, fail_after: Option<usize>) -> SimulatedBackend {
        SimulatedBackend {
            segment: Duration::from_millis(100),
            min_fetch: Duration::from_millis(5),
            max_fetch: Duration::from_millis(5),
            slow_fetch_chance: 0.0,
            slow_fetch: Duration::ZERO,
            total_segments,
            fail_after,
        }
    }

    fn poll_until(session: &mut PlaybackSession, done: impl Fn(&SessionState) -> bool) -> Vec<PlaybackEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut seen = Vec::new();
        while !done(session.state()) && Instant::now() < deadline {
            seen.extend(session.poll_events());
            std::thread::sleep(Duration::from_millis(20));
        }
        seen
    }

    #[test]
    fn finite_stream_moves_session_to_ended() {
        let report: ReportFn = Arc::new(|_| {});
        let backend = Arc::new(quick_simulation(Some(3), None));
        let mut session =
            PlaybackSession::with_monitor_interval(backend, report, Duration::from_millis(20));

        session.start().expect("start");
        let events = poll_until(&mut session, |state| *state == SessionState::Ended);

        assert_eq!(session.state(), &SessionState::Ended);
        assert_eq!(events.last(), Some(&PlaybackEvent::DidPlayToEnd));
    }

    #[test]
    fn stream_outage_moves_session_to_failed() {
        let report: ReportFn = Arc::new(|_| {});
        let backend = Arc::new(quick_simulation(None, Some(2)));
        let mut session =
            PlaybackSession::with_monitor_interval(backend, report, Duration::from_millis(20));

        session.start().expect("start");
        poll_until(&mut session, |state| matches!(state, SessionState::Failed(_)));

        match session.state() {
            SessionState::Failed(error) => assert!(error.contains("simulated network failure")),
            other => panic!("expected a failed session, got {:?}", other),
        }
    }
}
