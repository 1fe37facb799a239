//! Periodic latency monitor for UI updates.
//!
//! While playback is active the monitor samples the current player item on
//! a fixed period, recomputes the latency estimate and hands a
//! [`LatencyReport`] to the display callback.

mod estimate;
mod state;

use std::{
    sync::{
        mpsc::{self, RecvTimeoutError, Sender},
        Arc, Mutex,
    },
    thread::JoinHandle,
    time::{Duration, Instant},
};

use log::{debug, warn};

use crate::constants::MONITOR_INTERVAL;
use crate::playback::PlayerItem;

pub use estimate::{estimate_latency_secs, latency_ms, Severity};
pub use state::{normalize_target_buffer, LatencyReport, PlaybackMonitorState};

/// Display callback invoked once per tick.
pub type ReportFn = Arc<dyn Fn(LatencyReport) + Send + Sync>;

struct TickThread {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Background monitor that ticks at a fixed interval.
pub struct Monitor {
    state: Arc<Mutex<PlaybackMonitorState>>,
    report: ReportFn,
    interval: Duration,
    started_at: Option<Instant>,
    tick: Option<TickThread>,
}

impl Monitor {
    /// Create a monitor with the default one second period.
    pub fn new(state: Arc<Mutex<PlaybackMonitorState>>, report: ReportFn) -> Self {
        Self::with_interval(state, report, MONITOR_INTERVAL)
    }

    pub fn with_interval(
        state: Arc<Mutex<PlaybackMonitorState>>,
        report: ReportFn,
        interval: Duration,
    ) -> Self {
        Self {
            state,
            report,
            interval,
            started_at: None,
            tick: None,
        }
    }

    /// Start ticking against `item`, replacing any running tick thread.
    ///
    /// The first report is produced one interval after this call.
    pub fn start(&mut self, item: Arc<dyn PlayerItem>) {
        self.stop();

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let state = self.state.clone();
        let report = self.report.clone();
        let interval = self.interval;

        let handle = std::thread::spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    let next = {
                        let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
                        state.sample(item.as_ref())
                    };
                    debug!("latency tick: {} ({})", next.label(), next.severity);
                    report(next);
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        self.started_at = Some(Instant::now());
        self.tick = Some(TickThread { stop_tx, handle });
    }

    /// Stop ticking. No report callback runs after this returns.
    pub fn stop(&mut self) {
        self.started_at = None;
        if let Some(tick) = self.tick.take() {
            let _ = tick.stop_tx.send(());
            if tick.handle.thread().id() == std::thread::current().id() {
                warn!("monitor stop called from monitor thread; skipping join");
            } else if tick.handle.join().is_err() {
                warn!("monitor thread panicked during join");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.tick.is_some()
    }

    /// Instant the current run started, if ticking.
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn state(&self) -> &Arc<Mutex<PlaybackMonitorState>> {
        &self.state
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop();
    }
}
