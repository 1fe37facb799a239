//! Buffered item shared by the concrete backends.
//!
//! A [`BufferedItem`] owns the [`BufferTimeline`] of one stream. A loader
//! thread (network or simulated) appends segments to it while a clock
//! thread advances the playhead and emits [`PlaybackEvent`]s. The
//! [`ItemPlayer`] wraps both threads behind the [`MediaPlayer`] contract.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::constants::{hls::STOP_POLL_INTERVAL, CLOCK_INTERVAL};
use crate::playback::timeline::BufferTimeline;
use crate::playback::{MediaPlayer, PlaybackEvent, PlayerItem, TimeRange};

pub struct BufferedItem {
    timeline: Mutex<BufferTimeline>,
    preferred: Mutex<Duration>,
    subscribers: Mutex<Vec<Sender<PlaybackEvent>>>,
    stop: AtomicBool,
}

impl BufferedItem {
    pub fn new(preferred: Duration) -> Arc<Self> {
        Arc::new(Self {
            timeline: Mutex::new(BufferTimeline::new()),
            preferred: Mutex::new(preferred),
            subscribers: Mutex::new(Vec::new()),
            stop: AtomicBool::new(false),
        })
    }

    fn timeline(&self) -> MutexGuard<'_, BufferTimeline> {
        self.timeline.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a newly loaded segment.
    pub fn append_segment(&self, duration: Duration) {
        self.timeline().append(duration);
    }

    /// Record that the last segment of the stream has been loaded.
    pub fn mark_complete(&self) {
        self.timeline().mark_complete();
    }

    /// Fail the item; subscribers receive `FailedToPlayToEnd`.
    pub fn fail(&self, error: String) {
        let event = self.timeline().fail(error, Instant::now());
        if let Some(event) = event {
            self.emit(event);
        }
    }

    pub fn buffered_ahead(&self) -> Duration {
        self.timeline().buffered_ahead(Instant::now())
    }

    /// True while the forward buffer is below the preferred duration.
    pub fn has_room(&self) -> bool {
        self.buffered_ahead() < self.preferred_forward_buffer_duration()
    }

    /// Block until the forward buffer has room. Returns false once stopped.
    pub fn wait_for_room(&self) -> bool {
        loop {
            if self.is_stopped() {
                return false;
            }
            if self.has_room() {
                return true;
            }
            thread::sleep(STOP_POLL_INTERVAL);
        }
    }

    /// Sleep for `total`, checking the stop flag. Returns false if stopped early.
    pub fn sleep(&self, total: Duration) -> bool {
        let start = Instant::now();
        while start.elapsed() < total {
            if self.is_stopped() {
                return false;
            }
            let remaining = total.saturating_sub(start.elapsed());
            thread::sleep(remaining.min(STOP_POLL_INTERVAL));
        }
        !self.is_stopped()
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    fn set_playing(&self, playing: bool) {
        self.timeline().set_playing(playing, Instant::now());
    }

    fn tick(&self) {
        let preferred = self.preferred_forward_buffer_duration();
        let event = self.timeline().tick(Instant::now(), preferred);
        if let Some(event) = event {
            self.emit(event);
        }
    }

    fn emit(&self, event: PlaybackEvent) {
        if self.is_stopped() {
            return;
        }
        debug!("item event: {}", event);
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl PlayerItem for BufferedItem {
    fn preferred_forward_buffer_duration(&self) -> Duration {
        *self.preferred.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_preferred_forward_buffer_duration(&self, duration: Duration) {
        *self.preferred.lock().unwrap_or_else(|e| e.into_inner()) = duration;
    }

    fn is_playback_likely_to_keep_up(&self) -> bool {
        let preferred = self.preferred_forward_buffer_duration();
        self.timeline()
            .is_likely_to_keep_up(Instant::now(), preferred)
    }

    fn loaded_time_ranges(&self) -> Vec<TimeRange> {
        self.timeline()
            .loaded_range(Instant::now())
            .into_iter()
            .collect()
    }

    fn subscribe(&self) -> Receiver<PlaybackEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }
}

/// Player driving a [`BufferedItem`] with a loader and a clock thread.
pub struct ItemPlayer {
    item: Arc<BufferedItem>,
    clock: Option<JoinHandle<()>>,
}

impl ItemPlayer {
    /// Spawn the loader and clock threads for `item`.
    ///
    /// The loader owns its own stop checks through the item; it is detached
    /// on drop because it may be blocked in a request.
    pub fn spawn<F>(item: Arc<BufferedItem>, loader: F) -> Self
    where
        F: FnOnce(Arc<BufferedItem>) + Send + 'static,
    {
        let loader_item = item.clone();
        thread::spawn(move || loader(loader_item));

        let clock_item = item.clone();
        let clock = thread::spawn(move || {
            while !clock_item.is_stopped() {
                clock_item.tick();
                thread::sleep(CLOCK_INTERVAL);
            }
        });

        Self {
            item,
            clock: Some(clock),
        }
    }
}

impl MediaPlayer for ItemPlayer {
    fn play(&mut self) {
        self.item.set_playing(true);
    }

    fn pause(&mut self) {
        self.item.set_playing(false);
    }

    fn item(&self) -> Arc<dyn PlayerItem> {
        self.item.clone()
    }
}

impl Drop for ItemPlayer {
    fn drop(&mut self) {
        self.item.stop();
        if let Some(handle) = self.clock.take() {
            if handle.join().is_err() {
                warn!("item clock thread panicked during join");
            }
        }
    }
}
