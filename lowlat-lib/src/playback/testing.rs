//! In-memory doubles for the media contract.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::playback::{MediaBackend, MediaPlayer, PlaybackEvent, PlayerItem, TimeRange};

/// Item whose buffering readings never change.
pub struct FixedItem {
    likely_to_keep_up: bool,
    loaded_secs: Option<f64>,
    preferred: Mutex<Duration>,
    playing: AtomicBool,
    subscribers: Mutex<Vec<Sender<PlaybackEvent>>>,
}

impl FixedItem {
    pub fn new(is_buffering: bool, loaded_secs: Option<f64>) -> Self {
        Self {
            likely_to_keep_up: !is_buffering,
            loaded_secs,
            preferred: Mutex::new(Duration::ZERO),
            playing: AtomicBool::new(false),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    pub fn emit(&self, event: PlaybackEvent) {
        self.subscribers
            .lock()
            .unwrap()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl PlayerItem for FixedItem {
    fn preferred_forward_buffer_duration(&self) -> Duration {
        *self.preferred.lock().unwrap()
    }

    fn set_preferred_forward_buffer_duration(&self, duration: Duration) {
        *self.preferred.lock().unwrap() = duration;
    }

    fn is_playback_likely_to_keep_up(&self) -> bool {
        self.likely_to_keep_up
    }

    fn loaded_time_ranges(&self) -> Vec<TimeRange> {
        self.loaded_secs
            .map(|secs| TimeRange::new(Duration::ZERO, Duration::from_secs_f64(secs)))
            .into_iter()
            .collect()
    }

    fn subscribe(&self) -> Receiver<PlaybackEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }
}

pub struct FixedPlayer {
    item: Arc<FixedItem>,
}

impl MediaPlayer for FixedPlayer {
    fn play(&mut self) {
        self.item.playing.store(true, Ordering::SeqCst);
    }

    fn pause(&mut self) {
        self.item.playing.store(false, Ordering::SeqCst);
    }

    fn item(&self) -> Arc<dyn PlayerItem> {
        self.item.clone()
    }
}

/// Backend handing out [`FixedItem`]s and remembering the last one.
pub struct FakeBackend {
    is_buffering: bool,
    loaded_secs: Option<f64>,
    fail: bool,
    loads: AtomicUsize,
    last: Mutex<Option<Arc<FixedItem>>>,
}

impl FakeBackend {
    pub fn new(is_buffering: bool, loaded_secs: Option<f64>) -> Self {
        Self {
            is_buffering,
            loaded_secs,
            fail: false,
            loads: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(false, None)
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn last_item(&self) -> Option<Arc<FixedItem>> {
        self.last.lock().unwrap().clone()
    }
}

impl MediaBackend for FakeBackend {
    fn load(&self, url: &str) -> Result<Box<dyn MediaPlayer>> {
        if self.fail {
            return Err(Error::InvalidUrl(url.to_string()));
        }
        self.loads.fetch_add(1, Ordering::SeqCst);
        let item = Arc::new(FixedItem::new(self.is_buffering, self.loaded_secs));
        *self.last.lock().unwrap() = Some(item.clone());
        Ok(Box::new(FixedPlayer { item }))
    }
}
