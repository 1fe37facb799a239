//! Offline backend with a synthetic network.
//!
//! Segments "arrive" after a random fetch delay, with an occasional slow
//! fetch so the buffering and stall paths show up without a real stream.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use rand::Rng;

use crate::constants::DEFAULT_TARGET_BUFFER_SECS;
use crate::error::Result;
use crate::playback::{BufferedItem, ItemPlayer, MediaBackend, MediaPlayer};

#[derive(Debug, Clone, Copy)]
pub struct SimulatedBackend {
    /// Media duration of each synthetic segment.
    pub segment: Duration,
    /// Fetch delay range for a normal segment.
    pub min_fetch: Duration,
    pub max_fetch: Duration,
    /// Probability that a fetch takes `slow_fetch` instead.
    pub slow_fetch_chance: f64,
    pub slow_fetch: Duration,
    /// Finite stream length; `None` behaves like a live stream.
    pub total_segments: Option<usize>,
    /// Fail the item once this many segments have loaded.
    pub fail_after: Option<usize>,
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self {
            segment: Duration::from_secs(2),
            min_fetch: Duration::from_millis(150),
            max_fetch: Duration::from_millis(600),
            slow_fetch_chance: 0.05,
            slow_fetch: Duration::from_secs(4),
            total_segments: None,
            fail_after: None,
        }
    }
}

impl SimulatedBackend {
    fn fetch_delay<R: Rng>(&self, rng: &mut R) -> Duration {
        if self.slow_fetch_chance > 0.0 && rng.gen_bool(self.slow_fetch_chance.min(1.0)) {
            return self.slow_fetch;
        }
        let min = self.min_fetch.as_millis() as u64;
        let max = (self.max_fetch.as_millis() as u64).max(min);
        Duration::from_millis(rng.gen_range(min..=max))
    }

    fn run(self, item: Arc<BufferedItem>) {
        let mut rng = rand::thread_rng();
        let mut loaded = 0usize;

        loop {
            if let Some(total) = self.total_segments {
                if loaded >= total {
                    info!("Simulated stream complete after {} segments", loaded);
                    item.mark_complete();
                    return;
                }
            }
            if self.fail_after == Some(loaded) {
                item.fail(format!("simulated network failure after {} segments", loaded));
                return;
            }
            if !item.wait_for_room() {
                return;
            }
            let delay = self.fetch_delay(&mut rng);
            if !item.sleep(delay) {
                return;
            }
            item.append_segment(self.segment);
            loaded += 1;
            debug!("simulated segment {} after {:?}", loaded, delay);
        }
    }
}

impl MediaBackend for SimulatedBackend {
    fn load(&self, url: &str) -> Result<Box<dyn MediaPlayer>> {
        info!("Simulating {}", url);
        let item = BufferedItem::new(Duration::from_secs_f64(DEFAULT_TARGET_BUFFER_SECS));
        let backend = *self;
        Ok(Box::new(ItemPlayer::spawn(item, move |item| backend.run(item))))
    }
}
