//! Playback control for the lowlat library.
//!
//! The media contract lives in [`traits`]; [`item`] and [`timeline`] model
//! the buffering state both concrete backends expose, and [`session`]
//! drives start/stop transitions for the UI.

mod events;
pub mod item;
pub mod session;
pub mod timeline;
mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use events::PlaybackEvent;
pub use item::{BufferedItem, ItemPlayer};
pub use session::{PlaybackSession, SessionState};
pub use timeline::BufferTimeline;
pub use traits::{MediaBackend, MediaPlayer, PlayerItem, TimeRange};
