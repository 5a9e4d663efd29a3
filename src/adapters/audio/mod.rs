//! Audio playback adapters.

mod mock;

pub use mock::MockAudioPlayer;
