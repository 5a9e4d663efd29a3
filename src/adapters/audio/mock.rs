//! Mock audio player for testing.
//!
//! Configurable in-memory implementation of the [`AudioPlayer`] port:
//! connections are flags, playback is a flag, and tests can inject
//! errors, disable native looping, or make playback silently die so the
//! poll-and-restart path is exercised.
//!
//! # Example
//!
//! ```ignore
//! let player = MockAudioPlayer::new()
//!     .with_connected(guild)
//!     .with_looping_support(false);
//! ```

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::foundation::{GuildId, VoiceChannelId};
use crate::ports::{AudioError, AudioPlayer};

/// Shared mutable state behind every clone of the mock.
#[derive(Default)]
struct MockState {
    connected: Mutex<HashSet<GuildId>>,
    playing: Mutex<HashSet<GuildId>>,
    play_calls: AtomicUsize,
    stop_calls: AtomicUsize,
}

/// Mock audio player.
#[derive(Clone)]
pub struct MockAudioPlayer {
    state: Arc<MockState>,
    supports_looping: bool,
    /// When set, playback never registers as audible, forcing the
    /// poll-and-restart fallback to keep restarting it.
    silent: bool,
    play_error: Option<AudioError>,
}

impl MockAudioPlayer {
    /// Creates a disconnected mock with native looping.
    pub fn new() -> Self {
        Self {
            state: Arc::new(MockState::default()),
            supports_looping: true,
            silent: false,
            play_error: None,
        }
    }

    /// Marks the guild as having a live voice connection.
    pub fn with_connected(self, guild: GuildId) -> Self {
        self.state.connected.lock().unwrap().insert(guild);
        self
    }

    /// Sets whether the layer advertises native looping.
    pub fn with_looping_support(mut self, supported: bool) -> Self {
        self.supports_looping = supported;
        self
    }

    /// Makes every `play` succeed without ever becoming audible.
    pub fn with_silent_playback(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Makes every `play` fail with the given error.
    pub fn with_play_error(mut self, error: AudioError) -> Self {
        self.play_error = Some(error);
        self
    }

    /// Number of `play` calls so far.
    pub fn play_count(&self) -> usize {
        self.state.play_calls.load(Ordering::SeqCst)
    }

    /// Number of `stop` calls so far.
    pub fn stop_count(&self) -> usize {
        self.state.stop_calls.load(Ordering::SeqCst)
    }

    /// Synchronous view of the playing flag, for assertions.
    pub fn is_playing_now(&self, guild: GuildId) -> bool {
        self.state.playing.lock().unwrap().contains(&guild)
    }
}

impl Default for MockAudioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioPlayer for MockAudioPlayer {
    async fn join(&self, guild: GuildId, _channel: VoiceChannelId) -> Result<(), AudioError> {
        self.state.connected.lock().unwrap().insert(guild);
        Ok(())
    }

    async fn leave(&self, guild: GuildId) -> Result<(), AudioError> {
        self.state.connected.lock().unwrap().remove(&guild);
        self.state.playing.lock().unwrap().remove(&guild);
        Ok(())
    }

    async fn is_connected(&self, guild: GuildId) -> bool {
        self.state.connected.lock().unwrap().contains(&guild)
    }

    async fn play(&self, guild: GuildId, _looped: bool) -> Result<(), AudioError> {
        self.state.play_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = &self.play_error {
            return Err(error.clone());
        }
        if !self.state.connected.lock().unwrap().contains(&guild) {
            return Err(AudioError::NoVoiceConnection);
        }
        if !self.silent {
            self.state.playing.lock().unwrap().insert(guild);
        }
        Ok(())
    }

    async fn stop(&self, guild: GuildId) -> Result<(), AudioError> {
        self.state.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.state.playing.lock().unwrap().remove(&guild);
        Ok(())
    }

    async fn is_playing(&self, guild: GuildId) -> bool {
        self.is_playing_now(guild)
    }

    fn supports_looping(&self) -> bool {
        self.supports_looping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guild() -> GuildId {
        GuildId::new(1)
    }

    #[tokio::test]
    async fn join_then_play_becomes_audible() {
        let player = MockAudioPlayer::new();
        player.join(guild(), VoiceChannelId::new(2)).await.unwrap();

        player.play(guild(), true).await.unwrap();
        assert!(player.is_playing(guild()).await);
        assert_eq!(player.play_count(), 1);
    }

    #[tokio::test]
    async fn play_without_connection_fails() {
        let player = MockAudioPlayer::new();
        assert!(matches!(
            player.play(guild(), false).await,
            Err(AudioError::NoVoiceConnection)
        ));
    }

    #[tokio::test]
    async fn stop_silences_playback() {
        let player = MockAudioPlayer::new().with_connected(guild());
        player.play(guild(), true).await.unwrap();

        player.stop(guild()).await.unwrap();
        assert!(!player.is_playing(guild()).await);
        assert_eq!(player.stop_count(), 1);
    }

    #[tokio::test]
    async fn silent_playback_never_registers() {
        let player = MockAudioPlayer::new()
            .with_connected(guild())
            .with_silent_playback();
        player.play(guild(), false).await.unwrap();
        assert!(!player.is_playing(guild()).await);
    }

    #[tokio::test]
    async fn injected_error_surfaces() {
        let player = MockAudioPlayer::new()
            .with_connected(guild())
            .with_play_error(AudioError::Playback("boom".into()));
        assert!(matches!(
            player.play(guild(), false).await,
            Err(AudioError::Playback(_))
        ));
    }
}
