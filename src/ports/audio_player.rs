//! Audio-player port - interface to the voice playback layer.
//!
//! Playback is keyed by guild: a guild has at most one voice connection,
//! shared by every session currently targeting it. Connecting or moving
//! is serialized per guild by the implementation; command-level races
//! between two users of the same guild resolve last-writer-wins.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::foundation::{GuildId, VoiceChannelId};

/// Port for voice-channel audio playback.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Connects to the given voice channel, moving there if already
    /// connected elsewhere in the guild.
    async fn join(&self, guild: GuildId, channel: VoiceChannelId) -> Result<(), AudioError>;

    /// Drops the guild's voice connection; a no-op when not connected.
    async fn leave(&self, guild: GuildId) -> Result<(), AudioError>;

    /// Whether the guild currently has a live voice connection.
    async fn is_connected(&self, guild: GuildId) -> bool;

    /// Starts playing the configured sound in the guild's channel.
    ///
    /// With `looped` the track repeats until stopped; this is only
    /// honored when [`supports_looping`](Self::supports_looping) is true.
    async fn play(&self, guild: GuildId, looped: bool) -> Result<(), AudioError>;

    /// Stops playback in the guild. Idempotent.
    async fn stop(&self, guild: GuildId) -> Result<(), AudioError>;

    /// Whether a track is currently audible in the guild.
    async fn is_playing(&self, guild: GuildId) -> bool;

    /// Whether the layer can loop a track natively. When it cannot, the
    /// audio loop falls back to poll-and-restart.
    fn supports_looping(&self) -> bool;
}

/// Audio playback errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AudioError {
    /// The guild has no live voice connection to play into.
    #[error("no voice connection for this server")]
    NoVoiceConnection,

    /// The configured sound file does not exist.
    #[error("sound file not found: {0}")]
    MissingAudioFile(PathBuf),

    /// Joining or moving the voice connection failed.
    #[error("voice connection failed: {0}")]
    Connection(String),

    /// The playback layer rejected or aborted the track.
    #[error("playback failed: {0}")]
    Playback(String),
}
