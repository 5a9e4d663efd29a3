//! Songbird-backed audio player.
//!
//! Implements the [`AudioPlayer`] port over songbird's per-guild voice
//! calls. Connect and move operations are serialized per guild by the
//! call's own lock; the last join request wins when two users of the
//! same guild race.

use async_trait::async_trait;
use songbird::tracks::{PlayMode, TrackHandle};
use songbird::Songbird;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::domain::foundation::{GuildId, VoiceChannelId};
use crate::ports::{AudioError, AudioPlayer};

/// Voice playback through songbird.
pub struct SongbirdPlayer {
    manager: Arc<Songbird>,
    sound_file: PathBuf,
    /// The track we started per guild, so stop and is_playing can reach it.
    tracks: Mutex<HashMap<GuildId, TrackHandle>>,
}

impl SongbirdPlayer {
    /// Creates a player over the given songbird manager, looping the
    /// given local sound file.
    pub fn new(manager: Arc<Songbird>, sound_file: PathBuf) -> Self {
        Self {
            manager,
            sound_file,
            tracks: Mutex::new(HashMap::new()),
        }
    }

    fn take_track(&self, guild: GuildId) -> Option<TrackHandle> {
        self.tracks.lock().unwrap().remove(&guild)
    }

    fn current_track(&self, guild: GuildId) -> Option<TrackHandle> {
        self.tracks.lock().unwrap().get(&guild).cloned()
    }
}

#[async_trait]
impl AudioPlayer for SongbirdPlayer {
    async fn join(&self, guild: GuildId, channel: VoiceChannelId) -> Result<(), AudioError> {
        let guild_id = serenity::model::id::GuildId::new(guild.get());
        let channel_id = serenity::model::id::ChannelId::new(channel.get());

        self.manager
            .join(guild_id, channel_id)
            .await
            .map(|_| ())
            .map_err(|e| AudioError::Connection(e.to_string()))
    }

    async fn leave(&self, guild: GuildId) -> Result<(), AudioError> {
        if let Some(track) = self.take_track(guild) {
            let _ = track.stop();
        }
        let guild_id = serenity::model::id::GuildId::new(guild.get());
        if self.manager.get(guild_id).is_some() {
            self.manager
                .remove(guild_id)
                .await
                .map_err(|e| AudioError::Connection(e.to_string()))?;
        }
        Ok(())
    }

    async fn is_connected(&self, guild: GuildId) -> bool {
        let guild_id = serenity::model::id::GuildId::new(guild.get());
        match self.manager.get(guild_id) {
            Some(call) => call.lock().await.current_connection().is_some(),
            None => false,
        }
    }

    async fn play(&self, guild: GuildId, looped: bool) -> Result<(), AudioError> {
        if !self.sound_file.exists() {
            return Err(AudioError::MissingAudioFile(self.sound_file.clone()));
        }

        let guild_id = serenity::model::id::GuildId::new(guild.get());
        let call = self
            .manager
            .get(guild_id)
            .ok_or(AudioError::NoVoiceConnection)?;

        // One track per guild; replace whatever we started before.
        if let Some(previous) = self.take_track(guild) {
            let _ = previous.stop();
        }

        let source = songbird::input::File::new(self.sound_file.clone());
        let handle = call.lock().await.play_input(source.into());

        if looped {
            handle
                .enable_loop()
                .map_err(|e| AudioError::Playback(e.to_string()))?;
        }

        self.tracks.lock().unwrap().insert(guild, handle);
        Ok(())
    }

    async fn stop(&self, guild: GuildId) -> Result<(), AudioError> {
        if let Some(track) = self.take_track(guild) {
            track
                .stop()
                .map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }

    async fn is_playing(&self, guild: GuildId) -> bool {
        let Some(track) = self.current_track(guild) else {
            return false;
        };
        match track.get_info().await {
            Ok(state) => matches!(state.playing, PlayMode::Play),
            Err(_) => {
                // The track ended or the driver dropped it; forget it.
                self.take_track(guild);
                false
            }
        }
    }

    fn supports_looping(&self) -> bool {
        true
    }
}
