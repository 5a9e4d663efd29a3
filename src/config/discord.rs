//! Discord gateway configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;

/// Discord connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    /// Bot token from the Discord developer portal
    pub token: Secret<String>,

    /// Guild to register slash commands in for instant updates.
    ///
    /// Commands are always registered globally as well; global registration
    /// can take up to an hour to propagate.
    pub guild_id: Option<u64>,

    /// Channel that receives activity notifications (new tasks, chat visits).
    ///
    /// Notifications are skipped entirely when unset.
    pub notification_channel_id: Option<u64>,
}

impl DiscordConfig {
    /// Expose the bot token for client construction.
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }

    /// Validate Discord configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.token.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("DISCORD_TOKEN"));
        }
        Ok(())
    }
}
