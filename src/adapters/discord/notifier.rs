//! Discord session notifier.
//!
//! Delivers session phase announcements to the channel a session was
//! started from. Delivery failures are logged and swallowed so a dead
//! channel never takes a timer task down.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{ChannelId, UserId};
use crate::ports::{SessionEvent, SessionNotifier};

/// Channel-message notifier.
pub struct DiscordNotifier {
    http: Arc<serenity::http::Http>,
    focus_minutes: u64,
    break_minutes: u64,
}

impl DiscordNotifier {
    /// Creates a notifier; the phase lengths only shape the announcement
    /// texts.
    pub fn new(http: Arc<serenity::http::Http>, focus_minutes: u64, break_minutes: u64) -> Self {
        Self {
            http,
            focus_minutes,
            break_minutes,
        }
    }

    fn render(&self, user: UserId, event: &SessionEvent) -> String {
        let mention = format!("<@{}>", user.get());
        match event {
            SessionEvent::FocusStarted { restarted: true } => format!(
                "🔄 {} Found a running timer and restarted it. **Focus mode:** {} minutes on the clock.",
                mention, self.focus_minutes
            ),
            SessionEvent::FocusStarted { restarted: false } => format!(
                "🍅 {} **Focus mode started!** {} minutes on the clock.\n🎵 Background audio is on - `/focus_stop` stops everything.",
                mention, self.focus_minutes
            ),
            SessionEvent::BreakStarted => format!(
                "⏰ {} **Focus time is up!** Enjoy a {}-minute break - the audio keeps playing.",
                mention, self.break_minutes
            ),
            SessionEvent::Completed => format!(
                "⚡ {} **Break is over!** Ready for the next round?\n💡 `/focus` starts another session, `/music_stop` stops the audio.",
                mention
            ),
            SessionEvent::AudioFailed { reason } => {
                format!("⚠️ {} Background audio is not running: {}", mention, reason)
            }
        }
    }
}

#[async_trait]
impl SessionNotifier for DiscordNotifier {
    async fn notify(&self, channel: ChannelId, user: UserId, event: SessionEvent) {
        let text = self.render(user, &event);
        let channel_id = serenity::model::id::ChannelId::new(channel.get());

        if let Err(e) = channel_id.say(&self.http, text).await {
            tracing::error!(channel = %channel, error = %e, "failed to deliver session event");
        }
    }
}
