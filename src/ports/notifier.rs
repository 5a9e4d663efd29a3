//! Session-notifier port - phase announcements back to the user.
//!
//! The session registry announces phase transitions through this port so
//! its timer tasks stay decoupled from the chat platform.

use async_trait::async_trait;

use crate::domain::foundation::{ChannelId, UserId};

/// Something a running session wants the user to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A focus phase began; `restarted` when it replaced a live session.
    FocusStarted { restarted: bool },
    /// The focus timer expired and the break began.
    BreakStarted,
    /// The break ended; the session is done.
    Completed,
    /// The background audio loop could not run or aborted.
    AudioFailed { reason: String },
}

/// Port for delivering session events to the channel a session was
/// started from.
///
/// Delivery is best-effort: implementations swallow and log failures so
/// a dead channel can never take a timer task down.
#[async_trait]
pub trait SessionNotifier: Send + Sync {
    /// Announces an event for `user` in `channel`.
    async fn notify(&self, channel: ChannelId, user: UserId, event: SessionEvent);
}
