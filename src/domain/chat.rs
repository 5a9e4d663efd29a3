//! Companion-chat domain: message history and personality refresh policy.

use serde::{Deserialize, Serialize};

/// Number of history entries kept when composing a completion and when
/// persisting, so stored history stays bounded.
pub const HISTORY_WINDOW: usize = 20;

/// Personality analysis needs at least this many history entries
/// (three full exchanges) before it produces anything useful.
pub const ANALYSIS_MIN_ENTRIES: usize = 6;

/// Personality is re-analyzed every five exchanges (ten history entries).
pub const ANALYSIS_EVERY_ENTRIES: usize = 10;

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of companion chat, as persisted in the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    /// Creates a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Creates an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Keeps only the most recent [`HISTORY_WINDOW`] entries.
pub fn trim_history(history: &mut Vec<ChatMessage>) {
    if history.len() > HISTORY_WINDOW {
        let excess = history.len() - HISTORY_WINDOW;
        history.drain(..excess);
    }
}

/// Whether the personality profile should be refreshed after the history
/// has grown to `entries` messages.
pub fn should_refresh_personality(entries: usize) -> bool {
    entries >= ANALYSIS_MIN_ENTRIES && entries % ANALYSIS_EVERY_ENTRIES == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&ChatRole::User).unwrap(),
            "\"user\""
        );
        assert_eq!(
            serde_json::to_string(&ChatRole::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn trim_keeps_most_recent_entries() {
        let mut history: Vec<ChatMessage> =
            (0..25).map(|i| ChatMessage::user(format!("m{}", i))).collect();
        trim_history(&mut history);

        assert_eq!(history.len(), HISTORY_WINDOW);
        assert_eq!(history[0].content, "m5");
        assert_eq!(history.last().unwrap().content, "m24");
    }

    #[test]
    fn trim_leaves_short_history_alone() {
        let mut history = vec![ChatMessage::user("hi")];
        trim_history(&mut history);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn personality_refresh_needs_minimum_history() {
        // Fewer than three exchanges: never refresh, even on a multiple of 10.
        assert!(!should_refresh_personality(0));
        assert!(!should_refresh_personality(4));
    }

    #[test]
    fn personality_refreshes_every_five_exchanges() {
        assert!(should_refresh_personality(10));
        assert!(should_refresh_personality(20));
        assert!(!should_refresh_personality(12));
        assert!(!should_refresh_personality(15));
    }
}
