//! Focus-session phase state machine.
//!
//! A session moves `Focus -> Break -> Done`, driven solely by timer expiry;
//! no external event advances a phase. Cancellation can interrupt any phase.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of a focus session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Focused work; background audio starts alongside this phase.
    Focus,
    /// Rest between focus blocks; audio keeps playing.
    Break,
    /// The session ran to completion.
    Done,
}

impl SessionPhase {
    /// Returns the phase entered when this one's timer expires.
    ///
    /// `Done` is terminal and returns itself.
    pub fn next(&self) -> SessionPhase {
        match self {
            SessionPhase::Focus => SessionPhase::Break,
            SessionPhase::Break => SessionPhase::Done,
            SessionPhase::Done => SessionPhase::Done,
        }
    }

    /// Whether the session has run to completion.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Done)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionPhase::Focus => "focus",
            SessionPhase::Break => "break",
            SessionPhase::Done => "done",
        };
        write!(f, "{}", s)
    }
}

/// How a start request affected the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// No prior session existed for the user.
    Started,
    /// A live session was cancelled and replaced.
    Restarted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_focus_break_done() {
        assert_eq!(SessionPhase::Focus.next(), SessionPhase::Break);
        assert_eq!(SessionPhase::Break.next(), SessionPhase::Done);
    }

    #[test]
    fn done_is_terminal_and_absorbing() {
        assert!(SessionPhase::Done.is_terminal());
        assert_eq!(SessionPhase::Done.next(), SessionPhase::Done);
    }

    #[test]
    fn focus_and_break_are_not_terminal() {
        assert!(!SessionPhase::Focus.is_terminal());
        assert!(!SessionPhase::Break.is_terminal());
    }

    #[test]
    fn phase_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SessionPhase::Focus).unwrap(),
            "\"focus\""
        );
    }
}
