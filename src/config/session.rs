//! Focus-session and audio configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ValidationError;

/// Focus-session timing configuration.
///
/// Durations are configurable so tests can compress a full
/// focus/break cycle into milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Focus phase length in seconds
    #[serde(default = "default_focus_secs")]
    pub focus_secs: u64,

    /// Break phase length in seconds
    #[serde(default = "default_break_secs")]
    pub break_secs: u64,
}

impl SessionConfig {
    /// Focus phase length as a Duration
    pub fn focus(&self) -> Duration {
        Duration::from_secs(self.focus_secs)
    }

    /// Break phase length as a Duration
    pub fn brk(&self) -> Duration {
        Duration::from_secs(self.break_secs)
    }

    /// Validate session configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.focus_secs == 0 || self.break_secs == 0 {
            return Err(ValidationError::InvalidSessionDurations);
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            focus_secs: default_focus_secs(),
            break_secs: default_break_secs(),
        }
    }
}

/// Background-audio configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// Local sound file looped during focus sessions
    #[serde(default = "default_sound_file")]
    pub sound_file: PathBuf,

    /// Poll interval for the restart-on-silence fallback, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl AudioConfig {
    /// Poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Validate audio configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.poll_interval_ms == 0 {
            return Err(ValidationError::InvalidPollInterval);
        }
        Ok(())
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sound_file: default_sound_file(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_focus_secs() -> u64 {
    25 * 60
}

fn default_break_secs() -> u64 {
    5 * 60
}

fn default_sound_file() -> PathBuf {
    PathBuf::from("bell.mp3")
}

fn default_poll_interval_ms() -> u64 {
    500
}
