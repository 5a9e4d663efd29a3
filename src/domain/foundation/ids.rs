//! Strongly-typed identifier value objects.
//!
//! Platform identifiers (users, guilds, channels) are opaque `u64`s handed
//! to us by the chat platform; task identifiers are per-user counters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a user, as assigned by the chat platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Creates a UserId from a raw platform id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw platform id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Unique identifier for a guild (server).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuildId(u64);

impl GuildId {
    /// Creates a GuildId from a raw platform id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw platform id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for GuildId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Unique identifier for a text channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(u64);

impl ChannelId {
    /// Creates a ChannelId from a raw platform id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw platform id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChannelId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Unique identifier for a voice channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoiceChannelId(u64);

impl VoiceChannelId {
    /// Creates a VoiceChannelId from a raw platform id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw platform id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VoiceChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for VoiceChannelId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Identifier for a study task, unique within one user's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u32);

impl TaskId {
    /// Creates a TaskId from a raw counter value.
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw counter value.
    pub fn get(&self) -> u32 {
        self.0
    }

    /// Returns the identifier that follows this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for TaskId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}
