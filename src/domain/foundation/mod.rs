//! Foundation value objects shared across the domain.

mod ids;
mod timestamp;

pub use ids::{ChannelId, GuildId, TaskId, UserId, VoiceChannelId};
pub use timestamp::Timestamp;
