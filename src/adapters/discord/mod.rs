//! Discord surface: slash commands, mention replies, voice playback,
//! and session notifications.

pub mod commands;
pub mod events;
pub mod format;
mod notifier;
mod voice;

pub use commands::{all_commands, Context, Data, Error};
pub use events::MentionHandler;
pub use notifier::DiscordNotifier;
pub use voice::SongbirdPlayer;
