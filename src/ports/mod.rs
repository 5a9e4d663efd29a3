//! Ports layer: interfaces to everything outside the application core.

mod audio_player;
mod chat_model;
mod knowledge_bank;
mod notifier;
mod task_store;

pub use audio_player::{AudioError, AudioPlayer};
pub use chat_model::{
    ChatModel, Completion, CompletionRequest, ModelError, ModelMessage, ModelRole,
};
pub use knowledge_bank::{BankError, BankStats, KnowledgeBank};
pub use notifier::{SessionEvent, SessionNotifier};
pub use task_store::{StoreError, TaskStore};
