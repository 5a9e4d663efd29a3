//! Task-store port - persistence for user profiles.
//!
//! The store is one flat document holding every user's profile; a load
//! reads the whole document and a save rewrites it. There is no partial
//! update and no locking against concurrent writers.

use async_trait::async_trait;

use crate::domain::foundation::UserId;
use crate::domain::planner::UserProfile;

/// Port for loading and saving user profiles.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Loads a user's profile; a user never seen before gets a default
    /// (empty) profile rather than an error.
    async fn load(&self, user: UserId) -> Result<UserProfile, StoreError>;

    /// Persists a user's profile, rewriting the whole document.
    async fn save(&self, user: UserId, profile: &UserProfile) -> Result<(), StoreError>;
}

/// Task-store errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("store I/O error: {0}")]
    Io(String),

    /// The document or a profile could not be (de)serialized.
    #[error("store serialization error: {0}")]
    Serialization(String),
}
