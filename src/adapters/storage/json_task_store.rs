//! JSON file task store.
//!
//! Persists every user's profile in a single flat JSON document keyed by
//! stringified user id. Every load reads the whole document and every
//! save rewrites it; there is no partial update and no locking against
//! concurrent writers, so durability ends at the last successful write.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::foundation::UserId;
use crate::domain::planner::UserProfile;
use crate::ports::{StoreError, TaskStore};

/// The on-disk document: stringified user id -> profile.
type Document = BTreeMap<String, UserProfile>;

/// File-backed task store.
#[derive(Debug, Clone)]
pub struct JsonTaskStore {
    path: PathBuf,
}

impl JsonTaskStore {
    /// Creates a store backed by the given file. The file is created on
    /// the first save.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    async fn read_document(&self) -> Result<Document, StoreError> {
        if !self.path.exists() {
            return Ok(Document::new());
        }

        let raw = fs::read_to_string(&self.path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        serde_json::from_str(&raw).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    async fn write_document(&self, document: &Document) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }

        let json = serde_json::to_string_pretty(document)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        fs::write(&self.path, json)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))
    }
}

#[async_trait]
impl TaskStore for JsonTaskStore {
    async fn load(&self, user: UserId) -> Result<UserProfile, StoreError> {
        let document = self.read_document().await?;
        Ok(document.get(&user.to_string()).cloned().unwrap_or_default())
    }

    async fn save(&self, user: UserId, profile: &UserProfile) -> Result<(), StoreError> {
        let mut document = self.read_document().await?;
        document.insert(user.to_string(), profile.clone());
        self.write_document(&document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chat::ChatMessage;
    use crate::domain::foundation::{TaskId, Timestamp};
    use crate::domain::planner::StudyTask;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> JsonTaskStore {
        JsonTaskStore::new(dir.path().join("study_data.json"))
    }

    fn full_profile() -> UserProfile {
        let mut profile = UserProfile::default();
        let id = profile.allocate_task_id();
        let mut task = StudyTask::homework(
            id,
            "math",
            "p.12-20",
            45,
            Timestamp::from_unix_secs(1_767_225_599),
            Timestamp::from_unix_secs(1_767_000_000),
        );
        task.actual_minutes = Some(52.5);
        profile.tasks.push(task);

        let review_id = profile.allocate_task_id();
        profile.tasks.push(StudyTask::review(
            review_id,
            "歷史",
            "ch. 1-3",
            2,
            30,
            Timestamp::from_unix_secs(1_767_311_999),
            Timestamp::from_unix_secs(1_767_000_100),
        ));

        profile.timers.insert(id, 1_767_000_500);
        profile.chat_history.push(ChatMessage::user("so tired"));
        profile
            .chat_history
            .push(ChatMessage::assistant("rest a little"));
        profile.personality_profile = "anxious, needs reassurance".to_string();
        profile
    }

    #[tokio::test]
    async fn unknown_user_loads_an_empty_profile() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let profile = store.load(UserId::new(1)).await.unwrap();
        assert_eq!(profile, UserProfile::default());
    }

    #[tokio::test]
    async fn save_and_load_preserves_every_field() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let user = UserId::new(123456789);

        let profile = full_profile();
        store.save(user, &profile).await.unwrap();

        let loaded = store.load(user).await.unwrap();
        assert_eq!(loaded, profile);
    }

    #[tokio::test]
    async fn users_are_isolated_within_the_document() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let first = full_profile();
        store.save(UserId::new(1), &first).await.unwrap();
        store
            .save(UserId::new(2), &UserProfile::default())
            .await
            .unwrap();

        // Saving user 2 rewrote the whole document without losing user 1.
        let reloaded = store.load(UserId::new(1)).await.unwrap();
        assert_eq!(reloaded, first);
    }

    #[tokio::test]
    async fn document_keys_are_stringified_user_ids() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let user = UserId::new(42);

        store.save(user, &UserProfile::default()).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("study_data.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.get("42").is_some());
    }

    #[tokio::test]
    async fn corrupt_document_is_a_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("study_data.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonTaskStore::new(&path);
        assert!(matches!(
            store.load(UserId::new(1)).await,
            Err(StoreError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn missing_parent_directories_are_created() {
        let dir = TempDir::new().unwrap();
        let store = JsonTaskStore::new(dir.path().join("nested/deeper/data.json"));

        store
            .save(UserId::new(1), &full_profile())
            .await
            .unwrap();
        assert!(dir.path().join("nested/deeper/data.json").exists());
    }

    // ----- Round-trip property -----

    fn arb_task() -> impl Strategy<Value = StudyTask> {
        (
            1u32..1000,
            "[a-zA-Z0-9 ]{1,20}",
            "[a-zA-Z0-9 .-]{1,20}",
            1u32..600,
            proptest::option::of(0.1f64..600.0),
            proptest::bool::ANY,
            1u8..=10,
            proptest::bool::ANY,
        )
            .prop_map(
                |(id, subject, payload, estimated, actual, completed, confidence, is_review)| {
                    let mut task = if is_review {
                        StudyTask::review(
                            TaskId::new(id),
                            subject,
                            payload,
                            confidence,
                            estimated,
                            Timestamp::from_unix_secs(1_767_225_599),
                            Timestamp::from_unix_secs(1_767_000_000),
                        )
                    } else {
                        StudyTask::homework(
                            TaskId::new(id),
                            subject,
                            payload,
                            estimated,
                            Timestamp::from_unix_secs(1_767_225_599),
                            Timestamp::from_unix_secs(1_767_000_000),
                        )
                    };
                    task.actual_minutes = actual;
                    task.completed = completed;
                    if completed {
                        task.completed_at =
                            Some(Timestamp::from_unix_secs(1_767_100_000));
                    }
                    task
                },
            )
    }

    proptest! {
        #[test]
        fn any_task_survives_a_save_load_cycle(tasks in proptest::collection::vec(arb_task(), 0..8)) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async {
                let dir = TempDir::new().unwrap();
                let store = store_in(&dir);
                let user = UserId::new(7);

                let profile = UserProfile { tasks, ..Default::default() };
                store.save(user, &profile).await.unwrap();
                let loaded = store.load(user).await.unwrap();
                prop_assert_eq!(loaded, profile);
                Ok(())
            })?;
        }
    }
}
