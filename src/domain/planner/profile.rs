//! Per-user profile: tasks, running timers, chat history, personality.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::chat::ChatMessage;
use crate::domain::foundation::TaskId;
use crate::domain::planner::StudyTask;

/// Everything the bot knows about one user, stored as one entry of the
/// flat JSON task-store document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Study tasks, in creation order.
    #[serde(default)]
    pub tasks: Vec<StudyTask>,

    /// Running task timers: task id -> start time in Unix seconds.
    #[serde(default)]
    pub timers: HashMap<TaskId, i64>,

    /// Companion-chat history, oldest first.
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,

    /// LLM-produced personality sketch, empty until enough chat happened.
    #[serde(default)]
    pub personality_profile: String,

    /// Monotonic task-id counter. Never reset by deletions, so ids are
    /// unique for the lifetime of the profile. Zero means "not yet
    /// initialized" (profiles written before the counter existed) and is
    /// recovered from the highest task id on first allocation.
    #[serde(default)]
    pub next_task_id: u32,
}

impl UserProfile {
    /// Allocates the next task id and advances the counter.
    pub fn allocate_task_id(&mut self) -> TaskId {
        if self.next_task_id == 0 {
            self.next_task_id = self
                .tasks
                .iter()
                .map(|t| t.id.get())
                .max()
                .unwrap_or(0)
                + 1;
        }
        let id = TaskId::new(self.next_task_id);
        self.next_task_id += 1;
        id
    }

    /// Looks up a task by id.
    pub fn task(&self, id: TaskId) -> Option<&StudyTask> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Looks up a task by id, mutably.
    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut StudyTask> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Removes a task by id, returning it if present.
    ///
    /// Any running timer for the task is discarded with it.
    pub fn remove_task(&mut self, id: TaskId) -> Option<StudyTask> {
        let pos = self.tasks.iter().position(|t| t.id == id)?;
        self.timers.remove(&id);
        Some(self.tasks.remove(pos))
    }

    /// Tasks not yet completed, in creation order.
    pub fn pending(&self) -> impl Iterator<Item = &StudyTask> {
        self.tasks.iter().filter(|t| !t.completed)
    }

    /// Completed tasks, in creation order.
    pub fn completed(&self) -> impl Iterator<Item = &StudyTask> {
        self.tasks.iter().filter(|t| t.completed)
    }

    /// Sum of estimated minutes across all tasks.
    pub fn total_estimated_minutes(&self) -> u64 {
        self.tasks.iter().map(|t| t.estimated_minutes as u64).sum()
    }

    /// Number of completed chat exchanges (user + assistant pairs).
    pub fn chat_exchanges(&self) -> usize {
        self.chat_history.len() / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;

    fn task(id: u32) -> StudyTask {
        StudyTask::homework(
            TaskId::new(id),
            "math",
            "p.1-10",
            30,
            Timestamp::now(),
            Timestamp::now(),
        )
    }

    #[test]
    fn allocates_sequential_ids() {
        let mut profile = UserProfile::default();
        assert_eq!(profile.allocate_task_id(), TaskId::new(1));
        assert_eq!(profile.allocate_task_id(), TaskId::new(2));
    }

    #[test]
    fn deleting_a_task_never_recycles_its_id() {
        // Regression for the legacy "count + 1" scheme, which handed out
        // duplicate ids after a deletion.
        let mut profile = UserProfile::default();
        let first = profile.allocate_task_id();
        profile.tasks.push(task(first.get()));

        profile.remove_task(first);
        let second = profile.allocate_task_id();

        assert_ne!(first, second);
        assert_eq!(second, TaskId::new(2));
    }

    #[test]
    fn counter_recovers_from_legacy_profiles() {
        // A profile saved before the counter existed deserializes with
        // next_task_id == 0; the first allocation must not collide.
        let mut profile = UserProfile {
            tasks: vec![task(1), task(2), task(5)],
            next_task_id: 0,
            ..Default::default()
        };
        assert_eq!(profile.allocate_task_id(), TaskId::new(6));
    }

    #[test]
    fn remove_task_discards_its_timer() {
        let mut profile = UserProfile::default();
        profile.tasks.push(task(1));
        profile.timers.insert(TaskId::new(1), 1_700_000_000);

        assert!(profile.remove_task(TaskId::new(1)).is_some());
        assert!(profile.timers.is_empty());
    }

    #[test]
    fn remove_missing_task_returns_none() {
        let mut profile = UserProfile::default();
        assert!(profile.remove_task(TaskId::new(42)).is_none());
    }

    #[test]
    fn pending_and_completed_partition_tasks() {
        let mut profile = UserProfile::default();
        profile.tasks.push(task(1));
        let mut done = task(2);
        done.completed = true;
        profile.tasks.push(done);

        assert_eq!(profile.pending().count(), 1);
        assert_eq!(profile.completed().count(), 1);
    }

    #[test]
    fn profile_roundtrips_through_json() {
        let mut profile = UserProfile::default();
        let id = profile.allocate_task_id();
        profile.tasks.push(task(id.get()));
        profile.timers.insert(id, 1_700_000_000);
        profile.personality_profile = "calm, methodical".to_string();

        let json = serde_json::to_string(&profile).unwrap();
        let back: UserProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
    }
}
