//! Study task records.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{TaskId, Timestamp};

/// Day offsets used when a review is scheduled with spaced repetition:
/// first study today, then reviews after 1, 3, 7, 14 and 30 days.
pub const SPACED_REPETITION_OFFSETS: [i64; 6] = [0, 1, 3, 7, 14, 30];

/// Confidence at or below this value earns a "review this first" advisory.
pub const LOW_CONFIDENCE_MAX: u8 = 3;

/// What kind of work a task is, with its kind-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskKind {
    /// Homework with a page range, e.g. "p.1-10".
    Homework { pages: String },
    /// Review of a named range with a self-assessed confidence of 1-10.
    Review { range: String, confidence: u8 },
}

impl TaskKind {
    /// Short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            TaskKind::Homework { .. } => "homework",
            TaskKind::Review { .. } => "review",
        }
    }
}

/// One study task inside a user's profile.
///
/// Every field survives a save/load cycle of the task store unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyTask {
    /// Identifier unique within the owning profile.
    pub id: TaskId,
    /// Homework or review, with the kind-specific fields.
    #[serde(flatten)]
    pub kind: TaskKind,
    /// Subject name, free-form (e.g. "math", "歷史").
    pub subject: String,
    /// Estimated effort in minutes.
    pub estimated_minutes: u32,
    /// Measured effort in minutes, recorded when a timer is stopped.
    pub actual_minutes: Option<f64>,
    /// When the task is due.
    pub deadline: Timestamp,
    /// Whether the task has been marked done.
    pub completed: bool,
    /// When the task was marked done.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    /// When the task was created.
    pub created_at: Timestamp,
}

impl StudyTask {
    /// Creates a homework task.
    pub fn homework(
        id: TaskId,
        subject: impl Into<String>,
        pages: impl Into<String>,
        estimated_minutes: u32,
        deadline: Timestamp,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            kind: TaskKind::Homework {
                pages: pages.into(),
            },
            subject: subject.into(),
            estimated_minutes,
            actual_minutes: None,
            deadline,
            completed: false,
            completed_at: None,
            created_at,
        }
    }

    /// Creates a review task.
    pub fn review(
        id: TaskId,
        subject: impl Into<String>,
        range: impl Into<String>,
        confidence: u8,
        estimated_minutes: u32,
        deadline: Timestamp,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            kind: TaskKind::Review {
                range: range.into(),
                confidence,
            },
            subject: subject.into(),
            estimated_minutes,
            actual_minutes: None,
            deadline,
            completed: false,
            completed_at: None,
            created_at,
        }
    }

    /// Self-assessed confidence, for review tasks.
    pub fn confidence(&self) -> Option<u8> {
        match &self.kind {
            TaskKind::Review { confidence, .. } => Some(*confidence),
            TaskKind::Homework { .. } => None,
        }
    }

    /// Whether this is a review the user flagged as shaky (confidence <= 3).
    pub fn is_low_confidence(&self) -> bool {
        self.confidence()
            .is_some_and(|c| c <= LOW_CONFIDENCE_MAX)
    }

    /// Effort ratio in percent: over 100 means faster than estimated.
    ///
    /// `None` until an actual time has been recorded.
    pub fn efficiency_percent(&self) -> Option<f64> {
        let actual = self.actual_minutes?;
        if actual <= 0.0 {
            return None;
        }
        Some(self.estimated_minutes as f64 / actual * 100.0)
    }
}

/// Formats a second count as a compact human duration.
pub fn format_duration(total_secs: i64) -> String {
    let total_secs = total_secs.max(0);
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{} hr {} min", hours, minutes)
    } else if minutes > 0 {
        format!("{} min {} sec", minutes, secs)
    } else {
        format!("{} sec", secs)
    }
}
