//! Study-planner domain: tasks, per-user profiles, calendar rendering.

pub mod calendar;
mod profile;
mod task;

pub use profile::UserProfile;
pub use task::{
    format_duration, StudyTask, TaskKind, LOW_CONFIDENCE_MAX, SPACED_REPETITION_OFFSETS,
};
