//! Planner service - study-task CRUD, timers, and calendar views.
//!
//! Every operation loads the user's whole profile, mutates it, and saves
//! it back (the store is a flat document; see the task-store port).

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::foundation::{TaskId, Timestamp, UserId};
use crate::domain::planner::{
    calendar, StudyTask, TaskKind, LOW_CONFIDENCE_MAX, SPACED_REPETITION_OFFSETS,
};
use crate::ports::{StoreError, TaskStore};

/// Planner failures. User-input variants are reported back inline by the
/// command surface; only `Store` is logged as a failure.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid month {month} of {year}")]
    InvalidMonth { year: i32, month: u32 },

    #[error("confidence must be 1-10, got {0}")]
    InvalidConfidence(u8),

    #[error("no task {0}")]
    UnknownTask(TaskId),

    #[error("task {0} is already completed")]
    TaskCompleted(TaskId),

    #[error("task {0} is already being timed")]
    TimerAlreadyRunning(TaskId),

    #[error("task {0} is not being timed")]
    TimerNotRunning(TaskId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of adding a homework task.
#[derive(Debug, Clone)]
pub struct HomeworkAdded {
    pub task: StudyTask,
    /// Whole days until the deadline; negative when already past.
    pub days_left: i64,
}

/// Result of adding one or more review tasks.
#[derive(Debug, Clone)]
pub struct ReviewAdded {
    /// One task, or six when spaced repetition was requested.
    pub tasks: Vec<StudyTask>,
    /// Advisory flag: the user rated their confidence at 3 or below.
    pub low_confidence: bool,
}

/// Result of completing a task.
#[derive(Debug, Clone)]
pub struct CompletionReport {
    pub task: StudyTask,
    /// The task had already been completed; nothing changed.
    pub already_completed: bool,
    /// Estimate-vs-actual ratio in percent, when an actual time exists.
    pub efficiency_percent: Option<f64>,
}

/// Result of starting a task timer.
#[derive(Debug, Clone)]
pub struct TimerStarted {
    pub task: StudyTask,
    pub started_at: Timestamp,
}

/// Result of stopping a task timer.
#[derive(Debug, Clone)]
pub struct TimerReport {
    /// The task with its freshly recorded actual time.
    pub task: StudyTask,
    pub elapsed_secs: i64,
    /// Minutes over (+) or under (-) the estimate.
    pub diff_minutes: f64,
}

/// All of a user's tasks, partitioned.
#[derive(Debug, Clone)]
pub struct TaskOverview {
    pub pending: Vec<StudyTask>,
    pub completed: Vec<StudyTask>,
    pub total_estimated_minutes: u64,
}

/// One day's agenda.
#[derive(Debug, Clone)]
pub struct DayAgenda {
    pub date: NaiveDate,
    pub homework: Vec<StudyTask>,
    pub review: Vec<StudyTask>,
    pub total_estimated_minutes: u64,
    pub completed_count: usize,
}

impl DayAgenda {
    /// Total number of tasks due on the day.
    pub fn task_count(&self) -> usize {
        self.homework.len() + self.review.len()
    }
}

/// Per-day tally for the month view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayTally {
    pub total: usize,
    pub completed: usize,
}

/// A rendered month with its task statistics.
#[derive(Debug, Clone)]
pub struct MonthOverview {
    pub year: i32,
    pub month: u32,
    /// Monday-first calendar text, deadline days marked with `*`.
    pub grid: String,
    /// Day of month -> tally, only for days that have tasks.
    pub days: BTreeMap<u32, DayTally>,
    pub total_tasks: usize,
}

/// Study-planner service.
pub struct PlannerService {
    store: Arc<dyn TaskStore>,
}

impl PlannerService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Adds a homework task due on `date` (YYYY-MM-DD, midnight UTC).
    pub async fn add_homework(
        &self,
        user: UserId,
        date: &str,
        subject: &str,
        pages: &str,
        estimated_minutes: u32,
    ) -> Result<HomeworkAdded, PlannerError> {
        let deadline_date = parse_date(date)?;
        let deadline = Timestamp::from_datetime(
            deadline_date
                .and_hms_opt(0, 0, 0)
                .unwrap_or_default()
                .and_utc(),
        );

        let mut profile = self.store.load(user).await?;
        let now = Timestamp::now();
        let task = StudyTask::homework(
            profile.allocate_task_id(),
            subject,
            pages,
            estimated_minutes,
            deadline,
            now,
        );
        profile.tasks.push(task.clone());
        self.store.save(user, &profile).await?;

        let days_left = deadline.duration_since(&now).num_days();
        Ok(HomeworkAdded { task, days_left })
    }

    /// Adds a review task, optionally fanned out over the spaced-repetition
    /// offsets (0, 1, 3, 7, 14, 30 days). Deadlines fall at 23:59:59 of
    /// the target day.
    pub async fn add_review(
        &self,
        user: UserId,
        subject: &str,
        range: &str,
        confidence: u8,
        estimated_minutes: u32,
        spaced_repetition: bool,
    ) -> Result<ReviewAdded, PlannerError> {
        if !(1..=10).contains(&confidence) {
            return Err(PlannerError::InvalidConfidence(confidence));
        }

        let mut profile = self.store.load(user).await?;
        let now = Timestamp::now();
        let offsets: &[i64] = if spaced_repetition {
            &SPACED_REPETITION_OFFSETS
        } else {
            &SPACED_REPETITION_OFFSETS[..1]
        };

        let mut tasks = Vec::with_capacity(offsets.len());
        for (round, days) in offsets.iter().enumerate() {
            let display_range = if spaced_repetition {
                if *days == 0 {
                    format!("{} (first pass)", range)
                } else {
                    format!("{} (review {}, +{}d)", range, round, days)
                }
            } else {
                range.to_string()
            };

            let deadline = Timestamp::end_of_day(now.add_days(*days).date());
            let task = StudyTask::review(
                profile.allocate_task_id(),
                subject,
                display_range,
                confidence,
                estimated_minutes,
                deadline,
                now,
            );
            profile.tasks.push(task.clone());
            tasks.push(task);
        }

        self.store.save(user, &profile).await?;

        Ok(ReviewAdded {
            tasks,
            low_confidence: confidence <= LOW_CONFIDENCE_MAX,
        })
    }

    /// Deletes a task, returning it.
    pub async fn delete_task(&self, user: UserId, id: TaskId) -> Result<StudyTask, PlannerError> {
        let mut profile = self.store.load(user).await?;
        let task = profile
            .remove_task(id)
            .ok_or(PlannerError::UnknownTask(id))?;
        self.store.save(user, &profile).await?;
        Ok(task)
    }

    /// Marks a task completed. Completing twice reports, not errors.
    pub async fn complete_task(
        &self,
        user: UserId,
        id: TaskId,
    ) -> Result<CompletionReport, PlannerError> {
        let mut profile = self.store.load(user).await?;
        let task = profile.task_mut(id).ok_or(PlannerError::UnknownTask(id))?;

        if task.completed {
            let task = task.clone();
            let efficiency_percent = task.efficiency_percent();
            return Ok(CompletionReport {
                task,
                already_completed: true,
                efficiency_percent,
            });
        }

        task.completed = true;
        task.completed_at = Some(Timestamp::now());
        let snapshot = task.clone();
        self.store.save(user, &profile).await?;

        let efficiency_percent = snapshot.efficiency_percent();
        Ok(CompletionReport {
            task: snapshot,
            already_completed: false,
            efficiency_percent,
        })
    }

    /// Starts timing a task.
    pub async fn start_timer(&self, user: UserId, id: TaskId) -> Result<TimerStarted, PlannerError> {
        let mut profile = self.store.load(user).await?;
        let task = profile.task(id).ok_or(PlannerError::UnknownTask(id))?;

        if task.completed {
            return Err(PlannerError::TaskCompleted(id));
        }
        if profile.timers.contains_key(&id) {
            return Err(PlannerError::TimerAlreadyRunning(id));
        }

        let task = task.clone();
        let started_at = Timestamp::now();
        profile.timers.insert(id, started_at.as_unix_secs());
        self.store.save(user, &profile).await?;

        Ok(TimerStarted { task, started_at })
    }

    /// Stops timing a task and records the elapsed minutes on it.
    pub async fn stop_timer(&self, user: UserId, id: TaskId) -> Result<TimerReport, PlannerError> {
        let mut profile = self.store.load(user).await?;
        if profile.task(id).is_none() {
            return Err(PlannerError::UnknownTask(id));
        }
        let started = profile
            .timers
            .remove(&id)
            .ok_or(PlannerError::TimerNotRunning(id))?;

        let elapsed_secs = (Timestamp::now().as_unix_secs() - started).max(0);
        let elapsed_minutes = elapsed_secs as f64 / 60.0;
        // One decimal, like the rest of the minute displays.
        let rounded = (elapsed_minutes * 10.0).round() / 10.0;

        let task = profile
            .task_mut(id)
            .ok_or(PlannerError::UnknownTask(id))?;
        task.actual_minutes = Some(rounded);
        let snapshot = task.clone();
        let diff_minutes = rounded - snapshot.estimated_minutes as f64;
        self.store.save(user, &profile).await?;

        Ok(TimerReport {
            task: snapshot,
            elapsed_secs,
            diff_minutes,
        })
    }

    /// All tasks, partitioned into pending and completed.
    pub async fn overview(&self, user: UserId) -> Result<TaskOverview, PlannerError> {
        let profile = self.store.load(user).await?;
        Ok(TaskOverview {
            pending: profile.pending().cloned().collect(),
            completed: profile.completed().cloned().collect(),
            total_estimated_minutes: profile.total_estimated_minutes(),
        })
    }

    /// The agenda for one day (YYYY-MM-DD).
    pub async fn agenda(&self, user: UserId, date: &str) -> Result<DayAgenda, PlannerError> {
        let date = parse_date(date)?;
        let profile = self.store.load(user).await?;

        let mut homework = Vec::new();
        let mut review = Vec::new();
        let mut total_estimated_minutes = 0u64;
        let mut completed_count = 0usize;

        for task in &profile.tasks {
            if task.deadline.date() != date {
                continue;
            }
            total_estimated_minutes += task.estimated_minutes as u64;
            if task.completed {
                completed_count += 1;
            }
            match task.kind {
                TaskKind::Homework { .. } => homework.push(task.clone()),
                TaskKind::Review { .. } => review.push(task.clone()),
            }
        }

        Ok(DayAgenda {
            date,
            homework,
            review,
            total_estimated_minutes,
            completed_count,
        })
    }

    /// The month view: rendered grid plus per-day tallies.
    pub async fn month_overview(
        &self,
        user: UserId,
        year: i32,
        month: u32,
    ) -> Result<MonthOverview, PlannerError> {
        let profile = self.store.load(user).await?;
        let mut days: BTreeMap<u32, DayTally> = BTreeMap::new();

        for task in &profile.tasks {
            let date = task.deadline.date();
            if chrono::Datelike::year(&date) != year || chrono::Datelike::month(&date) != month {
                continue;
            }
            let tally = days
                .entry(chrono::Datelike::day(&date))
                .or_insert(DayTally {
                    total: 0,
                    completed: 0,
                });
            tally.total += 1;
            if task.completed {
                tally.completed += 1;
            }
        }

        let marked = days.keys().copied().collect();
        let grid = calendar::render_month(year, month, &marked)
            .ok_or(PlannerError::InvalidMonth { year, month })?;
        let total_tasks = days.values().map(|d| d.total).sum();

        Ok(MonthOverview {
            year,
            month,
            grid,
            days,
            total_tasks,
        })
    }
}

fn parse_date(date: &str) -> Result<NaiveDate, PlannerError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| PlannerError::InvalidDate(date.to_string()))
}
