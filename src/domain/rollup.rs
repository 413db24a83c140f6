//! Pure aggregation rules shared by the progress engine.
//!
//! Nothing here touches storage; the engine feeds in what it loaded and
//! persists what comes back.

use super::status::{GoalStatus, MilestoneStatus, TaskStatus};

pub const MIN_PROGRESS: f64 = 0.0;
pub const MAX_PROGRESS: f64 = 100.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChecklistTally {
    pub total: u64,
    pub completed: u64,
}

impl ChecklistTally {
    pub fn new(total: u64, completed: u64) -> Self {
        Self { total, completed }
    }

    pub fn is_empty(self) -> bool {
        self.total == 0
    }

    pub fn is_done(self) -> bool {
        self.total > 0 && self.completed >= self.total
    }
}

/// Clamps into `[0, 100]`. NaN collapses to 0.
pub fn clamp_progress(value: f64) -> f64 {
    if value.is_nan() {
        return MIN_PROGRESS;
    }
    value.clamp(MIN_PROGRESS, MAX_PROGRESS)
}

pub fn checklist_progress(tally: ChecklistTally) -> f64 {
    if tally.is_empty() {
        return MIN_PROGRESS;
    }
    clamp_progress(tally.completed as f64 * 100.0 / tally.total as f64)
}

/// Estimated minutes act as the weight; missing, zero and negative
/// estimates all count as 1.
pub fn task_weight(estimated_time: Option<i64>) -> f64 {
    match estimated_time {
        Some(minutes) if minutes > 0 => minutes as f64,
        _ => 1.0,
    }
}

pub fn weighted_progress<I>(entries: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let (weighted_sum, total_weight) = entries
        .into_iter()
        .fold((0.0, 0.0), |(sum, weight_sum), (progress, weight)| {
            (sum + progress * weight, weight_sum + weight)
        });
    if total_weight > 0.0 {
        clamp_progress(weighted_sum / total_weight)
    } else {
        MIN_PROGRESS
    }
}

pub fn mean_progress<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    weighted_progress(values.into_iter().map(|progress| (progress, 1.0)))
}

pub fn task_status_after_checklist(current: TaskStatus, tally: ChecklistTally) -> TaskStatus {
    if tally.is_done() {
        TaskStatus::Completed
    } else if current == TaskStatus::Completed {
        TaskStatus::InProgress
    } else {
        current
    }
}

pub fn milestone_status_after(current: MilestoneStatus, all_tasks_done: bool) -> MilestoneStatus {
    if all_tasks_done {
        MilestoneStatus::Completed
    } else if current == MilestoneStatus::Completed {
        MilestoneStatus::Active
    } else {
        current
    }
}

pub fn goal_status_after(current: GoalStatus, all_milestones_done: bool) -> GoalStatus {
    if all_milestones_done {
        GoalStatus::Completed
    } else if current == GoalStatus::Completed {
        GoalStatus::Active
    } else {
        current
    }
}
