//! Progress propagation across the goal hierarchy.
//!
//! Each routine reads the level below, writes exactly one level and then
//! hands off to the routine for the parent: task -> milestone -> goal. The
//! chain is fixed at three levels and runs entirely inside the caller's
//! unit of work, so a failed write anywhere leaves nothing behind once the
//! caller rolls back.
//!
//! A target that has disappeared (a cascade racing a cascading delete) is
//! skipped silently. Store failures propagate unchanged and are never
//! retried here.

use tracing::debug;

use crate::config::{ArchivedGoalPolicy, EngineSettings};
use crate::domain::rollup::{
    checklist_progress, goal_status_after, mean_progress, milestone_status_after,
    task_status_after_checklist, task_weight, weighted_progress, MIN_PROGRESS,
};
use crate::domain::status::{GoalStatus, MilestoneStatus, TaskStatus};
use crate::store::HierarchyStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressEngine {
    archived_goals: ArchivedGoalPolicy,
}

impl ProgressEngine {
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            archived_goals: settings.archived_goals,
        }
    }

    /// Recomputes a task from its checklist. A task without checklist items
    /// keeps its manual progress and nothing above it is touched.
    pub fn recompute_task_progress<S: HierarchyStore>(
        &self,
        store: &S,
        task_id: &str,
    ) -> Result<(), S::Error> {
        let tally = store.count_checklist_items(task_id)?;
        if tally.is_empty() {
            debug!(task_id, "no checklist items; keeping manual task progress");
            return Ok(());
        }

        let Some(task) = store.load_task(task_id)? else {
            debug!(task_id, "task vanished before rollup; skipping");
            return Ok(());
        };

        let progress = checklist_progress(tally);
        let status = task_status_after_checklist(task.status, tally);
        store.save_task_rollup(task_id, progress, status)?;
        debug!(
            task_id,
            progress,
            status = %status,
            completed = tally.completed,
            total = tally.total,
            "task rollup saved"
        );

        self.recompute_milestone_progress(store, &task.milestone_id)
    }

    /// Weighted mean of task progress, weighted by estimated minutes.
    pub fn recompute_milestone_progress<S: HierarchyStore>(
        &self,
        store: &S,
        milestone_id: &str,
    ) -> Result<(), S::Error> {
        let tasks = store.load_tasks_by_milestone(milestone_id)?;
        let Some(milestone) = store.load_milestone(milestone_id)? else {
            debug!(milestone_id, "milestone vanished before rollup; skipping");
            return Ok(());
        };

        if tasks.is_empty() {
            // Never auto-completed, but still cascades so the goal sees the zero.
            store.save_milestone_rollup(milestone_id, MIN_PROGRESS, milestone.status)?;
            debug!(milestone_id, "empty milestone reset to zero progress");
            return self.recompute_goal_progress(store, &milestone.goal_id);
        }

        let progress = weighted_progress(
            tasks
                .iter()
                .map(|task| (task.progress, task_weight(task.estimated_time))),
        );
        let all_done = tasks
            .iter()
            .all(|task| task.status == TaskStatus::Completed);
        let status = milestone_status_after(milestone.status, all_done);
        store.save_milestone_rollup(milestone_id, progress, status)?;
        debug!(
            milestone_id,
            progress,
            status = %status,
            tasks = tasks.len(),
            "milestone rollup saved"
        );

        self.recompute_goal_progress(store, &milestone.goal_id)
    }

    /// Unweighted mean of milestone progress. Top of the hierarchy.
    pub fn recompute_goal_progress<S: HierarchyStore>(
        &self,
        store: &S,
        goal_id: &str,
    ) -> Result<(), S::Error> {
        let milestones = store.load_milestones_by_goal(goal_id)?;
        let Some(goal) = store.load_goal(goal_id)? else {
            debug!(goal_id, "goal vanished before rollup; skipping");
            return Ok(());
        };

        if goal.status == GoalStatus::Archived && self.archived_goals == ArchivedGoalPolicy::Freeze
        {
            debug!(goal_id, "goal is archived and frozen; skipping");
            return Ok(());
        }

        if milestones.is_empty() {
            store.save_goal_rollup(goal_id, MIN_PROGRESS, goal.status)?;
            debug!(goal_id, "goal without milestones reset to zero progress");
            return Ok(());
        }

        let progress = mean_progress(milestones.iter().map(|milestone| milestone.progress));
        let all_done = milestones
            .iter()
            .all(|milestone| milestone.status == MilestoneStatus::Completed);
        let status = goal_status_after(goal.status, all_done);
        store.save_goal_rollup(goal_id, progress, status)?;
        debug!(
            goal_id,
            progress,
            status = %status,
            milestones = milestones.len(),
            "goal rollup saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests;
