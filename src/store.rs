//! Data access the progress engine needs, bound to one unit of work.

use rusqlite::Connection;

use crate::db::{self, GoalRecord, MilestoneRecord, TaskRecord};
use crate::domain::fields::now_utc_rfc3339;
use crate::domain::rollup::ChecklistTally;
use crate::domain::status::{GoalStatus, MilestoneStatus, TaskStatus};

/// Reads observe every write made earlier through the same store.
pub trait HierarchyStore {
    type Error;

    fn count_checklist_items(&self, task_id: &str) -> Result<ChecklistTally, Self::Error>;
    fn load_task(&self, task_id: &str) -> Result<Option<TaskRecord>, Self::Error>;
    fn load_tasks_by_milestone(&self, milestone_id: &str) -> Result<Vec<TaskRecord>, Self::Error>;
    fn load_milestone(&self, milestone_id: &str) -> Result<Option<MilestoneRecord>, Self::Error>;
    fn load_milestones_by_goal(&self, goal_id: &str) -> Result<Vec<MilestoneRecord>, Self::Error>;
    fn load_goal(&self, goal_id: &str) -> Result<Option<GoalRecord>, Self::Error>;

    fn save_task_rollup(
        &self,
        task_id: &str,
        progress: f64,
        status: TaskStatus,
    ) -> Result<(), Self::Error>;
    fn save_milestone_rollup(
        &self,
        milestone_id: &str,
        progress: f64,
        status: MilestoneStatus,
    ) -> Result<(), Self::Error>;
    fn save_goal_rollup(
        &self,
        goal_id: &str,
        progress: f64,
        status: GoalStatus,
    ) -> Result<(), Self::Error>;
}

/// SQLite-backed store. Hand it the open transaction (it derefs to a
/// connection) so the whole cascade commits or rolls back together.
pub struct SqliteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl HierarchyStore for SqliteStore<'_> {
    type Error = rusqlite::Error;

    fn count_checklist_items(&self, task_id: &str) -> Result<ChecklistTally, Self::Error> {
        db::count_checklist_items(self.conn, task_id)
    }

    fn load_task(&self, task_id: &str) -> Result<Option<TaskRecord>, Self::Error> {
        db::get_task(self.conn, task_id)
    }

    fn load_tasks_by_milestone(&self, milestone_id: &str) -> Result<Vec<TaskRecord>, Self::Error> {
        db::list_tasks_by_milestone(self.conn, milestone_id)
    }

    fn load_milestone(&self, milestone_id: &str) -> Result<Option<MilestoneRecord>, Self::Error> {
        db::get_milestone(self.conn, milestone_id)
    }

    fn load_milestones_by_goal(&self, goal_id: &str) -> Result<Vec<MilestoneRecord>, Self::Error> {
        db::list_milestones_by_goal(self.conn, goal_id)
    }

    fn load_goal(&self, goal_id: &str) -> Result<Option<GoalRecord>, Self::Error> {
        db::get_goal(self.conn, goal_id)
    }

    fn save_task_rollup(
        &self,
        task_id: &str,
        progress: f64,
        status: TaskStatus,
    ) -> Result<(), Self::Error> {
        db::set_task_rollup(self.conn, task_id, progress, status, &now_utc_rfc3339())?;
        Ok(())
    }

    fn save_milestone_rollup(
        &self,
        milestone_id: &str,
        progress: f64,
        status: MilestoneStatus,
    ) -> Result<(), Self::Error> {
        db::set_milestone_rollup(self.conn, milestone_id, progress, status, &now_utc_rfc3339())?;
        Ok(())
    }

    fn save_goal_rollup(
        &self,
        goal_id: &str,
        progress: f64,
        status: GoalStatus,
    ) -> Result<(), Self::Error> {
        db::set_goal_rollup(self.conn, goal_id, progress, status, &now_utc_rfc3339())?;
        Ok(())
    }
}
