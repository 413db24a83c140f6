use std::str::FromStr;

use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, Settings};
use crate::db::{
    self, CategoryRecord, ChecklistItemRecord, DashboardCounts, GoalQuery, GoalRecord,
    MilestoneRecord, TaskNoteRecord, TaskRecord,
};
use crate::domain::fields::{new_id, non_empty, normalize_datetime, now_utc_rfc3339, IdKind};
use crate::domain::status::{
    GoalStatus, MilestoneStatus, ParseStatusError, Priority, TaskStatus,
};
use crate::engine::ProgressEngine;
use crate::guard::{require_category, require_owner, EntityKind, EntityRef};
use crate::store::SqliteStore;

pub const MAX_LIST_LIMIT: u32 = 100;

pub struct App {
    conn: Connection,
    engine: ProgressEngine,
    user_id: String,
}

/// One open transaction plus everything a handler needs inside it.
struct UnitOfWork<'a> {
    conn: &'a Connection,
    engine: &'a ProgressEngine,
    user_id: &'a str,
}

impl<'a> UnitOfWork<'a> {
    fn store(&self) -> SqliteStore<'a> {
        SqliteStore::new(self.conn)
    }

    fn require(&self, entity: EntityRef<'_>) -> Result<GoalRecord, AppError> {
        require_owner(self.conn, self.user_id, entity)
    }

    fn require_category(&self, id: &str) -> Result<CategoryRecord, AppError> {
        require_category(self.conn, self.user_id, id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GoalDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub category_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// `Some("")` clears an optional text or date field.
#[derive(Debug, Clone, Default)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub category_id: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MilestoneDraft {
    pub title: String,
    pub order_index: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MilestonePatch {
    pub title: Option<String>,
    pub order_index: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub estimated_time: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub estimated_time: Option<i64>,
    pub clear_estimate: bool,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ChecklistDraft {
    pub title: String,
    pub order_index: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct ChecklistPatch {
    pub title: Option<String>,
    pub order_index: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryDraft {
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// `Some("")` clears color or icon.
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeTarget<'a> {
    Goal(&'a str),
    Milestone(&'a str),
    Task(&'a str),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalTree {
    #[serde(flatten)]
    pub goal: GoalRecord,
    pub milestones: Vec<MilestoneTree>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MilestoneTree {
    #[serde(flatten)]
    pub milestone: MilestoneRecord,
    pub tasks: Vec<TaskTree>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskTree {
    #[serde(flatten)]
    pub task: TaskRecord,
    pub checklist: Vec<ChecklistItemRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgressBar {
    pub id: String,
    pub title: String,
    pub progress: f64,
    pub status: GoalStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub overview: DashboardCounts,
    pub goals: Vec<GoalProgressBar>,
}

impl GoalPatch {
    fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.priority.is_some()
            || self.category_id.is_some()
            || self.status.is_some()
            || self.start_date.is_some()
            || self.end_date.is_some()
    }
}

impl MilestonePatch {
    fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.order_index.is_some()
            || self.start_date.is_some()
            || self.end_date.is_some()
    }
}

impl TaskPatch {
    fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.due_date.is_some()
            || self.estimated_time.is_some()
            || self.clear_estimate
            || self.status.is_some()
    }
}

impl ChecklistPatch {
    fn has_changes(&self) -> bool {
        self.title.is_some() || self.order_index.is_some()
    }
}

impl CategoryPatch {
    fn has_changes(&self) -> bool {
        self.name.is_some() || self.color.is_some() || self.icon.is_some()
    }
}

impl App {
    pub fn open(db_path: &str, user_id: &str, settings: &Settings) -> Result<Self, AppError> {
        ensure_parent_dir(db_path)?;
        let user_id = non_empty(user_id)
            .ok_or_else(|| AppError::InvalidArgument("user cannot be empty".to_string()))?;
        let conn = db::open_connection(db_path)?;
        let schema_version = db::get_meta(&conn, "schema_version")?;
        tracing::debug!(db_path, schema_version = ?schema_version, "store ready");
        Ok(Self {
            conn,
            engine: ProgressEngine::new(&settings.engine),
            user_id,
        })
    }

    /// Runs `op` inside `BEGIN IMMEDIATE`: the write lock is taken before the
    /// first read, so concurrent cascades serialize on every shared ancestor.
    /// Any error drops the transaction and rolls everything back.
    fn write<T, F>(&mut self, op: F) -> Result<T, AppError>
    where
        F: FnOnce(&UnitOfWork<'_>) -> Result<T, AppError>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = op(&UnitOfWork {
            conn: &tx,
            engine: &self.engine,
            user_id: &self.user_id,
        })?;
        tx.commit()?;
        Ok(value)
    }

    fn require(&self, entity: EntityRef<'_>) -> Result<GoalRecord, AppError> {
        require_owner(&self.conn, &self.user_id, entity)
    }

    // goals

    pub fn create_goal(&mut self, draft: GoalDraft) -> Result<GoalRecord, AppError> {
        let now = now_utc_rfc3339();
        let goal = GoalRecord {
            id: new_id(IdKind::Goal),
            user_id: self.user_id.clone(),
            title: required_text("title", &draft.title)?,
            description: draft.description.as_deref().and_then(non_empty),
            priority: parse_or_default::<Priority>(draft.priority.as_deref())?,
            category_id: draft.category_id.as_deref().and_then(non_empty),
            start_date: optional_date("start date", draft.start_date.as_deref())?,
            end_date: optional_date("end date", draft.end_date.as_deref())?,
            status: GoalStatus::Active,
            progress: 0.0,
            created_at: now.clone(),
            updated_at: now,
        };
        self.write(|unit| {
            if let Some(category_id) = goal.category_id.as_deref() {
                unit.require_category(category_id)?;
            }
            db::insert_goal(unit.conn, &goal)?;
            Ok(())
        })?;
        info!(goal_id = %goal.id, "goal created");
        Ok(goal)
    }

    pub fn list_goals(
        &self,
        status: Option<&str>,
        category_id: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<GoalRecord>, AppError> {
        if !(1..=MAX_LIST_LIMIT).contains(&limit) {
            return Err(AppError::InvalidArgument(format!(
                "limit must be between 1 and {MAX_LIST_LIMIT}"
            )));
        }
        let status = status.map(GoalStatus::from_str).transpose()?;
        Ok(db::list_goals(
            &self.conn,
            &GoalQuery {
                user_id: &self.user_id,
                status,
                category_id: category_id.map(str::trim).filter(|id| !id.is_empty()),
                limit,
                offset,
            },
        )?)
    }

    pub fn show_goal(&self, id: &str) -> Result<GoalTree, AppError> {
        let goal = self.require(EntityRef::Goal(id))?;
        let mut milestones = Vec::new();
        for milestone in db::list_milestones_by_goal(&self.conn, &goal.id)? {
            let mut tasks = Vec::new();
            for task in db::list_tasks_by_milestone(&self.conn, &milestone.id)? {
                let checklist = db::list_checklist_items(&self.conn, &task.id)?;
                tasks.push(TaskTree { task, checklist });
            }
            milestones.push(MilestoneTree { milestone, tasks });
        }
        Ok(GoalTree { goal, milestones })
    }

    pub fn update_goal(&mut self, id: &str, patch: GoalPatch) -> Result<GoalRecord, AppError> {
        if !patch.has_changes() {
            return Err(no_changes());
        }
        let goal = self.write(|unit| {
            let mut goal = unit.require(EntityRef::Goal(id))?;
            if let Some(title) = patch.title.as_deref() {
                goal.title = required_text("title", title)?;
            }
            if let Some(description) = patch.description.as_deref() {
                goal.description = non_empty(description);
            }
            if let Some(priority) = patch.priority.as_deref() {
                goal.priority = Priority::from_str(priority)?;
            }
            if let Some(category_id) = patch.category_id.as_deref() {
                goal.category_id = match non_empty(category_id) {
                    Some(category_id) => Some(unit.require_category(&category_id)?.id),
                    None => None,
                };
            }
            if let Some(status) = patch.status.as_deref() {
                goal.status = GoalStatus::from_str(status)?;
            }
            if let Some(start_date) = patch.start_date.as_deref() {
                goal.start_date = optional_date("start date", Some(start_date))?;
            }
            if let Some(end_date) = patch.end_date.as_deref() {
                goal.end_date = optional_date("end date", Some(end_date))?;
            }
            goal.updated_at = now_utc_rfc3339();
            db::update_goal(unit.conn, &goal)?;
            Ok(goal)
        })?;
        info!(goal_id = %goal.id, status = %goal.status, "goal updated");
        Ok(goal)
    }

    pub fn delete_goal(&mut self, id: &str) -> Result<(), AppError> {
        self.write(|unit| {
            unit.require(EntityRef::Goal(id))?;
            db::delete_goal(unit.conn, id)?;
            Ok(())
        })?;
        info!(goal_id = id, "goal deleted");
        Ok(())
    }

    // categories

    pub fn create_category(&mut self, draft: CategoryDraft) -> Result<CategoryRecord, AppError> {
        let now = now_utc_rfc3339();
        let category = CategoryRecord {
            id: new_id(IdKind::Category),
            user_id: self.user_id.clone(),
            name: required_text("name", &draft.name)?,
            color: draft.color.as_deref().and_then(non_empty),
            icon: draft.icon.as_deref().and_then(non_empty),
            created_at: now.clone(),
            updated_at: now,
        };
        self.write(|unit| {
            db::insert_category(unit.conn, &category)?;
            Ok(())
        })?;
        info!(category_id = %category.id, "category created");
        Ok(category)
    }

    pub fn list_categories(&self) -> Result<Vec<CategoryRecord>, AppError> {
        Ok(db::list_categories(&self.conn, &self.user_id)?)
    }

    pub fn update_category(
        &mut self,
        id: &str,
        patch: CategoryPatch,
    ) -> Result<CategoryRecord, AppError> {
        if !patch.has_changes() {
            return Err(no_changes());
        }
        let category = self.write(|unit| {
            let mut category = unit.require_category(id)?;
            if let Some(name) = patch.name.as_deref() {
                category.name = required_text("name", name)?;
            }
            if let Some(color) = patch.color.as_deref() {
                category.color = non_empty(color);
            }
            if let Some(icon) = patch.icon.as_deref() {
                category.icon = non_empty(icon);
            }
            category.updated_at = now_utc_rfc3339();
            db::update_category(unit.conn, &category)?;
            Ok(category)
        })?;
        info!(category_id = %category.id, "category updated");
        Ok(category)
    }

    pub fn delete_category(&mut self, id: &str) -> Result<(), AppError> {
        self.write(|unit| {
            unit.require_category(id)?;
            db::delete_category(unit.conn, id)?;
            Ok(())
        })?;
        info!(category_id = id, "category deleted");
        Ok(())
    }

    // milestones

    pub fn create_milestone(
        &mut self,
        goal_id: &str,
        draft: MilestoneDraft,
    ) -> Result<MilestoneRecord, AppError> {
        let now = now_utc_rfc3339();
        let milestone = MilestoneRecord {
            id: new_id(IdKind::Milestone),
            goal_id: goal_id.to_string(),
            title: required_text("title", &draft.title)?,
            order_index: draft.order_index.unwrap_or_default(),
            start_date: optional_date("start date", draft.start_date.as_deref())?,
            end_date: optional_date("end date", draft.end_date.as_deref())?,
            status: MilestoneStatus::Active,
            progress: 0.0,
            created_at: now.clone(),
            updated_at: now,
        };
        self.write(|unit| {
            unit.require(EntityRef::Goal(goal_id))?;
            db::insert_milestone(unit.conn, &milestone)?;
            unit.engine.recompute_goal_progress(&unit.store(), goal_id)?;
            Ok(())
        })?;
        info!(milestone_id = %milestone.id, goal_id, "milestone created");
        Ok(milestone)
    }

    pub fn list_milestones(&self, goal_id: &str) -> Result<Vec<MilestoneRecord>, AppError> {
        self.require(EntityRef::Goal(goal_id))?;
        Ok(db::list_milestones_by_goal(&self.conn, goal_id)?)
    }

    pub fn update_milestone(
        &mut self,
        id: &str,
        patch: MilestonePatch,
    ) -> Result<MilestoneRecord, AppError> {
        if !patch.has_changes() {
            return Err(no_changes());
        }
        let milestone = self.write(|unit| {
            unit.require(EntityRef::Milestone(id))?;
            let mut milestone = db::get_milestone(unit.conn, id)?
                .ok_or_else(|| not_found(EntityKind::Milestone, id))?;
            if let Some(title) = patch.title.as_deref() {
                milestone.title = required_text("title", title)?;
            }
            if let Some(order_index) = patch.order_index {
                milestone.order_index = order_index;
            }
            if let Some(start_date) = patch.start_date.as_deref() {
                milestone.start_date = optional_date("start date", Some(start_date))?;
            }
            if let Some(end_date) = patch.end_date.as_deref() {
                milestone.end_date = optional_date("end date", Some(end_date))?;
            }
            milestone.updated_at = now_utc_rfc3339();
            db::update_milestone(unit.conn, &milestone)?;
            Ok(milestone)
        })?;
        info!(milestone_id = %milestone.id, "milestone updated");
        Ok(milestone)
    }

    pub fn delete_milestone(&mut self, id: &str) -> Result<(), AppError> {
        self.write(|unit| {
            let goal = unit.require(EntityRef::Milestone(id))?;
            db::delete_milestone(unit.conn, id)?;
            unit.engine.recompute_goal_progress(&unit.store(), &goal.id)?;
            Ok(())
        })?;
        info!(milestone_id = id, "milestone deleted");
        Ok(())
    }

    /// Ids are ranked in the order given; ids from another goal are ignored.
    pub fn reorder_milestones(
        &mut self,
        goal_id: &str,
        ordered_ids: &[String],
    ) -> Result<Vec<MilestoneRecord>, AppError> {
        let milestones = self.write(|unit| {
            unit.require(EntityRef::Goal(goal_id))?;
            let now = now_utc_rfc3339();
            for (index, milestone_id) in ordered_ids.iter().enumerate() {
                db::set_milestone_order(unit.conn, goal_id, milestone_id, index as i64, &now)?;
            }
            Ok(db::list_milestones_by_goal(unit.conn, goal_id)?)
        })?;
        info!(goal_id, count = ordered_ids.len(), "milestones reordered");
        Ok(milestones)
    }

    // tasks

    pub fn create_task(
        &mut self,
        milestone_id: &str,
        draft: TaskDraft,
    ) -> Result<TaskRecord, AppError> {
        let now = now_utc_rfc3339();
        let task = TaskRecord {
            id: new_id(IdKind::Task),
            milestone_id: milestone_id.to_string(),
            title: required_text("title", &draft.title)?,
            description: draft.description.as_deref().and_then(non_empty),
            due_date: optional_date("due date", draft.due_date.as_deref())?,
            estimated_time: validate_estimate(draft.estimated_time)?,
            status: TaskStatus::Pending,
            progress: 0.0,
            created_at: now.clone(),
            updated_at: now,
        };
        self.write(|unit| {
            unit.require(EntityRef::Milestone(milestone_id))?;
            db::insert_task(unit.conn, &task)?;
            unit.engine
                .recompute_milestone_progress(&unit.store(), milestone_id)?;
            Ok(())
        })?;
        info!(task_id = %task.id, milestone_id, "task created");
        Ok(task)
    }

    pub fn list_tasks(&self, milestone_id: &str) -> Result<Vec<TaskRecord>, AppError> {
        self.require(EntityRef::Milestone(milestone_id))?;
        Ok(db::list_tasks_by_milestone(&self.conn, milestone_id)?)
    }

    /// A manual COMPLETED pins progress to 100 and PENDING resets it to 0;
    /// the milestone is recomputed either way.
    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> Result<TaskRecord, AppError> {
        if !patch.has_changes() {
            return Err(no_changes());
        }
        let task = self.write(|unit| {
            unit.require(EntityRef::Task(id))?;
            let mut task =
                db::get_task(unit.conn, id)?.ok_or_else(|| not_found(EntityKind::Task, id))?;
            if let Some(title) = patch.title.as_deref() {
                task.title = required_text("title", title)?;
            }
            if let Some(description) = patch.description.as_deref() {
                task.description = non_empty(description);
            }
            if let Some(due_date) = patch.due_date.as_deref() {
                task.due_date = optional_date("due date", Some(due_date))?;
            }
            if patch.clear_estimate {
                task.estimated_time = None;
            }
            if patch.estimated_time.is_some() {
                task.estimated_time = validate_estimate(patch.estimated_time)?;
            }
            if let Some(status) = patch.status.as_deref() {
                let status = TaskStatus::from_str(status)?;
                match status {
                    TaskStatus::Completed => task.progress = 100.0,
                    TaskStatus::Pending => task.progress = 0.0,
                    TaskStatus::InProgress | TaskStatus::Overdue => {}
                }
                task.status = status;
            }
            task.updated_at = now_utc_rfc3339();
            db::update_task(unit.conn, &task)?;
            unit.engine
                .recompute_milestone_progress(&unit.store(), &task.milestone_id)?;
            Ok(task)
        })?;
        info!(task_id = %task.id, status = %task.status, "task updated");
        Ok(task)
    }

    pub fn delete_task(&mut self, id: &str) -> Result<(), AppError> {
        self.write(|unit| {
            unit.require(EntityRef::Task(id))?;
            let task =
                db::get_task(unit.conn, id)?.ok_or_else(|| not_found(EntityKind::Task, id))?;
            db::delete_task(unit.conn, id)?;
            unit.engine
                .recompute_milestone_progress(&unit.store(), &task.milestone_id)?;
            Ok(())
        })?;
        info!(task_id = id, "task deleted");
        Ok(())
    }

    // checklist items

    pub fn add_checklist_item(
        &mut self,
        task_id: &str,
        draft: ChecklistDraft,
    ) -> Result<ChecklistItemRecord, AppError> {
        let now = now_utc_rfc3339();
        let item = ChecklistItemRecord {
            id: new_id(IdKind::ChecklistItem),
            task_id: task_id.to_string(),
            title: required_text("title", &draft.title)?,
            is_completed: false,
            order_index: draft.order_index.unwrap_or_default(),
            created_at: now.clone(),
            updated_at: now,
        };
        self.write(|unit| {
            unit.require(EntityRef::Task(task_id))?;
            db::insert_checklist_item(unit.conn, &item)?;
            unit.engine.recompute_task_progress(&unit.store(), task_id)?;
            Ok(())
        })?;
        info!(item_id = %item.id, task_id, "checklist item added");
        Ok(item)
    }

    pub fn list_checklist_items(
        &self,
        task_id: &str,
    ) -> Result<Vec<ChecklistItemRecord>, AppError> {
        self.require(EntityRef::Task(task_id))?;
        Ok(db::list_checklist_items(&self.conn, task_id)?)
    }

    pub fn toggle_checklist_item(&mut self, id: &str) -> Result<ChecklistItemRecord, AppError> {
        let item = self.write(|unit| {
            unit.require(EntityRef::ChecklistItem(id))?;
            let mut item = db::get_checklist_item(unit.conn, id)?
                .ok_or_else(|| not_found(EntityKind::ChecklistItem, id))?;
            item.is_completed = !item.is_completed;
            item.updated_at = now_utc_rfc3339();
            db::update_checklist_item(unit.conn, &item)?;
            unit.engine
                .recompute_task_progress(&unit.store(), &item.task_id)?;
            Ok(item)
        })?;
        info!(item_id = %item.id, completed = item.is_completed, "checklist item toggled");
        Ok(item)
    }

    /// Title and position only; completion goes through the toggle.
    pub fn update_checklist_item(
        &mut self,
        id: &str,
        patch: ChecklistPatch,
    ) -> Result<ChecklistItemRecord, AppError> {
        if !patch.has_changes() {
            return Err(no_changes());
        }
        let item = self.write(|unit| {
            unit.require(EntityRef::ChecklistItem(id))?;
            let mut item = db::get_checklist_item(unit.conn, id)?
                .ok_or_else(|| not_found(EntityKind::ChecklistItem, id))?;
            if let Some(title) = patch.title.as_deref() {
                item.title = required_text("title", title)?;
            }
            if let Some(order_index) = patch.order_index {
                item.order_index = order_index;
            }
            item.updated_at = now_utc_rfc3339();
            db::update_checklist_item(unit.conn, &item)?;
            Ok(item)
        })?;
        info!(item_id = %item.id, "checklist item updated");
        Ok(item)
    }

    pub fn delete_checklist_item(&mut self, id: &str) -> Result<(), AppError> {
        self.write(|unit| {
            unit.require(EntityRef::ChecklistItem(id))?;
            let item = db::get_checklist_item(unit.conn, id)?
                .ok_or_else(|| not_found(EntityKind::ChecklistItem, id))?;
            db::delete_checklist_item(unit.conn, id)?;
            unit.engine
                .recompute_task_progress(&unit.store(), &item.task_id)?;
            Ok(())
        })?;
        info!(item_id = id, "checklist item deleted");
        Ok(())
    }

    pub fn reorder_checklist(
        &mut self,
        task_id: &str,
        ordered_ids: &[String],
    ) -> Result<Vec<ChecklistItemRecord>, AppError> {
        let items = self.write(|unit| {
            unit.require(EntityRef::Task(task_id))?;
            let now = now_utc_rfc3339();
            for (index, item_id) in ordered_ids.iter().enumerate() {
                db::set_checklist_order(unit.conn, task_id, item_id, index as i64, &now)?;
            }
            unit.engine.recompute_task_progress(&unit.store(), task_id)?;
            Ok(db::list_checklist_items(unit.conn, task_id)?)
        })?;
        info!(task_id, count = ordered_ids.len(), "checklist reordered");
        Ok(items)
    }

    // task notes

    pub fn add_note(&mut self, task_id: &str, content: &str) -> Result<TaskNoteRecord, AppError> {
        let now = now_utc_rfc3339();
        let note = TaskNoteRecord {
            id: new_id(IdKind::Note),
            task_id: task_id.to_string(),
            content: required_text("note content", content)?,
            created_at: now.clone(),
            updated_at: now,
        };
        self.write(|unit| {
            unit.require(EntityRef::Task(task_id))?;
            db::insert_task_note(unit.conn, &note)?;
            Ok(())
        })?;
        info!(note_id = %note.id, task_id, "note added");
        Ok(note)
    }

    pub fn list_notes(&self, task_id: &str) -> Result<Vec<TaskNoteRecord>, AppError> {
        self.require(EntityRef::Task(task_id))?;
        Ok(db::list_task_notes(&self.conn, task_id)?)
    }

    pub fn update_note(&mut self, id: &str, content: &str) -> Result<TaskNoteRecord, AppError> {
        let content = required_text("note content", content)?;
        let note = self.write(|unit| {
            unit.require(EntityRef::Note(id))?;
            let mut note =
                db::get_task_note(unit.conn, id)?.ok_or_else(|| not_found(EntityKind::Note, id))?;
            note.content = content;
            note.updated_at = now_utc_rfc3339();
            db::update_task_note(unit.conn, &note)?;
            Ok(note)
        })?;
        info!(note_id = %note.id, "note updated");
        Ok(note)
    }

    pub fn delete_note(&mut self, id: &str) -> Result<(), AppError> {
        self.write(|unit| {
            unit.require(EntityRef::Note(id))?;
            db::delete_task_note(unit.conn, id)?;
            Ok(())
        })?;
        info!(note_id = id, "note deleted");
        Ok(())
    }

    // dashboard

    pub fn dashboard(&self) -> Result<DashboardCounts, AppError> {
        Ok(db::dashboard_counts(&self.conn, &self.user_id)?)
    }

    /// Active goals only, newest first.
    pub fn goal_progress_bars(&self) -> Result<Vec<GoalProgressBar>, AppError> {
        let goals = db::list_goals_with_status(&self.conn, &self.user_id, GoalStatus::Active)?;
        Ok(goals
            .into_iter()
            .map(|goal| GoalProgressBar {
                id: goal.id,
                title: goal.title,
                progress: goal.progress,
                status: goal.status,
            })
            .collect())
    }

    pub fn stats(&self) -> Result<StatsReport, AppError> {
        Ok(StatsReport {
            overview: self.dashboard()?,
            goals: self.goal_progress_bars()?,
        })
    }

    // repair

    /// Re-runs the rollup from the given level upward.
    pub fn recompute(&mut self, target: RecomputeTarget<'_>) -> Result<GoalRecord, AppError> {
        let goal = self.write(|unit| {
            let store = unit.store();
            let goal = match target {
                RecomputeTarget::Goal(id) => {
                    let goal = unit.require(EntityRef::Goal(id))?;
                    unit.engine.recompute_goal_progress(&store, id)?;
                    goal
                }
                RecomputeTarget::Milestone(id) => {
                    let goal = unit.require(EntityRef::Milestone(id))?;
                    unit.engine.recompute_milestone_progress(&store, id)?;
                    goal
                }
                RecomputeTarget::Task(id) => {
                    let goal = unit.require(EntityRef::Task(id))?;
                    unit.engine.recompute_task_progress(&store, id)?;
                    goal
                }
            };
            db::get_goal(unit.conn, &goal.id)?.ok_or_else(|| not_found(EntityKind::Goal, &goal.id))
        })?;
        info!(goal_id = %goal.id, progress = goal.progress, "rollup recomputed");
        Ok(goal)
    }
}

fn ensure_parent_dir(path: &str) -> Result<(), AppError> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn required_text(field: &str, raw: &str) -> Result<String, AppError> {
    non_empty(raw).ok_or_else(|| AppError::InvalidArgument(format!("{field} cannot be empty")))
}

fn optional_date(field: &str, raw: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(raw) = raw.filter(|value| !value.trim().is_empty()) else {
        return Ok(None);
    };
    normalize_datetime(raw)
        .map(Some)
        .ok_or_else(|| AppError::InvalidArgument(format!("{field} must be RFC3339")))
}

fn validate_estimate(minutes: Option<i64>) -> Result<Option<i64>, AppError> {
    match minutes {
        Some(value) if value < 0 => Err(AppError::InvalidArgument(
            "estimated time cannot be negative".to_string(),
        )),
        other => Ok(other),
    }
}

fn parse_or_default<T>(raw: Option<&str>) -> Result<T, ParseStatusError>
where
    T: FromStr<Err = ParseStatusError> + Default,
{
    match raw {
        Some(value) => T::from_str(value),
        None => Ok(T::default()),
    }
}

fn no_changes() -> AppError {
    AppError::InvalidArgument("update requires at least one field change".to_string())
}

fn not_found(kind: EntityKind, id: &str) -> AppError {
    AppError::NotFound {
        kind,
        id: id.to_string(),
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    ParseStatus(#[from] ParseStatusError),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },
}
