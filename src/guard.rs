//! Ownership resolution: every entity belongs to whoever owns the goal at
//! the top of its chain.

use std::fmt;

use rusqlite::Connection;

use crate::app::AppError;
use crate::db::{self, CategoryRecord, GoalRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef<'a> {
    Goal(&'a str),
    Milestone(&'a str),
    Task(&'a str),
    ChecklistItem(&'a str),
    Note(&'a str),
}

impl EntityRef<'_> {
    pub fn id(&self) -> &str {
        match self {
            EntityRef::Goal(id)
            | EntityRef::Milestone(id)
            | EntityRef::Task(id)
            | EntityRef::ChecklistItem(id)
            | EntityRef::Note(id) => id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Goal(_) => EntityKind::Goal,
            EntityRef::Milestone(_) => EntityKind::Milestone,
            EntityRef::Task(_) => EntityKind::Task,
            EntityRef::ChecklistItem(_) => EntityKind::ChecklistItem,
            EntityRef::Note(_) => EntityKind::Note,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Goal,
    Milestone,
    Task,
    ChecklistItem,
    Note,
    Category,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Goal => "goal",
            EntityKind::Milestone => "milestone",
            EntityKind::Task => "task",
            EntityKind::ChecklistItem => "checklist item",
            EntityKind::Note => "note",
            EntityKind::Category => "category",
        })
    }
}

/// Walks parent references up to the goal. `None` when any link is missing.
pub fn resolve_owner(
    conn: &Connection,
    entity: EntityRef<'_>,
) -> rusqlite::Result<Option<GoalRecord>> {
    let task_id = match entity {
        EntityRef::Goal(id) => return db::get_goal(conn, id),
        EntityRef::Milestone(id) => return goal_of_milestone(conn, id),
        EntityRef::Task(id) => Some(id.to_string()),
        EntityRef::ChecklistItem(id) => db::get_checklist_item(conn, id)?.map(|item| item.task_id),
        EntityRef::Note(id) => db::get_task_note(conn, id)?.map(|note| note.task_id),
    };
    let Some(task_id) = task_id else {
        return Ok(None);
    };
    let Some(task) = db::get_task(conn, &task_id)? else {
        return Ok(None);
    };
    goal_of_milestone(conn, &task.milestone_id)
}

fn goal_of_milestone(conn: &Connection, milestone_id: &str) -> rusqlite::Result<Option<GoalRecord>> {
    let Some(milestone) = db::get_milestone(conn, milestone_id)? else {
        return Ok(None);
    };
    db::get_goal(conn, &milestone.goal_id)
}

/// The owning goal, or `NotFound` for the requested entity. Someone else's
/// entity is reported exactly like a missing one.
pub fn require_owner(
    conn: &Connection,
    user_id: &str,
    entity: EntityRef<'_>,
) -> Result<GoalRecord, AppError> {
    match resolve_owner(conn, entity)? {
        Some(goal) if goal.user_id == user_id => Ok(goal),
        _ => Err(AppError::NotFound {
            kind: entity.kind(),
            id: entity.id().to_string(),
        }),
    }
}

/// Categories sit outside the goal chain and carry their own owner.
pub fn require_category(
    conn: &Connection,
    user_id: &str,
    id: &str,
) -> Result<CategoryRecord, AppError> {
    match db::get_category(conn, id)? {
        Some(category) if category.user_id == user_id => Ok(category),
        _ => Err(AppError::NotFound {
            kind: EntityKind::Category,
            id: id.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{require_category, require_owner, resolve_owner, EntityKind, EntityRef};
    use crate::app::AppError;
    use crate::db::{
        self, CategoryRecord, ChecklistItemRecord, GoalRecord, MilestoneRecord, TaskRecord,
    };
    use crate::domain::status::{GoalStatus, MilestoneStatus, Priority, TaskStatus};
    use uuid::Uuid;

    const AT: &str = "2026-01-01T00:00:00Z";

    fn unique_db_path() -> String {
        std::env::temp_dir()
            .join(format!("goalpost-guard-{}.sqlite", Uuid::now_v7()))
            .display()
            .to_string()
    }

    fn cleanup_db_files(path: &str) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{path}{suffix}"));
        }
    }

    fn seed_chain(conn: &rusqlite::Connection, owner: &str) {
        db::insert_goal(
            conn,
            &GoalRecord {
                id: "G-1".to_string(),
                user_id: owner.to_string(),
                title: "Run a marathon".to_string(),
                description: None,
                priority: Priority::High,
                category_id: None,
                start_date: None,
                end_date: None,
                status: GoalStatus::Active,
                progress: 0.0,
                created_at: AT.to_string(),
                updated_at: AT.to_string(),
            },
        )
        .expect("goal should insert");
        db::insert_milestone(
            conn,
            &MilestoneRecord {
                id: "M-1".to_string(),
                goal_id: "G-1".to_string(),
                title: "Base building".to_string(),
                order_index: 0,
                start_date: None,
                end_date: None,
                status: MilestoneStatus::Active,
                progress: 0.0,
                created_at: AT.to_string(),
                updated_at: AT.to_string(),
            },
        )
        .expect("milestone should insert");
        db::insert_task(
            conn,
            &TaskRecord {
                id: "T-1".to_string(),
                milestone_id: "M-1".to_string(),
                title: "Run 5k".to_string(),
                description: None,
                due_date: None,
                estimated_time: Some(30),
                status: TaskStatus::Pending,
                progress: 0.0,
                created_at: AT.to_string(),
                updated_at: AT.to_string(),
            },
        )
        .expect("task should insert");
        db::insert_checklist_item(
            conn,
            &ChecklistItemRecord {
                id: "C-1".to_string(),
                task_id: "T-1".to_string(),
                title: "Stretch".to_string(),
                is_completed: false,
                order_index: 0,
                created_at: AT.to_string(),
                updated_at: AT.to_string(),
            },
        )
        .expect("checklist item should insert");
    }

    #[test]
    fn resolves_every_level_to_the_same_goal() {
        let path = unique_db_path();
        let conn = db::open_connection(&path).expect("connection should open");
        seed_chain(&conn, "alice");

        for entity in [
            EntityRef::Goal("G-1"),
            EntityRef::Milestone("M-1"),
            EntityRef::Task("T-1"),
            EntityRef::ChecklistItem("C-1"),
        ] {
            let goal = resolve_owner(&conn, entity)
                .expect("walk should succeed")
                .expect("owner should resolve");
            assert_eq!(goal.id, "G-1");
        }

        assert!(resolve_owner(&conn, EntityRef::Note("N-missing"))
            .expect("walk should succeed")
            .is_none());

        cleanup_db_files(&path);
    }

    #[test]
    fn foreign_owner_looks_like_missing_entity() {
        let path = unique_db_path();
        let conn = db::open_connection(&path).expect("connection should open");
        seed_chain(&conn, "alice");

        let owned = require_owner(&conn, "alice", EntityRef::ChecklistItem("C-1"))
            .expect("owner should pass");
        assert_eq!(owned.user_id, "alice");

        let err = require_owner(&conn, "mallory", EntityRef::Task("T-1"))
            .expect_err("other users should be rejected");
        match err {
            AppError::NotFound { kind, id } => {
                assert_eq!(kind, EntityKind::Task);
                assert_eq!(id, "T-1");
            }
            other => panic!("unexpected error: {other}"),
        }

        cleanup_db_files(&path);
    }

    #[test]
    fn categories_are_visible_only_to_their_owner() {
        let path = unique_db_path();
        let conn = db::open_connection(&path).expect("connection should open");
        db::insert_category(
            &conn,
            &CategoryRecord {
                id: "CAT-1".to_string(),
                user_id: "alice".to_string(),
                name: "Health".to_string(),
                color: None,
                icon: None,
                created_at: AT.to_string(),
                updated_at: AT.to_string(),
            },
        )
        .expect("category should insert");

        let owned = require_category(&conn, "alice", "CAT-1").expect("owner should pass");
        assert_eq!(owned.name, "Health");

        for (user, id) in [("mallory", "CAT-1"), ("alice", "CAT-missing")] {
            match require_category(&conn, user, id).expect_err("lookup should fail") {
                AppError::NotFound { kind, id: missing } => {
                    assert_eq!(kind, EntityKind::Category);
                    assert_eq!(missing, id);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        cleanup_db_files(&path);
    }
}
