use std::time::Duration;

use rusqlite::{params, Connection, DatabaseName, OptionalExtension, Result, Row};
use serde::Serialize;

use crate::domain::rollup::ChecklistTally;
use crate::domain::status::{GoalStatus, MilestoneStatus, Priority, TaskStatus};
use crate::domain::fields::now_utc_rfc3339;

pub const CURRENT_SCHEMA_VERSION: i64 = 3;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 3] = [
    Migration {
        version: 1,
        name: "baseline_hierarchy_v1",
        sql: r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS goals (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    priority TEXT NOT NULL DEFAULT 'MEDIUM',
    start_date TEXT,
    end_date TEXT,
    status TEXT NOT NULL DEFAULT 'ACTIVE',
    progress REAL NOT NULL DEFAULT 0 CHECK (progress BETWEEN 0 AND 100),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS milestones (
    id TEXT PRIMARY KEY,
    goal_id TEXT NOT NULL REFERENCES goals(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    order_index INTEGER NOT NULL DEFAULT 0,
    start_date TEXT,
    end_date TEXT,
    status TEXT NOT NULL DEFAULT 'ACTIVE',
    progress REAL NOT NULL DEFAULT 0 CHECK (progress BETWEEN 0 AND 100),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    milestone_id TEXT NOT NULL REFERENCES milestones(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT,
    due_date TEXT,
    estimated_time INTEGER,
    status TEXT NOT NULL DEFAULT 'PENDING',
    progress REAL NOT NULL DEFAULT 0 CHECK (progress BETWEEN 0 AND 100),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS checklist_items (
    id TEXT PRIMARY KEY,
    task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    is_completed INTEGER NOT NULL DEFAULT 0,
    order_index INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_goals_user_id ON goals(user_id);
CREATE INDEX IF NOT EXISTS idx_goals_status ON goals(status);
CREATE INDEX IF NOT EXISTS idx_milestones_goal_id ON milestones(goal_id);
CREATE INDEX IF NOT EXISTS idx_tasks_milestone_id ON tasks(milestone_id);
CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
CREATE INDEX IF NOT EXISTS idx_checklist_items_task_id ON checklist_items(task_id);
"#,
    },
    Migration {
        version: 2,
        name: "task_notes_v1",
        sql: r#"
CREATE TABLE IF NOT EXISTS task_notes (
    id TEXT PRIMARY KEY,
    task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_task_notes_task_id ON task_notes(task_id);
"#,
    },
    Migration {
        version: 3,
        name: "goal_categories_v1",
        sql: r#"
CREATE TABLE IF NOT EXISTS categories (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL,
    color TEXT,
    icon TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_categories_user_id ON categories(user_id);

ALTER TABLE goals ADD COLUMN category_id TEXT REFERENCES categories(id) ON DELETE SET NULL;

CREATE INDEX IF NOT EXISTS idx_goals_category_id ON goals(category_id);
"#,
    },
];

pub fn open_connection(path: &str) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    configure_for_speed(&conn)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

fn configure_for_speed(conn: &Connection) -> Result<()> {
    conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
    conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")?;
    conn.pragma_update(None::<DatabaseName>, "foreign_keys", "ON")?;
    conn.pragma_update(None::<DatabaseName>, "temp_store", "MEMORY")?;
    conn.pragma_update(None::<DatabaseName>, "busy_timeout", 5000i64)?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
"#,
    )?;

    for migration in MIGRATIONS {
        let already_applied: Option<i64> = tx
            .query_row(
                "SELECT version FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |row| row.get(0),
            )
            .optional()?;

        if already_applied.is_some() {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, now_utc_rfc3339()],
        )?;
    }

    tx.execute(
        r#"
INSERT INTO meta (key, value)
VALUES ('schema_version', ?1)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
        params![CURRENT_SCHEMA_VERSION.to_string()],
    )?;

    tx.commit()
}

pub fn get_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM meta WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalRecord {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub category_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: GoalStatus,
    pub progress: f64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MilestoneRecord {
    pub id: String,
    pub goal_id: String,
    pub title: String,
    pub order_index: i64,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: MilestoneStatus,
    pub progress: f64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRecord {
    pub id: String,
    pub milestone_id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
    /// Minutes.
    pub estimated_time: Option<i64>,
    pub status: TaskStatus,
    pub progress: f64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistItemRecord {
    pub id: String,
    pub task_id: String,
    pub title: String,
    pub is_completed: bool,
    pub order_index: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRecord {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Per-user counts behind the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub total_goals: u64,
    pub completed_goals: u64,
    pub active_goals: u64,
    pub total_milestones: u64,
    pub completed_milestones: u64,
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub overdue_tasks: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskNoteRecord {
    pub id: String,
    pub task_id: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

const GOAL_COLUMNS: &str = "id, user_id, title, description, priority, start_date, end_date, \
                            status, progress, created_at, updated_at, category_id";
const MILESTONE_COLUMNS: &str = "id, goal_id, title, order_index, start_date, end_date, status, \
                                 progress, created_at, updated_at";
const TASK_COLUMNS: &str = "id, milestone_id, title, description, due_date, estimated_time, \
                            status, progress, created_at, updated_at";
const CHECKLIST_COLUMNS: &str =
    "id, task_id, title, is_completed, order_index, created_at, updated_at";
const NOTE_COLUMNS: &str = "id, task_id, content, created_at, updated_at";
const CATEGORY_COLUMNS: &str = "id, user_id, name, color, icon, created_at, updated_at";

fn goal_from_row(row: &Row<'_>) -> Result<GoalRecord> {
    Ok(GoalRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        priority: row.get(4)?,
        category_id: row.get(11)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
        status: row.get(7)?,
        progress: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn milestone_from_row(row: &Row<'_>) -> Result<MilestoneRecord> {
    Ok(MilestoneRecord {
        id: row.get(0)?,
        goal_id: row.get(1)?,
        title: row.get(2)?,
        order_index: row.get(3)?,
        start_date: row.get(4)?,
        end_date: row.get(5)?,
        status: row.get(6)?,
        progress: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn task_from_row(row: &Row<'_>) -> Result<TaskRecord> {
    Ok(TaskRecord {
        id: row.get(0)?,
        milestone_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        due_date: row.get(4)?,
        estimated_time: row.get(5)?,
        status: row.get(6)?,
        progress: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn checklist_item_from_row(row: &Row<'_>) -> Result<ChecklistItemRecord> {
    Ok(ChecklistItemRecord {
        id: row.get(0)?,
        task_id: row.get(1)?,
        title: row.get(2)?,
        is_completed: row.get(3)?,
        order_index: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn category_from_row(row: &Row<'_>) -> Result<CategoryRecord> {
    Ok(CategoryRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        color: row.get(3)?,
        icon: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn note_from_row(row: &Row<'_>) -> Result<TaskNoteRecord> {
    Ok(TaskNoteRecord {
        id: row.get(0)?,
        task_id: row.get(1)?,
        content: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn collect_rows<T, P>(
    conn: &Connection,
    sql: &str,
    params: P,
    map: fn(&Row<'_>) -> Result<T>,
) -> Result<Vec<T>>
where
    P: rusqlite::Params,
{
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(map(row)?);
    }
    Ok(result)
}

// goals

pub fn insert_goal(conn: &Connection, goal: &GoalRecord) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO goals ({GOAL_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        ),
        params![
            goal.id,
            goal.user_id,
            goal.title,
            goal.description,
            goal.priority,
            goal.start_date,
            goal.end_date,
            goal.status,
            goal.progress,
            goal.created_at,
            goal.updated_at,
            goal.category_id
        ],
    )?;
    Ok(())
}

pub fn get_goal(conn: &Connection, id: &str) -> Result<Option<GoalRecord>> {
    conn.query_row(
        &format!("SELECT {GOAL_COLUMNS} FROM goals WHERE id = ?1"),
        params![id],
        goal_from_row,
    )
    .optional()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalQuery<'a> {
    pub user_id: &'a str,
    pub status: Option<GoalStatus>,
    pub category_id: Option<&'a str>,
    pub limit: u32,
    pub offset: u32,
}

pub fn list_goals(conn: &Connection, query: &GoalQuery<'_>) -> Result<Vec<GoalRecord>> {
    collect_rows(
        conn,
        &format!(
            r#"
SELECT {GOAL_COLUMNS}
FROM goals
WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2) AND (?5 IS NULL OR category_id = ?5)
ORDER BY created_at DESC, id DESC
LIMIT ?3 OFFSET ?4
"#
        ),
        params![
            query.user_id,
            query.status,
            query.limit,
            query.offset,
            query.category_id
        ],
        goal_from_row,
    )
}

/// Writes the user-editable goal fields. Progress is left to the engine.
pub fn update_goal(conn: &Connection, goal: &GoalRecord) -> Result<usize> {
    conn.execute(
        r#"
UPDATE goals
SET title = ?2, description = ?3, priority = ?4, start_date = ?5, end_date = ?6,
    status = ?7, updated_at = ?8, category_id = ?9
WHERE id = ?1
"#,
        params![
            goal.id,
            goal.title,
            goal.description,
            goal.priority,
            goal.start_date,
            goal.end_date,
            goal.status,
            goal.updated_at,
            goal.category_id
        ],
    )
}

pub fn set_goal_rollup(
    conn: &Connection,
    id: &str,
    progress: f64,
    status: GoalStatus,
    updated_at: &str,
) -> Result<usize> {
    conn.execute(
        "UPDATE goals SET progress = ?2, status = ?3, updated_at = ?4 WHERE id = ?1",
        params![id, progress, status, updated_at],
    )
}

pub fn delete_goal(conn: &Connection, id: &str) -> Result<usize> {
    conn.execute("DELETE FROM goals WHERE id = ?1", params![id])
}

/// Unpaged, newest first; feeds the progress bars.
pub fn list_goals_with_status(
    conn: &Connection,
    user_id: &str,
    status: GoalStatus,
) -> Result<Vec<GoalRecord>> {
    collect_rows(
        conn,
        &format!(
            "SELECT {GOAL_COLUMNS} FROM goals WHERE user_id = ?1 AND status = ?2 \
             ORDER BY created_at DESC, id DESC"
        ),
        params![user_id, status],
        goal_from_row,
    )
}

// categories

pub fn insert_category(conn: &Connection, category: &CategoryRecord) -> Result<()> {
    conn.execute(
        &format!("INSERT INTO categories ({CATEGORY_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
        params![
            category.id,
            category.user_id,
            category.name,
            category.color,
            category.icon,
            category.created_at,
            category.updated_at
        ],
    )?;
    Ok(())
}

pub fn get_category(conn: &Connection, id: &str) -> Result<Option<CategoryRecord>> {
    conn.query_row(
        &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1"),
        params![id],
        category_from_row,
    )
    .optional()
}

pub fn list_categories(conn: &Connection, user_id: &str) -> Result<Vec<CategoryRecord>> {
    collect_rows(
        conn,
        &format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE user_id = ?1 \
             ORDER BY name ASC, id ASC"
        ),
        params![user_id],
        category_from_row,
    )
}

pub fn update_category(conn: &Connection, category: &CategoryRecord) -> Result<usize> {
    conn.execute(
        "UPDATE categories SET name = ?2, color = ?3, icon = ?4, updated_at = ?5 WHERE id = ?1",
        params![
            category.id,
            category.name,
            category.color,
            category.icon,
            category.updated_at
        ],
    )
}

/// Goals in the category keep living with `category_id` cleared.
pub fn delete_category(conn: &Connection, id: &str) -> Result<usize> {
    conn.execute("DELETE FROM categories WHERE id = ?1", params![id])
}

// dashboard

pub fn dashboard_counts(conn: &Connection, user_id: &str) -> Result<DashboardCounts> {
    let (total_goals, completed_goals, active_goals) = count_triple(
        conn,
        r#"
SELECT COUNT(*),
       COALESCE(SUM(CASE WHEN status = 'COMPLETED' THEN 1 ELSE 0 END), 0),
       COALESCE(SUM(CASE WHEN status = 'ACTIVE' THEN 1 ELSE 0 END), 0)
FROM goals
WHERE user_id = ?1
"#,
        user_id,
    )?;
    let (total_milestones, completed_milestones, _) = count_triple(
        conn,
        r#"
SELECT COUNT(*),
       COALESCE(SUM(CASE WHEN m.status = 'COMPLETED' THEN 1 ELSE 0 END), 0),
       0
FROM milestones m
JOIN goals g ON g.id = m.goal_id
WHERE g.user_id = ?1
"#,
        user_id,
    )?;
    let (total_tasks, completed_tasks, overdue_tasks) = count_triple(
        conn,
        r#"
SELECT COUNT(*),
       COALESCE(SUM(CASE WHEN t.status = 'COMPLETED' THEN 1 ELSE 0 END), 0),
       COALESCE(SUM(CASE WHEN t.status = 'OVERDUE' THEN 1 ELSE 0 END), 0)
FROM tasks t
JOIN milestones m ON m.id = t.milestone_id
JOIN goals g ON g.id = m.goal_id
WHERE g.user_id = ?1
"#,
        user_id,
    )?;
    Ok(DashboardCounts {
        total_goals,
        completed_goals,
        active_goals,
        total_milestones,
        completed_milestones,
        total_tasks,
        completed_tasks,
        overdue_tasks,
    })
}

fn count_triple(conn: &Connection, sql: &str, user_id: &str) -> Result<(u64, u64, u64)> {
    conn.query_row(sql, params![user_id], |row| {
        let count = |index: usize| -> Result<u64> {
            let value: i64 = row.get(index)?;
            Ok(u64::try_from(value).unwrap_or_default())
        };
        Ok((count(0)?, count(1)?, count(2)?))
    })
}

// milestones

pub fn insert_milestone(conn: &Connection, milestone: &MilestoneRecord) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO milestones ({MILESTONE_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        ),
        params![
            milestone.id,
            milestone.goal_id,
            milestone.title,
            milestone.order_index,
            milestone.start_date,
            milestone.end_date,
            milestone.status,
            milestone.progress,
            milestone.created_at,
            milestone.updated_at
        ],
    )?;
    Ok(())
}

pub fn get_milestone(conn: &Connection, id: &str) -> Result<Option<MilestoneRecord>> {
    conn.query_row(
        &format!("SELECT {MILESTONE_COLUMNS} FROM milestones WHERE id = ?1"),
        params![id],
        milestone_from_row,
    )
    .optional()
}

pub fn list_milestones_by_goal(conn: &Connection, goal_id: &str) -> Result<Vec<MilestoneRecord>> {
    collect_rows(
        conn,
        &format!(
            "SELECT {MILESTONE_COLUMNS} FROM milestones WHERE goal_id = ?1 \
             ORDER BY order_index ASC, created_at ASC, id ASC"
        ),
        params![goal_id],
        milestone_from_row,
    )
}

pub fn update_milestone(conn: &Connection, milestone: &MilestoneRecord) -> Result<usize> {
    conn.execute(
        r#"
UPDATE milestones
SET title = ?2, order_index = ?3, start_date = ?4, end_date = ?5, updated_at = ?6
WHERE id = ?1
"#,
        params![
            milestone.id,
            milestone.title,
            milestone.order_index,
            milestone.start_date,
            milestone.end_date,
            milestone.updated_at
        ],
    )
}

/// Scoped to the parent so foreign ids are silently skipped.
pub fn set_milestone_order(
    conn: &Connection,
    goal_id: &str,
    id: &str,
    order_index: i64,
    updated_at: &str,
) -> Result<usize> {
    conn.execute(
        "UPDATE milestones SET order_index = ?3, updated_at = ?4 WHERE id = ?1 AND goal_id = ?2",
        params![id, goal_id, order_index, updated_at],
    )
}

pub fn set_milestone_rollup(
    conn: &Connection,
    id: &str,
    progress: f64,
    status: MilestoneStatus,
    updated_at: &str,
) -> Result<usize> {
    conn.execute(
        "UPDATE milestones SET progress = ?2, status = ?3, updated_at = ?4 WHERE id = ?1",
        params![id, progress, status, updated_at],
    )
}

pub fn delete_milestone(conn: &Connection, id: &str) -> Result<usize> {
    conn.execute("DELETE FROM milestones WHERE id = ?1", params![id])
}

// tasks

pub fn insert_task(conn: &Connection, task: &TaskRecord) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO tasks ({TASK_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        ),
        params![
            task.id,
            task.milestone_id,
            task.title,
            task.description,
            task.due_date,
            task.estimated_time,
            task.status,
            task.progress,
            task.created_at,
            task.updated_at
        ],
    )?;
    Ok(())
}

pub fn get_task(conn: &Connection, id: &str) -> Result<Option<TaskRecord>> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
        params![id],
        task_from_row,
    )
    .optional()
}

pub fn list_tasks_by_milestone(conn: &Connection, milestone_id: &str) -> Result<Vec<TaskRecord>> {
    collect_rows(
        conn,
        &format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE milestone_id = ?1 \
             ORDER BY created_at ASC, id ASC"
        ),
        params![milestone_id],
        task_from_row,
    )
}

/// Writes every user-editable task field, including a manual progress.
pub fn update_task(conn: &Connection, task: &TaskRecord) -> Result<usize> {
    conn.execute(
        r#"
UPDATE tasks
SET title = ?2, description = ?3, due_date = ?4, estimated_time = ?5,
    status = ?6, progress = ?7, updated_at = ?8
WHERE id = ?1
"#,
        params![
            task.id,
            task.title,
            task.description,
            task.due_date,
            task.estimated_time,
            task.status,
            task.progress,
            task.updated_at
        ],
    )
}

pub fn set_task_rollup(
    conn: &Connection,
    id: &str,
    progress: f64,
    status: TaskStatus,
    updated_at: &str,
) -> Result<usize> {
    conn.execute(
        "UPDATE tasks SET progress = ?2, status = ?3, updated_at = ?4 WHERE id = ?1",
        params![id, progress, status, updated_at],
    )
}

pub fn delete_task(conn: &Connection, id: &str) -> Result<usize> {
    conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])
}

// checklist items

pub fn insert_checklist_item(conn: &Connection, item: &ChecklistItemRecord) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO checklist_items ({CHECKLIST_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
        ),
        params![
            item.id,
            item.task_id,
            item.title,
            item.is_completed,
            item.order_index,
            item.created_at,
            item.updated_at
        ],
    )?;
    Ok(())
}

pub fn get_checklist_item(conn: &Connection, id: &str) -> Result<Option<ChecklistItemRecord>> {
    conn.query_row(
        &format!("SELECT {CHECKLIST_COLUMNS} FROM checklist_items WHERE id = ?1"),
        params![id],
        checklist_item_from_row,
    )
    .optional()
}

pub fn list_checklist_items(conn: &Connection, task_id: &str) -> Result<Vec<ChecklistItemRecord>> {
    collect_rows(
        conn,
        &format!(
            "SELECT {CHECKLIST_COLUMNS} FROM checklist_items WHERE task_id = ?1 \
             ORDER BY order_index ASC, created_at ASC, id ASC"
        ),
        params![task_id],
        checklist_item_from_row,
    )
}

pub fn count_checklist_items(conn: &Connection, task_id: &str) -> Result<ChecklistTally> {
    conn.query_row(
        r#"
SELECT COUNT(*), COALESCE(SUM(CASE WHEN is_completed THEN 1 ELSE 0 END), 0)
FROM checklist_items
WHERE task_id = ?1
"#,
        params![task_id],
        |row| {
            let total: i64 = row.get(0)?;
            let completed: i64 = row.get(1)?;
            Ok(ChecklistTally::new(
                u64::try_from(total).unwrap_or_default(),
                u64::try_from(completed).unwrap_or_default(),
            ))
        },
    )
}

pub fn update_checklist_item(conn: &Connection, item: &ChecklistItemRecord) -> Result<usize> {
    conn.execute(
        r#"
UPDATE checklist_items
SET title = ?2, is_completed = ?3, order_index = ?4, updated_at = ?5
WHERE id = ?1
"#,
        params![
            item.id,
            item.title,
            item.is_completed,
            item.order_index,
            item.updated_at
        ],
    )
}

pub fn set_checklist_order(
    conn: &Connection,
    task_id: &str,
    id: &str,
    order_index: i64,
    updated_at: &str,
) -> Result<usize> {
    conn.execute(
        "UPDATE checklist_items SET order_index = ?3, updated_at = ?4 \
         WHERE id = ?1 AND task_id = ?2",
        params![id, task_id, order_index, updated_at],
    )
}

pub fn delete_checklist_item(conn: &Connection, id: &str) -> Result<usize> {
    conn.execute("DELETE FROM checklist_items WHERE id = ?1", params![id])
}

// task notes

pub fn insert_task_note(conn: &Connection, note: &TaskNoteRecord) -> Result<()> {
    conn.execute(
        &format!("INSERT INTO task_notes ({NOTE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
        params![
            note.id,
            note.task_id,
            note.content,
            note.created_at,
            note.updated_at
        ],
    )?;
    Ok(())
}

pub fn get_task_note(conn: &Connection, id: &str) -> Result<Option<TaskNoteRecord>> {
    conn.query_row(
        &format!("SELECT {NOTE_COLUMNS} FROM task_notes WHERE id = ?1"),
        params![id],
        note_from_row,
    )
    .optional()
}

pub fn list_task_notes(conn: &Connection, task_id: &str) -> Result<Vec<TaskNoteRecord>> {
    collect_rows(
        conn,
        &format!(
            "SELECT {NOTE_COLUMNS} FROM task_notes WHERE task_id = ?1 \
             ORDER BY created_at DESC, id DESC"
        ),
        params![task_id],
        note_from_row,
    )
}

pub fn update_task_note(conn: &Connection, note: &TaskNoteRecord) -> Result<usize> {
    conn.execute(
        "UPDATE task_notes SET content = ?2, updated_at = ?3 WHERE id = ?1",
        params![note.id, note.content, note.updated_at],
    )
}

pub fn delete_task_note(conn: &Connection, id: &str) -> Result<usize> {
    conn.execute("DELETE FROM task_notes WHERE id = ?1", params![id])
}
