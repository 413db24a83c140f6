use std::cell::RefCell;
use std::collections::BTreeMap;

use super::ProgressEngine;
use crate::config::{ArchivedGoalPolicy, EngineSettings};
use crate::db::{GoalRecord, MilestoneRecord, TaskRecord};
use crate::domain::rollup::ChecklistTally;
use crate::domain::status::{GoalStatus, MilestoneStatus, Priority, TaskStatus};
use crate::store::HierarchyStore;

#[derive(Debug, Clone, PartialEq)]
enum Write {
    Task(String),
    Milestone(String),
    Goal(String),
}

/// Map-backed store that records every rollup write in order.
#[derive(Default)]
struct MemoryStore {
    goals: RefCell<BTreeMap<String, GoalRecord>>,
    milestones: RefCell<BTreeMap<String, MilestoneRecord>>,
    tasks: RefCell<BTreeMap<String, TaskRecord>>,
    checklists: RefCell<BTreeMap<String, Vec<bool>>>,
    writes: RefCell<Vec<Write>>,
    fail_goal_writes: bool,
}

#[derive(Debug, PartialEq, Eq)]
struct StoreDown;

impl MemoryStore {
    fn goal(&self, id: &str, status: GoalStatus) {
        self.goals.borrow_mut().insert(
            id.to_string(),
            GoalRecord {
                id: id.to_string(),
                user_id: "local".to_string(),
                title: id.to_string(),
                description: None,
                priority: Priority::Medium,
                category_id: None,
                start_date: None,
                end_date: None,
                status,
                progress: 0.0,
                created_at: "2026-01-01T00:00:00Z".to_string(),
                updated_at: "2026-01-01T00:00:00Z".to_string(),
            },
        );
    }

    fn milestone(&self, id: &str, goal_id: &str, progress: f64, status: MilestoneStatus) {
        self.milestones.borrow_mut().insert(
            id.to_string(),
            MilestoneRecord {
                id: id.to_string(),
                goal_id: goal_id.to_string(),
                title: id.to_string(),
                order_index: 0,
                start_date: None,
                end_date: None,
                status,
                progress,
                created_at: "2026-01-01T00:00:00Z".to_string(),
                updated_at: "2026-01-01T00:00:00Z".to_string(),
            },
        );
    }

    fn task(
        &self,
        id: &str,
        milestone_id: &str,
        progress: f64,
        status: TaskStatus,
        estimated_time: Option<i64>,
    ) {
        self.tasks.borrow_mut().insert(
            id.to_string(),
            TaskRecord {
                id: id.to_string(),
                milestone_id: milestone_id.to_string(),
                title: id.to_string(),
                description: None,
                due_date: None,
                estimated_time,
                status,
                progress,
                created_at: "2026-01-01T00:00:00Z".to_string(),
                updated_at: "2026-01-01T00:00:00Z".to_string(),
            },
        );
    }

    fn checklist(&self, task_id: &str, items: &[bool]) {
        self.checklists
            .borrow_mut()
            .insert(task_id.to_string(), items.to_vec());
    }

    fn task_state(&self, id: &str) -> (f64, TaskStatus) {
        let tasks = self.tasks.borrow();
        let task = tasks.get(id).expect("task should exist");
        (task.progress, task.status)
    }

    fn milestone_state(&self, id: &str) -> (f64, MilestoneStatus) {
        let milestones = self.milestones.borrow();
        let milestone = milestones.get(id).expect("milestone should exist");
        (milestone.progress, milestone.status)
    }

    fn goal_state(&self, id: &str) -> (f64, GoalStatus) {
        let goals = self.goals.borrow();
        let goal = goals.get(id).expect("goal should exist");
        (goal.progress, goal.status)
    }

    fn writes(&self) -> Vec<Write> {
        self.writes.borrow().clone()
    }
}

impl HierarchyStore for MemoryStore {
    type Error = StoreDown;

    fn count_checklist_items(&self, task_id: &str) -> Result<ChecklistTally, StoreDown> {
        let checklists = self.checklists.borrow();
        let items = checklists.get(task_id).map(Vec::as_slice).unwrap_or(&[]);
        let completed = items.iter().filter(|done| **done).count();
        Ok(ChecklistTally::new(items.len() as u64, completed as u64))
    }

    fn load_task(&self, task_id: &str) -> Result<Option<TaskRecord>, StoreDown> {
        Ok(self.tasks.borrow().get(task_id).cloned())
    }

    fn load_tasks_by_milestone(&self, milestone_id: &str) -> Result<Vec<TaskRecord>, StoreDown> {
        Ok(self
            .tasks
            .borrow()
            .values()
            .filter(|task| task.milestone_id == milestone_id)
            .cloned()
            .collect())
    }

    fn load_milestone(&self, milestone_id: &str) -> Result<Option<MilestoneRecord>, StoreDown> {
        Ok(self.milestones.borrow().get(milestone_id).cloned())
    }

    fn load_milestones_by_goal(&self, goal_id: &str) -> Result<Vec<MilestoneRecord>, StoreDown> {
        Ok(self
            .milestones
            .borrow()
            .values()
            .filter(|milestone| milestone.goal_id == goal_id)
            .cloned()
            .collect())
    }

    fn load_goal(&self, goal_id: &str) -> Result<Option<GoalRecord>, StoreDown> {
        Ok(self.goals.borrow().get(goal_id).cloned())
    }

    fn save_task_rollup(
        &self,
        task_id: &str,
        progress: f64,
        status: TaskStatus,
    ) -> Result<(), StoreDown> {
        if let Some(task) = self.tasks.borrow_mut().get_mut(task_id) {
            task.progress = progress;
            task.status = status;
        }
        self.writes.borrow_mut().push(Write::Task(task_id.to_string()));
        Ok(())
    }

    fn save_milestone_rollup(
        &self,
        milestone_id: &str,
        progress: f64,
        status: MilestoneStatus,
    ) -> Result<(), StoreDown> {
        if let Some(milestone) = self.milestones.borrow_mut().get_mut(milestone_id) {
            milestone.progress = progress;
            milestone.status = status;
        }
        self.writes
            .borrow_mut()
            .push(Write::Milestone(milestone_id.to_string()));
        Ok(())
    }

    fn save_goal_rollup(
        &self,
        goal_id: &str,
        progress: f64,
        status: GoalStatus,
    ) -> Result<(), StoreDown> {
        if self.fail_goal_writes {
            return Err(StoreDown);
        }
        if let Some(goal) = self.goals.borrow_mut().get_mut(goal_id) {
            goal.progress = progress;
            goal.status = status;
        }
        self.writes.borrow_mut().push(Write::Goal(goal_id.to_string()));
        Ok(())
    }
}

fn approx(left: f64, right: f64) -> bool {
    (left - right).abs() < 1e-9
}

/// goal g1 -> milestone m1 -> task t1
fn single_chain() -> MemoryStore {
    let store = MemoryStore::default();
    store.goal("g1", GoalStatus::Active);
    store.milestone("m1", "g1", 0.0, MilestoneStatus::Active);
    store.task("t1", "m1", 0.0, TaskStatus::Pending, None);
    store
}

#[test]
fn task_progress_is_completed_checklist_share_and_cascades() {
    let store = single_chain();
    store.checklist("t1", &[true, false, false, true]);

    ProgressEngine::default()
        .recompute_task_progress(&store, "t1")
        .expect("recompute should succeed");

    let (progress, status) = store.task_state("t1");
    assert!(approx(progress, 50.0));
    assert_eq!(status, TaskStatus::Pending);
    assert!(approx(store.milestone_state("m1").0, 50.0));
    assert!(approx(store.goal_state("g1").0, 50.0));
    assert_eq!(
        store.writes(),
        vec![
            Write::Task("t1".to_string()),
            Write::Milestone("m1".to_string()),
            Write::Goal("g1".to_string()),
        ]
    );
}

#[test]
fn fully_checked_task_completes_and_completes_its_ancestors() {
    let store = single_chain();
    store.checklist("t1", &[true, true]);

    ProgressEngine::default()
        .recompute_task_progress(&store, "t1")
        .expect("recompute should succeed");

    assert_eq!(store.task_state("t1"), (100.0, TaskStatus::Completed));
    assert_eq!(
        store.milestone_state("m1"),
        (100.0, MilestoneStatus::Completed)
    );
    assert_eq!(store.goal_state("g1"), (100.0, GoalStatus::Completed));
}

#[test]
fn task_without_checklist_keeps_manual_progress_and_does_not_cascade() {
    let store = single_chain();
    store.task("t1", "m1", 40.0, TaskStatus::InProgress, None);

    ProgressEngine::default()
        .recompute_task_progress(&store, "t1")
        .expect("recompute should succeed");

    assert_eq!(store.task_state("t1"), (40.0, TaskStatus::InProgress));
    assert!(store.writes().is_empty());
}

#[test]
fn unchecking_reverts_completed_task_to_in_progress() {
    let store = single_chain();
    store.task("t1", "m1", 100.0, TaskStatus::Completed, None);
    store.checklist("t1", &[true, false, true]);

    ProgressEngine::default()
        .recompute_task_progress(&store, "t1")
        .expect("recompute should succeed");

    let (progress, status) = store.task_state("t1");
    assert!(approx(progress, 200.0 / 3.0));
    assert_eq!(status, TaskStatus::InProgress);
}

#[test]
fn overdue_task_keeps_status_until_checklist_is_done() {
    let store = single_chain();
    store.task("t1", "m1", 0.0, TaskStatus::Overdue, None);
    store.checklist("t1", &[true, false]);

    let engine = ProgressEngine::default();
    engine
        .recompute_task_progress(&store, "t1")
        .expect("recompute should succeed");
    assert_eq!(store.task_state("t1").1, TaskStatus::Overdue);

    store.checklist("t1", &[true, true]);
    engine
        .recompute_task_progress(&store, "t1")
        .expect("recompute should succeed");
    assert_eq!(store.task_state("t1").1, TaskStatus::Completed);
}

#[test]
fn recompute_is_idempotent() {
    let store = single_chain();
    store.task("t2", "m1", 20.0, TaskStatus::InProgress, Some(15));
    store.checklist("t1", &[true, false, false]);

    let engine = ProgressEngine::default();
    engine
        .recompute_task_progress(&store, "t1")
        .expect("first recompute should succeed");
    let first = (
        store.task_state("t1"),
        store.milestone_state("m1"),
        store.goal_state("g1"),
    );
    let first_writes = store.writes();

    engine
        .recompute_task_progress(&store, "t1")
        .expect("second recompute should succeed");
    let second = (
        store.task_state("t1"),
        store.milestone_state("m1"),
        store.goal_state("g1"),
    );
    assert_eq!(first, second);
    assert_eq!(store.writes()[first_writes.len()..], first_writes[..]);
}

#[test]
fn milestone_progress_is_weighted_by_estimate() {
    let store = MemoryStore::default();
    store.goal("g1", GoalStatus::Active);
    store.milestone("m1", "g1", 0.0, MilestoneStatus::Active);
    store.task("t1", "m1", 100.0, TaskStatus::Completed, Some(30));
    store.task("t2", "m1", 50.0, TaskStatus::InProgress, Some(10));

    ProgressEngine::default()
        .recompute_milestone_progress(&store, "m1")
        .expect("recompute should succeed");

    assert_eq!(store.milestone_state("m1"), (87.5, MilestoneStatus::Active));
}

#[test]
fn milestone_without_estimates_uses_plain_mean() {
    let store = MemoryStore::default();
    store.goal("g1", GoalStatus::Active);
    store.milestone("m1", "g1", 0.0, MilestoneStatus::Active);
    store.task("t1", "m1", 100.0, TaskStatus::Completed, None);
    store.task("t2", "m1", 50.0, TaskStatus::InProgress, None);

    ProgressEngine::default()
        .recompute_milestone_progress(&store, "m1")
        .expect("recompute should succeed");

    assert!(approx(store.milestone_state("m1").0, 75.0));
}

#[test]
fn zero_estimate_weighs_like_missing_estimate() {
    let store = MemoryStore::default();
    store.goal("g1", GoalStatus::Active);
    store.milestone("m1", "g1", 0.0, MilestoneStatus::Active);
    store.task("t1", "m1", 100.0, TaskStatus::Completed, Some(0));
    store.task("t2", "m1", 0.0, TaskStatus::Pending, None);

    ProgressEngine::default()
        .recompute_milestone_progress(&store, "m1")
        .expect("recompute should succeed");

    assert!(approx(store.milestone_state("m1").0, 50.0));
}

#[test]
fn empty_milestone_resets_to_zero_and_still_cascades() {
    let store = MemoryStore::default();
    store.goal("g1", GoalStatus::Active);
    store.milestone("m1", "g1", 60.0, MilestoneStatus::Active);
    store.milestone("m2", "g1", 100.0, MilestoneStatus::Completed);

    ProgressEngine::default()
        .recompute_milestone_progress(&store, "m1")
        .expect("recompute should succeed");

    assert_eq!(store.milestone_state("m1"), (0.0, MilestoneStatus::Active));
    assert!(approx(store.goal_state("g1").0, 50.0));
    assert_eq!(
        store.writes(),
        vec![
            Write::Milestone("m1".to_string()),
            Write::Goal("g1".to_string())
        ]
    );
}

#[test]
fn goal_progress_is_unweighted_mean_and_reverts_completion() {
    let store = MemoryStore::default();
    store.goal("g1", GoalStatus::Completed);
    store.milestone("m1", "g1", 100.0, MilestoneStatus::Completed);
    store.milestone("m2", "g1", 0.0, MilestoneStatus::Active);
    store.milestone("m3", "g1", 50.0, MilestoneStatus::Active);

    ProgressEngine::default()
        .recompute_goal_progress(&store, "g1")
        .expect("recompute should succeed");

    assert_eq!(store.goal_state("g1"), (50.0, GoalStatus::Active));
}

#[test]
fn goal_without_milestones_has_zero_progress() {
    let store = MemoryStore::default();
    store.goal("g1", GoalStatus::Active);
    store.goals.borrow_mut().get_mut("g1").expect("goal").progress = 30.0;

    ProgressEngine::default()
        .recompute_goal_progress(&store, "g1")
        .expect("recompute should succeed");

    assert_eq!(store.goal_state("g1"), (0.0, GoalStatus::Active));
}

#[test]
fn uncompleting_a_task_reopens_milestone_and_goal() {
    let store = MemoryStore::default();
    store.goal("g1", GoalStatus::Completed);
    store.milestone("m1", "g1", 100.0, MilestoneStatus::Completed);
    store.task("t1", "m1", 100.0, TaskStatus::Completed, None);
    store.task("t2", "m1", 100.0, TaskStatus::InProgress, None);

    ProgressEngine::default()
        .recompute_milestone_progress(&store, "m1")
        .expect("recompute should succeed");

    assert_eq!(store.milestone_state("m1").1, MilestoneStatus::Active);
    assert_eq!(store.goal_state("g1").1, GoalStatus::Active);
}

#[test]
fn vanished_targets_are_skipped_silently() {
    let store = MemoryStore::default();
    store.checklist("ghost-task", &[true]);
    let engine = ProgressEngine::default();

    engine
        .recompute_task_progress(&store, "ghost-task")
        .expect("missing task should be a no-op");
    engine
        .recompute_milestone_progress(&store, "ghost-milestone")
        .expect("missing milestone should be a no-op");
    engine
        .recompute_goal_progress(&store, "ghost-goal")
        .expect("missing goal should be a no-op");
    assert!(store.writes().is_empty());
}

#[test]
fn cascade_stops_quietly_when_parent_goal_is_gone() {
    let store = MemoryStore::default();
    store.milestone("m1", "deleted-goal", 0.0, MilestoneStatus::Active);
    store.task("t1", "m1", 0.0, TaskStatus::Pending, None);
    store.checklist("t1", &[true]);

    ProgressEngine::default()
        .recompute_task_progress(&store, "t1")
        .expect("cascade should tolerate a missing goal");

    assert_eq!(
        store.writes(),
        vec![
            Write::Task("t1".to_string()),
            Write::Milestone("m1".to_string())
        ]
    );
}

#[test]
fn store_failures_propagate_unchanged() {
    let store = MemoryStore {
        fail_goal_writes: true,
        ..MemoryStore::default()
    };
    store.goal("g1", GoalStatus::Active);
    store.milestone("m1", "g1", 0.0, MilestoneStatus::Active);
    store.task("t1", "m1", 0.0, TaskStatus::Pending, None);
    store.checklist("t1", &[true, false]);

    let result = ProgressEngine::default().recompute_task_progress(&store, "t1");
    assert_eq!(result, Err(StoreDown));
}

#[test]
fn archived_goal_tracks_progress_by_default() {
    let store = MemoryStore::default();
    store.goal("g1", GoalStatus::Archived);
    store.milestone("m1", "g1", 40.0, MilestoneStatus::Active);

    ProgressEngine::default()
        .recompute_goal_progress(&store, "g1")
        .expect("recompute should succeed");
    assert_eq!(store.goal_state("g1"), (40.0, GoalStatus::Archived));

    store.milestone("m1", "g1", 100.0, MilestoneStatus::Completed);
    ProgressEngine::default()
        .recompute_goal_progress(&store, "g1")
        .expect("recompute should succeed");
    assert_eq!(store.goal_state("g1"), (100.0, GoalStatus::Completed));
}

#[test]
fn frozen_archived_goal_is_left_alone() {
    let store = MemoryStore::default();
    store.goal("g1", GoalStatus::Archived);
    store.milestone("m1", "g1", 100.0, MilestoneStatus::Completed);

    let engine = ProgressEngine::new(&EngineSettings {
        archived_goals: ArchivedGoalPolicy::Freeze,
    });
    engine
        .recompute_goal_progress(&store, "g1")
        .expect("recompute should succeed");

    assert_eq!(store.goal_state("g1"), (0.0, GoalStatus::Archived));
    assert!(store.writes().is_empty());
}
