use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use uuid::Uuid;

fn unique_workspace(prefix: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{prefix}-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&path).expect("workspace should be creatable");
    path
}

fn run_goalpost(root: &Path, user: &str, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_goalpost"))
        .current_dir(root)
        .env_remove("GOALPOST_DB_PATH")
        .env_remove("GOALPOST_USER")
        .env_remove("GOALPOST_CONFIG")
        .env_remove("GOALPOST_LOG")
        .env("NO_COLOR", "1")
        .arg("--db")
        .arg(root.join("state.sqlite"))
        .arg("--user")
        .arg(user)
        .args(args)
        .output()
        .expect("goalpost command should run")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "expected success but failed.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn assert_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "expected failure but command succeeded.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(output.status.code(), Some(1));
}

fn parse_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON")
}

/// `created <id> ...` lines carry the new id in the second column.
fn created_id(output: &Output) -> String {
    assert_success(output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .split_whitespace()
        .nth(1)
        .expect("created line should include an id")
        .to_string()
}

#[test]
fn builds_hierarchy_and_reports_rolled_up_progress() {
    let root = unique_workspace("goalpost-cli-flow");

    let goal_id = created_id(&run_goalpost(
        &root,
        "alice",
        &["goal", "add", "Run a half marathon", "--priority", "high"],
    ));
    assert!(goal_id.starts_with("G-"));
    let milestone_id = created_id(&run_goalpost(
        &root,
        "alice",
        &["milestone", "add", &goal_id, "Base training"],
    ));
    let long_run = created_id(&run_goalpost(
        &root,
        "alice",
        &["task", "add", &milestone_id, "Long run", "--estimate", "90"],
    ));
    created_id(&run_goalpost(
        &root,
        "alice",
        &["task", "add", &milestone_id, "Stretch", "--estimate", "30"],
    ));
    let warm_up = created_id(&run_goalpost(
        &root,
        "alice",
        &["check", "add", &long_run, "Warm up"],
    ));
    created_id(&run_goalpost(
        &root,
        "alice",
        &["check", "add", &long_run, "Cool down"],
    ));

    assert_success(&run_goalpost(&root, "alice", &["check", "toggle", &warm_up]));

    let shown = run_goalpost(&root, "alice", &["goal", "show", &goal_id, "--json"]);
    assert_success(&shown);
    let tree = parse_json(&shown);
    assert_eq!(tree["id"], goal_id.as_str());
    assert_eq!(tree["priority"], "HIGH");
    assert_eq!(tree["progress"], 37.5);
    assert_eq!(tree["milestones"][0]["progress"], 37.5);
    let tasks = tree["milestones"][0]["tasks"]
        .as_array()
        .expect("tasks should be an array");
    let long = tasks
        .iter()
        .find(|task| task["id"] == long_run.as_str())
        .expect("long run should be listed");
    assert_eq!(long["status"], "IN_PROGRESS");
    assert_eq!(long["progress"], 50.0);
    assert_eq!(long["checklist"][0]["is_completed"], true);

    let plain = run_goalpost(&root, "alice", &["goal", "show", &goal_id]);
    assert_success(&plain);
    let text = String::from_utf8_lossy(&plain.stdout);
    assert!(text.contains("[ACTIVE]  37.5% Run a half marathon"));
    assert!(text.contains("[x] Warm up"));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn manual_completion_and_recompute_round_trip() {
    let root = unique_workspace("goalpost-cli-complete");

    let goal_id = created_id(&run_goalpost(&root, "local", &["goal", "add", "Tidy garage"]));
    let milestone_id = created_id(&run_goalpost(
        &root,
        "local",
        &["milestone", "add", &goal_id, "Sort"],
    ));
    let task_id = created_id(&run_goalpost(
        &root,
        "local",
        &["task", "add", &milestone_id, "Sort tools"],
    ));

    let updated = run_goalpost(
        &root,
        "local",
        &["task", "update", &task_id, "--status", "completed"],
    );
    assert_success(&updated);
    assert!(String::from_utf8_lossy(&updated.stdout).contains("[COMPLETED] 100.0%"));

    let recomputed = run_goalpost(&root, "local", &["recompute", "goal", &goal_id, "--json"]);
    assert_success(&recomputed);
    let goal = parse_json(&recomputed);
    assert_eq!(goal["status"], "COMPLETED");
    assert_eq!(goal["progress"], 100.0);

    let listed = run_goalpost(
        &root,
        "local",
        &["goal", "ls", "--status", "completed", "--json"],
    );
    assert_success(&listed);
    let goals = parse_json(&listed);
    assert_eq!(goals.as_array().map(Vec::len), Some(1));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn notes_are_listed_and_removed() {
    let root = unique_workspace("goalpost-cli-notes");

    let goal_id = created_id(&run_goalpost(&root, "local", &["goal", "add", "Learn Go"]));
    let milestone_id = created_id(&run_goalpost(
        &root,
        "local",
        &["milestone", "add", &goal_id, "Basics"],
    ));
    let task_id = created_id(&run_goalpost(
        &root,
        "local",
        &["task", "add", &milestone_id, "Tour"],
    ));
    let note_id = created_id(&run_goalpost(
        &root,
        "local",
        &["note", "add", &task_id, "Finished the first half"],
    ));

    let listed = run_goalpost(&root, "local", &["note", "ls", &task_id, "--json"]);
    assert_success(&listed);
    let notes = parse_json(&listed);
    assert_eq!(notes[0]["content"], "Finished the first half");

    assert_success(&run_goalpost(&root, "local", &["note", "rm", &note_id]));
    let listed = run_goalpost(&root, "local", &["note", "ls", &task_id, "--json"]);
    assert_success(&listed);
    assert_eq!(parse_json(&listed).as_array().map(Vec::len), Some(0));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn foreign_and_invalid_requests_fail_with_exit_code_one() {
    let root = unique_workspace("goalpost-cli-errors");

    let goal_id = created_id(&run_goalpost(&root, "alice", &["goal", "add", "Mine"]));

    let foreign = run_goalpost(&root, "bob", &["goal", "show", &goal_id]);
    assert_failure(&foreign);
    let stderr = String::from_utf8_lossy(&foreign.stderr);
    assert!(stderr.contains("error: goal"));
    assert!(stderr.contains("not found"));

    let blank = run_goalpost(&root, "alice", &["goal", "add", "   "]);
    assert_failure(&blank);
    assert!(String::from_utf8_lossy(&blank.stderr).contains("title cannot be empty"));

    let bad_status = run_goalpost(
        &root,
        "alice",
        &["goal", "update", &goal_id, "--status", "paused"],
    );
    assert_failure(&bad_status);
    assert!(String::from_utf8_lossy(&bad_status.stderr).contains("invalid goal status 'paused'"));

    let bad_limit = run_goalpost(&root, "alice", &["goal", "ls", "--limit", "0"]);
    assert_failure(&bad_limit);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn config_file_rejects_unknown_keys() {
    let root = unique_workspace("goalpost-cli-config");
    let config = root.join("goalpost.toml");
    std::fs::write(&config, "[engine]\nunknown = true\n").expect("config should be writable");

    let output = run_goalpost(
        &root,
        "local",
        &["--config", config.to_str().expect("utf8 path"), "goal", "ls"],
    );
    assert_failure(&output);
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid config TOML"));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn categories_filter_goals_and_stats_report_progress() {
    let root = unique_workspace("goalpost-cli-stats");

    let category_id = created_id(&run_goalpost(
        &root,
        "alice",
        &["category", "add", "Health", "--color", "#22aa55"],
    ));
    assert!(category_id.starts_with("CAT-"));
    let tagged = created_id(&run_goalpost(
        &root,
        "alice",
        &["goal", "add", "Run 10k", "--category", &category_id],
    ));
    created_id(&run_goalpost(&root, "alice", &["goal", "add", "Read more"]));
    let milestone_id = created_id(&run_goalpost(
        &root,
        "alice",
        &["milestone", "add", &tagged, "Build up"],
    ));
    let task_id = created_id(&run_goalpost(
        &root,
        "alice",
        &["task", "add", &milestone_id, "5k"],
    ));
    created_id(&run_goalpost(
        &root,
        "alice",
        &["task", "add", &milestone_id, "8k"],
    ));
    assert_success(&run_goalpost(
        &root,
        "alice",
        &["task", "update", &task_id, "--status", "completed"],
    ));

    let filtered = run_goalpost(
        &root,
        "alice",
        &["goal", "ls", "--category", &category_id, "--json"],
    );
    assert_success(&filtered);
    let goals = parse_json(&filtered);
    assert_eq!(goals.as_array().map(Vec::len), Some(1));
    assert_eq!(goals[0]["id"], tagged.as_str());
    assert_eq!(goals[0]["category_id"], category_id.as_str());

    let stats = run_goalpost(&root, "alice", &["stats", "--json"]);
    assert_success(&stats);
    let report = parse_json(&stats);
    assert_eq!(report["overview"]["total_goals"], 2);
    assert_eq!(report["overview"]["active_goals"], 2);
    assert_eq!(report["overview"]["total_tasks"], 2);
    assert_eq!(report["overview"]["completed_tasks"], 1);
    let bars = report["goals"].as_array().expect("goals should be an array");
    assert_eq!(bars.len(), 2);
    let run = bars
        .iter()
        .find(|bar| bar["id"] == tagged.as_str())
        .expect("tagged goal should have a bar");
    assert_eq!(run["progress"], 50.0);
    assert_eq!(run["status"], "ACTIVE");

    let plain = run_goalpost(&root, "alice", &["stats"]);
    assert_success(&plain);
    assert!(String::from_utf8_lossy(&plain.stdout).contains("50.0% Run 10k"));

    let foreign = run_goalpost(&root, "bob", &["category", "rm", &category_id]);
    assert_failure(&foreign);
    assert!(String::from_utf8_lossy(&foreign.stderr).contains("category"));

    assert_success(&run_goalpost(&root, "alice", &["category", "rm", &category_id]));
    let listed = run_goalpost(&root, "alice", &["category", "ls", "--json"]);
    assert_success(&listed);
    assert_eq!(parse_json(&listed).as_array().map(Vec::len), Some(0));

    let _ = std::fs::remove_dir_all(root);
}
