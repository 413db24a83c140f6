use std::io::{self, IsTerminal};

use crate::app::{GoalProgressBar, GoalTree, StatsReport};
use crate::db::{
    CategoryRecord, ChecklistItemRecord, GoalRecord, MilestoneRecord, TaskNoteRecord, TaskRecord,
};

const BAR_WIDTH: usize = 20;

pub fn print_goal_list(goals: &[GoalRecord]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Goals"));
    if goals.is_empty() {
        println!("{}", palette.dim("no goals"));
        return;
    }
    for goal in goals {
        println!("{}", format_goal_row(goal, &palette));
    }
    println!("{}", palette.dim(&format!("{} goal(s)", goals.len())));
}

pub fn print_goal_tree(tree: &GoalTree) {
    let palette = Palette::auto();
    for line in goal_tree_lines(tree, &palette) {
        println!("{line}");
    }
}

pub fn print_milestones(milestones: &[MilestoneRecord]) {
    let palette = Palette::auto();
    if milestones.is_empty() {
        println!("{}", palette.dim("no milestones"));
        return;
    }
    for milestone in milestones {
        println!("{}", format_milestone_row(milestone, &palette));
    }
}

pub fn print_tasks(tasks: &[TaskRecord]) {
    let palette = Palette::auto();
    if tasks.is_empty() {
        println!("{}", palette.dim("no tasks"));
        return;
    }
    for task in tasks {
        println!("{}", format_task_row(task, &palette));
    }
}

pub fn print_checklist(items: &[ChecklistItemRecord]) {
    let palette = Palette::auto();
    if items.is_empty() {
        println!("{}", palette.dim("empty checklist"));
        return;
    }
    for item in items {
        println!("{}", format_item_row(item, &palette));
    }
}

pub fn print_notes(notes: &[TaskNoteRecord]) {
    let palette = Palette::auto();
    if notes.is_empty() {
        println!("{}", palette.dim("no notes"));
        return;
    }
    for note in notes {
        println!(
            "{} {}\n  {}",
            palette.id(&note.id),
            palette.dim(&note.updated_at),
            note.content
        );
    }
}

pub fn print_categories(categories: &[CategoryRecord]) {
    let palette = Palette::auto();
    if categories.is_empty() {
        println!("{}", palette.dim("no categories"));
        return;
    }
    for category in categories {
        println!("{}", format_category_row(category, &palette));
    }
}

pub fn print_stats(report: &StatsReport) {
    let palette = Palette::auto();
    for line in stats_lines(report, &palette) {
        println!("{line}");
    }
}

fn stats_lines(report: &StatsReport, palette: &Palette) -> Vec<String> {
    let counts = &report.overview;
    let mut lines = vec![
        palette.heading("Overview"),
        format!(
            "  goals       {} total, {} active, {} completed",
            counts.total_goals, counts.active_goals, counts.completed_goals
        ),
        format!(
            "  milestones  {} total, {} completed",
            counts.total_milestones, counts.completed_milestones
        ),
        format!(
            "  tasks       {} total, {} completed, {} overdue",
            counts.total_tasks, counts.completed_tasks, counts.overdue_tasks
        ),
        palette.heading("Active goals"),
    ];
    if report.goals.is_empty() {
        lines.push(palette.dim("  no active goals"));
    }
    for goal in &report.goals {
        lines.push(format!("  {}", format_progress_bar(goal, palette)));
    }
    lines
}

fn format_progress_bar(goal: &GoalProgressBar, palette: &Palette) -> String {
    let filled = ((goal.progress / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!(
        "{} [{}{}] {} {}",
        palette.id(&goal.id),
        palette.paint("32", &"#".repeat(filled)),
        palette.dim(&"-".repeat(BAR_WIDTH - filled)),
        palette.progress(goal.progress),
        goal.title
    )
}

fn format_category_row(category: &CategoryRecord, palette: &Palette) -> String {
    let mut line = format!("{} {}", palette.id(&category.id), category.name);
    let extras: Vec<&str> = [category.icon.as_deref(), category.color.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !extras.is_empty() {
        line.push(' ');
        line.push_str(&palette.dim(&format!("({})", extras.join(", "))));
    }
    line
}

fn goal_tree_lines(tree: &GoalTree, palette: &Palette) -> Vec<String> {
    let mut lines = vec![format_goal_row(&tree.goal, palette)];
    if let Some(description) = tree.goal.description.as_deref() {
        lines.push(palette.dim(&format!("  {description}")));
    }
    if tree.milestones.is_empty() {
        lines.push(palette.dim("  no milestones"));
    }
    for milestone in &tree.milestones {
        lines.push(format!(
            "{}{}",
            palette.dim("  ↳ "),
            format_milestone_row(&milestone.milestone, palette)
        ));
        for task in &milestone.tasks {
            lines.push(format!(
                "{}{}",
                palette.dim("    ↳ "),
                format_task_row(&task.task, palette)
            ));
            for item in &task.checklist {
                lines.push(format!("      {}", format_item_row(item, palette)));
            }
        }
    }
    lines
}

fn format_goal_row(goal: &GoalRecord, palette: &Palette) -> String {
    format!(
        "{} {} {} {} {}",
        palette.id(&goal.id),
        palette.status(goal.status.as_str()),
        palette.progress(goal.progress),
        goal.title,
        palette.dim(&format!("({})", goal.priority.as_str().to_ascii_lowercase()))
    )
}

fn format_milestone_row(milestone: &MilestoneRecord, palette: &Palette) -> String {
    format!(
        "{} {} {} {}",
        palette.id(&milestone.id),
        palette.status(milestone.status.as_str()),
        palette.progress(milestone.progress),
        milestone.title
    )
}

fn format_task_row(task: &TaskRecord, palette: &Palette) -> String {
    let mut line = format!(
        "{} {} {} {}",
        palette.id(&task.id),
        palette.status(task.status.as_str()),
        palette.progress(task.progress),
        task.title
    );
    if let Some(minutes) = task.estimated_time {
        line.push(' ');
        line.push_str(&palette.dim(&format!("~{minutes}m")));
    }
    if let Some(due) = task.due_date.as_deref() {
        line.push(' ');
        line.push_str(&palette.dim(&format!("due {due}")));
    }
    line
}

fn format_item_row(item: &ChecklistItemRecord, palette: &Palette) -> String {
    let mark = if item.is_completed {
        palette.paint("32", "[x]")
    } else {
        "[ ]".to_string()
    };
    format!("{mark} {} {}", item.title, palette.dim(&item.id))
}

struct Palette {
    enabled: bool,
}

impl Palette {
    fn auto() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    fn id(&self, text: &str) -> String {
        self.paint("1;94", text)
    }

    fn status(&self, status: &str) -> String {
        self.paint(status_color_code(status), &format!("[{status}]"))
    }

    fn progress(&self, progress: f64) -> String {
        self.paint("1", &format!("{progress:>5.1}%"))
    }
}

fn status_color_code(status: &str) -> &'static str {
    match status {
        "COMPLETED" => "32",
        "IN_PROGRESS" | "ACTIVE" => "33",
        "OVERDUE" => "31",
        "ARCHIVED" => "90",
        _ => "37",
    }
}
