use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, Parser, Subcommand, ValueEnum};

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

#[derive(Debug, Parser)]
#[command(name = "goalpost")]
#[command(bin_name = "goalpost")]
#[command(version)]
#[command(about = "Goals, milestones, tasks and checklists with rolled-up progress")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'd',
        long,
        global = true,
        env = "GOALPOST_DB_PATH",
        default_value = ".goalpost/state.sqlite",
        help = "Path to the SQLite database."
    )]
    pub db: String,

    #[arg(
        short = 'u',
        long,
        global = true,
        env = "GOALPOST_USER",
        default_value = "local",
        help = "Acting user; only goals owned by this user are visible."
    )]
    pub user: String,

    #[arg(
        short = 'c',
        long,
        global = true,
        env = "GOALPOST_CONFIG",
        help = "Path to a TOML config file (default: .goalpost/config.toml if present)."
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Create, list, inspect and edit goals.")]
    Goal(GoalArgs),
    #[command(about = "Manage the milestones of a goal.")]
    Milestone(MilestoneArgs),
    #[command(about = "Manage the tasks of a milestone.")]
    Task(TaskArgs),
    #[command(about = "Manage the checklist of a task.")]
    Check(CheckArgs),
    #[command(about = "Manage free-form notes on a task.")]
    Note(NoteArgs),
    #[command(about = "Manage categories for grouping goals.")]
    Category(CategoryArgs),
    #[command(about = "Recompute rolled-up progress from one level upward.")]
    Recompute(RecomputeArgs),
    #[command(about = "Show dashboard counts and active goal progress.")]
    Stats(StatsArgs),
}

#[derive(Debug, Args)]
pub struct GoalArgs {
    #[command(subcommand)]
    pub command: GoalSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum GoalSubcommands {
    #[command(about = "Create a goal.")]
    Add(GoalAddArgs),
    #[command(about = "List goals, newest first.")]
    Ls(GoalListArgs),
    #[command(about = "Show a goal with its milestones, tasks and checklists.")]
    Show(ShowArgs),
    #[command(about = "Update goal fields.")]
    Update(GoalUpdateArgs),
    #[command(about = "Delete a goal and everything under it.")]
    Rm(IdArgs),
}

#[derive(Debug, Args)]
pub struct GoalAddArgs {
    #[arg(help = "Goal title.")]
    pub title: String,

    #[arg(long = "desc", help = "Optional description text.")]
    pub description: Option<String>,

    #[arg(short = 'p', long, help = "LOW, MEDIUM (default) or HIGH.")]
    pub priority: Option<String>,

    #[arg(long, help = "Category id.")]
    pub category: Option<String>,

    #[arg(long = "start", help = "Start date (RFC3339).")]
    pub start_date: Option<String>,

    #[arg(long = "end", help = "End date (RFC3339).")]
    pub end_date: Option<String>,
}

#[derive(Debug, Args)]
pub struct GoalListArgs {
    #[arg(short = 's', long, help = "Only goals in this status.")]
    pub status: Option<String>,

    #[arg(long, help = "Only goals in this category.")]
    pub category: Option<String>,

    #[arg(short = 'n', long, default_value_t = 20, help = "Maximum goals to list (1-100).")]
    pub limit: u32,

    #[arg(long, default_value_t = 0, help = "Goals to skip.")]
    pub offset: u32,

    #[arg(long, help = "Print JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct GoalUpdateArgs {
    #[arg(help = "Goal id.")]
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long = "desc", help = "New description; empty clears it.")]
    pub description: Option<String>,

    #[arg(short = 'p', long)]
    pub priority: Option<String>,

    #[arg(long, help = "Category id; empty clears it.")]
    pub category: Option<String>,

    #[arg(short = 's', long, help = "ACTIVE, COMPLETED or ARCHIVED.")]
    pub status: Option<String>,

    #[arg(long = "start", help = "Start date (RFC3339); empty clears it.")]
    pub start_date: Option<String>,

    #[arg(long = "end", help = "End date (RFC3339); empty clears it.")]
    pub end_date: Option<String>,
}

#[derive(Debug, Args)]
pub struct MilestoneArgs {
    #[command(subcommand)]
    pub command: MilestoneSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum MilestoneSubcommands {
    #[command(about = "Add a milestone to a goal.")]
    Add(MilestoneAddArgs),
    #[command(about = "List the milestones of a goal in order.")]
    Ls(ParentListArgs),
    #[command(about = "Update milestone fields.")]
    Update(MilestoneUpdateArgs),
    #[command(about = "Delete a milestone and its tasks.")]
    Rm(IdArgs),
    #[command(about = "Set milestone order from a list of ids.")]
    Reorder(ReorderArgs),
}

#[derive(Debug, Args)]
pub struct MilestoneAddArgs {
    #[arg(help = "Goal id.")]
    pub goal_id: String,

    #[arg(help = "Milestone title.")]
    pub title: String,

    #[arg(short = 'o', long = "order", help = "Position within the goal.")]
    pub order_index: Option<i64>,

    #[arg(long = "start", help = "Start date (RFC3339).")]
    pub start_date: Option<String>,

    #[arg(long = "end", help = "End date (RFC3339).")]
    pub end_date: Option<String>,
}

#[derive(Debug, Args)]
pub struct MilestoneUpdateArgs {
    #[arg(help = "Milestone id.")]
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(short = 'o', long = "order")]
    pub order_index: Option<i64>,

    #[arg(long = "start", help = "Start date (RFC3339); empty clears it.")]
    pub start_date: Option<String>,

    #[arg(long = "end", help = "End date (RFC3339); empty clears it.")]
    pub end_date: Option<String>,
}

#[derive(Debug, Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum TaskSubcommands {
    #[command(about = "Add a task to a milestone.")]
    Add(TaskAddArgs),
    #[command(about = "List the tasks of a milestone.")]
    Ls(ParentListArgs),
    #[command(about = "Update task fields or status.")]
    Update(TaskUpdateArgs),
    #[command(about = "Delete a task and its checklist.")]
    Rm(IdArgs),
}

#[derive(Debug, Args)]
pub struct TaskAddArgs {
    #[arg(help = "Milestone id.")]
    pub milestone_id: String,

    #[arg(help = "Task title.")]
    pub title: String,

    #[arg(long = "desc", help = "Optional description text.")]
    pub description: Option<String>,

    #[arg(long = "due", help = "Due date (RFC3339).")]
    pub due_date: Option<String>,

    #[arg(
        short = 'e',
        long = "estimate",
        allow_hyphen_values = true,
        help = "Estimated minutes; weights the task in its milestone."
    )]
    pub estimated_time: Option<i64>,
}

#[derive(Debug, Args)]
pub struct TaskUpdateArgs {
    #[arg(help = "Task id.")]
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long = "desc", help = "New description; empty clears it.")]
    pub description: Option<String>,

    #[arg(long = "due", help = "Due date (RFC3339); empty clears it.")]
    pub due_date: Option<String>,

    #[arg(short = 'e', long = "estimate", allow_hyphen_values = true)]
    pub estimated_time: Option<i64>,

    #[arg(long, conflicts_with = "estimated_time", help = "Remove the estimate.")]
    pub clear_estimate: bool,

    #[arg(
        short = 's',
        long,
        help = "PENDING, IN_PROGRESS, COMPLETED or OVERDUE."
    )]
    pub status: Option<String>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[command(subcommand)]
    pub command: CheckSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum CheckSubcommands {
    #[command(about = "Add a checklist item to a task.")]
    Add(CheckAddArgs),
    #[command(about = "List the checklist of a task.")]
    Ls(ParentListArgs),
    #[command(about = "Flip an item between done and not done.")]
    Toggle(IdArgs),
    #[command(about = "Rename or move a checklist item.")]
    Update(CheckUpdateArgs),
    #[command(about = "Delete a checklist item.")]
    Rm(IdArgs),
    #[command(about = "Set checklist order from a list of ids.")]
    Reorder(ReorderArgs),
}

#[derive(Debug, Args)]
pub struct CheckAddArgs {
    #[arg(help = "Task id.")]
    pub task_id: String,

    #[arg(help = "Item title.")]
    pub title: String,

    #[arg(short = 'o', long = "order", help = "Position within the checklist.")]
    pub order_index: Option<i64>,
}

#[derive(Debug, Args)]
pub struct CheckUpdateArgs {
    #[arg(help = "Checklist item id.")]
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(short = 'o', long = "order")]
    pub order_index: Option<i64>,
}

#[derive(Debug, Args)]
pub struct NoteArgs {
    #[command(subcommand)]
    pub command: NoteSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum NoteSubcommands {
    #[command(about = "Attach a note to a task.")]
    Add(NoteAddArgs),
    #[command(about = "List the notes of a task, newest first.")]
    Ls(ParentListArgs),
    #[command(about = "Replace the content of a note.")]
    Update(NoteUpdateArgs),
    #[command(about = "Delete a note.")]
    Rm(IdArgs),
}

#[derive(Debug, Args)]
pub struct NoteAddArgs {
    #[arg(help = "Task id.")]
    pub task_id: String,

    #[arg(help = "Note content.")]
    pub content: String,
}

#[derive(Debug, Args)]
pub struct NoteUpdateArgs {
    #[arg(help = "Note id.")]
    pub id: String,

    #[arg(help = "New content.")]
    pub content: String,
}

#[derive(Debug, Args)]
pub struct CategoryArgs {
    #[command(subcommand)]
    pub command: CategorySubcommands,
}

#[derive(Debug, Subcommand)]
pub enum CategorySubcommands {
    #[command(about = "Create a category.")]
    Add(CategoryAddArgs),
    #[command(about = "List categories by name.")]
    Ls(JsonArgs),
    #[command(about = "Update category fields.")]
    Update(CategoryUpdateArgs),
    #[command(about = "Delete a category; its goals become uncategorized.")]
    Rm(IdArgs),
}

#[derive(Debug, Args)]
pub struct CategoryAddArgs {
    #[arg(help = "Category name.")]
    pub name: String,

    #[arg(long, help = "Display color, e.g. #22aa55.")]
    pub color: Option<String>,

    #[arg(long, help = "Icon name.")]
    pub icon: Option<String>,
}

#[derive(Debug, Args)]
pub struct CategoryUpdateArgs {
    #[arg(help = "Category id.")]
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, help = "New color; empty clears it.")]
    pub color: Option<String>,

    #[arg(long, help = "New icon; empty clears it.")]
    pub icon: Option<String>,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[arg(long, help = "Print JSON output.")]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecomputeLevel {
    Goal,
    Milestone,
    Task,
}

#[derive(Debug, Args)]
pub struct RecomputeArgs {
    #[arg(value_enum, help = "Level the id refers to.")]
    pub level: RecomputeLevel,

    #[arg(help = "Goal, milestone or task id.")]
    pub id: String,

    #[arg(long, help = "Print the resulting goal as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[arg(help = "Entity id.")]
    pub id: String,

    #[arg(long, help = "Print JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ParentListArgs {
    #[arg(help = "Parent id.")]
    pub parent_id: String,

    #[arg(long, help = "Print JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct JsonArgs {
    #[arg(long, help = "Print JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    #[arg(help = "Entity id.")]
    pub id: String,
}

#[derive(Debug, Args)]
pub struct ReorderArgs {
    #[arg(help = "Parent id.")]
    pub parent_id: String,

    #[arg(required = true, num_args = 1.., help = "Child ids in their new order.")]
    pub ids: Vec<String>,
}
