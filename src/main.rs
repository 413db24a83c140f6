mod app;
mod cli;
mod config;
mod db;
mod domain;
mod engine;
mod guard;
mod store;
mod ui;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_ENV: &str = "GOALPOST_LOG";

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<(), app::AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| app::AppError::InvalidArgument(format!("json output failed: {err}")))?;
    println!("{rendered}");
    Ok(())
}

fn init_logging(default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn run() -> Result<(), app::AppError> {
    use app::{
        CategoryDraft, CategoryPatch, ChecklistDraft, ChecklistPatch, GoalDraft, GoalPatch,
        MilestoneDraft, MilestonePatch, RecomputeTarget, TaskDraft, TaskPatch,
    };
    use clap::Parser;
    use cli::{
        CategorySubcommands, CheckSubcommands, Commands, GoalSubcommands, MilestoneSubcommands,
        NoteSubcommands, RecomputeLevel, TaskSubcommands,
    };

    let cli = cli::Cli::parse();
    let settings = config::Settings::load(cli.config.as_deref())?;
    init_logging(&settings.log.filter);
    tracing::debug!(db = %cli.db, user = %cli.user, "opening store");

    let mut app = app::App::open(&cli.db, &cli.user, &settings)?;

    match cli.command {
        Commands::Goal(args) => match args.command {
            GoalSubcommands::Add(add) => {
                let goal = app.create_goal(GoalDraft {
                    title: add.title,
                    description: add.description,
                    priority: add.priority,
                    category_id: add.category,
                    start_date: add.start_date,
                    end_date: add.end_date,
                })?;
                println!("created {} {}", goal.id, goal.title);
            }
            GoalSubcommands::Ls(list) => {
                let goals = app.list_goals(
                    list.status.as_deref(),
                    list.category.as_deref(),
                    list.limit,
                    list.offset,
                )?;
                if list.json {
                    print_json(&goals)?;
                } else {
                    ui::print_goal_list(&goals);
                }
            }
            GoalSubcommands::Show(show) => {
                let tree = app.show_goal(&show.id)?;
                if show.json {
                    print_json(&tree)?;
                } else {
                    ui::print_goal_tree(&tree);
                }
            }
            GoalSubcommands::Update(update) => {
                let goal = app.update_goal(
                    &update.id,
                    GoalPatch {
                        title: update.title,
                        description: update.description,
                        priority: update.priority,
                        category_id: update.category,
                        status: update.status,
                        start_date: update.start_date,
                        end_date: update.end_date,
                    },
                )?;
                println!("updated {} [{}] {}", goal.id, goal.status, goal.title);
            }
            GoalSubcommands::Rm(target) => {
                app.delete_goal(&target.id)?;
                println!("deleted {}", target.id);
            }
        },
        Commands::Milestone(args) => match args.command {
            MilestoneSubcommands::Add(add) => {
                let milestone = app.create_milestone(
                    &add.goal_id,
                    MilestoneDraft {
                        title: add.title,
                        order_index: add.order_index,
                        start_date: add.start_date,
                        end_date: add.end_date,
                    },
                )?;
                println!("created {} {}", milestone.id, milestone.title);
            }
            MilestoneSubcommands::Ls(list) => {
                let milestones = app.list_milestones(&list.parent_id)?;
                if list.json {
                    print_json(&milestones)?;
                } else {
                    ui::print_milestones(&milestones);
                }
            }
            MilestoneSubcommands::Update(update) => {
                let milestone = app.update_milestone(
                    &update.id,
                    MilestonePatch {
                        title: update.title,
                        order_index: update.order_index,
                        start_date: update.start_date,
                        end_date: update.end_date,
                    },
                )?;
                println!("updated {} {}", milestone.id, milestone.title);
            }
            MilestoneSubcommands::Rm(target) => {
                app.delete_milestone(&target.id)?;
                println!("deleted {}", target.id);
            }
            MilestoneSubcommands::Reorder(reorder) => {
                let milestones = app.reorder_milestones(&reorder.parent_id, &reorder.ids)?;
                ui::print_milestones(&milestones);
            }
        },
        Commands::Task(args) => match args.command {
            TaskSubcommands::Add(add) => {
                let task = app.create_task(
                    &add.milestone_id,
                    TaskDraft {
                        title: add.title,
                        description: add.description,
                        due_date: add.due_date,
                        estimated_time: add.estimated_time,
                    },
                )?;
                println!("created {} {}", task.id, task.title);
            }
            TaskSubcommands::Ls(list) => {
                let tasks = app.list_tasks(&list.parent_id)?;
                if list.json {
                    print_json(&tasks)?;
                } else {
                    ui::print_tasks(&tasks);
                }
            }
            TaskSubcommands::Update(update) => {
                let task = app.update_task(
                    &update.id,
                    TaskPatch {
                        title: update.title,
                        description: update.description,
                        due_date: update.due_date,
                        estimated_time: update.estimated_time,
                        clear_estimate: update.clear_estimate,
                        status: update.status,
                    },
                )?;
                println!(
                    "updated {} [{}] {:.1}% {}",
                    task.id, task.status, task.progress, task.title
                );
            }
            TaskSubcommands::Rm(target) => {
                app.delete_task(&target.id)?;
                println!("deleted {}", target.id);
            }
        },
        Commands::Check(args) => match args.command {
            CheckSubcommands::Add(add) => {
                let item = app.add_checklist_item(
                    &add.task_id,
                    ChecklistDraft {
                        title: add.title,
                        order_index: add.order_index,
                    },
                )?;
                println!("created {} {}", item.id, item.title);
            }
            CheckSubcommands::Ls(list) => {
                let items = app.list_checklist_items(&list.parent_id)?;
                if list.json {
                    print_json(&items)?;
                } else {
                    ui::print_checklist(&items);
                }
            }
            CheckSubcommands::Toggle(target) => {
                let item = app.toggle_checklist_item(&target.id)?;
                let mark = if item.is_completed { "done" } else { "open" };
                println!("{} {} {}", item.id, mark, item.title);
            }
            CheckSubcommands::Update(update) => {
                let item = app.update_checklist_item(
                    &update.id,
                    ChecklistPatch {
                        title: update.title,
                        order_index: update.order_index,
                    },
                )?;
                println!("updated {} {}", item.id, item.title);
            }
            CheckSubcommands::Rm(target) => {
                app.delete_checklist_item(&target.id)?;
                println!("deleted {}", target.id);
            }
            CheckSubcommands::Reorder(reorder) => {
                let items = app.reorder_checklist(&reorder.parent_id, &reorder.ids)?;
                ui::print_checklist(&items);
            }
        },
        Commands::Note(args) => match args.command {
            NoteSubcommands::Add(add) => {
                let note = app.add_note(&add.task_id, &add.content)?;
                println!("created {}", note.id);
            }
            NoteSubcommands::Ls(list) => {
                let notes = app.list_notes(&list.parent_id)?;
                if list.json {
                    print_json(&notes)?;
                } else {
                    ui::print_notes(&notes);
                }
            }
            NoteSubcommands::Update(update) => {
                let note = app.update_note(&update.id, &update.content)?;
                println!("updated {}", note.id);
            }
            NoteSubcommands::Rm(target) => {
                app.delete_note(&target.id)?;
                println!("deleted {}", target.id);
            }
        },
        Commands::Category(args) => match args.command {
            CategorySubcommands::Add(add) => {
                let category = app.create_category(CategoryDraft {
                    name: add.name,
                    color: add.color,
                    icon: add.icon,
                })?;
                println!("created {} {}", category.id, category.name);
            }
            CategorySubcommands::Ls(list) => {
                let categories = app.list_categories()?;
                if list.json {
                    print_json(&categories)?;
                } else {
                    ui::print_categories(&categories);
                }
            }
            CategorySubcommands::Update(update) => {
                let category = app.update_category(
                    &update.id,
                    CategoryPatch {
                        name: update.name,
                        color: update.color,
                        icon: update.icon,
                    },
                )?;
                println!("updated {} {}", category.id, category.name);
            }
            CategorySubcommands::Rm(target) => {
                app.delete_category(&target.id)?;
                println!("deleted {}", target.id);
            }
        },
        Commands::Stats(args) => {
            let report = app.stats()?;
            if args.json {
                print_json(&report)?;
            } else {
                ui::print_stats(&report);
            }
        }
        Commands::Recompute(args) => {
            let target = match args.level {
                RecomputeLevel::Goal => RecomputeTarget::Goal(&args.id),
                RecomputeLevel::Milestone => RecomputeTarget::Milestone(&args.id),
                RecomputeLevel::Task => RecomputeTarget::Task(&args.id),
            };
            let goal = app.recompute(target)?;
            if args.json {
                print_json(&goal)?;
            } else {
                println!(
                    "recomputed {} [{}] {:.1}%",
                    goal.id, goal.status, goal.progress
                );
            }
        }
    }

    Ok(())
}
