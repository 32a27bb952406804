//! CLI interface for wardbuddy

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use crate::config::{self, Config};
use crate::learning::{
    Completion, LearningCategory, LearningContextStore, LoadOutcome, PersistOutcome, SmartGoal,
};

#[derive(Parser)]
#[command(name = "wardbuddy")]
#[command(about = "Track clinical rotations and SMART learning goals", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Context file to use instead of the configured one
    #[arg(short, long, global = true)]
    pub context: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show or change the current rotation
    Rotation {
        #[command(subcommand)]
        command: RotationCommands,
    },
    /// Manage the active goal
    Goal {
        #[command(subcommand)]
        command: GoalCommands,
    },
    /// List goals recorded for the current rotation
    Goals,
    /// Show progress per category
    Summary {
        /// Completed goals to list per category
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum RotationCommands {
    /// Show the current rotation
    Show,
    /// Replace the current rotation
    Set {
        /// Specialty, e.g. "Emergency Medicine"
        #[arg(long)]
        specialty: String,
        /// Setting, e.g. clinic, ward, ED
        #[arg(long)]
        setting: String,
    },
}

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Start a new goal (replaces any active goal)
    Add {
        /// Category, e.g. history_taking or "Clinical Reasoning"
        #[arg(long, value_parser = parse_category)]
        category: LearningCategory,
        /// Goal as the learner phrased it
        #[arg(long)]
        input: String,
        /// SMART reformulation (defaults to the input)
        #[arg(long)]
        smart: Option<String>,
        /// Goal identifier (generated when omitted)
        #[arg(long)]
        id: Option<String>,
    },
    /// Mark the active goal complete
    Complete,
    /// Show the active goal
    Active,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Write a default configuration file
    Init,
}

fn parse_category(s: &str) -> Result<LearningCategory, String> {
    s.parse()
}

/// Run a parsed command line
pub fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Show => config::show_config(&config)?,
            ConfigCommands::Path => println!("{}", config::config_path()?.display()),
            ConfigCommands::Init => config::reset_config()?,
        },
        Commands::Rotation { command } => {
            let mut store = open_store(&config, cli.context)?;
            match command {
                RotationCommands::Show => {
                    let rotation = store.rotation();
                    if cli.json {
                        print_json(rotation)?;
                    } else if rotation.specialty.is_empty() && rotation.setting.is_empty() {
                        println!("No rotation set.");
                    } else {
                        println!("Rotation: {} ({})", rotation.specialty, rotation.setting);
                    }
                }
                RotationCommands::Set { specialty, setting } => {
                    check_persisted(store.update_rotation(&specialty, &setting))?;
                    if cli.json {
                        print_json(store.rotation())?;
                    } else {
                        println!("Rotation set to {} ({})", specialty, setting);
                    }
                }
            }
        }
        Commands::Goal { command } => {
            let mut store = open_store(&config, cli.context)?;
            match command {
                GoalCommands::Add { category, input, smart, id } => {
                    let smart = smart.unwrap_or_else(|| input.clone());
                    let mut goal = SmartGoal::new(category, &input, &smart, store.rotation(), Utc::now());
                    if let Some(id) = id {
                        goal.id = id;
                    }
                    let added = store.add_smart_goal(goal);
                    check_persisted(added.persist)?;
                    let active = store.active_goal().context("Goal was not made active")?;
                    if cli.json {
                        print_json(&goal_added_json(active, added.abandoned.as_ref()))?;
                    } else {
                        if let Some(abandoned) = &added.abandoned {
                            println!("Replaced unfinished goal {}: {}", abandoned.id, abandoned.smart_version);
                        }
                        println!("Active goal {} ({})", active.id, category);
                    }
                }
                GoalCommands::Complete => match store.complete_active_goal() {
                    Completion::NoActiveGoal if cli.json => print_json(&serde_json::json!({ "completed": null }))?,
                    Completion::NoActiveGoal => println!("No active goal."),
                    Completion::Completed { goal, persist } => {
                        check_persisted(persist)?;
                        if cli.json {
                            print_json(&goal)?;
                        } else {
                            println!("Completed {} goal: {}", goal.category, goal.smart_version);
                        }
                    }
                },
                GoalCommands::Active => match store.active_goal() {
                    Some(goal) if cli.json => print_json(goal)?,
                    Some(goal) => {
                        println!("{} [{}]", goal.id, goal.category);
                        println!("  {}", goal.smart_version);
                        println!("  started {} in {} ({})", goal.created_at.format("%Y-%m-%d %H:%M UTC"), goal.specialty, goal.setting);
                    }
                    None => println!("No active goal."),
                },
            }
        }
        Commands::Goals => {
            let store = open_store(&config, cli.context)?;
            let records = store.get_all_goals();
            if cli.json {
                print_json(&records)?;
            } else if records.is_empty() {
                println!("No goals for this rotation.");
            } else {
                println!("{} goals:", records.len());
                for record in &records {
                    let status = if record.active { "active" } else { "done" };
                    println!("  {} [{}] ({}) {}", record.goal.created_at.format("%Y-%m-%d"), status, record.goal.category, record.goal.smart_version);
                }
            }
        }
        Commands::Summary { limit } => {
            let store = open_store(&config, cli.context)?;
            let limit = limit.unwrap_or(config.summary.recent_goals);
            let summary = store.category_summary_with_limit(limit);
            if cli.json {
                print_json(&summary.values().collect::<Vec<_>>())?;
            } else {
                println!("Learning Progress");
                println!("=================");
                for (category, row) in summary.iter() {
                    println!("{:<20} {}/{} completed", category.label(), row.completed, row.total);
                    for recent in &row.recent_goals {
                        let when = recent.completed_at
                            .map(|t| t.format("%Y-%m-%d").to_string())
                            .unwrap_or_else(|| "unknown".to_string());
                        println!("    {} {}", when, recent.smart_version);
                    }
                }
            }
        }
    }

    Ok(())
}

/// Open the context store, refusing to continue over an unreadable file
fn open_store(config: &Config, override_path: Option<PathBuf>) -> Result<LearningContextStore> {
    let path = config.context_path(override_path.as_deref())?;
    let store = LearningContextStore::new(Some(path.clone()));
    if let LoadOutcome::Failed(e) = store.initial_load() {
        anyhow::bail!("Could not load learning context from {}: {}", path.display(), e);
    }
    Ok(store)
}

fn goal_added_json(active: &SmartGoal, abandoned: Option<&SmartGoal>) -> serde_json::Value {
    serde_json::json!({
        "active_goal": active,
        "abandoned_goal": abandoned,
    })
}

fn check_persisted(outcome: PersistOutcome) -> Result<()> {
    match outcome {
        PersistOutcome::Failed(e) => Err::<(), _>(e).context("Change applied but could not be saved"),
        PersistOutcome::Saved | PersistOutcome::NotConfigured => Ok(()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Failed to serialize output")?);
    Ok(())
}
