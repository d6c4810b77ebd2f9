//! Command-line argument definitions using clap's derive API.
//!
//! Argument structs carry the clap attributes and convert into the
//! framework-free parameter types of `loopz_core::params`:
//!
//! ```text
//! User Input → CLI Args (clap) → Core Params → Stores
//! ```

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use loopz_core::{
    models::{LoopFilter, LoopStatus, TaskStatus},
    params::{CreateLoop, CreateTask, ReorderTasks, UpdateLoop, UpdateTask},
};

/// Loopz: turn goals into loops of small tasks
///
/// Manage loops and their tasks from the command line, or start an
/// interactive chat where the assistant can propose new loops.
#[derive(Parser)]
#[command(version, about, name = "lz")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/loopz/loopz.db
    #[arg(long, global = true, conflicts_with = "in_memory")]
    pub database_file: Option<PathBuf>,

    /// Keep everything in memory for this run only
    #[arg(long, global = true)]
    pub in_memory: bool,

    /// User whose loops are shown and modified
    #[arg(long, global = true, env = "LOOPZ_USER", default_value = "local")]
    pub user: String,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for the Loopz CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Manage loops
    #[command(alias = "l")]
    Loop {
        #[command(subcommand)]
        command: LoopCommands,
    },
    /// Manage the tasks of a loop
    #[command(alias = "t")]
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Talk to the assistant
    #[command(alias = "c")]
    Chat,
}

/// Create a new loop
#[derive(ClapArgs)]
pub struct CreateLoopArgs {
    /// Title of the loop
    pub title: String,
    /// Optional description providing more context about the loop
    #[arg(short, long)]
    pub description: Option<String>,
}

impl From<CreateLoopArgs> for CreateLoop {
    fn from(val: CreateLoopArgs) -> Self {
        CreateLoop {
            title: val.title,
            description: val.description,
        }
    }
}

/// List loops with their progress
///
/// Archived loops are hidden unless `--all` is given or `--status
/// archived` asks for them explicitly.
#[derive(ClapArgs)]
pub struct ListLoopsArgs {
    /// Only show loops with this status
    #[arg(short, long)]
    pub status: Option<LoopStatusArg>,
    /// Include archived loops
    #[arg(long)]
    pub all: bool,
    /// Only show loops whose title contains this text (case-insensitive)
    #[arg(long)]
    pub search: Option<String>,
}

impl From<ListLoopsArgs> for LoopFilter {
    fn from(val: ListLoopsArgs) -> Self {
        let mut filter = match val.status {
            Some(status) => LoopFilter::with_status(status.into()),
            None => LoopFilter::default(),
        };
        filter.include_archived |= val.all;
        filter.title_contains = val.search;
        filter
    }
}

/// Show a loop with its progress and tasks
#[derive(ClapArgs)]
pub struct ShowLoopArgs {
    /// ID of the loop to display
    pub id: String,
}

/// Update a loop's title, description or status
///
/// Marking a loop completed records its completion time.
#[derive(ClapArgs)]
pub struct UpdateLoopArgs {
    /// ID of the loop to update
    pub id: String,
    #[arg(short, long, help = "New title for the loop")]
    pub title: Option<String>,
    #[arg(short, long, help = "New description; pass an empty string to clear it")]
    pub description: Option<String>,
    #[arg(short, long, help = "New status (active, completed, archived)")]
    pub status: Option<LoopStatusArg>,
}

impl From<UpdateLoopArgs> for UpdateLoop {
    fn from(val: UpdateLoopArgs) -> Self {
        UpdateLoop {
            id: val.id,
            title: val.title,
            description: val.description,
            status: val.status.map(Into::into),
        }
    }
}

/// Delete a loop and all of its tasks
#[derive(ClapArgs)]
pub struct DeleteLoopArgs {
    /// ID of the loop to delete
    pub id: String,
    /// Confirm the deletion (required to prevent accidental deletion)
    #[arg(long)]
    pub confirm: bool,
}

#[derive(Subcommand)]
pub enum LoopCommands {
    /// Create a new loop
    #[command(alias = "c")]
    Create(CreateLoopArgs),
    /// List loops with their progress
    #[command(aliases = ["l", "ls"])]
    List(ListLoopsArgs),
    /// Show a loop with its progress and tasks
    #[command(alias = "s")]
    Show(ShowLoopArgs),
    /// Update a loop
    #[command(alias = "u")]
    Update(UpdateLoopArgs),
    /// Delete a loop and all of its tasks
    #[command(aliases = ["d", "rm"])]
    Delete(DeleteLoopArgs),
}

/// Append a task to a loop
#[derive(ClapArgs)]
pub struct AddTaskArgs {
    /// ID of the loop to add the task to
    pub loop_id: String,
    /// Title of the task
    pub title: String,
    /// Optional description of what needs to be done
    #[arg(short, long)]
    pub description: Option<String>,
}

impl From<AddTaskArgs> for CreateTask {
    fn from(val: AddTaskArgs) -> Self {
        CreateTask {
            loop_id: val.loop_id,
            title: val.title,
            description: val.description,
        }
    }
}

/// List the tasks of a loop in order
#[derive(ClapArgs)]
pub struct ListTasksArgs {
    /// ID of the loop whose tasks to list
    pub loop_id: String,
}

/// Update a task's title, description or status
///
/// Completing a task records its completion time once; reopening it keeps
/// that time.
#[derive(ClapArgs)]
pub struct UpdateTaskArgs {
    /// ID of the task to update
    pub id: String,
    #[arg(short, long, help = "New title for the task")]
    pub title: Option<String>,
    #[arg(short, long, help = "New description; pass an empty string to clear it")]
    pub description: Option<String>,
    #[arg(short, long, help = "New status (pending, in-progress, completed, cancelled)")]
    pub status: Option<TaskStatusArg>,
}

impl From<UpdateTaskArgs> for UpdateTask {
    fn from(val: UpdateTaskArgs) -> Self {
        UpdateTask {
            id: val.id,
            title: val.title,
            description: val.description,
            status: val.status.map(Into::into),
        }
    }
}

/// Delete a task
#[derive(ClapArgs)]
pub struct DeleteTaskArgs {
    /// ID of the task to delete
    pub id: String,
}

/// Put the tasks of a loop in a new order
///
/// Tasks left out of the list keep their relative order after the listed
/// ones.
#[derive(ClapArgs)]
pub struct ReorderTasksArgs {
    /// ID of the loop whose tasks to reorder
    pub loop_id: String,
    /// Task IDs in the desired order
    #[arg(required = true, num_args = 1..)]
    pub task_ids: Vec<String>,
}

impl From<ReorderTasksArgs> for ReorderTasks {
    fn from(val: ReorderTasksArgs) -> Self {
        ReorderTasks {
            loop_id: val.loop_id,
            task_ids: val.task_ids,
        }
    }
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Append a task to a loop
    #[command(alias = "a")]
    Add(AddTaskArgs),
    /// List the tasks of a loop
    #[command(aliases = ["l", "ls"])]
    List(ListTasksArgs),
    /// Update a task
    #[command(alias = "u")]
    Update(UpdateTaskArgs),
    /// Delete a task
    #[command(aliases = ["d", "rm"])]
    Delete(DeleteTaskArgs),
    /// Reorder the tasks of a loop
    #[command(alias = "r")]
    Reorder(ReorderTasksArgs),
}

/// Command-line representation of loop status values
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LoopStatusArg {
    Active,
    Completed,
    Archived,
}

impl From<LoopStatusArg> for LoopStatus {
    fn from(val: LoopStatusArg) -> Self {
        match val {
            LoopStatusArg::Active => LoopStatus::Active,
            LoopStatusArg::Completed => LoopStatus::Completed,
            LoopStatusArg::Archived => LoopStatus::Archived,
        }
    }
}

/// Command-line representation of task status values
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum TaskStatusArg {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl From<TaskStatusArg> for TaskStatus {
    fn from(val: TaskStatusArg) -> Self {
        match val {
            TaskStatusArg::Pending => TaskStatus::Pending,
            TaskStatusArg::InProgress => TaskStatus::InProgress,
            TaskStatusArg::Completed => TaskStatus::Completed,
            TaskStatusArg::Cancelled => TaskStatus::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_args_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_list_args_build_filter() {
        let filter = LoopFilter::from(ListLoopsArgs {
            status: None,
            all: true,
            search: Some("book".to_string()),
        });
        assert!(filter.include_archived);
        assert_eq!(filter.status, None);
        assert_eq!(filter.title_contains.as_deref(), Some("book"));

        let archived = LoopFilter::from(ListLoopsArgs {
            status: Some(LoopStatusArg::Archived),
            all: false,
            search: None,
        });
        assert_eq!(archived.status, Some(LoopStatus::Archived));
        assert!(archived.include_archived);
    }

    #[test]
    fn test_user_defaults_to_local() {
        let args = Args::try_parse_from(["lz", "--in-memory", "loop", "list"])
            .expect("Arguments should parse");
        // LOOPZ_USER may be set in the environment running the tests
        let expected = std::env::var("LOOPZ_USER").unwrap_or_else(|_| "local".to_string());
        assert_eq!(args.user, expected);
        assert!(args.in_memory);
    }
}
