//! One-shot command handlers.
//!
//! Each handler turns parsed arguments into core parameters, runs the
//! operation against the [`Workspace`] stores and renders the outcome as
//! markdown through the [`TerminalRenderer`].

use anyhow::{bail, Context, Result};
use loopz_core::{
    display::{CreateResult, DeleteResult, LoopOverview, OperationStatus, TaskList, UpdateResult},
    models::{Loop, LoopFilter, Task},
    params::{CreateLoop, CreateTask, ReorderTasks, UpdateLoop, UpdateTask},
    Workspace,
};
use log::debug;

use crate::{
    args::{
        AddTaskArgs, DeleteLoopArgs, DeleteTaskArgs, ListTasksArgs, LoopCommands,
        ReorderTasksArgs, ShowLoopArgs, TaskCommands, UpdateLoopArgs, UpdateTaskArgs,
    },
    renderer::TerminalRenderer,
};

pub struct Cli {
    workspace: Workspace,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(workspace: Workspace, renderer: TerminalRenderer) -> Self {
        Self {
            workspace,
            renderer,
        }
    }

    pub async fn handle_loop_command(&self, command: LoopCommands) -> Result<()> {
        match command {
            LoopCommands::Create(args) => self.create_loop(args.into()).await,
            LoopCommands::List(args) => self.list_loops(&args.into()).await,
            LoopCommands::Show(args) => self.show_loop(args).await,
            LoopCommands::Update(args) => self.update_loop(args).await,
            LoopCommands::Delete(args) => self.delete_loop(args).await,
        }
    }

    pub async fn handle_task_command(&self, command: TaskCommands) -> Result<()> {
        match command {
            TaskCommands::Add(args) => self.add_task(args).await,
            TaskCommands::List(args) => self.list_tasks(args).await,
            TaskCommands::Update(args) => self.update_task(args).await,
            TaskCommands::Delete(args) => self.delete_task(args).await,
            TaskCommands::Reorder(args) => self.reorder_tasks(args).await,
        }
    }

    /// Renders the loops passing `filter` with their progress.
    pub async fn list_loops(&self, filter: &LoopFilter) -> Result<()> {
        let overview = LoopOverview(self.workspace.loops_with_progress(filter).await);
        debug!("Listing {} loops", overview.len());
        let title = if filter.include_archived {
            "# All Loops"
        } else {
            "# Active Loops"
        };
        self.renderer.render(&format!("{title}\n\n{overview}"))
    }

    async fn create_loop(&self, params: CreateLoop) -> Result<()> {
        let id = self
            .workspace
            .loops()
            .create(&params)
            .await
            .context("Failed to create loop")?;
        let record = self.find_loop(&id).await?;
        self.renderer.render(&CreateResult::new(record).to_string())
    }

    async fn show_loop(&self, args: ShowLoopArgs) -> Result<()> {
        let Some(view) = self.workspace.loop_with_progress(&args.id).await else {
            bail!("Loop with ID {} not found", args.id);
        };
        let tasks = TaskList(self.workspace.tasks().get_by_loop_id(&args.id).await);
        self.renderer.render(&format!("{view}\n## Tasks\n\n{tasks}"))
    }

    async fn update_loop(&self, args: UpdateLoopArgs) -> Result<()> {
        let params = UpdateLoop::from(args);
        let before = self.find_loop(&params.id).await?;
        if params.is_empty() {
            return self
                .renderer
                .render(&OperationStatus::notice("Nothing to update").to_string());
        }

        self.workspace
            .loops()
            .update(&params)
            .await
            .context("Failed to update loop")?;
        let after = self.find_loop(&params.id).await?;

        let mut changes = Vec::new();
        if before.title != after.title {
            changes.push(format!("Title: {} → {}", before.title, after.title));
        }
        if before.description != after.description {
            changes.push("Description updated".to_string());
        }
        if before.status != after.status {
            changes.push(format!("Status: {} → {}", before.status, after.status));
        }
        self.renderer
            .render(&UpdateResult::with_changes(after, changes).to_string())
    }

    async fn delete_loop(&self, args: DeleteLoopArgs) -> Result<()> {
        let record = self.find_loop(&args.id).await?;
        if !args.confirm {
            bail!(
                "Deleting loop '{}' also deletes its tasks. Re-run with --confirm to proceed.",
                record.title
            );
        }
        self.workspace
            .delete_loop(&record.id)
            .await
            .context("Failed to delete loop")?;
        self.renderer.render(&DeleteResult::new(record).to_string())
    }

    async fn add_task(&self, args: AddTaskArgs) -> Result<()> {
        let params = CreateTask::from(args);
        self.find_loop(&params.loop_id).await?;
        let id = self
            .workspace
            .tasks()
            .create(&params)
            .await
            .context("Failed to add task")?;
        let task = self.find_task(&id).await?;
        self.renderer.render(&CreateResult::new(task).to_string())
    }

    async fn list_tasks(&self, args: ListTasksArgs) -> Result<()> {
        let record = self.find_loop(&args.loop_id).await?;
        let tasks = TaskList(self.workspace.tasks().get_by_loop_id(&record.id).await);
        self.renderer
            .render(&format!("# Tasks of {}\n\n{tasks}", record.title))
    }

    async fn update_task(&self, args: UpdateTaskArgs) -> Result<()> {
        let params = UpdateTask::from(args);
        let before = self.find_task(&params.id).await?;
        if params.is_empty() {
            return self
                .renderer
                .render(&OperationStatus::notice("Nothing to update").to_string());
        }

        self.workspace
            .tasks()
            .update(&params)
            .await
            .context("Failed to update task")?;
        let after = self.find_task(&params.id).await?;

        let mut changes = Vec::new();
        if before.title != after.title {
            changes.push(format!("Title: {} → {}", before.title, after.title));
        }
        if before.description != after.description {
            changes.push("Description updated".to_string());
        }
        if before.status != after.status {
            changes.push(format!("Status: {} → {}", before.status, after.status));
        }
        self.renderer
            .render(&UpdateResult::with_changes(after, changes).to_string())
    }

    async fn delete_task(&self, args: DeleteTaskArgs) -> Result<()> {
        let task = self.find_task(&args.id).await?;
        self.workspace
            .tasks()
            .delete(&task.id)
            .await
            .context("Failed to delete task")?;
        self.renderer.render(&DeleteResult::new(task).to_string())
    }

    async fn reorder_tasks(&self, args: ReorderTasksArgs) -> Result<()> {
        let params = ReorderTasks::from(args);
        let record = self.find_loop(&params.loop_id).await?;
        self.workspace
            .tasks()
            .reorder(&params)
            .await
            .context("Failed to reorder tasks")?;

        let status = OperationStatus::success(format!("Reordered tasks of '{}'", record.title));
        let tasks = TaskList(self.workspace.tasks().get_by_loop_id(&record.id).await);
        self.renderer.render(&format!("{status}\n{tasks}"))
    }

    async fn find_loop(&self, id: &str) -> Result<Loop> {
        match self.workspace.loops().get_by_id(id).await {
            Some(record) => Ok(record),
            None => bail!("Loop with ID {id} not found"),
        }
    }

    async fn find_task(&self, id: &str) -> Result<Task> {
        let task = self
            .workspace
            .tasks()
            .tasks()
            .await
            .into_iter()
            .find(|task| task.id == id);
        match task {
            Some(task) => Ok(task),
            None => bail!("Task with ID {id} not found"),
        }
    }
}
