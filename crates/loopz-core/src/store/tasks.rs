//! Task store.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use jiff::Timestamp;
use log::{debug, info};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{clean_description, failure_message, validate_title, Busy, Sequence};
use crate::{
    error::Result,
    models::{Task, TaskStatus},
    params::{CreateTask, ReorderTasks, UpdateTask},
    persistence::Persistence,
    session::Session,
    store::LoopStore,
};

#[derive(Debug, Default)]
struct TaskState {
    tasks: Vec<Task>,
    error: Option<String>,
    /// Sequence of the last fetch or write applied, per loop
    applied: HashMap<String, u64>,
}

impl TaskState {
    fn applied_for(&self, loop_id: &str) -> u64 {
        self.applied.get(loop_id).copied().unwrap_or(0)
    }

    fn count_for(&self, loop_id: &str) -> usize {
        self.tasks.iter().filter(|t| t.loop_id == loop_id).count()
    }

    /// `(total, completed)` tasks held for one loop.
    fn steps_for(&self, loop_id: &str) -> (u32, u32) {
        let (total, completed) = self
            .tasks
            .iter()
            .filter(|t| t.loop_id == loop_id)
            .fold((0u32, 0u32), |(total, completed), task| {
                (total + 1, completed + u32::from(task.is_completed()))
            });
        (total, completed)
    }

    /// Tasks of one loop sorted by their current order.
    fn sorted_for(&self, loop_id: &str) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.tasks.iter().filter(|t| t.loop_id == loop_id).collect();
        tasks.sort_by_key(|t| t.order);
        tasks
    }

    /// Applies new positions and returns the tasks whose order changed.
    fn apply_positions(&mut self, positions: &HashMap<String, u32>, now: Timestamp) -> Vec<Task> {
        let mut changed = Vec::new();
        for task in &mut self.tasks {
            if let Some(&order) = positions.get(&task.id) {
                if task.order != order {
                    task.order = order;
                    task.updated_at = Some(now);
                    changed.push(task.clone());
                }
            }
        }
        changed
    }
}

/// In-memory collection of tasks, scoped by their parent loop.
pub struct TaskStore {
    persistence: Arc<dyn Persistence>,
    session: Arc<dyn Session>,
    state: RwLock<TaskState>,
    /// Serializes order-assigning writes so positions never collide
    order_gate: Mutex<()>,
    in_flight: AtomicUsize,
    sequence: Sequence,
    /// Receives each loop's step counters after its tasks change
    loops: Option<Arc<LoopStore>>,
}

impl TaskStore {
    pub fn new(persistence: Arc<dyn Persistence>, session: Arc<dyn Session>) -> Self {
        Self {
            persistence,
            session,
            state: RwLock::new(TaskState::default()),
            order_gate: Mutex::new(()),
            in_flight: AtomicUsize::new(0),
            sequence: Sequence::default(),
            loops: None,
        }
    }

    /// Keeps the step counters of the loops in `loops` in line with the
    /// tasks created, completed and deleted through this store.
    pub fn with_loop_store(mut self, loops: Arc<LoopStore>) -> Self {
        self.loops = Some(loops);
        self
    }

    /// Appends a pending task at the end of a loop and returns its id.
    ///
    /// The new task's order is the number of tasks the loop already holds.
    pub async fn create(&self, params: &CreateTask) -> Result<String> {
        let title = validate_title(&params.title)?;
        let user_id = self.session.require_user()?;
        let _busy = Busy::enter(&self.in_flight);
        let _gate = self.order_gate.lock().await;
        self.clear_error().await;

        let order = self.state.read().await.count_for(&params.loop_id);
        let task = Task {
            id: Uuid::new_v4().to_string(),
            loop_id: params.loop_id.clone(),
            user_id,
            title,
            description: clean_description(params.description.as_deref()),
            status: TaskStatus::Pending,
            order: u32::try_from(order).unwrap_or(u32::MAX),
            created_at: Timestamp::now(),
            updated_at: None,
            completed_at: None,
        };

        if let Err(e) = self.persistence.insert_task(&task).await {
            self.record_error(failure_message("Failed to create task", &e))
                .await;
            return Err(e);
        }

        debug!(
            "Created task {} at position {} in loop {}",
            task.id, task.order, task.loop_id
        );
        let id = task.id.clone();
        let loop_id = task.loop_id.clone();
        {
            let mut state = self.state.write().await;
            state.applied.insert(loop_id.clone(), self.sequence.next());
            // A fetch triggered by the insert may already have brought it in
            match state.tasks.iter_mut().find(|existing| existing.id == id) {
                Some(existing) => *existing = task,
                None => state.tasks.push(task),
            }
        }
        self.sync_counters(&loop_id).await;
        Ok(id)
    }

    /// Replaces the supplied fields of a task and stamps its update time.
    ///
    /// Entering `completed` records the completion time unless one is
    /// already set; leaving `completed` keeps it. Unknown ids are ignored.
    pub async fn update(&self, params: &UpdateTask) -> Result<()> {
        let title = params.title.as_deref().map(validate_title).transpose()?;
        self.session.require_user()?;
        let _busy = Busy::enter(&self.in_flight);
        self.clear_error().await;

        let (updated, completion_changed) = {
            let mut state = self.state.write().await;
            let Some(task) = state.tasks.iter_mut().find(|t| t.id == params.id) else {
                debug!("Update of unknown task {} ignored", params.id);
                return Ok(());
            };
            let was_completed = task.is_completed();
            let now = Timestamp::now();
            if let Some(title) = title {
                task.title = title;
            }
            if let Some(description) = &params.description {
                task.description = clean_description(Some(description.as_str()));
            }
            if let Some(status) = params.status {
                task.set_status(status, now);
            }
            task.updated_at = Some(now);
            let completion_changed = task.is_completed() != was_completed;
            let updated = task.clone();
            state
                .applied
                .insert(updated.loop_id.clone(), self.sequence.next());
            (updated, completion_changed)
        };

        if let Err(e) = self
            .persistence
            .update_tasks(std::slice::from_ref(&updated))
            .await
        {
            self.record_error(failure_message("Failed to update task", &e))
                .await;
            return Err(e);
        }
        debug!("Updated task {}", updated.id);
        if completion_changed {
            self.sync_counters(&updated.loop_id).await;
        }
        Ok(())
    }

    /// Removes a task and closes the gap it leaves in its loop's order.
    /// Unknown ids are ignored.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let user_id = self.session.require_user()?;
        let _busy = Busy::enter(&self.in_flight);
        let _gate = self.order_gate.lock().await;
        self.clear_error().await;

        let (loop_id, compacted) = {
            let mut state = self.state.write().await;
            let Some(index) = state.tasks.iter().position(|t| t.id == id) else {
                debug!("Delete of unknown task {id} ignored");
                return Ok(());
            };
            let removed = state.tasks.remove(index);

            let positions: HashMap<String, u32> = state
                .sorted_for(&removed.loop_id)
                .into_iter()
                .zip(0u32..)
                .map(|(task, order)| (task.id.clone(), order))
                .collect();
            let compacted = state.apply_positions(&positions, Timestamp::now());
            state
                .applied
                .insert(removed.loop_id.clone(), self.sequence.next());
            (removed.loop_id, compacted)
        };

        if let Err(e) = self
            .persistence
            .delete_task(&user_id, id, &compacted)
            .await
        {
            self.record_error(failure_message("Failed to delete task", &e))
                .await;
            return Err(e);
        }
        info!("Deleted task {id}");
        self.sync_counters(&loop_id).await;
        Ok(())
    }

    /// Tasks of one loop in ascending order.
    pub async fn get_by_loop_id(&self, loop_id: &str) -> Vec<Task> {
        self.state
            .read()
            .await
            .sorted_for(loop_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Rearranges the tasks of one loop.
    ///
    /// Listed tasks take their position in `task_ids`. Tasks of the loop
    /// missing from the list follow the listed ones in their previous
    /// relative order. Ids of other loops, unknown ids and repeats are
    /// ignored, so the loop always ends up ordered `0..n`.
    pub async fn reorder(&self, params: &ReorderTasks) -> Result<()> {
        self.session.require_user()?;
        let _busy = Busy::enter(&self.in_flight);
        let _gate = self.order_gate.lock().await;
        self.clear_error().await;

        let changed = {
            let mut state = self.state.write().await;
            let positions = Self::reorder_positions(&state, params);
            let changed = state.apply_positions(&positions, Timestamp::now());
            state
                .applied
                .insert(params.loop_id.clone(), self.sequence.next());
            changed
        };

        if changed.is_empty() {
            return Ok(());
        }
        if let Err(e) = self.persistence.update_tasks(&changed).await {
            self.record_error(failure_message("Failed to reorder tasks", &e))
                .await;
            return Err(e);
        }
        debug!(
            "Reordered {} tasks in loop {}",
            changed.len(),
            params.loop_id
        );
        Ok(())
    }

    /// Final positions for a reorder request: listed ids first, omitted
    /// tasks after them in their previous relative order.
    fn reorder_positions(state: &TaskState, params: &ReorderTasks) -> HashMap<String, u32> {
        let current = state.sorted_for(&params.loop_id);
        let members: HashSet<&str> = current.iter().map(|t| t.id.as_str()).collect();

        let mut seen: HashSet<&str> = HashSet::new();
        let mut sequence: Vec<String> = Vec::with_capacity(current.len());
        for id in &params.task_ids {
            if members.contains(id.as_str()) && seen.insert(id.as_str()) {
                sequence.push(id.clone());
            }
        }
        let omitted: Vec<String> = current
            .iter()
            .filter(|t| !seen.contains(t.id.as_str()))
            .map(|t| t.id.clone())
            .collect();
        if !omitted.is_empty() {
            debug!(
                "Reorder of loop {} omitted {} tasks; appending them",
                params.loop_id,
                omitted.len()
            );
        }
        sequence.extend(omitted);

        sequence.into_iter().zip(0u32..).collect()
    }

    /// Replaces the tasks of one loop with their persisted versions,
    /// leaving the tasks of other loops untouched.
    ///
    /// A result that arrives after a newer fetch or write on the same loop
    /// was applied is discarded.
    pub async fn fetch_by_loop_id(&self, loop_id: &str) -> Result<()> {
        let user_id = self.session.require_user()?;
        let _busy = Busy::enter(&self.in_flight);
        self.clear_error().await;
        let sequence = self.sequence.next();

        let fetched = self.persistence.list_tasks(&user_id, loop_id).await;

        let mut state = self.state.write().await;
        let applied = state.applied_for(loop_id);
        if sequence <= applied {
            debug!("Discarding stale task fetch #{sequence} for loop {loop_id} (applied #{applied})");
            return Ok(());
        }
        match fetched {
            Ok(tasks) => {
                debug!("Fetched {} tasks for loop {loop_id}", tasks.len());
                state.tasks.retain(|t| t.loop_id != loop_id);
                state.tasks.extend(tasks);
                state.applied.insert(loop_id.to_string(), sequence);
                Ok(())
            }
            Err(e) => {
                state.error = Some(failure_message("Failed to fetch tasks", &e));
                Err(e)
            }
        }
    }

    /// Drops the local tasks of a loop that no longer exists.
    pub async fn remove_by_loop_id(&self, loop_id: &str) {
        let mut state = self.state.write().await;
        state.tasks.retain(|t| t.loop_id != loop_id);
        state
            .applied
            .insert(loop_id.to_string(), self.sequence.next());
    }

    /// Snapshot of every task held, across loops.
    pub async fn tasks(&self) -> Vec<Task> {
        self.state.read().await.tasks.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Message of the last collaborator failure, if any.
    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    async fn record_error(&self, message: String) {
        self.state.write().await.error = Some(message);
    }

    /// Hands the current step counts of a loop to the loop store.
    ///
    /// A failure stays in the loop store's error state; the task write it
    /// follows has already succeeded.
    async fn sync_counters(&self, loop_id: &str) {
        let Some(loops) = &self.loops else {
            return;
        };
        let (total, completed) = self.state.read().await.steps_for(loop_id);
        if let Err(e) = loops.record_counters(loop_id, total, completed).await {
            debug!("Counters of loop {loop_id} not persisted: {e}");
        }
    }
}
