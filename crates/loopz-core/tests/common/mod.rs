#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use loopz_core::{
    persistence::ChangeSubscription, AssistantReply, ChatMessage, ConversationConfig, Loop,
    LoopzError, MemoryPersistence, Persistence, ResponseGenerator, Result, Task, Workspace,
    WorkspaceBuilder,
};
use tempfile::TempDir;
use tokio::sync::Notify;

/// Helper function to create a workspace on a temporary SQLite database
pub async fn create_test_workspace() -> (TempDir, Workspace) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let workspace = WorkspaceBuilder::new()
        .with_database_path(Some(&db_path))
        .with_user("ada")
        .build()
        .await
        .expect("Failed to create workspace");
    (temp_dir, workspace)
}

/// Workspace on in-memory storage answering with `responder`
pub async fn memory_workspace(responder: Arc<dyn ResponseGenerator>) -> Workspace {
    WorkspaceBuilder::new()
        .in_memory(true)
        .with_user("ada")
        .with_responder(responder)
        .with_conversation_config(ConversationConfig::default())
        .build()
        .await
        .expect("Failed to create workspace")
}

/// Workspace whose persistence can be switched into failure mode
pub async fn flaky_workspace(
    persistence: Arc<FlakyPersistence>,
    responder: Arc<dyn ResponseGenerator>,
) -> Workspace {
    WorkspaceBuilder::new()
        .with_persistence(persistence)
        .with_user("ada")
        .with_responder(responder)
        .build()
        .await
        .expect("Failed to create workspace")
}

/// A reply proposing a loop.
pub fn suggesting(title: &str, tasks: &[&str]) -> AssistantReply {
    AssistantReply {
        reflection: format!("Let's work on {title}."),
        coaching: Some("Start small.".to_string()),
        should_create_loop: true,
        suggested_title: Some(title.to_string()),
        tasks: tasks.iter().map(|t| t.to_string()).collect(),
    }
}

/// A reply without coaching or suggestion.
pub fn plain(reflection: &str) -> AssistantReply {
    AssistantReply {
        reflection: reflection.to_string(),
        ..Default::default()
    }
}

/// Response generator that plays back queued replies and records the
/// history it was given.
#[derive(Default)]
pub struct ScriptedResponder {
    replies: Mutex<VecDeque<Result<AssistantReply>>>,
    histories: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedResponder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, reply: AssistantReply) {
        self.replies.lock().unwrap().push_back(Ok(reply));
    }

    pub fn push_failure(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(LoopzError::response(message)));
    }

    pub fn histories(&self) -> Vec<Vec<ChatMessage>> {
        self.histories.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResponseGenerator for ScriptedResponder {
    async fn respond(&self, _input: &str, history: &[ChatMessage]) -> Result<AssistantReply> {
        self.histories.lock().unwrap().push(history.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(plain("Tell me more.")))
    }
}

/// Pauses one insert after it was stored and before it returns.
#[derive(Default)]
pub struct InsertHold {
    /// Signalled once the record is stored
    pub inserted: Notify,
    /// Lets the insert return
    pub release: Notify,
}

/// Persistence double delegating to [`MemoryPersistence`] until told to
/// fail.
#[derive(Default)]
pub struct FlakyPersistence {
    inner: MemoryPersistence,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    /// Task inserts allowed before writes start failing; 0 means no limit
    task_insert_budget: AtomicUsize,
    /// Held after a read completes, before its result is returned
    read_delay: Mutex<Duration>,
    /// Applied to the next loop or task insert only
    insert_hold: Mutex<Option<Arc<InsertHold>>>,
}

impl FlakyPersistence {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Lets `count` more task inserts succeed, then fails every write.
    pub fn fail_after_task_inserts(&self, count: usize) {
        self.task_insert_budget.store(count + 1, Ordering::SeqCst);
    }

    /// Pauses the next insert right after it was stored.
    pub fn hold_next_insert(&self) -> Arc<InsertHold> {
        let hold = Arc::new(InsertHold::default());
        *self.insert_hold.lock().unwrap() = Some(Arc::clone(&hold));
        hold
    }

    async fn pause_after_insert(&self) {
        let hold = self.insert_hold.lock().unwrap().take();
        if let Some(hold) = hold {
            hold.inserted.notify_one();
            hold.release.notified().await;
        }
    }

    pub fn set_read_delay(&self, delay: Duration) {
        *self.read_delay.lock().unwrap() = delay;
    }

    async fn delay_read(&self) {
        let delay = *self.read_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LoopzError::persistence("storage offline"));
        }
        Ok(())
    }

    fn check_read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(LoopzError::persistence("storage offline"));
        }
        Ok(())
    }

    pub fn inner(&self) -> &MemoryPersistence {
        &self.inner
    }
}

#[async_trait]
impl Persistence for FlakyPersistence {
    async fn list_loops(&self, user_id: &str) -> Result<Vec<Loop>> {
        self.check_read()?;
        let loops = self.inner.list_loops(user_id).await;
        self.delay_read().await;
        loops
    }

    async fn insert_loop(&self, record: &Loop) -> Result<()> {
        self.check_write()?;
        self.inner.insert_loop(record).await?;
        self.pause_after_insert().await;
        Ok(())
    }

    async fn update_loop(&self, record: &Loop) -> Result<()> {
        self.check_write()?;
        self.inner.update_loop(record).await
    }

    async fn update_loop_counters(
        &self,
        user_id: &str,
        id: &str,
        total: u32,
        completed: u32,
    ) -> Result<()> {
        self.check_write()?;
        self.inner
            .update_loop_counters(user_id, id, total, completed)
            .await
    }

    async fn delete_loop(&self, user_id: &str, id: &str) -> Result<()> {
        self.check_write()?;
        self.inner.delete_loop(user_id, id).await
    }

    async fn list_tasks(&self, user_id: &str, loop_id: &str) -> Result<Vec<Task>> {
        self.check_read()?;
        let tasks = self.inner.list_tasks(user_id, loop_id).await;
        self.delay_read().await;
        tasks
    }

    async fn insert_task(&self, task: &Task) -> Result<()> {
        self.check_write()?;
        let budget = self.task_insert_budget.load(Ordering::SeqCst);
        if budget == 1 {
            self.task_insert_budget.store(0, Ordering::SeqCst);
            self.fail_writes(true);
            return Err(LoopzError::persistence("storage offline"));
        }
        if budget > 1 {
            self.task_insert_budget.store(budget - 1, Ordering::SeqCst);
        }
        self.inner.insert_task(task).await?;
        self.pause_after_insert().await;
        Ok(())
    }

    async fn update_tasks(&self, tasks: &[Task]) -> Result<()> {
        self.check_write()?;
        self.inner.update_tasks(tasks).await
    }

    async fn delete_task(&self, user_id: &str, id: &str, renumbered: &[Task]) -> Result<()> {
        self.check_write()?;
        self.inner.delete_task(user_id, id, renumbered).await
    }

    fn subscribe(&self, user_id: &str) -> ChangeSubscription {
        self.inner.subscribe(user_id)
    }
}
