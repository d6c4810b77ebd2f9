//! Loop store.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use jiff::Timestamp;
use log::{debug, info};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{clean_description, failure_message, validate_title, Busy, Sequence};
use crate::{
    error::Result,
    models::{Loop, LoopFilter, LoopStatus, LoopWithProgress, Task},
    params::{CreateLoop, UpdateLoop},
    persistence::Persistence,
    session::Session,
};

#[derive(Debug, Default)]
struct LoopState {
    loops: Vec<Loop>,
    error: Option<String>,
    /// Sequence of the last fetch or write applied to `loops`
    applied: u64,
}

/// In-memory collection of the signed-in user's loops.
pub struct LoopStore {
    persistence: Arc<dyn Persistence>,
    session: Arc<dyn Session>,
    state: RwLock<LoopState>,
    in_flight: AtomicUsize,
    sequence: Sequence,
}

impl LoopStore {
    pub fn new(persistence: Arc<dyn Persistence>, session: Arc<dyn Session>) -> Self {
        Self {
            persistence,
            session,
            state: RwLock::new(LoopState::default()),
            in_flight: AtomicUsize::new(0),
            sequence: Sequence::default(),
        }
    }

    /// Creates a new active loop and returns its id.
    ///
    /// The record is written to persistence first and appended to the
    /// collection once the write succeeded.
    ///
    /// # Errors
    ///
    /// Returns `LoopzError::InvalidInput` for a blank title,
    /// `LoopzError::NotSignedIn` without a session user, and the
    /// persistence error when the write fails.
    pub async fn create(&self, params: &CreateLoop) -> Result<String> {
        let title = validate_title(&params.title)?;
        let user_id = self.session.require_user()?;
        let _busy = Busy::enter(&self.in_flight);
        self.clear_error().await;

        let record = Loop {
            id: Uuid::new_v4().to_string(),
            user_id,
            title,
            description: clean_description(params.description.as_deref()),
            status: LoopStatus::Active,
            progress: Some(0),
            total_steps: Some(0),
            completed_steps: Some(0),
            created_at: Timestamp::now(),
            updated_at: None,
            completed_at: None,
        };

        if let Err(e) = self.persistence.insert_loop(&record).await {
            self.record_error(failure_message("Failed to create loop", &e))
                .await;
            return Err(e);
        }

        info!("Created loop {} ({})", record.id, record.title);
        let id = record.id.clone();
        let mut state = self.state.write().await;
        // A fetch triggered by the insert may already have brought it in
        match state.loops.iter_mut().find(|existing| existing.id == id) {
            Some(existing) => *existing = record,
            None => state.loops.push(record),
        }
        state.applied = self.sequence.next();
        Ok(id)
    }

    /// Replaces the supplied fields of a loop and stamps its update time.
    ///
    /// Unknown ids are ignored. The edit is applied locally before it is
    /// persisted and is kept when persisting fails.
    pub async fn update(&self, params: &UpdateLoop) -> Result<()> {
        let title = params.title.as_deref().map(validate_title).transpose()?;
        self.session.require_user()?;
        let _busy = Busy::enter(&self.in_flight);
        self.clear_error().await;

        let updated = {
            let mut state = self.state.write().await;
            let Some(record) = state.loops.iter_mut().find(|l| l.id == params.id) else {
                debug!("Update of unknown loop {} ignored", params.id);
                return Ok(());
            };
            let now = Timestamp::now();
            if let Some(title) = title {
                record.title = title;
            }
            if let Some(description) = &params.description {
                record.description = clean_description(Some(description.as_str()));
            }
            if let Some(status) = params.status {
                record.set_status(status, now);
            }
            record.updated_at = Some(now);
            let updated = record.clone();
            state.applied = self.sequence.next();
            updated
        };

        if let Err(e) = self.persistence.update_loop(&updated).await {
            self.record_error(failure_message("Failed to update loop", &e))
                .await;
            return Err(e);
        }
        debug!("Updated loop {}", updated.id);
        Ok(())
    }

    /// Removes a loop. Unknown ids are ignored.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let user_id = self.session.require_user()?;
        let _busy = Busy::enter(&self.in_flight);
        self.clear_error().await;

        {
            let mut state = self.state.write().await;
            let before = state.loops.len();
            state.loops.retain(|record| record.id != id);
            if state.loops.len() == before {
                debug!("Delete of unknown loop {id} ignored");
                return Ok(());
            }
            state.applied = self.sequence.next();
        }

        if let Err(e) = self.persistence.delete_loop(&user_id, id).await {
            self.record_error(failure_message("Failed to delete loop", &e))
                .await;
            return Err(e);
        }
        info!("Deleted loop {id}");
        Ok(())
    }

    /// Records the step counters of a loop after its tasks changed.
    ///
    /// The counters are applied locally and then persisted on their own,
    /// without rewriting the loop's other fields. Unknown ids are ignored.
    pub async fn record_counters(&self, id: &str, total: u32, completed: u32) -> Result<()> {
        let user_id = self.session.require_user()?;
        let _busy = Busy::enter(&self.in_flight);

        {
            let mut state = self.state.write().await;
            let Some(record) = state.loops.iter_mut().find(|l| l.id == id) else {
                debug!("Counters for unknown loop {id} ignored");
                return Ok(());
            };
            record.set_counters(total, completed);
            state.applied = self.sequence.next();
        }

        if let Err(e) = self
            .persistence
            .update_loop_counters(&user_id, id, total, completed)
            .await
        {
            self.record_error(failure_message("Failed to update loop progress", &e))
                .await;
            return Err(e);
        }
        debug!("Loop {id} now has {completed}/{total} steps done");
        Ok(())
    }

    /// Replaces the collection with the persisted loops of the session
    /// user.
    ///
    /// On failure the previous collection is kept and the error recorded.
    /// A result that arrives after a newer fetch or write was applied is
    /// discarded.
    pub async fn fetch_all(&self) -> Result<()> {
        let user_id = self.session.require_user()?;
        let _busy = Busy::enter(&self.in_flight);
        self.clear_error().await;
        let sequence = self.sequence.next();

        let fetched = self.persistence.list_loops(&user_id).await;

        let mut state = self.state.write().await;
        if sequence <= state.applied {
            debug!(
                "Discarding stale loop fetch #{sequence} (applied #{})",
                state.applied
            );
            return Ok(());
        }
        match fetched {
            Ok(loops) => {
                debug!("Fetched {} loops for {user_id}", loops.len());
                state.loops = loops;
                state.applied = sequence;
                Ok(())
            }
            Err(e) => {
                state.error = Some(failure_message("Failed to fetch loops", &e));
                Err(e)
            }
        }
    }

    pub async fn get_by_id(&self, id: &str) -> Option<Loop> {
        self.state
            .read()
            .await
            .loops
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }

    /// Joins a loop with its progress.
    ///
    /// The loop's step counters decide when it carries both; `tasks` is
    /// only consulted for records without them.
    pub async fn get_with_progress(
        &self,
        id: &str,
        tasks: Option<&[Task]>,
    ) -> Option<LoopWithProgress> {
        self.get_by_id(id)
            .await
            .map(|record| LoopWithProgress::new(record, tasks))
    }

    /// Loops passing `filter`, newest first.
    pub async fn list(&self, filter: &LoopFilter) -> Vec<Loop> {
        let mut loops: Vec<Loop> = self
            .state
            .read()
            .await
            .loops
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        // Later insertions win ties on identical timestamps
        loops.reverse();
        loops.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        loops
    }

    /// Snapshot of the whole collection in insertion order.
    pub async fn loops(&self) -> Vec<Loop> {
        self.state.read().await.loops.clone()
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
}
