mod common;

use std::{sync::Arc, time::Duration};

use common::{flaky_workspace, FlakyPersistence, ScriptedResponder};
use loopz_core::{
    models::{LoopFilter, LoopStatus, TaskStatus},
    params::{CreateLoop, CreateTask, ReorderTasks, UpdateLoop, UpdateTask},
    LoopzError, Persistence,
};

#[tokio::test]
async fn test_failed_create_leaves_collection_untouched() {
    let persistence = FlakyPersistence::new();
    let workspace = flaky_workspace(persistence.clone(), ScriptedResponder::new()).await;

    workspace
        .loops()
        .create(&CreateLoop::new("Kept"))
        .await
        .expect("Failed to create loop");

    persistence.fail_writes(true);
    let result = workspace.loops().create(&CreateLoop::new("Lost")).await;
    assert!(matches!(result, Err(LoopzError::Persistence { .. })));

    let loops = workspace.loops().loops().await;
    assert_eq!(loops.len(), 1);
    assert_eq!(loops[0].title, "Kept");
    let error = workspace.loops().error().await.expect("Error should be recorded");
    assert!(error.contains("storage offline"));

    // The next operation starts from a clean slate
    persistence.fail_writes(false);
    workspace
        .loops()
        .create(&CreateLoop::new("Recovered"))
        .await
        .expect("Failed to create loop");
    assert!(workspace.loops().error().await.is_none());
}

#[tokio::test]
async fn test_failed_update_keeps_local_edit() {
    let persistence = FlakyPersistence::new();
    let workspace = flaky_workspace(persistence.clone(), ScriptedResponder::new()).await;

    let loop_id = workspace
        .loops()
        .create(&CreateLoop::new("Garden"))
        .await
        .expect("Failed to create loop");

    persistence.fail_writes(true);
    let mut params = UpdateLoop::new(loop_id.as_str());
    params.status = Some(LoopStatus::Completed);
    let result = workspace.loops().update(&params).await;
    assert!(result.is_err());

    let record = workspace
        .loops()
        .get_by_id(&loop_id)
        .await
        .expect("Loop should still exist");
    assert_eq!(record.status, LoopStatus::Completed);
    assert!(record.completed_at.is_some());
    assert!(workspace.loops().error().await.is_some());

    // Persisted copy still has the old status
    let persisted = persistence
        .inner()
        .list_loops("ada")
        .await
        .expect("Failed to list loops");
    assert_eq!(persisted[0].status, LoopStatus::Active);
}

#[tokio::test]
async fn test_failed_fetch_keeps_previous_loops() {
    let persistence = FlakyPersistence::new();
    let workspace = flaky_workspace(persistence.clone(), ScriptedResponder::new()).await;

    workspace
        .loops()
        .create(&CreateLoop::new("Morning run"))
        .await
        .expect("Failed to create loop");

    persistence.fail_reads(true);
    assert!(workspace.loops().fetch_all().await.is_err());
    assert_eq!(workspace.loops().loops().await.len(), 1);
    assert!(workspace
        .loops()
        .error()
        .await
        .is_some_and(|e| e.contains("storage offline")));

    workspace.loops().clear_error().await;
    assert!(workspace.loops().error().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_stale_loop_fetch_is_discarded() {
    let persistence = FlakyPersistence::new();
    let workspace = flaky_workspace(persistence.clone(), ScriptedResponder::new()).await;
    persistence.set_read_delay(Duration::from_millis(200));

    let loops = workspace.loops().clone();
    let fetch = tokio::spawn(async move { loops.fetch_all().await });
    tokio::task::yield_now().await;
    assert!(workspace.loops().is_loading());

    workspace
        .loops()
        .create(&CreateLoop::new("Fresh"))
        .await
        .expect("Failed to create loop");

    fetch
        .await
        .expect("Fetch task panicked")
        .expect("Fetch failed");

    // The fetch read an empty table before the create landed
    let loops = workspace.loops().loops().await;
    assert_eq!(loops.len(), 1);
    assert_eq!(loops[0].title, "Fresh");
    assert!(!workspace.loops().is_loading());
}

#[tokio::test(start_paused = true)]
async fn test_stale_task_fetch_is_discarded() {
    let persistence = FlakyPersistence::new();
    let workspace = flaky_workspace(persistence.clone(), ScriptedResponder::new()).await;

    let loop_id = workspace
        .loops()
        .create(&CreateLoop::new("Move house"))
        .await
        .expect("Failed to create loop");
    let task_id = workspace
        .tasks()
        .create(&CreateTask::new(loop_id.as_str(), "Pack books"))
        .await
        .expect("Failed to create task");

    persistence.set_read_delay(Duration::from_millis(200));
    let tasks = workspace.tasks().clone();
    let fetch_loop = loop_id.clone();
    let fetch = tokio::spawn(async move { tasks.fetch_by_loop_id(&fetch_loop).await });
    tokio::task::yield_now().await;

    workspace
        .tasks()
        .update(&UpdateTask::status(task_id.as_str(), TaskStatus::Completed))
        .await
        .expect("Failed to update task");

    fetch
        .await
        .expect("Fetch task panicked")
        .expect("Fetch failed");

    let tasks = workspace.tasks().get_by_loop_id(&loop_id).await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].status, TaskStatus::Completed);
}

#[tokio::test]
async fn test_validation_errors_leave_error_state_alone() {
    let persistence = FlakyPersistence::new();
    let workspace = flaky_workspace(persistence.clone(), ScriptedResponder::new()).await;

    persistence.fail_reads(true);
    assert!(workspace.loops().fetch_all().await.is_err());
    let recorded = workspace.loops().error().await;
    assert!(recorded.is_some());

    let result = workspace.loops().create(&CreateLoop::new("   ")).await;
    assert!(matches!(result, Err(LoopzError::InvalidInput { .. })));
    assert_eq!(workspace.loops().error().await, recorded);
}

#[tokio::test]
async fn test_reorder_then_delete_keeps_dense_order() {
    let persistence = FlakyPersistence::new();
    let workspace = flaky_workspace(persistence.clone(), ScriptedResponder::new()).await;

    let loop_id = workspace
        .loops()
        .create(&CreateLoop::new("Launch"))
        .await
        .expect("Failed to create loop");
    let mut ids = Vec::new();
    for title in ["Draft", "Review", "Publish", "Announce"] {
        let id = workspace
            .tasks()
            .create(&CreateTask::new(loop_id.as_str(), title))
            .await
            .expect("Failed to create task");
        ids.push(id);
    }

    workspace
        .tasks()
        .reorder(&ReorderTasks {
            loop_id: loop_id.clone(),
            task_ids: vec![ids[3].clone(), ids[0].clone()],
        })
        .await
        .expect("Failed to reorder tasks");
    workspace
        .tasks()
        .delete(&ids[0])
        .await
        .expect("Failed to delete task");

    let titles: Vec<String> = workspace
        .tasks()
        .get_by_loop_id(&loop_id)
        .await
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, ["Announce", "Review", "Publish"]);

    // The persisted order matches the local one
    let persisted = persistence
        .inner()
        .list_tasks("ada", &loop_id)
        .await
        .expect("Failed to list tasks");
    let persisted: Vec<(String, u32)> = persisted.into_iter().map(|t| (t.title, t.order)).collect();
    assert_eq!(
        persisted,
        [
            ("Announce".to_string(), 0),
            ("Review".to_string(), 1),
            ("Publish".to_string(), 2)
        ]
    );
}

#[tokio::test]
async fn test_archived_loops_hidden_by_default() {
    let persistence = FlakyPersistence::new();
    let workspace = flaky_workspace(persistence, ScriptedResponder::new()).await;

    let archived = workspace
        .loops()
        .create(&CreateLoop::new("Old project"))
        .await
        .expect("Failed to create loop");
    workspace
        .loops()
        .create(&CreateLoop::new("New project"))
        .await
        .expect("Failed to create loop");
    let mut params = UpdateLoop::new(archived.as_str());
    params.status = Some(LoopStatus::Archived);
    workspace
        .loops()
        .update(&params)
        .await
        .expect("Failed to archive loop");

    let visible = workspace.loops().list(&LoopFilter::default()).await;
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].title, "New project");

    let all = workspace.loops().list(&LoopFilter::all()).await;
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].title, "New project");
}

#[tokio::test]
async fn test_failed_delete_leaves_persisted_order_dense() {
    let persistence = FlakyPersistence::new();
    let workspace = flaky_workspace(persistence.clone(), ScriptedResponder::new()).await;

    let loop_id = workspace
        .loops()
        .create(&CreateLoop::new("Launch"))
        .await
        .expect("Failed to create loop");
    let mut ids = Vec::new();
    for title in ["Draft", "Review", "Publish"] {
        let id = workspace
            .tasks()
            .create(&CreateTask::new(loop_id.as_str(), title))
            .await
            .expect("Failed to create task");
        ids.push(id);
    }

    persistence.fail_writes(true);
    assert!(workspace.tasks().delete(&ids[0]).await.is_err());
    persistence.fail_writes(false);

    workspace
        .tasks()
        .fetch_by_loop_id(&loop_id)
        .await
        .expect("Failed to fetch tasks");
    workspace
        .tasks()
        .create(&CreateTask::new(loop_id.as_str(), "Announce"))
        .await
        .expect("Failed to create task");

    let orders: Vec<u32> = persistence
        .inner()
        .list_tasks("ada", &loop_id)
        .await
        .expect("Failed to list tasks")
        .into_iter()
        .map(|t| t.order)
        .collect();
    assert_eq!(orders, [0, 1, 2, 3]);
}

#[tokio::test]
async fn test_fetch_during_task_create_keeps_single_copy() {
    let persistence = FlakyPersistence::new();
    let workspace = flaky_workspace(persistence.clone(), ScriptedResponder::new()).await;

    let loop_id = workspace
        .loops()
        .create(&CreateLoop::new("Launch"))
        .await
        .expect("Failed to create loop");

    let hold = persistence.hold_next_insert();
    let tasks = Arc::clone(workspace.tasks());
    let params = CreateTask::new(loop_id.as_str(), "Draft");
    let create = tokio::spawn(async move { tasks.create(&params).await });

    hold.inserted.notified().await;
    workspace
        .tasks()
        .fetch_by_loop_id(&loop_id)
        .await
        .expect("Failed to fetch tasks");
    assert_eq!(workspace.tasks().get_by_loop_id(&loop_id).await.len(), 1);

    hold.release.notify_one();
    let id = create
        .await
        .expect("Create task panicked")
        .expect("Failed to create task");

    let tasks = workspace.tasks().get_by_loop_id(&loop_id).await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, id);
}

#[tokio::test]
async fn test_fetch_during_loop_create_keeps_single_copy() {
    let persistence = FlakyPersistence::new();
    let workspace = flaky_workspace(persistence.clone(), ScriptedResponder::new()).await;

    let hold = persistence.hold_next_insert();
    let loops = Arc::clone(workspace.loops());
    let create = tokio::spawn(async move { loops.create(&CreateLoop::new("Synced")).await });

    hold.inserted.notified().await;
    workspace
        .loops()
        .fetch_all()
        .await
        .expect("Failed to fetch loops");
    assert_eq!(workspace.loops().loops().await.len(), 1);

    hold.release.notify_one();
    create
        .await
        .expect("Create loop panicked")
        .expect("Failed to create loop");

    assert_eq!(workspace.loops().loops().await.len(), 1);
}
