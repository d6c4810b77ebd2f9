mod common;

use std::{sync::Arc, time::Duration};

use common::create_test_workspace;
use loopz_core::{
    models::{LoopFilter, LoopStatus, TaskStatus},
    params::{CreateLoop, CreateTask, UpdateLoop, UpdateTask},
    MemoryPersistence, Persistence, WorkspaceBuilder,
};

#[tokio::test]
async fn test_progress_follows_completed_tasks() {
    let (_temp_dir, workspace) = create_test_workspace().await;

    let mut create = CreateLoop::new("Read a book");
    create.description = Some("One chapter a day".to_string());
    let loop_id = workspace
        .loops()
        .create(&create)
        .await
        .expect("Failed to create loop");

    let mut task_ids = Vec::new();
    for title in ["Pick a book", "Read it", "Write notes"] {
        let id = workspace
            .tasks()
            .create(&CreateTask::new(loop_id.as_str(), title))
            .await
            .expect("Failed to create task");
        task_ids.push(id);
    }
    workspace
        .tasks()
        .update(&UpdateTask::status(task_ids[0].as_str(), TaskStatus::Completed))
        .await
        .expect("Failed to complete task");

    let view = workspace
        .loop_with_progress(&loop_id)
        .await
        .expect("Loop should exist");
    assert_eq!(view.percent, 33);
    assert_eq!(view.completed_steps, 1);
    assert_eq!(view.total_steps, 3);
    assert_eq!(view.record.title, "Read a book");

    let from_counters = workspace
        .loops()
        .get_with_progress(&loop_id, None)
        .await
        .expect("Loop should exist");
    assert_eq!(
        (
            from_counters.completed_steps,
            from_counters.total_steps,
            from_counters.percent
        ),
        (1, 3, 33)
    );
    assert_eq!(from_counters.record.progress, Some(33));

    let stored = workspace
        .persistence()
        .list_loops("ada")
        .await
        .expect("Failed to list loops");
    assert_eq!(stored[0].counters(), Some((3, 1)));
    assert_eq!(stored[0].progress, Some(33));
}

#[tokio::test]
async fn test_counters_follow_reopened_and_deleted_tasks() {
    let (temp_dir, workspace) = create_test_workspace().await;

    let loop_id = workspace
        .loops()
        .create(&CreateLoop::new("Launch"))
        .await
        .expect("Failed to create loop");
    let draft = workspace
        .tasks()
        .create(&CreateTask::new(loop_id.as_str(), "Draft"))
        .await
        .expect("Failed to create task");
    workspace
        .tasks()
        .create(&CreateTask::new(loop_id.as_str(), "Publish"))
        .await
        .expect("Failed to create task");

    workspace
        .tasks()
        .update(&UpdateTask::status(draft.as_str(), TaskStatus::Completed))
        .await
        .expect("Failed to complete task");
    let view = workspace.loops().get_with_progress(&loop_id, None).await;
    assert_eq!(view.map(|v| v.percent), Some(50));

    workspace
        .tasks()
        .update(&UpdateTask::status(draft.as_str(), TaskStatus::Pending))
        .await
        .expect("Failed to reopen task");
    let view = workspace.loops().get_with_progress(&loop_id, None).await;
    assert_eq!(view.map(|v| (v.completed_steps, v.total_steps)), Some((0, 2)));

    workspace
        .tasks()
        .delete(&draft)
        .await
        .expect("Failed to delete task");
    drop(workspace);

    let reopened = WorkspaceBuilder::new()
        .with_database_path(Some(temp_dir.path().join("test.db")))
        .with_user("ada")
        .build()
        .await
        .expect("Failed to reopen workspace");
    reopened.loops().fetch_all().await.expect("Failed to fetch loops");
    let view = reopened
        .loops()
        .get_with_progress(&loop_id, None)
        .await
        .expect("Loop should exist");
    assert_eq!((view.completed_steps, view.total_steps, view.percent), (0, 1, 0));
}

#[tokio::test]
async fn test_refresh_reloads_persisted_state() {
    let (temp_dir, workspace) = create_test_workspace().await;

    let loop_id = workspace
        .loops()
        .create(&CreateLoop::new("Garden"))
        .await
        .expect("Failed to create loop");
    workspace
        .tasks()
        .create(&CreateTask::new(loop_id.as_str(), "Buy seeds"))
        .await
        .expect("Failed to create task");
    drop(workspace);

    let reopened = WorkspaceBuilder::new()
        .with_database_path(Some(temp_dir.path().join("test.db")))
        .with_user("ada")
        .build()
        .await
        .expect("Failed to reopen workspace");
    assert!(reopened.loops().loops().await.is_empty());

    reopened.refresh().await.expect("Failed to refresh");
    let views = reopened.loops_with_progress(&LoopFilter::default()).await;
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].record.title, "Garden");
    assert_eq!(views[0].total_steps, 1);
}

#[tokio::test]
async fn test_delete_loop_drops_its_tasks() {
    let (_temp_dir, workspace) = create_test_workspace().await;

    let doomed = workspace
        .loops()
        .create(&CreateLoop::new("Doomed"))
        .await
        .expect("Failed to create loop");
    let kept = workspace
        .loops()
        .create(&CreateLoop::new("Kept"))
        .await
        .expect("Failed to create loop");
    for loop_id in [&doomed, &kept] {
        workspace
            .tasks()
            .create(&CreateTask::new(loop_id.as_str(), "Something"))
            .await
            .expect("Failed to create task");
    }

    workspace
        .delete_loop(&doomed)
        .await
        .expect("Failed to delete loop");

    assert!(workspace.loops().get_by_id(&doomed).await.is_none());
    assert!(workspace.tasks().get_by_loop_id(&doomed).await.is_empty());
    assert_eq!(workspace.tasks().get_by_loop_id(&kept).await.len(), 1);

    let persisted = workspace
        .persistence()
        .list_tasks("ada", &doomed)
        .await
        .expect("Failed to list tasks");
    assert!(persisted.is_empty());

    // Deleting again is a silent no-op
    workspace
        .delete_loop(&doomed)
        .await
        .expect("Repeated delete should succeed");
}

#[tokio::test]
async fn test_completed_loop_filter() {
    let (_temp_dir, workspace) = create_test_workspace().await;

    let done = workspace
        .loops()
        .create(&CreateLoop::new("Finished"))
        .await
        .expect("Failed to create loop");
    workspace
        .loops()
        .create(&CreateLoop::new("Ongoing"))
        .await
        .expect("Failed to create loop");
    let mut params = UpdateLoop::new(done.as_str());
    params.status = Some(LoopStatus::Completed);
    workspace
        .loops()
        .update(&params)
        .await
        .expect("Failed to update loop");

    let completed = workspace
        .loops_with_progress(&LoopFilter::with_status(LoopStatus::Completed))
        .await;
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].record.id, done);

    let matching = workspace
        .loops_with_progress(&LoopFilter {
            title_contains: Some("going".to_string()),
            ..Default::default()
        })
        .await;
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].record.title, "Ongoing");
}

#[tokio::test]
async fn test_change_watcher_picks_up_external_writes() {
    let persistence = Arc::new(MemoryPersistence::new());
    let workspace = WorkspaceBuilder::new()
        .with_persistence(persistence.clone())
        .with_user("ada")
        .build()
        .await
        .expect("Failed to create workspace");
    let other_device = WorkspaceBuilder::new()
        .with_persistence(persistence)
        .with_user("ada")
        .build()
        .await
        .expect("Failed to create workspace");

    let watcher = workspace
        .spawn_change_watcher()
        .expect("Watcher needs a signed-in user");

    let loop_id = other_device
        .loops()
        .create(&CreateLoop::new("Synced"))
        .await
        .expect("Failed to create loop");
    other_device
        .tasks()
        .create(&CreateTask::new(loop_id.as_str(), "Arrives too"))
        .await
        .expect("Failed to create task");

    let synced = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let counters = workspace
                .loops()
                .get_by_id(&loop_id)
                .await
                .and_then(|record| record.counters());
            if workspace.tasks().get_by_loop_id(&loop_id).await.len() == 1
                && counters == Some((1, 0))
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(synced.is_ok(), "Watcher did not refresh the stores");

    watcher.abort();
}

#[tokio::test]
async fn test_watcher_requires_signed_in_user() {
    let workspace = WorkspaceBuilder::new()
        .in_memory(true)
        .build()
        .await
        .expect("Failed to create workspace");
    assert!(workspace.spawn_change_watcher().is_none());
}
