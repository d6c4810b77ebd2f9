//! Tests for the models module.

use jiff::Timestamp;

use super::*;

fn create_test_task(status: TaskStatus) -> Task {
    Task {
        id: "task-1".to_string(),
        loop_id: "loop-1".to_string(),
        user_id: "user-1".to_string(),
        title: "Research best time to visit Japan".to_string(),
        description: None,
        status,
        order: 0,
        created_at: Timestamp::from_second(1640995200).unwrap(),
        updated_at: None,
        completed_at: None,
    }
}

fn create_test_loop() -> Loop {
    Loop {
        id: "loop-1".to_string(),
        user_id: "user-1".to_string(),
        title: "Plan vacation to Japan".to_string(),
        description: Some("Two weeks in spring".to_string()),
        status: LoopStatus::Active,
        progress: None,
        total_steps: Some(8),
        completed_steps: Some(2),
        created_at: Timestamp::from_second(1640995200).unwrap(),
        updated_at: None,
        completed_at: None,
    }
}

#[test]
fn test_task_status_round_trips_through_str() {
    for status in [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ] {
        assert_eq!(status.as_str().parse::<TaskStatus>(), Ok(status));
    }
    assert!("done".parse::<TaskStatus>().is_err());
}

#[test]
fn test_loop_status_parse_is_case_insensitive() {
    assert_eq!("Archived".parse::<LoopStatus>(), Ok(LoopStatus::Archived));
    assert!("paused".parse::<LoopStatus>().is_err());
}

#[test]
fn test_task_status_serializes_snake_case() {
    let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
    assert_eq!(json, "\"in_progress\"");
}

#[test]
fn test_completion_timestamp_set_once() {
    let mut task = create_test_task(TaskStatus::Pending);
    let first = Timestamp::from_second(1700000000).unwrap();
    let later = Timestamp::from_second(1700001000).unwrap();

    task.set_status(TaskStatus::Completed, first);
    assert_eq!(task.completed_at, Some(first));

    // Re-entering completed from completed keeps the original stamp
    task.set_status(TaskStatus::Completed, later);
    assert_eq!(task.completed_at, Some(first));

    // Un-completing keeps it as well, and so does completing again
    task.set_status(TaskStatus::Pending, later);
    assert_eq!(task.completed_at, Some(first));
    task.set_status(TaskStatus::Completed, later);
    assert_eq!(task.completed_at, Some(first));
}

#[test]
fn test_toggled_flips_between_pending_and_completed() {
    assert_eq!(TaskStatus::Pending.toggled(), TaskStatus::Completed);
    assert_eq!(TaskStatus::InProgress.toggled(), TaskStatus::Completed);
    assert_eq!(TaskStatus::Completed.toggled(), TaskStatus::Pending);
}

#[test]
fn test_loop_counters() {
    let mut record = create_test_loop();
    assert_eq!(record.counters(), Some((8, 2)));
    assert!(record.counters_consistent());

    record.completed_steps = Some(9);
    assert!(!record.counters_consistent());

    record.total_steps = None;
    assert_eq!(record.counters(), None);
    assert!(record.counters_consistent());
}

#[test]
fn test_set_counters_derives_progress() {
    let mut record = create_test_loop();
    record.set_counters(3, 1);
    assert_eq!(record.counters(), Some((3, 1)));
    assert_eq!(record.progress, Some(33));

    record.set_counters(2, 5);
    assert_eq!(record.counters(), Some((2, 2)));
    assert_eq!(record.progress, Some(100));

    record.set_counters(0, 0);
    assert_eq!(record.progress, Some(0));
}

#[test]
fn test_loop_completion_stamped_on_first_completion() {
    let mut record = create_test_loop();
    let now = Timestamp::from_second(1700000000).unwrap();
    record.set_status(LoopStatus::Completed, now);
    assert_eq!(record.completed_at, Some(now));
    record.set_status(LoopStatus::Active, Timestamp::now());
    assert_eq!(record.completed_at, Some(now));
}

#[test]
fn test_loop_filter_hides_archived_by_default() {
    let mut record = create_test_loop();
    let filter = LoopFilter::default();
    assert!(filter.matches(&record));

    record.status = LoopStatus::Archived;
    assert!(!filter.matches(&record));
    assert!(LoopFilter::all().matches(&record));
    assert!(LoopFilter::with_status(LoopStatus::Archived).matches(&record));
    assert!(!LoopFilter::with_status(LoopStatus::Active).matches(&record));
}

#[test]
fn test_loop_filter_title_is_case_insensitive() {
    let record = create_test_loop();
    let filter = LoopFilter {
        title_contains: Some("JAPAN".to_string()),
        ..Default::default()
    };
    assert!(filter.matches(&record));

    let filter = LoopFilter {
        title_contains: Some("typescript".to_string()),
        ..Default::default()
    };
    assert!(!filter.matches(&record));
}

#[test]
fn test_loop_filter_date_range() {
    let record = create_test_loop();
    let filter = LoopFilter {
        created_after: Some(Timestamp::from_second(1600000000).unwrap()),
        created_before: Some(Timestamp::from_second(1650000000).unwrap()),
        ..Default::default()
    };
    assert!(filter.matches(&record));

    let filter = LoopFilter {
        created_after: Some(Timestamp::from_second(1650000000).unwrap()),
        ..Default::default()
    };
    assert!(!filter.matches(&record));
}

#[test]
fn test_reply_suggestion_requires_flag_and_title() {
    let mut reply = AssistantReply {
        reflection: "Sounds fun".to_string(),
        coaching: None,
        should_create_loop: true,
        suggested_title: Some("Trip".to_string()),
        tasks: vec!["Book flight".to_string()],
    };
    assert_eq!(
        reply.suggestion(),
        Some(LoopSuggestion {
            title: "Trip".to_string(),
            tasks: vec!["Book flight".to_string()],
        })
    );

    reply.suggested_title = Some("   ".to_string());
    assert_eq!(reply.suggestion(), None);

    reply.suggested_title = Some("Trip".to_string());
    reply.should_create_loop = false;
    assert_eq!(reply.suggestion(), None);
}

#[test]
fn test_chat_message_constructors() {
    let user = ChatMessage::user("hello");
    let assistant = ChatMessage::assistant("hi");
    assert!(!user.is_assistant());
    assert!(assistant.is_assistant());
    assert_ne!(user.id, assistant.id);
}
