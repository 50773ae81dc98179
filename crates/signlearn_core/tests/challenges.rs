mod common;

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use common::MemoryStore;
use signlearn_core::challenges::DAILY_SEEDS;
use signlearn_core::ports::CoreError;
use signlearn_core::ChallengeProgressTracker;

fn day(text: &str) -> NaiveDate {
    text.parse().expect("valid date literal")
}

#[tokio::test]
async fn completion_reward_is_granted_exactly_once() {
    let store = Arc::new(MemoryStore::new());
    let tracker = ChallengeProgressTracker::new(store.clone());
    let user = Uuid::new_v4();
    let challenge = store.insert_challenge(day("2024-03-01"), 3, 40);

    let partial = tracker.report_progress(user, challenge, 2).await.unwrap();
    assert!(!partial.completed);
    assert_eq!(partial.points_earned, 0);

    let complete = tracker.report_progress(user, challenge, 3).await.unwrap();
    assert!(complete.completed);
    assert_eq!(complete.points_earned, 40);
    assert_eq!(store.total_points(user), 40);

    let repeat = tracker.report_progress(user, challenge, 3).await.unwrap();
    assert!(repeat.completed);
    assert_eq!(repeat.points_earned, 0);
    assert_eq!(store.total_points(user), 40);
}

#[tokio::test]
async fn progress_reports_are_absolute_overwrites() {
    let store = Arc::new(MemoryStore::new());
    let tracker = ChallengeProgressTracker::new(store.clone());
    let user = Uuid::new_v4();
    let today = day("2024-03-01");
    let challenge = store.insert_challenge(today, 10, 50);

    tracker.report_progress(user, challenge, 5).await.unwrap();
    let lowered = tracker.report_progress(user, challenge, 2).await.unwrap();
    assert_eq!(lowered.progress, 2);

    let board = tracker.board(user, today).await.unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].progress, 2);
}

#[tokio::test]
async fn a_lower_report_clears_completed_but_never_rearms_the_reward() {
    let store = Arc::new(MemoryStore::new());
    let tracker = ChallengeProgressTracker::new(store.clone());
    let user = Uuid::new_v4();
    let challenge = store.insert_challenge(day("2024-03-01"), 3, 40);

    tracker.report_progress(user, challenge, 3).await.unwrap();
    assert_eq!(store.total_points(user), 40);

    let lowered = tracker.report_progress(user, challenge, 1).await.unwrap();
    assert!(!lowered.completed);

    let recompleted = tracker.report_progress(user, challenge, 3).await.unwrap();
    assert!(recompleted.completed);
    assert_eq!(recompleted.points_earned, 0);
    assert_eq!(store.total_points(user), 40);
}

#[tokio::test]
async fn daily_set_generation_conflicts_on_the_second_call() {
    let store = Arc::new(MemoryStore::new());
    let tracker = ChallengeProgressTracker::new(store.clone());
    let today = day("2024-03-01");

    let created = tracker.generate_daily_set(today).await.unwrap();
    assert_eq!(created.len(), DAILY_SEEDS.len());
    assert!(created.iter().all(|c| c.day == today && c.is_active));

    let err = tracker.generate_daily_set(today).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));

    // a different day is untouched by the guard
    tracker.generate_daily_set(day("2024-03-02")).await.unwrap();
}

#[tokio::test]
async fn board_joins_the_users_progress_rows() {
    let store = Arc::new(MemoryStore::new());
    let tracker = ChallengeProgressTracker::new(store.clone());
    let user = Uuid::new_v4();
    let today = day("2024-03-01");

    let created = tracker.generate_daily_set(today).await.unwrap();
    tracker.report_progress(user, created[0].id, 1).await.unwrap();

    let board = tracker.board(user, today).await.unwrap();
    assert_eq!(board.len(), created.len());
    let touched = board.iter().find(|e| e.challenge.id == created[0].id).unwrap();
    assert_eq!(touched.progress, 1);
    assert!(board
        .iter()
        .filter(|e| e.challenge.id != created[0].id)
        .all(|e| e.progress == 0 && !e.completed));
}

#[tokio::test]
async fn unknown_challenge_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    let tracker = ChallengeProgressTracker::new(store.clone());

    let err = tracker
        .report_progress(Uuid::new_v4(), Uuid::new_v4(), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn negative_progress_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let tracker = ChallengeProgressTracker::new(store.clone());
    let challenge = store.insert_challenge(day("2024-03-01"), 3, 40);

    let err = tracker
        .report_progress(Uuid::new_v4(), challenge, -1)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}
