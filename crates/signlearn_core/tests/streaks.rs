mod common;

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use common::MemoryStore;
use signlearn_core::ports::GamificationStore;
use signlearn_core::StreakTracker;

fn day(text: &str) -> NaiveDate {
    text.parse().expect("valid date literal")
}

#[tokio::test]
async fn consecutive_days_extend_the_streak() {
    let store = Arc::new(MemoryStore::new());
    let tracker = StreakTracker::new(store.clone());
    let user = Uuid::new_v4();
    let start = day("2024-03-01");

    for offset in 0..5 {
        let standing = tracker
            .record_activity(user, start + Duration::days(offset))
            .await
            .unwrap();
        assert_eq!(standing.current, offset as i32 + 1);
    }

    let user_row = store.fetch_user(user).await.unwrap();
    assert_eq!(user_row.current_streak, 5);
    assert_eq!(user_row.longest_streak, 5);
}

#[tokio::test]
async fn a_missed_day_resets_the_streak_to_one() {
    let store = Arc::new(MemoryStore::new());
    let tracker = StreakTracker::new(store.clone());
    let user = Uuid::new_v4();

    tracker.record_activity(user, day("2024-03-01")).await.unwrap();
    tracker.record_activity(user, day("2024-03-02")).await.unwrap();
    // no activity on the 3rd
    let standing = tracker.record_activity(user, day("2024-03-04")).await.unwrap();

    assert_eq!(standing.current, 1);
    assert_eq!(standing.longest, 2);
}

#[tokio::test]
async fn repeated_activity_on_the_same_day_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let tracker = StreakTracker::new(store.clone());
    let user = Uuid::new_v4();
    let today = day("2024-03-01");

    let first = tracker.record_activity(user, today).await.unwrap();
    let second = tracker.record_activity(user, today).await.unwrap();
    assert_eq!(first, second);

    let calendar = tracker.calendar(user, today, 7).await.unwrap();
    assert_eq!(calendar.len(), 1);
    assert_eq!(calendar[0].activities_completed, 2);
}

#[tokio::test]
async fn longest_streak_never_drops_below_current() {
    let store = Arc::new(MemoryStore::new());
    let tracker = StreakTracker::new(store.clone());
    let user = Uuid::new_v4();

    let days = ["2024-03-01", "2024-03-02", "2024-03-03", "2024-03-05", "2024-03-06"];
    let mut longest_seen = 0;
    for text in days {
        let standing = tracker.record_activity(user, day(text)).await.unwrap();
        assert!(standing.longest >= standing.current);
        assert!(standing.longest >= longest_seen);
        longest_seen = standing.longest;
    }
    // the reset after the gap kept the earlier record
    assert_eq!(longest_seen, 3);
}

#[tokio::test]
async fn calendar_lists_recent_days_newest_first() {
    let store = Arc::new(MemoryStore::new());
    let tracker = StreakTracker::new(store.clone());
    let user = Uuid::new_v4();

    for text in ["2024-03-01", "2024-03-02", "2024-03-04"] {
        tracker.record_activity(user, day(text)).await.unwrap();
    }

    let calendar = tracker.calendar(user, day("2024-03-04"), 30).await.unwrap();
    let days: Vec<NaiveDate> = calendar.iter().map(|r| r.day).collect();
    assert_eq!(days, vec![day("2024-03-04"), day("2024-03-02"), day("2024-03-01")]);
}
