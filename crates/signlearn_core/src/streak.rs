//! crates/signlearn_core/src/streak.rs
//!
//! Day-over-day activity continuity.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use crate::domain::{StreakRecord, StreakStanding};
use crate::ports::{CoreResult, GamificationStore};

/// Rolls the stored streak counters forward for a newly recorded day.
///
/// `continued` is whether the user also had activity on the immediately
/// preceding calendar day. A gap of any length resets the streak to 1; the
/// longest streak never decreases.
pub fn advance(standing: StreakStanding, continued: bool) -> StreakStanding {
    let current = if continued { standing.current + 1 } else { 1 };
    StreakStanding {
        current,
        longest: standing.longest.max(current),
    }
}

pub struct StreakTracker {
    store: Arc<dyn GamificationStore>,
}

impl StreakTracker {
    pub fn new(store: Arc<dyn GamificationStore>) -> Self {
        Self { store }
    }

    /// Records one activity for `day` and returns the user's streak counters.
    ///
    /// The first activity of a calendar day moves the streak; repeats within
    /// the same day only bump that day's activity counter, so the operation
    /// is idempotent per day.
    pub async fn record_activity(
        &self,
        user_id: Uuid,
        day: NaiveDate,
    ) -> CoreResult<StreakStanding> {
        self.store.get_or_create_user(user_id).await?;
        self.store.record_streak_day(user_id, day).await
    }

    /// The user's activity records for the trailing `days` window ending at
    /// `today`, newest first.
    pub async fn calendar(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        days: u32,
    ) -> CoreResult<Vec<StreakRecord>> {
        let since = today - Duration::days(i64::from(days));
        self.store.streak_days_since(user_id, since).await
    }
}
