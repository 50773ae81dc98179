//! crates/signlearn_core/src/ports.rs
//!
//! Defines the storage contract (trait) for the gamification engine.
//! The trait forms the boundary of the hexagonal architecture, allowing the
//! engine to be independent of the concrete database behind it.
//!
//! Every method that both reads and writes is contractually ONE atomic unit:
//! the implementation must either commit all of its effects or none of them,
//! and must never compute an increment from a stale read. Methods whose
//! documentation mentions locking are expected to hold row-level locks (or an
//! equivalent serialization) for their whole read-check-write sequence.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{
    Achievement, AchievementStatus, CategoryProgress, ChallengeBoardEntry, ChallengeOutcome,
    ChallengeSeed, DailyChallenge, NewQuizAttempt, Quiz, QuizAttempt, QuizQuestion, StatsSnapshot,
    StreakRecord, StreakStanding, User,
};

//=========================================================================================
// Error and Result Types
//=========================================================================================

/// The error taxonomy every engine operation reports through.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A referenced quiz, achievement, challenge, category or user is absent.
    #[error("not found: {0}")]
    NotFound(String),
    /// A uniqueness guarantee would be violated (duplicate unlock, duplicate
    /// daily set, insert race lost).
    #[error("conflict: {0}")]
    Conflict(String),
    /// The stored data cannot support the operation (e.g. a quiz with zero
    /// questions).
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// The caller supplied a malformed or out-of-range input.
    #[error("invalid input: {0}")]
    Validation(String),
    /// Storage contention retries were exhausted; the operation may be retried
    /// by the caller.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// Anything the other variants do not cover.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

//=========================================================================================
// Storage Port
//=========================================================================================

#[async_trait]
pub trait GamificationStore: Send + Sync {
    // --- Users & points ---

    async fn get_or_create_user(&self, user_id: Uuid) -> CoreResult<User>;

    async fn fetch_user(&self, user_id: Uuid) -> CoreResult<User>;

    /// Relative, atomic increment of the user's point balance. Returns the
    /// new total. The delta is applied in storage, never computed from a
    /// value the application read earlier.
    async fn add_points(&self, user_id: Uuid, delta: i32) -> CoreResult<i64>;

    // --- Streaks ---

    /// Records activity for `(user, day)`: creates the day record on first
    /// call (rolling the user's streak counters forward), increments its
    /// activity counter on repeats. One transaction with the user row locked.
    async fn record_streak_day(&self, user_id: Uuid, day: NaiveDate) -> CoreResult<StreakStanding>;

    /// Day records on or after `since`, newest first.
    async fn streak_days_since(
        &self,
        user_id: Uuid,
        since: NaiveDate,
    ) -> CoreResult<Vec<StreakRecord>>;

    // --- Quizzes ---

    async fn fetch_quiz(&self, quiz_id: Uuid) -> CoreResult<Quiz>;

    async fn fetch_quiz_questions(&self, quiz_id: Uuid) -> CoreResult<Vec<QuizQuestion>>;

    /// Persists the attempt and folds `score_percentage` into the category's
    /// rolling average in the same transaction, creating the progress row if
    /// it does not exist yet. Both commit together or not at all.
    async fn record_quiz_attempt(
        &self,
        attempt: NewQuizAttempt,
        category_id: Uuid,
        score_percentage: f64,
    ) -> CoreResult<QuizAttempt>;

    /// A user's attempts for one quiz, newest first.
    async fn quiz_attempts(&self, user_id: Uuid, quiz_id: Uuid) -> CoreResult<Vec<QuizAttempt>>;

    // --- Achievements ---

    async fn fetch_achievement(&self, achievement_id: Uuid) -> CoreResult<Achievement>;

    /// Active achievements the user has not unlocked yet.
    async fn locked_achievements(&self, user_id: Uuid) -> CoreResult<Vec<Achievement>>;

    /// All active achievements with the user's unlock state, unlocked first.
    async fn achievement_overview(&self, user_id: Uuid) -> CoreResult<Vec<AchievementStatus>>;

    /// The aggregate stats the unlock predicates run against.
    async fn stats_snapshot(&self, user_id: Uuid) -> CoreResult<StatsSnapshot>;

    /// Inserts the `(user, achievement)` unlock row and grants the reward in
    /// one transaction. Fails with `Conflict` if the row already exists; the
    /// insert-once constraint is what guards against duplicate unlocks under
    /// race.
    async fn unlock_achievement(
        &self,
        user_id: Uuid,
        achievement: &Achievement,
    ) -> CoreResult<DateTime<Utc>>;

    // --- Daily challenges ---

    async fn fetch_challenge(&self, challenge_id: Uuid) -> CoreResult<DailyChallenge>;

    /// The day's active challenges joined with the user's progress rows.
    async fn challenge_board(
        &self,
        user_id: Uuid,
        day: NaiveDate,
    ) -> CoreResult<Vec<ChallengeBoardEntry>>;

    /// Overwrites the stored progress with `progress`, stores the recomputed
    /// `completed` flag, and grants the reward exactly when the completion
    /// latch (`completed_at`) was previously unset and `completed` is true.
    /// One transaction with the progress row locked.
    async fn apply_challenge_progress(
        &self,
        user_id: Uuid,
        challenge: &DailyChallenge,
        progress: i32,
        completed: bool,
    ) -> CoreResult<ChallengeOutcome>;

    /// Creates a day's challenge set from `seeds`. Fails with `Conflict` if
    /// the day already has one.
    async fn create_daily_set(
        &self,
        day: NaiveDate,
        seeds: &[ChallengeSeed],
    ) -> CoreResult<Vec<DailyChallenge>>;

    // --- Category progress ---

    /// Fetches the `(user, category)` progress row, creating it first if
    /// absent. Fails with `NotFound` if the category does not exist.
    async fn ensure_category_progress(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> CoreResult<CategoryProgress>;

    /// Relative increment of `signs_learned`, creating the row if absent and
    /// touching `last_activity`. One transaction.
    async fn add_signs_learned(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        count: i32,
    ) -> CoreResult<CategoryProgress>;

    /// All progress rows for the user.
    async fn progress_overview(&self, user_id: Uuid) -> CoreResult<Vec<CategoryProgress>>;
}
