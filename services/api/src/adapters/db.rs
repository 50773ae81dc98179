//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `GamificationStore` port from the `core` crate. It handles all
//! interactions with the PostgreSQL database using `sqlx`.
//!
//! Every composite operation of the port runs as one transaction: the rows a
//! read-check-write sequence depends on are taken `FOR UPDATE` first, counter
//! updates are expressed as relative SQL increments, and serialization
//! failures or deadlocks are retried a bounded number of times before the
//! operation is reported as unavailable.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;
use uuid::Uuid;

use signlearn_core::domain::{
    Achievement, AchievementKind, AchievementStatus, CategoryProgress, ChallengeBoardEntry,
    ChallengeKind, ChallengeOutcome, ChallengeSeed, DailyChallenge, NewQuizAttempt, Quiz,
    QuizAttempt, QuizQuestion, StatsSnapshot, StreakRecord, StreakStanding, User,
};
use signlearn_core::ports::{CoreError, CoreResult, GamificationStore};
use signlearn_core::{challenges, quiz, streak};

/// How many times a transaction is replayed after lock contention before the
/// operation fails with `Unavailable`.
const MAX_CONTENTION_RETRIES: u32 = 3;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `GamificationStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// Internal Error Plumbing
//=========================================================================================

/// Error type used inside transaction bodies so `?` works for both database
/// failures (possibly retryable) and already-classified domain errors.
enum AdapterError {
    Db(sqlx::Error),
    Core(CoreError),
}

impl From<sqlx::Error> for AdapterError {
    fn from(err: sqlx::Error) -> Self {
        AdapterError::Db(err)
    }
}

impl From<CoreError> for AdapterError {
    fn from(err: CoreError) -> Self {
        AdapterError::Core(err)
    }
}

fn is_contention(err: &sqlx::Error) -> bool {
    // 40001 = serialization_failure, 40P01 = deadlock_detected
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "40001" || code == "40P01")
        .unwrap_or(false)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

fn unexpected(err: sqlx::Error) -> CoreError {
    CoreError::Unexpected(err.to_string())
}

impl DbAdapter {
    /// Runs a transaction body, replaying it on lock contention.
    async fn with_contention_retry<T, F, Fut>(&self, operation: &str, run: F) -> CoreResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, AdapterError>>,
    {
        let mut attempt = 0;
        loop {
            match run().await {
                Ok(value) => return Ok(value),
                Err(AdapterError::Core(err)) => return Err(err),
                Err(AdapterError::Db(err)) if is_contention(&err) => {
                    attempt += 1;
                    if attempt > MAX_CONTENTION_RETRIES {
                        return Err(CoreError::Unavailable(format!(
                            "{}: contention retries exhausted",
                            operation
                        )));
                    }
                    warn!(operation, attempt, "retrying transaction after contention");
                    sleep(Duration::from_millis(25 * u64::from(attempt))).await;
                }
                Err(AdapterError::Db(err)) => return Err(unexpected(err)),
            }
        }
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    current_streak: i32,
    longest_streak: i32,
    total_points: i64,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            current_streak: self.current_streak,
            longest_streak: self.longest_streak,
            total_points: self.total_points,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct StreakStandingRecord {
    current_streak: i32,
    longest_streak: i32,
}
impl StreakStandingRecord {
    fn to_domain(self) -> StreakStanding {
        StreakStanding {
            current: self.current_streak,
            longest: self.longest_streak,
        }
    }
}

#[derive(FromRow)]
struct StreakDayRecord {
    user_id: Uuid,
    streak_date: NaiveDate,
    activities_completed: i32,
}
impl StreakDayRecord {
    fn to_domain(self) -> StreakRecord {
        StreakRecord {
            user_id: self.user_id,
            day: self.streak_date,
            activities_completed: self.activities_completed,
        }
    }
}

#[derive(FromRow)]
struct CategoryProgressRecord {
    user_id: Uuid,
    category_id: Uuid,
    signs_learned: i32,
    total_signs: i32,
    quizzes_completed: i32,
    average_score: f64,
    total_time_spent: i32,
    last_activity: Option<DateTime<Utc>>,
}
impl CategoryProgressRecord {
    fn to_domain(self) -> CategoryProgress {
        CategoryProgress {
            user_id: self.user_id,
            category_id: self.category_id,
            signs_learned: self.signs_learned,
            total_signs: self.total_signs,
            quizzes_completed: self.quizzes_completed,
            average_score: self.average_score,
            total_time_spent: self.total_time_spent,
            last_activity: self.last_activity,
        }
    }
}

#[derive(FromRow)]
struct AchievementRecord {
    id: Uuid,
    title: String,
    description: String,
    achievement_type: String,
    requirement_value: i32,
    points_reward: i32,
    is_active: bool,
}
impl AchievementRecord {
    fn to_domain(self) -> CoreResult<Achievement> {
        let kind = AchievementKind::parse(&self.achievement_type).ok_or_else(|| {
            CoreError::Unexpected(format!(
                "unknown achievement type '{}'",
                self.achievement_type
            ))
        })?;
        Ok(Achievement {
            id: self.id,
            title: self.title,
            description: self.description,
            kind,
            requirement_value: self.requirement_value,
            points_reward: self.points_reward,
            is_active: self.is_active,
        })
    }
}

#[derive(FromRow)]
struct AchievementStatusRecord {
    id: Uuid,
    title: String,
    description: String,
    achievement_type: String,
    requirement_value: i32,
    points_reward: i32,
    is_active: bool,
    unlocked_at: Option<DateTime<Utc>>,
}
impl AchievementStatusRecord {
    fn to_domain(self) -> CoreResult<AchievementStatus> {
        let unlocked_at = self.unlocked_at;
        let achievement = AchievementRecord {
            id: self.id,
            title: self.title,
            description: self.description,
            achievement_type: self.achievement_type,
            requirement_value: self.requirement_value,
            points_reward: self.points_reward,
            is_active: self.is_active,
        }
        .to_domain()?;
        Ok(AchievementStatus {
            achievement,
            unlocked_at,
        })
    }
}

#[derive(FromRow)]
struct StatsRecord {
    current_streak: i32,
    total_signs_learned: i64,
    total_quiz_attempts: i64,
}
impl StatsRecord {
    fn to_domain(self) -> StatsSnapshot {
        StatsSnapshot {
            current_streak: self.current_streak,
            total_signs_learned: self.total_signs_learned,
            total_quiz_attempts: self.total_quiz_attempts,
        }
    }
}

#[derive(FromRow)]
struct QuizRecord {
    id: Uuid,
    category_id: Uuid,
    title: String,
    passing_score: i32,
    time_limit: Option<i32>,
    is_active: bool,
}
impl QuizRecord {
    fn to_domain(self) -> Quiz {
        Quiz {
            id: self.id,
            category_id: self.category_id,
            title: self.title,
            passing_score: self.passing_score,
            time_limit: self.time_limit,
            is_active: self.is_active,
        }
    }
}

#[derive(FromRow)]
struct QuizQuestionRecord {
    id: Uuid,
    quiz_id: Uuid,
    correct_answer: String,
    points: i32,
}
impl QuizQuestionRecord {
    fn to_domain(self) -> QuizQuestion {
        QuizQuestion {
            id: self.id,
            quiz_id: self.quiz_id,
            correct_answer: self.correct_answer,
            points: self.points,
        }
    }
}

#[derive(FromRow)]
struct QuizAttemptRecord {
    id: Uuid,
    user_id: Uuid,
    quiz_id: Uuid,
    score: i32,
    total_questions: i32,
    correct_answers: i32,
    time_taken: Option<i32>,
    passed: bool,
    completed_at: DateTime<Utc>,
}
impl QuizAttemptRecord {
    fn to_domain(self) -> QuizAttempt {
        QuizAttempt {
            id: self.id,
            user_id: self.user_id,
            quiz_id: self.quiz_id,
            score: self.score,
            total_questions: self.total_questions,
            correct_answers: self.correct_answers,
            time_taken: self.time_taken,
            passed: self.passed,
            completed_at: self.completed_at,
        }
    }
}

#[derive(FromRow)]
struct ChallengeRecord {
    id: Uuid,
    title: String,
    description: String,
    challenge_type: String,
    target_value: i32,
    reward_points: i32,
    challenge_date: NaiveDate,
    is_active: bool,
}
impl ChallengeRecord {
    fn to_domain(self) -> CoreResult<DailyChallenge> {
        let kind = ChallengeKind::parse(&self.challenge_type).ok_or_else(|| {
            CoreError::Unexpected(format!("unknown challenge type '{}'", self.challenge_type))
        })?;
        Ok(DailyChallenge {
            id: self.id,
            title: self.title,
            description: self.description,
            kind,
            target_value: self.target_value,
            reward_points: self.reward_points,
            day: self.challenge_date,
            is_active: self.is_active,
        })
    }
}

#[derive(FromRow)]
struct ChallengeBoardRecord {
    id: Uuid,
    title: String,
    description: String,
    challenge_type: String,
    target_value: i32,
    reward_points: i32,
    challenge_date: NaiveDate,
    is_active: bool,
    user_progress: i32,
    is_completed: bool,
}
impl ChallengeBoardRecord {
    fn to_domain(self) -> CoreResult<ChallengeBoardEntry> {
        let progress = self.user_progress;
        let completed = self.is_completed;
        let challenge = ChallengeRecord {
            id: self.id,
            title: self.title,
            description: self.description,
            challenge_type: self.challenge_type,
            target_value: self.target_value,
            reward_points: self.reward_points,
            challenge_date: self.challenge_date,
            is_active: self.is_active,
        }
        .to_domain()?;
        Ok(ChallengeBoardEntry {
            challenge,
            progress,
            completed,
        })
    }
}

//=========================================================================================
// Transaction Bodies
//=========================================================================================

impl DbAdapter {
    async fn try_record_streak_day(
        &self,
        user_id: Uuid,
        day: NaiveDate,
    ) -> Result<StreakStanding, AdapterError> {
        let mut tx = self.pool.begin().await?;

        // Lock the user row first so concurrent calls for the same day
        // serialize on it.
        let standing: Option<StreakStandingRecord> = sqlx::query_as(
            "SELECT current_streak, longest_streak FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let standing = standing
            .ok_or_else(|| CoreError::NotFound(format!("user {} not found", user_id)))?
            .to_domain();

        let bumped = sqlx::query(
            "UPDATE user_streaks SET activities_completed = activities_completed + 1 \
             WHERE user_id = $1 AND streak_date = $2",
        )
        .bind(user_id)
        .bind(day)
        .execute(&mut *tx)
        .await?;
        if bumped.rows_affected() > 0 {
            // Repeat activity within the same day: counters are untouched.
            tx.commit().await?;
            return Ok(standing);
        }

        sqlx::query(
            "INSERT INTO user_streaks (user_id, streak_date, activities_completed) \
             VALUES ($1, $2, 1)",
        )
        .bind(user_id)
        .bind(day)
        .execute(&mut *tx)
        .await?;

        let continued: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM user_streaks WHERE user_id = $1 AND streak_date = $2)",
        )
        .bind(user_id)
        .bind(day - chrono::Duration::days(1))
        .fetch_one(&mut *tx)
        .await?;

        let next = streak::advance(standing, continued);
        sqlx::query("UPDATE users SET current_streak = $2, longest_streak = $3 WHERE id = $1")
            .bind(user_id)
            .bind(next.current)
            .bind(next.longest)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(next)
    }

    /// Creates the `(user, category)` progress row, tolerating a concurrent
    /// creation, and returns it locked.
    async fn create_progress_row(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<CategoryProgressRecord, AdapterError> {
        let total_signs: Option<i32> =
            sqlx::query_scalar("SELECT total_signs FROM categories WHERE id = $1")
                .bind(category_id)
                .fetch_optional(&mut **tx)
                .await?;
        let total_signs = total_signs
            .ok_or_else(|| CoreError::NotFound(format!("category {} not found", category_id)))?;

        sqlx::query(
            "INSERT INTO user_progress (user_id, category_id, total_signs) \
             VALUES ($1, $2, $3) ON CONFLICT (user_id, category_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(category_id)
        .bind(total_signs)
        .execute(&mut **tx)
        .await?;

        let row: CategoryProgressRecord = sqlx::query_as(
            "SELECT user_id, category_id, signs_learned, total_signs, quizzes_completed, \
                    average_score, total_time_spent, last_activity \
             FROM user_progress WHERE user_id = $1 AND category_id = $2 FOR UPDATE",
        )
        .bind(user_id)
        .bind(category_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(row)
    }

    async fn try_record_quiz_attempt(
        &self,
        attempt: &NewQuizAttempt,
        category_id: Uuid,
        score_percentage: f64,
    ) -> Result<QuizAttempt, AdapterError> {
        let mut tx = self.pool.begin().await?;

        let stored: QuizAttemptRecord = sqlx::query_as(
            "INSERT INTO user_quiz_attempts \
             (user_id, quiz_id, score, total_questions, correct_answers, time_taken, passed) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, user_id, quiz_id, score, total_questions, correct_answers, \
                       time_taken, passed, completed_at",
        )
        .bind(attempt.user_id)
        .bind(attempt.quiz_id)
        .bind(attempt.score)
        .bind(attempt.total_questions)
        .bind(attempt.correct_answers)
        .bind(attempt.time_taken)
        .bind(attempt.passed)
        .fetch_one(&mut *tx)
        .await?;

        let progress: Option<CategoryProgressRecord> = sqlx::query_as(
            "SELECT user_id, category_id, signs_learned, total_signs, quizzes_completed, \
                    average_score, total_time_spent, last_activity \
             FROM user_progress WHERE user_id = $1 AND category_id = $2 FOR UPDATE",
        )
        .bind(attempt.user_id)
        .bind(category_id)
        .fetch_optional(&mut *tx)
        .await?;
        let progress = match progress {
            Some(row) => row,
            None => {
                self.create_progress_row(&mut tx, attempt.user_id, category_id)
                    .await?
            }
        };

        // The fold must see the count as it was before this attempt; the row
        // is locked, so the read pair is consistent.
        let folded = quiz::fold_average(
            progress.average_score,
            progress.quizzes_completed,
            score_percentage,
        );
        sqlx::query(
            "UPDATE user_progress \
             SET quizzes_completed = quizzes_completed + 1, average_score = $3, \
                 last_activity = NOW() \
             WHERE user_id = $1 AND category_id = $2",
        )
        .bind(attempt.user_id)
        .bind(category_id)
        .bind(folded)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(stored.to_domain())
    }

    async fn try_unlock_achievement(
        &self,
        user_id: Uuid,
        achievement: &Achievement,
    ) -> Result<DateTime<Utc>, AdapterError> {
        let mut tx = self.pool.begin().await?;

        let unlocked_at: DateTime<Utc> = sqlx::query_scalar(
            "INSERT INTO user_achievements (user_id, achievement_id) \
             VALUES ($1, $2) RETURNING unlocked_at",
        )
        .bind(user_id)
        .bind(achievement.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AdapterError::Core(CoreError::Conflict(format!(
                    "achievement {} already unlocked",
                    achievement.id
                )))
            } else {
                AdapterError::Db(err)
            }
        })?;

        let granted = sqlx::query("UPDATE users SET total_points = total_points + $2 WHERE id = $1")
            .bind(user_id)
            .bind(achievement.points_reward)
            .execute(&mut *tx)
            .await?;
        if granted.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("user {} not found", user_id)).into());
        }

        tx.commit().await?;
        Ok(unlocked_at)
    }

    async fn try_apply_challenge_progress(
        &self,
        user_id: Uuid,
        challenge: &DailyChallenge,
        progress: i32,
        completed: bool,
    ) -> Result<ChallengeOutcome, AdapterError> {
        let mut tx = self.pool.begin().await?;

        // The latch is `completed_at`; the locked read pins the row for the
        // whole read-check-write.
        let mut latch: Option<Option<DateTime<Utc>>> = sqlx::query_scalar(
            "SELECT completed_at FROM user_daily_challenges \
             WHERE user_id = $1 AND challenge_id = $2 FOR UPDATE",
        )
        .bind(user_id)
        .bind(challenge.id)
        .fetch_optional(&mut *tx)
        .await?;

        if latch.is_none() {
            let inserted = sqlx::query(
                "INSERT INTO user_daily_challenges \
                 (user_id, challenge_id, progress, completed, completed_at) \
                 VALUES ($1, $2, $3, $4, CASE WHEN $4 THEN NOW() ELSE NULL END) \
                 ON CONFLICT (user_id, challenge_id) DO NOTHING",
            )
            .bind(user_id)
            .bind(challenge.id)
            .bind(progress)
            .bind(completed)
            .execute(&mut *tx)
            .await?;
            if inserted.rows_affected() == 0 {
                // Lost the creation race; re-read the winner's row locked.
                latch = Some(
                    sqlx::query_scalar(
                        "SELECT completed_at FROM user_daily_challenges \
                         WHERE user_id = $1 AND challenge_id = $2 FOR UPDATE",
                    )
                    .bind(user_id)
                    .bind(challenge.id)
                    .fetch_one(&mut *tx)
                    .await?,
                );
            }
        }

        let award = match latch {
            // Freshly inserted above with the final values already in place.
            None => challenges::award_due(false, completed),
            Some(completed_at) => {
                let award = challenges::award_due(completed_at.is_some(), completed);
                sqlx::query(
                    "UPDATE user_daily_challenges \
                     SET progress = $3, completed = $4, \
                         completed_at = CASE WHEN $5 THEN NOW() ELSE completed_at END \
                     WHERE user_id = $1 AND challenge_id = $2",
                )
                .bind(user_id)
                .bind(challenge.id)
                .bind(progress)
                .bind(completed)
                .bind(award)
                .execute(&mut *tx)
                .await?;
                award
            }
        };

        let points_earned = if award { challenge.reward_points } else { 0 };
        if award {
            let granted =
                sqlx::query("UPDATE users SET total_points = total_points + $2 WHERE id = $1")
                    .bind(user_id)
                    .bind(points_earned)
                    .execute(&mut *tx)
                    .await?;
            if granted.rows_affected() == 0 {
                return Err(CoreError::NotFound(format!("user {} not found", user_id)).into());
            }
        }

        tx.commit().await?;
        Ok(ChallengeOutcome {
            progress,
            target: challenge.target_value,
            completed,
            points_earned,
        })
    }

    async fn try_create_daily_set(
        &self,
        day: NaiveDate,
        seeds: &[ChallengeSeed],
    ) -> Result<Vec<DailyChallenge>, AdapterError> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM daily_challenges WHERE challenge_date = $1)",
        )
        .bind(day)
        .fetch_one(&mut *tx)
        .await?;
        if exists {
            return Err(CoreError::Conflict(format!(
                "challenges for {} already generated",
                day
            ))
            .into());
        }

        let mut created = Vec::with_capacity(seeds.len());
        for seed in seeds {
            let row: ChallengeRecord = sqlx::query_as(
                "INSERT INTO daily_challenges \
                 (title, description, challenge_type, target_value, reward_points, challenge_date) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 RETURNING id, title, description, challenge_type, target_value, reward_points, \
                           challenge_date, is_active",
            )
            .bind(seed.title)
            .bind(seed.description)
            .bind(seed.kind.as_str())
            .bind(seed.target_value)
            .bind(seed.reward_points)
            .bind(day)
            .fetch_one(&mut *tx)
            .await
            .map_err(|err| {
                // The (date, title) unique index closes the generate race.
                if is_unique_violation(&err) {
                    AdapterError::Core(CoreError::Conflict(format!(
                        "challenges for {} already generated",
                        day
                    )))
                } else {
                    AdapterError::Db(err)
                }
            })?;
            created.push(row.to_domain()?);
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn try_ensure_category_progress(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<CategoryProgress, AdapterError> {
        let mut tx = self.pool.begin().await?;
        let existing: Option<CategoryProgressRecord> = sqlx::query_as(
            "SELECT user_id, category_id, signs_learned, total_signs, quizzes_completed, \
                    average_score, total_time_spent, last_activity \
             FROM user_progress WHERE user_id = $1 AND category_id = $2",
        )
        .bind(user_id)
        .bind(category_id)
        .fetch_optional(&mut *tx)
        .await?;
        let row = match existing {
            Some(row) => row,
            None => self.create_progress_row(&mut tx, user_id, category_id).await?,
        };
        tx.commit().await?;
        Ok(row.to_domain())
    }

    async fn try_add_signs_learned(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        count: i32,
    ) -> Result<CategoryProgress, AdapterError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM user_progress \
             WHERE user_id = $1 AND category_id = $2 FOR UPDATE",
        )
        .bind(user_id)
        .bind(category_id)
        .fetch_optional(&mut *tx)
        .await?;
        if existing.is_none() {
            self.create_progress_row(&mut tx, user_id, category_id).await?;
        }

        let updated: CategoryProgressRecord = sqlx::query_as(
            "UPDATE user_progress \
             SET signs_learned = signs_learned + $3, last_activity = NOW() \
             WHERE user_id = $1 AND category_id = $2 \
             RETURNING user_id, category_id, signs_learned, total_signs, quizzes_completed, \
                       average_score, total_time_spent, last_activity",
        )
        .bind(user_id)
        .bind(category_id)
        .bind(count)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated.to_domain())
    }
}

//=========================================================================================
// `GamificationStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl GamificationStore for DbAdapter {
    async fn get_or_create_user(&self, user_id: Uuid) -> CoreResult<User> {
        sqlx::query("INSERT INTO users (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        self.fetch_user(user_id).await
    }

    async fn fetch_user(&self, user_id: Uuid) -> CoreResult<User> {
        let record: UserRecord = sqlx::query_as(
            "SELECT id, current_streak, longest_streak, total_points, created_at \
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => CoreError::NotFound(format!("user {} not found", user_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn add_points(&self, user_id: Uuid, delta: i32) -> CoreResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "UPDATE users SET total_points = total_points + $2 WHERE id = $1 \
             RETURNING total_points",
        )
        .bind(user_id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        total.ok_or_else(|| CoreError::NotFound(format!("user {} not found", user_id)))
    }

    async fn record_streak_day(&self, user_id: Uuid, day: NaiveDate) -> CoreResult<StreakStanding> {
        self.with_contention_retry("record_streak_day", || {
            self.try_record_streak_day(user_id, day)
        })
        .await
    }

    async fn streak_days_since(
        &self,
        user_id: Uuid,
        since: NaiveDate,
    ) -> CoreResult<Vec<StreakRecord>> {
        let records: Vec<StreakDayRecord> = sqlx::query_as(
            "SELECT user_id, streak_date, activities_completed FROM user_streaks \
             WHERE user_id = $1 AND streak_date >= $2 \
             ORDER BY streak_date DESC",
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn fetch_quiz(&self, quiz_id: Uuid) -> CoreResult<Quiz> {
        let record: QuizRecord = sqlx::query_as(
            "SELECT id, category_id, title, passing_score, time_limit, is_active \
             FROM quizzes WHERE id = $1",
        )
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => CoreError::NotFound(format!("quiz {} not found", quiz_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn fetch_quiz_questions(&self, quiz_id: Uuid) -> CoreResult<Vec<QuizQuestion>> {
        let records: Vec<QuizQuestionRecord> = sqlx::query_as(
            "SELECT id, quiz_id, correct_answer, points FROM quiz_questions \
             WHERE quiz_id = $1 ORDER BY order_index ASC",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn record_quiz_attempt(
        &self,
        attempt: NewQuizAttempt,
        category_id: Uuid,
        score_percentage: f64,
    ) -> CoreResult<QuizAttempt> {
        self.with_contention_retry("record_quiz_attempt", || {
            self.try_record_quiz_attempt(&attempt, category_id, score_percentage)
        })
        .await
    }

    async fn quiz_attempts(&self, user_id: Uuid, quiz_id: Uuid) -> CoreResult<Vec<QuizAttempt>> {
        let records: Vec<QuizAttemptRecord> = sqlx::query_as(
            "SELECT id, user_id, quiz_id, score, total_questions, correct_answers, \
                    time_taken, passed, completed_at \
             FROM user_quiz_attempts \
             WHERE user_id = $1 AND quiz_id = $2 \
             ORDER BY completed_at DESC",
        )
        .bind(user_id)
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn fetch_achievement(&self, achievement_id: Uuid) -> CoreResult<Achievement> {
        let record: AchievementRecord = sqlx::query_as(
            "SELECT id, title, description, achievement_type, requirement_value, \
                    points_reward, is_active \
             FROM achievements WHERE id = $1",
        )
        .bind(achievement_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                CoreError::NotFound(format!("achievement {} not found", achievement_id))
            }
            _ => unexpected(e),
        })?;
        record.to_domain()
    }

    async fn locked_achievements(&self, user_id: Uuid) -> CoreResult<Vec<Achievement>> {
        let records: Vec<AchievementRecord> = sqlx::query_as(
            "SELECT a.id, a.title, a.description, a.achievement_type, a.requirement_value, \
                    a.points_reward, a.is_active \
             FROM achievements a \
             LEFT JOIN user_achievements ua \
               ON ua.achievement_id = a.id AND ua.user_id = $1 \
             WHERE ua.user_id IS NULL AND a.is_active = TRUE \
             ORDER BY a.points_reward ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn achievement_overview(&self, user_id: Uuid) -> CoreResult<Vec<AchievementStatus>> {
        let records: Vec<AchievementStatusRecord> = sqlx::query_as(
            "SELECT a.id, a.title, a.description, a.achievement_type, a.requirement_value, \
                    a.points_reward, a.is_active, ua.unlocked_at \
             FROM achievements a \
             LEFT JOIN user_achievements ua \
               ON ua.achievement_id = a.id AND ua.user_id = $1 \
             WHERE a.is_active = TRUE \
             ORDER BY ua.unlocked_at IS NULL, a.points_reward ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn stats_snapshot(&self, user_id: Uuid) -> CoreResult<StatsSnapshot> {
        let record: StatsRecord = sqlx::query_as(
            "SELECT u.current_streak, \
                    COALESCE((SELECT SUM(p.signs_learned) FROM user_progress p \
                              WHERE p.user_id = u.id), 0) AS total_signs_learned, \
                    (SELECT COUNT(*) FROM user_quiz_attempts a \
                     WHERE a.user_id = u.id) AS total_quiz_attempts \
             FROM users u WHERE u.id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => CoreError::NotFound(format!("user {} not found", user_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn unlock_achievement(
        &self,
        user_id: Uuid,
        achievement: &Achievement,
    ) -> CoreResult<DateTime<Utc>> {
        self.with_contention_retry("unlock_achievement", || {
            self.try_unlock_achievement(user_id, achievement)
        })
        .await
    }

    async fn fetch_challenge(&self, challenge_id: Uuid) -> CoreResult<DailyChallenge> {
        let record: ChallengeRecord = sqlx::query_as(
            "SELECT id, title, description, challenge_type, target_value, reward_points, \
                    challenge_date, is_active \
             FROM daily_challenges WHERE id = $1",
        )
        .bind(challenge_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                CoreError::NotFound(format!("challenge {} not found", challenge_id))
            }
            _ => unexpected(e),
        })?;
        record.to_domain()
    }

    async fn challenge_board(
        &self,
        user_id: Uuid,
        day: NaiveDate,
    ) -> CoreResult<Vec<ChallengeBoardEntry>> {
        let records: Vec<ChallengeBoardRecord> = sqlx::query_as(
            "SELECT c.id, c.title, c.description, c.challenge_type, c.target_value, \
                    c.reward_points, c.challenge_date, c.is_active, \
                    COALESCE(uc.progress, 0) AS user_progress, \
                    COALESCE(uc.completed, FALSE) AS is_completed \
             FROM daily_challenges c \
             LEFT JOIN user_daily_challenges uc \
               ON uc.challenge_id = c.id AND uc.user_id = $1 \
             WHERE c.challenge_date = $2 AND c.is_active = TRUE \
             ORDER BY c.created_at ASC, c.id ASC",
        )
        .bind(user_id)
        .bind(day)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn apply_challenge_progress(
        &self,
        user_id: Uuid,
        challenge: &DailyChallenge,
        progress: i32,
        completed: bool,
    ) -> CoreResult<ChallengeOutcome> {
        self.with_contention_retry("apply_challenge_progress", || {
            self.try_apply_challenge_progress(user_id, challenge, progress, completed)
        })
        .await
    }

    async fn create_daily_set(
        &self,
        day: NaiveDate,
        seeds: &[ChallengeSeed],
    ) -> CoreResult<Vec<DailyChallenge>> {
        self.with_contention_retry("create_daily_set", || self.try_create_daily_set(day, seeds))
            .await
    }

    async fn ensure_category_progress(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> CoreResult<CategoryProgress> {
        self.with_contention_retry("ensure_category_progress", || {
            self.try_ensure_category_progress(user_id, category_id)
        })
        .await
    }

    async fn add_signs_learned(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        count: i32,
    ) -> CoreResult<CategoryProgress> {
        self.with_contention_retry("add_signs_learned", || {
            self.try_add_signs_learned(user_id, category_id, count)
        })
        .await
    }

    async fn progress_overview(&self, user_id: Uuid) -> CoreResult<Vec<CategoryProgress>> {
        let records: Vec<CategoryProgressRecord> = sqlx::query_as(
            "SELECT p.user_id, p.category_id, p.signs_learned, p.total_signs, \
                    p.quizzes_completed, p.average_score, p.total_time_spent, p.last_activity \
             FROM user_progress p \
             JOIN categories c ON c.id = p.category_id \
             WHERE p.user_id = $1 \
             ORDER BY c.name ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}
