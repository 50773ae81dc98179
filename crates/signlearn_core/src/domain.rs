//! crates/signlearn_core/src/domain.rs
//!
//! Defines the pure, core data structures for the gamification engine.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// A learner. Root of all per-user gamification state.
///
/// Invariants maintained by the engine: `longest_streak >= current_streak`,
/// `total_points >= 0`.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub total_points: i64,
    pub created_at: DateTime<Utc>,
}

/// One calendar day with at least one recorded activity.
#[derive(Debug, Clone)]
pub struct StreakRecord {
    pub user_id: Uuid,
    pub day: NaiveDate,
    pub activities_completed: i32,
}

/// The streak counters stored on the user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakStanding {
    pub current: i32,
    pub longest: i32,
}

/// A sign category. Read-only reference data.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub total_signs: i32,
}

/// Per-(user, category) learning progress. Created lazily on first use.
#[derive(Debug, Clone)]
pub struct CategoryProgress {
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub signs_learned: i32,
    pub total_signs: i32,
    pub quizzes_completed: i32,
    pub average_score: f64,
    pub total_time_spent: i32,
    pub last_activity: Option<DateTime<Utc>>,
}

/// The rule family an achievement belongs to.
///
/// `Social` and `Special` have no built-in unlock rule; they exist for
/// manual grants and future rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementKind {
    Streak,
    Quiz,
    Progress,
    Social,
    Special,
}

impl AchievementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementKind::Streak => "streak",
            AchievementKind::Quiz => "quiz",
            AchievementKind::Progress => "progress",
            AchievementKind::Social => "social",
            AchievementKind::Special => "special",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "streak" => Some(AchievementKind::Streak),
            "quiz" => Some(AchievementKind::Quiz),
            "progress" => Some(AchievementKind::Progress),
            "social" => Some(AchievementKind::Social),
            "special" => Some(AchievementKind::Special),
            _ => None,
        }
    }
}

/// An unlockable achievement. Read-only reference data.
#[derive(Debug, Clone)]
pub struct Achievement {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub kind: AchievementKind,
    pub requirement_value: i32,
    pub points_reward: i32,
    pub is_active: bool,
}

/// An achievement together with one user's unlock state.
#[derive(Debug, Clone)]
pub struct AchievementStatus {
    pub achievement: Achievement,
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// A freshly granted achievement, as reported back to the caller.
#[derive(Debug, Clone)]
pub struct GrantedAchievement {
    pub achievement_id: Uuid,
    pub title: String,
    pub points_earned: i32,
}

/// Snapshot of the aggregate stats the unlock predicates run against.
/// Computed fresh for every evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsSnapshot {
    pub current_streak: i32,
    pub total_signs_learned: i64,
    pub total_quiz_attempts: i64,
}

/// A quiz definition. Read-only reference data.
#[derive(Debug, Clone)]
pub struct Quiz {
    pub id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    /// Percentage threshold an attempt must meet or exceed to pass.
    pub passing_score: i32,
    pub time_limit: Option<i32>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct QuizQuestion {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub correct_answer: String,
    pub points: i32,
}

/// An immutable record of one graded quiz submission. Never updated after
/// creation.
#[derive(Debug, Clone)]
pub struct QuizAttempt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub quiz_id: Uuid,
    pub score: i32,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub time_taken: Option<i32>,
    pub passed: bool,
    pub completed_at: DateTime<Utc>,
}

/// What `QuizScorer` hands the store for persistence. The id and timestamp
/// are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewQuizAttempt {
    pub user_id: Uuid,
    pub quiz_id: Uuid,
    pub score: i32,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub time_taken: Option<i32>,
    pub passed: bool,
}

/// Grading result returned to the caller of `score_attempt`.
#[derive(Debug, Clone)]
pub struct QuizOutcome {
    pub attempt: QuizAttempt,
    pub score_percentage: f64,
}

/// What a daily challenge asks the user to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeKind {
    Quiz,
    Practice,
    MemoryGame,
    Streak,
}

impl ChallengeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeKind::Quiz => "quiz",
            ChallengeKind::Practice => "practice",
            ChallengeKind::MemoryGame => "memory_game",
            ChallengeKind::Streak => "streak",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "quiz" => Some(ChallengeKind::Quiz),
            "practice" => Some(ChallengeKind::Practice),
            "memory_game" => Some(ChallengeKind::MemoryGame),
            "streak" => Some(ChallengeKind::Streak),
            _ => None,
        }
    }
}

/// One challenge generated for a specific calendar date.
#[derive(Debug, Clone)]
pub struct DailyChallenge {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub kind: ChallengeKind,
    pub target_value: i32,
    pub reward_points: i32,
    pub day: NaiveDate,
    pub is_active: bool,
}

/// Definition used when generating a day's challenge set.
#[derive(Debug, Clone, Copy)]
pub struct ChallengeSeed {
    pub title: &'static str,
    pub description: &'static str,
    pub kind: ChallengeKind,
    pub target_value: i32,
    pub reward_points: i32,
}

/// One user's stored progress on one challenge. Updated in place until
/// completion.
#[derive(Debug, Clone)]
pub struct ChallengeProgress {
    pub user_id: Uuid,
    pub challenge_id: Uuid,
    pub progress: i32,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Result of an absolute progress report.
#[derive(Debug, Clone)]
pub struct ChallengeOutcome {
    pub progress: i32,
    pub target: i32,
    pub completed: bool,
    pub points_earned: i32,
}

/// A challenge joined with the reporting user's progress, for the daily
/// board.
#[derive(Debug, Clone)]
pub struct ChallengeBoardEntry {
    pub challenge: DailyChallenge,
    pub progress: i32,
    pub completed: bool,
}
