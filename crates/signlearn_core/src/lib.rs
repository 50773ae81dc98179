pub mod achievements;
pub mod challenges;
pub mod domain;
pub mod points;
pub mod ports;
pub mod progress;
pub mod quiz;
pub mod streak;

pub use achievements::AchievementEvaluator;
pub use challenges::ChallengeProgressTracker;
pub use points::PointsLedger;
pub use ports::{CoreError, CoreResult, GamificationStore};
pub use progress::ProgressTracker;
pub use quiz::QuizScorer;
pub use streak::StreakTracker;
