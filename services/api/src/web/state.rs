//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use signlearn_core::ports::GamificationStore;
use signlearn_core::{
    AchievementEvaluator, ChallengeProgressTracker, ProgressTracker, QuizScorer, StreakTracker,
};

use crate::config::Config;

/// The shared application state, created once at startup and passed to all
/// handlers. The engine services all share the same store so their point
/// grants and counter updates land on the same rows.
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn GamificationStore>,
    pub streaks: StreakTracker,
    pub quizzes: QuizScorer,
    pub achievements: AchievementEvaluator,
    pub challenges: ChallengeProgressTracker,
    pub progress: ProgressTracker,
}

impl AppState {
    pub fn new(config: Arc<Config>, store: Arc<dyn GamificationStore>) -> Self {
        Self {
            config,
            streaks: StreakTracker::new(store.clone()),
            quizzes: QuizScorer::new(store.clone()),
            achievements: AchievementEvaluator::new(store.clone()),
            challenges: ChallengeProgressTracker::new(store.clone()),
            progress: ProgressTracker::new(store.clone()),
            store,
        }
    }
}
