//! crates/signlearn_core/src/challenges.rs
//!
//! Daily challenge progress tracking and one-time completion rewards.

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{
    ChallengeBoardEntry, ChallengeKind, ChallengeOutcome, ChallengeSeed, DailyChallenge,
};
use crate::ports::{CoreError, CoreResult, GamificationStore};

/// The built-in definitions generated for every new day.
pub const DAILY_SEEDS: &[ChallengeSeed] = &[
    ChallengeSeed {
        title: "Complete 3 quizzes",
        description: "Finish three quizzes in any category",
        kind: ChallengeKind::Quiz,
        target_value: 3,
        reward_points: 50,
    },
    ChallengeSeed {
        title: "Practice 10 signs",
        description: "Watch ten different sign videos",
        kind: ChallengeKind::Practice,
        target_value: 10,
        reward_points: 30,
    },
    ChallengeSeed {
        title: "Play the memory game",
        description: "Finish one round of the memory game",
        kind: ChallengeKind::MemoryGame,
        target_value: 1,
        reward_points: 25,
    },
    ChallengeSeed {
        title: "Keep your streak",
        description: "Open the app to keep your streak alive",
        kind: ChallengeKind::Streak,
        target_value: 1,
        reward_points: 20,
    },
];

/// Whether a report that lands in the completed state should pay out.
///
/// The reward is latched: once a challenge has paid out, no later report
/// re-arms it, even if a lower absolute value takes the progress back below
/// the target in between.
pub fn award_due(previously_awarded: bool, completed: bool) -> bool {
    completed && !previously_awarded
}

pub struct ChallengeProgressTracker {
    store: Arc<dyn GamificationStore>,
}

impl ChallengeProgressTracker {
    pub fn new(store: Arc<dyn GamificationStore>) -> Self {
        Self { store }
    }

    /// Overwrites the stored progress with the reported absolute value.
    ///
    /// `completed` is recomputed from the new value on every call; the
    /// completion reward is granted at most once per (user, challenge).
    pub async fn report_progress(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
        progress: i32,
    ) -> CoreResult<ChallengeOutcome> {
        if progress < 0 {
            return Err(CoreError::Validation(format!(
                "progress must be non-negative, got {}",
                progress
            )));
        }
        let challenge = self.store.fetch_challenge(challenge_id).await?;
        let completed = progress >= challenge.target_value;
        self.store.get_or_create_user(user_id).await?;
        self.store
            .apply_challenge_progress(user_id, &challenge, progress, completed)
            .await
    }

    /// Creates the fixed challenge set for `day`. Fails with `Conflict` if a
    /// set for that day already exists.
    pub async fn generate_daily_set(&self, day: NaiveDate) -> CoreResult<Vec<DailyChallenge>> {
        self.store.create_daily_set(day, DAILY_SEEDS).await
    }

    /// The day's active challenges with the user's progress.
    pub async fn board(
        &self,
        user_id: Uuid,
        day: NaiveDate,
    ) -> CoreResult<Vec<ChallengeBoardEntry>> {
        self.store.challenge_board(user_id, day).await
    }
}
