//! crates/signlearn_core/src/achievements.rs
//!
//! Evaluates unlock predicates against aggregated user stats and grants
//! rewards at most once per (user, achievement).

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Achievement, AchievementKind, AchievementStatus, GrantedAchievement, StatsSnapshot};
use crate::ports::{CoreError, CoreResult, GamificationStore};

/// Whether the achievement's requirement is met by the snapshot.
///
/// Dispatch is keyed on the achievement kind so new rule families slot in
/// here without touching the evaluation loop. `Social` and `Special` have no
/// built-in rule and are granted only through [`AchievementEvaluator::unlock`].
pub fn is_satisfied(achievement: &Achievement, stats: &StatsSnapshot) -> bool {
    let requirement = i64::from(achievement.requirement_value);
    match achievement.kind {
        AchievementKind::Streak => i64::from(stats.current_streak) >= requirement,
        AchievementKind::Progress => stats.total_signs_learned >= requirement,
        AchievementKind::Quiz => stats.total_quiz_attempts >= requirement,
        AchievementKind::Social | AchievementKind::Special => false,
    }
}

pub struct AchievementEvaluator {
    store: Arc<dyn GamificationStore>,
}

impl AchievementEvaluator {
    pub fn new(store: Arc<dyn GamificationStore>) -> Self {
        Self { store }
    }

    /// Checks every still-locked active achievement against a fresh stats
    /// snapshot and unlocks the ones whose predicate holds.
    ///
    /// Unlocking is monotonic: re-running this is always safe. Already
    /// unlocked achievements are never re-granted, and a concurrent
    /// evaluation racing on the same achievement loses the insert and is
    /// skipped here.
    pub async fn evaluate(&self, user_id: Uuid) -> CoreResult<Vec<GrantedAchievement>> {
        let stats = self.store.stats_snapshot(user_id).await?;
        let pending = self.store.locked_achievements(user_id).await?;

        let mut granted = Vec::new();
        for achievement in pending {
            if !is_satisfied(&achievement, &stats) {
                continue;
            }
            match self.store.unlock_achievement(user_id, &achievement).await {
                Ok(_) => granted.push(GrantedAchievement {
                    achievement_id: achievement.id,
                    title: achievement.title,
                    points_earned: achievement.points_reward,
                }),
                // Another evaluation unlocked it first; the reward was
                // granted there.
                Err(CoreError::Conflict(_)) => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(granted)
    }

    /// Grants an achievement directly, bypassing the predicates.
    pub async fn unlock(
        &self,
        user_id: Uuid,
        achievement_id: Uuid,
    ) -> CoreResult<GrantedAchievement> {
        let achievement = self.store.fetch_achievement(achievement_id).await?;
        if !achievement.is_active {
            return Err(CoreError::NotFound(format!(
                "achievement {} not found",
                achievement_id
            )));
        }
        self.store.get_or_create_user(user_id).await?;
        self.store.unlock_achievement(user_id, &achievement).await?;
        Ok(GrantedAchievement {
            achievement_id: achievement.id,
            title: achievement.title,
            points_earned: achievement.points_reward,
        })
    }

    /// All active achievements with the user's unlock state, unlocked first.
    pub async fn overview(&self, user_id: Uuid) -> CoreResult<Vec<AchievementStatus>> {
        self.store.achievement_overview(user_id).await
    }

    /// The snapshot the predicates run against; also what the stats endpoint
    /// reports.
    pub async fn stats(&self, user_id: Uuid) -> CoreResult<StatsSnapshot> {
        self.store.stats_snapshot(user_id).await
    }
}
