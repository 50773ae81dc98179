//! crates/signlearn_core/src/progress.rs
//!
//! Per-category learning progress outside of quizzes.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::CategoryProgress;
use crate::ports::{CoreError, CoreResult, GamificationStore};

pub struct ProgressTracker {
    store: Arc<dyn GamificationStore>,
}

impl ProgressTracker {
    pub fn new(store: Arc<dyn GamificationStore>) -> Self {
        Self { store }
    }

    /// Adds newly learned signs to the category counter, creating the
    /// progress row on first use.
    pub async fn record_signs_learned(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        count: i32,
    ) -> CoreResult<CategoryProgress> {
        if count < 0 {
            return Err(CoreError::Validation(format!(
                "signs_learned must be non-negative, got {}",
                count
            )));
        }
        self.store.get_or_create_user(user_id).await?;
        self.store
            .add_signs_learned(user_id, category_id, count)
            .await
    }

    /// The user's progress in one category, created lazily like the write
    /// path does.
    pub async fn category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> CoreResult<CategoryProgress> {
        self.store.get_or_create_user(user_id).await?;
        self.store
            .ensure_category_progress(user_id, category_id)
            .await
    }

    /// The user's progress across all categories.
    pub async fn overview(&self, user_id: Uuid) -> CoreResult<Vec<CategoryProgress>> {
        self.store.progress_overview(user_id).await
    }
}
