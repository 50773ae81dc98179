//! crates/signlearn_core/src/points.rs
//!
//! The single entry point for point grants. Every component that awards
//! points routes through the same relative increment so concurrent grants
//! from different sources compose without lost updates.

use std::sync::Arc;

use uuid::Uuid;

use crate::ports::{CoreError, CoreResult, GamificationStore};

pub struct PointsLedger {
    store: Arc<dyn GamificationStore>,
}

impl PointsLedger {
    pub fn new(store: Arc<dyn GamificationStore>) -> Self {
        Self { store }
    }

    /// Atomically adds `delta` points to the user's balance and returns the
    /// new total. `delta` must be strictly positive.
    pub async fn add_points(&self, user_id: Uuid, delta: i32) -> CoreResult<i64> {
        if delta <= 0 {
            return Err(CoreError::Validation(format!(
                "point delta must be positive, got {}",
                delta
            )));
        }
        self.store.add_points(user_id, delta).await
    }
}
