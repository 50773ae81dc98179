//! services/api/src/web/achievements.rs
//!
//! Axum handlers for achievement evaluation and unlocks.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::core_error_response;
use crate::web::identity::UserId;
use crate::web::state::AppState;
use signlearn_core::domain::{AchievementStatus, GrantedAchievement};

//=========================================================================================
// Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct GrantedAchievementResponse {
    pub achievement_id: Uuid,
    pub title: String,
    pub points_earned: i32,
}

impl From<GrantedAchievement> for GrantedAchievementResponse {
    fn from(granted: GrantedAchievement) -> Self {
        Self {
            achievement_id: granted.achievement_id,
            title: granted.title,
            points_earned: granted.points_earned,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct EvaluationResponse {
    pub unlocked: Vec<GrantedAchievementResponse>,
}

#[derive(Serialize, ToSchema)]
pub struct AchievementResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub achievement_type: String,
    pub requirement_value: i32,
    pub points_reward: i32,
    pub is_unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl From<AchievementStatus> for AchievementResponse {
    fn from(status: AchievementStatus) -> Self {
        Self {
            id: status.achievement.id,
            title: status.achievement.title,
            description: status.achievement.description,
            achievement_type: status.achievement.kind.as_str().to_string(),
            requirement_value: status.achievement.requirement_value,
            points_reward: status.achievement.points_reward,
            is_unlocked: status.unlocked_at.is_some(),
            unlocked_at: status.unlocked_at,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Re-check accumulated stats and unlock newly earned achievements.
#[utoipa::path(
    post,
    path = "/achievements/check",
    responses(
        (status = 200, description = "Newly unlocked achievements", body = EvaluationResponse),
        (status = 404, description = "User not found")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn check_achievements_handler(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state.achievements.evaluate(user_id).await {
        Ok(granted) => Ok(Json(EvaluationResponse {
            unlocked: granted
                .into_iter()
                .map(GrantedAchievementResponse::from)
                .collect(),
        })),
        Err(e) => {
            error!("Failed to evaluate achievements: {:?}", e);
            Err(core_error_response(e))
        }
    }
}

/// Grant an achievement directly, bypassing the predicates.
#[utoipa::path(
    post,
    path = "/achievements/{achievement_id}/unlock",
    responses(
        (status = 200, description = "Achievement unlocked", body = GrantedAchievementResponse),
        (status = 404, description = "Achievement missing or inactive"),
        (status = 409, description = "Achievement already unlocked")
    ),
    params(
        ("achievement_id" = Uuid, Path, description = "The achievement to unlock."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn unlock_achievement_handler(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Path(achievement_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state.achievements.unlock(user_id, achievement_id).await {
        Ok(granted) => Ok(Json(GrantedAchievementResponse::from(granted))),
        Err(e) => {
            error!("Failed to unlock achievement: {:?}", e);
            Err(core_error_response(e))
        }
    }
}

/// All active achievements with the user's unlock state, unlocked first.
#[utoipa::path(
    get,
    path = "/achievements",
    responses(
        (status = 200, description = "Achievements with unlock state", body = [AchievementResponse])
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn achievement_overview_handler(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state.achievements.overview(user_id).await {
        Ok(overview) => Ok(Json(
            overview
                .into_iter()
                .map(AchievementResponse::from)
                .collect::<Vec<_>>(),
        )),
        Err(e) => {
            error!("Failed to load achievement overview: {:?}", e);
            Err(core_error_response(e))
        }
    }
}
