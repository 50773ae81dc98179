//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the streak and learning-progress endpoints
//! and the master definition for the OpenAPI specification.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

use crate::error::core_error_response;
use crate::web::identity::UserId;
use crate::web::state::AppState;
use signlearn_core::domain::CategoryProgress;
use signlearn_core::ports::GamificationStore;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        record_streak_handler,
        streak_calendar_handler,
        user_stats_handler,
        record_signs_handler,
        progress_overview_handler,
        category_progress_handler,
        crate::web::quizzes::submit_attempt_handler,
        crate::web::quizzes::attempt_history_handler,
        crate::web::achievements::check_achievements_handler,
        crate::web::achievements::unlock_achievement_handler,
        crate::web::achievements::achievement_overview_handler,
        crate::web::challenges::today_challenges_handler,
        crate::web::challenges::report_challenge_progress_handler,
        crate::web::challenges::generate_today_handler,
    ),
    components(schemas(
        StreakResponse,
        StreakDayResponse,
        UserStatsResponse,
        RecordSignsRequest,
        ProgressResponse,
        crate::web::quizzes::SubmitAttemptRequest,
        crate::web::quizzes::QuizAttemptResponse,
        crate::web::achievements::EvaluationResponse,
        crate::web::achievements::GrantedAchievementResponse,
        crate::web::achievements::AchievementResponse,
        crate::web::challenges::ChallengeProgressRequest,
        crate::web::challenges::ChallengeProgressResponse,
        crate::web::challenges::DailyChallengeResponse,
        crate::web::challenges::GeneratedSetResponse,
    )),
    tags(
        (name = "Signlearn API", description = "Progress and gamification endpoints for the sign-language learning app.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The user's streak counters after recording activity.
#[derive(Serialize, ToSchema)]
pub struct StreakResponse {
    pub current_streak: i32,
    pub longest_streak: i32,
}

/// One calendar day with recorded activity.
#[derive(Serialize, ToSchema)]
pub struct StreakDayResponse {
    pub date: NaiveDate,
    pub activities_completed: i32,
}

/// Aggregated per-user stats.
#[derive(Serialize, ToSchema)]
pub struct UserStatsResponse {
    pub user_id: Uuid,
    pub total_points: i64,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub total_signs_learned: i64,
    pub total_quiz_attempts: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct RecordSignsRequest {
    pub signs_learned: i32,
}

/// The user's progress in one category.
#[derive(Serialize, ToSchema)]
pub struct ProgressResponse {
    pub category_id: Uuid,
    pub signs_learned: i32,
    pub total_signs: i32,
    pub progress_percentage: f64,
    pub quizzes_completed: i32,
    pub average_score: f64,
}

impl From<CategoryProgress> for ProgressResponse {
    fn from(progress: CategoryProgress) -> Self {
        let progress_percentage = if progress.total_signs > 0 {
            let ratio = f64::from(progress.signs_learned) / f64::from(progress.total_signs);
            (ratio * 10_000.0).round() / 100.0
        } else {
            0.0
        };
        Self {
            category_id: progress.category_id,
            signs_learned: progress.signs_learned,
            total_signs: progress.total_signs,
            progress_percentage,
            quizzes_completed: progress.quizzes_completed,
            average_score: progress.average_score,
        }
    }
}

#[derive(Deserialize, IntoParams)]
pub struct CalendarParams {
    /// Size of the trailing window, in days.
    pub days: Option<u32>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Record one activity for today and update the user's streak.
#[utoipa::path(
    post,
    path = "/users/streak",
    responses(
        (status = 200, description = "Streak updated", body = StreakResponse),
        (status = 400, description = "Missing or malformed x-user-id header"),
        (status = 503, description = "Storage contention retries exhausted")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn record_streak_handler(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let today = Utc::now().date_naive();
    match state.streaks.record_activity(user_id, today).await {
        Ok(standing) => Ok(Json(StreakResponse {
            current_streak: standing.current,
            longest_streak: standing.longest,
        })),
        Err(e) => {
            error!("Failed to record streak activity: {:?}", e);
            Err(core_error_response(e))
        }
    }
}

/// The user's activity calendar for the trailing window.
#[utoipa::path(
    get,
    path = "/users/streak-calendar",
    responses(
        (status = 200, description = "Activity days, newest first", body = [StreakDayResponse])
    ),
    params(
        CalendarParams,
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn streak_calendar_handler(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Query(params): Query<CalendarParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let today = Utc::now().date_naive();
    let days = params.days.unwrap_or(30);
    match state.streaks.calendar(user_id, today, days).await {
        Ok(records) => Ok(Json(
            records
                .into_iter()
                .map(|r| StreakDayResponse {
                    date: r.day,
                    activities_completed: r.activities_completed,
                })
                .collect::<Vec<_>>(),
        )),
        Err(e) => {
            error!("Failed to load streak calendar: {:?}", e);
            Err(core_error_response(e))
        }
    }
}

/// Aggregated stats for the user: points, streaks, totals.
#[utoipa::path(
    get,
    path = "/users/stats",
    responses(
        (status = 200, description = "User stats", body = UserStatsResponse),
        (status = 404, description = "User not found")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn user_stats_handler(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let result = async {
        let user = state.store.fetch_user(user_id).await?;
        let stats = state.achievements.stats(user_id).await?;
        Ok::<_, signlearn_core::CoreError>((user, stats))
    }
    .await;

    match result {
        Ok((user, stats)) => Ok(Json(UserStatsResponse {
            user_id: user.id,
            total_points: user.total_points,
            current_streak: user.current_streak,
            longest_streak: user.longest_streak,
            total_signs_learned: stats.total_signs_learned,
            total_quiz_attempts: stats.total_quiz_attempts,
        })),
        Err(e) => {
            error!("Failed to load user stats: {:?}", e);
            Err(core_error_response(e))
        }
    }
}

/// Record newly learned signs in a category.
#[utoipa::path(
    post,
    path = "/progress/{category_id}",
    request_body = RecordSignsRequest,
    responses(
        (status = 200, description = "Progress updated", body = ProgressResponse),
        (status = 400, description = "Negative sign count"),
        (status = 404, description = "Category not found")
    ),
    params(
        ("category_id" = Uuid, Path, description = "The category to update."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn record_signs_handler(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Path(category_id): Path<Uuid>,
    Json(req): Json<RecordSignsRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state
        .progress
        .record_signs_learned(user_id, category_id, req.signs_learned)
        .await
    {
        Ok(progress) => Ok(Json(ProgressResponse::from(progress))),
        Err(e) => {
            error!("Failed to record signs learned: {:?}", e);
            Err(core_error_response(e))
        }
    }
}

/// The user's progress across all categories.
#[utoipa::path(
    get,
    path = "/progress",
    responses(
        (status = 200, description = "Progress rows", body = [ProgressResponse])
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn progress_overview_handler(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state.progress.overview(user_id).await {
        Ok(rows) => Ok(Json(
            rows.into_iter().map(ProgressResponse::from).collect::<Vec<_>>(),
        )),
        Err(e) => {
            error!("Failed to load progress overview: {:?}", e);
            Err(core_error_response(e))
        }
    }
}

/// The user's progress in one category, created lazily if absent.
#[utoipa::path(
    get,
    path = "/progress/{category_id}",
    responses(
        (status = 200, description = "Progress row", body = ProgressResponse),
        (status = 404, description = "Category not found")
    ),
    params(
        ("category_id" = Uuid, Path, description = "The category to read."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn category_progress_handler(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Path(category_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state.progress.category(user_id, category_id).await {
        Ok(progress) => Ok(Json(ProgressResponse::from(progress))),
        Err(e) => {
            error!("Failed to load category progress: {:?}", e);
            Err(core_error_response(e))
        }
    }
}
