//! services/api/src/web/challenges.rs
//!
//! Axum handlers for daily challenges: today's board, progress reports, and
//! set generation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::core_error_response;
use crate::web::identity::UserId;
use crate::web::state::AppState;
use signlearn_core::domain::{ChallengeBoardEntry, ChallengeOutcome, DailyChallenge};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct ChallengeProgressRequest {
    /// Absolute progress value; overwrites the stored progress.
    pub progress: i32,
}

#[derive(Serialize, ToSchema)]
pub struct ChallengeProgressResponse {
    pub progress: i32,
    pub target: i32,
    pub completed: bool,
    pub points_earned: i32,
}

impl From<ChallengeOutcome> for ChallengeProgressResponse {
    fn from(outcome: ChallengeOutcome) -> Self {
        Self {
            progress: outcome.progress,
            target: outcome.target,
            completed: outcome.completed,
            points_earned: outcome.points_earned,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct DailyChallengeResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub challenge_type: String,
    pub target_value: i32,
    pub reward_points: i32,
    pub challenge_date: NaiveDate,
    pub progress: i32,
    pub completed: bool,
}

impl From<ChallengeBoardEntry> for DailyChallengeResponse {
    fn from(entry: ChallengeBoardEntry) -> Self {
        let ChallengeBoardEntry {
            challenge,
            progress,
            completed,
        } = entry;
        Self::from_challenge(challenge, progress, completed)
    }
}

impl DailyChallengeResponse {
    fn from_challenge(challenge: DailyChallenge, progress: i32, completed: bool) -> Self {
        Self {
            id: challenge.id,
            title: challenge.title,
            description: challenge.description,
            challenge_type: challenge.kind.as_str().to_string(),
            target_value: challenge.target_value,
            reward_points: challenge.reward_points,
            challenge_date: challenge.day,
            progress,
            completed,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct GeneratedSetResponse {
    pub challenge_date: NaiveDate,
    pub created: Vec<DailyChallengeResponse>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Today's active challenges with the user's progress.
#[utoipa::path(
    get,
    path = "/challenges/today",
    responses(
        (status = 200, description = "Today's challenge board", body = [DailyChallengeResponse])
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn today_challenges_handler(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let today = Utc::now().date_naive();
    match state.challenges.board(user_id, today).await {
        Ok(board) => Ok(Json(
            board
                .into_iter()
                .map(DailyChallengeResponse::from)
                .collect::<Vec<_>>(),
        )),
        Err(e) => {
            error!("Failed to load today's challenges: {:?}", e);
            Err(core_error_response(e))
        }
    }
}

/// Report absolute progress on a challenge. The completion reward is granted
/// at most once.
#[utoipa::path(
    post,
    path = "/challenges/{challenge_id}/progress",
    request_body = ChallengeProgressRequest,
    responses(
        (status = 200, description = "Progress stored", body = ChallengeProgressResponse),
        (status = 400, description = "Negative progress value"),
        (status = 404, description = "Challenge not found")
    ),
    params(
        ("challenge_id" = Uuid, Path, description = "The challenge being reported on."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn report_challenge_progress_handler(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Path(challenge_id): Path<Uuid>,
    Json(req): Json<ChallengeProgressRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state
        .challenges
        .report_progress(user_id, challenge_id, req.progress)
        .await
    {
        Ok(outcome) => Ok(Json(ChallengeProgressResponse::from(outcome))),
        Err(e) => {
            error!("Failed to report challenge progress: {:?}", e);
            Err(core_error_response(e))
        }
    }
}

/// Generate today's challenge set. Admin-gated by the deployment in front of
/// this service.
#[utoipa::path(
    post,
    path = "/challenges/generate-today",
    responses(
        (status = 201, description = "Challenge set created", body = GeneratedSetResponse),
        (status = 409, description = "A set for today already exists")
    )
)]
pub async fn generate_today_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let today = Utc::now().date_naive();
    match state.challenges.generate_daily_set(today).await {
        Ok(created) => Ok((
            StatusCode::CREATED,
            Json(GeneratedSetResponse {
                challenge_date: today,
                created: created
                    .into_iter()
                    .map(|c| DailyChallengeResponse::from_challenge(c, 0, false))
                    .collect(),
            }),
        )),
        Err(e) => {
            error!("Failed to generate today's challenges: {:?}", e);
            Err(core_error_response(e))
        }
    }
}
