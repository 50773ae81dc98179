//! services/api/src/web/quizzes.rs
//!
//! Axum handlers for quiz attempt submission and history.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::core_error_response;
use crate::web::identity::UserId;
use crate::web::state::AppState;
use signlearn_core::domain::QuizAttempt;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SubmitAttemptRequest {
    /// Submitted answers, keyed by question id. Unanswered questions are
    /// graded as incorrect.
    pub answers: HashMap<Uuid, String>,
    #[serde(default)]
    pub time_taken: Option<i32>,
}

#[derive(Serialize, ToSchema)]
pub struct QuizAttemptResponse {
    pub attempt_id: Uuid,
    pub quiz_id: Uuid,
    pub score: i32,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub score_percentage: f64,
    pub passed: bool,
    pub time_taken: Option<i32>,
    pub completed_at: DateTime<Utc>,
}

impl From<QuizAttempt> for QuizAttemptResponse {
    fn from(attempt: QuizAttempt) -> Self {
        let score_percentage = if attempt.total_questions > 0 {
            f64::from(attempt.correct_answers) / f64::from(attempt.total_questions) * 100.0
        } else {
            0.0
        };
        Self {
            attempt_id: attempt.id,
            quiz_id: attempt.quiz_id,
            score: attempt.score,
            total_questions: attempt.total_questions,
            correct_answers: attempt.correct_answers,
            score_percentage,
            passed: attempt.passed,
            time_taken: attempt.time_taken,
            completed_at: attempt.completed_at,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Submit a quiz attempt for grading.
#[utoipa::path(
    post,
    path = "/quizzes/{quiz_id}/attempt",
    request_body = SubmitAttemptRequest,
    responses(
        (status = 200, description = "Attempt graded and recorded", body = QuizAttemptResponse),
        (status = 404, description = "Quiz not found"),
        (status = 422, description = "Quiz has no questions"),
        (status = 400, description = "Malformed submission")
    ),
    params(
        ("quiz_id" = Uuid, Path, description = "The quiz being attempted."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn submit_attempt_handler(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Path(quiz_id): Path<Uuid>,
    Json(req): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state
        .quizzes
        .score_attempt(user_id, quiz_id, &req.answers, req.time_taken)
        .await
    {
        Ok(outcome) => Ok(Json(QuizAttemptResponse::from(outcome.attempt))),
        Err(e) => {
            error!("Failed to score quiz attempt: {:?}", e);
            Err(core_error_response(e))
        }
    }
}

/// The user's attempts for one quiz, newest first.
#[utoipa::path(
    get,
    path = "/quizzes/{quiz_id}/attempts",
    responses(
        (status = 200, description = "Attempt history", body = [QuizAttemptResponse]),
        (status = 404, description = "Quiz not found")
    ),
    params(
        ("quiz_id" = Uuid, Path, description = "The quiz to read attempts for."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn attempt_history_handler(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Path(quiz_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state.quizzes.attempt_history(user_id, quiz_id).await {
        Ok(attempts) => Ok(Json(
            attempts
                .into_iter()
                .map(QuizAttemptResponse::from)
                .collect::<Vec<_>>(),
        )),
        Err(e) => {
            error!("Failed to load attempt history: {:?}", e);
            Err(core_error_response(e))
        }
    }
}
