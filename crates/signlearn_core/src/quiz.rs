//! crates/signlearn_core/src/quiz.rs
//!
//! Grades quiz submissions, persists immutable attempt records, and keeps
//! the per-category rolling average score in step.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{NewQuizAttempt, QuizAttempt, QuizOutcome, QuizQuestion};
use crate::ports::{CoreError, CoreResult, GamificationStore};

/// Tally of one graded submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Grade {
    pub correct_answers: i32,
    pub score: i32,
}

/// Compares submitted answers against the quiz's questions.
///
/// Matching is a case-insensitive exact comparison. A missing answer counts
/// as incorrect, not as an error.
pub fn grade(questions: &[QuizQuestion], answers: &HashMap<Uuid, String>) -> Grade {
    let mut tally = Grade::default();
    for question in questions {
        let matched = answers
            .get(&question.id)
            .map(|answer| answer.to_lowercase() == question.correct_answer.to_lowercase())
            .unwrap_or(false);
        if matched {
            tally.correct_answers += 1;
            tally.score += question.points;
        }
    }
    tally
}

/// Folds one more percentage score into a rolling average over `completed`
/// prior quizzes. The old average and the old count must come from the same
/// locked read, or the new average is computed against the wrong count.
pub fn fold_average(average: f64, completed: i32, percentage: f64) -> f64 {
    (average * f64::from(completed) + percentage) / f64::from(completed + 1)
}

pub struct QuizScorer {
    store: Arc<dyn GamificationStore>,
}

impl QuizScorer {
    pub fn new(store: Arc<dyn GamificationStore>) -> Self {
        Self { store }
    }

    /// Grades a submission, persists the attempt, and updates the user's
    /// progress for the quiz's category. The attempt record and the category
    /// update commit together or not at all.
    ///
    /// The returned `score` is question points accumulated into the attempt
    /// record; no points are granted here.
    pub async fn score_attempt(
        &self,
        user_id: Uuid,
        quiz_id: Uuid,
        answers: &HashMap<Uuid, String>,
        time_taken: Option<i32>,
    ) -> CoreResult<QuizOutcome> {
        if let Some(seconds) = time_taken {
            if seconds < 0 {
                return Err(CoreError::Validation(format!(
                    "time_taken must be non-negative, got {}",
                    seconds
                )));
            }
        }

        let quiz = self.store.fetch_quiz(quiz_id).await?;
        let questions = self.store.fetch_quiz_questions(quiz_id).await?;
        if questions.is_empty() {
            return Err(CoreError::InvalidState(format!(
                "quiz {} has no questions, scoring is undefined",
                quiz_id
            )));
        }

        let tally = grade(&questions, answers);
        let total_questions = questions.len() as i32;
        let score_percentage =
            f64::from(tally.correct_answers) / f64::from(total_questions) * 100.0;
        let passed = score_percentage >= f64::from(quiz.passing_score);

        self.store.get_or_create_user(user_id).await?;
        let attempt = self
            .store
            .record_quiz_attempt(
                NewQuizAttempt {
                    user_id,
                    quiz_id,
                    score: tally.score,
                    total_questions,
                    correct_answers: tally.correct_answers,
                    time_taken,
                    passed,
                },
                quiz.category_id,
                score_percentage,
            )
            .await?;

        Ok(QuizOutcome {
            attempt,
            score_percentage,
        })
    }

    /// A user's attempts for one quiz, newest first.
    pub async fn attempt_history(
        &self,
        user_id: Uuid,
        quiz_id: Uuid,
    ) -> CoreResult<Vec<QuizAttempt>> {
        self.store.fetch_quiz(quiz_id).await?;
        self.store.quiz_attempts(user_id, quiz_id).await
    }
}
