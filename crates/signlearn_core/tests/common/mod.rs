#![allow(dead_code)]
//! Shared in-memory store and fixtures for the engine integration tests.
//!
//! `MemoryStore` implements the `GamificationStore` contract behind a single
//! mutex, which serializes every composite operation the same way the
//! production adapter's transactions do.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use signlearn_core::domain::{
    Achievement, AchievementKind, AchievementStatus, Category, CategoryProgress,
    ChallengeBoardEntry, ChallengeOutcome, ChallengeProgress, ChallengeSeed, DailyChallenge,
    NewQuizAttempt, Quiz, QuizAttempt, QuizQuestion, StatsSnapshot, StreakRecord, StreakStanding,
    User,
};
use signlearn_core::ports::{CoreError, CoreResult, GamificationStore};
use signlearn_core::{challenges, quiz, streak};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    streak_days: HashMap<(Uuid, NaiveDate), StreakRecord>,
    progress: HashMap<(Uuid, Uuid), CategoryProgress>,
    achievements: Vec<Achievement>,
    unlocks: HashMap<(Uuid, Uuid), DateTime<Utc>>,
    quizzes: Vec<Quiz>,
    questions: HashMap<Uuid, Vec<QuizQuestion>>,
    attempts: Vec<QuizAttempt>,
    challenges: Vec<DailyChallenge>,
    challenge_progress: HashMap<(Uuid, Uuid), ChallengeProgress>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Fixtures ---

    pub fn insert_category(&self, name: &str, total_signs: i32) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().categories.insert(
            id,
            Category {
                id,
                name: name.to_string(),
                total_signs,
            },
        );
        id
    }

    pub fn insert_achievement(
        &self,
        kind: AchievementKind,
        requirement_value: i32,
        points_reward: i32,
    ) -> Uuid {
        self.insert_achievement_row(kind, requirement_value, points_reward, true)
    }

    pub fn insert_inactive_achievement(
        &self,
        kind: AchievementKind,
        requirement_value: i32,
        points_reward: i32,
    ) -> Uuid {
        self.insert_achievement_row(kind, requirement_value, points_reward, false)
    }

    fn insert_achievement_row(
        &self,
        kind: AchievementKind,
        requirement_value: i32,
        points_reward: i32,
        is_active: bool,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().achievements.push(Achievement {
            id,
            title: format!("{} {}", kind.as_str(), requirement_value),
            description: String::new(),
            kind,
            requirement_value,
            points_reward,
            is_active,
        });
        id
    }

    /// Inserts a quiz whose questions all share the same point value.
    /// Returns the quiz id and the question ids in order.
    pub fn insert_quiz(
        &self,
        category_id: Uuid,
        passing_score: i32,
        answers: &[(&str, i32)],
    ) -> (Uuid, Vec<Uuid>) {
        let quiz_id = Uuid::new_v4();
        let mut state = self.state.lock().unwrap();
        state.quizzes.push(Quiz {
            id: quiz_id,
            category_id,
            title: "quiz".to_string(),
            passing_score,
            time_limit: None,
            is_active: true,
        });
        let questions: Vec<QuizQuestion> = answers
            .iter()
            .map(|(answer, points)| QuizQuestion {
                id: Uuid::new_v4(),
                quiz_id,
                correct_answer: answer.to_string(),
                points: *points,
            })
            .collect();
        let ids = questions.iter().map(|q| q.id).collect();
        state.questions.insert(quiz_id, questions);
        (quiz_id, ids)
    }

    pub fn insert_challenge(&self, day: NaiveDate, target_value: i32, reward_points: i32) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().challenges.push(DailyChallenge {
            id,
            title: format!("challenge {}", id),
            description: String::new(),
            kind: signlearn_core::domain::ChallengeKind::Practice,
            target_value,
            reward_points,
            day,
            is_active: true,
        });
        id
    }

    /// Seeds a progress row directly, for tests that start from accumulated
    /// history.
    pub fn seed_category_progress(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        quizzes_completed: i32,
        average_score: f64,
    ) {
        let mut state = self.state.lock().unwrap();
        let total_signs = state
            .categories
            .get(&category_id)
            .map(|c| c.total_signs)
            .unwrap_or(0);
        state.progress.insert(
            (user_id, category_id),
            CategoryProgress {
                user_id,
                category_id,
                signs_learned: 0,
                total_signs,
                quizzes_completed,
                average_score,
                total_time_spent: 0,
                last_activity: None,
            },
        );
    }

    pub fn total_points(&self, user_id: Uuid) -> i64 {
        self.state
            .lock()
            .unwrap()
            .users
            .get(&user_id)
            .map(|u| u.total_points)
            .unwrap_or(0)
    }
}

fn new_user(user_id: Uuid) -> User {
    User {
        id: user_id,
        current_streak: 0,
        longest_streak: 0,
        total_points: 0,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl GamificationStore for MemoryStore {
    async fn get_or_create_user(&self, user_id: Uuid) -> CoreResult<User> {
        let mut state = self.state.lock().unwrap();
        Ok(state
            .users
            .entry(user_id)
            .or_insert_with(|| new_user(user_id))
            .clone())
    }

    async fn fetch_user(&self, user_id: Uuid) -> CoreResult<User> {
        self.state
            .lock()
            .unwrap()
            .users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("user {} not found", user_id)))
    }

    async fn add_points(&self, user_id: Uuid, delta: i32) -> CoreResult<i64> {
        let mut state = self.state.lock().unwrap();
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| CoreError::NotFound(format!("user {} not found", user_id)))?;
        user.total_points += i64::from(delta);
        Ok(user.total_points)
    }

    async fn record_streak_day(&self, user_id: Uuid, day: NaiveDate) -> CoreResult<StreakStanding> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let standing = {
            let user = state
                .users
                .get(&user_id)
                .ok_or_else(|| CoreError::NotFound(format!("user {} not found", user_id)))?;
            StreakStanding {
                current: user.current_streak,
                longest: user.longest_streak,
            }
        };

        if let Some(record) = state.streak_days.get_mut(&(user_id, day)) {
            record.activities_completed += 1;
            return Ok(standing);
        }

        state.streak_days.insert(
            (user_id, day),
            StreakRecord {
                user_id,
                day,
                activities_completed: 1,
            },
        );
        let continued = state
            .streak_days
            .contains_key(&(user_id, day - Duration::days(1)));
        let next = streak::advance(standing, continued);
        let user = state.users.get_mut(&user_id).expect("user row vanished");
        user.current_streak = next.current;
        user.longest_streak = next.longest;
        Ok(next)
    }

    async fn streak_days_since(
        &self,
        user_id: Uuid,
        since: NaiveDate,
    ) -> CoreResult<Vec<StreakRecord>> {
        let state = self.state.lock().unwrap();
        let mut records: Vec<StreakRecord> = state
            .streak_days
            .values()
            .filter(|r| r.user_id == user_id && r.day >= since)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.day.cmp(&a.day));
        Ok(records)
    }

    async fn fetch_quiz(&self, quiz_id: Uuid) -> CoreResult<Quiz> {
        self.state
            .lock()
            .unwrap()
            .quizzes
            .iter()
            .find(|q| q.id == quiz_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("quiz {} not found", quiz_id)))
    }

    async fn fetch_quiz_questions(&self, quiz_id: Uuid) -> CoreResult<Vec<QuizQuestion>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .questions
            .get(&quiz_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn record_quiz_attempt(
        &self,
        attempt: NewQuizAttempt,
        category_id: Uuid,
        score_percentage: f64,
    ) -> CoreResult<QuizAttempt> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let total_signs = state
            .categories
            .get(&category_id)
            .map(|c| c.total_signs)
            .ok_or_else(|| CoreError::NotFound(format!("category {} not found", category_id)))?;

        let stored = QuizAttempt {
            id: Uuid::new_v4(),
            user_id: attempt.user_id,
            quiz_id: attempt.quiz_id,
            score: attempt.score,
            total_questions: attempt.total_questions,
            correct_answers: attempt.correct_answers,
            time_taken: attempt.time_taken,
            passed: attempt.passed,
            completed_at: Utc::now(),
        };
        state.attempts.push(stored.clone());

        let row = state
            .progress
            .entry((attempt.user_id, category_id))
            .or_insert_with(|| CategoryProgress {
                user_id: attempt.user_id,
                category_id,
                signs_learned: 0,
                total_signs,
                quizzes_completed: 0,
                average_score: 0.0,
                total_time_spent: 0,
                last_activity: None,
            });
        row.average_score = quiz::fold_average(row.average_score, row.quizzes_completed, score_percentage);
        row.quizzes_completed += 1;
        row.last_activity = Some(Utc::now());
        Ok(stored)
    }

    async fn quiz_attempts(&self, user_id: Uuid, quiz_id: Uuid) -> CoreResult<Vec<QuizAttempt>> {
        let state = self.state.lock().unwrap();
        let mut attempts: Vec<QuizAttempt> = state
            .attempts
            .iter()
            .filter(|a| a.user_id == user_id && a.quiz_id == quiz_id)
            .cloned()
            .collect();
        attempts.reverse();
        Ok(attempts)
    }

    async fn fetch_achievement(&self, achievement_id: Uuid) -> CoreResult<Achievement> {
        self.state
            .lock()
            .unwrap()
            .achievements
            .iter()
            .find(|a| a.id == achievement_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("achievement {} not found", achievement_id)))
    }

    async fn locked_achievements(&self, user_id: Uuid) -> CoreResult<Vec<Achievement>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .achievements
            .iter()
            .filter(|a| a.is_active && !state.unlocks.contains_key(&(user_id, a.id)))
            .cloned()
            .collect())
    }

    async fn achievement_overview(&self, user_id: Uuid) -> CoreResult<Vec<AchievementStatus>> {
        let state = self.state.lock().unwrap();
        let mut overview: Vec<AchievementStatus> = state
            .achievements
            .iter()
            .filter(|a| a.is_active)
            .map(|a| AchievementStatus {
                achievement: a.clone(),
                unlocked_at: state.unlocks.get(&(user_id, a.id)).copied(),
            })
            .collect();
        overview.sort_by_key(|s| s.unlocked_at.is_none());
        Ok(overview)
    }

    async fn stats_snapshot(&self, user_id: Uuid) -> CoreResult<StatsSnapshot> {
        let state = self.state.lock().unwrap();
        let user = state
            .users
            .get(&user_id)
            .ok_or_else(|| CoreError::NotFound(format!("user {} not found", user_id)))?;
        let total_signs_learned = state
            .progress
            .values()
            .filter(|p| p.user_id == user_id)
            .map(|p| i64::from(p.signs_learned))
            .sum();
        let total_quiz_attempts =
            state.attempts.iter().filter(|a| a.user_id == user_id).count() as i64;
        Ok(StatsSnapshot {
            current_streak: user.current_streak,
            total_signs_learned,
            total_quiz_attempts,
        })
    }

    async fn unlock_achievement(
        &self,
        user_id: Uuid,
        achievement: &Achievement,
    ) -> CoreResult<DateTime<Utc>> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        if state.unlocks.contains_key(&(user_id, achievement.id)) {
            return Err(CoreError::Conflict(format!(
                "achievement {} already unlocked",
                achievement.id
            )));
        }
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| CoreError::NotFound(format!("user {} not found", user_id)))?;
        user.total_points += i64::from(achievement.points_reward);
        let unlocked_at = Utc::now();
        state.unlocks.insert((user_id, achievement.id), unlocked_at);
        Ok(unlocked_at)
    }

    async fn fetch_challenge(&self, challenge_id: Uuid) -> CoreResult<DailyChallenge> {
        self.state
            .lock()
            .unwrap()
            .challenges
            .iter()
            .find(|c| c.id == challenge_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("challenge {} not found", challenge_id)))
    }

    async fn challenge_board(
        &self,
        user_id: Uuid,
        day: NaiveDate,
    ) -> CoreResult<Vec<ChallengeBoardEntry>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .challenges
            .iter()
            .filter(|c| c.day == day && c.is_active)
            .map(|c| {
                let progress = state.challenge_progress.get(&(user_id, c.id));
                ChallengeBoardEntry {
                    challenge: c.clone(),
                    progress: progress.map(|p| p.progress).unwrap_or(0),
                    completed: progress.map(|p| p.completed).unwrap_or(false),
                }
            })
            .collect())
    }

    async fn apply_challenge_progress(
        &self,
        user_id: Uuid,
        challenge: &DailyChallenge,
        progress: i32,
        completed: bool,
    ) -> CoreResult<ChallengeOutcome> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let row = state
            .challenge_progress
            .entry((user_id, challenge.id))
            .or_insert_with(|| ChallengeProgress {
                user_id,
                challenge_id: challenge.id,
                progress: 0,
                completed: false,
                completed_at: None,
            });
        let previously_awarded = row.completed_at.is_some();
        row.progress = progress;
        row.completed = completed;
        let award = challenges::award_due(previously_awarded, completed);
        if award {
            row.completed_at = Some(Utc::now());
        }
        let points_earned = if award { challenge.reward_points } else { 0 };
        if award {
            let user = state
                .users
                .get_mut(&user_id)
                .ok_or_else(|| CoreError::NotFound(format!("user {} not found", user_id)))?;
            user.total_points += i64::from(points_earned);
        }
        Ok(ChallengeOutcome {
            progress,
            target: challenge.target_value,
            completed,
            points_earned,
        })
    }

    async fn create_daily_set(
        &self,
        day: NaiveDate,
        seeds: &[ChallengeSeed],
    ) -> CoreResult<Vec<DailyChallenge>> {
        let mut state = self.state.lock().unwrap();
        if state.challenges.iter().any(|c| c.day == day) {
            return Err(CoreError::Conflict(format!(
                "challenges for {} already generated",
                day
            )));
        }
        let created: Vec<DailyChallenge> = seeds
            .iter()
            .map(|seed| DailyChallenge {
                id: Uuid::new_v4(),
                title: seed.title.to_string(),
                description: seed.description.to_string(),
                kind: seed.kind,
                target_value: seed.target_value,
                reward_points: seed.reward_points,
                day,
                is_active: true,
            })
            .collect();
        state.challenges.extend(created.iter().cloned());
        Ok(created)
    }

    async fn ensure_category_progress(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> CoreResult<CategoryProgress> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let total_signs = state
            .categories
            .get(&category_id)
            .map(|c| c.total_signs)
            .ok_or_else(|| CoreError::NotFound(format!("category {} not found", category_id)))?;
        Ok(state
            .progress
            .entry((user_id, category_id))
            .or_insert_with(|| CategoryProgress {
                user_id,
                category_id,
                signs_learned: 0,
                total_signs,
                quizzes_completed: 0,
                average_score: 0.0,
                total_time_spent: 0,
                last_activity: None,
            })
            .clone())
    }

    async fn add_signs_learned(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        count: i32,
    ) -> CoreResult<CategoryProgress> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let total_signs = state
            .categories
            .get(&category_id)
            .map(|c| c.total_signs)
            .ok_or_else(|| CoreError::NotFound(format!("category {} not found", category_id)))?;
        let row = state
            .progress
            .entry((user_id, category_id))
            .or_insert_with(|| CategoryProgress {
                user_id,
                category_id,
                signs_learned: 0,
                total_signs,
                quizzes_completed: 0,
                average_score: 0.0,
                total_time_spent: 0,
                last_activity: None,
            });
        row.signs_learned += count;
        row.last_activity = Some(Utc::now());
        Ok(row.clone())
    }

    async fn progress_overview(&self, user_id: Uuid) -> CoreResult<Vec<CategoryProgress>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .progress
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }
}
