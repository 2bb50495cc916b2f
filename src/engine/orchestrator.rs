// src/engine/orchestrator.rs

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    engine::{
        availability,
        ledger::{AttemptLedger, LedgerError, NewAttempt},
        scoring,
    },
    error::AppError,
    models::{
        question::{PublicQuestion, Question},
        quiz::Quiz,
        score::Score,
    },
};

/// Outcome of an orchestrator operation: either the payload, or an
/// expected user-facing rejection. Rejections travel as values; only
/// infrastructure faults use the error channel.
#[derive(Debug)]
pub enum Outcome<T> {
    Ok(T),
    Rejected(Rejection),
}

/// The admission rejections a caller can observe. All are recoverable by
/// navigating away; none is a fault.
#[derive(Debug, Serialize)]
#[serde(tag = "rejected", rename_all = "snake_case")]
pub enum Rejection {
    /// This user already has a recorded attempt for the quiz. Carries the
    /// existing score when it could be fetched.
    AlreadyAttempted {
        #[serde(skip_serializing_if = "Option::is_none")]
        total_scored: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        total_questions: Option<i64>,
    },
    /// Outside the quiz's admission window.
    NotAvailable {
        date_of_quiz: NaiveDate,
        window: String,
    },
    /// The quiz has no questions yet.
    NoQuestions,
    /// No such quiz (or attempt, for result lookups).
    NotFound,
}

impl Rejection {
    fn already_attempted(prior: Option<&Score>) -> Self {
        Rejection::AlreadyAttempted {
            total_scored: prior.map(|s| s.total_scored),
            total_questions: prior.map(|s| s.total_questions),
        }
    }
}

/// The question sheet issued by `start`: everything the client needs to
/// run the attempt, minus the answer key.
#[derive(Debug, Serialize)]
pub struct QuizSheet {
    pub quiz_id: i64,
    pub title: String,
    pub date_of_quiz: NaiveDate,
    pub remarks: Option<String>,
    /// Full quiz duration, for the client-side countdown.
    pub duration_seconds: u32,
    pub questions: Vec<PublicQuestion>,
}

/// What `submit` hands back once the attempt is recorded.
#[derive(Debug, Serialize)]
pub struct AttemptReceipt {
    pub attempt_id: i64,
    pub total_scored: i64,
    pub total_questions: i64,
}

/// One question in the post-attempt review, answer key included.
#[derive(Debug, Serialize)]
pub struct ReviewQuestion {
    pub id: i64,
    pub statement: String,
    pub options: [String; 4],
    pub correct_option: i64,
    pub submitted_option: Option<i64>,
}

/// The full result view for a completed attempt.
#[derive(Debug, Serialize)]
pub struct AttemptReview {
    pub attempt_id: i64,
    pub quiz_id: i64,
    pub quiz_title: String,
    pub total_scored: i64,
    pub total_questions: i64,
    pub time_stamp_of_attempt: DateTime<Utc>,
    pub questions: Vec<ReviewQuestion>,
}

/// The attempt state machine: start -> submit -> result.
///
/// The server holds no "in progress" state; every operation re-validates
/// admission from scratch, so a `start` never followed by `submit` leaves
/// no residue and a stale client cannot bypass a closed window.
pub struct AttemptEngine {
    pool: SqlitePool,
    ledger: AttemptLedger,
}

impl AttemptEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            ledger: AttemptLedger::new(pool.clone()),
            pool,
        }
    }

    pub fn ledger(&self) -> &AttemptLedger {
        &self.ledger
    }

    /// Opens an attempt: re-checks admission and issues the question
    /// sheet without correct options. Idempotent; calling it again before
    /// `submit` just re-runs the checks and re-issues the sheet.
    pub async fn start(
        &self,
        user_id: i64,
        quiz_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Outcome<QuizSheet>, AppError> {
        let Some(quiz) = self.load_quiz(quiz_id).await? else {
            return Ok(Outcome::Rejected(Rejection::NotFound));
        };

        let questions = match self.admit(user_id, &quiz, now).await? {
            Admission::Open(questions) => questions,
            Admission::Rejected(rejection) => return Ok(Outcome::Rejected(rejection)),
        };

        let minutes = availability::parse_duration(&quiz.time_duration)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        Ok(Outcome::Ok(QuizSheet {
            quiz_id: quiz.id,
            title: quiz.title,
            date_of_quiz: quiz.date_of_quiz,
            remarks: quiz.remarks,
            duration_seconds: minutes * 60,
            questions: questions.into_iter().map(PublicQuestion::from).collect(),
        }))
    }

    /// Scores a submission and records it as the one attempt for this
    /// (user, quiz) pair. Admission is re-checked: the window may have
    /// closed, or another submission may have landed, since `start`.
    pub async fn submit(
        &self,
        user_id: i64,
        quiz_id: i64,
        answers: HashMap<i64, i64>,
        now: DateTime<Utc>,
    ) -> Result<Outcome<AttemptReceipt>, AppError> {
        let Some(quiz) = self.load_quiz(quiz_id).await? else {
            return Ok(Outcome::Rejected(Rejection::NotFound));
        };

        let questions = match self.admit(user_id, &quiz, now).await? {
            Admission::Open(questions) => questions,
            Admission::Rejected(rejection) => return Ok(Outcome::Rejected(rejection)),
        };

        let sheet = scoring::score(&questions, &answers);

        let recorded = self
            .ledger
            .record(NewAttempt {
                user_id,
                quiz_id,
                total_scored: sheet.total_scored,
                total_questions: sheet.total_questions,
                timestamp: now,
                answers,
            })
            .await;

        match recorded {
            Ok(attempt_id) => {
                tracing::info!(
                    user_id,
                    quiz_id,
                    attempt_id,
                    total_scored = sheet.total_scored,
                    total_questions = sheet.total_questions,
                    "attempt recorded"
                );
                Ok(Outcome::Ok(AttemptReceipt {
                    attempt_id,
                    total_scored: sheet.total_scored,
                    total_questions: sheet.total_questions,
                }))
            }
            // Lost a submit race: surface the surviving record's score,
            // exactly as if the user had checked after the fact.
            Err(LedgerError::DuplicateAttempt) => {
                tracing::debug!(user_id, quiz_id, "concurrent submit lost the record race");
                let prior = self.ledger.find(user_id, quiz_id).await.ok().flatten();
                Ok(Outcome::Rejected(Rejection::already_attempted(
                    prior.as_ref(),
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The persisted result for this user's attempt at a quiz, with the
    /// answer key and the submitted answers. A pure read, repeatable
    /// indefinitely.
    pub async fn result(
        &self,
        user_id: i64,
        quiz_id: i64,
    ) -> Result<Outcome<AttemptReview>, AppError> {
        let Some(score) = self.ledger.find(user_id, quiz_id).await.map_err(AppError::from)? else {
            return Ok(Outcome::Rejected(Rejection::NotFound));
        };

        self.review(score).await
    }

    /// Result lookup by attempt id. Rejects with NotFound unless the
    /// attempt exists and belongs to the caller.
    pub async fn result_by_attempt(
        &self,
        user_id: i64,
        attempt_id: i64,
    ) -> Result<Outcome<AttemptReview>, AppError> {
        let score = match self.ledger.get(attempt_id).await {
            Ok(score) => score,
            Err(LedgerError::NotFound) => return Ok(Outcome::Rejected(Rejection::NotFound)),
            Err(e) => return Err(e.into()),
        };

        if score.user_id != user_id {
            // Someone else's attempt; indistinguishable from absent.
            return Ok(Outcome::Rejected(Rejection::NotFound));
        }

        self.review(score).await
    }

    /// Admission checks shared by start and submit, in precedence order:
    /// already-attempted, then empty quiz, then the window. An empty quiz
    /// is NoQuestions regardless of the window state.
    async fn admit(
        &self,
        user_id: i64,
        quiz: &Quiz,
        now: DateTime<Utc>,
    ) -> Result<Admission, AppError> {
        if let Some(prior) = self.ledger.find(user_id, quiz.id).await.map_err(AppError::from)? {
            tracing::debug!(user_id, quiz_id = quiz.id, "rejected: already attempted");
            return Ok(Admission::Rejected(Rejection::already_attempted(Some(
                &prior,
            ))));
        }

        let questions = self.load_questions(quiz.id).await?;
        if questions.is_empty() {
            tracing::debug!(quiz_id = quiz.id, "rejected: quiz has no questions");
            return Ok(Admission::Rejected(Rejection::NoQuestions));
        }

        if !availability::is_open(quiz, now) {
            tracing::debug!(quiz_id = quiz.id, %now, "rejected: outside admission window");
            let window = availability::window_label(&quiz.time_duration)
                .map_err(|e| AppError::InternalServerError(e.to_string()))?;
            return Ok(Admission::Rejected(Rejection::NotAvailable {
                date_of_quiz: quiz.date_of_quiz,
                window,
            }));
        }

        Ok(Admission::Open(questions))
    }

    async fn review(&self, score: Score) -> Result<Outcome<AttemptReview>, AppError> {
        let Some(quiz) = self.load_quiz(score.quiz_id).await? else {
            return Ok(Outcome::Rejected(Rejection::NotFound));
        };

        let submitted = &score.answers.0;
        let questions = self
            .load_questions(quiz.id)
            .await?
            .into_iter()
            .map(|q| ReviewQuestion {
                submitted_option: submitted.get(&q.id).copied(),
                id: q.id,
                statement: q.statement,
                options: [q.option1, q.option2, q.option3, q.option4],
                correct_option: q.correct_option,
            })
            .collect();

        Ok(Outcome::Ok(AttemptReview {
            attempt_id: score.id,
            quiz_id: quiz.id,
            quiz_title: quiz.title,
            total_scored: score.total_scored,
            total_questions: score.total_questions,
            time_stamp_of_attempt: score.time_stamp_of_attempt,
            questions,
        }))
    }

    async fn load_quiz(&self, quiz_id: i64) -> Result<Option<Quiz>, AppError> {
        let quiz = sqlx::query_as::<_, Quiz>(
            "SELECT id, chapter_id, title, date_of_quiz, time_duration, remarks, created_at
             FROM quizzes WHERE id = ?",
        )
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quiz)
    }

    async fn load_questions(&self, quiz_id: i64) -> Result<Vec<Question>, AppError> {
        let questions = sqlx::query_as::<_, Question>(
            "SELECT id, quiz_id, statement, option1, option2, option3, option4, correct_option
             FROM questions WHERE quiz_id = ? ORDER BY id",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }
}

enum Admission {
    Open(Vec<Question>),
    Rejected(Rejection),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures::{seed_question, seed_quiz, seed_user, test_pool};
    use chrono::TimeZone;

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    fn mid_window(date: NaiveDate) -> DateTime<Utc> {
        Utc.from_utc_datetime(&date.and_hms_opt(0, 10, 0).unwrap())
    }

    #[tokio::test]
    async fn start_issues_sheet_without_answer_key() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool, "alice").await;
        let date = today();
        let quiz_id = seed_quiz(&pool, date, "01:00").await;
        seed_question(&pool, quiz_id, 2).await;
        let engine = AttemptEngine::new(pool);

        let outcome = engine
            .start(user_id, quiz_id, mid_window(date))
            .await
            .unwrap();

        let Outcome::Ok(sheet) = outcome else {
            panic!("expected an open sheet");
        };
        assert_eq!(sheet.quiz_id, quiz_id);
        assert_eq!(sheet.duration_seconds, 3600);
        assert_eq!(sheet.questions.len(), 1);

        // The serialized sheet must not leak the correct option anywhere.
        let json = serde_json::to_string(&sheet).unwrap();
        assert!(!json.contains("correct_option"));
    }

    #[tokio::test]
    async fn start_is_idempotent_before_submit() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool, "alice").await;
        let date = today();
        let quiz_id = seed_quiz(&pool, date, "01:00").await;
        seed_question(&pool, quiz_id, 1).await;
        seed_question(&pool, quiz_id, 2).await;
        let engine = AttemptEngine::new(pool);
        let now = mid_window(date);

        let first = engine.start(user_id, quiz_id, now).await.unwrap();
        let second = engine.start(user_id, quiz_id, now).await.unwrap();

        let (Outcome::Ok(a), Outcome::Ok(b)) = (first, second) else {
            panic!("expected both starts to be admitted");
        };
        assert_eq!(
            serde_json::to_value(&a).unwrap(),
            serde_json::to_value(&b).unwrap()
        );
    }

    #[tokio::test]
    async fn start_rejects_unknown_quiz() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool, "alice").await;
        let engine = AttemptEngine::new(pool);

        let outcome = engine.start(user_id, 999, mid_window(today())).await.unwrap();
        assert!(matches!(outcome, Outcome::Rejected(Rejection::NotFound)));
    }

    #[tokio::test]
    async fn start_rejects_empty_quiz_regardless_of_window() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool, "alice").await;
        // Scheduled long ago, so the window is closed too; NoQuestions
        // still takes precedence.
        let quiz_id = seed_quiz(
            &pool,
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            "01:00",
        )
        .await;
        let engine = AttemptEngine::new(pool);

        let outcome = engine
            .start(user_id, quiz_id, mid_window(today()))
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Rejected(Rejection::NoQuestions)));
    }

    #[tokio::test]
    async fn start_rejects_outside_window() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool, "alice").await;
        // Quiz scheduled 2024-01-01 with a 30 minute window; 00:31 is late.
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let quiz_id = seed_quiz(&pool, date, "00:30").await;
        seed_question(&pool, quiz_id, 1).await;
        let engine = AttemptEngine::new(pool);

        let late = Utc.with_ymd_and_hms(2024, 1, 1, 0, 31, 0).unwrap();
        let outcome = engine.start(user_id, quiz_id, late).await.unwrap();

        let Outcome::Rejected(Rejection::NotAvailable { date_of_quiz, window }) = outcome else {
            panic!("expected NotAvailable");
        };
        assert_eq!(date_of_quiz, date);
        assert_eq!(window, "00:00 - 00:30");
    }

    #[tokio::test]
    async fn submit_scores_and_records() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool, "alice").await;
        let date = today();
        let quiz_id = seed_quiz(&pool, date, "01:00").await;
        let q1 = seed_question(&pool, quiz_id, 1).await;
        let q2 = seed_question(&pool, quiz_id, 2).await;
        let engine = AttemptEngine::new(pool);

        let answers = HashMap::from([(q1, 1), (q2, 3)]);
        let outcome = engine
            .submit(user_id, quiz_id, answers, mid_window(date))
            .await
            .unwrap();

        let Outcome::Ok(receipt) = outcome else {
            panic!("expected a recorded attempt");
        };
        assert_eq!(receipt.total_scored, 1);
        assert_eq!(receipt.total_questions, 2);

        let stored = engine.ledger().get(receipt.attempt_id).await.unwrap();
        assert_eq!(stored.total_scored, 1);
    }

    #[tokio::test]
    async fn second_submit_returns_original_score() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool, "alice").await;
        let date = today();
        let quiz_id = seed_quiz(&pool, date, "01:00").await;
        let questions: Vec<i64> = {
            let mut ids = Vec::new();
            for _ in 0..5 {
                ids.push(seed_question(&pool, quiz_id, 1).await);
            }
            ids
        };
        let engine = AttemptEngine::new(pool);
        let now = mid_window(date);

        // First attempt: 3 of 5 correct.
        let answers: HashMap<i64, i64> = questions
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, if i < 3 { 1 } else { 2 }))
            .collect();
        let Outcome::Ok(receipt) = engine.submit(user_id, quiz_id, answers, now).await.unwrap()
        else {
            panic!("first submit should succeed");
        };
        assert_eq!(receipt.total_scored, 3);

        // Second submit, all correct this time, must be rejected and must
        // surface the original 3/5 rather than the new answers.
        let perfect: HashMap<i64, i64> = questions.iter().map(|&id| (id, 1)).collect();
        let outcome = engine.submit(user_id, quiz_id, perfect, now).await.unwrap();

        let Outcome::Rejected(Rejection::AlreadyAttempted {
            total_scored,
            total_questions,
        }) = outcome
        else {
            panic!("expected AlreadyAttempted");
        };
        assert_eq!(total_scored, Some(3));
        assert_eq!(total_questions, Some(5));
    }

    #[tokio::test]
    async fn start_after_submit_reports_prior_score() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool, "alice").await;
        let date = today();
        let quiz_id = seed_quiz(&pool, date, "01:00").await;
        let q1 = seed_question(&pool, quiz_id, 1).await;
        let engine = AttemptEngine::new(pool);
        let now = mid_window(date);

        engine
            .submit(user_id, quiz_id, HashMap::from([(q1, 1)]), now)
            .await
            .unwrap();

        let outcome = engine.start(user_id, quiz_id, now).await.unwrap();
        let Outcome::Rejected(Rejection::AlreadyAttempted { total_scored, .. }) = outcome else {
            panic!("expected AlreadyAttempted");
        };
        assert_eq!(total_scored, Some(1));
    }

    #[tokio::test]
    async fn result_rebuilds_review_from_persisted_answers() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool, "alice").await;
        let date = today();
        let quiz_id = seed_quiz(&pool, date, "01:00").await;
        let q1 = seed_question(&pool, quiz_id, 1).await;
        let q2 = seed_question(&pool, quiz_id, 2).await;
        let engine = AttemptEngine::new(pool);
        let now = mid_window(date);

        let Outcome::Ok(receipt) = engine
            .submit(user_id, quiz_id, HashMap::from([(q1, 1), (q2, 4)]), now)
            .await
            .unwrap()
        else {
            panic!("submit should succeed");
        };

        // Repeatable read, not one-shot.
        for _ in 0..2 {
            let Outcome::Ok(review) = engine.result(user_id, quiz_id).await.unwrap() else {
                panic!("expected a review");
            };
            assert_eq!(review.attempt_id, receipt.attempt_id);
            assert_eq!(review.total_scored, 1);
            assert_eq!(review.total_questions, 2);
            assert_eq!(review.questions.len(), 2);

            let first = &review.questions[0];
            assert_eq!(first.correct_option, 1);
            assert_eq!(first.submitted_option, Some(1));
            let second = &review.questions[1];
            assert_eq!(second.correct_option, 2);
            assert_eq!(second.submitted_option, Some(4));
        }
    }

    #[tokio::test]
    async fn result_for_unattempted_quiz_is_not_found() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool, "alice").await;
        let quiz_id = seed_quiz(&pool, today(), "01:00").await;
        seed_question(&pool, quiz_id, 1).await;
        let engine = AttemptEngine::new(pool);

        let outcome = engine.result(user_id, quiz_id).await.unwrap();
        assert!(matches!(outcome, Outcome::Rejected(Rejection::NotFound)));
    }

    #[tokio::test]
    async fn result_by_attempt_hides_other_users_attempts() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool, "alice").await;
        let other = seed_user(&pool, "bob").await;
        let date = today();
        let quiz_id = seed_quiz(&pool, date, "01:00").await;
        let q1 = seed_question(&pool, quiz_id, 1).await;
        let engine = AttemptEngine::new(pool);
        let now = mid_window(date);

        let Outcome::Ok(receipt) = engine
            .submit(user_id, quiz_id, HashMap::from([(q1, 1)]), now)
            .await
            .unwrap()
        else {
            panic!("submit should succeed");
        };

        let mine = engine
            .result_by_attempt(user_id, receipt.attempt_id)
            .await
            .unwrap();
        assert!(matches!(mine, Outcome::Ok(_)));

        let theirs = engine
            .result_by_attempt(other, receipt.attempt_id)
            .await
            .unwrap();
        assert!(matches!(theirs, Outcome::Rejected(Rejection::NotFound)));
    }
}
