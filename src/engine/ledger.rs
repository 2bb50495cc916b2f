// src/engine/ledger.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::score::{AttemptHistoryEntry, Score},
};

/// Errors at the attempt-ledger boundary.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("an attempt for this user and quiz is already recorded")]
    DuplicateAttempt,

    #[error("attempt not found")]
    NotFound,

    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::DuplicateAttempt => {
                AppError::Conflict("Attempt already recorded".to_string())
            }
            LedgerError::NotFound => AppError::NotFound("Attempt not found".to_string()),
            LedgerError::Storage(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}

/// A completed attempt about to be recorded.
#[derive(Debug)]
pub struct NewAttempt {
    pub user_id: i64,
    pub quiz_id: i64,
    pub total_scored: i64,
    pub total_questions: i64,
    pub timestamp: DateTime<Utc>,
    pub answers: HashMap<i64, i64>,
}

/// Durable, write-once store of completed attempts.
///
/// Uniqueness of (user_id, quiz_id) is enforced by the database index,
/// not by an application-level check-then-act, so among N concurrent
/// `record` calls for the same pair exactly one insert succeeds and the
/// rest observe [`LedgerError::DuplicateAttempt`].
#[derive(Clone)]
pub struct AttemptLedger {
    pool: SqlitePool,
}

const SCORE_COLUMNS: &str =
    "id, quiz_id, user_id, time_stamp_of_attempt, total_scored, total_questions, answers";

impl AttemptLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn has_attempted(&self, user_id: i64, quiz_id: i64) -> Result<bool, LedgerError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM scores WHERE user_id = ? AND quiz_id = ?")
                .bind(user_id)
                .bind(quiz_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }

    /// The recorded attempt for this (user, quiz) pair, if any.
    pub async fn find(&self, user_id: i64, quiz_id: i64) -> Result<Option<Score>, LedgerError> {
        let score = sqlx::query_as::<_, Score>(&format!(
            "SELECT {SCORE_COLUMNS} FROM scores WHERE user_id = ? AND quiz_id = ?"
        ))
        .bind(user_id)
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(score)
    }

    /// Records a completed attempt; returns the new attempt id.
    ///
    /// A single INSERT against the unique (user_id, quiz_id) index. A
    /// unique-constraint violation means some other submission won the
    /// race and is reported as `DuplicateAttempt`.
    pub async fn record(&self, attempt: NewAttempt) -> Result<i64, LedgerError> {
        let result = sqlx::query(
            "INSERT INTO scores
                 (quiz_id, user_id, time_stamp_of_attempt, total_scored, total_questions, answers)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(attempt.quiz_id)
        .bind(attempt.user_id)
        .bind(attempt.timestamp)
        .bind(attempt.total_scored)
        .bind(attempt.total_questions)
        .bind(sqlx::types::Json(attempt.answers))
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.last_insert_rowid()),
            Err(e) if is_unique_violation(&e) => Err(LedgerError::DuplicateAttempt),
            Err(e) => Err(LedgerError::Storage(e)),
        }
    }

    pub async fn get(&self, attempt_id: i64) -> Result<Score, LedgerError> {
        sqlx::query_as::<_, Score>(&format!("SELECT {SCORE_COLUMNS} FROM scores WHERE id = ?"))
            .bind(attempt_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(LedgerError::NotFound)
    }

    /// The user's completed attempts, newest first.
    pub async fn history(&self, user_id: i64) -> Result<Vec<AttemptHistoryEntry>, LedgerError> {
        let entries = sqlx::query_as::<_, AttemptHistoryEntry>(
            "SELECT
                 s.quiz_id,
                 q.title AS quiz_title,
                 s.time_stamp_of_attempt,
                 s.total_scored,
                 s.total_questions
             FROM scores s
             JOIN quizzes q ON q.id = s.quiz_id
             WHERE s.user_id = ?
             ORDER BY s.time_stamp_of_attempt DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
