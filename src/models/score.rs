// src/models/score.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'scores' table in the database: one completed attempt.
///
/// Rows are write-once. There is deliberately no update or delete path;
/// the unique index on (user_id, quiz_id) makes a second insert fail.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Score {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: i64,
    pub time_stamp_of_attempt: chrono::DateTime<chrono::Utc>,
    pub total_scored: i64,
    pub total_questions: i64,

    /// The submitted answers (question id -> chosen option), persisted so
    /// the result view can be rebuilt statelessly at any later time.
    pub answers: sqlx::types::Json<HashMap<i64, i64>>,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitAttemptRequest {
    /// User's answers map.
    /// Key: Question ID
    /// Value: chosen option number (expected 1-4; anything else scores zero)
    pub answers: HashMap<i64, i64>,
}

/// One row of the user's attempt history, joined with the quiz title.
#[derive(Debug, Serialize, FromRow)]
pub struct AttemptHistoryEntry {
    pub quiz_id: i64,
    pub quiz_title: String,
    pub time_stamp_of_attempt: chrono::DateTime<chrono::Utc>,
    pub total_scored: i64,
    pub total_questions: i64,
}
