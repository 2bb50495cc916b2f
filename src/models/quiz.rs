// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::engine::availability;

/// Represents the 'quizzes' table in the database.
///
/// A quiz is attemptable only on `date_of_quiz`, from midnight UTC until
/// `time_duration` ("HH:MM") past midnight; see [`crate::engine::availability`].
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub chapter_id: i64,
    pub title: String,

    /// Scheduled calendar date, interpreted as UTC.
    pub date_of_quiz: chrono::NaiveDate,

    /// Duration as "HH:MM". Always parseable and non-zero; enforced on write.
    pub time_duration: String,

    pub remarks: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating or updating a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct QuizRequest {
    pub chapter_id: i64,
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    pub date_of_quiz: chrono::NaiveDate,
    #[validate(custom(function = validate_duration))]
    pub time_duration: String,
    #[validate(length(max = 2000))]
    pub remarks: Option<String>,
}

fn validate_duration(value: &str) -> Result<(), validator::ValidationError> {
    availability::parse_duration(value)
        .map(|_| ())
        .map_err(|_| validator::ValidationError::new("invalid_duration"))
}

/// A quiz as shown on the user's browse pages: the raw row plus its
/// availability window and whether the caller has already attempted it.
#[derive(Debug, Serialize)]
pub struct QuizOverview {
    #[serde(flatten)]
    pub quiz: Quiz,
    /// Human-readable admission window, e.g. "00:00 - 01:30".
    pub window: String,
    pub attempted: bool,
}
