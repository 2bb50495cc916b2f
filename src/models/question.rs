// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Represents the 'questions' table in the database.
///
/// `correct_option` is the answer key (1-4). It must never be serialized
/// towards a user who has not completed the quiz; handlers convert to
/// [`PublicQuestion`] before a quiz is scored.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    pub quiz_id: i64,

    /// The text of the question.
    pub statement: String,

    pub option1: String,
    pub option2: String,
    pub option3: String,
    pub option4: String,

    /// Which of the four options is correct (1-4).
    pub correct_option: i64,
}

/// DTO for sending a question to a client mid-attempt (excludes the answer key).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub statement: String,
    pub options: [String; 4],
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            statement: q.statement,
            options: [q.option1, q.option2, q.option3, q.option4],
        }
    }
}

/// DTO for creating or replacing a question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub statement: String,
    #[validate(length(min = 1, max = 200))]
    pub option1: String,
    #[validate(length(min = 1, max = 200))]
    pub option2: String,
    #[validate(length(min = 1, max = 200))]
    pub option3: String,
    #[validate(length(min = 1, max = 200))]
    pub option4: String,
    #[validate(range(min = 1, max = 4, message = "correct_option must be between 1 and 4."))]
    pub correct_option: i64,
}
