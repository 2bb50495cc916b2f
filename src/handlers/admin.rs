// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        chapter::ChapterRequest,
        question::CreateQuestionRequest,
        quiz::QuizRequest,
        subject::SubjectRequest,
        user::User,
    },
};

/// Lists all users in the system.
/// Admin only.
pub async fn list_users(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id, username, password, full_name, qualification, dob, role, created_at
         FROM users ORDER BY id DESC",
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(users))
}

/// Dashboard counters: users, subjects, chapters, quizzes.
/// Admin only.
pub async fn stats(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let users: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users")
        .fetch_one(&pool)
        .await?;
    let subjects: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM subjects")
        .fetch_one(&pool)
        .await?;
    let chapters: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM chapters")
        .fetch_one(&pool)
        .await?;
    let quizzes: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM quizzes")
        .fetch_one(&pool)
        .await?;

    Ok(Json(serde_json::json!({
        "users": users,
        "subjects": subjects,
        "chapters": chapters,
        "quizzes": quizzes,
    })))
}

// ---------- Subjects ---------- //

pub async fn create_subject(
    State(pool): State<SqlitePool>,
    Json(payload): Json<SubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let id = sqlx::query("INSERT INTO subjects (name, description) VALUES (?, ?)")
        .bind(&payload.name)
        .bind(&payload.description)
        .execute(&pool)
        .await?
        .last_insert_rowid();

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

pub async fn update_subject(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<SubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let updated = sqlx::query("UPDATE subjects SET name = ?, description = ? WHERE id = ?")
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(id)
        .execute(&pool)
        .await?
        .rows_affected();

    if updated == 0 {
        return Err(AppError::NotFound("Subject not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Deletes a subject. Chapters, quizzes, questions and scores underneath
/// it go with it (cascade).
pub async fn delete_subject(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = sqlx::query("DELETE FROM subjects WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound("Subject not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------- Chapters ---------- //

pub async fn create_chapter(
    State(pool): State<SqlitePool>,
    Json(payload): Json<ChapterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    sqlx::query_scalar::<_, i64>("SELECT id FROM subjects WHERE id = ?")
        .bind(payload.subject_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::BadRequest("Unknown subject_id".to_string()))?;

    let id = sqlx::query("INSERT INTO chapters (subject_id, name, description) VALUES (?, ?, ?)")
        .bind(payload.subject_id)
        .bind(&payload.name)
        .bind(&payload.description)
        .execute(&pool)
        .await?
        .last_insert_rowid();

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

pub async fn update_chapter(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<ChapterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let updated =
        sqlx::query("UPDATE chapters SET subject_id = ?, name = ?, description = ? WHERE id = ?")
            .bind(payload.subject_id)
            .bind(&payload.name)
            .bind(&payload.description)
            .bind(id)
            .execute(&pool)
            .await?
            .rows_affected();

    if updated == 0 {
        return Err(AppError::NotFound("Chapter not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_chapter(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = sqlx::query("DELETE FROM chapters WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound("Chapter not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------- Quizzes ---------- //

/// Creates a quiz. The duration is validated here, at the write boundary,
/// so the availability calculator can rely on every stored quiz having a
/// parseable, non-zero duration.
pub async fn create_quiz(
    State(pool): State<SqlitePool>,
    Json(payload): Json<QuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    sqlx::query_scalar::<_, i64>("SELECT id FROM chapters WHERE id = ?")
        .bind(payload.chapter_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::BadRequest("Unknown chapter_id".to_string()))?;

    let id = sqlx::query(
        "INSERT INTO quizzes (chapter_id, title, date_of_quiz, time_duration, remarks)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(payload.chapter_id)
    .bind(&payload.title)
    .bind(payload.date_of_quiz)
    .bind(&payload.time_duration)
    .bind(&payload.remarks)
    .execute(&pool)
    .await?
    .last_insert_rowid();

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

pub async fn update_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<QuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let updated = sqlx::query(
        "UPDATE quizzes
         SET chapter_id = ?, title = ?, date_of_quiz = ?, time_duration = ?, remarks = ?
         WHERE id = ?",
    )
    .bind(payload.chapter_id)
    .bind(&payload.title)
    .bind(payload.date_of_quiz)
    .bind(&payload.time_duration)
    .bind(&payload.remarks)
    .bind(id)
    .execute(&pool)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Deletes a quiz, its questions, and any recorded attempts for it.
pub async fn delete_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = sqlx::query("DELETE FROM quizzes WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------- Questions ---------- //

pub async fn create_question(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    sqlx::query_scalar::<_, i64>("SELECT id FROM quizzes WHERE id = ?")
        .bind(quiz_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let id = sqlx::query(
        "INSERT INTO questions
             (quiz_id, statement, option1, option2, option3, option4, correct_option)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(quiz_id)
    .bind(&payload.statement)
    .bind(&payload.option1)
    .bind(&payload.option2)
    .bind(&payload.option3)
    .bind(&payload.option4)
    .bind(payload.correct_option)
    .execute(&pool)
    .await?
    .last_insert_rowid();

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

pub async fn update_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let updated = sqlx::query(
        "UPDATE questions
         SET statement = ?, option1 = ?, option2 = ?, option3 = ?, option4 = ?, correct_option = ?
         WHERE id = ?",
    )
    .bind(&payload.statement)
    .bind(&payload.option1)
    .bind(&payload.option2)
    .bind(&payload.option3)
    .bind(&payload.option4)
    .bind(payload.correct_option)
    .bind(id)
    .execute(&pool)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = sqlx::query("DELETE FROM questions WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
