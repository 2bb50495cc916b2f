// src/handlers/catalog.rs

use std::collections::HashSet;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    engine::availability,
    error::AppError,
    models::{
        chapter::Chapter,
        quiz::{Quiz, QuizOverview},
        subject::Subject,
    },
    utils::jwt::Claims,
};

/// Lists all subjects.
pub async fn list_subjects(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let subjects = sqlx::query_as::<_, Subject>(
        "SELECT id, name, description, created_at FROM subjects ORDER BY name",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(subjects))
}

/// Lists the chapters of one subject.
pub async fn list_chapters(
    State(pool): State<SqlitePool>,
    Path(subject_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM subjects WHERE id = ?")
        .bind(subject_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Subject not found".to_string()))?;

    let chapters = sqlx::query_as::<_, Chapter>(
        "SELECT id, subject_id, name, description, created_at
         FROM chapters WHERE subject_id = ? ORDER BY name",
    )
    .bind(subject_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(chapters))
}

/// Lists the quizzes of one chapter, annotated with each quiz's admission
/// window and whether the caller has already attempted it.
pub async fn list_quizzes(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(chapter_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM chapters WHERE id = ?")
        .bind(chapter_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Chapter not found".to_string()))?;

    let quizzes = sqlx::query_as::<_, Quiz>(
        "SELECT id, chapter_id, title, date_of_quiz, time_duration, remarks, created_at
         FROM quizzes WHERE chapter_id = ? ORDER BY date_of_quiz, id",
    )
    .bind(chapter_id)
    .fetch_all(&pool)
    .await?;

    let attempted: HashSet<i64> = sqlx::query_scalar::<_, i64>(
        "SELECT quiz_id FROM scores
         WHERE user_id = ?
           AND quiz_id IN (SELECT id FROM quizzes WHERE chapter_id = ?)",
    )
    .bind(user_id)
    .bind(chapter_id)
    .fetch_all(&pool)
    .await?
    .into_iter()
    .collect();

    let overview: Vec<QuizOverview> = quizzes
        .into_iter()
        .map(|quiz| {
            let window = availability::window_label(&quiz.time_duration)
                .map_err(|e| AppError::InternalServerError(e.to_string()))?;
            Ok(QuizOverview {
                attempted: attempted.contains(&quiz.id),
                window,
                quiz,
            })
        })
        .collect::<Result<_, AppError>>()?;

    Ok(Json(overview))
}
