// src/handlers/attempt.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    engine::{AttemptEngine, AttemptLedger, Outcome, Rejection},
    error::AppError,
    models::score::SubmitAttemptRequest,
    utils::jwt::Claims,
};

/// Maps an engine rejection onto an HTTP response. Rejections are
/// expected outcomes, so they render as structured JSON, not as faults.
impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let status = match &self {
            Rejection::AlreadyAttempted { .. } => StatusCode::CONFLICT,
            Rejection::NotAvailable { .. } => StatusCode::FORBIDDEN,
            Rejection::NoQuestions => StatusCode::UNPROCESSABLE_ENTITY,
            Rejection::NotFound => StatusCode::NOT_FOUND,
        };
        (status, Json(self)).into_response()
    }
}

fn respond<T: Serialize>(outcome: Outcome<T>, success: StatusCode) -> Response {
    match outcome {
        Outcome::Ok(payload) => (success, Json(payload)).into_response(),
        Outcome::Rejected(rejection) => rejection.into_response(),
    }
}

/// Opens a quiz attempt and returns the question sheet (no answer key).
pub async fn start_attempt(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<Response, AppError> {
    let user_id = claims.user_id()?;
    let outcome = AttemptEngine::new(pool)
        .start(user_id, quiz_id, Utc::now())
        .await?;

    Ok(respond(outcome, StatusCode::OK))
}

/// Scores the submitted answers and records the attempt.
pub async fn submit_attempt(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<SubmitAttemptRequest>,
) -> Result<Response, AppError> {
    let user_id = claims.user_id()?;
    let outcome = AttemptEngine::new(pool)
        .submit(user_id, quiz_id, payload.answers, Utc::now())
        .await?;

    Ok(respond(outcome, StatusCode::CREATED))
}

/// The caller's result for a quiz: score, answer key, and submitted answers.
pub async fn attempt_result(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<Response, AppError> {
    let user_id = claims.user_id()?;
    let outcome = AttemptEngine::new(pool)
        .result(user_id, quiz_id)
        .await?;

    Ok(respond(outcome, StatusCode::OK))
}

/// A single attempt by id; 404 unless it belongs to the caller.
pub async fn attempt_detail(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<i64>,
) -> Result<Response, AppError> {
    let user_id = claims.user_id()?;
    let outcome = AttemptEngine::new(pool)
        .result_by_attempt(user_id, attempt_id)
        .await?;

    Ok(respond(outcome, StatusCode::OK))
}

/// The caller's completed attempts, newest first.
pub async fn attempt_history(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let history = AttemptLedger::new(pool).history(user_id).await?;

    Ok(Json(history))
}
