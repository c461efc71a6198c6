// src/handlers/results.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::{
        exam::Exam,
        question::Question,
        result::{ExamResult, SubmitResultRequest},
    },
    scoring,
    utils::jwt::Claims,
};

const RESULT_COLUMNS: &str = "id, user_id, exam_id, answers, total_score, max_score, \
     percentage, is_passed, time_spent, started_at, completed_at, created_at";

/// Grades a submission and persists the result.
///
/// The one write this endpoint performs is the result row itself; exams,
/// questions and users are untouched. A zero-point exam is rejected before
/// anything is persisted.
pub async fn submit_result(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitResultRequest>,
) -> Result<impl IntoResponse, AppError> {
    let exam = sqlx::query_as::<_, Exam>(
        r#"
        SELECT id, title, description, subject, duration, total_questions,
               total_points, passing_score, is_active, created_by,
               created_at, updated_at
        FROM exams
        WHERE id = $1
        "#,
    )
    .bind(payload.exam_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, exam_id, prompt, question_type, options, correct_answer,
               points, explanation, created_by, created_at, updated_at
        FROM questions
        WHERE exam_id = $1
        "#,
    )
    .bind(exam.id)
    .fetch_all(&pool)
    .await?;

    let graded = scoring::grade(&questions, &payload.answers);
    let percentage = scoring::percentage(graded.total_score, exam.total_points)?;
    let is_passed = percentage >= exam.passing_score;

    let result = sqlx::query_as::<_, ExamResult>(&format!(
        r#"
        INSERT INTO results
            (user_id, exam_id, answers, total_score, max_score, percentage,
             is_passed, time_spent, started_at, completed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now())
        RETURNING {RESULT_COLUMNS}
        "#
    ))
    .bind(claims.user_id())
    .bind(exam.id)
    .bind(sqlx::types::Json(graded.answers))
    .bind(graded.total_score)
    .bind(exam.total_points)
    .bind(percentage)
    .bind(is_passed)
    .bind(payload.time_spent)
    .bind(payload.started_at)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to persist result: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": result,
        })),
    ))
}

/// The caller's own result history, newest first.
pub async fn get_user_results(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let results = sqlx::query_as::<_, ExamResult>(&format!(
        "SELECT {RESULT_COLUMNS} FROM results WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "count": results.len(),
        "data": results,
    })))
}

/// One result by id.
pub async fn get_result(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query_as::<_, ExamResult>(&format!(
        "SELECT {RESULT_COLUMNS} FROM results WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Result not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "data": result,
    })))
}

/// All results recorded for an exam, newest first.
pub async fn get_exam_results(
    State(pool): State<PgPool>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let results = sqlx::query_as::<_, ExamResult>(&format!(
        "SELECT {RESULT_COLUMNS} FROM results WHERE exam_id = $1 ORDER BY created_at DESC"
    ))
    .bind(exam_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "count": results.len(),
        "data": results,
    })))
}
