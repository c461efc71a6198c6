// src/handlers/exams.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        exam::{CreateExamRequest, Exam, ExamDetailResponse, ExamListItem, UpdateExamRequest},
        question::{PublicQuestion, Question},
    },
    utils::{html::clean_html, jwt::Claims},
};

const EXAM_COLUMNS: &str = "id, title, description, subject, duration, total_questions, \
     total_points, passing_score, is_active, created_by, created_at, updated_at";

async fn fetch_exam(pool: &PgPool, id: i64) -> Result<Exam, AppError> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {EXAM_COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))
}

/// Lists active exams, newest first, with their owned question ids.
pub async fn list_exams(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let exams = sqlx::query_as::<_, Exam>(&format!(
        "SELECT {EXAM_COLUMNS} FROM exams WHERE is_active = TRUE ORDER BY created_at DESC"
    ))
    .fetch_all(&pool)
    .await?;

    // Attach question ids in one round trip.
    let exam_ids: Vec<i64> = exams.iter().map(|e| e.id).collect();
    let mut by_exam: HashMap<i64, Vec<i64>> = HashMap::new();
    if !exam_ids.is_empty() {
        let rows = sqlx::query_as::<_, (i64, i64)>(
            "SELECT id, exam_id FROM questions WHERE exam_id = ANY($1) ORDER BY id",
        )
        .bind(exam_ids)
        .fetch_all(&pool)
        .await?;

        for (question_id, exam_id) in rows {
            by_exam.entry(exam_id).or_default().push(question_id);
        }
    }

    let items: Vec<ExamListItem> = exams
        .into_iter()
        .map(|exam| {
            let questions = by_exam.remove(&exam.id).unwrap_or_default();
            ExamListItem { exam, questions }
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "count": items.len(),
        "data": items,
    })))
}

/// One exam with its question set in the taker-facing shape
/// (answer keys withheld).
pub async fn get_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam = fetch_exam(&pool, id).await?;

    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, exam_id, prompt, question_type, options, correct_answer,
               points, explanation, created_by, created_at, updated_at
        FROM questions
        WHERE exam_id = $1
        ORDER BY id
        "#,
    )
    .bind(exam.id)
    .fetch_all(&pool)
    .await?;

    let questions: Vec<PublicQuestion> = questions.into_iter().map(Into::into).collect();

    Ok(Json(json!({
        "success": true,
        "data": ExamDetailResponse { exam, questions },
    })))
}

/// Creates an exam owned by the caller.
pub async fn create_exam(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let description = payload.description.as_deref().map(clean_html);

    let exam = sqlx::query_as::<_, Exam>(&format!(
        r#"
        INSERT INTO exams
            (title, description, subject, duration, total_questions,
             total_points, passing_score, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {EXAM_COLUMNS}
        "#
    ))
    .bind(payload.title.trim())
    .bind(description)
    .bind(payload.subject.trim())
    .bind(payload.duration)
    .bind(payload.total_questions)
    .bind(payload.total_points)
    .bind(payload.passing_score)
    .bind(claims.user_id())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create exam: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": exam,
        })),
    ))
}

/// Patches the provided fields of an exam. Owner only.
pub async fn update_exam(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let exam = fetch_exam(&pool, id).await?;

    if exam.created_by != claims.user_id() {
        return Err(AppError::BadRequest(
            "Only the exam owner can modify this exam".to_string(),
        ));
    }

    if payload.title.is_none()
        && payload.description.is_none()
        && payload.subject.is_none()
        && payload.duration.is_none()
        && payload.total_questions.is_none()
        && payload.total_points.is_none()
        && payload.passing_score.is_none()
        && payload.is_active.is_none()
    {
        return Ok(Json(json!({ "success": true, "data": exam })));
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE exams SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title);
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(clean_html(&description));
    }

    if let Some(subject) = payload.subject {
        separated.push("subject = ");
        separated.push_bind_unseparated(subject);
    }

    if let Some(duration) = payload.duration {
        separated.push("duration = ");
        separated.push_bind_unseparated(duration);
    }

    if let Some(total_questions) = payload.total_questions {
        separated.push("total_questions = ");
        separated.push_bind_unseparated(total_questions);
    }

    if let Some(total_points) = payload.total_points {
        separated.push("total_points = ");
        separated.push_bind_unseparated(total_points);
    }

    if let Some(passing_score) = payload.passing_score {
        separated.push("passing_score = ");
        separated.push_bind_unseparated(passing_score);
    }

    if let Some(is_active) = payload.is_active {
        separated.push("is_active = ");
        separated.push_bind_unseparated(is_active);
    }

    separated.push("updated_at = now()");
    builder.push(" WHERE id = ");
    builder.push_bind(id);

    builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update exam: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let updated = fetch_exam(&pool, id).await?;

    Ok(Json(json!({ "success": true, "data": updated })))
}

/// Deletes an exam and, through the store's cascade, its questions.
/// Owner only. Results referencing the exam are kept as history.
pub async fn delete_exam(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam = fetch_exam(&pool, id).await?;

    if exam.created_by != claims.user_id() {
        return Err(AppError::BadRequest(
            "Only the exam owner can delete this exam".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM exams WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete exam: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Exam deleted successfully",
    })))
}
