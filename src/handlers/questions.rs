// src/handlers/questions.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{
        CreateQuestionRequest, Question, QuestionListParams, UpdateQuestionRequest,
        validate_question_type,
    },
    utils::{html::clean_html, jwt::Claims},
};

const QUESTION_COLUMNS: &str = "id, exam_id, prompt, question_type, options, correct_answer, \
     points, explanation, created_by, created_at, updated_at";

async fn fetch_question(pool: &PgPool, id: i64) -> Result<Question, AppError> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Question not found".to_string()))
}

/// Lists questions, newest first, optionally filtered by exam.
/// Full documents, answer key included: this is the author-facing view.
pub async fn list_questions(
    State(pool): State<PgPool>,
    Query(params): Query<QuestionListParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {QUESTION_COLUMNS} FROM questions"));

    if let Some(exam_id) = params.exam_id {
        builder.push(" WHERE exam_id = ");
        builder.push_bind(exam_id);
    }
    builder.push(" ORDER BY created_at DESC");

    let questions: Vec<Question> = builder.build_query_as().fetch_all(&pool).await?;

    Ok(Json(json!({
        "success": true,
        "count": questions.len(),
        "data": questions,
    })))
}

/// One question, full document.
pub async fn get_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question = fetch_question(&pool, id).await?;

    Ok(Json(json!({
        "success": true,
        "data": question,
    })))
}

/// Creates a question inside an exam the caller can see.
pub async fn create_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    // Clean 404 instead of a foreign-key failure.
    sqlx::query("SELECT id FROM exams WHERE id = $1")
        .bind(payload.exam_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    let prompt = clean_html(&payload.prompt);
    let explanation = payload.explanation.as_deref().map(clean_html);

    let question = sqlx::query_as::<_, Question>(&format!(
        r#"
        INSERT INTO questions
            (exam_id, prompt, question_type, options, correct_answer,
             points, explanation, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {QUESTION_COLUMNS}
        "#
    ))
    .bind(payload.exam_id)
    .bind(prompt)
    .bind(&payload.question_type)
    .bind(sqlx::types::Json(payload.options))
    .bind(&payload.correct_answer)
    .bind(payload.points)
    .bind(explanation)
    .bind(claims.user_id())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": question,
        })),
    ))
}

/// Patches the provided fields of a question. Owner only.
pub async fn update_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let question = fetch_question(&pool, id).await?;

    if question.created_by != claims.user_id() {
        return Err(AppError::BadRequest(
            "Only the question owner can modify this question".to_string(),
        ));
    }

    if let Some(ref question_type) = payload.question_type {
        if validate_question_type(question_type).is_err() {
            return Err(AppError::BadRequest(format!(
                "Unknown question type '{}'",
                question_type
            )));
        }
    }

    if payload.prompt.is_none()
        && payload.question_type.is_none()
        && payload.options.is_none()
        && payload.correct_answer.is_none()
        && payload.points.is_none()
        && payload.explanation.is_none()
    {
        return Ok(Json(json!({ "success": true, "data": question })));
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE questions SET ");
    let mut separated = builder.separated(", ");

    if let Some(prompt) = payload.prompt {
        separated.push("prompt = ");
        separated.push_bind_unseparated(clean_html(&prompt));
    }

    if let Some(question_type) = payload.question_type {
        separated.push("question_type = ");
        separated.push_bind_unseparated(question_type);
    }

    if let Some(options) = payload.options {
        separated.push("options = ");
        separated.push_bind_unseparated(sqlx::types::Json(options));
    }

    if let Some(correct_answer) = payload.correct_answer {
        separated.push("correct_answer = ");
        separated.push_bind_unseparated(correct_answer);
    }

    if let Some(points) = payload.points {
        separated.push("points = ");
        separated.push_bind_unseparated(points);
    }

    if let Some(explanation) = payload.explanation {
        separated.push("explanation = ");
        separated.push_bind_unseparated(clean_html(&explanation));
    }

    separated.push("updated_at = now()");
    builder.push(" WHERE id = ");
    builder.push_bind(id);

    builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let updated = fetch_question(&pool, id).await?;

    Ok(Json(json!({ "success": true, "data": updated })))
}

/// Deletes a question. Owner only.
pub async fn delete_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question = fetch_question(&pool, id).await?;

    if question.created_by != claims.user_id() {
        return Err(AppError::BadRequest(
            "Only the question owner can delete this question".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Question deleted successfully",
    })))
}
