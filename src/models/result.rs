// src/models/result.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

/// One graded answer inside a result document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: i64,
    pub selected_answer: String,
    pub is_correct: bool,
    pub points_awarded: i64,
}

/// Represents the 'results' table in the database.
/// Write-once: rows are never updated or deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamResult {
    pub id: i64,

    pub user_id: i64,

    pub exam_id: i64,

    /// Per-question answer records, stored as a JSON array.
    pub answers: Json<Vec<AnswerRecord>>,

    pub total_score: i64,

    /// The exam's total_points at grading time.
    pub max_score: i64,

    /// Rounded percentage of `max_score` achieved.
    pub percentage: i64,

    pub is_passed: bool,

    /// Seconds the caller reports having spent.
    pub time_spent: i64,

    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// One submitted answer.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    pub selected_answer: String,
}

/// DTO for submitting a finished attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitResultRequest {
    pub exam_id: i64,
    pub answers: Vec<SubmittedAnswer>,
    pub time_spent: i64,
    pub started_at: chrono::DateTime<chrono::Utc>,
}
