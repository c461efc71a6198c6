// src/models/exam.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

use crate::models::question::PublicQuestion;

/// Represents the 'exams' table in the database.
///
/// An exam's question set is the projection `questions WHERE exam_id = id`;
/// there is no id array to keep in sync on this row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,

    pub title: String,

    pub description: Option<String>,

    pub subject: String,

    /// Time allowed, in minutes.
    pub duration: i64,

    pub total_questions: i64,

    /// Points the full exam is worth; the denominator of the score percentage.
    pub total_points: i64,

    /// Minimum percentage required to pass.
    pub passing_score: i64,

    pub is_active: bool,

    pub created_by: i64,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// List item: the exam plus the ids of its owned questions.
#[derive(Debug, Serialize)]
pub struct ExamListItem {
    #[serde(flatten)]
    pub exam: Exam,
    pub questions: Vec<i64>,
}

/// Detail view: the exam plus its public (answer-key-free) question set.
#[derive(Debug, Serialize)]
pub struct ExamDetailResponse {
    #[serde(flatten)]
    pub exam: Exam,
    pub questions: Vec<PublicQuestion>,
}

/// DTO for creating a new exam.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExamRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub subject: String,
    #[validate(range(min = 1))]
    pub duration: i64,
    #[validate(range(min = 0))]
    pub total_questions: i64,
    #[validate(range(min = 0))]
    pub total_points: i64,
    #[validate(range(min = 0, max = 100))]
    pub passing_score: i64,
}

/// DTO for updating an exam. Fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateExamRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub duration: Option<i64>,
    pub total_questions: Option<i64>,
    pub total_points: Option<i64>,
    pub passing_score: Option<i64>,
    pub is_active: Option<bool>,
}
