// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::{Validate, ValidationError};

pub const QUESTION_TYPES: [&str; 3] = ["multiple_choice", "true_false", "short_answer"];

/// One display option.
/// `is_correct` is display metadata for clients that render the key;
/// grading only ever looks at `Question::correct_answer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    pub text: String,
    pub is_correct: bool,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// Owning exam.
    pub exam_id: i64,

    pub prompt: String,

    /// 'multiple_choice', 'true_false' or 'short_answer'.
    pub question_type: String,

    /// Stored as a JSON array in the database.
    pub options: Json<Vec<AnswerOption>>,

    /// Canonical answer value, compared by exact string equality.
    pub correct_answer: String,

    pub points: i64,

    pub explanation: Option<String>,

    pub created_by: i64,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for sending a question to exam takers: the answer key is withheld.
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub exam_id: i64,
    pub prompt: String,
    pub question_type: String,
    pub options: Json<Vec<AnswerOption>>,
    pub points: i64,
    pub explanation: Option<String>,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        PublicQuestion {
            id: q.id,
            exam_id: q.exam_id,
            prompt: q.prompt,
            question_type: q.question_type,
            options: q.options,
            points: q.points,
            explanation: q.explanation,
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    pub exam_id: i64,
    #[validate(length(min = 1, max = 2000))]
    pub prompt: String,
    #[validate(custom(function = validate_question_type))]
    pub question_type: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<AnswerOption>,
    #[validate(length(min = 1, max = 500))]
    pub correct_answer: String,
    #[validate(range(min = 0))]
    pub points: i64,
    #[validate(length(max = 2000))]
    pub explanation: Option<String>,
}

/// DTO for updating a question. Fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateQuestionRequest {
    pub prompt: Option<String>,
    pub question_type: Option<String>,
    pub options: Option<Vec<AnswerOption>>,
    pub correct_answer: Option<String>,
    pub points: Option<i64>,
    pub explanation: Option<String>,
}

/// Query filter for the question list endpoint.
#[derive(Debug, Deserialize)]
pub struct QuestionListParams {
    pub exam_id: Option<i64>,
}

pub fn validate_question_type(question_type: &str) -> Result<(), ValidationError> {
    if QUESTION_TYPES.contains(&question_type) {
        return Ok(());
    }
    Err(ValidationError::new("unknown_question_type"))
}

fn validate_options(options: &[AnswerOption]) -> Result<(), ValidationError> {
    for opt in options {
        if opt.text.is_empty() || opt.text.len() > 500 {
            return Err(ValidationError::new("option_text_length"));
        }
    }
    Ok(())
}
