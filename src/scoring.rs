// src/scoring.rs

//! Grading pipeline for result submission.
//!
//! Pure over the exam's question set and the submitted answers; the
//! handler persists the outcome exactly once and nothing else changes.

use std::collections::HashMap;

use crate::{
    error::AppError,
    models::{
        question::Question,
        result::{AnswerRecord, SubmittedAnswer},
    },
};

/// Outcome of grading one submission.
#[derive(Debug, PartialEq)]
pub struct GradedSubmission {
    pub answers: Vec<AnswerRecord>,
    pub total_score: i64,
}

/// Grades submitted answers against the exam's question set.
///
/// An answer referencing a question outside the exam is skipped, not an
/// error. Correctness is exact string equality on the canonical answer
/// value: no trimming, no case folding.
pub fn grade(questions: &[Question], submitted: &[SubmittedAnswer]) -> GradedSubmission {
    let by_id: HashMap<i64, &Question> = questions.iter().map(|q| (q.id, q)).collect();

    let mut answers = Vec::with_capacity(submitted.len());
    let mut total_score = 0;

    for answer in submitted {
        let Some(question) = by_id.get(&answer.question_id) else {
            continue;
        };

        let is_correct = question.correct_answer == answer.selected_answer;
        let points_awarded = if is_correct { question.points } else { 0 };
        total_score += points_awarded;

        answers.push(AnswerRecord {
            question_id: question.id,
            selected_answer: answer.selected_answer.clone(),
            is_correct,
            points_awarded,
        });
    }

    GradedSubmission {
        answers,
        total_score,
    }
}

/// Rounded percentage of `total_points` achieved, half-up.
///
/// A zero-point exam cannot be graded; surfacing it as a configuration
/// error keeps NaN/Inf out of stored results.
pub fn percentage(total_score: i64, total_points: i64) -> Result<i64, AppError> {
    if total_points == 0 {
        return Err(AppError::InvalidConfig(
            "Exam has zero total points and cannot be graded".to_string(),
        ));
    }
    Ok((total_score as f64 / total_points as f64 * 100.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;

    fn question(id: i64, correct_answer: &str, points: i64) -> Question {
        Question {
            id,
            exam_id: 1,
            prompt: format!("Question {id}"),
            question_type: "multiple_choice".to_string(),
            options: Json(Vec::new()),
            correct_answer: correct_answer.to_string(),
            points,
            explanation: None,
            created_by: 1,
            created_at: None,
            updated_at: None,
        }
    }

    fn answer(question_id: i64, selected: &str) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id,
            selected_answer: selected.to_string(),
        }
    }

    #[test]
    fn half_right_half_wrong() {
        let questions = [question(1, "A", 50), question(2, "B", 50)];
        let submitted = [answer(1, "A"), answer(2, "C")];

        let graded = grade(&questions, &submitted);

        assert_eq!(graded.total_score, 50);
        assert_eq!(graded.answers.len(), 2);
        assert!(graded.answers[0].is_correct);
        assert_eq!(graded.answers[0].points_awarded, 50);
        assert!(!graded.answers[1].is_correct);
        assert_eq!(graded.answers[1].points_awarded, 0);

        let pct = percentage(graded.total_score, 100).unwrap();
        assert_eq!(pct, 50);
        assert!(pct < 60, "50% must not pass a 60% bar");
    }

    #[test]
    fn answer_for_unknown_question_is_skipped() {
        let questions = [question(1, "A", 50)];
        let submitted = [answer(1, "A"), answer(99, "A")];

        let graded = grade(&questions, &submitted);

        assert_eq!(graded.total_score, 50);
        assert_eq!(graded.answers.len(), 1);
        assert_eq!(graded.answers[0].question_id, 1);
    }

    #[test]
    fn matching_is_exact_and_case_sensitive() {
        let questions = [question(1, "Paris", 10)];

        assert_eq!(grade(&questions, &[answer(1, "paris")]).total_score, 0);
        assert_eq!(grade(&questions, &[answer(1, "Paris ")]).total_score, 0);
        assert_eq!(grade(&questions, &[answer(1, "Paris")]).total_score, 10);
    }

    #[test]
    fn empty_submission_scores_zero() {
        let questions = [question(1, "A", 50)];
        let graded = grade(&questions, &[]);

        assert_eq!(graded.total_score, 0);
        assert!(graded.answers.is_empty());
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 200).unwrap(), 1); // 0.5 -> 1
        assert_eq!(percentage(1, 3).unwrap(), 33); // 33.33 -> 33
        assert_eq!(percentage(2, 3).unwrap(), 67); // 66.67 -> 67
        assert_eq!(percentage(100, 100).unwrap(), 100);
        assert_eq!(percentage(0, 100).unwrap(), 0);
    }

    #[test]
    fn zero_point_exam_is_a_configuration_error() {
        let err = percentage(10, 0).unwrap_err();
        assert!(matches!(err, AppError::InvalidConfig(_)));
    }
}
