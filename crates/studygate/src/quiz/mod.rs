//! Quiz grading and analytics
//!
//! Grades user attempts against stored quizzes and aggregates analytics
//! across historical attempt records. Malformed individual answers (unknown
//! question, out-of-range option index) count as incorrect rather than
//! failing the grade; grading always produces a result for a well-formed
//! quiz. Storage of quizzes and attempt history belongs to the collaborator
//! store, not this engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::interpret::GeneratedQuestion;

/// Points assigned to provider-generated questions
pub const DEFAULT_QUESTION_POINTS: u32 = 10;

/// A single quiz question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    /// Exactly four answer options
    pub options: Vec<String>,
    pub correct_option_index: usize,
    pub points: u32,
    #[serde(default)]
    pub explanation: String,
}

/// A quiz as provided by the collaborator store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub questions: Vec<Question>,
    /// Passing score as a percentage
    pub passing_score: u32,
    /// Time limit in seconds, if any
    #[serde(default)]
    pub time_limit_secs: Option<u64>,
}

/// A user's submitted attempt at a quiz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub quiz_id: String,
    /// question id -> selected option index
    pub answers: HashMap<String, usize>,
    pub submitted_at: DateTime<Utc>,
    /// Seconds spent, when the caller tracked it
    #[serde(default)]
    pub time_spent_secs: Option<u64>,
}

/// Grading outcome for one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedAnswer {
    pub question_id: String,
    /// None when the attempt had no answer for this question
    pub selected_option_index: Option<usize>,
    pub correct_option_index: usize,
    pub is_correct: bool,
    pub points_awarded: u32,
}

/// Full grading result for an attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeReport {
    pub score_percent: u32,
    pub correct_count: usize,
    pub passed: bool,
    pub graded_answers: Vec<GradedAnswer>,
}

/// Aggregate analytics over a quiz's historical attempts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnalytics {
    pub attempt_count: usize,
    /// Fixed 20-point-wide score buckets: 0-20, 21-40, 41-60, 61-80, 81-100
    pub score_histogram: [usize; 5],
    /// question id -> percentage of attempts that answered it correctly
    pub per_question_correct_percent: HashMap<String, u32>,
    /// Average time spent across attempts that reported it, in seconds
    pub average_time_spent_secs: Option<u64>,
}

/// A historical attempt with its grade, as retrieved from the store
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub attempt: Attempt,
    pub report: GradeReport,
}

/// Grades attempts and aggregates analytics
#[derive(Debug, Default)]
pub struct QuizAssessmentEngine;

impl QuizAssessmentEngine {
    pub fn new() -> Self {
        Self
    }

    /// Grade an attempt against a quiz
    ///
    /// Every question in the quiz is graded; an absent answer or an option
    /// index past the question's options is incorrect with zero points.
    /// A quiz with zero total possible points grades to 0%, not a division
    /// error.
    pub fn grade(&self, quiz: &Quiz, attempt: &Attempt) -> GradeReport {
        let mut graded_answers = Vec::with_capacity(quiz.questions.len());
        let mut awarded: u64 = 0;
        let mut possible: u64 = 0;
        let mut correct_count = 0;

        for question in &quiz.questions {
            possible += u64::from(question.points);

            let selected = attempt.answers.get(&question.id).copied();
            let is_correct = matches!(
                selected,
                Some(index) if index < question.options.len()
                    && index == question.correct_option_index
            );

            let points_awarded = if is_correct { question.points } else { 0 };
            if is_correct {
                correct_count += 1;
                awarded += u64::from(points_awarded);
            }

            graded_answers.push(GradedAnswer {
                question_id: question.id.clone(),
                selected_option_index: selected,
                correct_option_index: question.correct_option_index,
                is_correct,
                points_awarded,
            });
        }

        let score_percent = if possible == 0 {
            0
        } else {
            ((100 * awarded + possible / 2) / possible) as u32
        };

        GradeReport {
            score_percent,
            correct_count,
            passed: score_percent >= quiz.passing_score,
            graded_answers,
        }
    }

    /// Aggregate analytics across historical attempts for one quiz
    pub fn analytics(&self, records: &[AttemptRecord]) -> QuizAnalytics {
        let mut histogram = [0usize; 5];
        let mut correct_per_question: HashMap<String, usize> = HashMap::new();
        let mut seen_per_question: HashMap<String, usize> = HashMap::new();
        let mut time_total: u64 = 0;
        let mut time_samples: u64 = 0;

        for record in records {
            histogram[score_bucket(record.report.score_percent)] += 1;

            for graded in &record.report.graded_answers {
                *seen_per_question
                    .entry(graded.question_id.clone())
                    .or_default() += 1;
                if graded.is_correct {
                    *correct_per_question
                        .entry(graded.question_id.clone())
                        .or_default() += 1;
                }
            }

            if let Some(spent) = record.attempt.time_spent_secs {
                time_total += spent;
                time_samples += 1;
            }
        }

        let per_question_correct_percent = seen_per_question
            .into_iter()
            .map(|(id, seen)| {
                let correct = correct_per_question.get(&id).copied().unwrap_or(0);
                let percent = ((100 * correct as u64 + seen as u64 / 2) / seen as u64) as u32;
                (id, percent)
            })
            .collect();

        QuizAnalytics {
            attempt_count: records.len(),
            score_histogram: histogram,
            per_question_correct_percent,
            average_time_spent_secs: (time_samples > 0).then(|| time_total / time_samples),
        }
    }

    /// Build a gradable quiz from interpreter output
    ///
    /// Fresh ids are assigned and every question is worth
    /// `DEFAULT_QUESTION_POINTS`; the passing score comes from config.
    pub fn quiz_from_generated(
        &self,
        generated: &[GeneratedQuestion],
        passing_score: u32,
    ) -> Quiz {
        let questions = generated
            .iter()
            .map(|g| Question {
                id: Uuid::new_v4().to_string(),
                text: g.question.clone(),
                options: g.options.clone(),
                correct_option_index: g.correct_index,
                points: DEFAULT_QUESTION_POINTS,
                explanation: g.explanation.clone(),
            })
            .collect();

        Quiz {
            id: Uuid::new_v4().to_string(),
            questions,
            passing_score,
            time_limit_secs: None,
        }
    }
}

/// Map a score percentage to its histogram bucket
fn score_bucket(score_percent: u32) -> usize {
    match score_percent {
        0..=20 => 0,
        21..=40 => 1,
        41..=60 => 2,
        61..=80 => 3,
        _ => 4,
    }
}
