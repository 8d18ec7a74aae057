//! Response interpreter for free-form provider output
//!
//! Upstream generators routinely wrap JSON in prose or markdown fences, so
//! the interpreter scans for brace/bracket boundaries and is tolerant of
//! surrounding noise while staying strict about the payload's internal
//! shape. Parsing is all-or-nothing for analysis payloads and per-element
//! for quiz batches; partially-trusted structured data is never returned.

use serde::{Deserialize, Serialize};

/// Number of answer options every generated question must carry
pub const OPTION_COUNT: usize = 4;

/// Difficulty rating for analyzed text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// A key topic identified in analyzed text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyTopic {
    pub topic: String,
    pub importance: f32,
}

/// A concept with its definition identified in analyzed text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub name: String,
    pub definition: String,
    pub importance: f32,
}

/// Structured analysis payload expected from the `analyze` operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub difficulty: Difficulty,
    pub key_topics: Vec<KeyTopic>,
    pub concepts: Vec<Concept>,
    pub word_count: usize,
    pub reading_time_minutes: u32,
}

/// Outcome of interpreting an analysis response
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// A schema-conformant payload was extracted
    Structured(Analysis),
    /// No payload could be extracted; the original text is preserved
    Unstructured { raw: String },
}

impl AnalysisOutcome {
    /// Whether a structured payload was extracted
    pub fn is_structured(&self) -> bool {
        matches!(self, AnalysisOutcome::Structured(_))
    }
}

/// A single provider-generated quiz question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub difficulty: Option<String>,
}

/// Result of interpreting a quiz generation response
///
/// `raw` is populated only when zero elements survived validation, so the
/// caller can decide whether to retry or fall back to local generation.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizBatch {
    pub questions: Vec<GeneratedQuestion>,
    pub raw: Option<String>,
}

/// Extract a structured analysis payload from free-form text
///
/// Locates the first `{` and last `}` and attempts a strict parse of the
/// substring. Any failure (no brace pair, malformed JSON, schema mismatch)
/// yields `Unstructured` carrying the original text untouched.
pub fn parse_analysis(text: &str) -> AnalysisOutcome {
    let Some(candidate) = delimited_slice(text, '{', '}') else {
        return AnalysisOutcome::Unstructured {
            raw: text.to_string(),
        };
    };

    match serde_json::from_str::<Analysis>(candidate) {
        Ok(analysis) => AnalysisOutcome::Structured(analysis),
        Err(e) => {
            tracing::debug!("Analysis payload rejected: {e}");
            AnalysisOutcome::Unstructured {
                raw: text.to_string(),
            }
        }
    }
}

/// Extract a batch of quiz questions from free-form text
///
/// Locates the first `[` and last `]`, parses the substring as a JSON
/// array, then filters each element against the question schema. Invalid
/// elements are dropped silently rather than rejecting the whole batch.
pub fn parse_quiz_batch(text: &str) -> QuizBatch {
    let Some(candidate) = delimited_slice(text, '[', ']') else {
        return QuizBatch {
            questions: Vec::new(),
            raw: Some(text.to_string()),
        };
    };

    let elements: Vec<serde_json::Value> = match serde_json::from_str(candidate) {
        Ok(elements) => elements,
        Err(e) => {
            tracing::debug!("Quiz batch rejected: {e}");
            return QuizBatch {
                questions: Vec::new(),
                raw: Some(text.to_string()),
            };
        }
    };

    let total = elements.len();
    let questions: Vec<GeneratedQuestion> = elements
        .into_iter()
        .filter_map(|element| {
            serde_json::from_value::<GeneratedQuestion>(element)
                .ok()
                .filter(is_valid_question)
        })
        .collect();

    if questions.len() < total {
        tracing::debug!(
            "Dropped {} invalid quiz elements of {}",
            total - questions.len(),
            total
        );
    }

    if questions.is_empty() {
        QuizBatch {
            questions,
            raw: Some(text.to_string()),
        }
    } else {
        QuizBatch {
            questions,
            raw: None,
        }
    }
}

fn is_valid_question(q: &GeneratedQuestion) -> bool {
    !q.question.trim().is_empty()
        && q.options.len() == OPTION_COUNT
        && q.correct_index < OPTION_COUNT
}

/// The substring between the first `open` and the last `close` delimiter,
/// inclusive. None if either is missing or they are inverted.
fn delimited_slice(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_analysis_json() -> String {
        serde_json::json!({
            "difficulty": "intermediate",
            "keyTopics": [{"topic": "ownership", "importance": 0.9}],
            "concepts": [{
                "name": "borrow checker",
                "definition": "Compile-time enforcement of aliasing rules",
                "importance": 0.8
            }],
            "wordCount": 420,
            "readingTimeMinutes": 3
        })
        .to_string()
    }

    #[test]
    fn test_parse_analysis_plain_json() {
        let outcome = parse_analysis(&valid_analysis_json());
        let AnalysisOutcome::Structured(analysis) = outcome else {
            panic!("expected structured outcome");
        };
        assert_eq!(analysis.difficulty, Difficulty::Intermediate);
        assert_eq!(analysis.key_topics.len(), 1);
        assert_eq!(analysis.key_topics[0].topic, "ownership");
        assert_eq!(analysis.word_count, 420);
        assert_eq!(analysis.reading_time_minutes, 3);
    }

    #[test]
    fn test_parse_analysis_wrapped_in_prose() {
        let text = format!(
            "Sure! Here is the analysis you asked for:\n```json\n{}\n```\nLet me know if you need more.",
            valid_analysis_json()
        );
        assert!(parse_analysis(&text).is_structured());
    }

    #[test]
    fn test_parse_analysis_no_braces_returns_unstructured() {
        let text = "This text has no JSON in it at all.";
        let outcome = parse_analysis(text);
        assert_eq!(
            outcome,
            AnalysisOutcome::Unstructured {
                raw: text.to_string()
            }
        );
    }

    #[test]
    fn test_parse_analysis_malformed_json_returns_unstructured() {
        let text = "{ this is not valid json }";
        let outcome = parse_analysis(text);
        let AnalysisOutcome::Unstructured { raw } = outcome else {
            panic!("expected unstructured outcome");
        };
        assert_eq!(raw, text);
    }

    #[test]
    fn test_parse_analysis_schema_mismatch_returns_unstructured() {
        // Valid JSON but missing required fields
        let text = r#"{"difficulty": "beginner"}"#;
        assert!(!parse_analysis(text).is_structured());
    }

    #[test]
    fn test_parse_analysis_inverted_braces() {
        let outcome = parse_analysis("} nothing here {");
        assert!(!outcome.is_structured());
    }

    #[test]
    fn test_parse_analysis_round_trip() {
        // Re-parsing our own serialized schema reproduces the same object
        let original = Analysis {
            difficulty: Difficulty::Advanced,
            key_topics: vec![KeyTopic {
                topic: "lifetimes".to_string(),
                importance: 0.7,
            }],
            concepts: vec![],
            word_count: 100,
            reading_time_minutes: 1,
        };
        let serialized = serde_json::to_string(&original).unwrap();
        let AnalysisOutcome::Structured(reparsed) = parse_analysis(&serialized) else {
            panic!("expected structured outcome");
        };
        assert_eq!(reparsed, original);
    }

    fn valid_quiz_json() -> String {
        serde_json::json!([
            {
                "question": "What does the borrow checker enforce?",
                "options": ["Aliasing rules", "Style rules", "Naming rules", "Build order"],
                "correctIndex": 0,
                "explanation": "It enforces aliasing and lifetime rules at compile time.",
                "difficulty": "medium"
            },
            {
                "question": "Which keyword declares an immutable binding?",
                "options": ["var", "let", "const fn", "static mut"],
                "correctIndex": 1,
                "explanation": "let bindings are immutable by default."
            }
        ])
        .to_string()
    }

    #[test]
    fn test_parse_quiz_batch_valid() {
        let batch = parse_quiz_batch(&valid_quiz_json());
        assert_eq!(batch.questions.len(), 2);
        assert!(batch.raw.is_none());
        assert_eq!(batch.questions[0].correct_index, 0);
        assert_eq!(batch.questions[1].options.len(), 4);
    }

    #[test]
    fn test_parse_quiz_batch_wrapped_in_markdown() {
        let text = format!("Here you go:\n```json\n{}\n```", valid_quiz_json());
        let batch = parse_quiz_batch(&text);
        assert_eq!(batch.questions.len(), 2);
    }

    #[test]
    fn test_parse_quiz_batch_filters_invalid_elements() {
        let text = serde_json::json!([
            {
                "question": "Valid question?",
                "options": ["a", "b", "c", "d"],
                "correctIndex": 2
            },
            {
                "question": "",
                "options": ["a", "b", "c", "d"],
                "correctIndex": 0
            },
            {
                "question": "Wrong option count",
                "options": ["a", "b"],
                "correctIndex": 0
            },
            {
                "question": "Index out of range",
                "options": ["a", "b", "c", "d"],
                "correctIndex": 7
            }
        ])
        .to_string();

        let batch = parse_quiz_batch(&text);
        assert_eq!(batch.questions.len(), 1);
        assert_eq!(batch.questions[0].question, "Valid question?");
        assert!(batch.raw.is_none());
    }

    #[test]
    fn test_parse_quiz_batch_zero_survivors_keeps_raw() {
        let text = r#"[{"question": "", "options": [], "correctIndex": 9}]"#;
        let batch = parse_quiz_batch(text);
        assert!(batch.questions.is_empty());
        assert_eq!(batch.raw.as_deref(), Some(text));
    }

    #[test]
    fn test_parse_quiz_batch_no_brackets_keeps_raw() {
        let text = "I could not generate any questions.";
        let batch = parse_quiz_batch(text);
        assert!(batch.questions.is_empty());
        assert_eq!(batch.raw.as_deref(), Some(text));
    }

    #[test]
    fn test_parse_quiz_batch_not_an_array() {
        let text = r#"["just", "strings"]"#;
        let batch = parse_quiz_batch(text);
        assert!(batch.questions.is_empty());
        assert!(batch.raw.is_some());
    }
}
