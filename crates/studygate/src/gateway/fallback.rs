//! Deterministic local fallback generator
//!
//! Substitutes for the upstream provider whenever it is unconfigured or
//! fails. Output is syntactically valid and schema-conformant with
//! placeholder semantic content: fixed-cadence chat replies, first-sentence
//! summaries, heuristic analysis estimates, and templated quiz questions.
//! Analysis and quiz output are emitted as the same JSON shapes the
//! interpreter parses, so primary and fallback results flow through one
//! code path.

use std::collections::HashMap;

use super::SummaryStyle;

/// Canned reply cadences, selected deterministically per message
const CHAT_CADENCES: &[&str] = &[
    "That's a good question about \"{topic}\". Break it into smaller parts and tackle each one: \
     start by writing down what you already know, then identify the gaps.",
    "When studying \"{topic}\", try explaining it out loud in your own words. If you get stuck, \
     that's exactly the part to review next.",
    "A useful approach to \"{topic}\" is spaced repetition: revisit the material tomorrow, then \
     in three days, then in a week.",
    "For \"{topic}\", make a quick outline of the main ideas first. Details are easier to retain \
     once the structure is clear.",
];

/// Words per minute used for reading-time estimates
const READING_WPM: usize = 200;

/// Deterministic local generator
#[derive(Debug, Default)]
pub struct LocalFallback;

impl LocalFallback {
    pub fn new() -> Self {
        Self
    }

    /// A non-empty, fixed-cadence chat reply
    pub fn chat_reply(&self, message: &str) -> String {
        let topic = topic_of(message);
        let cadence = CHAT_CADENCES[message.chars().count() % CHAT_CADENCES.len()];
        cadence.replace("{topic}", &topic)
    }

    /// A summary built from the leading sentences of the text
    pub fn summary(&self, text: &str, style: SummaryStyle) -> String {
        let sentences = sentences_of(text);
        if sentences.is_empty() {
            return truncate(text.trim(), 300);
        }

        match style {
            SummaryStyle::Brief => sentences
                .iter()
                .take(2)
                .cloned()
                .collect::<Vec<_>>()
                .join(" "),
            SummaryStyle::Detailed => sentences
                .iter()
                .take(5)
                .cloned()
                .collect::<Vec<_>>()
                .join(" "),
            SummaryStyle::BulletPoints => sentences
                .iter()
                .take(5)
                .map(|s| format!("- {s}"))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Heuristic analysis as schema-conformant JSON
    pub fn analysis_json(&self, text: &str) -> String {
        let words: Vec<&str> = text.split_whitespace().collect();
        let word_count = words.len();
        let reading_time_minutes = word_count.div_ceil(READING_WPM).max(1);

        let sentences = sentences_of(text);
        let avg_word_len = if word_count == 0 {
            0.0
        } else {
            words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / word_count as f64
        };
        let avg_sentence_len = if sentences.is_empty() {
            word_count as f64
        } else {
            word_count as f64 / sentences.len() as f64
        };

        let difficulty = if avg_word_len > 5.5 || avg_sentence_len > 22.0 {
            "advanced"
        } else if avg_word_len > 4.8 || avg_sentence_len > 14.0 {
            "intermediate"
        } else {
            "beginner"
        };

        let topics = frequent_terms(&words, 5);
        let key_topics: Vec<serde_json::Value> = topics
            .iter()
            .enumerate()
            .map(|(i, (term, _))| {
                serde_json::json!({
                    "topic": term,
                    "importance": ((0.9 - 0.1 * i as f64) * 100.0).round() / 100.0,
                })
            })
            .collect();

        let concepts: Vec<serde_json::Value> = topics
            .iter()
            .take(2)
            .map(|(term, count)| {
                serde_json::json!({
                    "name": term,
                    "definition": format!(
                        "Recurring term in the material ({count} occurrences); review its \
                         definition in context."
                    ),
                    "importance": 0.8,
                })
            })
            .collect();

        serde_json::json!({
            "difficulty": difficulty,
            "keyTopics": key_topics,
            "concepts": concepts,
            "wordCount": word_count,
            "readingTimeMinutes": reading_time_minutes,
        })
        .to_string()
    }

    /// Templated quiz questions as a schema-conformant JSON array
    pub fn quiz_json(&self, text: &str, count: usize) -> String {
        let sentences: Vec<String> = sentences_of(text)
            .into_iter()
            .filter(|s| s.split_whitespace().count() >= 5)
            .collect();

        let usable = if sentences.is_empty() {
            vec![truncate(text.trim(), 160)]
        } else {
            sentences
        };

        let questions: Vec<serde_json::Value> = usable
            .iter()
            .take(count)
            .enumerate()
            .map(|(i, sentence)| {
                let correct_index = i % 4;
                let statement = truncate(sentence, 160);
                let options: Vec<String> = (0..4)
                    .map(|slot| {
                        if slot == correct_index {
                            statement.clone()
                        } else {
                            format!("The material makes no such claim (distractor {})", slot + 1)
                        }
                    })
                    .collect();

                serde_json::json!({
                    "question": format!(
                        "According to the study material, which of the following statements \
                         is accurate? ({})",
                        i + 1
                    ),
                    "options": options,
                    "correctIndex": correct_index,
                    "explanation": "This statement appears directly in the study material.",
                    "difficulty": "medium",
                })
            })
            .collect();

        serde_json::Value::Array(questions).to_string()
    }
}

/// First few words of a message, used to echo the topic back
fn topic_of(message: &str) -> String {
    let topic: Vec<&str> = message.split_whitespace().take(6).collect();
    truncate(&topic.join(" "), 60)
}

/// Split text into trimmed, non-empty sentences
fn sentences_of(text: &str) -> Vec<String> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("{s}."))
        .collect()
}

/// Most frequent lowercase terms of six or more letters
fn frequent_terms(words: &[&str], limit: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in words {
        let term: String = word
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        if term.chars().count() >= 6 {
            *counts.entry(term).or_default() += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    // Count descending, term ascending so ties are deterministic
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}
