//! Prompt templates for gateway operations
//!
//! Placeholders are substituted with `str::replace` before dispatch.

pub const CHAT_PROMPT: &str = "You are a helpful study assistant. Answer the student's question \
clearly and concisely.\n\n{context}Student: {message}";

pub const WEB_CONTEXT_HEADER: &str = "\n\n--- Web content ---\n";

pub const WEB_CONTEXT_DISCLAIMER: &str = "\n\nNote: current web information could not be \
retrieved; the answer may not reflect recent events.";

pub const SUMMARIZE_PROMPT: &str = "Summarize the following study material. {style_instruction}\n\n\
Material:\n{text}";

pub const SUMMARIZE_BRIEF: &str = "Produce a brief summary of two to three sentences.";
pub const SUMMARIZE_DETAILED: &str =
    "Produce a detailed summary covering all major points in several paragraphs.";
pub const SUMMARIZE_BULLETS: &str = "Produce a bullet-point summary, one key point per line.";

pub const ANALYZE_PROMPT: &str = "Analyze the following study material. Respond with ONLY a JSON \
object of this exact shape:\n\
{\"difficulty\": \"beginner\"|\"intermediate\"|\"advanced\", \
\"keyTopics\": [{\"topic\": string, \"importance\": number}], \
\"concepts\": [{\"name\": string, \"definition\": string, \"importance\": number}], \
\"wordCount\": integer, \"readingTimeMinutes\": integer}\n\n\
Material:\n{text}";

pub const QUIZ_PROMPT: &str = "Generate exactly {count} multiple-choice questions from the \
following study material. {difficulty_line}Respond with ONLY a JSON array where each element \
has this exact shape:\n\
{\"question\": string, \"options\": [string, string, string, string], \
\"correctIndex\": integer 0-3, \"explanation\": string, \"difficulty\": string}\n\n\
Material:\n{text}";

pub const QUIZ_DIFFICULTY_LINE: &str = "Target a {difficulty} difficulty level. ";
