//! Provider gateway
//!
//! Presents one operation per call (chat, summarize, analyze, quiz
//! generation, web-augmented chat) and never raises to the caller for those
//! operations: the upstream provider is tried first and any failure is
//! substituted with the deterministic local generator. The winning strategy
//! is recorded as a first-class `source` field rather than inferred from
//! which error path ran. The only surfaced failure is an input contract
//! violation, signaled before any provider call.

pub mod fallback;
pub mod prompts;
pub mod provider;
pub mod remote;

pub use fallback::LocalFallback;
pub use provider::{Generator, GeneratorError};
pub use remote::RemoteProvider;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::acquire::WebAcquisitionPipeline;
use crate::config::{AcquisitionConfig, ProviderConfig, QuizConfig};
use crate::error::{Result, StudygateError};
use crate::interpret::{self, Analysis, AnalysisOutcome, GeneratedQuestion};

/// Fixed vocabulary for the needs-current-information classifier. A coarse
/// keyword heuristic carried over deliberately; matches are on whole
/// lowercase tokens.
const CURRENT_INFO_KEYWORDS: &[&str] = &[
    "current",
    "latest",
    "recent",
    "today",
    "now",
    "news",
    "price",
    "stock",
    "weather",
    "score",
    "update",
    "happening",
    "2024",
    "2025",
];

/// Which strategy produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Primary,
    Fallback,
}

/// Summary style requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryStyle {
    #[default]
    Brief,
    Detailed,
    BulletPoints,
}

/// Result of a chat operation
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub response: String,
    pub source: Source,
    pub timestamp: DateTime<Utc>,
}

/// Result of a summarize operation
#[derive(Debug, Clone)]
pub struct Summary {
    pub summary: String,
    pub style: SummaryStyle,
    pub compression_ratio: f32,
    pub source: Source,
}

/// Result of an analyze operation
///
/// `structured` is populated only when the interpreter extracted a
/// schema-conformant payload; `raw_text` always carries the generator's
/// full output.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub structured: Option<Analysis>,
    pub raw_text: String,
    pub source: Source,
}

/// Result of a quiz generation operation
///
/// `raw` carries the primary provider's output when it could not be
/// interpreted and local generation was substituted.
#[derive(Debug, Clone)]
pub struct QuizGeneration {
    pub questions: Vec<GeneratedQuestion>,
    pub raw: Option<String>,
    pub source: Source,
}

/// Result of a web-augmented chat operation
#[derive(Debug, Clone)]
pub struct WebChatReply {
    pub response: String,
    pub urls_fetched: Vec<String>,
    pub source: Source,
    pub timestamp: DateTime<Utc>,
}

/// A completion with its recorded source
struct Completion {
    text: String,
    source: Source,
}

/// Strategy order for every operation: upstream first, local second
const STRATEGY_ORDER: &[Source] = &[Source::Primary, Source::Fallback];

struct ProviderState {
    config: ProviderConfig,
    remote: Option<RemoteProvider>,
}

/// The gateway itself
pub struct ProviderGateway {
    state: RwLock<ProviderState>,
    fallback: LocalFallback,
    quiz_config: QuizConfig,
    acquisition_config: AcquisitionConfig,
    pipeline: Arc<WebAcquisitionPipeline>,
    url_pattern: Regex,
}

impl ProviderGateway {
    pub fn new(
        provider_config: ProviderConfig,
        quiz_config: QuizConfig,
        acquisition_config: AcquisitionConfig,
        pipeline: Arc<WebAcquisitionPipeline>,
    ) -> Self {
        let remote = build_remote(&provider_config);
        Self {
            state: RwLock::new(ProviderState {
                config: provider_config,
                remote,
            }),
            fallback: LocalFallback::new(),
            quiz_config,
            acquisition_config,
            pipeline,
            url_pattern: Regex::new(r"https?://[^\s]+").expect("static pattern"),
        }
    }

    /// Whether a valid upstream provider is configured
    pub async fn is_configured(&self) -> bool {
        self.state.read().await.remote.is_some()
    }

    /// Replace the provider configuration without restarting
    pub async fn reconfigure(&self, config: ProviderConfig) {
        let remote = build_remote(&config);
        let mut state = self.state.write().await;
        info!(
            "Provider reconfigured: model={}, configured={}",
            config.model,
            remote.is_some()
        );
        *state = ProviderState { config, remote };
    }

    /// Free-form chat
    pub async fn chat(&self, message: &str, context: Option<&str>) -> Result<ChatReply> {
        require_non_empty(message, "message")?;

        let prompt = chat_prompt(message, context);
        let completion = self
            .complete_with_fallback(&prompt, || self.fallback.chat_reply(message))
            .await;

        Ok(ChatReply {
            response: completion.text,
            source: completion.source,
            timestamp: Utc::now(),
        })
    }

    /// Summarize text in the requested style
    pub async fn summarize(&self, text: &str, style: SummaryStyle) -> Result<Summary> {
        require_non_empty(text, "text")?;

        let style_instruction = match style {
            SummaryStyle::Brief => prompts::SUMMARIZE_BRIEF,
            SummaryStyle::Detailed => prompts::SUMMARIZE_DETAILED,
            SummaryStyle::BulletPoints => prompts::SUMMARIZE_BULLETS,
        };
        let prompt = prompts::SUMMARIZE_PROMPT
            .replace("{style_instruction}", style_instruction)
            .replace("{text}", text);

        let completion = self
            .complete_with_fallback(&prompt, || self.fallback.summary(text, style))
            .await;

        let compression_ratio = if text.is_empty() {
            0.0
        } else {
            completion.text.len() as f32 / text.len() as f32
        };

        Ok(Summary {
            summary: completion.text,
            style,
            compression_ratio,
            source: completion.source,
        })
    }

    /// Analyze text into a structured report
    pub async fn analyze(&self, text: &str) -> Result<AnalysisReport> {
        require_non_empty(text, "text")?;

        let prompt = prompts::ANALYZE_PROMPT.replace("{text}", text);
        let completion = self
            .complete_with_fallback(&prompt, || self.fallback.analysis_json(text))
            .await;

        let (structured, raw_text) = match interpret::parse_analysis(&completion.text) {
            AnalysisOutcome::Structured(analysis) => (Some(analysis), completion.text),
            AnalysisOutcome::Unstructured { raw } => (None, raw),
        };

        Ok(AnalysisReport {
            structured,
            raw_text,
            source: completion.source,
        })
    }

    /// Generate a quiz from text
    ///
    /// `count` is clamped to the configured range. When the primary
    /// provider's output cannot be interpreted into any valid question,
    /// local generation is substituted and the unusable primary output is
    /// kept in `raw`.
    pub async fn generate_quiz(
        &self,
        text: &str,
        count: Option<usize>,
        difficulty: Option<&str>,
    ) -> Result<QuizGeneration> {
        require_non_empty(text, "text")?;

        let count = count
            .unwrap_or(5)
            .clamp(self.quiz_config.min_questions, self.quiz_config.max_questions);

        let difficulty_line = difficulty
            .map(|d| prompts::QUIZ_DIFFICULTY_LINE.replace("{difficulty}", d))
            .unwrap_or_default();
        let prompt = prompts::QUIZ_PROMPT
            .replace("{count}", &count.to_string())
            .replace("{difficulty_line}", &difficulty_line)
            .replace("{text}", text);

        if let Some(text_from_primary) = self.try_primary(&prompt).await {
            let batch = interpret::parse_quiz_batch(&text_from_primary);
            if !batch.questions.is_empty() {
                let mut questions = batch.questions;
                questions.truncate(count);
                return Ok(QuizGeneration {
                    questions,
                    raw: None,
                    source: Source::Primary,
                });
            }
            warn!("Primary quiz output had no usable questions, substituting local generation");
            let local = interpret::parse_quiz_batch(&self.fallback.quiz_json(text, count));
            return Ok(QuizGeneration {
                questions: local.questions,
                raw: batch.raw,
                source: Source::Fallback,
            });
        }

        let local = interpret::parse_quiz_batch(&self.fallback.quiz_json(text, count));
        Ok(QuizGeneration {
            questions: local.questions,
            raw: None,
            source: Source::Fallback,
        })
    }

    /// Chat with web content assembled into the prompt context
    ///
    /// Explicit URLs are fetched in parallel, capped at the configured
    /// fan-out. Without explicit URLs, the needs-current-info classifier
    /// decides whether to fetch a URL embedded in the message; when current
    /// information is wanted but nothing could be obtained, a disclaimer is
    /// appended to the context instead.
    pub async fn chat_with_web_context(
        &self,
        message: &str,
        context: Option<&str>,
        urls: &[String],
    ) -> Result<WebChatReply> {
        require_non_empty(message, "message")?;

        let mut urls_fetched: Vec<String> = Vec::new();
        let mut sections: Vec<String> = Vec::new();
        let mut web_wanted = false;

        if !urls.is_empty() {
            web_wanted = true;
            let capped: Vec<&String> = urls
                .iter()
                .take(self.acquisition_config.max_urls_per_chat)
                .collect();
            debug!(
                "Fetching {} of {} supplied URLs",
                capped.len(),
                urls.len()
            );

            let fetches = capped.iter().map(|url| self.pipeline.fetch(url));
            for content in join_all(fetches).await {
                urls_fetched.push(content.url.clone());
                if content.success {
                    sections.push(format!(
                        "[{}] {}\n{}",
                        content.url, content.title, content.text
                    ));
                }
            }
        } else if self.needs_current_info(message) {
            web_wanted = true;
            if let Some(url) = self.url_pattern.find(message).map(|m| m.as_str()) {
                let url = url.trim_end_matches([')', '.', ',']);
                debug!("Fetching URL detected in message: {url}");
                let content = self.pipeline.fetch(url).await;
                urls_fetched.push(content.url.clone());
                if content.success {
                    sections.push(format!(
                        "[{}] {}\n{}",
                        content.url, content.title, content.text
                    ));
                }
            } else {
                // Best-effort web search is a stub; the disclaimer below
                // covers the empty result.
                debug!("Message wants current info but carries no URL; skipping search");
            }
        }

        let mut combined_context = context.unwrap_or_default().to_string();
        if !sections.is_empty() {
            combined_context.push_str(prompts::WEB_CONTEXT_HEADER);
            combined_context.push_str(&sections.join("\n\n"));
        } else if web_wanted {
            combined_context.push_str(prompts::WEB_CONTEXT_DISCLAIMER);
        }

        let context_arg = (!combined_context.is_empty()).then_some(combined_context.as_str());
        let prompt = chat_prompt(message, context_arg);
        let completion = self
            .complete_with_fallback(&prompt, || self.fallback.chat_reply(message))
            .await;

        Ok(WebChatReply {
            response: completion.text,
            urls_fetched,
            source: completion.source,
            timestamp: Utc::now(),
        })
    }

    /// Deterministic classifier for "this message needs current web
    /// information"
    pub fn needs_current_info(&self, message: &str) -> bool {
        if self.url_pattern.is_match(message) {
            return true;
        }
        message
            .split_whitespace()
            .map(|token| {
                token
                    .chars()
                    .filter(|c| c.is_alphanumeric())
                    .collect::<String>()
                    .to_lowercase()
            })
            .any(|token| CURRENT_INFO_KEYWORDS.contains(&token.as_str()))
    }

    /// Evaluate the strategy order, recording which one produced the result
    async fn complete_with_fallback<F>(&self, prompt: &str, local: F) -> Completion
    where
        F: FnOnce() -> String,
    {
        for source in STRATEGY_ORDER.iter().copied() {
            match source {
                Source::Primary => {
                    if let Some(text) = self.try_primary(prompt).await {
                        return Completion {
                            text,
                            source: Source::Primary,
                        };
                    }
                }
                Source::Fallback => {
                    return Completion {
                        text: local(),
                        source: Source::Fallback,
                    };
                }
            }
        }
        unreachable!("strategy order always ends with the local fallback")
    }

    /// One upstream attempt; None covers unconfigured, transport failure,
    /// and empty output alike
    async fn try_primary(&self, prompt: &str) -> Option<String> {
        let state = self.state.read().await;
        let remote = state.remote.as_ref()?;

        match remote.complete(prompt).await {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => {
                warn!("Upstream returned empty output, falling back");
                None
            }
            Err(e) => {
                warn!("Upstream failed: {e}, falling back");
                None
            }
        }
    }
}

fn build_remote(config: &ProviderConfig) -> Option<RemoteProvider> {
    match RemoteProvider::new(config) {
        Ok(remote) => Some(remote),
        Err(e) => {
            info!("Upstream provider unavailable ({e}); local fallback will serve all operations");
            None
        }
    }
}

fn chat_prompt(message: &str, context: Option<&str>) -> String {
    let context_block = context
        .map(|c| format!("Context: {c}\n\n"))
        .unwrap_or_default();
    prompts::CHAT_PROMPT
        .replace("{context}", &context_block)
        .replace("{message}", message)
}

fn require_non_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StudygateError::InvalidInput(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}
