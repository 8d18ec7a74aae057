use serde::Deserialize;

/// Main configuration structure for Studygate
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Upstream language-model provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Web content acquisition configuration
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
    /// Quiz generation and grading configuration
    #[serde(default)]
    pub quiz: QuizConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Upstream provider configuration
///
/// The API key itself never lives in the config file; `api_key_env` names
/// the environment variable it is read from.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// OpenAI-compatible API base URL (empty = unconfigured)
    #[serde(default)]
    pub api_url: String,
    /// Environment variable name for the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Model identifier for the upstream API
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Request timeout in seconds
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_provider_timeout_secs(),
        }
    }
}

fn default_api_key_env() -> String {
    "STUDYGATE_API_KEY".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_provider_timeout_secs() -> u64 {
    30
}

/// Web acquisition pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AcquisitionConfig {
    /// Timeout for the direct fetch strategy in seconds
    #[serde(default = "default_direct_timeout_secs")]
    pub direct_timeout_secs: u64,
    /// Timeout for the brokered (browser extension) strategy in seconds
    #[serde(default = "default_brokered_timeout_secs")]
    pub brokered_timeout_secs: u64,
    /// Maximum URLs fetched per web-augmented chat call
    #[serde(default = "default_max_urls_per_chat")]
    pub max_urls_per_chat: usize,
    /// Minimum extracted length for a direct fetch to count as success
    #[serde(default = "default_min_content_len")]
    pub min_content_len: usize,
    /// Maximum length of extracted text, longer content is truncated
    #[serde(default = "default_max_content_len")]
    pub max_content_len: usize,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            direct_timeout_secs: default_direct_timeout_secs(),
            brokered_timeout_secs: default_brokered_timeout_secs(),
            max_urls_per_chat: default_max_urls_per_chat(),
            min_content_len: default_min_content_len(),
            max_content_len: default_max_content_len(),
        }
    }
}

fn default_direct_timeout_secs() -> u64 {
    10
}

fn default_brokered_timeout_secs() -> u64 {
    30
}

fn default_max_urls_per_chat() -> usize {
    3
}

fn default_min_content_len() -> usize {
    200
}

fn default_max_content_len() -> usize {
    5000
}

/// Quiz generation bounds and grading defaults
#[derive(Debug, Clone, Deserialize)]
pub struct QuizConfig {
    /// Minimum questions per generated quiz
    #[serde(default = "default_min_questions")]
    pub min_questions: usize,
    /// Maximum questions per generated quiz
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,
    /// Passing score percentage applied to generated quizzes
    #[serde(default = "default_passing_score")]
    pub default_passing_score: u32,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            min_questions: default_min_questions(),
            max_questions: default_max_questions(),
            default_passing_score: default_passing_score(),
        }
    }
}

fn default_min_questions() -> usize {
    1
}

fn default_max_questions() -> usize {
    20
}

fn default_passing_score() -> u32 {
    70
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "127.0.0.1:8787")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:8787".to_string()
}
