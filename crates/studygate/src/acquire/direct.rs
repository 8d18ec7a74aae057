//! Direct fetch-and-extract strategy
//!
//! Fetches a page over plain HTTP with a browser-like client identity and
//! extracts readable text. Static fetching cannot render JavaScript-heavy
//! pages; when it fails or yields too little content the pipeline falls
//! back to the brokered strategy.

use regex::Regex;
use std::time::Duration;

use crate::config::AcquisitionConfig;
use crate::error::{Result, StudygateError};

use super::WebContent;

/// Client identity sent with direct fetches. Some origins serve empty
/// shells to unknown agents.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Fetches a URL directly and extracts its main text content
#[derive(Debug)]
pub struct DirectFetcher {
    client: reqwest::Client,
    config: AcquisitionConfig,
    extractor: TextExtractor,
}

impl DirectFetcher {
    pub fn new(config: AcquisitionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.direct_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| StudygateError::Acquisition(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            extractor: TextExtractor::new(),
        })
    }

    /// Fetch and extract a page
    ///
    /// Errors on network failure, non-success status, or when extraction
    /// yields less than the configured minimum content length; the caller
    /// decides whether to try the brokered strategy.
    pub async fn fetch(&self, url: &str) -> Result<WebContent> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                StudygateError::Acquisition(format!("Direct fetch timed out: {e}"))
            } else {
                StudygateError::Acquisition(format!("Direct fetch failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StudygateError::Acquisition(format!(
                "Direct fetch returned {status}"
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| StudygateError::Acquisition(format!("Failed to read body: {e}")))?;

        let title = self.extractor.title(&html);
        let text = self.extractor.extract(&html, self.config.max_content_len);

        if text.len() < self.config.min_content_len {
            return Err(StudygateError::Acquisition(format!(
                "Extracted only {} characters (minimum {})",
                text.len(),
                self.config.min_content_len
            )));
        }

        tracing::debug!("Direct fetch of {url} extracted {} characters", text.len());
        Ok(WebContent::direct(url.to_string(), title, text))
    }
}

/// HTML-to-text extraction with a main-content heuristic
#[derive(Debug)]
struct TextExtractor {
    noise: Vec<Regex>,
    content_regions: Vec<Regex>,
    body: Regex,
    title: Regex,
    tag: Regex,
    whitespace: Regex,
}

impl TextExtractor {
    fn new() -> Self {
        // The regex crate has no backreferences, so paired tags get one
        // pattern each.
        let noise = [
            r"(?is)<script[^>]*>.*?</script>",
            r"(?is)<style[^>]*>.*?</style>",
            r"(?s)<!--.*?-->",
            r"(?is)<nav[^>]*>.*?</nav>",
            r"(?is)<header[^>]*>.*?</header>",
            r"(?is)<footer[^>]*>.*?</footer>",
            r"(?is)<aside[^>]*>.*?</aside>",
            r"(?is)<noscript[^>]*>.*?</noscript>",
            r"(?is)<form[^>]*>.*?</form>",
            r"(?is)<iframe[^>]*>.*?</iframe>",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("static pattern"))
        .collect();

        // Likely main-content regions, most specific first.
        let content_regions = [
            r"(?is)<article[^>]*>(.*?)</article>",
            r"(?is)<main[^>]*>(.*?)</main>",
            r#"(?is)<div[^>]*role="main"[^>]*>(.*?)</div>"#,
            r#"(?is)<div[^>]*(?:id|class)="[^"]*(?:content|article|post|entry)[^"]*"[^>]*>(.*?)</div>"#,
        ]
        .iter()
        .map(|p| Regex::new(p).expect("static pattern"))
        .collect();

        Self {
            noise,
            content_regions,
            body: Regex::new(r"(?is)<body[^>]*>(.*)</body>").expect("static pattern"),
            title: Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("static pattern"),
            tag: Regex::new(r"<[^>]+>").expect("static pattern"),
            whitespace: Regex::new(r"\s+").expect("static pattern"),
        }
    }

    fn title(&self, html: &str) -> String {
        self.title
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| self.flatten(m.as_str()))
            .unwrap_or_default()
    }

    /// Extract readable text, bounded to `max_len` characters
    fn extract(&self, html: &str, max_len: usize) -> String {
        let mut cleaned = html.to_string();
        for pattern in &self.noise {
            cleaned = pattern.replace_all(&cleaned, " ").into_owned();
        }

        // Try likely main-content regions before falling back to the body.
        for region in &self.content_regions {
            if let Some(captures) = region.captures(&cleaned) {
                if let Some(inner) = captures.get(1) {
                    let text = self.flatten(inner.as_str());
                    if text.len() >= 200 {
                        return truncate_chars(&text, max_len);
                    }
                }
            }
        }

        let scope = self
            .body
            .captures(&cleaned)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or(cleaned);

        truncate_chars(&self.flatten(&scope), max_len)
    }

    /// Strip tags, decode common entities, normalize whitespace
    fn flatten(&self, html: &str) -> String {
        let stripped = self.tag.replace_all(html, " ");
        let decoded = stripped
            .replace("&nbsp;", " ")
            .replace("&amp;", "&")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'");
        self.whitespace.replace_all(&decoded, " ").trim().to_string()
    }
}

/// Truncate on a char boundary
fn truncate_chars(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    text.chars().take(max_len).collect()
}
