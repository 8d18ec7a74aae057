//! Web content acquisition pipeline
//!
//! Resolves the text content of an arbitrary URL with two strategies: a
//! synchronous direct fetch-and-extract, then a brokered fetch delegated to
//! the companion browser-extension process. `fetch` always resolves within
//! the sum of both timeouts and never returns an error; failures become a
//! `WebContent` with `success: false`.

mod bridge;
mod direct;
mod registry;

pub use bridge::{ExtensionBridge, FetchCommand};
pub use direct::DirectFetcher;
pub use registry::{AcquisitionWaiter, CorrelationRegistry};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::AcquisitionConfig;
use crate::error::Result;

/// Which strategy produced a piece of web content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcquisitionMethod {
    Direct,
    Brokered,
    Failed,
}

/// Extracted content of a URL, immutable once returned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebContent {
    pub url: String,
    pub title: String,
    pub text: String,
    pub word_count: usize,
    pub method: AcquisitionMethod,
    pub success: bool,
    pub fetched_at: DateTime<Utc>,
}

impl WebContent {
    pub fn direct(url: String, title: String, text: String) -> Self {
        Self::succeeded(url, title, text, AcquisitionMethod::Direct)
    }

    pub fn brokered(url: String, title: String, text: String) -> Self {
        Self::succeeded(url, title, text, AcquisitionMethod::Brokered)
    }

    fn succeeded(url: String, title: String, text: String, method: AcquisitionMethod) -> Self {
        let word_count = text.split_whitespace().count();
        Self {
            url,
            title,
            text,
            word_count,
            method,
            success: true,
            fetched_at: Utc::now(),
        }
    }

    /// A failure result carrying a human-readable explanation
    pub fn failure(url: String, reason: String) -> Self {
        Self {
            url,
            title: String::new(),
            text: reason,
            word_count: 0,
            method: AcquisitionMethod::Failed,
            success: false,
            fetched_at: Utc::now(),
        }
    }
}

/// Two-tier URL content resolver
pub struct WebAcquisitionPipeline {
    direct: DirectFetcher,
    registry: Arc<CorrelationRegistry>,
    bridge: Arc<ExtensionBridge>,
    config: AcquisitionConfig,
}

impl WebAcquisitionPipeline {
    pub fn new(
        config: AcquisitionConfig,
        registry: Arc<CorrelationRegistry>,
        bridge: Arc<ExtensionBridge>,
    ) -> Result<Self> {
        let direct = DirectFetcher::new(config.clone())?;
        Ok(Self {
            direct,
            registry,
            bridge,
            config,
        })
    }

    /// Resolve the text content of a URL, never failing
    pub async fn fetch(&self, url: &str) -> WebContent {
        if Url::parse(url).is_err() {
            return WebContent::failure(url.to_string(), format!("Invalid URL: {url}"));
        }

        match self.direct.fetch(url).await {
            Ok(content) => {
                tracing::debug!("Direct fetch succeeded for {url}");
                content
            }
            Err(e) => {
                tracing::debug!("Direct fetch failed for {url}: {e}, trying brokered");
                self.brokered(url).await
            }
        }
    }

    /// Delegate a fetch to the companion extension process
    ///
    /// Degrades immediately when no companion has ever registered; waiting
    /// out the full brokered timeout would gain nothing.
    pub async fn brokered(&self, url: &str) -> WebContent {
        self.brokered_tracked(url).await.1
    }

    /// Brokered fetch that also reports the correlation id it registered,
    /// if any
    pub async fn brokered_tracked(&self, url: &str) -> (Option<String>, WebContent) {
        if !self.bridge.is_connected() {
            return (
                None,
                WebContent::failure(
                    url.to_string(),
                    "Direct fetch failed and no browser extension is connected. \
                     Install and register the companion extension for brokered fetching."
                        .to_string(),
                ),
            );
        }

        let deadline = Duration::from_secs(self.config.brokered_timeout_secs);
        let (request_id, waiter) = self.registry.register(deadline);
        self.bridge.enqueue(FetchCommand {
            request_id: request_id.clone(),
            url: url.to_string(),
        });

        let content = match waiter.wait().await {
            Some(content) => content,
            None => {
                tracing::warn!("Brokered fetch {request_id} for {url} timed out");
                WebContent::failure(
                    url.to_string(),
                    format!(
                        "Both fetch strategies failed: direct extraction unsuccessful and \
                         the browser extension did not respond within {}s",
                        self.config.brokered_timeout_secs
                    ),
                )
            }
        };

        (Some(request_id), content)
    }

    pub fn registry(&self) -> &Arc<CorrelationRegistry> {
        &self.registry
    }

    pub fn bridge(&self) -> &Arc<ExtensionBridge> {
        &self.bridge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline_with(config: AcquisitionConfig) -> WebAcquisitionPipeline {
        WebAcquisitionPipeline::new(
            config,
            Arc::new(CorrelationRegistry::new()),
            Arc::new(ExtensionBridge::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_web_content_word_count() {
        let content = WebContent::direct(
            "https://example.com".to_string(),
            "Title".to_string(),
            "one two three four".to_string(),
        );
        assert_eq!(content.word_count, 4);
        assert!(content.success);
        assert_eq!(content.method, AcquisitionMethod::Direct);
    }

    #[test]
    fn test_web_content_failure_shape() {
        let content =
            WebContent::failure("https://example.com".to_string(), "no luck".to_string());
        assert!(!content.success);
        assert_eq!(content.method, AcquisitionMethod::Failed);
        assert_eq!(content.text, "no luck");
        assert_eq!(content.word_count, 0);
    }

    #[tokio::test]
    async fn test_fetch_invalid_url_resolves_failure() {
        let pipeline = pipeline_with(AcquisitionConfig::default());
        let content = pipeline.fetch("not a url").await;
        assert!(!content.success);
        assert_eq!(content.method, AcquisitionMethod::Failed);
    }

    #[tokio::test]
    async fn test_brokered_without_companion_degrades_immediately() {
        let pipeline = pipeline_with(AcquisitionConfig::default());
        let content = pipeline.brokered("https://example.com").await;
        assert!(!content.success);
        assert!(content.text.contains("no browser extension"));
        assert_eq!(pipeline.registry().pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_brokered_with_silent_companion_times_out() {
        let pipeline = pipeline_with(AcquisitionConfig::default());
        pipeline.bridge().mark_alive();

        let content = pipeline.brokered("https://example.com").await;

        assert!(!content.success);
        assert!(content.text.contains("did not respond"));
        assert_eq!(pipeline.registry().pending_count(), 0);
    }

    #[tokio::test]
    async fn test_brokered_delivery_roundtrip() {
        let pipeline = Arc::new(pipeline_with(AcquisitionConfig::default()));
        pipeline.bridge().mark_alive();

        let fetcher = {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move { pipeline.brokered("https://example.com/page").await })
        };

        // Wait until the command is queued, then deliver like the
        // companion would.
        let command = loop {
            let mut drained = pipeline.bridge().drain();
            if let Some(command) = drained.pop() {
                break command;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        };

        assert!(pipeline.registry().resolve(
            &command.request_id,
            WebContent::brokered(
                command.url.clone(),
                "Delivered".to_string(),
                "Rendered page text".to_string(),
            ),
        ));

        let content = fetcher.await.unwrap();
        assert!(content.success);
        assert_eq!(content.method, AcquisitionMethod::Brokered);
        assert_eq!(content.title, "Delivered");
    }
}
