//! Integration tests for the provider gateway
//!
//! Covers the primary/fallback strategy chain end to end against a mock
//! upstream, interpretation of structured payloads embedded in prose, and
//! the web-augmented chat fan-out cap.

use std::env;
use std::sync::Arc;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use studygate::acquire::{CorrelationRegistry, ExtensionBridge, WebAcquisitionPipeline};
use studygate::config::{AcquisitionConfig, ProviderConfig, QuizConfig};
use studygate::gateway::{ProviderGateway, Source, SummaryStyle};

// =============================================================================
// Test Fixtures
// =============================================================================

fn build_gateway(provider: ProviderConfig) -> ProviderGateway {
    let acquisition = AcquisitionConfig::default();
    let pipeline = Arc::new(
        WebAcquisitionPipeline::new(
            acquisition.clone(),
            Arc::new(CorrelationRegistry::new()),
            Arc::new(ExtensionBridge::new()),
        )
        .unwrap(),
    );
    ProviderGateway::new(provider, QuizConfig::default(), acquisition, pipeline)
}

fn provider_config(api_url: String, key_env: &str) -> ProviderConfig {
    unsafe { env::set_var(key_env, "test-key") };
    ProviderConfig {
        api_url,
        api_key_env: key_env.to_string(),
        model: "gpt-4o-mini".to_string(),
        temperature: 0.7,
        max_tokens: 2048,
        timeout_secs: 30,
    }
}

fn completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{
            "message": { "content": content }
        }]
    })
}

async fn mock_completion(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(content)))
        .mount(server)
        .await;
}

const STUDY_TEXT: &str =
    "Photosynthesis converts light energy into chemical energy in plants. \
     Chlorophyll absorbs light in the chloroplasts of the cell. \
     Water molecules are split to release oxygen as a byproduct. \
     Carbon dioxide is fixed into glucose during the Calvin cycle. \
     The light reactions produce ATP and NADPH for the dark reactions.";

// =============================================================================
// Primary path
// =============================================================================

#[tokio::test]
async fn test_chat_uses_primary_when_configured() {
    let server = MockServer::start().await;
    mock_completion(&server, "Mitosis is how somatic cells divide.").await;

    let gateway = build_gateway(provider_config(server.uri(), "GW_TEST_KEY_CHAT"));
    assert!(gateway.is_configured().await);

    let reply = gateway.chat("What is mitosis?", None).await.unwrap();

    assert_eq!(reply.source, Source::Primary);
    assert!(reply.response.contains("Mitosis"));
}

#[tokio::test]
async fn test_analyze_extracts_json_from_prose() {
    let server = MockServer::start().await;
    let wrapped = "Here is the analysis you asked for:\n\
        {\"difficulty\": \"intermediate\", \
         \"keyTopics\": [{\"topic\": \"photosynthesis\", \"importance\": 0.9}], \
         \"concepts\": [{\"name\": \"chlorophyll\", \
                         \"definition\": \"the green pigment\", \
                         \"importance\": 0.8}], \
         \"wordCount\": 52, \"readingTimeMinutes\": 1}\n\
        Let me know if you need more.";
    mock_completion(&server, wrapped).await;

    let gateway = build_gateway(provider_config(server.uri(), "GW_TEST_KEY_ANALYZE"));
    let report = gateway.analyze(STUDY_TEXT).await.unwrap();

    assert_eq!(report.source, Source::Primary);
    let analysis = report.structured.expect("payload should parse");
    assert_eq!(analysis.key_topics[0].topic, "photosynthesis");
    assert_eq!(analysis.word_count, 52);
}

#[tokio::test]
async fn test_analyze_degrades_to_raw_on_malformed_payload() {
    let server = MockServer::start().await;
    mock_completion(&server, "The text is { moderately complex } overall.").await;

    let gateway = build_gateway(provider_config(server.uri(), "GW_TEST_KEY_RAW"));
    let report = gateway.analyze(STUDY_TEXT).await.unwrap();

    assert_eq!(report.source, Source::Primary);
    assert!(report.structured.is_none());
    assert!(report.raw_text.contains("moderately complex"));
}

#[tokio::test]
async fn test_generate_quiz_primary_array() {
    let server = MockServer::start().await;
    let payload = "Sure, here are the questions:\n\
        [{\"question\": \"What splits water during photosynthesis?\", \
          \"options\": [\"Light reactions\", \"Calvin cycle\", \"Mitochondria\", \"Ribosomes\"], \
          \"correctIndex\": 0, \
          \"explanation\": \"Photolysis happens in the light reactions.\"}]";
    mock_completion(&server, payload).await;

    let gateway = build_gateway(provider_config(server.uri(), "GW_TEST_KEY_QUIZ"));
    let generation = gateway
        .generate_quiz(STUDY_TEXT, Some(3), Some("hard"))
        .await
        .unwrap();

    assert_eq!(generation.source, Source::Primary);
    assert_eq!(generation.questions.len(), 1);
    assert_eq!(generation.questions[0].correct_index, 0);
    assert!(generation.raw.is_none());
}

// =============================================================================
// Fallback path
// =============================================================================

#[tokio::test]
async fn test_chat_falls_back_on_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let gateway = build_gateway(provider_config(server.uri(), "GW_TEST_KEY_500"));
    let reply = gateway.chat("What is osmosis?", None).await.unwrap();

    assert_eq!(reply.source, Source::Fallback);
    assert!(!reply.response.is_empty());
}

#[tokio::test]
async fn test_quiz_substitutes_local_and_keeps_raw() {
    let server = MockServer::start().await;
    mock_completion(&server, "I cannot generate questions right now, sorry.").await;

    let gateway = build_gateway(provider_config(server.uri(), "GW_TEST_KEY_NOQUIZ"));
    let generation = gateway.generate_quiz(STUDY_TEXT, Some(2), None).await.unwrap();

    assert_eq!(generation.source, Source::Fallback);
    assert!(!generation.questions.is_empty());
    // The unusable primary output is preserved for debugging.
    let raw = generation.raw.expect("raw primary output kept");
    assert!(raw.contains("cannot generate"));
}

#[tokio::test]
async fn test_summarize_fallback_styles_differ() {
    let gateway = build_gateway(ProviderConfig::default());

    let brief = gateway
        .summarize(STUDY_TEXT, SummaryStyle::Brief)
        .await
        .unwrap();
    let bullets = gateway
        .summarize(STUDY_TEXT, SummaryStyle::BulletPoints)
        .await
        .unwrap();

    assert_eq!(brief.source, Source::Fallback);
    assert!(bullets.summary.contains("- "));
    assert_ne!(brief.summary, bullets.summary);
}

#[tokio::test]
async fn test_fallback_analysis_always_structured() {
    let gateway = build_gateway(ProviderConfig::default());
    let report = gateway.analyze(STUDY_TEXT).await.unwrap();

    assert_eq!(report.source, Source::Fallback);
    assert!(report.structured.is_some());
}

// =============================================================================
// Web-augmented chat
// =============================================================================

fn page_html(marker: &str) -> String {
    format!(
        "<html><head><title>Cell Biology {marker}</title></head><body><article>\
         Photosynthesis is the process by which green plants convert light \
         energy into chemical energy stored in glucose. The reactions occur \
         in chloroplasts, organelles containing the pigment chlorophyll. \
         Light-dependent reactions split water and release oxygen, while \
         the Calvin cycle fixes carbon dioxide into sugars usable by the \
         cell for growth and energy storage over time.\
         </article></body></html>"
    )
}

#[tokio::test]
async fn test_chat_web_caps_url_fanout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page_html("fanout")))
        .mount(&server)
        .await;

    let gateway = build_gateway(ProviderConfig::default());
    let urls: Vec<String> = (0..5).map(|i| format!("{}/page{i}", server.uri())).collect();

    let reply = gateway
        .chat_with_web_context("Summarize these pages", None, &urls)
        .await
        .unwrap();

    // Five URLs supplied, only the configured cap of three fetched.
    assert_eq!(reply.urls_fetched.len(), 3);
    assert_eq!(reply.source, Source::Fallback);
    assert!(!reply.response.is_empty());
}

#[tokio::test]
async fn test_chat_web_detects_url_in_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page_html("detected")))
        .mount(&server)
        .await;

    let gateway = build_gateway(ProviderConfig::default());
    let message = format!("What does {}/article say about chloroplasts?", server.uri());

    let reply = gateway
        .chat_with_web_context(&message, None, &[])
        .await
        .unwrap();

    assert_eq!(reply.urls_fetched.len(), 1);
    assert!(reply.urls_fetched[0].ends_with("/article"));
}

#[tokio::test]
async fn test_chat_web_without_current_info_skips_fetch() {
    let gateway = build_gateway(ProviderConfig::default());

    let reply = gateway
        .chat_with_web_context("Explain the Krebs cycle", None, &[])
        .await
        .unwrap();

    assert!(reply.urls_fetched.is_empty());
    assert!(!reply.response.is_empty());
}
