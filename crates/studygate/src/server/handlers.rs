//! Request handlers and wire types
//!
//! Wire field names are camelCase to match the client application.

use axum::{
    Json,
    body::Body,
    extract::State,
    http::StatusCode,
    response::Response,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::acquire::{FetchCommand, WebContent};
use crate::config::ProviderConfig;
use crate::error::StudygateError;
use crate::gateway::SummaryStyle;
use crate::quiz::{Attempt, Quiz};

use super::{AppState, create_error_response};

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub text: String,
    #[serde(default)]
    pub document_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub text: String,
    #[serde(default, rename = "type")]
    pub style: Option<SummaryStyle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizRequest {
    pub text: String,
    #[serde(default)]
    pub question_count: Option<usize>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GradeRequest {
    pub quiz: Quiz,
    pub attempt: Attempt,
}

#[derive(Debug, Deserialize)]
pub struct WebContentRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatWebRequest {
    pub message: String,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentExtractedRequest {
    pub request_id: String,
    pub content: DeliveredContent,
}

/// Page content as delivered by the companion extension
#[derive(Debug, Deserialize)]
pub struct DeliveredContent {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequestsResponse {
    pub requests: Vec<FetchCommand>,
}

// =============================================================================
// Application handlers
// =============================================================================

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Response<Body> {
    match state
        .gateway
        .chat(&request.message, request.context.as_deref())
        .await
    {
        Ok(reply) => json_response(
            StatusCode::OK,
            serde_json::json!({
                "response": reply.response,
                "source": reply.source,
                "timestamp": reply.timestamp,
            }),
        ),
        Err(e) => gateway_error_response(e),
    }
}

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Response<Body> {
    let text_length = request.text.len();

    match state.gateway.analyze(&request.text).await {
        Ok(report) => {
            let analysis = match report.structured {
                Some(analysis) => {
                    let mut value =
                        serde_json::to_value(&analysis).unwrap_or(serde_json::Value::Null);
                    if let Some(object) = value.as_object_mut() {
                        object.insert("structured".to_string(), serde_json::json!(true));
                        object.insert("source".to_string(), serde_json::json!(report.source));
                    }
                    value
                }
                None => serde_json::json!({
                    "structured": false,
                    "raw": report.raw_text,
                    "source": report.source,
                }),
            };

            json_response(
                StatusCode::OK,
                serde_json::json!({
                    "analysis": analysis,
                    "documentId": request.document_id,
                    "processedAt": Utc::now(),
                    "textLength": text_length,
                }),
            )
        }
        Err(e) => gateway_error_response(e),
    }
}

pub async fn summarize(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SummarizeRequest>,
) -> Response<Body> {
    let style = request.style.unwrap_or_default();

    match state.gateway.summarize(&request.text, style).await {
        Ok(summary) => json_response(
            StatusCode::OK,
            serde_json::json!({
                "summary": summary.summary,
                "type": summary.style,
                "compressionRatio": summary.compression_ratio,
                "source": summary.source,
            }),
        ),
        Err(e) => gateway_error_response(e),
    }
}

pub async fn generate_quiz(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateQuizRequest>,
) -> Response<Body> {
    match state
        .gateway
        .generate_quiz(
            &request.text,
            request.question_count,
            request.difficulty.as_deref(),
        )
        .await
    {
        Ok(generation) => {
            let quiz = state.quiz_engine.quiz_from_generated(
                &generation.questions,
                state.quiz_config.default_passing_score,
            );
            let mut body = serde_json::json!({
                "questions": generation.questions,
                "quiz": quiz,
                "source": generation.source,
            });
            if let Some(raw) = generation.raw {
                body["raw"] = serde_json::json!(raw);
            }
            json_response(StatusCode::OK, body)
        }
        Err(e) => gateway_error_response(e),
    }
}

pub async fn grade(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GradeRequest>,
) -> Response<Body> {
    let report = state.quiz_engine.grade(&request.quiz, &request.attempt);
    json_response(
        StatusCode::OK,
        serde_json::to_value(&report).unwrap_or(serde_json::Value::Null),
    )
}

pub async fn web_content(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WebContentRequest>,
) -> Response<Body> {
    let content = state.pipeline.fetch(&request.url).await;

    // Wholly unavailable acquisition is the one absorbed failure that maps
    // to a non-2xx status, so callers can probe availability.
    let status = if content.success {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    json_response(status, serde_json::json!({ "content": content }))
}

pub async fn chat_web(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatWebRequest>,
) -> Response<Body> {
    match state
        .gateway
        .chat_with_web_context(&request.message, request.context.as_deref(), &request.urls)
        .await
    {
        Ok(reply) => json_response(
            StatusCode::OK,
            serde_json::json!({
                "response": reply.response,
                "urlsFetched": reply.urls_fetched,
                "source": reply.source,
                "timestamp": reply.timestamp,
            }),
        ),
        Err(e) => gateway_error_response(e),
    }
}

pub async fn reconfigure(
    State(state): State<Arc<AppState>>,
    Json(config): Json<ProviderConfig>,
) -> Response<Body> {
    state.gateway.reconfigure(config).await;
    let configured = state.gateway.is_configured().await;
    json_response(
        StatusCode::OK,
        serde_json::json!({
            "success": true,
            "configured": configured,
        }),
    )
}

// =============================================================================
// Companion extension bridge handlers
// =============================================================================

pub async fn health(State(state): State<Arc<AppState>>) -> Response<Body> {
    let bridge = state.pipeline.bridge();
    json_response(
        StatusCode::OK,
        serde_json::json!({
            "status": "ok",
            "extensionConnected": bridge.is_connected(),
            "lastPing": bridge.last_ping(),
            "pendingRequests": state.pipeline.registry().pending_count(),
        }),
    )
}

pub async fn register_extension(State(state): State<Arc<AppState>>) -> Response<Body> {
    state.pipeline.bridge().mark_alive();
    tracing::info!("Companion extension registered");
    json_response(StatusCode::OK, serde_json::json!({ "success": true }))
}

pub async fn pending_requests(State(state): State<Arc<AppState>>) -> Response<Body> {
    let requests = state.pipeline.bridge().drain();
    json_response(
        StatusCode::OK,
        serde_json::to_value(PendingRequestsResponse { requests })
            .unwrap_or(serde_json::Value::Null),
    )
}

pub async fn trigger_fetch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WebContentRequest>,
) -> Response<Body> {
    let (request_id, content) = state.pipeline.brokered_tracked(&request.url).await;
    json_response(
        StatusCode::OK,
        serde_json::json!({
            "success": content.success,
            "data": content,
            "requestId": request_id,
        }),
    )
}

pub async fn content_extracted(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ContentExtractedRequest>,
) -> Response<Body> {
    let delivered = request.content;
    let content = WebContent::brokered(delivered.url, delivered.title, delivered.text);
    let settled = state.pipeline.registry().resolve(&request.request_id, content);

    if !settled {
        tracing::debug!(
            "Delivery for {} arrived after settlement",
            request.request_id
        );
    }

    json_response(StatusCode::OK, serde_json::json!({ "success": settled }))
}

// =============================================================================
// Helpers
// =============================================================================

fn json_response(status: StatusCode, body: serde_json::Value) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|_| {
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Body::empty())
                .unwrap()
        })
}

fn gateway_error_response(error: StudygateError) -> Response<Body> {
    match error {
        StudygateError::InvalidInput(message) => {
            create_error_response(StatusCode::BAD_REQUEST, "invalid_input", &message)
        }
        other => {
            tracing::error!("Unexpected gateway error: {other}");
            create_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                &other.to_string(),
            )
        }
    }
}
