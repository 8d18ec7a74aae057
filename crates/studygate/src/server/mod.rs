//! HTTP surface for the gateway
//!
//! Exposes the application routes (chat, analyze, summarize, quiz
//! generation, web content, web-augmented chat, grading) and the companion
//! extension bridge routes (health, registration, command polling, fetch
//! triggering, content delivery). Input contract violations map to 400;
//! every other failure category is absorbed into a successful-shaped body
//! carrying a source/method discriminator.

mod handlers;

use axum::{
    Router,
    body::Body,
    http::StatusCode,
    response::Response,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

use crate::acquire::{CorrelationRegistry, ExtensionBridge, WebAcquisitionPipeline};
use crate::config::Config;
use crate::error::{Result, StudygateError};
use crate::gateway::ProviderGateway;
use crate::quiz::QuizAssessmentEngine;

/// Shared application state for all handlers
pub struct AppState {
    /// The gateway serving all generation operations
    pub gateway: ProviderGateway,
    /// Web acquisition pipeline (also reachable from the gateway)
    pub pipeline: Arc<WebAcquisitionPipeline>,
    /// Quiz grading engine
    pub quiz_engine: QuizAssessmentEngine,
    /// Quiz configuration (passing score defaults)
    pub quiz_config: crate::config::QuizConfig,
}

impl AppState {
    /// Build the full component graph from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = Arc::new(CorrelationRegistry::new());
        let bridge = Arc::new(ExtensionBridge::new());
        let pipeline = Arc::new(WebAcquisitionPipeline::new(
            config.acquisition.clone(),
            registry,
            bridge,
        )?);

        let gateway = ProviderGateway::new(
            config.provider.clone(),
            config.quiz.clone(),
            config.acquisition.clone(),
            Arc::clone(&pipeline),
        );

        Ok(Self {
            gateway,
            pipeline,
            quiz_engine: QuizAssessmentEngine::new(),
            quiz_config: config.quiz.clone(),
        })
    }
}

/// The gateway HTTP server
pub struct GatewayServer {
    config: Config,
}

impl GatewayServer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Start the server and listen for requests
    pub async fn serve(&self) -> Result<()> {
        let state = Arc::new(AppState::from_config(&self.config)?);
        let app = create_router(state);

        let addr: SocketAddr = self
            .config
            .server
            .listen_addr
            .parse()
            .map_err(|e| StudygateError::Config(format!("Invalid listen address: {e}")))?;

        tracing::info!("Starting gateway server on {addr}");

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| StudygateError::Server(format!("Failed to bind to {addr}: {e}")))?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| StudygateError::Server(format!("Server error: {e}")))?;

        tracing::info!("Gateway server shut down gracefully");
        Ok(())
    }
}

/// Create the router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Application routes
        .route("/chat", post(handlers::chat))
        .route("/analyze", post(handlers::analyze))
        .route("/summarize", post(handlers::summarize))
        .route("/generate-quiz", post(handlers::generate_quiz))
        .route("/grade", post(handlers::grade))
        .route("/web-content", post(handlers::web_content))
        .route("/chat-web", post(handlers::chat_web))
        .route("/reconfigure", post(handlers::reconfigure))
        // Companion extension bridge routes
        .route("/health", get(handlers::health))
        .route("/register-extension", post(handlers::register_extension))
        .route("/pending-requests", get(handlers::pending_requests))
        .route("/fetch", post(handlers::trigger_fetch))
        .route("/content-extracted", post(handlers::content_extracted))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create a JSON error response
pub(crate) fn create_error_response(
    status: StatusCode,
    error_type: &str,
    message: &str,
) -> Response<Body> {
    let body = serde_json::json!({
        "error": {
            "type": error_type,
            "message": message,
        }
    });

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

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
