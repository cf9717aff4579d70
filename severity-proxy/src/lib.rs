//! Inference proxy for accident severity predictions.
//!
//! Exposes `POST /api/message`, which forwards the caller's feature payload to the
//! configured scoring endpoint with the bearer key and deployment header attached.
//! The key never leaves this process.

pub mod config;
pub mod error;

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::header::{AUTHORIZATION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::de::IgnoredAny;
use tower_http::trace::TraceLayer;

pub use config::{ConfigError, ProxyConfig};
pub use error::ProxyError;

/// Header the scoring endpoint uses to route to a model deployment.
pub const DEPLOYMENT_HEADER: &str = "azureml-model-deployment";

#[derive(Clone)]
pub struct AppState {
    config: Arc<ProxyConfig>,
    http: reqwest::Client,
}

impl AppState {
    pub fn new(config: ProxyConfig) -> Self {
        Self { config: Arc::new(config), http: reqwest::Client::new() }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/message", post(message))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn message(State(state): State<AppState>, body: Bytes) -> Result<Response, ProxyError> {
    tracing::info!("message function called");

    // Validated only; the caller's bytes go upstream untouched so key order survives.
    serde_json::from_slice::<IgnoredAny>(&body).map_err(ProxyError::InvalidBody)?;

    // The timer is dropped on every path out of this await, including when it fires.
    let prediction = tokio::time::timeout(state.config.timeout, forward(&state, body))
        .await
        .map_err(|_| ProxyError::Timeout)??;

    Ok(([(CONTENT_TYPE, "application/json")], prediction).into_response())
}

async fn forward(state: &AppState, body: Bytes) -> Result<Bytes, ProxyError> {
    let cfg = &state.config;

    let res = state
        .http
        .post(&cfg.endpoint)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {}", cfg.api_key()))
        .header(DEPLOYMENT_HEADER, cfg.deployment.as_str())
        .body(body)
        .send()
        .await?;

    let status = res.status();
    if !status.is_success() {
        match res.text().await {
            Ok(text) => tracing::error!(%status, body = %text, "Azure ML error"),
            Err(err) => {
                tracing::error!(%status, error = %err, "Azure ML error; failed to read error body")
            }
        }
        return Err(ProxyError::Upstream { status: status.as_u16() });
    }

    let bytes = res.bytes().await?;
    serde_json::from_slice::<IgnoredAny>(&bytes).map_err(ProxyError::InvalidUpstreamBody)?;
    Ok(bytes)
}
