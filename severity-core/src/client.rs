use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::{
    error::ClientError,
    model::{FormState, WeatherRequest},
    payload::ScoringRequest,
    provider::WeatherProvider,
    weather::WeatherReading,
};

/// Anything that can turn a feature payload into a severity.
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, payload: &ScoringRequest) -> Result<i64, ClientError>;
}

/// Talks to the inference proxy. One POST per call, never retried.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    url: String,
    http: Client,
}

impl InferenceClient {
    pub fn new(url: String) -> Self {
        Self { url, http: Client::new() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Predictor for InferenceClient {
    async fn predict(&self, payload: &ScoringRequest) -> Result<i64, ClientError> {
        tracing::debug!(url = %self.url, "submitting feature payload");

        let res = self.http.post(&self.url).json(payload).send().await?;

        let status = res.status();
        if !status.is_success() {
            tracing::warn!(%status, "prediction request rejected");
            return Err(ClientError::PredictionFailed { status: Some(status.as_u16()) });
        }

        let body: Value = res.json().await.map_err(|err| {
            tracing::warn!(error = %err, "prediction response is not JSON");
            ClientError::InvalidResponse
        })?;

        parse_prediction(&body)
    }
}

/// Extract the first prediction from a scoring response.
///
/// Accepts `{"predictions": [n, ...]}`, a bare `[n, ...]`, or either of those
/// encoded once more as a JSON string.
pub fn parse_prediction(body: &Value) -> Result<i64, ClientError> {
    let first = match body {
        Value::Object(map) => map.get("predictions").and_then(|p| p.get(0)),
        Value::Array(items) => items.first(),
        Value::String(inner) => {
            let decoded: Value =
                serde_json::from_str(inner).map_err(|_| ClientError::InvalidResponse)?;
            if decoded.is_string() {
                return Err(ClientError::InvalidResponse);
            }
            return parse_prediction(&decoded);
        }
        _ => None,
    };

    first.and_then(as_severity).ok_or(ClientError::InvalidResponse)
}

fn as_severity(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    value
        .as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| f as i64)
}

fn parse_coordinate(field: &'static str, text: &str) -> Result<f64, ClientError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ClientError::LocationMissing);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ClientError::InvalidCoordinate { field, value: text.to_string() })
}

/// Look up weather for the form's coordinates (and date/time when `use_form_time` is set).
///
/// The form itself is not touched; callers merge the reading on success.
pub async fn autofill_weather(
    provider: &dyn WeatherProvider,
    form: &FormState,
    use_form_time: bool,
) -> Result<WeatherReading, ClientError> {
    let request = WeatherRequest {
        latitude: parse_coordinate("latitude", &form.latitude)?,
        longitude: parse_coordinate("longitude", &form.longitude)?,
        when: if use_form_time { form.date_time } else { None },
    };

    provider.get_weather(&request).await.map_err(|err| {
        let detail = format!("{err:#}");
        tracing::warn!(error = %detail, "weather lookup failed");
        ClientError::WeatherLookup(detail)
    })
}
