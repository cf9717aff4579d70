use thiserror::Error;

/// Recoverable failures surfaced to the user by the form client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Location missing")]
    LocationMissing,

    #[error("Invalid {field} '{value}'")]
    InvalidCoordinate { field: &'static str, value: String },

    #[error("Weather lookup failed: {0}")]
    WeatherLookup(String),

    #[error("AI request failed")]
    PredictionFailed { status: Option<u16> },

    #[error("Invalid AI response")]
    InvalidResponse,

    #[error("Failed to reach AI API: {0}")]
    Http(#[from] reqwest::Error),
}
