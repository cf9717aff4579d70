//! Core library for the accident severity form client.
//!
//! This crate defines:
//! - The form state and the session update function
//! - Weather auto-fill against Open-Meteo, with unit conversions
//! - The feature payload expected by the inference model
//! - A client for the inference proxy and severity rendering
//!
//! It is used by `severity-cli`, but can also be reused by other front ends.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod payload;
pub mod provider;
pub mod render;
pub mod session;
pub mod weather;

pub use client::{InferenceClient, Predictor};
pub use config::Config;
pub use error::ClientError;
pub use model::{Coordinates, FormState, FormUpdate, RoadFeature, WeatherRequest};
pub use payload::{FeatureRecord, ScoringRequest, build_payload};
pub use provider::WeatherProvider;
pub use render::SeverityReport;
pub use session::{Event, Phase, Session};
pub use weather::{WeatherCondition, WeatherReading};
