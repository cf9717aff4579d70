use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;

use crate::{WeatherReading, WeatherRequest};

use super::WeatherProvider;

pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

const VARIABLES: &str =
    "temperature_2m,relative_humidity_2m,visibility,wind_speed_10m,pressure_msl,weathercode";

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    base_url: String,
    http: Client,
}

impl Default for OpenMeteoProvider {
    fn default() -> Self {
        Self::new(DEFAULT_FORECAST_URL.to_string())
    }
}

impl OpenMeteoProvider {
    pub fn new(base_url: String) -> Self {
        Self { base_url, http: Client::new() }
    }

    async fn fetch(&self, query: &[(&str, String)], what: &str) -> Result<String> {
        tracing::debug!(url = %self.base_url, what, "requesting Open-Meteo forecast");

        let res = self
            .http
            .get(&self.base_url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to Open-Meteo ({what})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read Open-Meteo {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "Open-Meteo {what} request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        Ok(body)
    }

    async fn fetch_current(&self, request: &WeatherRequest) -> Result<WeatherReading> {
        let query = [
            ("latitude", request.latitude.to_string()),
            ("longitude", request.longitude.to_string()),
            ("current", VARIABLES.to_string()),
        ];

        let body = self.fetch(&query, "current").await?;
        parse_current(&body)
    }

    async fn fetch_hourly(
        &self,
        request: &WeatherRequest,
        when: NaiveDateTime,
    ) -> Result<WeatherReading> {
        let day = when.format("%Y-%m-%d").to_string();
        let query = [
            ("latitude", request.latitude.to_string()),
            ("longitude", request.longitude.to_string()),
            ("hourly", VARIABLES.to_string()),
            ("start_date", day.clone()),
            ("end_date", day),
            ("timezone", "auto".to_string()),
        ];

        let body = self.fetch(&query, "hourly").await?;
        parse_hourly(&body, when)
    }
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    visibility: f64,
    wind_speed_10m: f64,
    pressure_msl: f64,
    #[serde(alias = "weather_code")]
    weathercode: i64,
}

#[derive(Debug, Deserialize)]
struct OmCurrentResponse {
    current: OmCurrent,
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    relative_humidity_2m: Vec<Option<f64>>,
    visibility: Vec<Option<f64>>,
    wind_speed_10m: Vec<Option<f64>>,
    pressure_msl: Vec<Option<f64>>,
    #[serde(alias = "weather_code")]
    weathercode: Vec<Option<i64>>,
}

#[derive(Debug, Deserialize)]
struct OmHourlyResponse {
    hourly: OmHourly,
}

pub(crate) fn parse_current(body: &str) -> Result<WeatherReading> {
    let parsed: OmCurrentResponse =
        serde_json::from_str(body).context("Failed to parse Open-Meteo current JSON")?;
    let c = parsed.current;

    Ok(WeatherReading::from_metric(
        c.temperature_2m,
        c.relative_humidity_2m,
        c.visibility,
        c.wind_speed_10m,
        c.pressure_msl,
        c.weathercode,
    ))
}

/// Pick the hourly slot whose timestamp matches `when` truncated to the hour.
pub(crate) fn parse_hourly(body: &str, when: NaiveDateTime) -> Result<WeatherReading> {
    let parsed: OmHourlyResponse =
        serde_json::from_str(body).context("Failed to parse Open-Meteo hourly JSON")?;
    let h = parsed.hourly;

    let target = when.format("%Y-%m-%dT%H:00").to_string();
    let idx = h
        .time
        .iter()
        .position(|t| *t == target)
        .ok_or_else(|| anyhow!("Open-Meteo response contained no data for {target}"))?;

    let value = |series: &[Option<f64>], name: &str| {
        series
            .get(idx)
            .copied()
            .flatten()
            .ok_or_else(|| anyhow!("Open-Meteo hourly '{name}' has no value for {target}"))
    };

    let code = h
        .weathercode
        .get(idx)
        .copied()
        .flatten()
        .ok_or_else(|| anyhow!("Open-Meteo hourly 'weathercode' has no value for {target}"))?;

    Ok(WeatherReading::from_metric(
        value(&h.temperature_2m, "temperature_2m")?,
        value(&h.relative_humidity_2m, "relative_humidity_2m")?,
        value(&h.visibility, "visibility")?,
        value(&h.wind_speed_10m, "wind_speed_10m")?,
        value(&h.pressure_msl, "pressure_msl")?,
        code,
    ))
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn get_weather(&self, request: &WeatherRequest) -> Result<WeatherReading> {
        match request.when {
            None => self.fetch_current(request).await,
            Some(when) => self.fetch_hourly(request, when).await,
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::WeatherCondition;
    use approx::assert_abs_diff_eq;
    use axum::{
        Router,
        extract::{RawQuery, State},
        http::StatusCode,
        routing::get,
    };
    use chrono::NaiveDate;
    use std::{
        net::SocketAddr,
        sync::{Arc, Mutex},
    };

    const CURRENT: &str = r#"{
        "latitude": 52.52,
        "longitude": 13.41,
        "current": {
            "time": "2024-05-01T12:00",
            "interval": 900,
            "temperature_2m": 0.0,
            "relative_humidity_2m": 81,
            "visibility": 1609.0,
            "wind_speed_10m": 1.609,
            "pressure_msl": 1000.0,
            "weathercode": 45
        }
    }"#;

    const HOURLY: &str = r#"{
        "hourly": {
            "time": ["2024-05-01T00:00", "2024-05-01T01:00", "2024-05-01T02:00"],
            "temperature_2m": [10.0, 20.0, null],
            "relative_humidity_2m": [90, 70, 60],
            "visibility": [3218.0, 16090.0, 24000.0],
            "wind_speed_10m": [3.218, 0.0, 5.0],
            "pressure_msl": [1010.0, 1020.0, 1030.0],
            "weathercode": [61, 2, 0]
        }
    }"#;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn parses_current_block_and_converts_units() {
        let r = parse_current(CURRENT).unwrap();

        assert_abs_diff_eq!(r.temperature_f, 32.0);
        assert_abs_diff_eq!(r.humidity_pct, 81.0);
        assert_abs_diff_eq!(r.visibility_mi, 1.0);
        assert_abs_diff_eq!(r.wind_speed_mph, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.pressure_in, 29.53, epsilon = 0.01);
        assert_eq!(r.condition, WeatherCondition::Fog);
    }

    #[test]
    fn accepts_new_weather_code_field_name() {
        let body = CURRENT.replace("\"weathercode\"", "\"weather_code\"");
        let r = parse_current(&body).unwrap();

        assert_eq!(r.condition, WeatherCondition::Fog);
    }

    #[test]
    fn missing_current_block_is_an_error() {
        let err = parse_current(r#"{"error": true, "reason": "bad latitude"}"#).unwrap_err();
        assert!(err.to_string().contains("Failed to parse Open-Meteo current JSON"));
    }

    #[test]
    fn hourly_picks_slot_matching_target_hour() {
        let r = parse_hourly(HOURLY, at(1, 45)).unwrap();

        assert_abs_diff_eq!(r.temperature_f, 68.0);
        assert_abs_diff_eq!(r.visibility_mi, 10.0);
        assert_abs_diff_eq!(r.wind_speed_mph, 0.0);
        assert_eq!(r.condition, WeatherCondition::Cloudy);
    }

    #[test]
    fn hourly_without_matching_timestamp_is_an_error() {
        let late = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap().and_hms_opt(1, 0, 0).unwrap();
        let err = parse_hourly(HOURLY, late).unwrap_err();

        assert!(err.to_string().contains("no data for 2024-05-02T01:00"));
    }

    #[test]
    fn hourly_null_value_is_an_error() {
        let err = parse_hourly(HOURLY, at(2, 0)).unwrap_err();
        assert!(err.to_string().contains("temperature_2m"));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let cut = truncate_body(&long);

        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }

    type Queries = Arc<Mutex<Vec<String>>>;

    // Answers like the forecast API, picking the block the query asked for.
    async fn forecast(State(queries): State<Queries>, RawQuery(query): RawQuery) -> &'static str {
        let query = query.unwrap_or_default();
        let hourly = query.contains("hourly=");
        queries.lock().unwrap().push(query);
        if hourly { HOURLY } else { CURRENT }
    }

    async fn broken() -> (StatusCode, &'static str) {
        (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
    }

    async fn spawn_forecast() -> (SocketAddr, Queries) {
        let queries = Queries::default();
        let app = Router::new()
            .route("/v1/forecast", get(forecast))
            .route("/broken", get(broken))
            .with_state(queries.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, queries)
    }

    fn request(when: Option<NaiveDateTime>) -> WeatherRequest {
        WeatherRequest { latitude: 52.52, longitude: 13.41, when }
    }

    #[tokio::test]
    async fn without_time_asks_for_current_conditions() {
        let (addr, queries) = spawn_forecast().await;
        let provider = OpenMeteoProvider::new(format!("http://{addr}/v1/forecast"));

        let r = provider.get_weather(&request(None)).await.unwrap();

        assert_eq!(r.condition, WeatherCondition::Fog);
        let queries = queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert!(queries[0].contains("latitude=52.52"));
        assert!(queries[0].contains("longitude=13.41"));
        assert!(queries[0].contains("current="));
        assert!(!queries[0].contains("hourly="));
    }

    #[tokio::test]
    async fn with_time_asks_for_that_day_in_local_time() {
        let (addr, queries) = spawn_forecast().await;
        let provider = OpenMeteoProvider::new(format!("http://{addr}/v1/forecast"));

        let r = provider.get_weather(&request(Some(at(1, 45)))).await.unwrap();

        assert_abs_diff_eq!(r.temperature_f, 68.0);
        let queries = queries.lock().unwrap();
        let query = &queries[0];
        assert!(query.contains("hourly="));
        assert!(query.contains("start_date=2024-05-01"));
        assert!(query.contains("end_date=2024-05-01"));
        assert!(query.contains("timezone=auto"));
        assert!(!query.contains("current="));
    }

    #[tokio::test]
    async fn error_status_is_reported_with_body() {
        let (addr, _) = spawn_forecast().await;
        let provider = OpenMeteoProvider::new(format!("http://{addr}/broken"));

        let err = provider.get_weather(&request(None)).await.unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("Open-Meteo current request failed with status 500"), "{msg}");
        assert!(msg.contains("upstream exploded"), "{msg}");
    }
}
