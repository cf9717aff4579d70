use crate::{Config, WeatherReading, WeatherRequest, provider::openmeteo::OpenMeteoProvider};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openmeteo;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn get_weather(&self, request: &WeatherRequest) -> anyhow::Result<WeatherReading>;
}

/// Construct the forecast provider, honoring a configured base URL override.
pub fn provider_from_config(config: &Config) -> Box<dyn WeatherProvider> {
    Box::new(OpenMeteoProvider::new(config.forecast_url().to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_default_config_uses_open_meteo() {
        let provider = provider_from_config(&Config::default());
        let debug = format!("{provider:?}");

        assert!(debug.contains("api.open-meteo.com"));
    }

    #[test]
    fn provider_from_config_uses_override() {
        let cfg = Config {
            forecast_url: Some("http://localhost:9000/v1/forecast".into()),
            ..Config::default()
        };

        let debug = format!("{:?}", provider_from_config(&cfg));
        assert!(debug.contains("localhost:9000"));
    }
}
