use std::{fmt, net::SocketAddr, time::Duration};

use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str =
    "https://severity-endpoint.northeurope.inference.ml.azure.com/score";

/// Must match the deployment name configured on the endpoint exactly.
pub const DEFAULT_DEPLOYMENT: &str = "severity-deployment";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:7071";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("ML_ENDPOINT_KEY is not set")]
    MissingApiKey,

    #[error("Invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Proxy settings, resolved once at startup.
#[derive(Clone)]
pub struct ProxyConfig {
    pub endpoint: String,
    pub deployment: String,
    pub timeout: Duration,
    pub bind_addr: SocketAddr,
    api_key: String,
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("endpoint", &self.endpoint)
            .field("deployment", &self.deployment)
            .field("timeout", &self.timeout)
            .field("bind_addr", &self.bind_addr)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl ProxyConfig {
    /// Config for `endpoint` with defaults for everything but the key.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        Ok(Self {
            endpoint: endpoint.into(),
            deployment: DEFAULT_DEPLOYMENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            bind_addr: parse_addr(DEFAULT_BIND_ADDR)?,
            api_key,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve settings through `lookup` (environment variable name to value).
    ///
    /// - `ML_ENDPOINT_KEY` (required)
    /// - `ML_ENDPOINT_URL`, `ML_DEPLOYMENT`, `ML_TIMEOUT_SECS`, `BIND_ADDR` (optional)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("ML_ENDPOINT_KEY").ok_or(ConfigError::MissingApiKey)?;
        let endpoint = lookup("ML_ENDPOINT_URL").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let mut cfg = Self::new(endpoint, api_key)?;

        if let Some(deployment) = lookup("ML_DEPLOYMENT") {
            cfg.deployment = deployment;
        }

        if let Some(raw) = lookup("ML_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or(ConfigError::Invalid { name: "ML_TIMEOUT_SECS", value: raw })?;
            cfg.timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup("BIND_ADDR") {
            cfg.bind_addr = parse_addr(&raw)?;
        }

        Ok(cfg)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

fn parse_addr(raw: &str) -> Result<SocketAddr, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name: "BIND_ADDR", value: raw.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn missing_key_is_fatal() {
        let err = ProxyConfig::from_lookup(lookup(&[])).unwrap_err();

        assert_eq!(err, ConfigError::MissingApiKey);
        assert_eq!(err.to_string(), "ML_ENDPOINT_KEY is not set");
    }

    #[test]
    fn empty_key_counts_as_missing() {
        let err = ProxyConfig::from_lookup(lookup(&[("ML_ENDPOINT_KEY", "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey);
    }

    #[test]
    fn defaults_target_the_severity_deployment() {
        let cfg = ProxyConfig::from_lookup(lookup(&[("ML_ENDPOINT_KEY", "k")])).unwrap();

        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.deployment, "severity-deployment");
        assert_eq!(cfg.timeout, Duration::from_secs(120));
        assert_eq!(cfg.bind_addr.port(), 7071);
        assert_eq!(cfg.api_key(), "k");
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = ProxyConfig::from_lookup(lookup(&[
            ("ML_ENDPOINT_KEY", "k"),
            ("ML_ENDPOINT_URL", "http://127.0.0.1:9999/score"),
            ("ML_DEPLOYMENT", "severity-blue"),
            ("ML_TIMEOUT_SECS", "5"),
            ("BIND_ADDR", "127.0.0.1:8080"),
        ]))
        .unwrap();

        assert_eq!(cfg.endpoint, "http://127.0.0.1:9999/score");
        assert_eq!(cfg.deployment, "severity-blue");
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.bind_addr.to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn bad_timeout_is_rejected() {
        for raw in ["0", "soon", "-3"] {
            let err = ProxyConfig::from_lookup(lookup(&[
                ("ML_ENDPOINT_KEY", "k"),
                ("ML_TIMEOUT_SECS", raw),
            ]))
            .unwrap_err();

            assert!(matches!(err, ConfigError::Invalid { name: "ML_TIMEOUT_SECS", .. }));
        }
    }

    #[test]
    fn debug_output_redacts_key() {
        let cfg = ProxyConfig::new(DEFAULT_ENDPOINT, "super-secret").unwrap();
        let debug = format!("{cfg:?}");

        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
