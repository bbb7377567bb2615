// src/config.rs
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::errors::{GatewayError, Result};

/// Staging backend that accepts both the HTTP and the WebSocket traffic.
pub const DEFAULT_ENDPOINT: &str = "https://landing-page.staging.keploy.io/query";

/// Where the gateway lives and how long a single HTTP call may take.
///
/// The endpoint is process-wide: it is declared once here and handed to the
/// client, never repeated at call sites.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// GraphQL endpoint for queries and mutations sent over HTTP POST.
    pub endpoint: String,

    /// WebSocket endpoint for live subscriptions.
    pub ws_endpoint: String,

    /// Per-request timeout. `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,
}

/// On-disk form of [`GatewayConfig`]; every key is optional.
#[derive(Deserialize, Debug, Default)]
struct FileConfig {
    #[serde(default)]
    endpoint: Option<String>,

    #[serde(default)]
    ws_endpoint: Option<String>,

    #[serde(default)]
    request_timeout_secs: Option<u64>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }
}

impl GatewayConfig {
    /// Config for `endpoint`, with the WebSocket endpoint derived from it.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        let ws_endpoint = derive_ws_endpoint(&endpoint);
        Self {
            endpoint,
            ws_endpoint,
            request_timeout: None,
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let file: FileConfig = toml::from_str(&raw)?;

        let mut config = match file.endpoint {
            Some(endpoint) => Self::with_endpoint(endpoint),
            None => Self::default(),
        };
        if let Some(ws_endpoint) = file.ws_endpoint {
            config.ws_endpoint = ws_endpoint;
        }
        config.request_timeout = file.request_timeout_secs.map(Duration::from_secs);

        config.validate()?;
        Ok(config)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match lookup("ATG_ENDPOINT") {
            Some(endpoint) => Self::with_endpoint(endpoint.trim()),
            None => Self::default(),
        };

        if let Some(ws_endpoint) = lookup("ATG_WS_ENDPOINT") {
            config.ws_endpoint = ws_endpoint.trim().to_string();
        }

        if let Some(raw) = lookup("ATG_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                GatewayError::Config(format!(
                    "ATG_REQUEST_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                    raw
                ))
            })?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(GatewayError::Config(format!(
                "endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            )));
        }
        if !(self.ws_endpoint.starts_with("ws://") || self.ws_endpoint.starts_with("wss://")) {
            return Err(GatewayError::Config(format!(
                "ws_endpoint must be a ws(s) URL, got '{}'",
                self.ws_endpoint
            )));
        }
        if self.request_timeout == Some(Duration::ZERO) {
            return Err(GatewayError::Config(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn derive_ws_endpoint(endpoint: &str) -> String {
    if let Some(rest) = endpoint.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = endpoint.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        endpoint.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_points_at_staging() {
        let config = GatewayConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.ws_endpoint, "wss://landing-page.staging.keploy.io/query");
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    fn test_env_overrides() {
        let config = GatewayConfig::from_lookup(lookup_from(&[
            ("ATG_ENDPOINT", "http://localhost:8080/query"),
            ("ATG_REQUEST_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint, "http://localhost:8080/query");
        assert_eq!(config.ws_endpoint, "ws://localhost:8080/query");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(15)));

        let config = GatewayConfig::from_lookup(lookup_from(&[(
            "ATG_WS_ENDPOINT",
            "ws://127.0.0.1:9000/ws",
        )]))
        .unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.ws_endpoint, "ws://127.0.0.1:9000/ws");
    }

    #[test]
    fn test_env_rejects_bad_values() {
        let err = GatewayConfig::from_lookup(lookup_from(&[("ATG_REQUEST_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));

        let err = GatewayConfig::from_lookup(lookup_from(&[("ATG_ENDPOINT", "ftp://nope")]))
            .unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));

        let err = GatewayConfig::from_lookup(lookup_from(&[("ATG_REQUEST_TIMEOUT_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("atg-config-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "endpoint = \"https://gateway.example.com/query\"\nrequest_timeout_secs = 30\n",
        )
        .unwrap();

        let config = GatewayConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.endpoint, "https://gateway.example.com/query");
        assert_eq!(config.ws_endpoint, "wss://gateway.example.com/query");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_from_missing_file() {
        let err = GatewayConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, GatewayError::FileRead(_)));
    }
}
