//! Configuration loading from environment.

use std::env;
use std::time::Duration;

use ecb_client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use refdata_types::DEFAULT_BASE_CURRENCY;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub ecb_base_url: String,
    pub ecb_timeout: Duration,
    pub base_currency: String,
    pub guard_full_wipe: bool,
    pub log_json: bool,
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which returns a variable's value
    /// if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("PORT must be a port number: {}", e))?;

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let ecb_base_url = lookup("ECB_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let ecb_timeout = match lookup("ECB_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(
                secs.parse()
                    .map_err(|e| anyhow::anyhow!("ECB_TIMEOUT_SECS must be whole seconds: {}", e))?,
            ),
            None => DEFAULT_TIMEOUT,
        };

        let base_currency = lookup("BASE_CURRENCY")
            .map(|code| code.trim().to_uppercase())
            .filter(|code| !code.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_CURRENCY.to_string());

        let guard_full_wipe = match lookup("SYNC_GUARD_FULL_WIPE") {
            Some(flag) => parse_flag(&flag)
                .ok_or_else(|| anyhow::anyhow!("SYNC_GUARD_FULL_WIPE must be true or false"))?,
            None => false,
        };

        let log_json = lookup("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));

        let otlp_endpoint = lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|e| !e.is_empty());

        Ok(Self {
            port,
            database_url,
            ecb_base_url,
            ecb_timeout,
            base_currency,
            guard_full_wipe,
            log_json,
            otlp_endpoint,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "sqlite::memory:")]).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.ecb_base_url, "https://data-api.ecb.europa.eu");
        assert_eq!(config.ecb_timeout, Duration::from_secs(20));
        assert_eq!(config.base_currency, "EUR");
        assert!(!config.guard_full_wipe);
        assert!(!config.log_json);
        assert!(config.otlp_endpoint.is_none());
    }

    #[test]
    fn test_database_url_is_required() {
        assert!(load(&[]).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/refdata"),
            ("PORT", "8080"),
            ("ECB_TIMEOUT_SECS", "5"),
            ("BASE_CURRENCY", "usd"),
            ("SYNC_GUARD_FULL_WIPE", "true"),
            ("LOG_FORMAT", "JSON"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4317"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.ecb_timeout, Duration::from_secs(5));
        assert_eq!(config.base_currency, "USD");
        assert!(config.guard_full_wipe);
        assert!(config.log_json);
        assert_eq!(config.otlp_endpoint.as_deref(), Some("http://localhost:4317"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(load(&[("DATABASE_URL", "x"), ("PORT", "http")]).is_err());
        assert!(load(&[("DATABASE_URL", "x"), ("SYNC_GUARD_FULL_WIPE", "maybe")]).is_err());
        assert!(load(&[("DATABASE_URL", "x"), ("ECB_TIMEOUT_SECS", "-1")]).is_err());
    }
}
