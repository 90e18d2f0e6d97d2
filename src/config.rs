use crate::errors::ConfigError;
use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_DATA_PATH: &str = "data/state.json";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub data_path: PathBuf,
    pub port: u16,
    pub telegram_api_url: String,
    pub poll_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unparsable numbers fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bot_token = lookup("BOT_TOKEN")
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let data_path = lookup("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let telegram_api_url = lookup("TELEGRAM_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string());

        let poll_timeout = lookup("POLL_TIMEOUT_SECS")
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS));

        Ok(Self {
            bot_token,
            data_path,
            port,
            telegram_api_url,
            poll_timeout,
        })
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_token_is_fatal() {
        assert!(matches!(
            Config::from_lookup(lookup_from(&[])),
            Err(ConfigError::MissingToken)
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("BOT_TOKEN", "  ")])),
            Err(ConfigError::MissingToken)
        ));
    }

    #[test]
    fn defaults_apply_when_unset_or_invalid() {
        let config =
            Config::from_lookup(lookup_from(&[("BOT_TOKEN", "123:abc"), ("PORT", "http")])).unwrap();
        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.data_path, PathBuf::from(DEFAULT_DATA_PATH));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.telegram_api_url, DEFAULT_TELEGRAM_API_URL);
        assert_eq!(config.poll_timeout, Duration::from_secs(30));
    }

    #[test]
    fn overrides_are_read() {
        let config = Config::from_lookup(lookup_from(&[
            ("BOT_TOKEN", "t"),
            ("APP_DATA_PATH", "/tmp/kpi.json"),
            ("PORT", "9000"),
            ("TELEGRAM_API_URL", "http://127.0.0.1:8081/"),
            ("POLL_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.data_path, PathBuf::from("/tmp/kpi.json"));
        assert_eq!(config.port, 9000);
        assert_eq!(config.telegram_api_url, "http://127.0.0.1:8081");
        assert_eq!(config.poll_timeout, Duration::from_secs(5));
    }
}
