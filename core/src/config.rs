//! Engine configuration.

use std::time::Duration;

use crate::error::ConfigError;

pub const API_URL_VAR: &str = "ITEMS_API_URL";
pub const TIMEOUT_VAR: &str = "ITEMS_REQUEST_TIMEOUT_MS";

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Root of the item API; `/items` is appended.
    pub base_url: String,
    /// Upper bound on each remote store call.
    pub request_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SyncConfig {
    /// Read `ITEMS_API_URL` and `ITEMS_REQUEST_TIMEOUT_MS`, falling back to
    /// the defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(url) = lookup(API_URL_VAR) {
            let url = url.trim();
            if url.is_empty() {
                return Err(ConfigError::EmptyUrl { var: API_URL_VAR });
            }
            config.base_url = url.to_string();
        }
        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let millis: u64 = raw
                .trim()
                .parse()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(ConfigError::InvalidTimeout {
                    var: TIMEOUT_VAR,
                    value: raw.clone(),
                })?;
            config.request_timeout = Duration::from_millis(millis);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn unset_variables_use_defaults() {
        assert_eq!(SyncConfig::from_lookup(lookup(&[])).unwrap(), SyncConfig::default());
    }

    #[test]
    fn reads_url_and_timeout() {
        let config = SyncConfig::from_lookup(lookup(&[
            (API_URL_VAR, "https://items.example.com/api/"),
            (TIMEOUT_VAR, "2500"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://items.example.com/api/");
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn rejects_bad_timeout() {
        for value in ["soon", "0", "-5"] {
            let err = SyncConfig::from_lookup(lookup(&[(TIMEOUT_VAR, value)])).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidTimeout { .. }), "{value}");
        }
    }

    #[test]
    fn rejects_blank_url() {
        let err = SyncConfig::from_lookup(lookup(&[(API_URL_VAR, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyUrl { .. }));
    }
}
