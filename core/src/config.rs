use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("api_base_url must not be empty")]
    MissingBaseUrl,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend REST root; request paths are joined onto it.
    pub api_base_url: String,
    /// External destination after a 403 on sign-in.
    pub pricing_url: String,
    pub forbidden_redirect_delay_ms: u32,
    pub resend_cooldown_ticks: u32,
    pub toast_timeout_ms: u32,
    /// `None` waits on a request indefinitely.
    pub request_timeout_ms: Option<u32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000/api/".to_string(),
            pricing_url: "https://ecomaitech.com/pricing".to_string(),
            forbidden_redirect_delay_ms: 3000,
            resend_cooldown_ticks: 5,
            toast_timeout_ms: 5000,
            request_timeout_ms: None,
        }
    }
}

impl ClientConfig {
    /// Parses a TOML document, then applies the optional overrides.
    pub fn load(
        document: &str,
        api_base_url: Option<&str>,
        pricing_url: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let mut config: ClientConfig = toml::from_str(document)?;
        if let Some(url) = api_base_url.filter(|url| !url.trim().is_empty()) {
            config.api_base_url = url.trim().to_string();
        }
        if let Some(url) = pricing_url.filter(|url| !url.trim().is_empty()) {
            config.pricing_url = url.trim().to_string();
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        let base = self.api_base_url.trim();
        if base.is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        if !base.ends_with('/') {
            self.api_base_url = format!("{base}/");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = ClientConfig::load("api_base_url = \"https://api.test/v1\"", None, None).unwrap();
        assert_eq!(config.api_base_url, "https://api.test/v1/");
        assert_eq!(config.resend_cooldown_ticks, 5);
        assert_eq!(config.request_timeout_ms, None);
    }

    #[test]
    fn overrides_win_over_the_document() {
        let config = ClientConfig::load(
            "api_base_url = \"https://api.test/\"\npricing_url = \"https://a.test\"",
            Some("https://override.test/api/"),
            Some(""),
        )
        .unwrap();
        assert_eq!(config.api_base_url, "https://override.test/api/");
        assert_eq!(config.pricing_url, "https://a.test");
    }

    #[test]
    fn rejects_an_empty_base_url() {
        let error = ClientConfig::load("api_base_url = \"  \"", None, None).unwrap_err();
        assert!(matches!(error, ConfigError::MissingBaseUrl));
    }

    #[test]
    fn embedded_client_config_parses() {
        let config = ClientConfig::load(include_str!("../../config/client.toml"), None, None).unwrap();
        assert_eq!(config.request_timeout_ms, Some(30_000));
    }
}
