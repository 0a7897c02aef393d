//! Gateway configuration.
//!
//! Resolved once at process startup and passed into [`crate::OpenAiGateway`]. Nothing in this
//! crate reads environment variables itself; binaries read them and hand the raw values to the
//! `*_from_env_value` helpers.

use crate::{GatewayError, GatewayResult};
use std::time::Duration;

/// Default chat-completions endpoint.
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model name.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Clone)]
pub struct GatewayConfig {
    api_key: Option<String>,
    api_url: String,
    model: String,
    temperature: f32,
    timeout: Option<Duration>,
}

impl GatewayConfig {
    /// Create a config with default endpoint, model and temperature.
    ///
    /// A missing or blank `api_key` is accepted here. It only fails when a call is attempted,
    /// so the rest of the application keeps working without a credential.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            api_url: DEFAULT_API_URL.into(),
            model: DEFAULT_MODEL.into(),
            temperature: DEFAULT_TEMPERATURE,
            timeout: None,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Parse the sampling temperature from an optional string value.
///
/// If `value` is `None` or blank, returns [`DEFAULT_TEMPERATURE`].
pub fn temperature_from_env_value(value: Option<String>) -> GatewayResult<f32> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(DEFAULT_TEMPERATURE);
    };

    let parsed = value
        .parse::<f32>()
        .map_err(|_| GatewayError::InvalidConfig(format!("invalid temperature '{value}'")))?;
    if !(0.0..=2.0).contains(&parsed) {
        return Err(GatewayError::InvalidConfig(format!(
            "temperature {parsed} is outside 0.0..=2.0"
        )));
    }
    Ok(parsed)
}

/// Parse an optional request timeout in whole seconds.
///
/// `None`, blank or `0` mean no timeout.
pub fn timeout_from_env_value(value: Option<String>) -> GatewayResult<Option<Duration>> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    let secs = value
        .parse::<u64>()
        .map_err(|_| GatewayError::InvalidConfig(format!("invalid timeout '{value}'")))?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_api_key_counts_as_missing() {
        assert!(GatewayConfig::new(Some("   ".into())).api_key().is_none());
        assert_eq!(
            GatewayConfig::new(Some(" sk-test ".into())).api_key(),
            Some("sk-test")
        );
    }

    #[test]
    fn debug_output_redacts_key() {
        let cfg = GatewayConfig::new(Some("sk-secret".into()));
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("sk-secret"));
    }

    #[test]
    fn temperature_defaults_and_validates() {
        assert_eq!(temperature_from_env_value(None).unwrap(), DEFAULT_TEMPERATURE);
        assert_eq!(temperature_from_env_value(Some("0.2".into())).unwrap(), 0.2);
        assert!(temperature_from_env_value(Some("hot".into())).is_err());
        assert!(temperature_from_env_value(Some("3.5".into())).is_err());
    }

    #[test]
    fn timeout_zero_means_none() {
        assert_eq!(timeout_from_env_value(Some("0".into())).unwrap(), None);
        assert_eq!(
            timeout_from_env_value(Some("30".into())).unwrap(),
            Some(Duration::from_secs(30))
        );
        assert!(timeout_from_env_value(Some("-1".into())).is_err());
    }
}
