//! Client configuration

use invoice_engine::EngineConfig;
use std::time::Duration;

/// Connection settings for the invoice backend
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "http://localhost:3000")
    pub base_url: String,

    /// Bearer token sent with every request
    pub token: Option<String>,

    /// Request timeout
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Take the URL and timeout from the engine configuration
    pub fn from_engine_config(config: &EngineConfig) -> Self {
        Self::new(config.api_url.clone()).with_timeout(config.request_timeout())
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:3000")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::invoice::TaxMode;

    #[test]
    fn test_from_engine_config() {
        let mut engine = EngineConfig::with_overrides("http://billing:9000", TaxMode::Legacy);
        engine.request_timeout_ms = 1500;

        let config = ClientConfig::from_engine_config(&engine).with_token("abc");
        assert_eq!(config.base_url, "http://billing:9000");
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.token.as_deref(), Some("abc"));
    }
}
