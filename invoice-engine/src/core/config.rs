use shared::invoice::TaxMode;
use std::time::Duration;

/// Engine configuration
///
/// # Environment
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | INVOICE_API_URL | http://localhost:3000 | Base URL of the invoice backend |
/// | TAX_MODE | inclusive | `inclusive` or `legacy` (13% added on top) |
/// | REQUEST_TIMEOUT_MS | 30000 | Timeout for boundary calls |
/// | LOG_LEVEL | info | Default log filter |
/// | LOG_JSON | false | JSON console output |
/// | LOG_DIR | (unset) | Directory for rotating log files |
///
/// # Example
///
/// ```ignore
/// TAX_MODE=legacy LOG_LEVEL=debug cargo run
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub api_url: String,
    pub tax_mode: TaxMode,
    pub request_timeout_ms: u64,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
}

impl EngineConfig {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let tax_mode = match lookup("TAX_MODE") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(value = %raw, error = %e, "Invalid TAX_MODE, using inclusive");
                TaxMode::default()
            }),
            None => TaxMode::default(),
        };

        Self {
            api_url: lookup("INVOICE_API_URL").unwrap_or_else(|| "http://localhost:3000".into()),
            tax_mode,
            request_timeout_ms: lookup("REQUEST_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(30000),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_json: lookup("LOG_JSON")
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_dir: lookup("LOG_DIR").filter(|d| !d.is_empty()),
        }
    }

    /// Override the backend URL and tax mode
    ///
    /// Mostly used by tests.
    pub fn with_overrides(api_url: impl Into<String>, tax_mode: TaxMode) -> Self {
        let mut config = Self::from_env();
        config.api_url = api_url.into();
        config.tax_mode = tax_mode;
        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
