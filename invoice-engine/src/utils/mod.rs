//! Process setup helpers

pub mod logger;

use crate::core::EngineConfig;

/// Load `.env`, read configuration and start logging
///
/// Call once at process start.
pub fn setup_environment() -> anyhow::Result<EngineConfig> {
    dotenv::dotenv().ok();
    let config = EngineConfig::from_env();
    logger::init_logger_with_file(
        &config.log_level,
        config.log_json,
        config.log_dir.as_deref(),
    )?;
    tracing::info!(
        api_url = %config.api_url,
        tax_mode = ?config.tax_mode,
        "Invoice engine environment ready"
    );
    Ok(config)
}
