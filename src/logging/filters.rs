use tracing_subscriber::EnvFilter;

use crate::{error::LoggingError, logging::config::LoggingConfig};

/// Собирает фильтр: если задан `RUST_LOG`, используется он, иначе директива
/// из конфигурации.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    if let Ok(env_filter) = EnvFilter::try_from_default_env() {
        return Ok(env_filter);
    }

    EnvFilter::try_new(&config.level).map_err(|e| LoggingError::InvalidDirective {
        directive: config.level.clone(),
        reason: e.to_string(),
    })
}
