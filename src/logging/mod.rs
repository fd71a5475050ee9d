pub mod config;
mod filters;
mod formatter;

pub use config::{LogFormat, LoggingConfig};
pub use filters::build_filter;
pub use formatter::{build_formatter, build_formatter_with_writer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::LoggingError;

/// Инициализация глобального subscriber'а `tracing` по конфигурации.
///
/// Библиотека сама логирование не включает: это делает приложение, один раз
/// при старте. Повторный вызов вернёт `LoggingError::AlreadyInitialized`.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let env_filter = filters::build_filter(config)?;
    let formatter_layer = formatter::build_formatter(config);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(formatter_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.level,
        format = ?config.format,
        "Logging system initialized"
    );

    Ok(())
}
