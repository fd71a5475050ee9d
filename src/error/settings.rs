use hubcast_error::{ErrorExt, StatusCode};
use thiserror::Error;

/// Ошибка загрузки или проверки настроек.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid setting '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Ошибка инициализации логирования.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter directive '{directive}': {reason}")]
    InvalidDirective { directive: String, reason: String },

    #[error("global tracing subscriber is already installed")]
    AlreadyInitialized,
}

impl ErrorExt for SettingsError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Load(_) => StatusCode::ConfigLoadFailed,
            Self::Invalid { .. } => StatusCode::ConfigInvalid,
        }
    }
}

impl ErrorExt for LoggingError {
    fn status_code(&self) -> StatusCode {
        StatusCode::LoggingInitFailed
    }
}
