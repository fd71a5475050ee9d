use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибка генерации идентификатора подписчика.
///
/// Единственная ошибка ядра брокера: возникает, когда системный источник
/// энтропии не смог выдать случайные байты.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("entropy source unavailable: {reason}")]
    EntropyUnavailable { reason: String },
}

impl ErrorExt for IdentityError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::EntropyUnavailable { .. } => StatusCode::EntropyUnavailable,
        }
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        vec![
            ("error_type", "identity".to_string()),
            ("status_code", self.status_code().to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_error_display() {
        let err = IdentityError::EntropyUnavailable {
            reason: "os rng closed".into(),
        };
        assert_eq!(
            err.to_string(),
            "entropy source unavailable: os rng closed"
        );
        assert_eq!(err.status_code(), StatusCode::EntropyUnavailable);
    }

    #[test]
    fn test_identity_error_metrics_tags() {
        let err = IdentityError::EntropyUnavailable {
            reason: String::new(),
        };
        let tags = err.metrics_tags();
        assert_eq!(tags[0], ("error_type", "identity".to_string()));
        assert_eq!(tags[1].1, StatusCode::EntropyUnavailable.to_string());
    }
}
