use std::error::Error;

use crate::StatusCode;

/// Расширение для ошибок библиотеки (object-safe).
///
/// Даёт единый набор вспомогательных методов для логирования ошибок:
/// - статус-код ошибки,
/// - подробное сообщение для логов,
/// - теги для метрик.
pub trait ErrorExt: Error + Send + Sync + 'static {
    /// Статус ошибки.
    fn status_code(&self) -> StatusCode;

    /// Детализированное сообщение для логов.
    fn log_message(&self) -> String {
        format!("{self:?}")
    }

    /// Набор тегов для метрик: короткое имя типа и код статуса.
    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let error_type = std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("Unknown")
            .to_string();
        vec![
            ("error_type", error_type),
            ("status_code", self.status_code().to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use std::{error::Error, fmt};

    use super::*;

    #[derive(Debug)]
    struct PlainError(pub &'static str);

    impl fmt::Display for PlainError {
        fn fmt(
            &self,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            write!(f, "PlainError: {}", self.0)
        }
    }

    impl Error for PlainError {}

    impl ErrorExt for PlainError {
        fn status_code(&self) -> StatusCode {
            StatusCode::Timeout
        }
    }

    /// Тест проверяет, что `metrics_tags` по умолчанию содержит короткое
    /// имя типа и код ошибки.
    #[test]
    fn test_metrics_tags_contains_type_and_code() {
        let e = PlainError("t");
        let tags = e.metrics_tags();
        assert_eq!(tags[0], ("error_type", "PlainError".to_string()));
        assert_eq!(tags[1], ("status_code", StatusCode::Timeout.to_string()));
    }

    /// Тест проверяет, что `log_message` по умолчанию раскрывает детали
    /// через `Debug`.
    #[test]
    fn test_log_message_uses_debug() {
        let e = PlainError("secret detail");
        assert_eq!(e.log_message(), "PlainError(\"secret detail\")");
    }
}
