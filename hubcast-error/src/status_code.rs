use std::fmt;

use num_enum::TryFromPrimitive;
#[cfg(feature = "serde")]
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Коды статуса для категоризации ошибок.
///
/// # Диапазоны:
/// - 2xxx: Конфигурация
/// - 3xxx: Доставка и почтовые ящики
/// - 4xxx: Идентификаторы и ресурсы ОС
/// - 5xxx: Логирование
#[cfg_attr(feature = "serde", derive(Serialize_repr, Deserialize_repr))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 2xxx: Конфигурация ===
    ConfigInvalid = 2000,
    ConfigLoadFailed = 2001,

    // === 3xxx: Доставка ===
    MailboxClosed = 3000,
    MailboxEmpty = 3001,
    Timeout = 3002,

    // === 4xxx: Ресурсы ===
    EntropyUnavailable = 4000,

    // === 5xxx: Логирование ===
    LoggingInitFailed = 5000,
}

impl StatusCode {
    /// Числовое представление кода статуса.
    pub const fn code(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}
