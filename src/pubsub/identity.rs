use std::{fmt, sync::Arc};

use hubcast_error::IdentityError;
use rand::{rngs::OsRng, RngCore};

/// Количество случайных байт в идентификаторе подписчика.
pub const ID_ENTROPY_BYTES: usize = 50;

/// Уникальный идентификатор подписчика: 50 случайных байт в hex (100 символов).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(Arc<str>);

impl SubscriberId {
    /// Генерирует идентификатор из системного CSPRNG.
    pub fn generate() -> Result<Self, IdentityError> {
        Self::generate_with(&mut OsRng)
    }

    /// Генерирует идентификатор из переданного источника энтропии.
    pub fn generate_with<R: RngCore + ?Sized>(rng: &mut R) -> Result<Self, IdentityError> {
        let mut bytes = [0u8; ID_ENTROPY_BYTES];
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| IdentityError::EntropyUnavailable {
                reason: e.to_string(),
            })?;
        Ok(Self(Arc::from(hex::encode(bytes))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SubscriberId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
