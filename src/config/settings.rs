use std::path::Path;

use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File};
use hubcast_error::ErrorExt;
use serde::{Deserialize, Serialize};

use super::{BrokerConfig, DeliveryPolicy};
use crate::{
    error::SettingsError,
    logging::{LogFormat, LoggingConfig},
};

/// Режим доставки в плоском виде, удобном для переменных окружения.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    Blocking,
    Bounded,
}

/// Настройки брокера и логирования.
///
/// Источники в порядке приоритета: переменные окружения `HUBCAST_*`,
/// затем файл (если указан), затем значения по умолчанию.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub delivery_mode: DeliveryMode,
    /// Ёмкость ящика в режиме `bounded`.
    pub mailbox_capacity: usize,
    #[serde(default)]
    pub max_in_flight: Option<usize>,
    pub prune_empty_topics: bool,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Settings {
    /// Загружает настройки из значений по умолчанию и окружения.
    pub fn load() -> Result<Self, SettingsError> {
        Self::from_builder(Self::builder()?)
    }

    /// Загружает настройки из файла (формат по расширению) с
    /// переопределением из окружения.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let builder = Self::builder()?.add_source(File::from(path.as_ref()));
        Self::from_builder(builder)
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>, SettingsError> {
        let builder = Config::builder()
            // Значения по умолчанию
            .set_default("delivery_mode", "blocking")?
            .set_default("mailbox_capacity", 64)?
            .set_default("prune_empty_topics", false)?
            .set_default("log_level", "info")?
            .set_default("log_format", "compact")?;
        Ok(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, SettingsError> {
        let cfg = builder
            // Переменные окружения с префиксом HUBCAST_ добавляются последними
            .add_source(Environment::with_prefix("HUBCAST").try_parsing(true))
            .build()?;

        let settings: Settings = cfg.try_deserialize()?;
        if let Err(err) = settings.validate() {
            tracing::warn!(
                status = %err.status_code(),
                details = %err.log_message(),
                "rejected settings"
            );
            return Err(err);
        }
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.delivery_mode == DeliveryMode::Bounded && self.mailbox_capacity == 0 {
            return Err(SettingsError::Invalid {
                field: "mailbox_capacity",
                reason: "must be greater than zero in bounded mode".into(),
            });
        }
        if self.max_in_flight == Some(0) {
            return Err(SettingsError::Invalid {
                field: "max_in_flight",
                reason: "must be greater than zero when set".into(),
            });
        }
        Ok(())
    }

    pub fn broker_config(&self) -> BrokerConfig {
        let delivery = match self.delivery_mode {
            DeliveryMode::Blocking => DeliveryPolicy::Blocking,
            DeliveryMode::Bounded => DeliveryPolicy::Bounded {
                capacity: self.mailbox_capacity,
            },
        };
        BrokerConfig {
            delivery,
            max_in_flight: self.max_in_flight,
            prune_empty_topics: self.prune_empty_topics,
        }
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone(),
            format: self.log_format,
            ..LoggingConfig::default()
        }
    }
}
