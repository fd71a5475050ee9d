use serde::{Deserialize, Serialize};

/// Политика доставки в почтовый ящик подписчика.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Синхронная передача: доставка завершается только когда потребитель
    /// забрал сообщение. Медленный потребитель тормозит только свои
    /// доставки.
    ///
    /// Если потребитель никогда не читает ящик, задача доставки висит до
    /// `detach` этого подписчика.
    #[default]
    Blocking,
    /// Буфер на `capacity` сообщений; при переполнении доставка
    /// отбрасывается и учитывается в счётчике.
    Bounded { capacity: usize },
}

/// Конфигурация брокера.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Политика почтовых ящиков для новых подписчиков.
    pub delivery: DeliveryPolicy,
    /// Лимит одновременно выполняющихся доставок. `None` означает без лимита.
    pub max_in_flight: Option<usize>,
    /// Удалять запись топика из индекса, когда у него не осталось
    /// подписчиков. По умолчанию записи сохраняются и видны в
    /// `Broker::topics()`.
    pub prune_empty_topics: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            delivery: DeliveryPolicy::Blocking,
            max_in_flight: None,
            prune_empty_topics: false,
        }
    }
}

impl BrokerConfig {
    pub fn with_delivery(
        mut self,
        delivery: DeliveryPolicy,
    ) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn with_max_in_flight(
        mut self,
        limit: usize,
    ) -> Self {
        self.max_in_flight = Some(limit.max(1));
        self
    }

    pub fn with_prune_empty_topics(
        mut self,
        prune: bool,
    ) -> Self {
        self.prune_empty_topics = prune;
        self
    }
}
