use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use hubcast_error::{ErrorExt, IdentityError};
use parking_lot::RwLock;
use tokio::runtime::Handle;

use super::{dispatch::Dispatcher, Message, Subscriber, SubscriberId};
use crate::config::BrokerConfig;

type TopicKey = Arc<str>;
type TopicMembers<P> = HashMap<SubscriberId, Subscriber<P>>;

/// Брокер Pub/Sub сообщений.
///
/// Хранит реестр подписчиков и индекс «топик → подписчики», каждый под
/// своим reader/writer замком. Индекс топиков меняет только брокер.
///
/// Поддерживает:
/// - Подписки по точному имени топика
/// - Параллельную доставку каждому подписчику отдельной задачей
/// - Настраиваемую политику почтовых ящиков и лимит активных доставок
/// - Статистику рассылок и доставок
pub struct Broker<P> {
    /// Все живые подписчики: id → подписчик.
    subscribers: RwLock<HashMap<SubscriberId, Subscriber<P>>>,
    /// Топик → подписчики, заинтересованные в нём.
    topics: RwLock<HashMap<TopicKey, TopicMembers<P>>>,
    dispatcher: Dispatcher,
    config: BrokerConfig,
    /// Общее количество вызовов `broadcast`.
    broadcast_count: AtomicU64,
}

/// Снимок состояния брокера.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrokerStats {
    pub subscribers: usize,
    pub topics: usize,
    pub broadcasts: u64,
    pub scheduled: u64,
    pub delivered: u64,
    pub dropped: u64,
    pub in_flight: usize,
}

impl<P: Send + Sync + 'static> Default for Broker<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> std::fmt::Debug for Broker<P> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Broker")
            .field("subscribers", &self.subscribers.read().len())
            .field("topics", &self.topics.read().len())
            .field("config", &self.config)
            .finish()
    }
}

impl<P: Send + Sync + 'static> Broker<P> {
    /// Создаёт брокер с конфигурацией по умолчанию.
    pub fn new() -> Self {
        Self::with_config(BrokerConfig::default())
    }

    pub fn with_config(config: BrokerConfig) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            topics: RwLock::new(HashMap::new()),
            dispatcher: Dispatcher::new(config.max_in_flight),
            config,
            broadcast_count: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Создаёт нового подписчика и регистрирует его в брокере.
    ///
    /// Единственная ошибка: отказ источника энтропии при генерации id.
    pub fn attach(&self) -> Result<Subscriber<P>, IdentityError> {
        let subscriber = Subscriber::create(self.config.delivery).inspect_err(|err| {
            tracing::error!(
                status = %err.status_code(),
                tags = ?err.metrics_tags(),
                details = %err.log_message(),
                "failed to attach subscriber"
            );
        })?;
        self.subscribers
            .write()
            .insert(subscriber.id().clone(), subscriber.clone());

        tracing::debug!(subscriber = %subscriber.id(), "subscriber attached");
        Ok(subscriber)
    }

    /// Подписывает `subscriber` на перечисленные топики.
    ///
    /// Замок индекса топиков удерживается на весь вызов; набор топиков
    /// самого подписчика обновляется под его собственным замком.
    /// Уничтоженный подписчик не добавляется.
    pub fn subscribe<I, T>(
        &self,
        subscriber: &Subscriber<P>,
        topics: I,
    ) where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut index = self.topics.write();
        if subscriber.is_destroyed() {
            tracing::debug!(subscriber = %subscriber.id(), "subscribe ignored for detached subscriber");
            return;
        }

        for topic in topics {
            let topic = topic.as_ref();
            let key = match index.get_key_value(topic) {
                Some((key, _)) => Arc::clone(key),
                None => {
                    let key: TopicKey = Arc::from(topic);
                    index.insert(Arc::clone(&key), HashMap::new());
                    key
                }
            };

            subscriber.add_topic(Arc::clone(&key));
            if let Some(members) = index.get_mut(&key) {
                members.insert(subscriber.id().clone(), subscriber.clone());
            }
            tracing::debug!(subscriber = %subscriber.id(), topic, "subscribed");
        }
    }

    /// Отписывает `subscriber` от перечисленных топиков.
    ///
    /// Замок индекса берётся и отпускается на каждый топик отдельно, так что
    /// параллельные подписки на другие топики могут вклиниваться между
    /// шагами. Отписка от неизвестного топика ничего не делает.
    pub fn unsubscribe<I, T>(
        &self,
        subscriber: &Subscriber<P>,
        topics: I,
    ) where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        for topic in topics {
            let topic = topic.as_ref();
            {
                let mut index = self.topics.write();
                let now_empty = match index.get_mut(topic) {
                    Some(members) => {
                        members.remove(subscriber.id());
                        members.is_empty()
                    }
                    None => false,
                };
                if now_empty && self.config.prune_empty_topics {
                    index.remove(topic);
                }
                subscriber.remove_topic(topic);
            }
            tracing::debug!(subscriber = %subscriber.id(), topic, "unsubscribed");
        }
    }

    /// Отключает подписчика от брокера.
    ///
    /// Порядок важен: сначала подписчик уничтожается (ящик закрыт, доставки
    /// в полёте отбрасываются), затем снимаются все его подписки, затем он
    /// удаляется из реестра. Возвращает `false`, если подписчик уже был
    /// отключён или не принадлежит этому брокеру.
    pub async fn detach(
        &self,
        subscriber: &Subscriber<P>,
    ) -> bool {
        if !self.subscribers.read().contains_key(subscriber.id()) {
            return false;
        }
        if !subscriber.destroy().await {
            return false;
        }

        // Барьер: `subscribe`, начавшийся до уничтожения, уже завершился,
        // а все последующие видят флаг и ничего не добавляют.
        let topics = {
            let _index = self.topics.read();
            subscriber.topics()
        };
        self.unsubscribe(subscriber, &topics);
        self.subscribers.write().remove(subscriber.id());

        tracing::debug!(
            subscriber = %subscriber.id(),
            topics = topics.len(),
            "subscriber detached"
        );
        true
    }

    /// Рассылает `payload` всем текущим подписчикам перечисленных топиков.
    ///
    /// На каждый топик, у которого есть подписчики, создаётся ровно одно
    /// сообщение; каждая доставка выполняется отдельной задачей. Вызов не
    /// ждёт доставок и возвращает число запланированных.
    ///
    /// Доставки выполняются в текущем runtime tokio. Вызов вне runtime
    /// ничего не доставляет, пишет предупреждение в лог и возвращает 0.
    pub fn broadcast<I, T>(
        &self,
        payload: P,
        topics: I,
    ) -> usize
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.broadcast_shared(Arc::new(payload), topics)
    }

    /// То же, что [`Broker::broadcast`], для нагрузки, уже лежащей в `Arc`.
    pub fn broadcast_shared<I, T>(
        &self,
        payload: Arc<P>,
        topics: I,
    ) -> usize
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.broadcast_count.fetch_add(1, Ordering::Relaxed);

        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!("broadcast called outside of a tokio runtime, message dropped");
            return 0;
        };

        let mut scheduled = 0;
        for topic in topics {
            let topic = topic.as_ref();
            let (key, recipients) = {
                let index = self.topics.read();
                match index.get_key_value(topic) {
                    Some((key, members)) if !members.is_empty() => (
                        Arc::clone(key),
                        members.values().cloned().collect::<Vec<_>>(),
                    ),
                    _ => continue,
                }
            };

            let message = Arc::new(Message::new(key, Arc::clone(&payload)));
            let count = recipients.len();
            for subscriber in recipients {
                self.dispatcher
                    .submit(&runtime, subscriber, Arc::clone(&message));
            }
            scheduled += count;
            tracing::trace!(topic, recipients = count, "broadcast scheduled");
        }
        scheduled
    }

    /// Текущее количество подписчиков топика.
    pub fn subscribers(
        &self,
        topic: &str,
    ) -> usize {
        self.topics.read().get(topic).map_or(0, HashMap::len)
    }

    /// Снимок имён всех топиков, имеющих запись в индексе.
    ///
    /// Без `prune_empty_topics` сюда попадают и топики, у которых больше нет
    /// подписчиков.
    pub fn topics(&self) -> Vec<String> {
        self.topics.read().keys().map(|t| t.to_string()).collect()
    }

    /// Количество зарегистрированных подписчиков.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn get(
        &self,
        id: &SubscriberId,
    ) -> Option<Subscriber<P>> {
        self.subscribers.read().get(id).cloned()
    }

    pub fn stats(&self) -> BrokerStats {
        let counters = self.dispatcher.counters();
        BrokerStats {
            subscribers: self.subscriber_count(),
            topics: self.topics.read().len(),
            broadcasts: self.broadcast_count.load(Ordering::Relaxed),
            scheduled: counters.scheduled,
            delivered: counters.delivered,
            dropped: counters.dropped,
            in_flight: counters.in_flight,
        }
    }

    /// Ждёт завершения всех запланированных доставок.
    ///
    /// Не завершится, пока есть доставка `Blocking` к подписчику, чей ящик
    /// никто не читает.
    pub async fn wait_idle(&self) {
        self.dispatcher.wait_idle().await
    }
}
