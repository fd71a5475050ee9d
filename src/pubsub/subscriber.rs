use std::{
    collections::HashSet,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Instant,
};

use hubcast_error::IdentityError;
use parking_lot::RwLock;
use rand::RngCore;
use tokio::sync::{mpsc, mpsc::error::TrySendError, watch, RwLock as AsyncRwLock};

use super::{
    mailbox::{self, Envelope},
    Mailbox, Message, SubscriberId,
};
use crate::config::DeliveryPolicy;

/// Итог одной попытки доставки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Сообщение передано потребителю (`Blocking`) или поставлено в очередь
    /// (`Bounded`).
    Delivered,
    /// Подписчик уничтожен; сообщение тихо отброшено.
    Destroyed,
    /// Ящик `Bounded` переполнен; сообщение отброшено.
    Overflow,
}

/// Подписчик: идентификатор, почтовый ящик, набор топиков и флаг
/// уничтожения.
///
/// `Subscriber` это дешёвый для клонирования handle; все клоны ссылаются на
/// одно состояние. Обычно создаётся брокером через [`Broker::attach`].
///
/// Набор топиков меняется только через брокер, поэтому он всегда совпадает
/// с индексом брокера:
///
/// ```compile_fail
/// let broker = hubcast::Broker::<u32>::new();
/// let sub = broker.attach().unwrap();
/// sub.add_topic("A");
/// ```
///
/// [`Broker::attach`]: super::Broker::attach
pub struct Subscriber<P> {
    inner: Arc<Inner<P>>,
}

struct Inner<P> {
    id: SubscriberId,
    created_at: Instant,
    policy: DeliveryPolicy,
    topics: RwLock<HashSet<Arc<str>>>,
    /// Отправляющая сторона ящика. `None` после уничтожения.
    ///
    /// Проверка флага и постановка в очередь идут под read-guard, закрытие
    /// под write-guard этого же замка.
    outbox: AsyncRwLock<Option<mpsc::Sender<Envelope<P>>>>,
    /// Выставляется в `true` перед закрытием ящика, будит доставки,
    /// ожидающие места в очереди или потребителя.
    closing: watch::Sender<bool>,
    mailbox: Mailbox<P>,
    overflowed: AtomicU64,
}

impl<P> Clone for Subscriber<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P> PartialEq for Subscriber<P> {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.inner.id == other.inner.id
    }
}

impl<P> Eq for Subscriber<P> {}

impl<P> fmt::Debug for Subscriber<P> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.inner.id)
            .field("topics", &self.topics())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

impl<P> Subscriber<P> {
    /// Создаёт подписчика с идентификатором из системного CSPRNG.
    pub fn create(policy: DeliveryPolicy) -> Result<Self, IdentityError> {
        Ok(Self::with_id(SubscriberId::generate()?, policy))
    }

    /// Создаёт подписчика, беря энтропию для идентификатора из `rng`.
    pub fn create_with_rng<R: RngCore + ?Sized>(
        policy: DeliveryPolicy,
        rng: &mut R,
    ) -> Result<Self, IdentityError> {
        Ok(Self::with_id(SubscriberId::generate_with(rng)?, policy))
    }

    fn with_id(
        id: SubscriberId,
        policy: DeliveryPolicy,
    ) -> Self {
        let (tx, mailbox) = mailbox::channel(policy);
        let (closing, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                id,
                created_at: Instant::now(),
                policy,
                topics: RwLock::new(HashSet::new()),
                outbox: AsyncRwLock::new(Some(tx)),
                closing,
                mailbox,
                overflowed: AtomicU64::new(0),
            }),
        }
    }

    pub fn id(&self) -> &SubscriberId {
        &self.inner.id
    }

    pub fn created_at(&self) -> Instant {
        self.inner.created_at
    }

    pub fn policy(&self) -> DeliveryPolicy {
        self.inner.policy
    }

    /// Снимок набора топиков. Порядок не определён.
    pub fn topics(&self) -> Vec<String> {
        self.inner
            .topics
            .read()
            .iter()
            .map(|t| t.to_string())
            .collect()
    }

    pub fn has_topic(
        &self,
        topic: &str,
    ) -> bool {
        self.inner.topics.read().contains(topic)
    }

    /// Добавляет топик. Повторное добавление ничего не меняет.
    ///
    /// Вызывается только брокером вместе с обновлением индекса топиков.
    pub(crate) fn add_topic(
        &self,
        topic: impl Into<Arc<str>>,
    ) {
        self.inner.topics.write().insert(topic.into());
    }

    /// Удаляет топик. Удаление отсутствующего ничего не меняет.
    pub(crate) fn remove_topic(
        &self,
        topic: &str,
    ) {
        self.inner.topics.write().remove(topic);
    }

    /// Потребительская сторона почтового ящика.
    pub fn messages(&self) -> Mailbox<P> {
        self.inner.mailbox.clone()
    }

    pub fn is_destroyed(&self) -> bool {
        *self.inner.closing.borrow()
    }

    /// Сколько доставок отброшено из-за переполнения ящика.
    pub fn dropped(&self) -> u64 {
        self.inner.overflowed.load(Ordering::Relaxed)
    }

    /// Уничтожает подписчика: выставляет флаг и закрывает ящик.
    ///
    /// Возвращает `false`, если подписчик уже был уничтожен.
    pub(crate) async fn destroy(&self) -> bool {
        // Сначала будим доставки, которые держат read-guard в ожидании,
        // иначе write-guard не будет получен.
        self.inner.closing.send_replace(true);
        let mut outbox = self.inner.outbox.write().await;
        outbox.take().is_some()
    }
}

impl<P: Send + Sync + 'static> Subscriber<P> {
    /// Пытается доставить сообщение в ящик.
    ///
    /// Уничтоженному подписчику сообщение не доставляется, ошибки нет. В
    /// режиме `Blocking` вызов ждёт, пока потребитель заберёт сообщение;
    /// уничтожение подписчика прерывает ожидание.
    pub async fn signal(
        &self,
        message: Arc<Message<P>>,
    ) -> Delivery {
        let mut closing = self.inner.closing.subscribe();

        let outbox = self.inner.outbox.read().await;
        let Some(tx) = outbox.as_ref() else {
            return Delivery::Destroyed;
        };
        if *closing.borrow() {
            return Delivery::Destroyed;
        }

        match self.inner.policy {
            DeliveryPolicy::Bounded { .. } => match tx.try_send(Envelope::buffered(message)) {
                Ok(()) => Delivery::Delivered,
                Err(TrySendError::Full(_)) => {
                    self.inner.overflowed.fetch_add(1, Ordering::Relaxed);
                    Delivery::Overflow
                }
                Err(TrySendError::Closed(_)) => Delivery::Destroyed,
            },
            DeliveryPolicy::Blocking => {
                let (envelope, mut accepted) = Envelope::handoff(message);
                let enqueued = tokio::select! {
                    biased;
                    _ = closing.wait_for(|closed| *closed) => false,
                    res = tx.send(envelope) => res.is_ok(),
                };
                drop(outbox);
                if !enqueued {
                    return Delivery::Destroyed;
                }

                tokio::select! {
                    biased;
                    res = &mut accepted => match res {
                        Ok(()) => Delivery::Delivered,
                        Err(_) => Delivery::Destroyed,
                    },
                    _ = closing.wait_for(|closed| *closed) => {
                        // После `close` потребитель уже не сможет подтвердить
                        // передачу и пропустит конверт; подтверждение,
                        // успевшее прийти раньше, засчитывается.
                        accepted.close();
                        match accepted.try_recv() {
                            Ok(()) => Delivery::Delivered,
                            Err(_) => Delivery::Destroyed,
                        }
                    }
                }
            }
        }
    }
}
