use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc,
};

use tokio::{
    runtime::Handle,
    sync::{Notify, Semaphore},
};

use super::{Delivery, Message, Subscriber};

/// Планировщик доставок.
///
/// Каждая пара (топик, подписчик) доставляется отдельной задачей tokio.
/// Брокер не ждёт доставок, но планировщик ведёт их учёт и, если задан
/// лимит, ограничивает число одновременно выполняющихся доставок.
#[derive(Debug)]
pub(crate) struct Dispatcher {
    limiter: Option<Arc<Semaphore>>,
    state: Arc<DispatchState>,
}

#[derive(Debug, Default)]
struct DispatchState {
    in_flight: AtomicUsize,
    idle: Notify,
    scheduled: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

/// Снимок счётчиков планировщика.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchCounters {
    pub scheduled: u64,
    pub delivered: u64,
    pub dropped: u64,
    pub in_flight: usize,
}

/// Уменьшает счётчик активных доставок при завершении задачи, в том числе
/// при панике внутри неё.
struct InFlightGuard(Arc<DispatchState>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

impl Dispatcher {
    pub(crate) fn new(max_in_flight: Option<usize>) -> Self {
        Self {
            limiter: max_in_flight.map(|limit| Arc::new(Semaphore::new(limit.max(1)))),
            state: Arc::new(DispatchState::default()),
        }
    }

    /// Планирует доставку в `runtime` и сразу возвращает управление.
    pub(crate) fn submit<P>(
        &self,
        runtime: &Handle,
        subscriber: Subscriber<P>,
        message: Arc<Message<P>>,
    ) where
        P: Send + Sync + 'static,
    {
        self.state.in_flight.fetch_add(1, Ordering::AcqRel);
        self.state.scheduled.fetch_add(1, Ordering::Relaxed);

        let guard = InFlightGuard(Arc::clone(&self.state));
        let limiter = self.limiter.clone();

        runtime.spawn(async move {
            // Семафор никогда не закрывается, поэтому `ok()` всегда `Some`.
            let _permit = match limiter {
                Some(limiter) => limiter.acquire_owned().await.ok(),
                None => None,
            };

            let outcome = subscriber.signal(Arc::clone(&message)).await;
            match outcome {
                Delivery::Delivered => {
                    guard.0.delivered.fetch_add(1, Ordering::Relaxed);
                }
                Delivery::Destroyed | Delivery::Overflow => {
                    guard.0.dropped.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        topic = message.topic(),
                        subscriber = %subscriber.id(),
                        ?outcome,
                        "delivery dropped"
                    );
                }
            }
            tracing::trace!(
                topic = message.topic(),
                subscriber = %subscriber.id(),
                ?outcome,
                latency_us = message.age().as_micros() as u64,
                "delivery finished"
            );
        });
    }

    pub(crate) fn counters(&self) -> DispatchCounters {
        DispatchCounters {
            scheduled: self.state.scheduled.load(Ordering::Relaxed),
            delivered: self.state.delivered.load(Ordering::Relaxed),
            dropped: self.state.dropped.load(Ordering::Relaxed),
            in_flight: self.state.in_flight.load(Ordering::Acquire),
        }
    }

    /// Ждёт, пока не останется незавершённых доставок.
    pub(crate) async fn wait_idle(&self) {
        loop {
            let notified = self.state.idle.notified();
            tokio::pin!(notified);
            // Регистрируемся до проверки счётчика, чтобы не потерять
            // пробуждение.
            notified.as_mut().enable();

            if self.state.in_flight.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::config::DeliveryPolicy;

    fn message(payload: u32) -> Arc<Message<u32>> {
        Arc::new(Message::new(Arc::from("A"), Arc::new(payload)))
    }

    /// Тест проверяет учёт доставок и ожидание их завершения.
    #[tokio::test]
    async fn test_counts_and_wait_idle() {
        let dispatcher = Dispatcher::new(None);
        let sub = Subscriber::<u32>::create(DeliveryPolicy::Bounded { capacity: 8 }).unwrap();

        for i in 0..3 {
            dispatcher.submit(&Handle::current(), sub.clone(), message(i));
        }
        timeout(Duration::from_secs(1), dispatcher.wait_idle())
            .await
            .expect("доставки должны завершиться");

        let counters = dispatcher.counters();
        assert_eq!(counters.scheduled, 3);
        assert_eq!(counters.delivered, 3);
        assert_eq!(counters.dropped, 0);
        assert_eq!(counters.in_flight, 0);
    }

    /// Тест проверяет, что `submit` не ждёт доставки даже при
    /// заблокированном потребителе.
    #[tokio::test]
    async fn test_submit_does_not_block_on_slow_consumer() {
        let dispatcher = Dispatcher::new(None);
        let sub = Subscriber::<u32>::create(DeliveryPolicy::Blocking).unwrap();

        for i in 0..10 {
            dispatcher.submit(&Handle::current(), sub.clone(), message(i));
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(dispatcher.counters().in_flight, 10);

        sub.destroy().await;
        timeout(Duration::from_secs(1), dispatcher.wait_idle())
            .await
            .expect("уничтожение должно освободить доставки");
        assert_eq!(dispatcher.counters().dropped, 10);
    }

    /// Тест проверяет, что лимит ограничивает число одновременно
    /// выполняющихся доставок, а остальные ждут разрешения.
    #[tokio::test]
    async fn test_in_flight_limit() {
        let dispatcher = Dispatcher::new(Some(1));
        let slow = Subscriber::<u32>::create(DeliveryPolicy::Blocking).unwrap();
        let fast = Subscriber::<u32>::create(DeliveryPolicy::Bounded { capacity: 8 }).unwrap();

        // Первая доставка занимает единственное разрешение и висит.
        dispatcher.submit(&Handle::current(), slow.clone(), message(1));
        tokio::time::sleep(Duration::from_millis(20)).await;
        dispatcher.submit(&Handle::current(), fast.clone(), message(2));
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(fast.messages().try_recv().is_err(), "вторая доставка ждёт разрешения");

        // Потребитель забирает сообщение, разрешение освобождается.
        assert_eq!(*slow.messages().recv().await.unwrap().payload(), 1);
        let got = timeout(Duration::from_secs(1), fast.messages().recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*got.payload(), 2);
        dispatcher.wait_idle().await;
    }
}
