use std::{sync::Arc, time::Duration};

use tokio::sync::{mpsc, oneshot, Mutex};

use super::Message;
use crate::{
    config::DeliveryPolicy,
    error::{RecvError, TryRecvError},
};

/// Элемент очереди почтового ящика.
///
/// В режиме `Blocking` несёт `ack`: доставляющая задача ждёт его, пока
/// потребитель не заберёт сообщение.
pub(crate) struct Envelope<P> {
    message: Arc<Message<P>>,
    ack: Option<oneshot::Sender<()>>,
}

impl<P> Envelope<P> {
    /// Конверт для синхронной передачи и приёмник подтверждения.
    pub(crate) fn handoff(message: Arc<Message<P>>) -> (Self, oneshot::Receiver<()>) {
        let (ack, accepted) = oneshot::channel();
        (
            Self {
                message,
                ack: Some(ack),
            },
            accepted,
        )
    }

    pub(crate) fn buffered(message: Arc<Message<P>>) -> Self {
        Self { message, ack: None }
    }

    /// Забирает сообщение из конверта.
    ///
    /// Возвращает `None` для передачи, от которой доставляющая задача уже
    /// отказалась (подписчик уничтожен): такая доставка учтена как
    /// отброшенная и потребителю не отдаётся.
    fn accept(mut self) -> Option<Arc<Message<P>>> {
        match self.ack.take() {
            Some(ack) => ack.send(()).ok().map(|()| self.message),
            None => Some(self.message),
        }
    }
}

/// Создаёт очередь почтового ящика под политику доставки.
///
/// Для `Blocking` буфер на одно место плюс подтверждение дают передачу из
/// рук в руки: следующий конверт попадёт в очередь только после того, как
/// потребитель забрал предыдущий.
pub(crate) fn channel<P>(policy: DeliveryPolicy) -> (mpsc::Sender<Envelope<P>>, Mailbox<P>) {
    let capacity = match policy {
        DeliveryPolicy::Blocking => 1,
        DeliveryPolicy::Bounded { capacity } => capacity.max(1),
    };
    let (tx, rx) = mpsc::channel(capacity);
    (
        tx,
        Mailbox {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Потребительская сторона почтового ящика подписчика.
///
/// Клоны разделяют одну очередь: каждое сообщение получит ровно один из
/// читателей. После уничтожения подписчика ящик отдаёт то, что уже было в
/// очереди, и затем считается исчерпанным.
pub struct Mailbox<P> {
    rx: Arc<Mutex<mpsc::Receiver<Envelope<P>>>>,
}

impl<P> Clone for Mailbox<P> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<P> std::fmt::Debug for Mailbox<P> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Mailbox").finish_non_exhaustive()
    }
}

impl<P> Mailbox<P> {
    /// Ожидает следующее сообщение.
    ///
    /// Возвращает `None`, когда подписчик уничтожен и очередь пуста.
    /// Передачи, брошенные при уничтожении, пропускаются.
    pub async fn recv(&self) -> Option<Arc<Message<P>>> {
        let mut rx = self.rx.lock().await;
        while let Some(envelope) = rx.recv().await {
            if let Some(message) = envelope.accept() {
                return Some(message);
            }
        }
        None
    }

    /// Пытается получить сообщение без ожидания.
    ///
    /// Если очередь прямо сейчас читает другой клон, возвращает
    /// `TryRecvError::Empty`.
    pub fn try_recv(&self) -> Result<Arc<Message<P>>, TryRecvError> {
        let mut rx = self.rx.try_lock().map_err(|_| TryRecvError::Empty)?;
        loop {
            if let Some(message) = rx.try_recv()?.accept() {
                return Ok(message);
            }
        }
    }

    /// Ожидает следующее сообщение не дольше `timeout`.
    pub async fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Arc<Message<P>>, RecvError> {
        match tokio::time::timeout(timeout, self.recv()).await {
            Ok(Some(message)) => Ok(message),
            Ok(None) => Err(RecvError::Closed),
            Err(_) => Err(RecvError::Timeout),
        }
    }
}
