use std::{
    sync::Arc,
    time::{Duration, Instant},
};

/// Неизменяемое сообщение, доставляемое подписчикам.
///
/// Брокер создаёт ровно одно сообщение на пару (вызов `broadcast`, топик) и
/// раздаёт его всем получателям этого топика через `Arc<Message<P>>`.
#[derive(Debug)]
pub struct Message<P> {
    topic: Arc<str>,
    payload: Arc<P>,
    created_at: Instant,
}

impl<P> Message<P> {
    pub fn new(
        topic: Arc<str>,
        payload: Arc<P>,
    ) -> Self {
        Self {
            topic,
            payload,
            created_at: Instant::now(),
        }
    }

    /// Имя топика, в который было опубликовано сообщение.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Полезная нагрузка. Брокер её не интерпретирует.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Момент создания (монотонные часы).
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Сколько времени прошло с момента создания.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}
