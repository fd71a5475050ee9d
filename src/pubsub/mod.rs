//! Подсистема Publish–Subscribe (pub/sub).
//!
//! Внутрипроцессный брокер: подписчики регистрируются в брокере,
//! подписываются на топики по точному имени и получают сообщения через
//! собственный почтовый ящик.
//!
//! - `broker`: реестр подписчиков, индекс топиков и рассылка.
//! - `dispatch` (приватный): планирование доставок отдельными задачами.
//! - `identity`: генерация идентификаторов подписчиков.
//! - `mailbox`: потребительская сторона почтового ящика.
//! - `message`: неизменяемое сообщение, общее для всех получателей топика.
//! - `subscriber`: подписчик, его топики и доставка в ящик.

pub mod broker;
mod dispatch;
pub mod identity;
pub mod mailbox;
pub mod message;
pub mod subscriber;

pub use broker::{Broker, BrokerStats};
pub use dispatch::DispatchCounters;
pub use identity::{SubscriberId, ID_ENTROPY_BYTES};
pub use mailbox::Mailbox;
pub use message::Message;
pub use subscriber::{Delivery, Subscriber};
