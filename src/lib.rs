/// Broker configuration and layered settings loading.
pub mod config;
/// Common error types: mailbox receive errors, settings and logging errors.
pub mod error;
/// Logging setup (formatting, filters).
pub mod logging;
/// Pub/Sub: Broker, Subscriber, Message.
pub mod pubsub;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Broker configuration and delivery policy.
pub use config::{BrokerConfig, DeliveryMode, DeliveryPolicy, Settings};
/// Errors returned by the public API.
pub use error::{IdentityError, LoggingError, RecvError, SettingsError, TryRecvError};
/// Logging initialization.
pub use logging::{init_logging, LogFormat, LoggingConfig};
/// Core pub/sub types.
pub use pubsub::{
    Broker, BrokerStats, Delivery, Mailbox, Message, Subscriber, SubscriberId, ID_ENTROPY_BYTES,
};
