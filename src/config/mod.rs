pub mod broker;
pub mod settings;

pub use broker::{BrokerConfig, DeliveryPolicy};
pub use settings::{DeliveryMode, Settings};
