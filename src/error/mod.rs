pub mod pubsub;
pub mod settings;

pub use hubcast_error::{ErrorExt, IdentityError, StatusCode};
pub use pubsub::{RecvError, TryRecvError};
pub use settings::{LoggingError, SettingsError};
