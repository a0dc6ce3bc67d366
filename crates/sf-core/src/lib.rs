pub mod buffer;
pub mod client;
pub mod config;
pub mod demo;
pub mod error;
pub mod formatter;
pub mod record;
pub mod transport;
pub mod view;

#[cfg(test)]
pub(crate) mod testutil;

pub use crate::client::{ConnectionState, FeedClient, FeedHandle};
pub use crate::config::{FeedConfig, ServeConfig, Settings};
pub use crate::error::{ConfigError, TransportError};
pub use crate::record::{DisplayRecord, Severity};
pub use crate::view::{FeedUpdate, FeedView};
