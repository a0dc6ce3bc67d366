pub mod bus;
pub mod store;
pub mod types;

pub use crate::bus::EventBus;
pub use crate::store::EventStore;
pub use crate::types::{EventSource, RawEvent, TelemetryEvent};
