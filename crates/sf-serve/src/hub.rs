use serde::Serialize;
use serde_json::Value;
use sf_core::ServeConfig;
use sf_events::{EventBus, EventSource, EventStore, TelemetryEvent};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

pub(crate) const BUS_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TelemetryStats {
    pub active_connections: usize,
    pub events_buffered: usize,
    pub buffer_size: usize,
}

/// Fans telemetry out to every connected socket and keeps a bounded history
/// for late joiners.
pub struct TelemetryHub {
    bus: EventBus,
    history: Mutex<EventStore>,
    replay_size: usize,
    active: AtomicUsize,
}

/// A freshly attached connection: the history to replay, the live feed, and a
/// guard that deregisters the connection when dropped.
pub struct Subscription {
    pub replay: Vec<TelemetryEvent>,
    pub events: broadcast::Receiver<TelemetryEvent>,
    pub guard: ConnectionGuard,
}

pub struct ConnectionGuard {
    hub: Arc<TelemetryHub>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.hub.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl TelemetryHub {
    pub fn new(history_size: usize, replay_size: usize) -> Self {
        Self {
            bus: EventBus::new(BUS_CAPACITY),
            history: Mutex::new(EventStore::new(history_size)),
            replay_size,
            active: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &ServeConfig) -> Self {
        Self::new(config.history_size, config.replay_size)
    }

    /// Records the event and publishes it. History and publication happen
    /// under one lock so an attaching socket never misses or reorders events.
    pub async fn broadcast(&self, source: EventSource, data: Value) -> TelemetryEvent {
        let event = TelemetryEvent::new(source, data);
        let mut history = self.history.lock().await;
        history.append(event.clone());
        self.bus.publish(event.clone());
        event
    }

    pub async fn attach(self: &Arc<Self>) -> Subscription {
        let history = self.history.lock().await;
        let events = self.bus.subscribe();
        let replay = history.recent(self.replay_size);
        self.active.fetch_add(1, Ordering::SeqCst);
        Subscription {
            replay,
            events,
            guard: ConnectionGuard { hub: Arc::clone(self) },
        }
    }

    pub async fn stats(&self) -> TelemetryStats {
        let history = self.history.lock().await;
        TelemetryStats {
            active_connections: self.active.load(Ordering::SeqCst),
            events_buffered: history.len(),
            buffer_size: history.capacity(),
        }
    }
}
