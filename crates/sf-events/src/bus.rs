use crate::types::TelemetryEvent;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<TelemetryEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TelemetryEvent> {
        self.sender.subscribe()
    }

    /// Fans the event out to every subscriber. Returns the number of receivers
    /// reached; zero when nobody is listening.
    pub fn publish(&self, event: TelemetryEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}
