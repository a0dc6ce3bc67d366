use crate::buffer::FeedBuffer;
use crate::client::ConnectionState;
use crate::record::DisplayRecord;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

const UPDATE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedUpdate {
    Appended(DisplayRecord),
    State(ConnectionState),
}

struct ViewState {
    buffer: FeedBuffer,
    connection: ConnectionState,
}

/// Shared handle over the feed buffer.
///
/// The connection manager writes through it; renderers read snapshots and
/// subscribe to [`FeedUpdate`]s. Once sealed, every write is a no-op.
#[derive(Clone)]
pub struct FeedView {
    inner: Arc<Mutex<ViewState>>,
    updates: broadcast::Sender<FeedUpdate>,
}

impl FeedView {
    pub fn new(capacity: usize) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(ViewState {
                buffer: FeedBuffer::new(capacity),
                connection: ConnectionState::Connecting,
            })),
            updates,
        }
    }

    pub fn append(&self, record: DisplayRecord) -> bool {
        let appended = self.lock().buffer.append(record.clone());
        if appended {
            let _ = self.updates.send(FeedUpdate::Appended(record));
        }
        appended
    }

    pub fn records(&self) -> Vec<DisplayRecord> {
        self.lock().buffer.to_vec()
    }

    pub fn len(&self) -> usize {
        self.lock().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().buffer.is_empty()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.lock().connection
    }

    pub(crate) fn set_connection_state(&self, state: ConnectionState) {
        {
            let mut guard = self.lock();
            if guard.buffer.is_sealed() || guard.connection == state {
                return;
            }
            guard.connection = state;
        }
        let _ = self.updates.send(FeedUpdate::State(state));
    }

    pub fn seal(&self) {
        self.lock().buffer.seal();
    }

    pub fn is_sealed(&self) -> bool {
        self.lock().buffer.is_sealed()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedUpdate> {
        self.updates.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FeedView {
    fn default() -> Self {
        Self::new(crate::buffer::FEED_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Severity;

    #[tokio::test]
    async fn test_append_notifies_subscribers() {
        let view = FeedView::default();
        let mut updates = view.subscribe();
        let record = DisplayRecord::new("SYSTEM", "hello", Severity::Info);
        assert!(view.append(record.clone()));
        assert_eq!(updates.recv().await.unwrap(), FeedUpdate::Appended(record));
    }

    #[tokio::test]
    async fn test_state_changes_are_published_once() {
        let view = FeedView::default();
        let mut updates = view.subscribe();
        view.set_connection_state(ConnectionState::Connecting);
        view.set_connection_state(ConnectionState::Open);
        view.set_connection_state(ConnectionState::Open);
        assert_eq!(updates.recv().await.unwrap(), FeedUpdate::State(ConnectionState::Open));
        assert!(updates.try_recv().is_err());
    }

    #[test]
    fn test_sealed_view_ignores_writes() {
        let view = FeedView::default();
        view.seal();
        assert!(!view.append(DisplayRecord::new("SYSTEM", "late", Severity::Info)));
        view.set_connection_state(ConnectionState::Open);
        assert!(view.is_empty());
        assert_eq!(view.connection_state(), ConnectionState::Connecting);
    }
}
