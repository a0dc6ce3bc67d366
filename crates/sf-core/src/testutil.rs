use crate::error::TransportError;
use crate::transport::{ConnectFuture, Connector};
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_stream::wrappers::UnboundedReceiverStream;

pub(crate) type FrameSender = mpsc::UnboundedSender<Result<String, TransportError>>;

enum Outcome {
    Refuse,
    Accept(mpsc::UnboundedReceiver<Result<String, TransportError>>),
}

#[derive(Default)]
struct Script {
    outcomes: VecDeque<Outcome>,
    attempts: Vec<Instant>,
}

/// Connector whose attempts follow a queued script. Attempts beyond the
/// script are refused.
#[derive(Clone, Default)]
pub(crate) struct ScriptedConnector {
    script: Arc<Mutex<Script>>,
}

impl ScriptedConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn refuse(&self) {
        self.script.lock().unwrap().outcomes.push_back(Outcome::Refuse);
    }

    /// Queues a successful attempt. Frames sent on the returned sender are
    /// delivered on the connection; dropping it closes the connection.
    pub(crate) fn accept(&self) -> FrameSender {
        let (tx, rx) = mpsc::unbounded_channel();
        self.script.lock().unwrap().outcomes.push_back(Outcome::Accept(rx));
        tx
    }

    pub(crate) fn attempts(&self) -> Vec<Instant> {
        self.script.lock().unwrap().attempts.clone()
    }
}

impl Connector for ScriptedConnector {
    fn connect(&self) -> ConnectFuture {
        let outcome = {
            let mut script = self.script.lock().unwrap();
            script.attempts.push(Instant::now());
            script.outcomes.pop_front()
        };
        Box::pin(async move {
            match outcome {
                Some(Outcome::Accept(rx)) => Ok(UnboundedReceiverStream::new(rx).boxed()),
                Some(Outcome::Refuse) | None => Err(TransportError::Connect {
                    reason: "connection refused".to_string(),
                }),
            }
        })
    }
}
