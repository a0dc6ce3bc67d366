use crate::config::FeedConfig;
use crate::demo::DemoGenerator;
use crate::error::TransportError;
use crate::formatter;
use crate::record::{DisplayRecord, Severity};
use crate::transport::{ConnectFuture, Connector, FrameStream};
use crate::view::FeedView;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use sf_events::RawEvent;
use std::pin::Pin;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior, Sleep};
use tracing::{debug, info, warn};

pub const CONNECTED_TEXT: &str = "Telemetry stream connected. Receiving live agent data.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    pub fn is_live(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }
}

enum Phase {
    Idle,
    Connecting(ConnectFuture),
    Open(FrameStream),
    Closed(Pin<Box<Sleep>>),
    TornDown,
}

/// Whatever woke the client up. Produced by [`FeedClient::next_wake`] and
/// consumed by [`FeedClient::apply`].
pub(crate) enum Wake {
    Opened(FrameStream),
    ConnectFailed(TransportError),
    Frame(String),
    Dropped(Option<TransportError>),
    DemoTick,
    ReconnectDue,
}

/// Live telemetry consumer with demo fallback.
///
/// Owns the transport, the reconnect timer and the demo timer. Exactly one
/// of {open stream, demo timer} exists at any time; [`FeedClient::teardown`]
/// drops all of them and seals the view.
pub struct FeedClient<C> {
    connector: C,
    config: FeedConfig,
    view: FeedView,
    demo: DemoGenerator,
    phase: Phase,
    demo_timer: Option<Interval>,
}

impl<C: Connector> FeedClient<C> {
    pub fn new(connector: C, config: FeedConfig, view: FeedView) -> Self {
        Self {
            connector,
            config,
            view,
            demo: DemoGenerator::new(),
            phase: Phase::Idle,
            demo_timer: None,
        }
    }

    pub fn view(&self) -> &FeedView {
        &self.view
    }

    pub fn state(&self) -> ConnectionState {
        match self.phase {
            Phase::Idle | Phase::Connecting(_) => ConnectionState::Connecting,
            Phase::Open(_) => ConnectionState::Open,
            Phase::Closed(_) | Phase::TornDown => ConnectionState::Closed,
        }
    }

    pub fn is_torn_down(&self) -> bool {
        matches!(self.phase, Phase::TornDown)
    }

    pub(crate) fn demo_active(&self) -> bool {
        self.demo_timer.is_some()
    }

    /// Makes the first connection attempt and arms the demo timer. Must be
    /// called from within a tokio runtime; later calls do nothing.
    pub fn start(&mut self) {
        if !matches!(self.phase, Phase::Idle) {
            return;
        }
        info!(event = "feed_start", endpoint = %self.config.endpoint());
        self.resume_demo();
        self.enter_connecting();
    }

    /// Drops the transport and both timers and seals the view. Nothing the
    /// client does afterwards can reach the buffer.
    pub fn teardown(&mut self) {
        if self.is_torn_down() {
            return;
        }
        self.view.seal();
        self.phase = Phase::TornDown;
        self.demo_timer = None;
        info!(event = "feed_teardown", demo_cursor = self.demo.cursor());
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        self.start();
        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                wake = self.next_wake() => self.apply(wake),
            }
        }
        self.teardown();
    }

    pub fn spawn(self) -> FeedHandle {
        let view = self.view.clone();
        let (shutdown, receiver) = watch::channel(false);
        let task = tokio::spawn(self.run(receiver));
        FeedHandle {
            view,
            shutdown,
            task: Some(task),
        }
    }

    /// Waits for the next transport event or timer expiry. Pending forever
    /// before `start` and after `teardown`.
    pub(crate) async fn next_wake(&mut self) -> Wake {
        let demo_timer = &mut self.demo_timer;
        match &mut self.phase {
            Phase::Connecting(attempt) => tokio::select! {
                biased;
                result = attempt => match result {
                    Ok(frames) => Wake::Opened(frames),
                    Err(err) => Wake::ConnectFailed(err),
                },
                _ = demo_tick(demo_timer) => Wake::DemoTick,
            },
            Phase::Open(frames) => match frames.next().await {
                Some(Ok(text)) => Wake::Frame(text),
                Some(Err(err)) => Wake::Dropped(Some(err)),
                None => Wake::Dropped(None),
            },
            Phase::Closed(delay) => tokio::select! {
                biased;
                _ = delay.as_mut() => Wake::ReconnectDue,
                _ = demo_tick(demo_timer) => Wake::DemoTick,
            },
            Phase::Idle | Phase::TornDown => std::future::pending().await,
        }
    }

    pub(crate) fn apply(&mut self, wake: Wake) {
        if matches!(self.phase, Phase::Idle | Phase::TornDown) {
            return;
        }
        match wake {
            Wake::Opened(frames) => self.enter_open(frames),
            Wake::ConnectFailed(err) => {
                warn!(
                    event = "feed_connect_failed",
                    endpoint = %self.config.endpoint(),
                    error = %err
                );
                self.enter_closed();
            }
            Wake::Frame(text) => self.accept_frame(&text),
            Wake::Dropped(Some(err)) => {
                warn!(event = "feed_dropped", error = %err);
                self.enter_closed();
            }
            Wake::Dropped(None) => {
                info!(event = "feed_closed");
                self.enter_closed();
            }
            Wake::DemoTick => {
                if self.demo_active() {
                    let record = self.demo.next_record();
                    self.view.append(record);
                }
            }
            Wake::ReconnectDue => self.enter_connecting(),
        }
    }

    fn enter_connecting(&mut self) {
        self.phase = Phase::Connecting(self.connector.connect());
        self.view.set_connection_state(ConnectionState::Connecting);
    }

    fn enter_open(&mut self, frames: FrameStream) {
        self.demo_timer = None;
        self.phase = Phase::Open(frames);
        self.view.set_connection_state(ConnectionState::Open);
        self.view.append(DisplayRecord::new("SYSTEM", CONNECTED_TEXT, Severity::Success));
        info!(event = "feed_open", endpoint = %self.config.endpoint());
    }

    fn enter_closed(&mut self) {
        let delay = self.config.reconnect_delay();
        self.phase = Phase::Closed(Box::pin(time::sleep(delay)));
        self.view.set_connection_state(ConnectionState::Closed);
        self.resume_demo();
        debug!(event = "feed_reconnect_scheduled", delay_ms = delay.as_millis() as u64);
    }

    fn resume_demo(&mut self) {
        if self.demo_timer.is_some() {
            return;
        }
        let period = self.config.demo_interval();
        let mut timer = time::interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.demo_timer = Some(timer);
    }

    fn accept_frame(&mut self, text: &str) {
        let raw = match RawEvent::parse(text) {
            Ok(raw) => raw,
            Err(err) => {
                debug!(event = "feed_frame_dropped", error = %err);
                return;
            }
        };
        if let Some(record) = formatter::format(&raw) {
            self.view.append(record);
        }
    }
}

async fn demo_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Handle to a spawned [`FeedClient`]. Dropping it tears the client down.
pub struct FeedHandle {
    view: FeedView,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl FeedHandle {
    pub fn view(&self) -> &FeedView {
        &self.view
    }

    pub async fn shutdown(mut self) {
        self.view.seal();
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.view.seal();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
