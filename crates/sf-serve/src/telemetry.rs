use crate::AppState;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::{Sink, SinkExt, StreamExt};
use serde_json::json;
use sf_events::TelemetryEvent;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

pub const STREAM_PATH: &str = "/ws/telemetry";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(STREAM_PATH, get(ws_handler))
        .with_state(state)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Replies queued by the reader beyond this point wait for the writer.
const REPLY_BUFFER: usize = 16;

/// Why a connection's writer stopped.
#[derive(Debug, PartialEq, Eq)]
enum WriterEnd {
    Disconnected,
    Lagged(u64),
}

async fn handle_socket(stream: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = stream.split();
    let subscription = state.hub.attach().await;
    info!(event = "telemetry_attach", replay = subscription.replay.len());

    for event in &subscription.replay {
        if sender.send(text_message(event.to_json())).await.is_err() {
            return;
        }
    }
    let handshake = json!({ "type": "connected", "message": "Stillfrost telemetry stream active" });
    if sender.send(text_message(handshake.to_string())).await.is_err() {
        return;
    }

    let (replies, reply_rx) = mpsc::channel(REPLY_BUFFER);
    let mut writer = tokio::spawn(write_loop(sender, reply_rx, subscription.events));

    let reader = async {
        while let Some(Ok(msg)) = receiver.next().await {
            let text = match msg {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };
            let reply = match text.as_str() {
                "ping" => json!({ "type": "pong" }),
                "status" => {
                    let stats = state.hub.stats().await;
                    json!({ "type": "status", "data": stats })
                }
                _ => continue,
            };
            if replies.send(text_message(reply.to_string())).await.is_err() {
                break;
            }
        }
    };

    tokio::select! {
        end = &mut writer => {
            if let Ok(WriterEnd::Lagged(skipped)) = end {
                warn!(event = "telemetry_shed", skipped);
            }
        }
        () = reader => writer.abort(),
    }
    drop(subscription.guard);
    info!(event = "telemetry_detach");
}

/// Sole writer for one socket. Live events come straight off the broadcast
/// receiver, so a peer that stops reading falls behind the bus instead of
/// growing a queue; once it lags it is dropped.
async fn write_loop<S>(
    mut sink: S,
    mut replies: mpsc::Receiver<Message>,
    mut events: broadcast::Receiver<TelemetryEvent>,
) -> WriterEnd
where
    S: Sink<Message> + Unpin,
{
    loop {
        let message = tokio::select! {
            biased;
            reply = replies.recv() => match reply {
                Some(reply) => reply,
                None => return WriterEnd::Disconnected,
            },
            event = events.recv() => match event {
                Ok(event) => text_message(event.to_json()),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    return WriterEnd::Lagged(skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return WriterEnd::Disconnected,
            },
        };
        if sink.send(message).await.is_err() {
            debug!(event = "telemetry_send_failed");
            return WriterEnd::Disconnected;
        }
    }
}

fn text_message(value: String) -> Message {
    Message::Text(Utf8Bytes::from(value))
}
