pub mod demo_loop;
pub mod hub;
pub mod routes;
pub mod telemetry;

use axum::Router;
use hub::TelemetryHub;
use serde_json::json;
use sf_core::ServeConfig;
use sf_events::EventSource;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub const AGENTS: [&str; 5] = ["Governor", "Scout", "Gatekeeper", "Forge", "Signal"];

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<TelemetryHub>,
    pub config: ServeConfig,
}

impl AppState {
    pub fn new(config: ServeConfig) -> Self {
        Self {
            hub: Arc::new(TelemetryHub::from_config(&config)),
            config,
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(telemetry::router(state.clone()))
        .merge(routes::router(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn announce_startup(hub: &TelemetryHub) {
    hub.broadcast(
        EventSource::System,
        json!({
            "type": "startup",
            "message": "Stillfrost agents initialized",
            "agents": AGENTS,
        }),
    )
    .await;
}

pub async fn announce_shutdown(hub: &TelemetryHub) {
    hub.broadcast(
        EventSource::System,
        json!({ "type": "shutdown", "message": "Stillfrost agents shutting down" }),
    )
    .await;
}

/// Binds, announces startup, and serves until `shutdown` resolves.
pub async fn serve<F>(state: AppState, shutdown: F) -> Result<(), ServeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = TcpListener::bind(addr.as_str())
        .await
        .map_err(|source| ServeError::Bind { addr: addr.clone(), source })?;
    info!(event = "serve_listening", addr = %listener.local_addr()?);

    announce_startup(&state.hub).await;
    if state.config.demo {
        let demo_state = state.clone();
        tokio::spawn(async move { demo_loop::run(demo_state).await });
    }

    let hub = Arc::clone(&state.hub);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(async move {
            shutdown.await;
            announce_shutdown(&hub).await;
            info!(event = "serve_shutdown");
        })
        .await?;
    Ok(())
}
