use crate::hub::TelemetryStats;
use crate::AppState;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub firm: &'static str,
    pub status: &'static str,
    pub telemetry: TelemetryStats,
    pub timestamp: DateTime<Utc>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/telemetry/stats", get(stats))
        .with_state(state)
}

pub(crate) async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        firm: "Stillfrost",
        status: "operational",
        telemetry: state.hub.stats().await,
        timestamp: Utc::now(),
    })
}

pub(crate) async fn stats(State(state): State<AppState>) -> Json<TelemetryStats> {
    Json(state.hub.stats().await)
}

#[cfg(test)]
mod tests {
    use crate::{app, AppState};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use sf_core::ServeConfig;
    use sf_events::EventSource;
    use tower::ServiceExt;

    async fn get_json(state: AppState, uri: &str) -> Value {
        let response = app(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_stats_reflect_history() {
        let state = AppState::new(ServeConfig::default());
        state.hub.broadcast(EventSource::Systems, json!({ "type": "health_check" })).await;
        state.hub.broadcast(EventSource::Logic, json!({ "type": "optimization" })).await;

        let stats = get_json(state, "/api/telemetry/stats").await;
        assert_eq!(
            stats,
            json!({ "active_connections": 0, "events_buffered": 2, "buffer_size": 100 })
        );
    }

    #[tokio::test]
    async fn test_status_reports_operational() {
        let state = AppState::new(ServeConfig::default());
        let status = get_json(state, "/api/status").await;
        assert_eq!(status["status"], "operational");
        assert_eq!(status["telemetry"]["buffer_size"], 100);
        assert!(status["timestamp"].is_string());
    }
}
