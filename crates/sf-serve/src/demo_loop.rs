use crate::AppState;
use serde_json::{json, Value};
use sf_events::EventSource;
use tracing::debug;

fn script() -> Vec<(EventSource, Value)> {
    vec![
        (
            EventSource::Oversight,
            json!({
                "type": "thought",
                "message": "Initiating governance review cycle...",
                "phase": "review_start"
            }),
        ),
        (
            EventSource::Intelligence,
            json!({
                "type": "thought",
                "message": "Scanning emerging tech sectors for opportunities...",
                "phase": "scanning"
            }),
        ),
        (
            EventSource::Logic,
            json!({
                "type": "tool_call",
                "tool": "portfolio_optimizer",
                "args": { "sharpe_target": 1.8 }
            }),
        ),
        (
            EventSource::Systems,
            json!({
                "type": "thought",
                "message": "Running infrastructure health check...",
                "phase": "monitoring"
            }),
        ),
        (
            EventSource::Oversight,
            json!({ "type": "review_cycle", "status": "active", "active_directives": 0 }),
        ),
        (
            EventSource::Intelligence,
            json!({ "type": "scanning", "sectors": ["tech", "healthcare", "fintech"] }),
        ),
        (
            EventSource::Logic,
            json!({ "type": "optimization", "sharpe_target": 1.8, "status": "optimizing" }),
        ),
        (
            EventSource::Systems,
            json!({ "type": "health_check", "all_nominal": true }),
        ),
        (
            EventSource::Reach,
            json!({ "type": "report_scheduled", "next": "daily", "pending_count": 0 }),
        ),
    ]
}

/// Event number `index` of the endless demo cycle.
pub fn demo_event(index: usize) -> (EventSource, Value) {
    let mut events = script();
    let len = events.len();
    let (source, mut data) = events.swap_remove(index % len);
    data["pending_actions"] = json!(0);
    (source, data)
}

pub async fn run(state: AppState) {
    tokio::time::sleep(state.config.demo_start_delay()).await;
    let mut interval = tokio::time::interval(state.config.demo_interval());
    let mut index = 0usize;
    loop {
        interval.tick().await;
        let (source, data) = demo_event(index);
        let event = state.hub.broadcast(source, data).await;
        debug!(event = "demo_broadcast", kind = %event.kind, source = source.as_str());
        index = index.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::ServeConfig;
    use std::time::Duration;

    #[test]
    fn test_demo_event_cycles() {
        let (source, data) = demo_event(0);
        assert_eq!(source, EventSource::Oversight);
        assert_eq!(data["type"], "thought");
        assert_eq!(data["pending_actions"], 0);

        let (source, data) = demo_event(9 + 8);
        assert_eq!(source, EventSource::Reach);
        assert_eq!(data["type"], "report_scheduled");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_waits_then_broadcasts_on_cadence() {
        let state = AppState::new(ServeConfig::default());
        let task = tokio::spawn(run(state.clone()));

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert_eq!(state.hub.stats().await.events_buffered, 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(state.hub.stats().await.events_buffered, 1);

        tokio::time::sleep(Duration::from_secs(8)).await;
        assert_eq!(state.hub.stats().await.events_buffered, 3);
        task.abort();
    }
}
