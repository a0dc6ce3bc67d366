use crate::record::{DisplayRecord, Severity};
use serde_json::Value;
use sf_events::RawEvent;

pub const DEFAULT_SOURCE: &str = "SYSTEM";
pub const DEFAULT_KIND: &str = "info";
pub const FALLBACK_TEXT_LIMIT: usize = 100;

/// Handshake and keepalive markers sent by the broadcaster.
const CONTROL_KINDS: [&str; 2] = ["connected", "pong"];

/// Normalizes an inbound event into a display record.
///
/// Returns `None` only for protocol control messages. Every other input,
/// however malformed, produces a record.
pub fn format(raw: &RawEvent) -> Option<DisplayRecord> {
    let kind = raw.kind().unwrap_or(DEFAULT_KIND);
    if CONTROL_KINDS.contains(&kind) {
        return None;
    }

    Some(DisplayRecord {
        source: raw.source().unwrap_or(DEFAULT_SOURCE).to_uppercase(),
        text: describe(raw, kind),
        severity: Severity::classify(kind),
        timestamp: raw.timestamp().map(str::to_string),
    })
}

fn describe(raw: &RawEvent, kind: &str) -> String {
    if let Some(message) = raw.data_field("message").and_then(text_of) {
        return message;
    }

    let field = |key: &str| raw.data_field(key).and_then(text_of);
    let field_or = |key: &str, default: &str| field(key).unwrap_or_else(|| default.to_string());

    match kind {
        "review_cycle" => format!("Review cycle status: {}", field_or("status", "active")),
        "scanning" => format!("Scanning sectors: {}", joined(raw.data_field("sectors"))),
        "optimization" => format!(
            "Portfolio optimization in progress. Sharpe target: {}",
            field_or("sharpe_target", "1.8")
        ),
        "health_check" => {
            if raw.data_field("all_nominal").is_some_and(truthy) {
                "All systems nominal".to_string()
            } else {
                "Health check in progress".to_string()
            }
        }
        "report_scheduled" => format!("Next report scheduled: {}", field_or("next", "pending")),
        "action_approved" => {
            let friction = raw
                .data_field("friction_score")
                .and_then(Value::as_f64)
                .map(|score| format!("{score:.2}"))
                .unwrap_or_else(|| "N/A".to_string());
            format!(
                "Action from {} approved. Friction: {friction}",
                field_or("agent", "agent")
            )
        }
        "action_rejected" => format!(
            "Action from {} REJECTED. {}",
            field_or("agent", "agent"),
            field_or("reason", "")
        ),
        "workflow_started" => format!(
            "Workflow {} initiated: {}",
            field_or("task_id", ""),
            field_or("task_type", "")
        ),
        "workflow_completed" => {
            let outcome = if raw.data_field("success").is_some_and(truthy) {
                "completed successfully"
            } else {
                "terminated"
            };
            format!("Workflow {} {outcome}", field_or("task_id", ""))
        }
        "phase_started" => format!("Entering phase: {}", field_or("phase", "processing")),
        "research_started" | "research_completed" => {
            let verb = if kind.contains("started") {
                "initiated"
            } else {
                "completed"
            };
            format!("Research {verb}: {}", field_or("topic", ""))
        }
        _ => fallback(raw),
    }
}

/// Compact JSON of the payload, or of the whole event when the payload is
/// empty, capped at [`FALLBACK_TEXT_LIMIT`] characters.
fn fallback(raw: &RawEvent) -> String {
    let target = raw.data().filter(|data| truthy(data)).unwrap_or(raw.as_value());
    let json = serde_json::to_string(target).unwrap_or_default();
    json.chars().take(FALLBACK_TEXT_LIMIT).collect()
}

/// Renders a scalar for interpolation. Empty strings, zero, false and null
/// count as absent so that template defaults apply.
fn text_of(value: &Value) -> Option<String> {
    if !truthy(value) {
        return None;
    }
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number_text(number)),
        other => Some(other.to_string()),
    }
}

fn joined(value: Option<&Value>) -> String {
    let Some(Value::Array(items)) = value else {
        return String::new();
    };
    items
        .iter()
        .map(|item| match item {
            Value::Null => String::new(),
            Value::String(text) => text.clone(),
            Value::Number(number) => number_text(number),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn number_text(number: &serde_json::Number) -> String {
    match number.as_f64() {
        Some(float) if float.fract() == 0.0 && float.abs() < 1e15 => format!("{}", float as i64),
        _ => number.to_string(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number
            .as_f64()
            .is_some_and(|float| float != 0.0 && !float.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
