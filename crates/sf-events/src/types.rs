use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ulid::Ulid;

/// Agent or subsystem that produced a telemetry event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    System,
    Oversight,
    Intelligence,
    Logic,
    Systems,
    Reach,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::System => "system",
            EventSource::Oversight => "oversight",
            EventSource::Intelligence => "intelligence",
            EventSource::Logic => "logic",
            EventSource::Systems => "systems",
            EventSource::Reach => "reach",
        }
    }
}

/// A telemetry frame as emitted by the broadcaster.
///
/// The `type` field mirrors `data.type` so that consumers can classify the
/// event without looking inside the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub id: String,
    pub source: EventSource,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl TelemetryEvent {
    pub fn new(source: EventSource, data: Value) -> Self {
        let kind = data
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("info")
            .to_string();
        Self {
            id: format!("evt_{}", Ulid::new()),
            source,
            kind,
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// An inbound telemetry frame of unknown shape.
///
/// Nothing about the payload is trusted: every accessor returns `None` when the
/// field is missing, null, or of the wrong type.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent(Value);

impl RawEvent {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text).map(Self)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn source(&self) -> Option<&str> {
        non_empty_str(self.0.get("source"))
    }

    /// Top-level `type`, falling back to `data.type`.
    pub fn kind(&self) -> Option<&str> {
        non_empty_str(self.0.get("type")).or_else(|| non_empty_str(self.data_field("type")))
    }

    pub fn timestamp(&self) -> Option<&str> {
        non_empty_str(self.0.get("timestamp"))
    }

    /// The `data` object, if present and not null.
    pub fn data(&self) -> Option<&Value> {
        self.0.get("data").filter(|value| !value.is_null())
    }

    pub fn data_field(&self, key: &str) -> Option<&Value> {
        self.data()
            .and_then(|data| data.get(key))
            .filter(|value| !value.is_null())
    }
}

impl From<Value> for RawEvent {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_telemetry_event_kind_from_data() {
        let event = TelemetryEvent::new(EventSource::Reach, json!({ "type": "report_scheduled" }));
        assert_eq!(event.kind, "report_scheduled");

        let untyped = TelemetryEvent::new(EventSource::System, json!({ "message": "hi" }));
        assert_eq!(untyped.kind, "info");
    }

    #[test]
    fn test_telemetry_event_wire_shape() {
        let event = TelemetryEvent::new(EventSource::Oversight, json!({ "type": "thought" }));
        let value: Value = serde_json::from_str(&event.to_json()).unwrap();
        assert_eq!(value["source"], "oversight");
        assert_eq!(value["type"], "thought");
        assert_eq!(value["data"]["type"], "thought");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_raw_event_accessors_tolerate_wrong_types() {
        let raw = RawEvent::from(json!({
            "source": 7,
            "type": "",
            "data": { "type": "scanning" }
        }));
        assert_eq!(raw.source(), None);
        assert_eq!(raw.kind(), Some("scanning"));
        assert_eq!(raw.timestamp(), None);

        let raw = RawEvent::from(json!({ "data": null }));
        assert!(raw.data().is_none());
        assert!(raw.data_field("message").is_none());
    }

    #[test]
    fn test_raw_event_non_object_root() {
        let raw = RawEvent::parse("[1, 2]").unwrap();
        assert_eq!(raw.source(), None);
        assert_eq!(raw.kind(), None);
        assert!(raw.data().is_none());
    }
}
