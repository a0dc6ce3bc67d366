use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
}

impl Severity {
    /// Classifies an event type string. Warning keywords win over success
    /// keywords, so `approval_error` is a warning.
    pub fn classify(kind: &str) -> Self {
        if kind.contains("error") || kind.contains("rejected") {
            Severity::Warning
        } else if kind.contains("approved") || kind.contains("completed") {
            Severity::Success
        } else {
            Severity::Info
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
        }
    }
}

/// A normalized, render-ready feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRecord {
    pub source: String,
    pub text: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl DisplayRecord {
    pub fn new(source: impl Into<String>, text: impl Into<String>, severity: Severity) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
            severity,
            timestamp: None,
        }
    }
}
