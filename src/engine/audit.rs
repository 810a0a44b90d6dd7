//! engine::audit
//!
//! The audit trail: an ordered list of log entries describing what a push
//! or analysis did, returned to the caller next to the result.
//!
//! # Design
//!
//! The trail is data, not process logging. Callers get it back on success
//! ([`Traced`]) and on failure ([`TracedError`]) and decide what to do with
//! it; the HTTP endpoint returns it as the `logs` array. Every appended
//! entry is also mirrored to `tracing` so operators see the same events.
//!
//! # Example
//!
//! ```
//! use repomirror::engine::audit::{AuditTrail, LogKind};
//! use serde_json::json;
//!
//! let mut trail = AuditTrail::new();
//! trail.info_with("Ensuring reference exists", json!({"ref": "refs/heads/main"}));
//! trail.success("Reference created successfully");
//!
//! assert_eq!(trail.len(), 2);
//! assert_eq!(trail.entries()[1].kind, LogKind::Success);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::types::UtcTimestamp;

/// Outcome class of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Success,
    Error,
}

/// One audit trail entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub timestamp: UtcTimestamp,
}

/// Ordered list of log entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditTrail {
    entries: Vec<LogEntry>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, mirroring it to `tracing`.
    pub fn push(&mut self, kind: LogKind, message: impl Into<String>, data: Option<Value>) {
        let message = message.into();
        let data_str = data.as_ref().map(Value::to_string).unwrap_or_default();
        match kind {
            LogKind::Info => tracing::info!(data = %data_str, "{}", message),
            LogKind::Success => tracing::info!(data = %data_str, success = true, "{}", message),
            LogKind::Error => tracing::error!(data = %data_str, "{}", message),
        }
        self.entries.push(LogEntry {
            kind,
            message,
            data,
            timestamp: UtcTimestamp::now(),
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogKind::Info, message, None);
    }

    pub fn info_with(&mut self, message: impl Into<String>, data: Value) {
        self.push(LogKind::Info, message, Some(data));
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(LogKind::Success, message, None);
    }

    pub fn success_with(&mut self, message: impl Into<String>, data: Value) {
        self.push(LogKind::Success, message, Some(data));
    }

    /// Append an error entry carrying the error's message.
    pub fn error(&mut self, message: impl Into<String>, error: &dyn std::error::Error) {
        self.push(
            LogKind::Error,
            message,
            Some(serde_json::json!({ "error": error.to_string() })),
        );
    }

    pub fn error_with(&mut self, message: impl Into<String>, data: Value) {
        self.push(LogKind::Error, message, Some(data));
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Messages in order (handy in tests and terse output).
    pub fn messages(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.message.as_str()).collect()
    }
}

/// A value together with the trail that produced it.
#[derive(Debug, Clone)]
pub struct Traced<T> {
    pub value: T,
    pub trail: AuditTrail,
}

impl<T> Traced<T> {
    pub fn new(value: T, trail: AuditTrail) -> Self {
        Self { value, trail }
    }
}

/// An error together with the trail accumulated up to the failure.
#[derive(Debug)]
pub struct TracedError<E> {
    pub error: E,
    pub trail: AuditTrail,
}

impl<E> TracedError<E> {
    pub fn new(error: E, trail: AuditTrail) -> Self {
        Self { error, trail }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for TracedError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

impl<E: std::error::Error + 'static> std::error::Error for TracedError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
