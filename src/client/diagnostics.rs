use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Entries kept per request path before the oldest is dropped.
pub const MAX_ENTRIES_PER_PATH: usize = 10;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DiagnosticEntry {
    pub date_time: String,
    pub message: String,
    pub content: Value,
}

/// Per-path trail of request outcomes, only read for diagnostics output.
///
/// Entries are only ever appended. A path holds its newest
/// [`MAX_ENTRIES_PER_PATH`] outcomes; older ones fall off the front.
#[derive(Debug, Default)]
pub struct DiagnosticsLog {
    entries: Mutex<IndexMap<String, VecDeque<DiagnosticEntry>>>,
}

impl DiagnosticsLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, path: &str, message: &str, content: &str) {
        let content = serde_json::from_str(content).unwrap_or_else(|_| Value::String(content.to_string()));
        let entry = DiagnosticEntry {
            date_time: jiff::Timestamp::now().strftime("%Y-%m-%dT%H:%M:%S").to_string(),
            message: message.to_string(),
            content,
        };

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let trail = entries.entry(path.to_string()).or_default();
        if trail.len() == MAX_ENTRIES_PER_PATH {
            trail.pop_front();
        }
        trail.push_back(entry);
    }

    pub fn latest(&self, path: &str) -> Option<DiagnosticEntry> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(path).and_then(|trail| trail.back().cloned())
    }

    pub fn snapshot(&self) -> IndexMap<String, Vec<DiagnosticEntry>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .map(|(path, trail)| (path.clone(), trail.iter().cloned().collect()))
            .collect()
    }

    pub fn paths(&self) -> Vec<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_parses_json_content() {
        let log = DiagnosticsLog::new();
        log.record("info", "Successful request", r#"{"url": "http://localhost"}"#);

        let entry = log.latest("info").unwrap();
        assert_eq!(entry.message, "Successful request");
        assert_eq!(entry.content, json!({"url": "http://localhost"}));
        assert_eq!(entry.date_time.len(), "2024-01-01T00:00:00".len());
    }

    #[test]
    fn test_record_keeps_plain_text() {
        let log = DiagnosticsLog::new();
        log.record("devices", "Connection error", "connection refused");

        assert_eq!(
            log.latest("devices").unwrap().content,
            Value::String("connection refused".to_string())
        );
    }

    #[test]
    fn test_trail_is_bounded() {
        let log = DiagnosticsLog::new();
        for i in 0..(MAX_ENTRIES_PER_PATH + 5) {
            log.record("scenes", &format!("call {}", i), "{}");
        }

        let snapshot = log.snapshot();
        let trail = &snapshot["scenes"];
        assert_eq!(trail.len(), MAX_ENTRIES_PER_PATH);
        assert_eq!(trail[0].message, "call 5");
        assert_eq!(log.latest("scenes").unwrap().message, format!("call {}", MAX_ENTRIES_PER_PATH + 4));
    }

    #[test]
    fn test_paths_keep_first_seen_order() {
        let log = DiagnosticsLog::new();
        log.record("config", "ok", "{}");
        log.record("info", "ok", "{}");
        log.record("config", "ok", "{}");

        assert_eq!(log.paths(), vec!["config".to_string(), "info".to_string()]);
        assert!(!log.is_empty());
    }
}
