//! Structured lifecycle events for downstream log consumers.
//!
//! The field set (`app_name`, `api_name`, `message`, `params`, `stack`,
//! `level`) is fixed: collectors downstream key on these names. Events are
//! serialized to one JSON payload and routed through `tracing` at the level
//! matching their severity.

use serde::Serialize;

/// Event severity. Serialized lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// One lifecycle event (connecting, reconnecting, error, end, warning).
#[derive(Debug, Clone, Serialize)]
pub struct CacheEvent {
    pub app_name: &'static str,
    pub api_name: &'static str,
    pub message: String,
    /// Contextual parameters, pre-serialized JSON.
    pub params: String,
    pub stack: String,
    pub level: Severity,
}

impl CacheEvent {
    pub fn new(level: Severity, message: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            app_name: "exception",
            api_name: "cache",
            message: message.into(),
            params: params.to_string(),
            stack: String::new(),
            level,
        }
    }

    pub fn info(message: impl Into<String>, params: serde_json::Value) -> Self {
        Self::new(Severity::Info, message, params)
    }

    pub fn warning(message: impl Into<String>, params: serde_json::Value) -> Self {
        Self::new(Severity::Warning, message, params)
    }

    pub fn critical(message: impl Into<String>, params: serde_json::Value) -> Self {
        Self::new(Severity::Critical, message, params)
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = stack.into();
        self
    }

    /// Serialize and hand the event to the subscriber.
    pub fn emit(&self) {
        let payload = serde_json::to_string(self).unwrap_or_else(|_| self.message.clone());
        match self.level {
            Severity::Info => tracing::info!(target: "recache::event", %payload),
            Severity::Warning => tracing::warn!(target: "recache::event", %payload),
            Severity::Critical => tracing::error!(target: "recache::event", %payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_field_set_is_stable() {
        let ev = CacheEvent::warning("reconnecting", json!({ "attempt": 3 }));
        let value: serde_json::Value = serde_json::from_str(&serde_json::to_string(&ev).unwrap()).unwrap();
        let obj = value.as_object().unwrap();
        let mut keys: Vec<_> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            ["api_name", "app_name", "level", "message", "params", "stack"]
        );
        assert_eq!(obj["app_name"], "exception");
        assert_eq!(obj["api_name"], "cache");
        assert_eq!(obj["level"], "warning");
        assert_eq!(obj["message"], "reconnecting");
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Info).unwrap(), "\"info\"");
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"critical\"");
    }

    #[test]
    fn params_are_embedded_as_a_string() {
        let ev = CacheEvent::info("connecting", json!({ "attempt": 1 }));
        assert_eq!(ev.params, r#"{"attempt":1}"#);
        let ev = ev.with_stack("at connect");
        assert_eq!(ev.stack, "at connect");
    }
}
