//! JSON layer producing one structured line per event.
//!
//! Each line carries timestamp (RFC 3339), level, service, pid, target,
//! message and the event's structured fields. Fields whose names look like
//! credentials are replaced by `[REDACTED]`.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

const REDACTED: &str = "[REDACTED]";

/// Field-name fragments that are never written verbatim.
const DENYLIST_KEYS: [&str; 6] = [
    "access_token",
    "refresh_token",
    "authorization",
    "code",
    "password",
    "secret",
];

/// A single structured log entry.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub service: String,
    pub pid: u32,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<String>,
}

/// Collects an event's fields, pulling out `message` and masking credentials.
#[derive(Default)]
struct FieldVisitor {
    fields: BTreeMap<String, Value>,
    message: Option<String>,
}

impl FieldVisitor {
    fn put(&mut self, field: &Field, value: Value) {
        let name = field.name();
        if name == "message" {
            self.message = Some(match value {
                Value::String(text) => text,
                other => other.to_string(),
            });
            return;
        }

        let value = if is_sensitive_key(name) {
            Value::from(REDACTED)
        } else {
            value
        };
        self.fields.insert(name.to_owned(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, Value::from(format!("{:?}", value)));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.put(field, Value::from(value.to_string()));
    }
}

/// A field is sensitive when its name ends with a denylisted fragment
/// (`access_token`, `auth_code`), so `code_len` style metrics still pass.
fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    DENYLIST_KEYS.iter().any(|entry| lower.ends_with(entry))
}

/// Layer that writes [`LogEntry`] lines through a `MakeWriter`.
pub struct JsonLayer<W> {
    service_name: String,
    pid: u32,
    make_writer: W,
}

impl<W> JsonLayer<W> {
    pub fn new(service_name: String, make_writer: W) -> Self {
        Self {
            service_name,
            pid: std::process::id(),
            make_writer,
        }
    }
}

impl<S, W> Layer<S> for JsonLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let meta = event.metadata();
        let entry = LogEntry {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level: meta.level().as_str().to_owned(),
            service: self.service_name.clone(),
            pid: self.pid,
            target: meta.target().to_owned(),
            message: visitor.message.unwrap_or_default(),
            fields: visitor.fields,
            span: ctx.event_span(event).map(|span| span.name().to_owned()),
        };

        // Unserializable or unwritable lines are dropped.
        let Ok(mut line) = serde_json::to_string(&entry) else {
            return;
        };
        line.push('\n');
        let _ = self.make_writer.make_writer().write_all(line.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture_line(emit: impl FnOnce()) -> Value {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::registry()
            .with(JsonLayer::new("pinsched".to_string(), capture.clone()));
        tracing::subscriber::with_default(subscriber, emit);

        let bytes = capture.0.lock().clone();
        let text = String::from_utf8(bytes).unwrap();
        serde_json::from_str(text.lines().next().unwrap()).unwrap()
    }

    #[test]
    fn test_event_is_written_as_json_line() {
        let line = capture_line(|| tracing::info!(username = "alice", "session established"));

        assert_eq!(line["service"], "pinsched");
        assert_eq!(line["level"], "INFO");
        assert_eq!(line["message"], "session established");
        assert_eq!(line["fields"]["username"], "alice");
    }

    #[test]
    fn test_credential_fields_are_redacted() {
        let line = capture_line(|| {
            tracing::debug!(
                access_token = "secret-value",
                refresh_token = "other-secret",
                expires_in = 3600u64,
                "token refreshed"
            )
        });

        assert_eq!(line["fields"]["access_token"], REDACTED);
        assert_eq!(line["fields"]["refresh_token"], REDACTED);
        assert_eq!(line["fields"]["expires_in"], 3600);
    }

    #[test]
    fn test_is_sensitive_key_is_case_insensitive() {
        assert!(is_sensitive_key("Authorization"));
        assert!(is_sensitive_key("auth_code"));
        assert!(!is_sensitive_key("code_len"));
        assert!(!is_sensitive_key("username"));
    }
}
