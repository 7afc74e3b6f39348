use std::{
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Serialize;
use tracing::{
    field::{Field, Visit},
    Subscriber,
};
use tracing_subscriber::{layer::Context, Layer};

/// One structured log line, ready for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct LogEnvelope {
    pub timestamp_ms: u64,
    pub level: String,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Layer that forwards every event it sees into a channel.
#[derive(Clone)]
pub struct LogCaptureLayer {
    sender: Sender<LogEnvelope>,
}

/// Receiving end of a [`LogCaptureLayer`].
pub struct LogCapture {
    sender: Sender<LogEnvelope>,
    receiver: Receiver<LogEnvelope>,
}

impl LogCapture {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    pub fn layer(&self) -> LogCaptureLayer {
        LogCaptureLayer {
            sender: self.sender.clone(),
        }
    }

    /// Everything captured since the last drain, in emission order.
    pub fn drain(&self) -> Vec<LogEnvelope> {
        self.receiver.try_iter().collect()
    }
}

impl Default for LogCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for LogCaptureLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut fields = EnvelopeFields::default();
        event.record(&mut fields);

        let message = match fields.0.remove("message") {
            Some(serde_json::Value::String(text)) => text,
            Some(other) => other.to_string(),
            None => metadata.target().to_string(),
        };
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let _ = self.sender.send(LogEnvelope {
            timestamp_ms,
            level: metadata.level().to_string(),
            target: metadata.target().to_string(),
            message,
            fields: fields.0,
        });
    }
}

/// Event fields as JSON. Non-finite floats and `?`/`%` fields become strings.
#[derive(Default)]
struct EnvelopeFields(serde_json::Map<String, serde_json::Value>);

impl EnvelopeFields {
    fn insert(&mut self, field: &Field, value: impl Into<serde_json::Value>) {
        self.0.insert(field.name().to_string(), value.into());
    }
}

impl Visit for EnvelopeFields {
    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        match serde_json::Number::from_f64(value) {
            Some(number) => self.insert(field, number),
            None => self.insert(field, value.to_string()),
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, format!("{value:?}"));
    }
}
