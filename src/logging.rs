//! Log sink for batch runs: every event becomes one `yyyyMMdd_HHmmss\t=>\tmessage`
//! line on stderr, optionally mirrored into an in-memory buffer.
use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use tracing::{Event, Subscriber, field::Visit};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Most entries a captured buffer keeps; older ones are dropped first.
pub const BUFFER_CAPACITY: usize = 1000;

#[derive(Clone, Debug)]
pub struct LogEntry {
    pub level: tracing::Level,
    pub line: String,
    pub message: String,
    pub target: String,
}

pub type LogBuffer = Arc<Mutex<Vec<LogEntry>>>;

/// Render one log line in the batch format.
pub fn format_line(at: &DateTime<Local>, message: &str) -> String {
    format!("{}\t=>\t{}", at.format(TIMESTAMP_FORMAT), message)
}

pub struct BatchLogLayer {
    echo: bool,
    buffer: Option<LogBuffer>,
}

impl BatchLogLayer {
    /// Write lines to stderr.
    pub fn stderr() -> Self {
        Self {
            echo: true,
            buffer: None,
        }
    }

    /// Collect lines into `buffer` only.
    pub fn captured(buffer: LogBuffer) -> Self {
        Self {
            echo: false,
            buffer: Some(buffer),
        }
    }
}

struct MessageVisitor {
    message: String,
    fields: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push_str(&format!(" {}={:?}", field.name(), value));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push_str(&format!(" {}={}", field.name(), value));
        }
    }
}

impl<S> Layer<S> for BatchLogLayer
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut visitor = MessageVisitor {
            message: String::new(),
            fields: String::new(),
        };
        event.record(&mut visitor);

        let mut message = if visitor.message.is_empty() {
            metadata.target().to_string()
        } else {
            visitor.message
        };
        message.push_str(&visitor.fields);

        let line = format_line(&Local::now(), &message);
        if self.echo {
            eprintln!("{}", line);
        }
        if let Some(buffer) = &self.buffer {
            if let Ok(mut buf) = buffer.lock() {
                buf.push(LogEntry {
                    level: *metadata.level(),
                    line,
                    message,
                    target: metadata.target().to_string(),
                });
                if buf.len() > BUFFER_CAPACITY {
                    buf.remove(0);
                }
            }
        }
    }
}

/// Install the stderr sink as the global subscriber. `RUST_LOG` overrides the
/// default `info` level. Safe to call more than once.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(BatchLogLayer::stderr())
        .try_init();
}
