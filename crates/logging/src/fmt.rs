//! Render `tracing` events into concise logfmt strings.

use std::fmt::{self as stdfmt, Debug, Write};

use tracing::{
    Event, Metadata,
    field::{Field, Visit},
};

/// Rendered fields extracted from a tracing Event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLog {
    /// Severity level (e.g., INFO, WARN) for the event.
    pub level: String,
    /// Event target (typically the module path).
    pub target: String,
    /// The `message` field, or `key=value` pairs when there is none.
    pub message: String,
    /// Non-message fields as `key=value` pairs, in recording order.
    pub fields: String,
}

impl stdfmt::Display for RenderedLog {
    fn fmt(&self, f: &mut stdfmt::Formatter<'_>) -> stdfmt::Result {
        write!(f, "level={} target={} msg={:?}", self.level, self.target, self.message)?;
        if !self.fields.is_empty() && self.fields != self.message {
            write!(f, " {}", self.fields)?;
        }
        Ok(())
    }
}

/// Collects the message and remaining fields of one event.
#[derive(Default)]
struct MsgVisitor {
    /// Captured `message` field, if present.
    msg: Option<String>,
    /// Accumulated non-message fields rendered as `key=value`.
    fields: String,
}

impl Visit for MsgVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.msg = Some(value.to_string());
        } else {
            let _ignored = write!(&mut self.fields, "{}=\"{}\" ", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            self.msg = Some(format!("{:?}", value));
        } else {
            let _ignored = write!(&mut self.fields, "{}={:?} ", field.name(), value);
        }
    }
}

/// Extract level, target, message and fields from a tracing Event.
///
/// If the event has no `message` field the rendered fields stand in for it.
pub fn render_event(event: &Event<'_>) -> RenderedLog {
    let meta: &Metadata<'_> = event.metadata();
    let mut vis = MsgVisitor::default();
    event.record(&mut vis);
    let fields = vis.fields.trim_end().to_string();
    RenderedLog {
        level: meta.level().to_string(),
        target: meta.target().to_string(),
        message: vis.msg.unwrap_or_else(|| fields.clone()),
        fields,
    }
}
