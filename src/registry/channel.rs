//! Logical log channels and their sinks

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::{Map, Value};

use super::format::{LineFormat, Record};
use super::level::Severity;
use crate::error::{Error, Result};
use crate::sink::RotatingSink;

/// The three independent log destinations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelKind {
    Service,
    Trace,
    Audit,
}

impl ChannelKind {
    /// All channels, in configuration order
    pub const ALL: [ChannelKind; 3] = [ChannelKind::Service, ChannelKind::Trace, ChannelKind::Audit];

    pub fn as_str(self) -> &'static str {
        match self {
            ChannelKind::Service => "service",
            ChannelKind::Trace => "trace",
            ChannelKind::Audit => "audit",
        }
    }

    /// File stem for this channel: `<name>.log`, `<name>.trace.log` or `<name>.audit.log`
    pub fn file_stem(self, name: &str) -> String {
        match self {
            ChannelKind::Service => format!("{name}.log"),
            ChannelKind::Trace => format!("{name}.trace.log"),
            ChannelKind::Audit => format!("{name}.audit.log"),
        }
    }

    /// Base path of this channel's dated files inside `dir`
    pub fn base_path(self, dir: &Path, name: &str) -> PathBuf {
        dir.join(self.file_stem(name))
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a channel turns a message into a line
#[derive(Debug, Clone)]
pub enum Formatter {
    /// Human-readable template
    Text(LineFormat),
    /// The message is already a serialized JSON object
    Json,
}

/// One channel: threshold, formatter and its own sink
#[derive(Debug)]
pub struct Channel {
    kind: ChannelKind,
    min_level: Severity,
    formatter: Formatter,
    sink: RotatingSink,
}

impl Channel {
    pub fn new(kind: ChannelKind, min_level: Severity, formatter: Formatter, sink: RotatingSink) -> Self {
        Self {
            kind,
            min_level,
            formatter,
            sink,
        }
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn min_level(&self) -> Severity {
        self.min_level
    }

    pub fn sink(&self) -> &RotatingSink {
        &self.sink
    }

    /// Whether an emission at `severity` would be written
    pub fn accepts(&self, severity: Severity) -> bool {
        severity.passes(self.min_level)
    }

    /// Format and write one message
    ///
    /// Callers filter with [`accepts`](Self::accepts) first so rejected
    /// emissions never reach the sink.
    pub fn write(&self, name: &str, time: DateTime<Local>, severity: Severity, message: &str) -> Result<()> {
        let line = match &self.formatter {
            Formatter::Text(format) => format.render(&Record {
                time,
                severity,
                name,
                channel: self.kind.as_str(),
                message,
            }),
            Formatter::Json => message.to_string(),
        };
        self.sink.write(&line)
    }
}

/// Timestamp layout of the audit `time` field
pub const AUDIT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Serialize an audit payload as one JSON line
///
/// `time` and `service` are added after the payload's own keys; a payload key
/// of the same name keeps its position but takes the injected value.
/// Non-ASCII text is written as-is.
pub fn audit_line<T>(payload: &T, service: &str, time: DateTime<Local>) -> Result<String>
where
    T: Serialize + ?Sized,
{
    let mut object: Map<String, Value> = match serde_json::to_value(payload)? {
        Value::Object(object) => object,
        Value::Null => return Err(Error::AuditPayload("null")),
        Value::Bool(_) => return Err(Error::AuditPayload("a boolean")),
        Value::Number(_) => return Err(Error::AuditPayload("a number")),
        Value::String(_) => return Err(Error::AuditPayload("a string")),
        Value::Array(_) => return Err(Error::AuditPayload("an array")),
    };

    object.insert(
        "time".to_string(),
        Value::String(time.format(AUDIT_TIME_FORMAT).to_string()),
    );
    object.insert("service".to_string(), Value::String(service.to_string()));

    Ok(serde_json::to_string(&object)?)
}
