//! Channel registry
//!
//! Builds the service, trace and audit channels from a [`LoggerConfig`] and
//! routes leveled emissions to them. The registry is constructed once at
//! startup and shared explicitly (usually as `Arc<Registry>`); it cannot be
//! reconfigured afterwards. Build a new one instead.
//!
//! Emission never returns an error. Failed writes are reported through
//! `tracing` and counted, see [`Registry::failed_emissions`].

mod channel;
mod format;
mod level;
mod trace;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

pub use channel::{audit_line, Channel, ChannelKind, Formatter, AUDIT_TIME_FORMAT};
pub use format::{LineFormat, Record, DEFAULT_FORMAT};
pub use level::Severity;
pub use trace::{trace_message, TraceContext, MISSING_CONTEXT};

use crate::config::LoggerConfig;
use crate::error::{Error, Result};
use crate::sink::{Clock, RotatingSink, SinkOptions, SystemClock};

/// The set of channels enabled for this process
#[derive(Debug)]
pub struct Registry {
    name: String,
    dir: PathBuf,
    clock: Arc<dyn Clock>,
    channels: HashMap<ChannelKind, Channel>,
    failures: AtomicU64,
}

/// Create the output directory if needed and resolve it to an absolute path
fn prepare_dir(path: &Path) -> Result<PathBuf> {
    fs::create_dir_all(path).map_err(|source| Error::CreateDir {
        path: path.to_path_buf(),
        source,
    })?;

    let metadata = fs::metadata(path).map_err(|source| Error::CreateDir {
        path: path.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(Error::UnusableDir {
            path: path.to_path_buf(),
            reason: "not a directory",
        });
    }
    if metadata.permissions().readonly() {
        return Err(Error::UnusableDir {
            path: path.to_path_buf(),
            reason: "read-only",
        });
    }

    fs::canonicalize(path).map_err(|source| Error::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Prove that files can be created in `dir`
///
/// Lazy sinks create nothing at startup, so without this an unwritable
/// directory would only show up on the first write.
fn check_writable(dir: &Path) -> Result<()> {
    tempfile::Builder::new()
        .prefix(".daylog-")
        .tempfile_in(dir)
        .map(drop)
        .map_err(|source| Error::NotWritable {
            path: dir.to_path_buf(),
            source,
        })
}

impl Registry {
    /// Build every enabled channel from `config`
    ///
    /// Directory and template problems, and failures to open eagerly created
    /// files, are reported here rather than on the first write.
    pub fn configure(config: &LoggerConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Like [`configure`](Self::configure), reading time from `clock`
    pub fn with_clock(config: &LoggerConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let dir = prepare_dir(&config.path)?;
        if config.delay {
            check_writable(&dir)?;
        }
        let format = LineFormat::parse(&config.format)?;
        let options = SinkOptions {
            retention: config.backup_count,
            lazy: config.delay,
        };

        let mut channels = HashMap::new();
        for kind in config.enabled_channels() {
            let sink = RotatingSink::open(kind.base_path(&dir, &config.name), options, Arc::clone(&clock))?;
            let formatter = match kind {
                ChannelKind::Audit => Formatter::Json,
                ChannelKind::Service | ChannelKind::Trace => Formatter::Text(format.clone()),
            };
            tracing::debug!(
                channel = %kind,
                base = %sink.base_path().display(),
                level = %config.level,
                "Configured log channel"
            );
            channels.insert(kind, Channel::new(kind, config.level, formatter, sink));
        }

        Ok(Self {
            name: config.name.clone(),
            dir,
            clock,
            channels,
            failures: AtomicU64::new(0),
        })
    }

    /// Logical base name, also written as the audit `service` field
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute output directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_enabled(&self, kind: ChannelKind) -> bool {
        self.channels.contains_key(&kind)
    }

    pub fn channel(&self, kind: ChannelKind) -> Option<&Channel> {
        self.channels.get(&kind)
    }

    pub fn sink(&self, kind: ChannelKind) -> Option<&RotatingSink> {
        self.channel(kind).map(Channel::sink)
    }

    /// Number of emissions that failed since the registry was built
    pub fn failed_emissions(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Write `message` to `channel` at `severity`
    ///
    /// Does nothing when the channel is disabled or `severity` is below its
    /// threshold; in that case the sink is not touched at all. On the audit
    /// channel the text is wrapped as `{"message": ...}`.
    pub fn emit(&self, channel: ChannelKind, severity: Severity, message: &str) {
        if channel == ChannelKind::Audit {
            self.audit(severity, &json!({ "message": message }));
            return;
        }
        let Some(target) = self.accepting(channel, severity) else {
            return;
        };
        self.report(channel, target.write(&self.name, self.clock.now(), severity, message));
    }

    /// Write to the service channel
    pub fn service(&self, severity: Severity, message: &str) {
        self.emit(ChannelKind::Service, severity, message);
    }

    /// Write to the trace channel, prefixed with the span correlation data
    pub fn trace(&self, severity: Severity, message: &str, context: Option<&TraceContext>) {
        let Some(target) = self.accepting(ChannelKind::Trace, severity) else {
            return;
        };
        let message = trace_message(context, message);
        self.report(
            ChannelKind::Trace,
            target.write(&self.name, self.clock.now(), severity, &message),
        );
    }

    /// Write a key-value payload to the audit channel as one JSON line
    ///
    /// The payload must serialize to a JSON object. `time` and `service` are
    /// added to it.
    pub fn audit<T>(&self, severity: Severity, payload: &T)
    where
        T: Serialize + ?Sized,
    {
        let Some(target) = self.accepting(ChannelKind::Audit, severity) else {
            return;
        };
        let now = self.clock.now();
        let result = audit_line(payload, &self.name, now)
            .and_then(|line| target.write(&self.name, now, severity, &line));
        self.report(ChannelKind::Audit, result);
    }

    /// Report a failure at error rank, appending the error and its causes
    ///
    /// `context` is only used on the trace channel, where it provides the
    /// `ot-*` prefix just as in [`trace`](Self::trace).
    pub fn exception(
        &self,
        channel: ChannelKind,
        message: &str,
        error: &anyhow::Error,
        context: Option<&TraceContext>,
    ) {
        let severity = Severity::Exception;
        let Some(target) = self.accepting(channel, severity) else {
            return;
        };
        let now = self.clock.now();
        let result = match channel {
            ChannelKind::Service => target.write(&self.name, now, severity, &format!("{message}\n{error:?}")),
            ChannelKind::Trace => {
                let message = trace_message(context, &format!("{message}\n{error:?}"));
                target.write(&self.name, now, severity, &message)
            }
            ChannelKind::Audit => {
                let payload = json!({ "message": message, "exception": format!("{error:#}") });
                audit_line(&payload, &self.name, now).and_then(|line| target.write(&self.name, now, severity, &line))
            }
        };
        self.report(channel, result);
    }

    fn accepting(&self, channel: ChannelKind, severity: Severity) -> Option<&Channel> {
        self.channels.get(&channel).filter(|c| c.accepts(severity))
    }

    fn report(&self, channel: ChannelKind, result: Result<()>) {
        if let Err(e) = result {
            self.failures.fetch_add(1, Ordering::Relaxed);
            tracing::error!(channel = %channel, error = ?e, "Failed to write log line");
        }
    }
}
