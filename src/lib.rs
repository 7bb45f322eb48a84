//! Daylog - process-local logging with daily file rotation
//!
//! Three independent channels (service, trace, audit) each write to their own
//! dated file, `<dir>/<name>.log.<YYYY-MM-DD>` and friends. The first write
//! after the local date changes switches to a new file and prunes old ones.

pub mod config;
pub mod error;
pub mod registry;
pub mod sink;

pub use config::LoggerConfig;
pub use error::{Error, Result};
pub use registry::{ChannelKind, Registry, Severity, TraceContext};
