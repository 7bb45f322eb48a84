//! Rotating file sink
//!
//! Owns one output file per logical base name and switches to a new dated file
//! when the local calendar day changes.

mod clock;
mod retention;
mod rotating;

pub use clock::{date_suffix, Clock, ManualClock, SystemClock};
pub use retention::{dated_files, files_to_delete, is_dated_suffix, prune};
pub use rotating::{dated_path, RotatingSink, SinkOptions};
