//! File sink that switches to a new dated file when the local day changes
//!
//! Every write checks whether the current file still matches today's date and
//! still exists on disk. If not, the old handle is closed, a new
//! `<base>.<YYYY-MM-DD>` file is opened and old dated files beyond the retention
//! window are pruned. There is no background timer: the first write after
//! midnight performs the switch.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::clock::{date_suffix, Clock};
use super::retention;
use crate::error::{Error, Result};

/// Construction options for a [`RotatingSink`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkOptions {
    /// Number of dated files to keep, 0 keeps everything
    pub retention: usize,
    /// Defer creating the file until the first write
    pub lazy: bool,
}

/// Append-only log file with daily rotation
///
/// All mutable state sits behind one mutex, held across the whole
/// check/rotate/append sequence of a write. Sinks never share locks, so
/// independent sinks rotate independently.
#[derive(Debug)]
pub struct RotatingSink {
    base_path: PathBuf,
    retention: usize,
    lazy: bool,
    clock: Arc<dyn Clock>,
    state: Mutex<SinkState>,
}

#[derive(Debug)]
struct SinkState {
    suffix: String,
    path: PathBuf,
    file: Option<File>,
    rotations: u64,
    /// Pruning waits until the file of the last rotation has been opened
    prune_pending: bool,
}

/// Build `<base_path>.<suffix>` without touching the base path
pub fn dated_path(base_path: &Path, suffix: &str) -> PathBuf {
    let mut path = base_path.as_os_str().to_owned();
    path.push(".");
    path.push(suffix);
    PathBuf::from(path)
}

/// Resolve a relative base path against the current directory
fn absolute_base(base_path: PathBuf) -> Result<PathBuf> {
    if base_path.is_absolute() {
        return Ok(base_path);
    }
    let cwd = std::env::current_dir().map_err(|source| Error::Open {
        path: base_path.clone(),
        source,
    })?;
    Ok(cwd.join(base_path))
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })
}

impl RotatingSink {
    /// Create a sink for `base_path`, opening today's file unless `options.lazy`
    ///
    /// A relative `base_path` is resolved against the current directory once,
    /// here, so later changes of directory do not move the files.
    pub fn open(
        base_path: impl Into<PathBuf>,
        options: SinkOptions,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let base_path = absolute_base(base_path.into())?;
        let suffix = date_suffix(&clock.now());
        let path = dated_path(&base_path, &suffix);

        let file = if options.lazy {
            None
        } else {
            Some(open_append(&path)?)
        };

        Ok(Self {
            base_path,
            retention: options.retention,
            lazy: options.lazy,
            clock,
            state: Mutex::new(SinkState {
                suffix,
                path,
                file,
                rotations: 0,
                prune_pending: false,
            }),
        })
    }

    /// Base path (directory plus file stem) the dated files hang off
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of the file currently written to
    pub fn current_path(&self) -> PathBuf {
        self.lock().path.clone()
    }

    /// Date suffix of the file currently written to
    pub fn current_suffix(&self) -> String {
        self.lock().suffix.clone()
    }

    /// Number of rotations performed since the sink was created
    pub fn rotation_count(&self) -> u64 {
        self.lock().rotations
    }

    /// Append `line` and a newline, rotating first if the day changed
    pub fn write(&self, line: &str) -> Result<()> {
        let mut guard = self.lock();
        let state = &mut *guard;

        if self.needs_rotation_locked(state) {
            self.rotate_locked(state)?;
        }

        let file = match state.file.take() {
            Some(file) => file,
            None => open_append(&state.path)?,
        };
        let file = state.file.insert(file);

        if state.prune_pending {
            state.prune_pending = false;
            self.prune();
        }

        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        file.write_all(buf.as_bytes()).map_err(|source| Error::Write {
            path: state.path.clone(),
            source,
        })
    }

    /// Whether the next write would rotate
    ///
    /// True when today's date differs from the current suffix, or when the
    /// open file has vanished from disk.
    pub fn needs_rotation(&self) -> bool {
        let state = self.lock();
        self.needs_rotation_locked(&state)
    }

    /// Rotate only if [`needs_rotation`](Self::needs_rotation) holds
    ///
    /// Returns whether a rotation happened.
    pub fn rotate_if_needed(&self) -> Result<bool> {
        let mut state = self.lock();
        if !self.needs_rotation_locked(&state) {
            return Ok(false);
        }
        self.rotate_locked(&mut state)?;
        Ok(true)
    }

    /// Unconditionally close the current file and switch to today's file
    pub fn rotate(&self) -> Result<()> {
        let mut state = self.lock();
        self.rotate_locked(&mut state)
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        // A writer that panicked mid-write leaves nothing half-updated that a
        // later rotation can't repair.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn needs_rotation_locked(&self, state: &SinkState) -> bool {
        if date_suffix(&self.clock.now()) != state.suffix {
            return true;
        }
        state.file.is_some() && !state.path.exists()
    }

    fn rotate_locked(&self, state: &mut SinkState) -> Result<()> {
        // Dropping the handle closes it
        state.file = None;

        let suffix = date_suffix(&self.clock.now());
        let path = dated_path(&self.base_path, &suffix);
        tracing::debug!(
            from = %state.path.display(),
            to = %path.display(),
            "Rotating log file"
        );

        state.suffix = suffix;
        state.path = path;
        state.rotations += 1;

        // The new file counts toward retention, so prune only once it exists
        state.prune_pending = true;
        if !self.lazy {
            state.file = Some(open_append(&state.path)?);
            state.prune_pending = false;
            self.prune();
        }

        Ok(())
    }

    fn prune(&self) {
        if self.retention == 0 {
            return;
        }
        let deleted = retention::prune(&self.base_path, self.retention);
        if deleted > 0 {
            tracing::debug!(
                base = %self.base_path.display(),
                deleted,
                "Pruned expired log files"
            );
        }
    }
}
