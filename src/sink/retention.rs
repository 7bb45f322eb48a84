//! Dated log file retention
//!
//! Keeps at most `retention` files of the form `<stem>.<YYYY-MM-DD>` next to a
//! sink's base path, deleting the oldest first.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

/// Suffix accepted after `<stem>.`: a zero-padded date, optionally followed by
/// one extra dotted word
const DATED_SUFFIX_PATTERN: &str = r"^[0-9]{4}-[0-9]{2}-[0-9]{2}(\.[A-Za-z0-9_]+)?$";

fn dated_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DATED_SUFFIX_PATTERN).expect("dated suffix pattern is valid"))
}

/// Check whether `suffix` (the part after `<stem>.`) looks like a rotation date
pub fn is_dated_suffix(suffix: &str) -> bool {
    dated_suffix().is_match(suffix)
}

/// List every dated file belonging to `base_path`, oldest first
///
/// Fixed-width dates sort lexicographically in chronological order, so a plain
/// sort of the file names is enough.
pub fn dated_files(base_path: &Path) -> io::Result<Vec<PathBuf>> {
    let Some(dir) = base_path.parent() else {
        return Ok(Vec::new());
    };
    let Some(stem) = base_path.file_name().and_then(|n| n.to_str()) else {
        return Ok(Vec::new());
    };
    let prefix = format!("{stem}.");

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };

        if let Some(suffix) = name.strip_prefix(&prefix) {
            if is_dated_suffix(suffix) {
                files.push(entry.path());
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Work out which dated files fall outside the retention window
///
/// Returns nothing when `retention` is 0 (unlimited) or when no more than
/// `retention` files exist.
pub fn files_to_delete(base_path: &Path, retention: usize) -> io::Result<Vec<PathBuf>> {
    if retention == 0 {
        return Ok(Vec::new());
    }

    let mut files = dated_files(base_path)?;
    if files.len() <= retention {
        return Ok(Vec::new());
    }

    let excess = files.len() - retention;
    files.truncate(excess);
    Ok(files)
}

/// Delete dated files beyond the retention window
///
/// Best effort: a file that cannot be removed is reported and skipped.
/// Returns the number of files deleted.
pub fn prune(base_path: &Path, retention: usize) -> usize {
    let stale = match files_to_delete(base_path, retention) {
        Ok(stale) => stale,
        Err(e) => {
            tracing::warn!(
                base = %base_path.display(),
                error = %e,
                "Failed to list log files for retention"
            );
            return 0;
        }
    };

    let mut deleted_count = 0;
    for path in stale {
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(file = %path.display(), "Removed expired log file");
                deleted_count += 1;
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Failed to remove expired log file");
            }
        }
    }

    deleted_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap().write_all(b"test").unwrap();
        path
    }

    #[test]
    fn test_is_dated_suffix() {
        assert!(is_dated_suffix("2026-01-21"));
        assert!(is_dated_suffix("2026-01-21.gz"));
        assert!(!is_dated_suffix("2026-1-21"));
        assert!(!is_dated_suffix("2026-01-21.tar.gz"));
        assert!(!is_dated_suffix("trace.log.2026-01-21"));
        assert!(!is_dated_suffix("２０２６-01-21"));
    }

    #[test]
    fn test_dated_files_sorted_and_filtered() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("app.log");

        touch(temp_dir.path(), "app.log.2026-01-03");
        touch(temp_dir.path(), "app.log.2026-01-01");
        touch(temp_dir.path(), "app.log.2026-01-02");
        touch(temp_dir.path(), "app.log.backup");
        touch(temp_dir.path(), "app.trace.log.2025-12-31");
        touch(temp_dir.path(), "other.log.2025-12-30");

        let files = dated_files(&base).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["app.log.2026-01-01", "app.log.2026-01-02", "app.log.2026-01-03"]
        );
    }

    #[test]
    fn test_files_to_delete_unlimited() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("app.log");
        for day in 1..=5 {
            touch(temp_dir.path(), &format!("app.log.2026-01-0{day}"));
        }

        assert!(files_to_delete(&base, 0).unwrap().is_empty());
    }

    #[test]
    fn test_files_to_delete_under_limit() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("app.log");
        touch(temp_dir.path(), "app.log.2026-01-01");
        touch(temp_dir.path(), "app.log.2026-01-02");

        assert!(files_to_delete(&base, 3).unwrap().is_empty());
        assert!(files_to_delete(&base, 2).unwrap().is_empty());
    }

    #[test]
    fn test_prune_keeps_most_recent() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("app.log");
        for day in 1..=5 {
            touch(temp_dir.path(), &format!("app.log.2026-01-0{day}"));
        }
        let unrelated = touch(temp_dir.path(), "app.log.notes");

        let deleted = prune(&base, 2);
        assert_eq!(deleted, 3);

        let remaining = dated_files(&base).unwrap();
        assert_eq!(
            remaining,
            vec![
                temp_dir.path().join("app.log.2026-01-04"),
                temp_dir.path().join("app.log.2026-01-05"),
            ]
        );
        assert!(unrelated.exists());
    }

    #[test]
    fn test_prune_missing_dir() {
        let base = Path::new("/nonexistent/path/for/testing/app.log");
        assert_eq!(prune(base, 1), 0);
    }
}
