//! Mark-consumed side effect (component C7): rename an input file to its
//! leading-dot sibling so a later run skips it.

use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Rename `path` to `.basename` in the same directory. Renaming a path whose
/// basename already starts with `.` is a no-op.
/// Failures (e.g. cross-device rename) are logged, never panics.
pub fn mark_consumed(path: &Path) {
    let Some(dotted) = dotfile_sibling(path) else {
        return;
    };
    if dotted == path {
        return;
    }
    match std::fs::rename(path, &dotted) {
        Ok(()) => info!(from = %path.display(), to = %dotted.display(), "marked file consumed"),
        Err(err) => error!(file = %path.display(), error = %err, "failed to mark file consumed"),
    }
}

fn dotfile_sibling(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    if name.starts_with('.') {
        return Some(path.to_path_buf());
    }
    Some(path.with_file_name(format!(".{name}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn renames_to_dotted_sibling() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.tsv.gz");
        std::fs::write(&path, b"data").unwrap();

        mark_consumed(&path);

        assert!(!path.exists());
        assert!(dir.path().join(".a.tsv.gz").exists());
    }

    #[test]
    fn already_dotted_basename_is_a_no_op() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".already-consumed.tsv.gz");
        std::fs::write(&path, b"data").unwrap();

        mark_consumed(&path);

        assert!(path.exists());
    }

    #[test]
    fn missing_file_logs_and_does_not_panic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.tsv.gz");
        mark_consumed(&path); // must not panic
    }
}
