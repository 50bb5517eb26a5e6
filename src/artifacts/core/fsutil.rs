//! Filesystem helpers for crash-safe writes and advisory locking

use crate::artifacts::core::error::{Error, Result};
use fake::rand;
use file_guard::Lock;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Build a unique temp file name next to `path`
///
/// The name starts with a dot and ends with `.lock`, so it can never be mistaken
/// for a valid reference or object file while it is being written.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let temp_name = format!(".tmp-{}.lock", rand::random::<u32>());
    match path.parent() {
        Some(parent) => parent.join(temp_name),
        None => PathBuf::from(temp_name),
    }
}

/// Write `data` to `path` through a temp file and a rename
///
/// Readers see either the old content or the new content, never a partial write.
/// Parent directories are created as needed.
pub fn write_atomically(operation: &'static str, path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(Error::io(operation, parent.display()))?;
    }

    let temp_path = temp_path_for(path);
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .map_err(Error::io(operation, temp_path.display()))?;

    let written = file
        .write_all(data)
        .and_then(|_| file.sync_data())
        .and_then(|_| std::fs::rename(&temp_path, path));

    if let Err(source) = written {
        let _ = std::fs::remove_file(&temp_path);
        return Err(Error::io(operation, path.display())(source));
    }

    Ok(())
}

/// Run `f` while holding an advisory lock on `guard_path`
///
/// The guard file is created on first use. Nested calls on the same guard from
/// one process must be avoided: closing any descriptor of a file drops every
/// record lock the process holds on it.
pub fn with_guard<T>(
    operation: &'static str,
    guard_path: &Path,
    lock: Lock,
    f: impl FnOnce() -> Result<T>,
) -> Result<T> {
    if let Some(parent) = guard_path.parent() {
        std::fs::create_dir_all(parent).map_err(Error::io(operation, parent.display()))?;
    }

    let mut guard_file = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(guard_path)
        .map_err(Error::io(operation, guard_path.display()))?;
    let _lock = file_guard::lock(&mut guard_file, lock, 0, 1)
        .map_err(Error::io(operation, guard_path.display()))?;

    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;

    #[test]
    fn write_atomically_creates_parents_and_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("file");

        write_atomically("test", &path, b"first").unwrap();
        write_atomically("test", &path, b"second").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        let leftovers = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(".tmp-"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn with_guard_returns_closure_result() {
        let dir = TempDir::new().unwrap();
        let guard = dir.path().join("guard");

        let value = with_guard("test", &guard, Lock::Exclusive, || Ok(42)).unwrap();

        assert_eq!(value, 42);
        assert!(guard.exists());
    }
}
