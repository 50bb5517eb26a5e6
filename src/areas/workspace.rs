//! Working tree access
//!
//! Paths handed to and returned from the workspace are relative to its root and
//! `/`-separated, the same form the index and trees use.

use crate::artifacts::core::error::{Error, Result};
use crate::artifacts::index::entry_mode::EntryMode;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Names never considered part of the working tree
pub const IGNORED_PATHS: [&str; 1] = [".grove"];

/// Mode and size of a working-tree file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub mode: EntryMode,
    pub size: u64,
}

#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_ignored(entry: &DirEntry) -> bool {
        entry
            .file_name()
            .to_str()
            .is_some_and(|name| IGNORED_PATHS.contains(&name))
    }

    /// Every file and symlink in the working tree, sorted
    pub fn list_files(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.path)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !Self::is_ignored(entry));
        for entry in walker {
            let entry = entry.map_err(|e| {
                let target = e
                    .path()
                    .map(|path| path.display().to_string())
                    .unwrap_or_default();
                Error::io("list_files", target)(std::io::Error::other(e))
            })?;
            if entry.file_type().is_dir() {
                continue;
            }

            files.push(self.relative_name(entry.path())?);
        }
        files.sort();

        Ok(files)
    }

    /// Turn a path below the root into its `/`-separated relative name
    fn relative_name(&self, path: &Path) -> Result<String> {
        let relative = path.strip_prefix(self.path.as_ref()).map_err(|_| {
            Error::invalid_argument("workspace_path", path.display(), "outside the working tree")
        })?;

        relative
            .components()
            .map(|component| match component {
                Component::Normal(name) => name.to_str().map(str::to_string).ok_or_else(|| {
                    Error::invalid_argument("workspace_path", path.display(), "not valid UTF-8")
                }),
                _ => Err(Error::invalid_argument(
                    "workspace_path",
                    path.display(),
                    "unexpected path component",
                )),
            })
            .collect::<Result<Vec<_>>>()
            .map(|parts| parts.join("/"))
    }

    /// Validate a user-supplied relative path and normalize it
    ///
    /// Absolute paths, `..` components and the repository directory are rejected.
    pub fn normalize(&self, path: &str) -> Result<String> {
        let mut parts = Vec::new();

        for component in Path::new(path).components() {
            match component {
                Component::CurDir => {}
                Component::Normal(name) => {
                    let name = name.to_str().ok_or_else(|| {
                        Error::invalid_argument("workspace_path", path, "not valid UTF-8")
                    })?;
                    if parts.is_empty() && IGNORED_PATHS.contains(&name) {
                        return Err(Error::invalid_argument(
                            "workspace_path",
                            path,
                            "inside the repository directory",
                        ));
                    }
                    parts.push(name);
                }
                _ => {
                    return Err(Error::invalid_argument(
                        "workspace_path",
                        path,
                        "must be relative to the working tree",
                    ));
                }
            }
        }

        if parts.is_empty() {
            return Err(Error::invalid_argument("workspace_path", path, "empty path"));
        }

        Ok(parts.join("/"))
    }

    pub fn absolute(&self, relative: &str) -> PathBuf {
        self.path.join(relative)
    }

    /// Content of a file; a symlink yields its target path
    pub fn read_file(&self, relative: &str) -> Result<Bytes> {
        let path = self.absolute(relative);
        let metadata = std::fs::symlink_metadata(&path)
            .map_err(Error::io_or_not_found("read_file", relative))?;

        if metadata.file_type().is_symlink() {
            let target =
                std::fs::read_link(&path).map_err(Error::io("read_file", relative))?;
            return Ok(Bytes::from(target.to_string_lossy().into_owned()));
        }

        std::fs::read(&path)
            .map(Bytes::from)
            .map_err(Error::io_or_not_found("read_file", relative))
    }

    pub fn stat_file(&self, relative: &str) -> Result<FileStat> {
        let path = self.absolute(relative);
        let metadata = std::fs::symlink_metadata(&path)
            .map_err(Error::io_or_not_found("stat_file", relative))?;

        if metadata.is_dir() {
            return Err(Error::invalid_argument(
                "stat_file",
                relative,
                "is a directory",
            ));
        }

        Ok(FileStat {
            mode: EntryMode::from_path(&path, &metadata),
            size: metadata.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::core::error::ErrorKind;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn listing_skips_the_repository_directory() {
        let dir = TempDir::new().unwrap();
        dir.child("b.txt").write_str("b").unwrap();
        dir.child("a/c.txt").write_str("c").unwrap();
        dir.child(".grove/HEAD").write_str("ref: refs/heads/main").unwrap();
        let workspace = Workspace::new(dir.path().into());

        assert_eq!(workspace.list_files().unwrap(), vec!["a/c.txt", "b.txt"]);
    }

    #[test]
    fn normalize_rejects_escaping_paths() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::new(dir.path().into());

        assert_eq!(workspace.normalize("./src//main.rs").unwrap(), "src/main.rs");
        for path in ["../outside", "/etc/passwd", ".grove/config.toml", "."] {
            let error = workspace.normalize(path).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::InvalidArgument, "{path}");
        }
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_read_as_their_target() {
        let dir = TempDir::new().unwrap();
        dir.child("target.txt").write_str("content").unwrap();
        std::os::unix::fs::symlink("target.txt", dir.path().join("link")).unwrap();
        let workspace = Workspace::new(dir.path().into());

        assert_eq!(workspace.read_file("link").unwrap().as_ref(), b"target.txt");
        assert_eq!(workspace.stat_file("link").unwrap().mode, EntryMode::Symlink);
    }
}
