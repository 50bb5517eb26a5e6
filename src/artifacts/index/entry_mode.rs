use crate::artifacts::objects::object_type::ObjectType;
use is_executable::IsExecutable;
use std::path::Path;

#[derive(Debug, Clone, Copy, Hash, Eq, Ord, Default, PartialEq, PartialOrd)]
pub enum FileMode {
    #[default]
    Regular,
    Executable,
}

/// Mode of a tree or index entry, in git's octal encoding
#[derive(Debug, Clone, Copy, Hash, Eq, Ord, PartialEq, PartialOrd)]
pub enum EntryMode {
    File(FileMode),
    Symlink,
    Directory,
    Gitlink,
}

impl Default for EntryMode {
    fn default() -> Self {
        EntryMode::File(FileMode::Regular)
    }
}

impl EntryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryMode::File(FileMode::Regular) => "100644",
            EntryMode::File(FileMode::Executable) => "100755",
            EntryMode::Symlink => "120000",
            EntryMode::Directory => "40000",
            EntryMode::Gitlink => "160000",
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            EntryMode::File(FileMode::Regular) => 0o100644,
            EntryMode::File(FileMode::Executable) => 0o100755,
            EntryMode::Symlink => 0o120000,
            EntryMode::Directory => 0o40000,
            EntryMode::Gitlink => 0o160000,
        }
    }

    pub fn from_u32(mode: u32) -> Option<Self> {
        match mode {
            0o100644 => Some(EntryMode::File(FileMode::Regular)),
            0o100755 => Some(EntryMode::File(FileMode::Executable)),
            0o120000 => Some(EntryMode::Symlink),
            0o40000 => Some(EntryMode::Directory),
            0o160000 => Some(EntryMode::Gitlink),
            _ => None,
        }
    }

    pub fn from_octal_str(mode: &str) -> Option<Self> {
        u32::from_str_radix(mode, 8).ok().and_then(Self::from_u32)
    }

    /// Kind of object an entry with this mode points to
    pub fn object_type(&self) -> ObjectType {
        match self {
            EntryMode::Directory => ObjectType::Tree,
            EntryMode::Gitlink => ObjectType::Commit,
            EntryMode::File(_) | EntryMode::Symlink => ObjectType::Blob,
        }
    }

    /// Mode of a working-tree file
    pub fn from_path(path: &Path, metadata: &std::fs::Metadata) -> Self {
        if metadata.file_type().is_symlink() {
            EntryMode::Symlink
        } else if path.is_executable() {
            EntryMode::File(FileMode::Executable)
        } else {
            EntryMode::File(FileMode::Regular)
        }
    }
}

impl From<FileMode> for EntryMode {
    fn from(mode: FileMode) -> Self {
        EntryMode::File(mode)
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
