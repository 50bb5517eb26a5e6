//! Error taxonomy shared by every store in the repository
//!
//! Each variant records the operation that failed and the argument it failed on,
//! so a caller can report `branch_create: refs/heads/main already exists`
//! without keeping any global error state around.

use std::fmt::Display;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], convenient for matching in callers and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    CorruptObject,
    DanglingReference,
    ReferenceCycle,
    InvalidArgument,
    Io,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A missing object, reference, path or configuration key
    #[error("{operation}: {target} not found")]
    NotFound {
        operation: &'static str,
        target: String,
    },
    /// Creating or renaming onto an existing name without force
    #[error("{operation}: {target} already exists")]
    AlreadyExists {
        operation: &'static str,
        target: String,
    },
    /// Stored bytes that do not decode or do not hash back to their id
    #[error("{operation}: {target} is corrupt: {reason}")]
    CorruptObject {
        operation: &'static str,
        target: String,
        reason: String,
    },
    /// A symbolic reference chain ending in a name that does not exist
    #[error("{operation}: reference {name} points to missing {target}")]
    DanglingReference {
        operation: &'static str,
        name: String,
        target: String,
    },
    /// A symbolic reference chain that revisits a name
    #[error("{operation}: reference cycle through {name}")]
    ReferenceCycle {
        operation: &'static str,
        name: String,
    },
    /// Malformed ids, names, patterns or misuse of an API in the wrong state
    #[error("{operation}: invalid argument '{argument}': {reason}")]
    InvalidArgument {
        operation: &'static str,
        argument: String,
        reason: String,
    },
    /// Persistence failure
    #[error("{operation}: I/O failure on {target}")]
    Io {
        operation: &'static str,
        target: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Error::CorruptObject { .. } => ErrorKind::CorruptObject,
            Error::DanglingReference { .. } => ErrorKind::DanglingReference,
            Error::ReferenceCycle { .. } => ErrorKind::ReferenceCycle,
            Error::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Error::Io { .. } => ErrorKind::Io,
        }
    }

    /// Name of the operation that produced the error
    pub fn operation(&self) -> &'static str {
        match self {
            Error::NotFound { operation, .. }
            | Error::AlreadyExists { operation, .. }
            | Error::CorruptObject { operation, .. }
            | Error::DanglingReference { operation, .. }
            | Error::ReferenceCycle { operation, .. }
            | Error::InvalidArgument { operation, .. }
            | Error::Io { operation, .. } => operation,
        }
    }

    pub fn not_found(operation: &'static str, target: impl Display) -> Self {
        Error::NotFound {
            operation,
            target: target.to_string(),
        }
    }

    pub fn already_exists(operation: &'static str, target: impl Display) -> Self {
        Error::AlreadyExists {
            operation,
            target: target.to_string(),
        }
    }

    pub fn corrupt(operation: &'static str, target: impl Display, reason: impl Display) -> Self {
        Error::CorruptObject {
            operation,
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_argument(
        operation: &'static str,
        argument: impl Display,
        reason: impl Display,
    ) -> Self {
        Error::InvalidArgument {
            operation,
            argument: argument.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Build a `map_err` adapter for I/O failures
    ///
    /// ```ignore
    /// std::fs::read(&path).map_err(Error::io("read", path.display()))?;
    /// ```
    pub fn io(operation: &'static str, target: impl Display) -> impl FnOnce(std::io::Error) -> Self {
        let target = target.to_string();
        move |source| Error::Io {
            operation,
            target,
            source,
        }
    }

    /// Like [`Error::io`], but a missing file becomes [`Error::NotFound`]
    pub fn io_or_not_found(
        operation: &'static str,
        target: impl Display,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let target = target.to_string();
        move |source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound { operation, target }
            } else {
                Error::Io {
                    operation,
                    target,
                    source,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_operation_and_argument() {
        let error = Error::already_exists("branch_create", "refs/heads/main");

        assert_eq!(
            error.to_string(),
            "branch_create: refs/heads/main already exists"
        );
        assert_eq!(error.kind(), ErrorKind::AlreadyExists);
        assert_eq!(error.operation(), "branch_create");
    }

    #[test]
    fn missing_files_map_to_not_found() {
        let source = std::io::Error::from(std::io::ErrorKind::NotFound);
        let error = Error::io_or_not_found("read", "objects/ab/cdef")(source);

        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn other_io_failures_keep_their_source() {
        let source = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        let error = Error::io_or_not_found("read", "objects/ab/cdef")(source);

        assert_eq!(error.kind(), ErrorKind::Io);
        assert!(std::error::Error::source(&error).is_some());
    }
}
