//! Error types shared by every filesystem backend.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// What went wrong, independent of which operation or backend reported it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    NotADirectory,
    NotARegularFile,
    NotASymlink,
    AlreadyExists,
    NonEmptyDirectory,
    Closed,
    OutOfBounds,
    /// Symlink resolution exceeded the configured number of hops.
    TooManyLinks,
    InvalidInput,
    /// Fewer bytes were written than requested.
    ShortWrite,
    Other,
}

impl ErrorKind {
    fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "no such file or directory",
            ErrorKind::NotADirectory => "not a directory",
            ErrorKind::NotARegularFile => "not a regular file",
            ErrorKind::NotASymlink => "not a symlink",
            ErrorKind::AlreadyExists => "file exists",
            ErrorKind::NonEmptyDirectory => "directory not empty",
            ErrorKind::Closed => "file already closed",
            ErrorKind::OutOfBounds => "offset out of bounds",
            ErrorKind::TooManyLinks => "too many levels of symbolic links",
            ErrorKind::InvalidInput => "invalid argument",
            ErrorKind::ShortWrite => "short write",
            ErrorKind::Other => "other error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<io::ErrorKind> for ErrorKind {
    fn from(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::NotFound => ErrorKind::NotFound,
            io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists,
            io::ErrorKind::NotADirectory => ErrorKind::NotADirectory,
            io::ErrorKind::IsADirectory => ErrorKind::NotARegularFile,
            io::ErrorKind::DirectoryNotEmpty => ErrorKind::NonEmptyDirectory,
            io::ErrorKind::InvalidInput => ErrorKind::InvalidInput,
            io::ErrorKind::WriteZero => ErrorKind::ShortWrite,
            _ => ErrorKind::Other,
        }
    }
}

/// Error returned by [`FileSystem`](crate::FileSystem) and [`File`](crate::File) operations.
///
/// Filesystem-level failures carry the operation name and the path(s) the caller passed,
/// handle-level failures only carry the kind.
#[derive(thiserror::Error, Debug)]
pub enum FsError {
    #[error("{op} {}: {kind}", path.display())]
    Path {
        op: &'static str,
        path: PathBuf,
        kind: ErrorKind,
        #[source]
        source: Option<io::Error>,
    },
    #[error("{op} {} {}: {kind}", from.display(), to.display())]
    Link {
        op: &'static str,
        from: PathBuf,
        to: PathBuf,
        kind: ErrorKind,
    },
    #[error("{0}")]
    Handle(ErrorKind),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl FsError {
    pub fn path<P: AsRef<Path>>(op: &'static str, path: P, kind: ErrorKind) -> Self {
        FsError::Path {
            op,
            path: path.as_ref().to_path_buf(),
            kind,
            source: None,
        }
    }

    pub fn link<P: AsRef<Path>, Q: AsRef<Path>>(
        op: &'static str,
        from: P,
        to: Q,
        kind: ErrorKind,
    ) -> Self {
        FsError::Link {
            op,
            from: from.as_ref().to_path_buf(),
            to: to.as_ref().to_path_buf(),
            kind,
        }
    }

    /// Wraps a host error, keeping it as the source.
    pub fn from_io<P: AsRef<Path>>(op: &'static str, path: P, err: io::Error) -> Self {
        FsError::Path {
            op,
            path: path.as_ref().to_path_buf(),
            kind: err.kind().into(),
            source: Some(err),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::Path { kind, .. } | FsError::Link { kind, .. } => *kind,
            FsError::Handle(kind) => *kind,
            FsError::Io(err) => err.kind().into(),
        }
    }
}

impl From<ErrorKind> for FsError {
    fn from(kind: ErrorKind) -> Self {
        FsError::Handle(kind)
    }
}

pub type FsResult<T> = std::result::Result<T, FsError>;
