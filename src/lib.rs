//! A pluggable filesystem abstraction for Rust, with an in-memory implementation for tests.
//! Code written against the [`FileSystem`] and [`File`] traits runs unchanged on the host
//! filesystem or on a fully virtual one.
//!
//! ### Overview
//!
//! `vfs-mock` defines the generic `FileSystem` trait (filesystem-wide operations) and the `File`
//! trait (operations on an open handle), modelled on POSIX. Two backends are provided: `OsFs`,
//! which forwards to the operating system, and `MemFs`, a tree of directories, regular files and
//! symlinks that lives entirely in memory.
//!
//! **Key ideas**:
//! - **Abstraction**: Depend on `FileSystem` and pick the backend at the call site.
//! - **Fidelity**: `MemFs` follows POSIX semantics for paths, symlinks, open flags and errors.
//! - **Testability**: Use `MemFs` in unit tests to exercise filesystem code without side effects.
//! - **Clarity**: Errors name the operation, the path and what went wrong, and expose an
//!   [`ErrorKind`] for assertions.
//!
//! ### Example
//!
//! ```
//! use vfs_mock::{FileSystem, MemFs, read_file, write_file};
//!
//! let mut fs = MemFs::new();
//! fs.mkdir_all("/etc/app", 0o755).unwrap();
//! write_file(&mut fs, "/etc/app/config", b"debug = true", 0o644).unwrap();
//!
//! fs.symlink("/etc/app/config", "/config").unwrap();
//! assert_eq!(read_file(&mut fs, "/config").unwrap(), b"debug = true");
//! assert!(fs.lstat("/config").unwrap().is_symlink());
//! ```

mod fs;
mod helpers;
mod vfs;

pub use fs::{ErrorKind, File, FileSystem, FsError, FsResult, OpenFlags, PERM_MASK, Result, utils};
pub use helpers::{dir_exists, file_exists, read_dir, read_file, write_file};
pub use vfs::{FileType, MemFile, MemFs, MemFsOptions, Metadata};
#[cfg(unix)]
pub use vfs::{OsFile, OsFs};
