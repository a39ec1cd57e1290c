//! Contracts every filesystem backend implements.

mod error;
mod flags;
pub mod utils;

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

pub use error::{ErrorKind, FsError, FsResult};
pub use flags::OpenFlags;

use crate::Metadata;

/// Result type of the convenience layer.
pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// Permission bits a node may carry.
pub const PERM_MASK: u32 = 0o777;

/// An open file, modelled on the file-descriptor operations of POSIX.
pub trait File {
    /// The path this handle was opened with.
    fn name(&self) -> &Path;

    fn stat(&self) -> FsResult<Metadata>;

    fn chmod(&mut self, mode: u32) -> FsResult<()>;

    /// Lists up to `n` entries of the directory behind this handle; `n <= 0` lists all of them.
    /// Entries come in no particular order.
    fn read_dir(&mut self, n: i32) -> FsResult<Vec<Metadata>>;

    /// Reads from the cursor. `Ok(0)` signals end of data.
    fn read(&mut self, buf: &mut [u8]) -> FsResult<usize>;

    fn write(&mut self, buf: &[u8]) -> FsResult<usize>;

    fn seek(&mut self, pos: SeekFrom) -> FsResult<u64>;

    fn truncate(&mut self, size: i64) -> FsResult<()>;

    fn sync(&mut self) -> FsResult<()>;

    /// Closes the handle. Closing twice is not an error, every other operation on a closed
    /// handle fails with [`ErrorKind::Closed`].
    fn close(&mut self) -> FsResult<()>;
}

/// The filesystem-wide operations. Relative paths are resolved against the backend's working
/// directory.
pub trait FileSystem {
    type File: File;

    /// Returns metadata, following a final symlink.
    fn stat<P: AsRef<Path>>(&self, path: P) -> FsResult<Metadata>;

    /// Returns metadata of the entry itself, without following a final symlink.
    fn lstat<P: AsRef<Path>>(&self, path: P) -> FsResult<Metadata>;

    fn getwd(&self) -> FsResult<PathBuf>;

    fn chdir<P: AsRef<Path>>(&mut self, path: P) -> FsResult<()>;

    /// Returns the absolute, lexically normalized form of `path`.
    fn abs<P: AsRef<Path>>(&self, path: P) -> FsResult<PathBuf>;

    /// Replaces the permission bits; the kind of the entry is kept.
    fn chmod<P: AsRef<Path>>(&mut self, path: P, mode: u32) -> FsResult<()>;

    fn readlink<P: AsRef<Path>>(&self, path: P) -> FsResult<PathBuf>;

    /// Creates `link` pointing at `target`.
    fn symlink<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, target: P, link: Q) -> FsResult<()>;

    /// Creates a directory. Succeeds without changes if a directory already exists there.
    fn mkdir<P: AsRef<Path>>(&mut self, path: P, perm: u32) -> FsResult<()>;

    /// Creates a directory and every missing parent, all with `perm`.
    fn mkdir_all<P: AsRef<Path>>(&mut self, path: P, perm: u32) -> FsResult<()>;

    /// Opens for reading.
    fn open<P: AsRef<Path>>(&mut self, path: P) -> FsResult<Self::File> {
        self.open_file(path, OpenFlags::RDONLY, 0)
    }

    /// Creates or truncates a file and opens it for reading and writing.
    fn create<P: AsRef<Path>>(&mut self, path: P) -> FsResult<Self::File> {
        self.open_file(
            path,
            OpenFlags::RDWR | OpenFlags::CREATE | OpenFlags::TRUNC,
            0o666,
        )
    }

    fn open_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        flags: OpenFlags,
        perm: u32,
    ) -> FsResult<Self::File>;

    fn truncate<P: AsRef<Path>>(&mut self, path: P, size: i64) -> FsResult<()>;

    /// Removes a file, a symlink or an empty directory.
    fn remove<P: AsRef<Path>>(&mut self, path: P) -> FsResult<()>;

    /// Removes `path` and everything below it. A missing path is not an error.
    fn remove_all<P: AsRef<Path>>(&mut self, path: P) -> FsResult<()>;

    fn rename<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, from: P, to: Q) -> FsResult<()>;
}
