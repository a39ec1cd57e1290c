//! This module provides a filesystem backend that forwards every operation to the host system.
//!
//! Host errors are translated into the same [`ErrorKind`]s the in-memory backend reports, so a
//! test written against [`MemFs`](crate::MemFs) can be pointed at a real directory unchanged.

use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::fs::{ErrorKind, File, FileSystem, FsError, FsResult, OpenFlags, PERM_MASK, utils};
use crate::{FileType, Metadata};

/// Pass-through to the host filesystem.
///
/// ### Usage notes:
/// - Relative paths are taken from the process working directory; `chdir()` changes it for the
///   whole process.
/// - Special host files (sockets, devices, fifos) are reported as regular files.
/// - `mkdir()` on an existing directory succeeds, like it does in memory.
/// - `open_file()` accepts every flag combination `open(2)` does. When `CREATE` or `TRUNC` come
///   with a read-only access mode the host file is opened for writing as well, so the caller needs
///   write permission on it; the handle itself still refuses writes.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFs;

impl OsFs {
    pub fn new() -> Self {
        OsFs
    }
}

fn convert_metadata(path: &Path, meta: &fs::Metadata) -> Metadata {
    let kind = meta.file_type();
    let file_type = if kind.is_dir() {
        FileType::Directory
    } else if kind.is_symlink() {
        FileType::Symlink
    } else {
        FileType::RegularFile
    };
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "/".to_owned());

    let converted = Metadata::new(name, file_type, meta.len(), meta.permissions().mode());
    match meta.modified() {
        Ok(modified) => converted.with_modified(modified),
        Err(_) => converted,
    }
}

impl FileSystem for OsFs {
    type File = OsFile;

    fn stat<P: AsRef<Path>>(&self, path: P) -> FsResult<Metadata> {
        let path = path.as_ref();
        let meta = fs::metadata(path).map_err(|e| FsError::from_io("stat", path, e))?;
        Ok(convert_metadata(path, &meta))
    }

    fn lstat<P: AsRef<Path>>(&self, path: P) -> FsResult<Metadata> {
        let path = path.as_ref();
        let meta = fs::symlink_metadata(path).map_err(|e| FsError::from_io("lstat", path, e))?;
        Ok(convert_metadata(path, &meta))
    }

    fn getwd(&self) -> FsResult<PathBuf> {
        std::env::current_dir().map_err(|e| FsError::from_io("getwd", ".", e))
    }

    fn chdir<P: AsRef<Path>>(&mut self, path: P) -> FsResult<()> {
        let path = path.as_ref();
        std::env::set_current_dir(path).map_err(|e| FsError::from_io("chdir", path, e))?;
        debug!(cwd = %path.display(), "changed working directory");
        Ok(())
    }

    fn abs<P: AsRef<Path>>(&self, path: P) -> FsResult<PathBuf> {
        let path = path.as_ref();
        if path.is_absolute() {
            return Ok(utils::normalize(path));
        }
        Ok(utils::normalize(self.getwd()?.join(path)))
    }

    fn chmod<P: AsRef<Path>>(&mut self, path: P, mode: u32) -> FsResult<()> {
        let path = path.as_ref();
        fs::set_permissions(path, fs::Permissions::from_mode(mode & PERM_MASK))
            .map_err(|e| FsError::from_io("chmod", path, e))?;
        debug!(path = %path.display(), mode = format_args!("{:o}", mode), "changed permissions");
        Ok(())
    }

    fn readlink<P: AsRef<Path>>(&self, path: P) -> FsResult<PathBuf> {
        let path = path.as_ref();
        if !self.lstat(path).map_err(|e| rename_op(e, "readlink"))?.is_symlink() {
            return Err(FsError::path("readlink", path, ErrorKind::NotASymlink));
        }
        fs::read_link(path).map_err(|e| FsError::from_io("readlink", path, e))
    }

    fn symlink<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, target: P, link: Q) -> FsResult<()> {
        let (target, link) = (target.as_ref(), link.as_ref());
        std::os::unix::fs::symlink(target, link)
            .map_err(|e| FsError::link("symlink", target, link, e.kind().into()))?;
        debug!(link = %link.display(), target = %target.display(), "created symlink");
        Ok(())
    }

    fn mkdir<P: AsRef<Path>>(&mut self, path: P, perm: u32) -> FsResult<()> {
        let path = path.as_ref();
        match fs::DirBuilder::new().mode(perm & PERM_MASK).create(path) {
            Ok(()) => {
                debug!(path = %path.display(), "created directory");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
            Err(e) => Err(FsError::from_io("mkdir", path, e)),
        }
    }

    fn mkdir_all<P: AsRef<Path>>(&mut self, path: P, perm: u32) -> FsResult<()> {
        let path = path.as_ref();
        fs::DirBuilder::new()
            .recursive(true)
            .mode(perm & PERM_MASK)
            .create(path)
            .map_err(|e| FsError::from_io("mkdir", path, e))?;
        debug!(path = %path.display(), "created directories");
        Ok(())
    }

    fn open_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        flags: OpenFlags,
        perm: u32,
    ) -> FsResult<OsFile> {
        let path = path.as_ref();
        let create = flags.contains(OpenFlags::CREATE);
        let truncate = flags.contains(OpenFlags::TRUNC);
        let append = flags.contains(OpenFlags::APPEND);

        // std refuses creation or truncation without write access and truncation with append
        let mut options = fs::OpenOptions::new();
        options
            .read(flags.is_readable())
            .write(flags.is_writable() || create || truncate)
            .append(append)
            .truncate(truncate && !append)
            .mode(perm & PERM_MASK);
        if create && flags.contains(OpenFlags::EXCL) {
            options.create_new(true);
        } else if create {
            options.create(true);
        }

        let file = options
            .open(path)
            .map_err(|e| FsError::from_io("open", path, e))?;
        if truncate && append {
            file.set_len(0)
                .map_err(|e| FsError::from_io("open", path, e))?;
        }
        Ok(OsFile {
            name: path.to_path_buf(),
            path: self.abs(path)?,
            flags,
            file: Some(file),
        })
    }

    fn truncate<P: AsRef<Path>>(&mut self, path: P, size: i64) -> FsResult<()> {
        let path = path.as_ref();
        let size = u64::try_from(size)
            .map_err(|_| FsError::path("truncate", path, ErrorKind::OutOfBounds))?;
        fs::OpenOptions::new()
            .write(true)
            .open(path)
            .and_then(|file| file.set_len(size))
            .map_err(|e| FsError::from_io("truncate", path, e))?;
        debug!(path = %path.display(), size, "truncated file");
        Ok(())
    }

    fn remove<P: AsRef<Path>>(&mut self, path: P) -> FsResult<()> {
        let path = path.as_ref();
        let is_dir = self.lstat(path).map_err(|e| rename_op(e, "remove"))?.is_dir();
        let removed = if is_dir {
            fs::remove_dir(path)
        } else {
            fs::remove_file(path)
        };
        removed.map_err(|e| FsError::from_io("remove", path, e))?;
        debug!(path = %path.display(), "removed");
        Ok(())
    }

    fn remove_all<P: AsRef<Path>>(&mut self, path: P) -> FsResult<()> {
        let path = path.as_ref();
        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) => {
                return match ErrorKind::from(e.kind()) {
                    ErrorKind::NotFound | ErrorKind::NotADirectory => Ok(()),
                    _ => Err(FsError::from_io("remove", path, e)),
                };
            }
        };

        let removed = if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        removed.map_err(|e| FsError::from_io("remove", path, e))?;
        debug!(path = %path.display(), "removed recursively");
        Ok(())
    }

    fn rename<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, from: P, to: Q) -> FsResult<()> {
        let (from, to) = (from.as_ref(), to.as_ref());
        fs::rename(from, to).map_err(|e| FsError::link("rename", from, to, e.kind().into()))?;
        debug!(from = %from.display(), to = %to.display(), "renamed");
        Ok(())
    }
}

/// Reports a failed lookup under the name of the operation that needed it.
fn rename_op(err: FsError, op: &'static str) -> FsError {
    match err {
        FsError::Path {
            path, kind, source, ..
        } => FsError::Path {
            op,
            path,
            kind,
            source,
        },
        other => other,
    }
}

/// A handle on a host file or directory.
#[derive(Debug)]
pub struct OsFile {
    name: PathBuf,
    /// Absolute path at open time, used to list directories.
    path: PathBuf,
    flags: OpenFlags,
    file: Option<fs::File>,
}

impl OsFile {
    /// Flags the handle was opened with.
    pub fn flags(&self) -> OpenFlags {
        self.flags
    }

    fn inner(&mut self) -> FsResult<&mut fs::File> {
        self.file.as_mut().ok_or(FsError::Handle(ErrorKind::Closed))
    }

    fn readable(&mut self) -> FsResult<&mut fs::File> {
        let allowed = self.flags.is_readable();
        let file = self.inner()?;
        if !allowed {
            return Err(FsError::Handle(ErrorKind::InvalidInput));
        }
        Ok(file)
    }

    fn writable(&mut self) -> FsResult<&mut fs::File> {
        let allowed = self.flags.is_writable();
        let file = self.inner()?;
        if !allowed {
            return Err(FsError::Handle(ErrorKind::InvalidInput));
        }
        Ok(file)
    }
}

impl File for OsFile {
    fn name(&self) -> &Path {
        &self.name
    }

    fn stat(&self) -> FsResult<Metadata> {
        let file = self.file.as_ref().ok_or(FsError::Handle(ErrorKind::Closed))?;
        let meta = file.metadata()?;
        Ok(convert_metadata(&self.path, &meta))
    }

    fn chmod(&mut self, mode: u32) -> FsResult<()> {
        self.inner()?
            .set_permissions(fs::Permissions::from_mode(mode & PERM_MASK))?;
        Ok(())
    }

    fn read_dir(&mut self, n: i32) -> FsResult<Vec<Metadata>> {
        if !self.stat()?.is_dir() {
            return Err(FsError::Handle(ErrorKind::NotADirectory));
        }

        let limit = if n > 0 { n as usize } else { usize::MAX };
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.path)?.take(limit) {
            let entry = entry?;
            let meta = entry.metadata()?;
            entries.push(convert_metadata(&entry.path(), &meta));
        }
        Ok(entries)
    }

    fn read(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        Ok(self.readable()?.read(buf)?)
    }

    fn write(&mut self, buf: &[u8]) -> FsResult<usize> {
        Ok(self.writable()?.write(buf)?)
    }

    fn seek(&mut self, pos: SeekFrom) -> FsResult<u64> {
        Ok(self.inner()?.seek(pos)?)
    }

    fn truncate(&mut self, size: i64) -> FsResult<()> {
        let size = u64::try_from(size).map_err(|_| FsError::Handle(ErrorKind::OutOfBounds))?;
        self.writable()?.set_len(size)?;
        Ok(())
    }

    fn sync(&mut self) -> FsResult<()> {
        self.inner()?.sync_all()?;
        Ok(())
    }

    fn close(&mut self) -> FsResult<()> {
        self.file.take();
        Ok(())
    }
}
