//! Whole-file helpers that work on any [`FileSystem`].

use std::path::Path;

use anyhow::{Context, anyhow};

use crate::fs::{ErrorKind, File, FileSystem, FsError, OpenFlags, Result};
use crate::Metadata;

/// Returns true if `path` resolves to a regular file. Any lookup error counts as absent.
pub fn file_exists<F: FileSystem, P: AsRef<Path>>(fs: &F, path: P) -> bool {
    fs.stat(path).is_ok_and(|meta| meta.is_file())
}

/// Returns true if `path` resolves to a directory. Any lookup error counts as absent.
pub fn dir_exists<F: FileSystem, P: AsRef<Path>>(fs: &F, path: P) -> bool {
    fs.stat(path).is_ok_and(|meta| meta.is_dir())
}

/// Reads the whole content of a file.
pub fn read_file<F: FileSystem, P: AsRef<Path>>(fs: &mut F, path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let mut file = fs.open(path)?;

    let mut content = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        content.extend_from_slice(&buf[..n]);
    }

    file.close()?;
    Ok(content)
}

/// Writes `data` to `path`, creating the file with `perm` or truncating an existing one.
///
/// Fails with [`ErrorKind::ShortWrite`] if not every byte was written. A close error is reported
/// when nothing failed before it.
pub fn write_file<F: FileSystem, P: AsRef<Path>>(
    fs: &mut F,
    path: P,
    data: &[u8],
    perm: u32,
) -> Result<()> {
    let path = path.as_ref();
    let flags = OpenFlags::WRONLY | OpenFlags::CREATE | OpenFlags::TRUNC;
    let mut file = fs.open_file(path, flags, perm)?;

    let written: Result<()> = match file.write(data) {
        Ok(n) if n < data.len() => Err(FsError::path("write", path, ErrorKind::ShortWrite).into()),
        Ok(_) => Ok(()),
        Err(e) => Err(anyhow!(e).context(format!("write {}", path.display()))),
    };
    let closed = file.close();

    written?;
    closed?;
    Ok(())
}

/// Lists the entries of a directory, sorted by name.
pub fn read_dir<F: FileSystem, P: AsRef<Path>>(fs: &mut F, path: P) -> Result<Vec<Metadata>> {
    let path = path.as_ref();
    let mut dir = fs.open(path)?;
    let listed = dir.read_dir(-1);
    dir.close()?;

    let mut entries = listed.with_context(|| format!("readdir {}", path.display()))?;
    entries.sort_by(|a, b| a.name().cmp(b.name()));
    Ok(entries)
}
