use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use crate::fs::{ErrorKind, File, FsError, FsResult, OpenFlags};
use crate::Metadata;
use crate::vfs::node::NodeRef;

/// An open handle onto a node of a [`MemFs`](crate::MemFs).
///
/// The handle shares the node with the tree: writes are visible to every other handle on the
/// same node, and a handle keeps working on its node after the node has been removed or renamed.
///
/// ### Writes
///
/// A write at the end of the data appends. A write inside the data overwrites in place and, if
/// it runs past the end, grows the buffer to fit. When the cursor lies past the end (the file was
/// truncated under it), the gap is filled with zeros first.
///
/// ### Access mode
///
/// The access mode given at open time is kept: reading needs `RDONLY` or `RDWR`, writing and
/// truncating need `WRONLY` or `RDWR`. Other calls fail with `InvalidInput`.
#[derive(Debug)]
pub struct MemFile {
    name: PathBuf,
    node: NodeRef,
    flags: OpenFlags,
    cursor: usize,
    closed: bool,
}

impl MemFile {
    pub(crate) fn new(name: PathBuf, node: NodeRef, flags: OpenFlags, cursor: usize) -> Self {
        MemFile {
            name,
            node,
            flags,
            cursor,
            closed: false,
        }
    }

    /// Flags the handle was opened with.
    pub fn flags(&self) -> OpenFlags {
        self.flags
    }

    /// Current cursor position.
    pub fn position(&self) -> u64 {
        self.cursor as u64
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> FsResult<()> {
        if self.closed {
            return Err(FsError::Handle(ErrorKind::Closed));
        }
        Ok(())
    }

    fn ensure_readable(&self) -> FsResult<()> {
        self.ensure_open()?;
        if !self.flags.is_readable() {
            return Err(FsError::Handle(ErrorKind::InvalidInput));
        }
        Ok(())
    }

    fn ensure_writable(&self) -> FsResult<()> {
        self.ensure_open()?;
        if !self.flags.is_writable() {
            return Err(FsError::Handle(ErrorKind::InvalidInput));
        }
        Ok(())
    }
}

impl File for MemFile {
    fn name(&self) -> &Path {
        &self.name
    }

    fn stat(&self) -> FsResult<Metadata> {
        self.ensure_open()?;
        let meta = self.node.borrow().metadata();
        Ok(meta)
    }

    fn chmod(&mut self, mode: u32) -> FsResult<()> {
        self.ensure_open()?;
        self.node.borrow_mut().set_permissions(mode);
        Ok(())
    }

    fn read_dir(&mut self, n: i32) -> FsResult<Vec<Metadata>> {
        self.ensure_open()?;
        let node = self.node.borrow();
        let children = node
            .children()
            .ok_or(FsError::Handle(ErrorKind::NotADirectory))?;

        let limit = usize::try_from(n).ok().filter(|&n| n > 0).unwrap_or(usize::MAX);
        let entries = children
            .values()
            .take(limit)
            .map(|child| child.borrow().metadata())
            .collect();
        Ok(entries)
    }

    fn read(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        self.ensure_readable()?;
        let node = self.node.borrow();
        let data = node
            .contents()
            .ok_or(FsError::Handle(ErrorKind::NotARegularFile))?;

        if self.cursor >= data.len() {
            return Ok(0);
        }
        let count = buf.len().min(data.len() - self.cursor);
        buf[..count].copy_from_slice(&data[self.cursor..self.cursor + count]);
        self.cursor += count;
        Ok(count)
    }

    fn write(&mut self, buf: &[u8]) -> FsResult<usize> {
        self.ensure_writable()?;
        let mut node = self.node.borrow_mut();
        let data = node
            .contents_mut()
            .ok_or(FsError::Handle(ErrorKind::NotARegularFile))?;

        let end = self.cursor + buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[self.cursor..end].copy_from_slice(buf);
        self.cursor = end;
        Ok(buf.len())
    }

    fn seek(&mut self, pos: SeekFrom) -> FsResult<u64> {
        self.ensure_open()?;
        let len = self
            .node
            .borrow()
            .contents()
            .map(|data| data.len())
            .ok_or(FsError::Handle(ErrorKind::NotARegularFile))?;

        let target = match pos {
            SeekFrom::Start(offset) => i64::try_from(offset).ok(),
            SeekFrom::Current(offset) => (self.cursor as i64).checked_add(offset),
            SeekFrom::End(offset) => (len as i64).checked_add(offset),
        };
        match target {
            Some(target) if (0..=len as i64).contains(&target) => {
                self.cursor = target as usize;
                Ok(target as u64)
            }
            _ => Err(FsError::Handle(ErrorKind::OutOfBounds)),
        }
    }

    fn truncate(&mut self, size: i64) -> FsResult<()> {
        self.ensure_writable()?;
        self.node.borrow_mut().truncate(size).map_err(FsError::Handle)
    }

    fn sync(&mut self) -> FsResult<()> {
        self.ensure_open()
    }

    fn close(&mut self) -> FsResult<()> {
        self.closed = true;
        Ok(())
    }
}
