use std::time::SystemTime;

use crate::fs::PERM_MASK;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FileType {
    RegularFile,
    Directory,
    Symlink,
}

impl FileType {
    /// The `S_IFMT` bits of this kind.
    pub fn mode_bits(&self) -> u32 {
        match self {
            FileType::RegularFile => 0o100000,
            FileType::Directory => 0o040000,
            FileType::Symlink => 0o120000,
        }
    }
}

/// A snapshot of an entry's metadata, as returned by `stat`, `lstat` and `read_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    name: String,
    file_type: FileType,
    len: u64,
    permissions: u32,
    modified: SystemTime,
}

impl Metadata {
    pub fn new<S: Into<String>>(name: S, file_type: FileType, len: u64, permissions: u32) -> Self {
        Metadata {
            name: name.into(),
            file_type,
            len,
            permissions: permissions & PERM_MASK,
            modified: SystemTime::UNIX_EPOCH,
        }
    }

    pub fn with_modified(mut self, modified: SystemTime) -> Self {
        self.modified = modified;
        self
    }

    /// Base name of the entry.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// Size in bytes. Directories report 0, symlinks the length of their target.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn permissions(&self) -> u32 {
        self.permissions
    }

    /// Kind bits combined with the permission bits, like `st_mode`.
    pub fn mode(&self) -> u32 {
        self.file_type.mode_bits() | self.permissions
    }

    /// Modification times are not tracked in memory; such entries report the Unix epoch.
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    pub fn is_file(&self) -> bool {
        self.file_type == FileType::RegularFile
    }

    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }

    pub fn is_symlink(&self) -> bool {
        self.file_type == FileType::Symlink
    }
}
