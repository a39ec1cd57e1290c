mod mem_file;
mod mem_fs;
mod metadata;
mod node;
mod options;
#[cfg(unix)]
mod os_fs;
mod resolve;

pub use mem_file::MemFile;
pub use mem_fs::MemFs;
pub use metadata::{FileType, Metadata};
pub use options::MemFsOptions;
#[cfg(unix)]
pub use os_fs::{OsFile, OsFs};
