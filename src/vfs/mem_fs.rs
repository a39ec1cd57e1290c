//! This module provides a virtual filesystem (VFS) implementation that lives entirely in memory.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::fs::{ErrorKind, FileSystem, FsError, FsResult, OpenFlags, utils};
use crate::vfs::node::{Node, NodeRef};
use crate::{MemFile, MemFsOptions, Metadata};

/// An in-memory filesystem reproducing POSIX file semantics, for tests that must not touch disk.
///
/// `MemFs` keeps a tree of nodes (regular files, directories and symlinks) rooted at `/`, plus a
/// current working directory against which relative paths are resolved.
///
/// ### Internal state
///
/// * `root`: The root directory node. It always exists, is a directory and has no parent.
/// * `cwd`: Current working directory, an absolute normalized path. Starts at `/` and is changed
///   by `chdir()`. It is a plain path: if the directory is later removed, relative lookups fail
///   with `NotFound`.
/// * `options`: Limits and defaults, see [`MemFsOptions`].
///
/// ### Path resolution
///
/// Paths are made absolute and normalized lexically (`.` and `..` are resolved before the tree
/// is walked). A trailing separator (`dir/`) is kept in mind: lookups and opens through it
/// require a directory. Names must be valid UTF-8. Symlinks in the middle of a path are always followed; a final symlink is followed
/// by `stat()`, `open_file()`, `chdir()`, `chmod()` and `truncate()`, and left alone by
/// `lstat()`, `readlink()`, `remove()` and `rename()`. Symlink targets are stored as absolute
/// paths, relative targets being resolved against the cwd at creation time.
///
/// ### Thread Safety
///
/// Nodes are shared through `Rc<RefCell<_>>`, so neither `MemFs` nor its handles are `Send`.
/// Create one instance per test.
///
/// ### Example
///
/// ```
/// use vfs_mock::{File, FileSystem, MemFs};
///
/// let mut fs = MemFs::new();
/// fs.mkdir_all("/docs", 0o755).unwrap();
///
/// let mut f = fs.create("/docs/note.txt").unwrap();
/// f.write(b"Hello").unwrap();
/// f.close().unwrap();
///
/// assert_eq!(fs.stat("/docs/note.txt").unwrap().len(), 5);
/// ```
#[derive(Debug)]
pub struct MemFs {
    pub(crate) root: NodeRef,
    pub(crate) cwd: PathBuf,
    pub(crate) options: MemFsOptions,
}

impl MemFs {
    /// Creates an empty filesystem: only the root directory exists and it is the cwd.
    pub fn new() -> Self {
        Self::with_options(MemFsOptions::default())
    }

    pub fn with_options(options: MemFsOptions) -> Self {
        Self {
            root: Node::new_root(options.root_mode()),
            cwd: PathBuf::from("/"),
            options,
        }
    }

    pub fn options(&self) -> &MemFsOptions {
        &self.options
    }

    /// Resolves `path` for operation `op`. A trailing separator requires a directory and
    /// dereferences a final symlink, as in `link/`.
    fn lookup(&self, op: &'static str, path: &Path, follow: bool) -> FsResult<NodeRef> {
        let err = |kind| FsError::path(op, path, kind);
        let abs = self.to_abs(path);

        if !utils::has_trailing_separator(path) {
            return self.resolve(&abs, follow).map_err(err);
        }
        let node = self.resolve(&abs, true).map_err(err)?;
        if !node.borrow().is_dir() {
            return Err(err(ErrorKind::NotADirectory));
        }
        Ok(node)
    }

    /// Finds or creates the node `open_file()` with `CREATE` refers to.
    fn open_or_create(
        &self,
        abs: &Path,
        flags: OpenFlags,
        perm: u32,
    ) -> Result<NodeRef, ErrorKind> {
        let exclusive = flags.contains(OpenFlags::EXCL);
        let Some((_, name)) = utils::split(abs)? else {
            return if exclusive {
                Err(ErrorKind::AlreadyExists)
            } else {
                Ok(Rc::clone(&self.root))
            };
        };

        let (dir, _) = self.resolve_parent(abs)?;
        match Node::child(&dir, &name)? {
            Some(_) if exclusive => Err(ErrorKind::AlreadyExists),
            Some(existing) => self.follow(existing),
            None => {
                let file = Node::new_file(&name, perm);
                Node::attach(&dir, Rc::clone(&file));
                debug!(path = %abs.display(), perm = format_args!("{:o}", perm), "created file");
                Ok(file)
            }
        }
    }

    /// Creates `abs` and its missing parents, returning the directory at `abs`.
    fn mkdir_all_abs(&self, abs: &Path, perm: u32) -> Result<NodeRef, ErrorKind> {
        let Some((parent, name)) = utils::split(abs)? else {
            return Ok(Rc::clone(&self.root));
        };

        let dir = self.mkdir_all_abs(parent, perm)?;
        if let Some(existing) = Node::child(&dir, &name)? {
            // a dangling or cyclic symlink still occupies the name
            let existing = self
                .follow(existing)
                .map_err(|_| ErrorKind::AlreadyExists)?;
            if !existing.borrow().is_dir() {
                return Err(ErrorKind::AlreadyExists);
            }
            return Ok(existing);
        }

        let created = Node::new_dir(&name, perm);
        Node::attach(&dir, Rc::clone(&created));
        debug!(path = %abs.display(), "created directory");
        Ok(created)
    }
}

impl Default for MemFs {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MemFs {
    type File = MemFile;

    fn stat<P: AsRef<Path>>(&self, path: P) -> FsResult<Metadata> {
        let node = self.lookup("stat", path.as_ref(), true)?;
        let meta = node.borrow().metadata();
        Ok(meta)
    }

    fn lstat<P: AsRef<Path>>(&self, path: P) -> FsResult<Metadata> {
        let node = self.lookup("lstat", path.as_ref(), false)?;
        let meta = node.borrow().metadata();
        Ok(meta)
    }

    fn getwd(&self) -> FsResult<PathBuf> {
        Ok(self.cwd.clone())
    }

    /// Changes the current working directory.
    /// * `path` can be in relative or absolute form, but in both cases it must resolve to a
    ///   directory.
    fn chdir<P: AsRef<Path>>(&mut self, path: P) -> FsResult<()> {
        let path = path.as_ref();
        let node = self.lookup("chdir", path, true)?;
        if !node.borrow().is_dir() {
            return Err(FsError::path("chdir", path, ErrorKind::NotADirectory));
        }
        self.cwd = self.to_abs(path);
        debug!(cwd = %self.cwd.display(), "changed working directory");
        Ok(())
    }

    fn abs<P: AsRef<Path>>(&self, path: P) -> FsResult<PathBuf> {
        Ok(self.to_abs(path))
    }

    fn chmod<P: AsRef<Path>>(&mut self, path: P, mode: u32) -> FsResult<()> {
        let path = path.as_ref();
        let node = self.lookup("chmod", path, true)?;
        node.borrow_mut().set_permissions(mode);
        debug!(path = %path.display(), mode = format_args!("{:o}", mode), "changed permissions");
        Ok(())
    }

    fn readlink<P: AsRef<Path>>(&self, path: P) -> FsResult<PathBuf> {
        let path = path.as_ref();
        let node = self.lookup("readlink", path, false)?;
        let target = node.borrow().symlink_target().map(Path::to_path_buf);
        target.ok_or_else(|| FsError::path("readlink", path, ErrorKind::NotASymlink))
    }

    /// Creates a symlink at `link` storing the absolute form of `target`. The target does not
    /// have to exist.
    fn symlink<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, target: P, link: Q) -> FsResult<()> {
        let (target, link) = (target.as_ref(), link.as_ref());
        let err = |kind| FsError::link("symlink", target, link, kind);

        let link_abs = self.to_abs(link);
        if utils::is_virtual_root(&link_abs) {
            return Err(err(ErrorKind::AlreadyExists));
        }
        let (dir, name) = self.resolve_parent(&link_abs).map_err(err)?;
        if Node::child(&dir, &name).map_err(err)?.is_some() {
            return Err(err(ErrorKind::AlreadyExists));
        }

        let target_abs = self.to_abs(target);
        debug!(link = %link_abs.display(), target = %target_abs.display(), "created symlink");
        Node::attach(&dir, Node::new_symlink(&name, target_abs));
        Ok(())
    }

    /// Creates a directory with permission bits `perm`.
    /// Succeeds without changes when a directory already exists at `path`; any other existing
    /// entry is an `AlreadyExists` error. The parent must exist.
    fn mkdir<P: AsRef<Path>>(&mut self, path: P, perm: u32) -> FsResult<()> {
        let path = path.as_ref();
        let err = |kind| FsError::path("mkdir", path, kind);

        let abs = self.to_abs(path);
        if utils::is_virtual_root(&abs) {
            return Ok(());
        }
        let (dir, name) = self.resolve_parent(&abs).map_err(err)?;
        if let Some(existing) = Node::child(&dir, &name).map_err(err)? {
            if existing.borrow().is_dir() {
                return Ok(());
            }
            return Err(err(ErrorKind::AlreadyExists));
        }

        Node::attach(&dir, Node::new_dir(&name, perm));
        debug!(path = %abs.display(), perm = format_args!("{:o}", perm), "created directory");
        Ok(())
    }

    fn mkdir_all<P: AsRef<Path>>(&mut self, path: P, perm: u32) -> FsResult<()> {
        let path = path.as_ref();
        let abs = self.to_abs(path);
        self.mkdir_all_abs(&abs, perm)
            .map(|_| ())
            .map_err(|kind| FsError::path("mkdir", path, kind))
    }

    /// Opens `path` according to `flags`.
    ///
    /// # Behavior
    /// - Without `CREATE` the path must resolve; symlinks are followed.
    /// - With `CREATE` a missing file is created with permission bits `perm`; with `EXCL` as well,
    ///   an existing entry is an `AlreadyExists` error.
    /// - The target must be a regular file. A plain read-only open of a directory is allowed and
    ///   yields a handle for `read_dir()`.
    /// - `TRUNC` empties the file, `APPEND` places the cursor at the end.
    /// - The access mode is recorded in the handle: reads need `RDONLY` or `RDWR`, writes and
    ///   truncation need `WRONLY` or `RDWR`.
    /// - A path spelled with a trailing separator must name an existing directory.
    fn open_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        flags: OpenFlags,
        perm: u32,
    ) -> FsResult<MemFile> {
        let path = path.as_ref();
        let err = |kind| FsError::path("open", path, kind);

        let abs = self.to_abs(path);
        let node = if utils::has_trailing_separator(path) {
            self.lookup("open", path, true)?
        } else if flags.contains(OpenFlags::CREATE) {
            self.open_or_create(&abs, flags, perm).map_err(err)?
        } else {
            self.resolve(&abs, true).map_err(err)?
        };

        let is_dir = node.borrow().is_dir();
        if is_dir {
            if !flags.is_plain_read() {
                return Err(err(ErrorKind::NotARegularFile));
            }
            trace!(path = %abs.display(), "opened directory");
            return Ok(MemFile::new(path.to_path_buf(), node, flags, 0));
        }

        let cursor = {
            let mut file = node.borrow_mut();
            let data = file
                .contents_mut()
                .ok_or(err(ErrorKind::NotARegularFile))?;
            if flags.contains(OpenFlags::TRUNC) {
                data.clear();
            }
            if flags.contains(OpenFlags::APPEND) {
                data.len()
            } else {
                0
            }
        };

        trace!(path = %abs.display(), ?flags, cursor, "opened file");
        Ok(MemFile::new(path.to_path_buf(), node, flags, cursor))
    }

    /// Resizes a regular file: shrinking drops trailing bytes, growing pads with zeros.
    fn truncate<P: AsRef<Path>>(&mut self, path: P, size: i64) -> FsResult<()> {
        let path = path.as_ref();
        let node = self.lookup("truncate", path, true)?;
        node.borrow_mut()
            .truncate(size)
            .map_err(|kind| FsError::path("truncate", path, kind))?;
        debug!(path = %path.display(), size, "truncated file");
        Ok(())
    }

    /// Removes a file, a symlink (not its target) or an empty directory.
    fn remove<P: AsRef<Path>>(&mut self, path: P) -> FsResult<()> {
        let path = path.as_ref();
        let err = |kind| FsError::path("remove", path, kind);

        let abs = self.to_abs(path);
        let (dir, name) = self.resolve_parent(&abs).map_err(err)?;
        let node = Node::child(&dir, &name)
            .map_err(err)?
            .ok_or_else(|| err(ErrorKind::NotFound))?;
        if node.borrow().has_children() {
            return Err(err(ErrorKind::NonEmptyDirectory));
        }

        Node::detach(&dir, &name);
        debug!(path = %abs.display(), "removed");
        Ok(())
    }

    /// Removes `path` and all of its descendants, depth first.
    ///
    /// A missing path (or one below a non-directory) is not an error. Removing `/` empties the
    /// filesystem but keeps the root directory.
    fn remove_all<P: AsRef<Path>>(&mut self, path: P) -> FsResult<()> {
        let abs = self.to_abs(path);

        let name = match utils::split(&abs) {
            Ok(Some((_, name))) => name,
            Ok(None) => {
                Node::clear(&self.root);
                debug!("removed all entries");
                return Ok(());
            }
            // such a name can not exist in the tree
            Err(_) => return Ok(()),
        };
        let Ok((dir, _)) = self.resolve_parent(&abs) else {
            return Ok(());
        };
        let Ok(Some(node)) = Node::child(&dir, &name) else {
            return Ok(());
        };

        Node::clear(&node);
        Node::detach(&dir, &name);
        debug!(path = %abs.display(), "removed recursively");
        Ok(())
    }

    /// Moves the entry at `from` to `to`, which may lie in another directory.
    ///
    /// An existing entry at `to` is replaced unless it is a non-empty directory or the kinds
    /// clash (directory onto non-directory or the reverse). A directory cannot be moved below
    /// itself.
    fn rename<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, from: P, to: Q) -> FsResult<()> {
        let (from, to) = (from.as_ref(), to.as_ref());
        let err = |kind| FsError::link("rename", from, to, kind);

        let old_abs = self.to_abs(from);
        let new_abs = self.to_abs(to);

        let (old_dir, old_name) = self.resolve_parent(&old_abs).map_err(err)?;
        let node = Node::child(&old_dir, &old_name)
            .map_err(err)?
            .ok_or_else(|| err(ErrorKind::NotFound))?;
        let (new_dir, new_name) = self.resolve_parent(&new_abs).map_err(err)?;

        if old_abs == new_abs {
            return Ok(());
        }
        if Node::is_ancestor(&node, &new_dir) {
            return Err(err(ErrorKind::InvalidInput));
        }

        if let Some(existing) = Node::child(&new_dir, &new_name).map_err(err)? {
            if Rc::ptr_eq(&existing, &node) {
                return Ok(());
            }
            let existing = existing.borrow();
            let moving_dir = node.borrow().is_dir();
            match (moving_dir, existing.is_dir()) {
                (true, false) => return Err(err(ErrorKind::NotADirectory)),
                (false, true) => return Err(err(ErrorKind::NotARegularFile)),
                _ => {}
            }
            if existing.has_children() {
                return Err(err(ErrorKind::NonEmptyDirectory));
            }
        }

        Node::detach(&old_dir, &old_name);
        Node::rename(&node, &new_name);
        Node::attach(&new_dir, node);
        debug!(from = %old_abs.display(), to = %new_abs.display(), "renamed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{File, FileType};
    use std::io::SeekFrom;

    /// Helper to create a pre‑populated MemFs instance for testing
    fn setup_test_vfs() -> MemFs {
        let mut vfs = MemFs::new();

        vfs.mkdir("/etc", 0o755).unwrap();
        vfs.mkdir_all("/home/user", 0o755).unwrap();
        write(&mut vfs, "/home/user/file.txt", b"Hello");
        write(&mut vfs, "/readme.md", b"Project docs");

        vfs
    }

    fn write(vfs: &mut MemFs, path: &str, content: &[u8]) {
        let mut f = vfs.create(path).unwrap();
        f.write(content).unwrap();
        f.close().unwrap();
    }

    fn read(vfs: &mut MemFs, path: &str) -> FsResult<Vec<u8>> {
        let mut f = vfs.open(path)?;
        let mut content = Vec::new();
        let mut buf = [0u8; 4];
        loop {
            let n = f.read(&mut buf)?;
            if n == 0 {
                break;
            }
            content.extend_from_slice(&buf[..n]);
        }
        f.close()?;
        Ok(content)
    }

    fn kind<T: std::fmt::Debug>(result: FsResult<T>) -> ErrorKind {
        result.unwrap_err().kind()
    }

    mod creations {
        use super::*;

        #[test]
        fn test_new_mem_fs() {
            let vfs = MemFs::new();
            assert_eq!(vfs.getwd().unwrap(), Path::new("/"));

            let root = vfs.stat("/").unwrap();
            assert!(root.is_dir());
            assert_eq!(root.permissions(), 0o755);
            assert!(root.is_empty());
        }

        #[test]
        fn test_with_options() {
            let vfs = MemFs::with_options(MemFsOptions::default().root_permissions(0o700));
            assert_eq!(vfs.stat("/").unwrap().permissions(), 0o700);
            assert_eq!(vfs.options().hops_limit(), 40);
        }

        #[test]
        fn test_instances_are_independent() {
            let mut first = MemFs::new();
            let second = MemFs::new();
            first.mkdir("/only_here", 0o755).unwrap();
            assert!(second.stat("/only_here").is_err());
        }
    }

    mod stat {
        use super::*;

        #[test]
        fn test_stat_file() -> FsResult<()> {
            let vfs = setup_test_vfs();
            let meta = vfs.stat("/home/user/file.txt")?;
            assert_eq!(meta.name(), "file.txt");
            assert_eq!(meta.file_type(), FileType::RegularFile);
            assert_eq!(meta.len(), 5);
            assert_eq!(meta.permissions(), 0o666);
            Ok(())
        }

        #[test]
        fn test_stat_missing() {
            let vfs = setup_test_vfs();
            let err = vfs.stat("/home/guest").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
            assert_eq!(err.to_string(), "stat /home/guest: no such file or directory");
        }

        #[test]
        fn test_stat_below_file() {
            let vfs = setup_test_vfs();
            assert_eq!(kind(vfs.stat("/readme.md/inner")), ErrorKind::NotADirectory);
        }

        #[test]
        fn test_trailing_separator_requires_directory() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.symlink("/home", "/home_link")?;

            assert_eq!(kind(vfs.stat("/readme.md/")), ErrorKind::NotADirectory);
            assert_eq!(kind(vfs.lstat("/readme.md/")), ErrorKind::NotADirectory);
            assert!(vfs.stat("/home/")?.is_dir());
            assert!(vfs.lstat("/home_link/")?.is_dir());
            assert!(vfs.lstat("/home_link")?.is_symlink());

            assert_eq!(kind(vfs.open("/readme.md/")), ErrorKind::NotADirectory);
            assert_eq!(
                kind(vfs.open_file("/fresh/", OpenFlags::RDWR | OpenFlags::CREATE, 0o644)),
                ErrorKind::NotFound
            );
            assert_eq!(kind(vfs.stat("/fresh")), ErrorKind::NotFound);
            Ok(())
        }

        #[cfg(unix)]
        #[test]
        fn test_non_utf8_names_are_rejected() {
            use std::ffi::OsStr;
            use std::os::unix::ffi::OsStrExt;

            let mut vfs = setup_test_vfs();
            let first = Path::new("/").join(OsStr::from_bytes(b"name\xff"));
            let second = Path::new("/").join(OsStr::from_bytes(b"name\xfe"));

            assert_eq!(kind(vfs.create(&first)), ErrorKind::InvalidInput);
            assert_eq!(kind(vfs.mkdir(&second, 0o755)), ErrorKind::InvalidInput);
            assert_eq!(kind(vfs.stat(&first)), ErrorKind::InvalidInput);
            vfs.remove_all(&first).unwrap();
            assert!(vfs.stat("/readme.md").is_ok());
        }

        #[test]
        fn test_stat_relative_and_dotted() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.chdir("/home/user")?;
            assert!(vfs.stat("file.txt")?.is_file());
            assert!(vfs.stat("./file.txt")?.is_file());
            assert!(vfs.stat("..")?.is_dir());
            assert!(vfs.stat("../../etc")?.is_dir());
            assert!(vfs.stat("")?.is_dir());
            Ok(())
        }

        #[test]
        fn test_stat_and_lstat_on_symlink() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.symlink("/readme.md", "/link")?;

            let followed = vfs.stat("/link")?;
            assert!(followed.is_file());
            assert_eq!(followed.len(), 12);

            let own = vfs.lstat("/link")?;
            assert!(own.is_symlink());
            assert_eq!(own.name(), "link");
            assert_eq!(own.len(), "/readme.md".len() as u64);
            Ok(())
        }

        #[test]
        fn test_stat_dangling_symlink() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.symlink("/nowhere", "/dangling")?;
            assert_eq!(kind(vfs.stat("/dangling")), ErrorKind::NotFound);
            assert!(vfs.lstat("/dangling")?.is_symlink());
            Ok(())
        }

        #[test]
        fn test_stat_symlink_cycle() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.symlink("/b", "/a")?;
            vfs.symlink("/a", "/b")?;
            assert_eq!(kind(vfs.stat("/a")), ErrorKind::TooManyLinks);
            assert!(vfs.lstat("/a")?.is_symlink());
            Ok(())
        }
    }

    mod chdir {
        use super::*;

        #[test]
        fn test_chdir_absolute_and_relative() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.chdir("/home")?;
            assert_eq!(vfs.getwd()?, Path::new("/home"));

            vfs.chdir("user")?;
            assert_eq!(vfs.getwd()?, Path::new("/home/user"));

            vfs.chdir("../..")?;
            assert_eq!(vfs.getwd()?, Path::new("/"));
            Ok(())
        }

        #[test]
        fn test_chdir_with_trailing_slash() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.chdir("/home/user//")?;
            assert_eq!(vfs.getwd()?, Path::new("/home/user"));
            Ok(())
        }

        #[test]
        fn test_chdir_errors_keep_cwd() {
            let mut vfs = setup_test_vfs();
            assert_eq!(kind(vfs.chdir("/nonexistent")), ErrorKind::NotFound);
            assert_eq!(kind(vfs.chdir("/readme.md")), ErrorKind::NotADirectory);
            assert_eq!(vfs.getwd().unwrap(), Path::new("/"));
        }

        #[test]
        fn test_chdir_through_symlink() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.symlink("/home/user", "/me")?;
            vfs.chdir("/me")?;
            assert_eq!(vfs.getwd()?, Path::new("/me"));
            assert!(vfs.stat("file.txt")?.is_file());
            Ok(())
        }

        #[test]
        fn test_abs() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.chdir("/home")?;
            assert_eq!(vfs.abs("user/./x/../file.txt")?, Path::new("/home/user/file.txt"));
            assert_eq!(vfs.abs("/etc")?, Path::new("/etc"));
            Ok(())
        }
    }

    mod mkdir {
        use super::*;

        #[test]
        fn test_mkdir_simple_directory() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.mkdir("/test", 0o700)?;

            let meta = vfs.stat("/test")?;
            assert!(meta.is_dir());
            assert_eq!(meta.permissions(), 0o700);
            Ok(())
        }

        #[test]
        fn test_mkdir_is_idempotent() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.mkdir("/home", 0o700)?;
            vfs.mkdir("/home", 0o700)?;

            assert!(vfs.stat("/home/user")?.is_dir());
            assert_eq!(vfs.stat("/home")?.permissions(), 0o755); // untouched
            Ok(())
        }

        #[test]
        fn test_mkdir_root() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.mkdir("/", 0o700)?;
            assert!(vfs.stat("/readme.md").is_ok());
            Ok(())
        }

        #[test]
        fn test_mkdir_over_file() {
            let mut vfs = setup_test_vfs();
            assert_eq!(kind(vfs.mkdir("/readme.md", 0o755)), ErrorKind::AlreadyExists);
        }

        #[test]
        fn test_mkdir_missing_parent() {
            let mut vfs = setup_test_vfs();
            assert_eq!(kind(vfs.mkdir("/a/b", 0o755)), ErrorKind::NotFound);
        }

        #[test]
        fn test_mkdir_parent_is_file() {
            let mut vfs = setup_test_vfs();
            assert_eq!(kind(vfs.mkdir("/readme.md/sub", 0o755)), ErrorKind::NotADirectory);
        }

        #[test]
        fn test_mkdir_all_nested() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.mkdir_all("/a/b/c/d", 0o711)?;

            for path in ["/a", "/a/b", "/a/b/c", "/a/b/c/d"] {
                let meta = vfs.stat(path)?;
                assert!(meta.is_dir());
                assert_eq!(meta.permissions(), 0o711);
            }
            Ok(())
        }

        #[test]
        fn test_mkdir_all_existing_and_relative() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.chdir("/home")?;
            vfs.mkdir_all("user/projects", 0o755)?;
            vfs.mkdir_all("/home/user/projects", 0o755)?;
            assert!(vfs.stat("/home/user/projects")?.is_dir());
            assert!(vfs.stat("/home/user/file.txt")?.is_file());
            Ok(())
        }

        #[test]
        fn test_mkdir_all_through_file() {
            let mut vfs = setup_test_vfs();
            assert_eq!(
                kind(vfs.mkdir_all("/home/user/file.txt/deeper", 0o755)),
                ErrorKind::AlreadyExists
            );
            assert_eq!(
                kind(vfs.mkdir_all("/readme.md", 0o755)),
                ErrorKind::AlreadyExists
            );
        }

        #[test]
        fn test_mkdir_all_through_symlink() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.symlink("/home/user", "/me")?;
            vfs.mkdir_all("/me/sub", 0o755)?;
            assert!(vfs.stat("/home/user/sub")?.is_dir());
            Ok(())
        }

        #[test]
        fn test_mkdir_all_over_unresolvable_symlink() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.symlink("/nowhere", "/dangling")?;
            vfs.symlink("/b", "/a")?;
            vfs.symlink("/a", "/b")?;

            assert_eq!(kind(vfs.mkdir_all("/dangling/sub", 0o755)), ErrorKind::AlreadyExists);
            assert_eq!(kind(vfs.mkdir_all("/dangling", 0o755)), ErrorKind::AlreadyExists);
            assert_eq!(kind(vfs.mkdir_all("/a", 0o755)), ErrorKind::AlreadyExists);
            assert_eq!(kind(vfs.stat("/nowhere")), ErrorKind::NotFound);
            Ok(())
        }
    }

    mod symlink {
        use super::*;

        #[test]
        fn test_symlink_and_readlink() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.chdir("/home")?;
            vfs.symlink("user/file.txt", "/link")?;

            assert_eq!(vfs.readlink("/link")?, Path::new("/home/user/file.txt"));
            assert_eq!(read(&mut vfs, "/link")?, b"Hello");
            Ok(())
        }

        #[test]
        fn test_symlink_occupied() {
            let mut vfs = setup_test_vfs();
            let err = vfs.symlink("/etc", "/readme.md").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::AlreadyExists);
            assert_eq!(err.to_string(), "symlink /etc /readme.md: file exists");

            assert_eq!(kind(vfs.symlink("/etc", "/")), ErrorKind::AlreadyExists);
        }

        #[test]
        fn test_symlink_parent_not_directory() {
            let mut vfs = setup_test_vfs();
            assert_eq!(
                kind(vfs.symlink("/etc", "/readme.md/link")),
                ErrorKind::NotADirectory
            );
        }

        #[test]
        fn test_readlink_errors() {
            let vfs = setup_test_vfs();
            assert_eq!(kind(vfs.readlink("/readme.md")), ErrorKind::NotASymlink);
            assert_eq!(kind(vfs.readlink("/missing")), ErrorKind::NotFound);
        }

        #[test]
        fn test_symlink_to_directory() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.symlink("/home/user", "/me")?;
            assert!(vfs.stat("/me")?.is_dir());
            assert_eq!(read(&mut vfs, "/me/file.txt")?, b"Hello");
            Ok(())
        }
    }

    mod open_file {
        use super::*;

        #[test]
        fn test_open_missing() {
            let mut vfs = setup_test_vfs();
            for path in ["/bogus", "/home/bogus", "/home/user/bogus", "/bogus/deeper"] {
                assert_eq!(kind(vfs.open(path)), ErrorKind::NotFound, "{}", path);
            }
        }

        #[test]
        fn test_create_then_stat_is_empty_file() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            let f = vfs.create("/new.txt")?;
            drop(f);

            let meta = vfs.stat("/new.txt")?;
            assert_eq!(meta.file_type(), FileType::RegularFile);
            assert_eq!(meta.len(), 0);
            Ok(())
        }

        #[test]
        fn test_create_truncates_existing() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.create("/readme.md")?;
            assert_eq!(vfs.stat("/readme.md")?.len(), 0);
            Ok(())
        }

        #[test]
        fn test_create_in_missing_directory() {
            let mut vfs = setup_test_vfs();
            assert_eq!(kind(vfs.create("/nope/file")), ErrorKind::NotFound);
            assert_eq!(kind(vfs.create("/readme.md/file")), ErrorKind::NotADirectory);
        }

        #[test]
        fn test_create_uses_perm() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.open_file("/private", OpenFlags::WRONLY | OpenFlags::CREATE, 0o600)?;
            assert_eq!(vfs.stat("/private")?.permissions(), 0o600);
            Ok(())
        }

        #[test]
        fn test_exclusive_create_twice() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            let flags = OpenFlags::RDWR | OpenFlags::CREATE | OpenFlags::EXCL;
            vfs.open_file("/new", flags, 0o644)?;

            let err = vfs.open_file("/new", flags, 0o644).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::AlreadyExists);
            assert_eq!(err.to_string(), "open /new: file exists");
            Ok(())
        }

        #[test]
        fn test_create_through_symlink() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.symlink("/readme.md", "/link")?;
            let mut f = vfs.open_file("/link", OpenFlags::WRONLY | OpenFlags::CREATE, 0o644)?;
            f.write(b"Patched")?;
            f.close()?;

            assert!(vfs.lstat("/link")?.is_symlink());
            assert_eq!(read(&mut vfs, "/readme.md")?, b"Patched docs");
            Ok(())
        }

        #[test]
        fn test_open_directory() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            let mut dir = vfs.open("/home")?;
            assert!(dir.stat()?.is_dir());
            assert_eq!(dir.read_dir(-1)?.len(), 1);

            for flags in [
                OpenFlags::WRONLY,
                OpenFlags::RDWR,
                OpenFlags::RDONLY | OpenFlags::CREATE,
                OpenFlags::RDONLY | OpenFlags::TRUNC,
                OpenFlags::RDONLY | OpenFlags::APPEND,
            ] {
                assert_eq!(
                    kind(vfs.open_file("/home", flags, 0)),
                    ErrorKind::NotARegularFile,
                    "{:?}",
                    flags
                );
            }
            Ok(())
        }

        #[test]
        fn test_exclusive_create_on_root() {
            let mut vfs = setup_test_vfs();
            assert_eq!(
                kind(vfs.open_file("/", OpenFlags::RDWR | OpenFlags::CREATE | OpenFlags::EXCL, 0)),
                ErrorKind::AlreadyExists
            );
            assert_eq!(
                kind(vfs.open_file("/", OpenFlags::RDWR | OpenFlags::CREATE, 0)),
                ErrorKind::NotARegularFile
            );
        }

        #[test]
        fn test_truncate_flag_is_seen_by_other_handles() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            let mut reader = vfs.open("/readme.md")?;
            vfs.open_file("/readme.md", OpenFlags::WRONLY | OpenFlags::TRUNC, 0)?;

            assert_eq!(reader.read(&mut [0u8; 8])?, 0);
            Ok(())
        }

        #[test]
        fn test_append_never_overwrites() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            let mut f = vfs.open_file("/readme.md", OpenFlags::WRONLY | OpenFlags::APPEND, 0)?;
            assert_eq!(f.position(), 12);
            f.write(b", more")?;
            f.close()?;

            assert_eq!(read(&mut vfs, "/readme.md")?, b"Project docs, more");
            Ok(())
        }

        #[test]
        fn test_write_read_round_trip() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            let content: Vec<u8> = (0..=255u8).cycle().take(1000).collect();

            let mut f = vfs.create("/blob")?;
            assert_eq!(f.write(&content)?, content.len());
            f.seek(SeekFrom::Start(100))?;
            let mut buf = [0u8; 300];
            assert_eq!(f.read(&mut buf)?, 300);
            assert_eq!(&buf[..], &content[100..400]);
            f.close()?;

            assert_eq!(read(&mut vfs, "/blob")?, content);
            Ok(())
        }
    }

    mod truncate {
        use super::*;

        #[test]
        fn test_truncate_shrink_and_grow() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.truncate("/readme.md", 7)?;
            assert_eq!(read(&mut vfs, "/readme.md")?, b"Project");

            vfs.truncate("/readme.md", 10)?;
            assert_eq!(vfs.stat("/readme.md")?.len(), 10);
            assert_eq!(read(&mut vfs, "/readme.md")?, b"Project\0\0\0");
            Ok(())
        }

        #[test]
        fn test_truncate_errors() {
            let mut vfs = setup_test_vfs();
            assert_eq!(kind(vfs.truncate("/home", 0)), ErrorKind::NotARegularFile);
            assert_eq!(kind(vfs.truncate("/readme.md", -1)), ErrorKind::OutOfBounds);
            assert_eq!(kind(vfs.truncate("/missing", 0)), ErrorKind::NotFound);
        }

        #[test]
        fn test_truncate_follows_symlink() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.symlink("/readme.md", "/link")?;
            vfs.truncate("/link", 0)?;
            assert_eq!(vfs.stat("/readme.md")?.len(), 0);
            Ok(())
        }
    }

    mod remove {
        use super::*;

        #[test]
        fn test_remove_non_empty_directory() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.mkdir("/x", 0o755)?;
            vfs.create("/x/y")?;

            assert_eq!(kind(vfs.remove("/x")), ErrorKind::NonEmptyDirectory);

            vfs.remove("/x/y")?;
            vfs.remove("/x")?;
            assert_eq!(kind(vfs.stat("/x")), ErrorKind::NotFound);
            Ok(())
        }

        #[test]
        fn test_remove_missing() {
            let mut vfs = setup_test_vfs();
            assert_eq!(kind(vfs.remove("/missing")), ErrorKind::NotFound);
            assert_eq!(kind(vfs.remove("/missing/deeper")), ErrorKind::NotFound);
        }

        #[test]
        fn test_remove_root() {
            let mut vfs = setup_test_vfs();
            assert_eq!(kind(vfs.remove("/")), ErrorKind::InvalidInput);
        }

        #[test]
        fn test_remove_symlink_keeps_target() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.symlink("/home", "/link")?;
            vfs.remove("/link")?;
            assert!(vfs.lstat("/link").is_err());
            assert!(vfs.stat("/home/user")?.is_dir());
            Ok(())
        }

        #[test]
        fn test_remove_all_tree() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.mkdir_all("/home/user/a/b/c", 0o755)?;
            vfs.remove_all("/home")?;

            assert_eq!(kind(vfs.stat("/home")), ErrorKind::NotFound);
            assert!(vfs.stat("/etc")?.is_dir());
            Ok(())
        }

        #[test]
        fn test_remove_all_missing_is_noop() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.remove_all("/does/not/exist")?;
            vfs.remove_all("/readme.md/below/file")?;
            assert!(vfs.stat("/readme.md")?.is_file());
            Ok(())
        }

        #[test]
        fn test_remove_all_root_keeps_root() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.remove_all("/")?;

            let mut root = vfs.open("/")?;
            assert!(root.read_dir(-1)?.is_empty());
            assert!(vfs.stat("/")?.is_dir());
            Ok(())
        }

        #[test]
        fn test_remove_all_symlink_keeps_target() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.symlink("/home", "/link")?;
            vfs.remove_all("/link")?;
            assert!(vfs.stat("/home/user/file.txt")?.is_file());
            Ok(())
        }
    }

    mod rename {
        use super::*;

        #[test]
        fn test_rename_directory_keeps_contents() -> FsResult<()> {
            let mut vfs = MemFs::new();
            vfs.mkdir("/a", 0o755)?;
            vfs.mkdir("/a/b", 0o755)?;
            write(&mut vfs, "/a/b/c", b"hello");

            vfs.rename("/a/b", "/a/d")?;

            assert_eq!(read(&mut vfs, "/a/d/c")?, b"hello");
            assert_eq!(kind(vfs.open("/a/b/c")), ErrorKind::NotFound);
            assert_eq!(vfs.stat("/a/d")?.name(), "d");
            Ok(())
        }

        #[test]
        fn test_rename_across_directories() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.rename("/readme.md", "/home/user/README")?;

            assert_eq!(read(&mut vfs, "/home/user/README")?, b"Project docs");
            assert_eq!(kind(vfs.stat("/readme.md")), ErrorKind::NotFound);
            Ok(())
        }

        #[test]
        fn test_rename_relative() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.chdir("/home/user")?;
            vfs.rename("file.txt", "../moved.txt")?;
            assert!(vfs.stat("/home/moved.txt")?.is_file());
            Ok(())
        }

        #[test]
        fn test_rename_missing_source() {
            let mut vfs = setup_test_vfs();
            let err = vfs.rename("/missing", "/other").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
            assert_eq!(err.to_string(), "rename /missing /other: no such file or directory");
        }

        #[test]
        fn test_rename_parent_not_directory() {
            let mut vfs = setup_test_vfs();
            assert_eq!(
                kind(vfs.rename("/etc", "/readme.md/etc")),
                ErrorKind::NotADirectory
            );
            assert_eq!(
                kind(vfs.rename("/readme.md/x", "/etc/x")),
                ErrorKind::NotADirectory
            );
        }

        #[test]
        fn test_rename_into_itself() {
            let mut vfs = setup_test_vfs();
            assert_eq!(kind(vfs.rename("/home", "/home/user/home")), ErrorKind::InvalidInput);
            assert_eq!(kind(vfs.rename("/home", "/home/nested")), ErrorKind::InvalidInput);
            assert_eq!(kind(vfs.rename("/", "/x")), ErrorKind::InvalidInput);
        }

        #[test]
        fn test_rename_onto_itself() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.rename("/readme.md", "/./readme.md")?;
            assert!(vfs.stat("/readme.md")?.is_file());
            Ok(())
        }

        #[test]
        fn test_rename_replaces_file() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.rename("/readme.md", "/home/user/file.txt")?;
            assert_eq!(read(&mut vfs, "/home/user/file.txt")?, b"Project docs");
            Ok(())
        }

        #[test]
        fn test_rename_destination_conflicts() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.mkdir("/empty", 0o755)?;

            assert_eq!(kind(vfs.rename("/etc", "/home")), ErrorKind::NonEmptyDirectory);
            assert_eq!(kind(vfs.rename("/etc", "/readme.md")), ErrorKind::NotADirectory);
            assert_eq!(kind(vfs.rename("/readme.md", "/empty")), ErrorKind::NotARegularFile);

            vfs.rename("/etc", "/empty")?;
            assert!(vfs.stat("/empty")?.is_dir());
            assert_eq!(kind(vfs.stat("/etc")), ErrorKind::NotFound);
            Ok(())
        }

        #[test]
        fn test_rename_file_onto_non_empty_directory() {
            let mut vfs = setup_test_vfs();
            assert_eq!(
                kind(vfs.rename("/readme.md", "/home")),
                ErrorKind::NotARegularFile
            );
            assert!(vfs.stat("/readme.md").unwrap().is_file());
        }

        #[test]
        fn test_rename_symlink_moves_link() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.symlink("/readme.md", "/link")?;
            vfs.rename("/link", "/etc/link")?;

            assert!(vfs.lstat("/etc/link")?.is_symlink());
            assert!(vfs.stat("/readme.md")?.is_file());
            Ok(())
        }

        #[test]
        fn test_open_handle_follows_renamed_node() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            let mut f = vfs.open_file("/readme.md", OpenFlags::WRONLY | OpenFlags::APPEND, 0)?;
            vfs.rename("/readme.md", "/etc/readme.md")?;
            f.write(b"!")?;
            f.close()?;
            assert_eq!(read(&mut vfs, "/etc/readme.md")?, b"Project docs!");
            Ok(())
        }
    }

    mod chmod {
        use super::*;

        #[test]
        fn test_chmod_keeps_kind() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.chmod("/home", 0o700)?;
            vfs.chmod("/readme.md", 0o100400)?;

            let home = vfs.stat("/home")?;
            assert!(home.is_dir());
            assert_eq!(home.mode(), 0o040700);

            let readme = vfs.stat("/readme.md")?;
            assert!(readme.is_file());
            assert_eq!(readme.permissions(), 0o400);
            Ok(())
        }

        #[test]
        fn test_chmod_follows_symlink() -> FsResult<()> {
            let mut vfs = setup_test_vfs();
            vfs.symlink("/readme.md", "/link")?;
            vfs.chmod("/link", 0o600)?;
            assert_eq!(vfs.stat("/readme.md")?.permissions(), 0o600);
            assert_eq!(vfs.lstat("/link")?.permissions(), 0o777);
            Ok(())
        }

        #[test]
        fn test_chmod_missing() {
            let mut vfs = setup_test_vfs();
            assert_eq!(kind(vfs.chmod("/missing", 0o600)), ErrorKind::NotFound);
        }
    }
}
