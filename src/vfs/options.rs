/// Configuration of a [`MemFs`](crate::MemFs) instance.
///
/// ```
/// use vfs_mock::{MemFs, MemFsOptions};
///
/// let fs = MemFs::with_options(
///     MemFsOptions::default()
///         .root_permissions(0o700)
///         .max_symlink_hops(8),
/// );
/// assert_eq!(fs.options().hops_limit(), 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemFsOptions {
    root_permissions: u32,
    max_symlink_hops: usize,
}

impl MemFsOptions {
    /// Linux `MAXSYMLINKS`.
    pub const DEFAULT_MAX_SYMLINK_HOPS: usize = 40;

    /// Permission bits of the root directory.
    pub fn root_permissions(mut self, mode: u32) -> Self {
        self.root_permissions = mode;
        self
    }

    /// How many symlinks a single resolution may follow before failing with
    /// [`ErrorKind::TooManyLinks`](crate::ErrorKind::TooManyLinks).
    pub fn max_symlink_hops(mut self, hops: usize) -> Self {
        self.max_symlink_hops = hops;
        self
    }

    pub fn root_mode(&self) -> u32 {
        self.root_permissions
    }

    pub fn hops_limit(&self) -> usize {
        self.max_symlink_hops
    }
}

impl Default for MemFsOptions {
    fn default() -> Self {
        MemFsOptions {
            root_permissions: 0o755,
            max_symlink_hops: Self::DEFAULT_MAX_SYMLINK_HOPS,
        }
    }
}
