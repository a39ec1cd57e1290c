//! Path resolution for [`MemFs`].
//!
//! Every intermediate component is dereferenced; whether a final symlink is followed is up to
//! the caller. Each dereference counts against `max_symlink_hops`, so cyclic links fail with
//! `TooManyLinks` instead of recursing forever.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::trace;

use crate::fs::{ErrorKind, utils};
use crate::vfs::MemFs;
use crate::vfs::node::{Node, NodeRef};

impl MemFs {
    /// Absolute, normalized form of `path`, relative paths being taken from the cwd.
    pub(crate) fn to_abs<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        utils::normalize(self.cwd.join(path))
    }

    /// Resolves a normalized absolute path.
    pub(crate) fn resolve(&self, abs: &Path, follow: bool) -> Result<NodeRef, ErrorKind> {
        let mut hops = 0;
        self.resolve_counted(abs, follow, &mut hops)
    }

    /// Resolves the directory that holds the last component of `abs` and returns it with that
    /// component's name. The root has no parent and yields `InvalidInput`.
    pub(crate) fn resolve_parent(&self, abs: &Path) -> Result<(NodeRef, String), ErrorKind> {
        let (parent, name) = utils::split(abs)?.ok_or(ErrorKind::InvalidInput)?;
        let dir = self.resolve(parent, true)?;
        if !dir.borrow().is_dir() {
            return Err(ErrorKind::NotADirectory);
        }
        Ok((dir, name))
    }

    /// Follows `node` while it is a symlink.
    pub(crate) fn follow(&self, node: NodeRef) -> Result<NodeRef, ErrorKind> {
        let mut hops = 0;
        self.follow_counted(node, &mut hops)
    }

    fn resolve_counted(
        &self,
        abs: &Path,
        follow: bool,
        hops: &mut usize,
    ) -> Result<NodeRef, ErrorKind> {
        let Some((parent, name)) = utils::split(abs)? else {
            return Ok(Rc::clone(&self.root));
        };

        let dir = self.resolve_counted(parent, true, hops)?;
        let node = Node::child(&dir, &name)?.ok_or(ErrorKind::NotFound)?;

        if follow {
            self.follow_counted(node, hops)
        } else {
            Ok(node)
        }
    }

    fn follow_counted(&self, mut node: NodeRef, hops: &mut usize) -> Result<NodeRef, ErrorKind> {
        loop {
            let target = match node.borrow().symlink_target() {
                Some(target) => target.to_path_buf(),
                None => break,
            };
            *hops += 1;
            if *hops > self.options.hops_limit() {
                return Err(ErrorKind::TooManyLinks);
            }
            trace!(link_target = %target.display(), hops = *hops, "following symlink");
            node = self.resolve_counted(&target, false, hops)?;
        }
        Ok(node)
    }
}
