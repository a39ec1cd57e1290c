//! Entries of the in-memory tree.
//!
//! A directory owns its children through `Rc`; a child points back at its parent with a `Weak`
//! that is only used to check ancestry. Handles hold their own `Rc`, so a node detached from the
//! tree stays usable by the handles that still reference it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use crate::fs::{ErrorKind, PERM_MASK};
use crate::{FileType, Metadata};

pub(crate) type NodeRef = Rc<RefCell<Node>>;

#[derive(Debug)]
pub(crate) enum NodeData {
    File(Vec<u8>),
    Directory(HashMap<String, NodeRef>),
    /// Absolute, normalized target.
    Symlink(PathBuf),
}

#[derive(Debug)]
pub(crate) struct Node {
    name: String,
    permissions: u32,
    parent: Weak<RefCell<Node>>,
    data: NodeData,
}

impl Node {
    fn new(name: &str, permissions: u32, data: NodeData) -> NodeRef {
        Rc::new(RefCell::new(Node {
            name: name.to_owned(),
            permissions: permissions & PERM_MASK,
            parent: Weak::new(),
            data,
        }))
    }

    pub(crate) fn new_root(permissions: u32) -> NodeRef {
        Self::new("/", permissions, NodeData::Directory(HashMap::new()))
    }

    pub(crate) fn new_dir(name: &str, permissions: u32) -> NodeRef {
        Self::new(name, permissions, NodeData::Directory(HashMap::new()))
    }

    pub(crate) fn new_file(name: &str, permissions: u32) -> NodeRef {
        Self::new(name, permissions, NodeData::File(Vec::new()))
    }

    pub(crate) fn new_symlink(name: &str, target: PathBuf) -> NodeRef {
        Self::new(name, PERM_MASK, NodeData::Symlink(target))
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn file_type(&self) -> FileType {
        match self.data {
            NodeData::File(_) => FileType::RegularFile,
            NodeData::Directory(_) => FileType::Directory,
            NodeData::Symlink(_) => FileType::Symlink,
        }
    }

    pub(crate) fn is_dir(&self) -> bool {
        matches!(self.data, NodeData::Directory(_))
    }

    pub(crate) fn len(&self) -> u64 {
        match &self.data {
            NodeData::File(bytes) => bytes.len() as u64,
            NodeData::Directory(_) => 0,
            NodeData::Symlink(target) => target.as_os_str().len() as u64,
        }
    }

    pub(crate) fn metadata(&self) -> Metadata {
        Metadata::new(
            self.name.as_str(),
            self.file_type(),
            self.len(),
            self.permissions,
        )
    }

    pub(crate) fn set_permissions(&mut self, mode: u32) {
        self.permissions = mode & PERM_MASK;
    }

    pub(crate) fn children(&self) -> Option<&HashMap<String, NodeRef>> {
        match &self.data {
            NodeData::Directory(children) => Some(children),
            _ => None,
        }
    }

    /// True for a directory with at least one child.
    pub(crate) fn has_children(&self) -> bool {
        self.children().is_some_and(|children| !children.is_empty())
    }

    pub(crate) fn contents(&self) -> Option<&Vec<u8>> {
        match &self.data {
            NodeData::File(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub(crate) fn contents_mut(&mut self) -> Option<&mut Vec<u8>> {
        match &mut self.data {
            NodeData::File(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub(crate) fn symlink_target(&self) -> Option<&Path> {
        match &self.data {
            NodeData::Symlink(target) => Some(target),
            _ => None,
        }
    }

    /// Shrinks (dropping trailing bytes) or grows (padding with zeros) a regular file.
    pub(crate) fn truncate(&mut self, size: i64) -> Result<(), ErrorKind> {
        let size = usize::try_from(size).map_err(|_| ErrorKind::OutOfBounds)?;
        let bytes = self.contents_mut().ok_or(ErrorKind::NotARegularFile)?;
        bytes.resize(size, 0);
        Ok(())
    }

    /// Looks `name` up in directory `dir`.
    pub(crate) fn child(dir: &NodeRef, name: &str) -> Result<Option<NodeRef>, ErrorKind> {
        match &dir.borrow().data {
            NodeData::Directory(children) => Ok(children.get(name).cloned()),
            _ => Err(ErrorKind::NotADirectory),
        }
    }

    /// Inserts `child` into `dir` under the child's own name and points it back at `dir`.
    /// An entry already stored under that name is detached and returned.
    pub(crate) fn attach(dir: &NodeRef, child: NodeRef) -> Option<NodeRef> {
        let name = child.borrow().name.clone();
        child.borrow_mut().parent = Rc::downgrade(dir);
        let replaced = match &mut dir.borrow_mut().data {
            NodeData::Directory(children) => children.insert(name, child),
            _ => None,
        };
        if let Some(replaced) = &replaced {
            replaced.borrow_mut().parent = Weak::new();
        }
        replaced
    }

    /// Removes `name` from `dir` and clears its parent link.
    pub(crate) fn detach(dir: &NodeRef, name: &str) -> Option<NodeRef> {
        let removed = match &mut dir.borrow_mut().data {
            NodeData::Directory(children) => children.remove(name),
            _ => None,
        };
        if let Some(removed) = &removed {
            removed.borrow_mut().parent = Weak::new();
        }
        removed
    }

    pub(crate) fn rename(node: &NodeRef, name: &str) {
        node.borrow_mut().name = name.to_owned();
    }

    /// Detaches every descendant of `dir`, depth first. Entries that vanish while walking are
    /// skipped.
    pub(crate) fn clear(dir: &NodeRef) {
        let names: Vec<String> = match dir.borrow().children() {
            Some(children) => children.keys().cloned().collect(),
            None => return,
        };
        for name in names {
            if let Ok(Some(child)) = Self::child(dir, &name) {
                Self::clear(&child);
                Self::detach(dir, &name);
            }
        }
    }

    /// True if `ancestor` is `node` itself or one of its parents.
    pub(crate) fn is_ancestor(ancestor: &NodeRef, node: &NodeRef) -> bool {
        let mut current = Some(Rc::clone(node));
        while let Some(candidate) = current {
            if Rc::ptr_eq(&candidate, ancestor) {
                return true;
            }
            current = candidate.borrow().parent.upgrade();
        }
        false
    }
}
