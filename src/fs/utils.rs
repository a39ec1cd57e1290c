use std::path::{Component, Path, PathBuf};

use crate::fs::ErrorKind;

/// Lexically normalizes `path`: drops `.`, resolves `..` against the components seen so far
/// (never above the root) and removes redundant and trailing separators.
pub fn normalize<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.as_ref().components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(parent) = result.parent() {
                    result = parent.to_path_buf();
                }
            }
            _ => result.push(component),
        }
    }
    result
}

/// Returns true if `path` is the virtual root `/`.
pub fn is_virtual_root<P: AsRef<Path>>(path: P) -> bool {
    let mut components = path.as_ref().components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::RootDir), None)
    )
}

/// Splits a normalized absolute path into its parent directory and base name.
/// Returns `Ok(None)` for the root and `InvalidInput` for a base name that is not UTF-8.
pub fn split(path: &Path) -> Result<Option<(&Path, String)>, ErrorKind> {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return Ok(None);
    };
    let name = name.to_str().ok_or(ErrorKind::InvalidInput)?;
    Ok(Some((parent, name.to_owned())))
}

/// Returns true if `path` is spelled with a trailing separator, as in `dir/`.
pub fn has_trailing_separator<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref().as_os_str().to_string_lossy();
    path.len() > 1 && path.ends_with(std::path::MAIN_SEPARATOR)
}
