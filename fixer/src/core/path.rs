//! Lexical path resolution confined to a sandbox root.
//!
//! Containment is decided on the normalized path alone, before any
//! filesystem call can follow a symlink. Every tool goes through
//! [`resolve_within`]; none of them re-implement the check.

use std::path::{Component, Path, PathBuf};

/// Collapse `.` and `..` segments without touching the filesystem.
///
/// `..` at the filesystem root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Resolve `relative` against `root` and return the absolute target if it is
/// `root` itself or nested under it.
///
/// `root` must already be absolute and normalized (see
/// [`crate::tools::Sandbox::new`]). An absolute `relative` replaces the root
/// during the join and is then rejected unless it points back inside. An
/// empty string or `.` resolves to `root`.
///
/// The comparison is a component-wise prefix check, so `/srv/box-evil` is not
/// accepted as a child of `/srv/box`.
pub fn resolve_within(root: &Path, relative: &str) -> Option<PathBuf> {
    let candidate = normalize(&root.join(relative));
    if candidate.starts_with(root) {
        Some(candidate)
    } else {
        None
    }
}
