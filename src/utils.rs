use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::errors::{FsError, FsErrorKind, MigrateError};
use crate::fs_ops::FileOps;

/// Upper bound for the `<root>-<n>` search when moving a foreign directory aside.
pub const MAX_ASIDE_SUFFIX: u32 = 10_000;

/// Drop `.` components and trailing separators so suffixing and comparison are stable.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Canonical form of `path`; for a path that does not exist yet, the deepest existing
/// ancestor is canonicalized and the rest appended.
fn resolved(path: &Path) -> PathBuf {
    let path = normalize(path);
    let mut tail = Vec::new();
    let mut cur = path.as_path();
    loop {
        if let Ok(real) = dunce::canonicalize(cur) {
            return tail.iter().rev().fold(real, |acc, name| acc.join(name));
        }
        match (cur.parent(), cur.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                cur = parent;
            }
            _ => return path,
        }
    }
}

/// True if both paths name the same directory (symlinks resolved when the paths exist).
pub fn same_location(a: &Path, b: &Path) -> bool {
    normalize(a) == normalize(b) || resolved(a) == resolved(b)
}

/// Refuse roots where one contains the other; moving a root into itself cannot converge.
pub fn ensure_not_nested(old: &Path, new: &Path) -> Result<(), MigrateError> {
    let (o, n) = (resolved(old), resolved(new));
    if o != n && (o.starts_with(&n) || n.starts_with(&o)) {
        return Err(MigrateError::NestedRoots {
            old: old.to_path_buf(),
            new: new.to_path_buf(),
        });
    }
    Ok(())
}

/// `<root>-<n>` for a given n, preserving non-UTF8 names.
pub(crate) fn suffixed(root: &Path, n: u32) -> PathBuf {
    let mut name: OsString = normalize(root).into_os_string();
    name.push(format!("-{n}"));
    PathBuf::from(name)
}

/// First unused `<root>-1`, `<root>-2`, ... up to [`MAX_ASIDE_SUFFIX`].
pub(crate) fn free_aside_path(ops: &dyn FileOps, root: &Path) -> Result<PathBuf, FsError> {
    for n in 1..=MAX_ASIDE_SUFFIX {
        let candidate = suffixed(root, n);
        if !ops.exists(&candidate) {
            return Ok(candidate);
        }
    }
    Err(FsError::other(
        FsErrorKind::AlreadyExists,
        "move existing directory aside",
        root,
        format!("no free '<name>-N' suffix up to {MAX_ASIDE_SUFFIX}"),
    ))
}
