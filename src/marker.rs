//! Migration marker: a small file directly under a root whose content is the path of the
//! directory that is the authoritative source of a pending migration.
//!
//! The marker under the destination is committed before any content moves and removed only
//! after everything else succeeded, so its presence after a run means "not finished".

use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::config::DataLayout;
use crate::errors::{FsError, FsErrorKind};
use crate::fs_ops::FileOps;
use crate::utils::same_location;

pub struct MigrationMarker<'a> {
    ops: &'a dyn FileOps,
    layout: &'a DataLayout,
}

impl<'a> MigrationMarker<'a> {
    pub fn new(ops: &'a dyn FileOps, layout: &'a DataLayout) -> Self {
        Self { ops, layout }
    }

    pub fn path(&self, root: &Path) -> PathBuf {
        self.layout.marker(root)
    }

    /// Record `source` as the migration source under `root`. Atomic replace.
    pub fn write(&self, root: &Path, source: &Path) -> Result<(), FsError> {
        let path = self.path(root);
        let Some(text) = source.to_str() else {
            return Err(FsError::other(
                FsErrorKind::Unknown,
                "write marker",
                &path,
                format!("source path '{}' is not valid UTF-8", source.display()),
            ));
        };
        self.ops.write_text(&path, text)?;
        debug!(marker = %path.display(), source = %source.display(), "marker written");
        Ok(())
    }

    /// Recorded source, or `None` if there is no marker (or it is empty).
    pub fn read(&self, root: &Path) -> Result<Option<PathBuf>, FsError> {
        let path = self.path(root);
        if !self.ops.exists(&path) {
            return Ok(None);
        }
        let text = match self.ops.read_text(&path) {
            Ok(t) => t,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        let text = text.trim_end_matches(['\r', '\n']);
        if text.is_empty() {
            trace!(marker = %path.display(), "empty marker ignored");
            return Ok(None);
        }
        Ok(Some(PathBuf::from(text)))
    }

    /// Remove the marker under `root`; absent is fine.
    pub fn remove(&self, root: &Path) -> Result<(), FsError> {
        let path = self.path(root);
        self.ops.remove_recursive(&path)?;
        debug!(marker = %path.display(), "marker removed");
        Ok(())
    }

    /// Does the marker under `root` name `source`?
    pub fn ties(&self, root: &Path, source: &Path) -> Result<bool, FsError> {
        Ok(self
            .read(root)?
            .is_some_and(|recorded| same_location(&recorded, source)))
    }

    /// Checkpoint a migration from `old` into `new`.
    ///
    /// A marker the host left under `old` naming `old` itself is copied; otherwise one is
    /// written directly. The resulting file is the same either way.
    pub fn commit(&self, old: &Path, new: &Path) -> Result<(), FsError> {
        if self.ties(old, old)? {
            let target = self.path(new);
            // copy_file never clobbers; a leftover from an earlier attempt is replaced below
            match self.ops.copy_file(&self.path(old), &target) {
                Ok(()) => {
                    debug!(marker = %target.display(), "marker copied from source root");
                    return Ok(());
                }
                Err(e) if e.kind == FsErrorKind::AlreadyExists => {}
                Err(e) => return Err(e),
            }
        }
        self.write(new, old)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_ops::StdFs;
    use assert_fs::prelude::*;

    #[test]
    fn read_absent_is_none() {
        let dir = assert_fs::TempDir::new().unwrap();
        let layout = DataLayout::default();
        let marker = MigrationMarker::new(&StdFs, &layout);
        assert_eq!(marker.read(dir.path()).unwrap(), None);
        marker.remove(dir.path()).unwrap();
    }

    #[test]
    fn write_then_ties() {
        let dir = assert_fs::TempDir::new().unwrap();
        let layout = DataLayout::default();
        let marker = MigrationMarker::new(&StdFs, &layout);
        let old = dir.child("old");
        let new = dir.child("new");
        old.create_dir_all().unwrap();
        new.create_dir_all().unwrap();

        marker.write(new.path(), old.path()).unwrap();
        assert_eq!(
            std::fs::read_to_string(new.child("migrate-dir").path()).unwrap(),
            old.path().to_str().unwrap()
        );
        assert!(marker.ties(new.path(), old.path()).unwrap());
        assert!(!marker.ties(new.path(), new.path()).unwrap());
    }

    #[test]
    fn trailing_newline_tolerated() {
        let dir = assert_fs::TempDir::new().unwrap();
        let layout = DataLayout::default();
        let marker = MigrationMarker::new(&StdFs, &layout);
        dir.child("migrate-dir").write_str("/some/where\n").unwrap();
        assert_eq!(marker.read(dir.path()).unwrap(), Some(PathBuf::from("/some/where")));
    }

    #[test]
    fn commit_copies_self_naming_source_marker() {
        let dir = assert_fs::TempDir::new().unwrap();
        let layout = DataLayout::default();
        let marker = MigrationMarker::new(&StdFs, &layout);
        let old = dir.child("old");
        let new = dir.child("new");
        new.create_dir_all().unwrap();
        old.child("migrate-dir").write_str(old.path().to_str().unwrap()).unwrap();

        marker.commit(old.path(), new.path()).unwrap();
        assert!(old.child("migrate-dir").path().exists());
        assert!(marker.ties(new.path(), old.path()).unwrap());
    }

    #[test]
    fn commit_writes_when_source_has_no_marker() {
        let dir = assert_fs::TempDir::new().unwrap();
        let layout = DataLayout::default();
        let marker = MigrationMarker::new(&StdFs, &layout);
        let old = dir.child("old");
        let new = dir.child("new");
        old.create_dir_all().unwrap();
        new.create_dir_all().unwrap();

        marker.commit(old.path(), new.path()).unwrap();
        assert!(marker.ties(new.path(), old.path()).unwrap());
        assert!(!old.child("migrate-dir").path().exists());
    }
}
