//! Decide whether a data root needs relocating, and whether an earlier attempt can resume.

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::DataLayout;
use crate::errors::FsError;
use crate::fs_ops::FileOps;
use crate::marker::MigrationMarker;
use crate::utils::same_location;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationNeed {
    /// Nothing to relocate.
    None,
    /// A marker under the new root names the old root: an earlier attempt was interrupted.
    Resume,
    /// The old root exists and nothing ties the new root to it yet.
    Fresh,
}

impl MigrationNeed {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationNeed::None => "none",
            MigrationNeed::Resume => "resume",
            MigrationNeed::Fresh => "fresh",
        }
    }
}

impl fmt::Display for MigrationNeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct MigrationDetector<'a> {
    ops: &'a dyn FileOps,
    marker: MigrationMarker<'a>,
}

impl<'a> MigrationDetector<'a> {
    pub fn new(ops: &'a dyn FileOps, layout: &'a DataLayout) -> Self {
        Self {
            ops,
            marker: MigrationMarker::new(ops, layout),
        }
    }

    /// Only mutation: removing a stale marker under `new` when `old` is gone.
    pub fn should_migrate(&self, old: &Path, new: &Path) -> Result<MigrationNeed, FsError> {
        if !self.ops.exists(old) {
            self.clear_stale_marker(old, new)?;
            return Ok(MigrationNeed::None);
        }
        if same_location(old, new) {
            debug!(root = %old.display(), "old and new root are the same directory");
            return Ok(MigrationNeed::None);
        }
        let need = if self.marker.ties(new, old)? {
            MigrationNeed::Resume
        } else {
            MigrationNeed::Fresh
        };
        debug!(old = %old.display(), new = %new.display(), decision = %need, "migration check");
        Ok(need)
    }

    /// Remove a marker under `new` whose source no longer exists.
    ///
    /// A marker that names some other, still existing directory belongs to a different
    /// pending migration and is left alone.
    pub fn clear_stale_marker(&self, old: &Path, new: &Path) -> Result<bool, FsError> {
        let Some(source) = self.marker.read(new)? else {
            return Ok(false);
        };
        if same_location(&source, old) || !self.ops.exists(&source) {
            self.marker.remove(new)?;
            info!(
                root = %new.display(),
                source = %source.display(),
                "removed stale migration marker; source no longer exists"
            );
            return Ok(true);
        }
        debug!(root = %new.display(), source = %source.display(), "marker names another existing source; kept");
        Ok(false)
    }

    /// Startup check for the active root: the source of an interrupted migration into
    /// `root`, if it still exists. A marker whose source is gone is removed.
    pub fn pending_source(&self, root: &Path) -> Result<Option<PathBuf>, FsError> {
        let Some(source) = self.marker.read(root)? else {
            return Ok(None);
        };
        // A self-naming marker is a request to move this root elsewhere, not a pending move in.
        if same_location(&source, root) {
            return Ok(None);
        }
        if !self.ops.exists(&source) {
            self.marker.remove(root)?;
            info!(root = %root.display(), source = %source.display(), "removed stale migration marker");
            return Ok(None);
        }
        Ok(Some(source))
    }
}
