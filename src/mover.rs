//! Data directory relocation.
//!
//! [`DirectoryMover::migrate`] runs a fixed sequence of steps. Every step skips work whose
//! target already exists at the destination, so re-running after any failure or interruption
//! converges on the same end state:
//!
//! 1. prepare the destination (move a foreign directory aside to `<new>-N`)
//! 2. commit the marker under the new root
//! 3. database, 4. database backup
//! 5. storage entries, one whole directory at a time
//! 6. auxiliary directory (whole, or merged file by file)
//! 7. remaining top-level entries
//! 8. remove the old root and the marker, then activate the new root
//!
//! Errors from steps 1-4 leave the old root intact (full failure); later errors leave the
//! data split between both roots (partial failure). Either way the marker stays.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::DataLayout;
use crate::detect::MigrationDetector;
use crate::errors::{FsError, FsErrorKind, MigrateError, Step};
use crate::fs_ops::{fs_error, is_staging_name, FileOps};
use crate::host::Host;
use crate::marker::MigrationMarker;
use crate::report::FailureReporter;
use crate::strategy::{move_generic, select_strategy, MoveStrategy};
use crate::utils::{ensure_not_nested, free_aside_path, normalize, same_location};

/// What a successful [`DirectoryMover::migrate`] call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed(Summary),
    /// The old root no longer exists; nothing left to move.
    AlreadyComplete,
    /// Old and new root are the same directory.
    Unchanged,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub new_root: PathBuf,
    /// Units moved by this run.
    pub moved: usize,
    /// Units absent at the source or already present at the destination.
    pub skipped: usize,
    /// Where a foreign directory at the new root was moved.
    pub set_aside: Option<PathBuf>,
}

/// Result of moving one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Moved,
    Skipped,
}

struct StepFailure {
    step: Step,
    error: FsError,
}

fn at(step: Step) -> impl Fn(FsError) -> StepFailure {
    move |error| StepFailure { step, error }
}

pub struct DirectoryMover<'a> {
    ops: &'a dyn FileOps,
    host: &'a dyn Host,
    layout: &'a DataLayout,
    strategy: Box<dyn MoveStrategy>,
}

impl<'a> DirectoryMover<'a> {
    /// Mover with the native strategy when the platform provides one.
    pub fn new(ops: &'a dyn FileOps, host: &'a dyn Host, layout: &'a DataLayout) -> Self {
        Self {
            ops,
            host,
            layout,
            strategy: select_strategy(true),
        }
    }

    pub fn with_strategy(mut self, strategy: Box<dyn MoveStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Relocate the data root `old` to `new`.
    ///
    /// `resume` keeps a non-empty `new` that a marker ties to `old`; without it such a
    /// directory is treated as foreign and moved aside. Reported failures have already been
    /// revealed and passed to [`Host::terminate`] when this returns.
    pub fn migrate(&self, old: &Path, new: &Path, resume: bool) -> Result<Outcome, MigrateError> {
        let old = normalize(old);
        let new = normalize(new);

        if !self.ops.exists(&old) {
            MigrationDetector::new(self.ops, self.layout).clear_stale_marker(&old, &new)?;
            info!(old = %old.display(), "old data directory is gone; nothing to migrate");
            return Ok(Outcome::AlreadyComplete);
        }
        if same_location(&old, &new) {
            debug!(root = %old.display(), "old and new data directory are the same");
            return Ok(Outcome::Unchanged);
        }
        ensure_not_nested(&old, &new)?;

        info!(
            old = %old.display(),
            new = %new.display(),
            resume,
            strategy = self.strategy.name(),
            "migrating data directory"
        );

        let mut summary = Summary {
            new_root: new.clone(),
            ..Summary::default()
        };
        if let Err(StepFailure { step, error }) = self.run_steps(&old, &new, resume, &mut summary) {
            let reporter = FailureReporter::new(self.host, self.layout);
            return Err(reporter.report(&old, &new, step, error));
        }

        self.host
            .activate_new_root(&new)
            .map_err(fs_error("activate new data directory", &new))?;
        info!(
            new = %new.display(),
            moved = summary.moved,
            skipped = summary.skipped,
            "data directory migration complete"
        );
        Ok(Outcome::Completed(summary))
    }

    fn run_steps(&self, old: &Path, new: &Path, resume: bool, summary: &mut Summary) -> Result<(), StepFailure> {
        let marker = MigrationMarker::new(self.ops, self.layout);

        let tied = self
            .prepare_destination(&marker, old, new, resume, summary)
            .map_err(at(Step::PrepareDestination))?;

        if !tied {
            marker.commit(old, new).map_err(at(Step::CommitMarker))?;
        }

        let db = self
            .move_file(&self.layout.database(old), &self.layout.database(new))
            .map_err(at(Step::Database))?;
        summary.count(db);

        let backup = self
            .move_file(&self.layout.database_backup(old), &self.layout.database_backup(new))
            .map_err(at(Step::DatabaseBackup))?;
        summary.count(backup);

        self.move_storage(old, new, summary).map_err(at(Step::Storage))?;
        self.move_auxiliary(old, new, summary).map_err(at(Step::Auxiliary))?;
        self.move_residual(old, new, summary).map_err(at(Step::Residual))?;

        self.ops.remove_recursive(old).map_err(at(Step::Finalize))?;
        info!(old = %old.display(), "removed old data directory");
        marker.remove(new).map_err(at(Step::Finalize))?;
        Ok(())
    }

    /// Make `new` an empty directory or one tied to `old`. Returns whether a marker ties it.
    fn prepare_destination(
        &self,
        marker: &MigrationMarker<'_>,
        old: &Path,
        new: &Path,
        resume: bool,
        summary: &mut Summary,
    ) -> Result<bool, FsError> {
        if !self.ops.exists(new) {
            self.make_dir_all(new)?;
            debug!(new = %new.display(), "created new data directory");
            return Ok(false);
        }

        let is_dir = self.ops.is_dir(new);
        if is_dir && resume && marker.ties(new, old)? {
            debug!(new = %new.display(), "resuming into existing data directory");
            return Ok(true);
        }
        if is_dir && self.ops.list_dir(new)?.is_empty() {
            return Ok(false);
        }

        let aside = free_aside_path(self.ops, new)?;
        self.ops.rename(new, &aside)?;
        warn!(
            new = %new.display(),
            aside = %aside.display(),
            "moved existing directory out of the way"
        );
        self.ops.make_dir(new)?;
        summary.set_aside = Some(aside);
        Ok(false)
    }

    fn make_dir_all(&self, dir: &Path) -> Result<(), FsError> {
        if self.ops.is_dir(dir) {
            return Ok(());
        }
        if let Some(parent) = dir.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.make_dir_all(parent)?;
        }
        match self.ops.make_dir(dir) {
            Err(e) if e.kind == FsErrorKind::AlreadyExists && self.ops.is_dir(dir) => Ok(()),
            other => other,
        }
    }

    /// Move a single file unless it is already at the destination.
    fn move_file(&self, src: &Path, dst: &Path) -> Result<Unit, FsError> {
        self.move_unit(src, dst, false)
    }

    /// Move one unit, directories through the selected strategy.
    fn move_unit(&self, src: &Path, dst: &Path, use_strategy: bool) -> Result<Unit, FsError> {
        if !self.ops.exists(src) {
            debug!(src = %src.display(), "not present at source; skipped");
            return Ok(Unit::Skipped);
        }
        if self.ops.exists(dst) {
            debug!(dst = %dst.display(), "already at destination; skipped");
            return Ok(Unit::Skipped);
        }
        let res = if use_strategy && self.ops.is_dir(src) {
            self.strategy.move_dir(self.ops, src, dst)
        } else {
            move_generic(self.ops, src, dst)
        };
        match res {
            Ok(()) => {
                info!(src = %src.display(), dst = %dst.display(), "moved");
                Ok(Unit::Moved)
            }
            // Lost a race with another writer; the unit counts as migrated only if the
            // source is really gone or the destination really there.
            Err(e) if self.lost_race(&e, src, dst) => {
                debug!(src = %src.display(), kind = %e.kind, "unit vanished or appeared during move; skipped");
                Ok(Unit::Skipped)
            }
            Err(e) => Err(e),
        }
    }

    /// `NotFound` from deep inside a copy (a dangling link, say) is not a missing unit.
    fn lost_race(&self, e: &FsError, src: &Path, dst: &Path) -> bool {
        match e.kind {
            FsErrorKind::NotFound => !self.ops.exists(src),
            FsErrorKind::AlreadyExists => self.ops.exists(dst),
            _ => false,
        }
    }

    /// Entry names under `dir`, or none when it does not exist.
    fn entries(&self, dir: &Path) -> Result<Vec<OsString>, FsError> {
        match self.ops.list_dir(dir) {
            Ok(names) => Ok(names),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Remove staging directories left behind by an interrupted cross-device copy.
    fn sweep_staging(&self, dir: &Path) -> Result<(), FsError> {
        for name in self.entries(dir)? {
            if is_staging_name(&name) {
                let leftover = dir.join(&name);
                self.ops.remove_recursive(&leftover)?;
                debug!(path = %leftover.display(), "removed leftover staging directory");
            }
        }
        Ok(())
    }

    fn move_storage(&self, old: &Path, new: &Path, summary: &mut Summary) -> Result<(), FsError> {
        let src_dir = self.layout.storage(old);
        if !self.ops.is_dir(&src_dir) {
            return Ok(());
        }
        let dst_dir = self.layout.storage(new);
        if self.ops.exists(&dst_dir) {
            self.sweep_staging(&dst_dir)?;
        } else {
            self.ops.make_dir(&dst_dir)?;
        }

        for name in self.entries(&src_dir)? {
            let unit = self.move_unit(&src_dir.join(&name), &dst_dir.join(&name), true)?;
            summary.count(unit);
        }
        Ok(())
    }

    fn move_auxiliary(&self, old: &Path, new: &Path, summary: &mut Summary) -> Result<(), FsError> {
        let src_dir = self.layout.auxiliary(old);
        if !self.ops.exists(&src_dir) {
            return Ok(());
        }
        let dst_dir = self.layout.auxiliary(new);
        if !self.ops.exists(&dst_dir) || !self.ops.is_dir(&src_dir) {
            let unit = self.move_unit(&src_dir, &dst_dir, true)?;
            summary.count(unit);
            return Ok(());
        }

        self.sweep_staging(&dst_dir)?;
        for name in self.entries(&src_dir)? {
            let unit = self.move_file(&src_dir.join(&name), &dst_dir.join(&name))?;
            summary.count(unit);
        }
        Ok(())
    }

    /// Other top-level entries, so removing the old root never destroys unknown files.
    fn move_residual(&self, old: &Path, new: &Path, summary: &mut Summary) -> Result<(), FsError> {
        self.sweep_staging(new)?;
        for name in self.entries(old)? {
            if self.layout.is_known(&name) || is_staging_name(&name) {
                continue;
            }
            let unit = self.move_unit(&old.join(&name), &new.join(&name), true)?;
            summary.count(unit);
        }
        Ok(())
    }
}

impl Summary {
    fn count(&mut self, unit: Unit) {
        match unit {
            Unit::Moved => self.moved += 1,
            Unit::Skipped => self.skipped += 1,
        }
    }
}
