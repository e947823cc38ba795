//! Typed error definitions for datadir_move.
//! A small filesystem error taxonomy plus the migration-level error returned by the mover.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Classification of a failed filesystem primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsErrorKind {
    /// Source missing. Benign during resume: the entry was already migrated.
    NotFound,
    /// Destination present. Benign for per-entry skip checks.
    AlreadyExists,
    /// Rename across filesystems; the generic strategy copies instead.
    CrossDevice,
    PermissionDenied,
    Unknown,
}

impl FsErrorKind {
    /// Map an `io::Error` onto the taxonomy, using raw OS codes for cross-device renames.
    pub fn of(e: &io::Error) -> Self {
        if crate::fs_ops::is_cross_device(e) {
            return FsErrorKind::CrossDevice;
        }
        match e.kind() {
            io::ErrorKind::NotFound => FsErrorKind::NotFound,
            io::ErrorKind::AlreadyExists => FsErrorKind::AlreadyExists,
            io::ErrorKind::PermissionDenied => FsErrorKind::PermissionDenied,
            _ => FsErrorKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FsErrorKind::NotFound => "not_found",
            FsErrorKind::AlreadyExists => "already_exists",
            FsErrorKind::CrossDevice => "cross_device",
            FsErrorKind::PermissionDenied => "permission_denied",
            FsErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FsErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed filesystem primitive with its operation, path and a human-friendly message.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct FsError {
    pub kind: FsErrorKind,
    pub op: &'static str,
    pub path: PathBuf,
    message: String,
    #[source]
    source: io::Error,
}

impl FsError {
    pub(crate) fn new(kind: FsErrorKind, op: &'static str, path: PathBuf, message: String, source: io::Error) -> Self {
        Self { kind, op, path, message, source }
    }

    /// Build an error without an underlying OS failure (e.g. an exhausted name search).
    pub fn other(kind: FsErrorKind, op: &'static str, path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        let path = path.into();
        let detail = detail.into();
        let message = format!("{} '{}': {}", op, path.display(), detail);
        let io_kind = match kind {
            FsErrorKind::NotFound => io::ErrorKind::NotFound,
            FsErrorKind::AlreadyExists => io::ErrorKind::AlreadyExists,
            FsErrorKind::PermissionDenied => io::ErrorKind::PermissionDenied,
            FsErrorKind::CrossDevice | FsErrorKind::Unknown => io::ErrorKind::Other,
        };
        Self { kind, op, path, message, source: io::Error::new(io_kind, detail) }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == FsErrorKind::NotFound
    }
}

/// Ordered steps of a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    PrepareDestination,
    CommitMarker,
    Database,
    DatabaseBackup,
    Storage,
    Auxiliary,
    Residual,
    Finalize,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::PrepareDestination => "prepare_destination",
            Step::CommitMarker => "commit_marker",
            Step::Database => "database",
            Step::DatabaseBackup => "database_backup",
            Step::Storage => "storage",
            Step::Auxiliary => "auxiliary",
            Step::Residual => "residual",
            Step::Finalize => "finalize",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much of the data root had been relocated when a step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Source root still fully or mostly intact.
    Full,
    /// Critical files relocated; the rest is split between both roots.
    Partial,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Full => "full",
            Severity::Partial => "partial",
        })
    }
}

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("migration {severity} failure at step {step}: {source}")]
    Failed {
        step: Step,
        severity: Severity,
        #[source]
        source: FsError,
    },

    #[error("refusing to migrate between nested roots: '{}' and '{}'", old.display(), new.display())]
    NestedRoots { old: PathBuf, new: PathBuf },

    #[error(transparent)]
    Fs(#[from] FsError),
}

impl MigrateError {
    /// Stable numeric code for logs and scripting.
    pub fn code(&self) -> u16 {
        match self {
            MigrateError::Failed { severity: Severity::Full, .. } => 10,
            MigrateError::Failed { severity: Severity::Partial, .. } => 11,
            MigrateError::NestedRoots { .. } => 20,
            MigrateError::Fs(_) => 30,
        }
    }

    pub fn severity(&self) -> Option<Severity> {
        match self {
            MigrateError::Failed { severity, .. } => Some(*severity),
            _ => None,
        }
    }
}
