//! Failure classification and reporting.
//!
//! A failed step is classified once by its position in the run, the affected paths are shown
//! to the user, and the host is told to stop. Nothing is retried and nothing is deleted.

use std::path::{Path, PathBuf};
use tracing::{error, warn};

use crate::config::DataLayout;
use crate::errors::{FsError, MigrateError, Severity, Step};
use crate::host::Host;
use crate::output as out;

/// Steps up to and including the database backup leave the source root intact.
pub fn classify(step: Step) -> Severity {
    match step {
        Step::PrepareDestination | Step::CommitMarker | Step::Database | Step::DatabaseBackup => {
            Severity::Full
        }
        Step::Storage | Step::Auxiliary | Step::Residual | Step::Finalize => Severity::Partial,
    }
}

pub struct FailureReporter<'a> {
    host: &'a dyn Host,
    layout: &'a DataLayout,
}

impl<'a> FailureReporter<'a> {
    pub fn new(host: &'a dyn Host, layout: &'a DataLayout) -> Self {
        Self { host, layout }
    }

    /// Paths shown to the user, in reveal order.
    pub fn reveal_targets(&self, severity: Severity, old: &Path, new: &Path) -> Vec<PathBuf> {
        match severity {
            Severity::Full => vec![old.to_path_buf()],
            Severity::Partial => vec![self.layout.storage(old), self.layout.database(new)],
        }
    }

    /// Log, reveal, terminate; returns the error for hosts whose `terminate` returns.
    pub fn report(&self, old: &Path, new: &Path, step: Step, source: FsError) -> MigrateError {
        let severity = classify(step);
        let (kind, op, path) = (source.kind, source.op, source.path.clone());
        let err = MigrateError::Failed {
            step,
            severity,
            source,
        };
        error!(
            code = err.code(),
            step = %step,
            severity = %severity,
            kind = %kind,
            op,
            path = %path.display(),
            old = %old.display(),
            new = %new.display(),
            error = %err,
            "data directory migration failed"
        );

        let targets = self.reveal_targets(severity, old, new);
        let shown = targets
            .iter()
            .map(|p| format!("  {}", p.display()))
            .collect::<Vec<_>>()
            .join("\n");
        let summary = match severity {
            Severity::Full => format!(
                "The data directory could not be moved; '{}' is unchanged.",
                old.display()
            ),
            Severity::Partial => format!(
                "The data directory was only partly moved to '{}'; remaining files are still under '{}'.",
                new.display(),
                old.display()
            ),
        };
        out::print_error(&format!("{summary}\n{err}\nSee:\n{shown}"));
        out::print_info(&format!(
            "Fix the problem, then run again with --resume to continue from '{}'.",
            old.display()
        ));

        for path in &targets {
            if let Err(e) = self.host.reveal(path) {
                warn!(path = %path.display(), error = %e, "could not reveal path");
            }
        }
        self.host.terminate();
        err
    }
}
