//! Strategies for relocating one filesystem entry.
//!
//! - [`GenericMove`]: rename; on a cross-device error copy the unit through a staging
//!   sibling and remove the source.
//! - [`NativeMove`]: hand directory units to the platform `mv` command.
//!
//! Single files always go through [`move_generic`] whichever strategy is selected.

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

use crate::errors::{FsError, FsErrorKind};
use crate::fs_ops::{fs_error, FileOps};

/// Default location of the platform move command.
pub const NATIVE_MOVE_PROGRAM: &str = "/bin/mv";

/// Moves a directory unit from `src` to a `dst` that does not exist yet.
pub trait MoveStrategy {
    fn name(&self) -> &'static str;
    fn move_dir(&self, ops: &dyn FileOps, src: &Path, dst: &Path) -> Result<(), FsError>;
}

/// Rename `src` to `dst`, copying then deleting when the rename crosses filesystems.
pub fn move_generic(ops: &dyn FileOps, src: &Path, dst: &Path) -> Result<(), FsError> {
    match ops.rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if e.kind == FsErrorKind::CrossDevice => {
            warn!(
                src = %src.display(),
                dst = %dst.display(),
                "rename crosses filesystems; copying then removing source"
            );
            ops.copy_tree(src, dst)?;
            ops.remove_recursive(src)?;
            info!(src = %src.display(), dst = %dst.display(), "copied across filesystems and removed source");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GenericMove;

impl MoveStrategy for GenericMove {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn move_dir(&self, ops: &dyn FileOps, src: &Path, dst: &Path) -> Result<(), FsError> {
        move_generic(ops, src, dst)
    }
}

#[derive(Debug, Clone)]
pub struct NativeMove {
    program: PathBuf,
}

impl NativeMove {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Probe for the platform move command. Always `None` on Windows.
    pub fn detect() -> Option<Self> {
        if cfg!(windows) {
            return None;
        }
        let program = Path::new(NATIVE_MOVE_PROGRAM);
        program.is_file().then(|| Self::new(program))
    }
}

impl MoveStrategy for NativeMove {
    fn name(&self) -> &'static str {
        "native"
    }

    fn move_dir(&self, ops: &dyn FileOps, src: &Path, dst: &Path) -> Result<(), FsError> {
        // mv would nest src inside an existing directory instead of failing
        if ops.exists(dst) {
            return Err(FsError::other(
                FsErrorKind::AlreadyExists,
                "move directory",
                dst,
                "destination already exists",
            ));
        }
        if !ops.exists(src) {
            return Err(FsError::other(FsErrorKind::NotFound, "move directory", src, "source is missing"));
        }

        let output = Command::new(&self.program)
            .arg("--")
            .arg(src)
            .arg(dst)
            .output()
            .map_err(fs_error("run move command", &self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let detail = if stderr.is_empty() {
                format!("{} exited with {}", self.program.display(), output.status)
            } else {
                format!("{} exited with {}: {}", self.program.display(), output.status, stderr)
            };
            return Err(FsError::other(FsErrorKind::Unknown, "move directory", src, detail));
        }
        debug!(src = %src.display(), dst = %dst.display(), program = %self.program.display(), "moved with native command");
        Ok(())
    }
}

/// Pick the strategy for one run: native when preferred and available, else generic.
pub fn select_strategy(prefer_native: bool) -> Box<dyn MoveStrategy> {
    if prefer_native {
        if let Some(native) = NativeMove::detect() {
            return Box::new(native);
        }
        debug!("native move command not found; using generic strategy");
    }
    Box::new(GenericMove)
}
