//! Hooks the migration engine uses to reach the application that hosts it.

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::fs_ops::{FileOps, StdFs};
use crate::output as out;

pub trait Host {
    /// Show `path` to the user. Best effort; a failure never masks a migration error.
    fn reveal(&self, path: &Path) -> io::Result<()>;

    /// Stop the process after a reported failure. Called once, after the reveals.
    /// Production hosts do not return; test hosts record the call.
    fn terminate(&self);

    /// Switch the application to `root`. Called once, only after a complete migration.
    fn activate_new_root(&self, root: &Path) -> io::Result<()>;
}

type ExitHook = Box<dyn Fn() + Send + Sync>;

/// Host for the standalone binary.
#[derive(Default)]
pub struct DesktopHost {
    active_root_file: Option<PathBuf>,
    before_exit: Option<ExitHook>,
}

impl DesktopHost {
    pub fn new(active_root_file: Option<PathBuf>) -> Self {
        Self {
            active_root_file,
            before_exit: None,
        }
    }

    /// Run `hook` right before `terminate` exits (e.g. to flush logs).
    pub fn on_exit(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.before_exit = Some(Box::new(hook));
        self
    }
}

impl Host for DesktopHost {
    fn reveal(&self, path: &Path) -> io::Result<()> {
        // File managers open directories; show a file by opening its parent.
        let target = if path.is_dir() {
            path
        } else {
            path.parent().unwrap_or(path)
        };
        debug!(path = %target.display(), "revealing path");
        open::that(target)
    }

    fn terminate(&self) {
        if let Some(hook) = &self.before_exit {
            hook();
        }
        std::process::exit(1);
    }

    fn activate_new_root(&self, root: &Path) -> io::Result<()> {
        if let Some(file) = &self.active_root_file {
            if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let text = root.to_string_lossy();
            StdFs.write_text(file, &format!("{text}\n")).map_err(io::Error::other)?;
            info!(file = %file.display(), root = %root.display(), "active root recorded");
        }
        out::print_success(&format!("Data directory is now '{}'", root.display()));
        Ok(())
    }
}
