//! Core configuration types.
//! - DataLayout names the fixed members of a data root.
//! - Config holds runtime settings with sensible defaults.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::paths;
use super::{AUX_DIR_DEFAULT, BACKUP_SUFFIX_DEFAULT, DATABASE_NAME_DEFAULT, MARKER_NAME_DEFAULT, STORAGE_DIR_DEFAULT};

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More info (like verbose)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Names of the fixed members of a data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    pub database_name: String,
    /// Appended to `database_name` to form the backup file name.
    pub backup_suffix: String,
    pub storage_dir: String,
    /// Directory of independently named auxiliary scripts.
    pub auxiliary_dir: String,
    pub marker_name: String,
}

impl Default for DataLayout {
    fn default() -> Self {
        Self {
            database_name: DATABASE_NAME_DEFAULT.into(),
            backup_suffix: BACKUP_SUFFIX_DEFAULT.into(),
            storage_dir: STORAGE_DIR_DEFAULT.into(),
            auxiliary_dir: AUX_DIR_DEFAULT.into(),
            marker_name: MARKER_NAME_DEFAULT.into(),
        }
    }
}

impl DataLayout {
    pub fn database(&self, root: &Path) -> PathBuf {
        root.join(&self.database_name)
    }

    pub fn backup_name(&self) -> String {
        format!("{}{}", self.database_name, self.backup_suffix)
    }

    pub fn database_backup(&self, root: &Path) -> PathBuf {
        root.join(self.backup_name())
    }

    pub fn storage(&self, root: &Path) -> PathBuf {
        root.join(&self.storage_dir)
    }

    pub fn auxiliary(&self, root: &Path) -> PathBuf {
        root.join(&self.auxiliary_dir)
    }

    pub fn marker(&self, root: &Path) -> PathBuf {
        root.join(&self.marker_name)
    }

    /// True for the top-level names with a dedicated migration step (marker included).
    pub fn is_known(&self, name: &OsStr) -> bool {
        let backup = self.backup_name();
        [
            self.database_name.as_str(),
            backup.as_str(),
            self.storage_dir.as_str(),
            self.auxiliary_dir.as_str(),
            self.marker_name.as_str(),
        ]
        .iter()
        .any(|known| name == OsStr::new(known))
    }

    /// Each name must be a single, non-empty path component.
    pub fn member_names(&self) -> [(&'static str, String); 5] {
        [
            ("database_name", self.database_name.clone()),
            ("backup_name", self.backup_name()),
            ("storage_dir", self.storage_dir.clone()),
            ("auxiliary_dir", self.auxiliary_dir.clone()),
            ("marker_name", self.marker_name.clone()),
        ]
    }
}

/// Runtime configuration for the binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// Current data root (source of the migration)
    pub old_root: Option<PathBuf>,
    /// Requested data root (destination)
    pub new_root: Option<PathBuf>,
    pub layout: DataLayout,
    /// Use the platform move command for directory units when available
    pub native_move: bool,
    /// File that receives the new root path after a successful migration
    pub active_root_file: Option<PathBuf>,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            old_root: None,
            new_root: None,
            layout: DataLayout::default(),
            native_move: true,
            active_root_file: None,
            log_level: LogLevel::Normal,
            log_file: paths::default_log_path().ok(),
        }
    }
}

impl Config {
    /// Construct a Config with explicit roots; other fields use defaults.
    pub fn new(old_root: impl Into<PathBuf>, new_root: impl Into<PathBuf>) -> Self {
        Self {
            old_root: Some(old_root.into()),
            new_root: Some(new_root.into()),
            ..Default::default()
        }
    }
}
