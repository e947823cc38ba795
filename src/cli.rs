//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - Positional roots override the config file.
//! - --debug is a shorthand for --log-level debug.

use clap::{Parser, ValueHint};
use std::path::PathBuf;

use datadir_move::{Config, LogLevel};

/// Move an application's data directory to a new location, resumably.
/// CLI flags override config values (which are loaded from XML if present).
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Relocate an application data directory safely (Rust)")]
pub struct Args {
    /// Current data directory (overrides <old_root> in the config file).
    #[arg(value_name = "OLD_ROOT", value_hint = ValueHint::DirPath)]
    pub old_root: Option<PathBuf>,

    /// Destination data directory (overrides <new_root> in the config file).
    #[arg(value_name = "NEW_ROOT", value_hint = ValueHint::DirPath)]
    pub new_root: Option<PathBuf>,

    /// Continue an interrupted migration into NEW_ROOT.
    #[arg(long, help = "Continue an interrupted migration, keeping what already moved")]
    pub resume: bool,

    /// Force the generic rename/copy strategy even if a native move command exists.
    #[arg(long, help = "Do not use the platform move command for directories")]
    pub no_native_move: bool,

    /// Only report whether a migration is needed: none, fresh or resume.
    #[arg(long, help = "Print none, fresh or resume and exit without moving anything")]
    pub check: bool,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(short = 'd', long, help = "Enable debug logging (shorthand for --log-level debug)")]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    /// Emit logs in structured JSON.
    #[arg(long, help = "Emit logs in structured JSON")]
    pub json: bool,

    /// Print where datadir_move looks for its config file, then exit.
    #[arg(long, help = "Print the config file location used by datadir_move and exit")]
    pub print_config: bool,
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(p) = &self.old_root {
            cfg.old_root = Some(p.clone());
        }
        if let Some(p) = &self.new_root {
            cfg.new_root = Some(p.clone());
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if self.no_native_move {
            cfg.native_move = false;
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
