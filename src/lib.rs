//! Core library for `datadir_move`.
//!
//! Relocates an application's data directory (database, its backup, attachment storage and
//! auxiliary scripts) to a new location so that an interrupted or failed run can always be
//! resumed and no run ever deletes data it has not relocated first.
//!
//! - [`MigrationDetector`] decides whether a move is needed or can resume.
//! - [`DirectoryMover`] runs the move through a [`FileOps`] implementation and a
//!   [`MoveStrategy`], reporting failures through a [`Host`].

pub mod config;
pub mod detect;
pub mod errors;
pub mod fs_ops;
pub mod host;
pub mod marker;
pub mod mover;
pub mod output;
pub mod platform;
pub mod report;
pub mod strategy;
pub mod utils;

pub use config::{default_config_path, Config, DataLayout, LogLevel};
pub use detect::{MigrationDetector, MigrationNeed};
pub use errors::{FsError, FsErrorKind, MigrateError, Severity, Step};
pub use fs_ops::{FileOps, StdFs};
pub use host::{DesktopHost, Host};
pub use marker::MigrationMarker;
pub use mover::{DirectoryMover, Outcome, Summary};
pub use report::{classify, FailureReporter};
pub use strategy::{move_generic, select_strategy, GenericMove, MoveStrategy, NativeMove};
