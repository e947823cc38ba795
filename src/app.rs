//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the signal handler, runs detection,
//! and invokes the migration with a desktop host.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};
use tracing_appender::non_blocking::WorkerGuard;

use datadir_move::config::{load_config, LoadResult, CONFIG_ENV};
use datadir_move::fs_ops::acquire_run_lock;
use datadir_move::output as out;
use datadir_move::utils::{ensure_not_nested, same_location};
use datadir_move::{
    default_config_path, select_strategy, Config, DesktopHost, DirectoryMover, MigrateError,
    MigrationDetector, MigrationNeed, Outcome, StdFs,
};

use crate::cli::Args;
use crate::logging::init_tracing;

/// Configuration or usage problem.
const EXIT_CONFIG: u8 = 2;
/// Interrupted by Ctrl-C.
const EXIT_INTERRUPTED: i32 = 130;

type GuardSlot = Arc<Mutex<Option<WorkerGuard>>>;

fn flush_logs(slot: &GuardSlot) {
    if let Ok(mut g) = slot.lock() {
        let _ = g.take();
    }
}

fn print_config_location() {
    if let Ok(cfg_env) = std::env::var(CONFIG_ENV) {
        out::print_info(&format!("Using {CONFIG_ENV} (explicit):\n  {cfg_env}\n"));
        out::print_info(&format!("To override, unset {CONFIG_ENV} or set it to another file."));
        return;
    }
    match default_config_path() {
        Ok(p) => {
            out::print_info(&format!("Default datadir_move config path:\n  {}\n", p.display()));
            if p.exists() {
                out::print_info("A config file already exists at that location.");
            } else {
                out::print_info("No config file exists there yet. Run without --print-config to create a template.");
            }
        }
        Err(e) => out::print_error(&format!("Could not determine a default config path: {e}")),
    }
}

/// Run the CLI application.
pub fn run(args: Args) -> Result<ExitCode> {
    // Handled before logging init
    if args.print_config {
        print_config_location();
        return Ok(ExitCode::SUCCESS);
    }

    let mut cfg = match load_config() {
        Ok(LoadResult::CreatedTemplate(cfg, path)) => {
            out::print_success(&format!("A template datadir_move config was written to: {}", path.display()));
            out::print_info("Edit it to set <old_root> and <new_root>, or pass both on the command line.");
            cfg
        }
        Ok(loaded) => loaded.into_config(),
        Err(e) => {
            out::print_error(&format!("{e:#}"));
            return Ok(ExitCode::from(EXIT_CONFIG));
        }
    };
    args.apply_overrides(&mut cfg);
    if let Err(e) = cfg.validate() {
        out::print_error(&format!("{e:#}"));
        return Ok(ExitCode::from(EXIT_CONFIG));
    }
    let (old, new) = cfg.roots()?;
    let (old, new) = (old.to_path_buf(), new.to_path_buf());

    let guard = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json).inspect_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e}"));
    })?;

    // Dropped on Ctrl-C and before any exit so the file appender flushes
    let guard_slot: GuardSlot = Arc::new(Mutex::new(guard));
    {
        let guard_slot = Arc::clone(&guard_slot);
        ctrlc::set_handler(move || {
            out::print_warn("Interrupted; run again with --resume to continue the migration.");
            flush_logs(&guard_slot);
            std::process::exit(EXIT_INTERRUPTED);
        })
        .context("install Ctrl-C handler")?;
    }

    debug!("Starting datadir_move: {:?}", args);
    let code = migrate(&args, &cfg, &old, &new, &guard_slot);
    flush_logs(&guard_slot);
    code
}

fn migrate(args: &Args, cfg: &Config, old: &Path, new: &Path, guard_slot: &GuardSlot) -> Result<ExitCode> {
    let ops = StdFs;
    let detector = MigrationDetector::new(&ops, &cfg.layout);

    if args.check {
        let need = detector.should_migrate(old, new)?;
        out::print_user(need.as_str());
        return Ok(ExitCode::SUCCESS);
    }

    // Checked before locking: the lock directory may have to be created under the old root
    if let Err(e) = ensure_not_nested(old, new) {
        out::print_error(&e.to_string());
        return Ok(ExitCode::from(EXIT_CONFIG));
    }
    let _lock = acquire_run_lock(new)
        .with_context(|| format!("lock the parent directory of '{}'", new.display()))?;

    // Drops a marker whose source is gone; a live marker must name this run's source
    if let Some(source) = detector.pending_source(new)? {
        if !same_location(&source, old) {
            error!(new = %new.display(), source = %source.display(), "destination holds an unfinished migration");
            out::print_error(&format!(
                "'{}' holds an unfinished migration from '{}'. Finish it first: datadir_move '{}' '{}' --resume",
                new.display(),
                source.display(),
                source.display(),
                new.display()
            ));
            return Ok(ExitCode::from(EXIT_CONFIG));
        }
    }

    let need = detector.should_migrate(old, new)?;
    if need == MigrationNeed::None {
        info!(old = %old.display(), new = %new.display(), "no migration needed");
        out::print_info("Nothing to migrate.");
        return Ok(ExitCode::SUCCESS);
    }
    // A marker tying the new root to the old one is enough to resume
    let resume = args.resume || need == MigrationNeed::Resume;

    let host = DesktopHost::new(cfg.active_root_file.clone()).on_exit({
        let guard_slot = Arc::clone(guard_slot);
        move || flush_logs(&guard_slot)
    });
    let mover = DirectoryMover::new(&ops, &host, &cfg.layout).with_strategy(select_strategy(cfg.native_move));
    debug!(strategy = mover.strategy_name(), resume, "starting migration");

    match mover.migrate(old, new, resume) {
        Ok(Outcome::Completed(summary)) => {
            if let Some(aside) = &summary.set_aside {
                out::print_warn(&format!(
                    "An existing directory at the destination was moved to '{}'.",
                    aside.display()
                ));
            }
            out::print_user(&format!(
                "Moved '{}' -> '{}' ({} moved, {} skipped)",
                old.display(),
                summary.new_root.display(),
                summary.moved,
                summary.skipped
            ));
            Ok(ExitCode::SUCCESS)
        }
        Ok(Outcome::AlreadyComplete) | Ok(Outcome::Unchanged) => {
            out::print_info("Nothing to migrate.");
            Ok(ExitCode::SUCCESS)
        }
        Err(e @ MigrateError::NestedRoots { .. }) => {
            error!(code = e.code(), error = %e, "refusing to migrate");
            out::print_error(&e.to_string());
            Ok(ExitCode::from(EXIT_CONFIG))
        }
        Err(e) => {
            error!(code = e.code(), error = %e, "migration failed");
            Err(e.into())
        }
    }
}
