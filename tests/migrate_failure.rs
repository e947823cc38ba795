mod common;

use std::ffi::OsString;
use std::fs;
use std::path::Path;

use datadir_move::{DataLayout, DirectoryMover, GenericMove, MigrateError, Severity, StdFs, Step};
use tempfile::tempdir;

use common::{check_migration, populate_data_dir, Call, FailingOps, RecordingHost, MARKER, SCENARIO};

#[test]
fn storage_entry_failure_is_partial_and_contained() {
    let td = tempdir().unwrap();
    let old = td.path().join("old");
    let new = td.path().join("new");
    populate_data_dir(&old);

    let layout = DataLayout::default();
    let host = RecordingHost::default();
    let ops = FailingOps::new("test.html");
    let err = DirectoryMover::new(&ops, &host, &layout)
        .with_strategy(Box::new(GenericMove))
        .migrate(&old, &new, false)
        .unwrap_err();

    match &err {
        MigrateError::Failed { step, severity, .. } => {
            assert_eq!(*step, Step::Storage);
            assert_eq!(*severity, Severity::Partial);
        }
        other => panic!("unexpected error {other:?}"),
    }

    // Source keeps the failing entry; everything before it moved
    assert!(old.exists());
    assert_eq!(fs::read_to_string(old.join("storage/BBBBBBBB/test.html")).unwrap(), "3");
    assert_eq!(fs::read_to_string(new.join("storage/AAAAAAAA/test.pdf")).unwrap(), "2");
    assert_eq!(fs::read_to_string(new.join("library.sqlite")).unwrap(), "1");
    assert_eq!(fs::read_to_string(new.join("library.sqlite.bak")).unwrap(), "2");
    assert!(!new.join("translators").exists());
    assert!(old.join("translators/a.js").exists());
    assert!(new.join(MARKER).exists());

    assert_eq!(
        host.calls(),
        vec![
            Call::Reveal(old.join("storage")),
            Call::Reveal(new.join("library.sqlite")),
            Call::Terminate,
        ]
    );
}

#[test]
fn database_failure_is_full_and_leaves_only_the_marker() {
    let td = tempdir().unwrap();
    let old = td.path().join("old");
    let new = td.path().join("new");
    populate_data_dir(&old);

    let layout = DataLayout::default();
    let host = RecordingHost::default();
    let ops = FailingOps::new("library.sqlite");
    let err = DirectoryMover::new(&ops, &host, &layout)
        .with_strategy(Box::new(GenericMove))
        .migrate(&old, &new, false)
        .unwrap_err();

    assert_eq!(err.severity(), Some(Severity::Full));
    for (rel, contents) in SCENARIO {
        assert_eq!(fs::read_to_string(old.join(rel)).unwrap(), *contents, "{rel} untouched");
    }
    assert_eq!(names(&new), vec![OsString::from(MARKER)]);
    assert_eq!(host.calls(), vec![Call::Reveal(old.clone()), Call::Terminate]);
}

#[test]
fn backup_failure_is_full() {
    let td = tempdir().unwrap();
    let old = td.path().join("old");
    let new = td.path().join("new");
    populate_data_dir(&old);

    let layout = DataLayout::default();
    let host = RecordingHost::default();
    let ops = FailingOps::new("library.sqlite.bak");
    let err = DirectoryMover::new(&ops, &host, &layout)
        .with_strategy(Box::new(GenericMove))
        .migrate(&old, &new, false)
        .unwrap_err();

    assert!(matches!(
        err,
        MigrateError::Failed { step: Step::DatabaseBackup, severity: Severity::Full, .. }
    ));
    assert_eq!(host.reveals(), vec![old.clone()]);
    assert!(host.activated().is_empty());
}

#[test]
fn auxiliary_failure_is_partial() {
    let td = tempdir().unwrap();
    let old = td.path().join("old");
    let new = td.path().join("new");
    populate_data_dir(&old);

    let layout = DataLayout::default();
    let host = RecordingHost::default();
    let ops = FailingOps::new("translators");
    let err = DirectoryMover::new(&ops, &host, &layout)
        .with_strategy(Box::new(GenericMove))
        .migrate(&old, &new, false)
        .unwrap_err();

    assert!(matches!(
        err,
        MigrateError::Failed { step: Step::Auxiliary, severity: Severity::Partial, .. }
    ));
    assert!(new.join("storage/BBBBBBBB/test.html").exists());
    assert_eq!(host.terminated(), 1);
    assert!(host.activated().is_empty());
}

#[test]
fn resume_after_partial_failure_converges() {
    let td = tempdir().unwrap();
    let old = td.path().join("old");
    let new = td.path().join("new");
    populate_data_dir(&old);

    let layout = DataLayout::default();
    let failing = RecordingHost::default();
    let ops = FailingOps::new("test.html");
    DirectoryMover::new(&ops, &failing, &layout)
        .with_strategy(Box::new(GenericMove))
        .migrate(&old, &new, false)
        .unwrap_err();

    let host = RecordingHost::default();
    DirectoryMover::new(&StdFs, &host, &layout)
        .with_strategy(Box::new(GenericMove))
        .migrate(&old, &new, true)
        .unwrap();

    check_migration(&old, &new);
    assert!(!td.path().join("new-1").exists());
    assert_eq!(host.activated(), vec![new.clone()]);
}

#[test]
fn resume_after_full_failure_converges() {
    let td = tempdir().unwrap();
    let old = td.path().join("old");
    let new = td.path().join("new");
    populate_data_dir(&old);

    let layout = DataLayout::default();
    let failing = RecordingHost::default();
    DirectoryMover::new(&FailingOps::new("library.sqlite"), &failing, &layout)
        .with_strategy(Box::new(GenericMove))
        .migrate(&old, &new, false)
        .unwrap_err();

    let host = RecordingHost::default();
    DirectoryMover::new(&StdFs, &host, &layout)
        .with_strategy(Box::new(GenericMove))
        .migrate(&old, &new, true)
        .unwrap();
    check_migration(&old, &new);
}

fn names(dir: &Path) -> Vec<OsString> {
    let mut names: Vec<_> = fs::read_dir(dir).unwrap().map(|e| e.unwrap().file_name()).collect();
    names.sort();
    names
}
