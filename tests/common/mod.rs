#![allow(dead_code)]

use std::cell::RefCell;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use datadir_move::{FileOps, FsError, FsErrorKind, GenericMove, Host, MoveStrategy, NativeMove, StdFs};

/// Data root used throughout: relative path and contents.
pub const SCENARIO: &[(&str, &str)] = &[
    ("library.sqlite", "1"),
    ("library.sqlite.bak", "2"),
    ("storage/AAAAAAAA/test.pdf", "2"),
    ("storage/BBBBBBBB/test.html", "3"),
    ("translators/a.js", "4"),
    ("translators/b.js", "5"),
];

pub const MARKER: &str = "migrate-dir";

pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, contents).expect("write file");
}

/// Fill `root` with the scenario and a marker naming `root` itself.
pub fn populate_data_dir(root: &Path) {
    for (rel, contents) in SCENARIO {
        write_file(&root.join(rel), contents);
    }
    write_file(&root.join(MARKER), root.to_str().expect("utf-8 temp path"));
}

/// Every scenario file at `new` with its contents, `old` gone, no marker left.
pub fn check_migration(old: &Path, new: &Path) {
    assert!(!old.exists(), "old root should be removed: {}", old.display());
    for (rel, contents) in SCENARIO {
        let p = new.join(rel);
        assert_eq!(
            fs::read_to_string(&p).unwrap_or_else(|e| panic!("read {}: {e}", p.display())),
            *contents,
            "contents of {rel}"
        );
    }
    assert!(!new.join(MARKER).exists(), "marker should be removed");
}

/// Strategies available on this machine: generic always, native when `/bin/mv` exists.
pub fn strategies() -> Vec<Box<dyn MoveStrategy>> {
    let mut all: Vec<Box<dyn MoveStrategy>> = vec![Box::new(GenericMove)];
    if let Some(native) = NativeMove::detect() {
        all.push(Box::new(native));
    }
    all
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Reveal(PathBuf),
    Terminate,
    Activate(PathBuf),
}

/// Host that records every hook call instead of acting on it.
#[derive(Default)]
pub struct RecordingHost {
    calls: RefCell<Vec<Call>>,
}

impl RecordingHost {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn reveals(&self) -> Vec<PathBuf> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Reveal(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn terminated(&self) -> usize {
        self.calls.borrow().iter().filter(|c| **c == Call::Terminate).count()
    }

    pub fn activated(&self) -> Vec<PathBuf> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Activate(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Host for RecordingHost {
    fn reveal(&self, path: &Path) -> std::io::Result<()> {
        self.calls.borrow_mut().push(Call::Reveal(path.to_path_buf()));
        Ok(())
    }

    fn terminate(&self) {
        self.calls.borrow_mut().push(Call::Terminate);
    }

    fn activate_new_root(&self, root: &Path) -> std::io::Result<()> {
        self.calls.borrow_mut().push(Call::Activate(root.to_path_buf()));
        Ok(())
    }
}

/// [`StdFs`] whose `rename` fails for a source named `name` or a directory holding `name`.
pub struct FailingOps {
    name: OsString,
    kind: FsErrorKind,
}

impl FailingOps {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            kind: FsErrorKind::Unknown,
        }
    }

    fn hits(&self, src: &Path) -> bool {
        src.file_name() == Some(self.name.as_os_str()) || src.join(&self.name).exists()
    }
}

/// [`StdFs`] whose `rename` always reports a cross-device move.
pub struct CrossDeviceOps;

macro_rules! delegate_to_std {
    () => {
        fn exists(&self, path: &Path) -> bool {
            StdFs.exists(path)
        }
        fn is_dir(&self, path: &Path) -> bool {
            StdFs.is_dir(path)
        }
        fn make_dir(&self, path: &Path) -> Result<(), FsError> {
            StdFs.make_dir(path)
        }
        fn copy_file(&self, src: &Path, dst: &Path) -> Result<(), FsError> {
            StdFs.copy_file(src, dst)
        }
        fn copy_tree(&self, src: &Path, dst: &Path) -> Result<(), FsError> {
            StdFs.copy_tree(src, dst)
        }
        fn remove_recursive(&self, path: &Path) -> Result<(), FsError> {
            StdFs.remove_recursive(path)
        }
        fn list_dir(&self, path: &Path) -> Result<Vec<OsString>, FsError> {
            StdFs.list_dir(path)
        }
        fn read_text(&self, path: &Path) -> Result<String, FsError> {
            StdFs.read_text(path)
        }
        fn write_text(&self, path: &Path, contents: &str) -> Result<(), FsError> {
            StdFs.write_text(path, contents)
        }
    };
}

impl FileOps for FailingOps {
    delegate_to_std!();

    fn rename(&self, src: &Path, dst: &Path) -> Result<(), FsError> {
        if self.hits(src) {
            return Err(FsError::other(self.kind, "rename", src, "injected failure"));
        }
        StdFs.rename(src, dst)
    }
}

impl FileOps for CrossDeviceOps {
    delegate_to_std!();

    fn rename(&self, src: &Path, _dst: &Path) -> Result<(), FsError> {
        Err(FsError::other(FsErrorKind::CrossDevice, "rename", src, "simulated cross-device rename"))
    }
}
