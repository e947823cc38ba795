//! Advisory run lock.
//! Serialises migrations that target the same destination: the lock file lives in the
//! parent directory of the new root, which survives both the collision rename-aside
//! and the final removal of the old root.
//!
//! - Unix: flock(LOCK_EX) on `.datadir_move.lock`.
//! - Windows: open the lock file without sharing; retry on sharing violations.
//!
//! The lock is released when the guard drops. The lock file itself stays: removing it would
//! let a waiter hold a lock on an unlinked file while a newcomer locks a fresh one.

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::trace;

#[cfg(unix)]
use std::fs::File;
#[cfg(unix)]
use std::os::fd::AsRawFd;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

#[cfg(windows)]
use tracing::warn;

/// RAII guard held while a run lock is active.
pub struct RunLock {
    #[cfg(unix)]
    file: File,
    #[cfg(windows)]
    _file: std::fs::File,
    path: PathBuf,
}

impl RunLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            let _ = unsafe { libc::flock(self.file.as_raw_fd(), libc::LOCK_UN) };
        }
        trace!(path = %self.path.display(), "run lock released");
    }
}

fn lock_file_path(dir: &Path) -> PathBuf {
    dir.join(".datadir_move.lock")
}

#[cfg(unix)]
fn open_lock_file(lock_path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .custom_flags(libc::O_CLOEXEC)
        .mode(0o600)
        .open(lock_path)
}

/// Blocking acquire of the lock in `dir`.
fn acquire_dir_lock(dir: &Path) -> io::Result<RunLock> {
    let lock_path = lock_file_path(dir);
    let start = Instant::now();

    #[cfg(unix)]
    {
        let f = open_lock_file(&lock_path)?;
        let rc = unsafe { libc::flock(f.as_raw_fd(), libc::LOCK_EX) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        trace!(path = %lock_path.display(), waited_ms = start.elapsed().as_millis() as u64, "run lock acquired");
        Ok(RunLock { file: f, path: lock_path })
    }

    #[cfg(windows)]
    {
        use std::os::windows::fs::OpenOptionsExt;
        use std::thread::sleep;
        use std::time::Duration;

        let mut attempts: u32 = 0;
        loop {
            match OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .share_mode(0)
                .open(&lock_path)
            {
                Ok(f) => {
                    trace!(path = %lock_path.display(), attempts, waited_ms = start.elapsed().as_millis() as u64, "run lock acquired");
                    return Ok(RunLock { _file: f, path: lock_path });
                }
                // ERROR_SHARING_VIOLATION -> held elsewhere
                Err(e) if e.raw_os_error() == Some(32) => {
                    attempts += 1;
                    if attempts % 20 == 0 {
                        warn!(path = %lock_path.display(), attempts, "still waiting for run lock");
                    }
                    sleep(Duration::from_millis(50));
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Lock serialising migrations into `new_root` (locks its parent directory).
pub fn acquire_run_lock(new_root: &Path) -> io::Result<RunLock> {
    let parent = match new_root.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;
    acquire_dir_lock(parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    /// Acquire the run lock for `new_root` on a worker thread; the lock is held until
    /// `release` fires and each acquisition is announced on the returned channel.
    fn contender(new_root: PathBuf) -> (mpsc::Receiver<()>, mpsc::Sender<()>, thread::JoinHandle<()>) {
        let (acquired_tx, acquired_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || {
            let lock = acquire_run_lock(&new_root).unwrap();
            acquired_tx.send(()).unwrap();
            let _ = release_rx.recv();
            drop(lock);
        });
        (acquired_rx, release_tx, handle)
    }

    #[test]
    fn contended_run_lock_waits_for_release() {
        let dir = tempfile::tempdir().unwrap();
        let new_root = dir.path().join("new");
        let first = acquire_run_lock(&new_root).unwrap();

        let (acquired, release, handle) = contender(new_root.clone());
        assert!(acquired.recv_timeout(Duration::from_millis(300)).is_err());
        drop(first);
        acquired.recv_timeout(Duration::from_secs(10)).unwrap();
        release.send(()).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn three_runs_never_hold_the_lock_together() {
        let dir = tempfile::tempdir().unwrap();
        let new_root = dir.path().join("new");
        let first = acquire_run_lock(&new_root).unwrap();

        let (second_acquired, second_release, second) = contender(new_root.clone());
        assert!(second_acquired.recv_timeout(Duration::from_millis(300)).is_err());
        drop(first);
        second_acquired.recv_timeout(Duration::from_secs(10)).unwrap();

        // Second holds the lock now; a late third run must wait for it.
        let (third_acquired, third_release, third) = contender(new_root.clone());
        assert!(third_acquired.recv_timeout(Duration::from_millis(300)).is_err());
        second_release.send(()).unwrap();
        second.join().unwrap();
        third_acquired.recv_timeout(Duration::from_secs(10)).unwrap();
        third_release.send(()).unwrap();
        third.join().unwrap();
    }

    #[test]
    fn run_lock_sits_beside_new_root_and_outlives_the_guard() {
        let dir = tempfile::tempdir().unwrap();
        let new_root = dir.path().join("parent").join("new");
        let lock = acquire_run_lock(&new_root).unwrap();
        assert_eq!(lock.path().parent(), new_root.parent());
        let path = lock.path().to_path_buf();
        drop(lock);
        assert!(path.exists());
        acquire_run_lock(&new_root).unwrap();
    }
}
