use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Hidden sibling of `dst` used while an entry is being copied or written.
/// Name format: ".<name>.datadir_move.<pid>.<nanos>.tmp"
pub(crate) fn staging_path(dst: &Path) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let mut name = OsString::from(".");
    name.push(dst.file_name().unwrap_or_else(|| "entry".as_ref()));
    name.push(format!(".datadir_move.{}.{}.tmp", pid, nanos));
    dst.with_file_name(name)
}

/// True for leftovers of an interrupted copy or write (see [`staging_path`]).
pub(crate) fn is_staging_name(name: &OsStr) -> bool {
    name.to_str()
        .is_some_and(|n| n.starts_with('.') && n.contains(".datadir_move.") && n.ends_with(".tmp"))
}

pub fn is_cross_device(e: &io::Error) -> bool {
    // std::io::ErrorKind::CrossesDevices is not stable everywhere; use raw OS codes.
    if let Some(code) = e.raw_os_error() {
        #[cfg(unix)]
        {
            if code == libc::EXDEV {
                return true;
            }
        }
        #[cfg(windows)]
        {
            // ERROR_NOT_SAME_DEVICE
            if code == 17 {
                return true;
            }
        }
        #[cfg(not(any(unix, windows)))]
        {
            let _ = code;
        }
    }
    false
}

#[cfg(unix)]
pub(crate) fn fsync_dir(dir: &Path) -> io::Result<()> {
    let f = std::fs::File::open(dir)?;
    f.sync_all()
}

#[cfg(not(unix))]
pub(crate) fn fsync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
