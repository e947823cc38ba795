use std::path::Path;
use walkdir::WalkDir;

use super::helpers::fs_error;
use crate::errors::{FsError, FsErrorKind};

pub(super) fn format_bytes(n: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    let f = n as f64;
    if f >= GB {
        format!("{:.1} GiB", f / GB)
    } else if f >= MB {
        format!("{:.1} MiB", f / MB)
    } else if f >= KB {
        format!("{:.1} KiB", f / KB)
    } else {
        format!("{} B", n)
    }
}

/// Total size of regular files under `path` (or of `path` itself when it is a file).
pub(super) fn tree_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter_map(|e| e.metadata().ok())
        .filter(|m| m.is_file())
        .map(|m| m.len())
        .sum()
}

/// Fail early when `dst_dir` cannot hold `required` bytes plus a small cushion.
pub(super) fn ensure_space_for_copy(dst_dir: &Path, required: u64) -> Result<(), FsError> {
    let free = fs2::available_space(dst_dir).map_err(fs_error("query free space", dst_dir))?;
    let cushion: u64 = 4 * 1024 * 1024;
    if free < required.saturating_add(cushion) {
        return Err(FsError::other(
            FsErrorKind::Unknown,
            "copy",
            dst_dir,
            format!(
                "not enough free space: need ~{}, free {}",
                format_bytes(required),
                format_bytes(free)
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_units() {
        assert_eq!(format_bytes(12), "12 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MiB");
    }

    #[test]
    fn tree_size_sums_nested_files() {
        let td = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(td.path().join("a/b")).unwrap();
        std::fs::write(td.path().join("a/one"), b"123").unwrap();
        std::fs::write(td.path().join("a/b/two"), b"45").unwrap();
        assert_eq!(tree_size(td.path()), 5);
    }

    #[test]
    fn small_copy_fits_in_temp_dir() {
        let td = tempfile::tempdir().unwrap();
        ensure_space_for_copy(td.path(), 1).unwrap();
    }
}
