//! Default path helpers and symlink checks.
//! Determines OS-appropriate config/log paths and detects symlinked ancestors for safety.

use anyhow::{anyhow, Result};
use dirs::{config_dir, data_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::CONFIG_ENV;

/// Config file location: `$DATADIR_MOVE_CONFIG` if set (relative paths resolve against
/// the working directory), else `<config_dir>/datadir_move/config.xml`.
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(p) = env::var_os(CONFIG_ENV) {
        let p = PathBuf::from(p);
        if p.is_absolute() {
            return Ok(p);
        }
        return Ok(env::current_dir()?.join(p));
    }
    if let Some(mut base) = config_dir() {
        base.push("datadir_move");
        base.push("config.xml");
        return Ok(base);
    }
    env::var_os("HOME")
        .map(|h| {
            PathBuf::from(h)
                .join(".config")
                .join("datadir_move")
                .join("config.xml")
        })
        .ok_or_else(|| anyhow!("cannot determine a config directory (no config dir and no HOME)"))
}

/// OS-appropriate default log file path (data dir). Does not create anything.
pub fn default_log_path() -> Result<PathBuf> {
    if let Some(mut base) = data_dir() {
        base.push("datadir_move");
        base.push("datadir_move.log");
        return Ok(base);
    }
    env::var_os("HOME")
        .map(|h| {
            PathBuf::from(h)
                .join(".local")
                .join("share")
                .join("datadir_move")
                .join("datadir_move.log")
        })
        .ok_or_else(|| anyhow!("cannot determine a data directory for the log file"))
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.exists() {
            let meta = fs::symlink_metadata(anc)?;
            if meta.file_type().is_symlink() {
                return Ok(true);
            }
        }
        p = anc.parent();
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn env_override_wins() {
        let td = tempfile::tempdir().unwrap();
        let cfg = td.path().join("custom.xml");
        unsafe { env::set_var(CONFIG_ENV, &cfg) };
        let got = default_config_path().unwrap();
        unsafe { env::remove_var(CONFIG_ENV) };
        assert_eq!(got, cfg);
    }

    #[test]
    #[serial]
    fn default_path_ends_with_app_dir() {
        unsafe { env::remove_var(CONFIG_ENV) };
        let got = default_config_path().unwrap();
        assert!(got.ends_with(Path::new("datadir_move").join("config.xml")));
    }

    #[cfg(unix)]
    #[test]
    fn detects_symlinked_ancestor() {
        let td = tempfile::tempdir().unwrap();
        let real = td.path().join("real");
        fs::create_dir_all(&real).unwrap();
        let link = td.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        assert!(path_has_symlink_ancestor(&link.join("file.log")).unwrap());
        assert!(!path_has_symlink_ancestor(&real.join("file.log")).unwrap());
    }
}
