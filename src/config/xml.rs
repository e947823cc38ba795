//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde).
//! - Creates a secure template at the default location if missing.
//!
//! Notes:
//! - Unknown fields are rejected so typos surface instead of silently using defaults.
//! - Values are trimmed; empty elements mean "unset".

use anyhow::{bail, Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::{Deserialize, Deserializer};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::paths::{default_config_path, default_log_path, path_has_symlink_ancestor};
use super::types::{Config, LogLevel};
use super::{AUX_DIR_DEFAULT, BACKUP_SUFFIX_DEFAULT, CONFIG_ENV, DATABASE_NAME_DEFAULT, MARKER_NAME_DEFAULT, STORAGE_DIR_DEFAULT};
use crate::platform::write_new_file_0600;

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    old_root: Option<String>,
    new_root: Option<String>,
    database_name: Option<String>,
    backup_suffix: Option<String>,
    storage_dir: Option<String>,
    auxiliary_dir: Option<String>,
    marker_name: Option<String>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    native_move: Option<bool>,
    active_root_file: Option<String>,
    log_level: Option<String>,
    log_file: Option<String>,
}

// Accept " true ", "1", "no" etc.; anything unparseable is treated as unset.
fn de_bool_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }))
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

// Map XmlConfig -> Config
fn xml_to_config(parsed: XmlConfig) -> Config {
    let mut cfg = Config::default();

    cfg.old_root = non_empty(parsed.old_root.as_deref()).map(PathBuf::from);
    cfg.new_root = non_empty(parsed.new_root.as_deref()).map(PathBuf::from);
    if let Some(s) = non_empty(parsed.database_name.as_deref()) {
        cfg.layout.database_name = s.to_string();
    }
    // An empty suffix would make the backup collide with the database; keep the default.
    if let Some(s) = non_empty(parsed.backup_suffix.as_deref()) {
        cfg.layout.backup_suffix = s.to_string();
    }
    if let Some(s) = non_empty(parsed.storage_dir.as_deref()) {
        cfg.layout.storage_dir = s.to_string();
    }
    if let Some(s) = non_empty(parsed.auxiliary_dir.as_deref()) {
        cfg.layout.auxiliary_dir = s.to_string();
    }
    if let Some(s) = non_empty(parsed.marker_name.as_deref()) {
        cfg.layout.marker_name = s.to_string();
    }
    if let Some(b) = parsed.native_move {
        cfg.native_move = b;
    }
    cfg.active_root_file = non_empty(parsed.active_root_file.as_deref()).map(PathBuf::from);
    if let Some(level) = non_empty(parsed.log_level.as_deref()).and_then(LogLevel::parse) {
        cfg.log_level = level;
    }
    if let Some(s) = non_empty(parsed.log_file.as_deref()) {
        cfg.log_file = Some(PathBuf::from(s));
    }
    cfg
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig =
        from_xml_str(&contents).with_context(|| format!("parse config xml '{}'", path.display()))?;
    Ok(xml_to_config(parsed))
}

/// Outcome of [`load_config`].
#[derive(Debug)]
pub enum LoadResult {
    /// Config read from the given file.
    Loaded(Config, PathBuf),
    /// No config file was found and none could be created; defaults apply.
    Defaults(Config),
    /// A template was written to the default location; defaults apply for this run.
    CreatedTemplate(Config, PathBuf),
}

impl LoadResult {
    pub fn into_config(self) -> Config {
        match self {
            LoadResult::Loaded(c, _) | LoadResult::Defaults(c) | LoadResult::CreatedTemplate(c, _) => c,
        }
    }
}

/// Resolve and load the config file.
/// An explicit `$DATADIR_MOVE_CONFIG` must exist; a missing default file gets a template.
pub fn load_config() -> Result<LoadResult> {
    let explicit = env::var_os(CONFIG_ENV).is_some();
    let path = default_config_path()?;

    if path.is_file() {
        let cfg = load_config_from_xml_path(&path)?;
        return Ok(LoadResult::Loaded(cfg, path));
    }
    if explicit {
        bail!("{} points to '{}', which is not a readable file", CONFIG_ENV, path.display());
    }
    match create_template_config(&path) {
        Ok(()) => Ok(LoadResult::CreatedTemplate(Config::default(), path)),
        Err(e) => {
            tracing::debug!(error = %e, path = %path.display(), "could not create template config");
            Ok(LoadResult::Defaults(Config::default()))
        }
    }
}

/// Create a template config file (0600) and its parent directory.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        bail!("Refusing to create config: ancestor of {} is a symlink", path.display());
    }

    let suggested_log = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "/path/to/datadir_move.log".into());

    let content = format!(
        "<!--\n  datadir_move configuration (XML)\n\n    old_root          -> current data directory\n    new_root          -> where the data directory should live\n    database_name     -> database file name inside the root\n    backup_suffix     -> appended to database_name for the backup file\n    storage_dir       -> attachment storage directory (one subdirectory per item)\n    auxiliary_dir     -> directory of auxiliary scripts\n    marker_name       -> migration marker file name\n    native_move       -> use the platform move command for directories (true/false)\n    active_root_file  -> file that receives the new root after success (optional)\n    log_level         -> quiet | normal | info | debug\n    log_file          -> path to log file (optional)\n\n  CLI arguments override these values.\n-->\n<config>\n  <old_root></old_root>\n  <new_root></new_root>\n  <database_name>{}</database_name>\n  <backup_suffix>{}</backup_suffix>\n  <storage_dir>{}</storage_dir>\n  <auxiliary_dir>{}</auxiliary_dir>\n  <marker_name>{}</marker_name>\n  <native_move>true</native_move>\n  <active_root_file></active_root_file>\n  <log_level>normal</log_level>\n  <log_file>{}</log_file>\n</config>\n",
        DATABASE_NAME_DEFAULT,
        BACKUP_SUFFIX_DEFAULT,
        STORAGE_DIR_DEFAULT,
        AUX_DIR_DEFAULT,
        MARKER_NAME_DEFAULT,
        suggested_log
    );

    write_new_file_0600(path, content.as_bytes())?;
    info!("Created template config at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataLayout;

    #[test]
    fn template_parses_back_to_defaults() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("config.xml");
        create_template_config(&path).unwrap();
        let cfg = load_config_from_xml_path(&path).unwrap();
        assert_eq!(cfg.layout, DataLayout::default());
        assert!(cfg.old_root.is_none());
        assert!(cfg.new_root.is_none());
        assert!(cfg.native_move);
    }

    #[test]
    fn bool_values_are_trimmed() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("config.xml");
        fs::write(&path, "<config><native_move>  false \n</native_move></config>").unwrap();
        let cfg = load_config_from_xml_path(&path).unwrap();
        assert!(!cfg.native_move);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("config.xml");
        fs::write(&path, "<config><storage_root>/x</storage_root></config>").unwrap();
        assert!(load_config_from_xml_path(&path).is_err());
    }
}
