//! Config module.
//! Provides configuration types, default paths, XML loading, and validation.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{default_config_path, default_log_path, path_has_symlink_ancestor};
pub use types::{Config, DataLayout, LogLevel};
pub use xml::{create_template_config, load_config, load_config_from_xml_path, LoadResult};

pub const DATABASE_NAME_DEFAULT: &str = "library.sqlite";
pub const BACKUP_SUFFIX_DEFAULT: &str = ".bak";
pub const STORAGE_DIR_DEFAULT: &str = "storage";
pub const AUX_DIR_DEFAULT: &str = "translators";
pub const MARKER_NAME_DEFAULT: &str = "migrate-dir";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "DATADIR_MOVE_CONFIG";
