//! Config validation logic.
//! Verifies both roots are configured and that every layout name is a single path component.

use anyhow::{bail, Result};
use std::path::{Component, Path};
use tracing::{debug, error};

use super::types::Config;

impl Config {
    /// Both roots, or an error naming the missing one.
    pub fn roots(&self) -> Result<(&Path, &Path)> {
        let old = match self.old_root.as_deref() {
            Some(p) => p,
            None => bail!("old_root is not configured; pass OLD_ROOT or set <old_root> in the config file"),
        };
        let new = match self.new_root.as_deref() {
            Some(p) => p,
            None => bail!("new_root is not configured; pass NEW_ROOT or set <new_root> in the config file"),
        };
        Ok((old, new))
    }

    /// Validate roots and layout names.
    pub fn validate(&self) -> Result<()> {
        let (old, new) = self.roots()?;
        for (label, root) in [("old_root", old), ("new_root", new)] {
            if root.as_os_str().is_empty() {
                bail!("{label} is empty");
            }
        }

        let mut seen = Vec::new();
        for (label, name) in self.layout.member_names() {
            ensure_single_component(label, &name)?;
            if seen.contains(&name) {
                error!(%label, %name, "layout names collide");
                bail!("layout name '{name}' ({label}) is used twice");
            }
            seen.push(name);
        }

        debug!(old = %old.display(), new = %new.display(), "config validated");
        Ok(())
    }
}

fn ensure_single_component(label: &str, name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => bail!("{label} must be a plain file name, got '{name}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_root_is_reported() {
        let mut cfg = Config::new("/a", "/b");
        cfg.new_root = None;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("new_root"));
    }

    #[test]
    fn nested_layout_name_rejected() {
        let mut cfg = Config::new("/a", "/b");
        cfg.layout.storage_dir = "data/storage".into();
        assert!(cfg.validate().is_err());
        cfg.layout.storage_dir = "..".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn colliding_names_rejected() {
        let mut cfg = Config::new("/a", "/b");
        cfg.layout.auxiliary_dir = cfg.layout.storage_dir.clone();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn defaults_validate() {
        Config::new("/a", "/b").validate().unwrap();
    }
}
