use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Get the dispmode config directory
pub fn dispmode_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join("dispmode");

    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("creating config directory at {}", config_dir.display()))?;

    Ok(config_dir)
}

/// Default location of config.toml
pub fn default_config_path() -> Result<PathBuf> {
    Ok(dispmode_config_dir()?.join("config.toml"))
}

/// Expand a leading `~` and environment variables in a user supplied path
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(&raw).as_ref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_home_directory() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(
            expand_path(Path::new("~/displays.json")),
            home.join("displays.json")
        );
        assert_eq!(
            expand_path(Path::new("/etc/displays.json")),
            PathBuf::from("/etc/displays.json")
        );
    }
}
