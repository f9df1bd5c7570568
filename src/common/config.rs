use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::paths;
use crate::display::HidpiPolicy;
use crate::platform::Backend;
use crate::ui::OutputFormat;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispmodeConfig {
    /// Display backend (auto, sway, or snapshot)
    pub backend: Backend,
    /// Snapshot file used by the snapshot backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,
    /// Pixel depth used when --depth is not given
    pub default_depth: u32,
    /// Refresh rate (Hz) used when --refresh is not given
    pub default_refresh: f64,
    /// HiDPI policy used when neither --no-hidpi nor --only-hidpi is given
    pub hidpi: HidpiPolicy,
    /// Output format (text or json)
    pub format: OutputFormat,
    /// Colorize text output
    pub color: bool,
}

impl Default for DispmodeConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            snapshot_path: None,
            default_depth: Self::DEFAULT_DEPTH,
            default_refresh: 0.0,
            hidpi: HidpiPolicy::default(),
            format: OutputFormat::default(),
            color: true,
        }
    }
}

impl DispmodeConfig {
    pub const DEFAULT_DEPTH: u32 = 32;

    pub fn load() -> Result<Self> {
        Self::load_from_path(paths::default_config_path()?)
    }

    /// Load config, writing the defaults first if the file does not exist yet
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            let config = Self::default();
            config.save_to_path(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let mut config: Self = toml::from_str(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?;
        if !config.default_refresh.is_finite() || config.default_refresh < 0.0 {
            config.default_refresh = 0.0;
        }
        Ok(config)
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating config directory {}", parent.display()))?;
        }

        let toml = toml::to_string_pretty(self).context("serializing config")?;
        fs::write(path, toml).with_context(|| format!("writing config to {}", path.display()))?;
        Ok(())
    }

    /// Snapshot file with `~` expanded
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.snapshot_path.as_deref().map(paths::expand_path)
    }
}
