use anyhow::Result;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const ENCODING_32: &str = "--------RRRRRRRRGGGGGGGGBBBBBBBB";

/// Isolated config and snapshot files for one test
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: tempfile::tempdir()?,
        })
    }

    /// Environment seeded with the two-display desk setup
    pub fn with_desk() -> Result<Self> {
        let env = Self::new()?;
        env.write_snapshot(&desk_snapshot())?;
        Ok(env)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("config").join("config.toml")
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.path().join("displays.json")
    }

    pub fn write_snapshot(&self, snapshot: &Value) -> Result<()> {
        std::fs::write(self.snapshot_path(), serde_json::to_string_pretty(snapshot)?)?;
        Ok(())
    }

    pub fn read_snapshot(&self) -> Result<Value> {
        Ok(serde_json::from_str(&std::fs::read_to_string(
            self.snapshot_path(),
        )?)?)
    }

    /// `current` handle of a display in the snapshot file
    pub fn current_handle(&self, display: &str) -> Result<Option<String>> {
        let snapshot = self.read_snapshot()?;
        Ok(snapshot["displays"]
            .as_array()
            .and_then(|displays| displays.iter().find(|d| d["id"] == display))
            .and_then(|d| d["current"].as_str())
            .map(str::to_string))
    }
}

pub fn mode(width: u32, height: u32, refresh: f64, handle: &str) -> Value {
    scaled_mode(width, height, width, height, refresh, handle)
}

pub fn scaled_mode(
    width: u32,
    height: u32,
    pixel_width: u32,
    pixel_height: u32,
    refresh: f64,
    handle: &str,
) -> Value {
    json!({
        "width": width,
        "height": height,
        "pixel_width": pixel_width,
        "pixel_height": pixel_height,
        "encoding": ENCODING_32,
        "refresh": refresh,
        "handle": handle,
    })
}

/// A 16:9 main monitor and a 16:10 side monitor
pub fn desk_snapshot() -> Value {
    json!({
        "main": "DP-1",
        "displays": [
            {
                "id": "DP-1",
                "label": "Dell U2719D",
                "current": "dp-1080-60",
                "modes": [
                    mode(1920, 1080, 50.0, "dp-1080-50"),
                    mode(2560, 1440, 60.0, "dp-1440-60"),
                    mode(1920, 1080, 60.0, "dp-1080-60"),
                    mode(1280, 720, 60.0, "dp-720-60"),
                    mode(1024, 768, 60.0, "dp-768-60"),
                ]
            },
            {
                "id": "HDMI-A-1",
                "label": "",
                "current": "hdmi-1200-60",
                "modes": [
                    mode(1680, 1050, 60.0, "hdmi-1050-60"),
                    mode(1920, 1200, 60.0, "hdmi-1200-60"),
                    mode(1280, 1024, 60.0, "hdmi-1024-60"),
                ]
            }
        ]
    })
}
