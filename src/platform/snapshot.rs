//! Snapshot display service
//!
//! Reads displays and modes from a JSON file instead of live hardware. Useful
//! for machines without a supported compositor, for scripting, and for tests.
//! Applying a mode rewrites the file's `current` handles.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ConfigurationPlan, DisplayId, DisplayService, OnlineDisplay};
use crate::display::ModeDescriptor;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Main display; the first display when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<DisplayId>,
    pub displays: Vec<SnapshotDisplay>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotDisplay {
    pub id: DisplayId,
    #[serde(default)]
    pub label: String,
    /// Handle of the active mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,
    pub modes: Vec<ModeDescriptor>,
}

impl Snapshot {
    fn display(&self, id: &DisplayId) -> Result<&SnapshotDisplay> {
        self.displays
            .iter()
            .find(|d| &d.id == id)
            .ok_or_else(|| anyhow!("Display {} is not in the snapshot", id))
    }

    fn main_id(&self) -> Option<&DisplayId> {
        self.main
            .as_ref()
            .or_else(|| self.displays.first().map(|d| &d.id))
    }
}

pub struct SnapshotService {
    path: PathBuf,
}

impl SnapshotService {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Re-read on every call; the file may change between commands.
    async fn load(&self) -> Result<Snapshot> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading snapshot {}", self.path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing snapshot {}", self.path.display()))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot).context("serializing snapshot")?;
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut file = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("creating temporary file in {}", dir.display()))?;
        file.write_all(json.as_bytes())
            .context("writing snapshot contents")?;
        file.persist(&self.path)
            .with_context(|| format!("replacing snapshot {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl DisplayService for SnapshotService {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    async fn online_displays(&self) -> Result<Vec<OnlineDisplay>> {
        let snapshot = self.load().await?;
        let main = snapshot.main_id().cloned();
        Ok(snapshot
            .displays
            .into_iter()
            .map(|d| OnlineDisplay {
                is_main: Some(&d.id) == main.as_ref(),
                id: d.id,
                label: d.label,
            })
            .collect())
    }

    async fn mode_descriptors(
        &self,
        display: &DisplayId,
        show_low_resolution_duplicates: bool,
    ) -> Result<Vec<ModeDescriptor>> {
        let snapshot = self.load().await?;
        Ok(snapshot
            .display(display)?
            .modes
            .iter()
            .filter(|m| show_low_resolution_duplicates || !m.low_resolution_duplicate)
            .cloned()
            .collect())
    }

    async fn current_mode(&self, display: &DisplayId) -> Result<ModeDescriptor> {
        let snapshot = self.load().await?;
        let entry = snapshot.display(display)?;
        let handle = entry
            .current
            .as_deref()
            .ok_or_else(|| anyhow!("Display {} has no current mode", display))?;
        entry
            .modes
            .iter()
            .find(|m| m.handle == handle)
            .cloned()
            .ok_or_else(|| anyhow!("Current mode {} of display {} is not listed", handle, display))
    }

    /// Every change is validated before the file is touched, then the whole
    /// snapshot is replaced in one rename.
    async fn commit(&self, plan: &ConfigurationPlan) -> Result<()> {
        if plan.is_empty() {
            return Ok(());
        }
        let mut snapshot = self.load().await?;

        for (display, mode) in plan.changes() {
            let entry = snapshot
                .displays
                .iter_mut()
                .find(|d| &d.id == display)
                .ok_or_else(|| anyhow!("Display {} is not in the snapshot", display))?;
            if !entry.modes.iter().any(|m| m.handle == mode.handle.as_str()) {
                bail!(
                    "Display {} does not support mode {}; configuration cancelled",
                    display,
                    mode.handle
                );
            }
            entry.current = Some(mode.handle.as_str().to_string());
        }

        self.save(&snapshot)
    }
}
