//! Platform display services
//!
//! A [`DisplayService`] enumerates online displays and their raw modes, and
//! applies chosen modes. One service is built in `main` and passed down to
//! the commands that need it.

mod snapshot;
mod sway;

use std::env;
use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use clap::ValueEnum;
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::display::{Catalog, DisplayMode, HidpiPolicy, ModeDescriptor, build_catalog};

pub use snapshot::SnapshotService;
pub use sway::SwayDisplayService;

/// Platform identifier of a display (e.g. "eDP-1" or "69732928")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayId(String);

impl DisplayId {
    pub fn new(raw: impl Into<String>) -> Self {
        DisplayId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A currently online display
#[derive(Debug, Clone, Serialize)]
pub struct OnlineDisplay {
    pub id: DisplayId,
    pub label: String,
    pub is_main: bool,
}

impl OnlineDisplay {
    /// Heading used in listings (e.g. "eDP-1 (Main Display)")
    pub fn heading(&self) -> String {
        let mut heading = self.id.to_string();
        if !self.label.is_empty() && self.label != self.id.as_str() {
            heading.push_str(&format!(" [{}]", self.label));
        }
        if self.is_main {
            heading.push_str(" (Main Display)");
        }
        heading
    }
}

/// Mode changes to apply together. Either all of them land or none do.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationPlan {
    changes: Vec<(DisplayId, DisplayMode)>,
}

impl ConfigurationPlan {
    pub fn configure(&mut self, display: DisplayId, mode: DisplayMode) {
        self.changes.push((display, mode));
    }

    pub fn changes(&self) -> &[(DisplayId, DisplayMode)] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

#[async_trait]
pub trait DisplayService: Send + Sync {
    fn name(&self) -> &'static str;

    async fn online_displays(&self) -> Result<Vec<OnlineDisplay>>;

    /// Raw modes of one display. `show_low_resolution_duplicates` asks the
    /// platform to include scaled duplicates of lower resolutions.
    async fn mode_descriptors(
        &self,
        display: &DisplayId,
        show_low_resolution_duplicates: bool,
    ) -> Result<Vec<ModeDescriptor>>;

    async fn current_mode(&self, display: &DisplayId) -> Result<ModeDescriptor>;

    /// Apply every change in `plan` using the modes' original handles
    async fn commit(&self, plan: &ConfigurationPlan) -> Result<()>;
}

/// Which display service to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Auto,
    Sway,
    Snapshot,
}

fn sway_session_detected() -> bool {
    if env::var("SWAYSOCK").is_ok() {
        return true;
    }
    ["XDG_SESSION_DESKTOP", "XDG_CURRENT_DESKTOP", "DESKTOP_SESSION"]
        .iter()
        .filter_map(|var| env::var(var).ok())
        .any(|value| value.to_lowercase() == "sway")
}

/// Build the display service for this run
pub fn connect(backend: Backend, snapshot: Option<PathBuf>) -> Result<Box<dyn DisplayService>> {
    match (backend, snapshot) {
        (_, Some(path)) => Ok(Box::new(SnapshotService::new(path))),
        (Backend::Snapshot, None) => {
            bail!("The snapshot backend needs a file: set snapshot_path or pass --snapshot")
        }
        (Backend::Sway, None) => Ok(Box::new(SwayDisplayService::new()?)),
        (Backend::Auto, None) => {
            if sway_session_detected() && which::which("swaymsg").is_ok() {
                Ok(Box::new(SwayDisplayService::new()?))
            } else {
                bail!("No display backend detected. Run under Sway or pass --snapshot <file>")
            }
        }
    }
}

/// Build a fresh catalog for each display. Catalogs are independent, so they
/// are fetched concurrently.
pub async fn load_catalogs(
    service: &dyn DisplayService,
    displays: &[OnlineDisplay],
    policy: HidpiPolicy,
) -> Result<Vec<(OnlineDisplay, Catalog)>> {
    let show_duplicates = policy.wants_low_resolution_duplicates();
    let jobs = displays.iter().map(|display| async move {
        let descriptors = service
            .mode_descriptors(&display.id, show_duplicates)
            .await
            .with_context(|| format!("Failed to list modes for display {}", display.id))?;
        let catalog = build_catalog(&descriptors, policy)
            .with_context(|| format!("Failed to build mode catalog for display {}", display.id))?;
        Ok::<_, anyhow::Error>((display.clone(), catalog))
    });
    try_join_all(jobs).await
}
