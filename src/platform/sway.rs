//! Sway-specific display service
//!
//! Uses swaymsg to query and configure display outputs.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command as TokioCommand;

use super::{ConfigurationPlan, DisplayId, DisplayService, OnlineDisplay};
use crate::display::ModeDescriptor;
use crate::ui::prelude::*;

/// One output as reported by `swaymsg -t get_outputs`
#[derive(Debug, Clone)]
struct SwayOutput {
    name: String,
    make: String,
    model: String,
    focused: bool,
    current_mode: Option<ModeDescriptor>,
    modes: Vec<ModeDescriptor>,
}

impl SwayOutput {
    fn label(&self) -> String {
        if !self.model.is_empty() && self.model != "Unknown" {
            format!("{} {}", self.make, self.model).trim().to_string()
        } else if !self.make.is_empty() && self.make != "Unknown" {
            self.make.clone()
        } else {
            String::new()
        }
    }
}

/// Sway display service for querying and setting display modes
pub struct SwayDisplayService {
    swaymsg: PathBuf,
}

impl SwayDisplayService {
    pub fn new() -> Result<Self> {
        let swaymsg = which::which("swaymsg").context("swaymsg not found in PATH")?;
        Ok(Self { swaymsg })
    }

    async fn swaymsg(&self, args: &[&str]) -> Result<String> {
        let output = TokioCommand::new(&self.swaymsg)
            .args(args)
            .output()
            .await
            .context("Failed to execute swaymsg")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("swaymsg failed: {}", stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn get_outputs(&self) -> Result<Vec<SwayOutput>> {
        let stdout = self.swaymsg(&["-t", "get_outputs"]).await?;
        parse_outputs(&stdout)
    }

    async fn find_output(&self, display: &DisplayId) -> Result<SwayOutput> {
        self.get_outputs()
            .await?
            .into_iter()
            .find(|o| o.name == display.as_str())
            .ok_or_else(|| anyhow::anyhow!("Display {} is not connected", display))
    }

    async fn set_output_mode(&self, display: &DisplayId, handle: &str) -> Result<()> {
        let command = format!("output {} mode {}", display, handle);
        self.swaymsg(&[command.as_str()])
            .await
            .with_context(|| format!("Failed to set mode {} for {}", handle, display))?;
        Ok(())
    }
}

#[async_trait]
impl DisplayService for SwayDisplayService {
    fn name(&self) -> &'static str {
        "sway"
    }

    async fn online_displays(&self) -> Result<Vec<OnlineDisplay>> {
        let outputs = self.get_outputs().await?;
        let any_focused = outputs.iter().any(|o| o.focused);

        Ok(outputs
            .iter()
            .enumerate()
            .map(|(index, output)| OnlineDisplay {
                id: DisplayId::new(output.name.clone()),
                label: output.label(),
                is_main: output.focused || (!any_focused && index == 0),
            })
            .collect())
    }

    async fn mode_descriptors(
        &self,
        display: &DisplayId,
        _show_low_resolution_duplicates: bool,
    ) -> Result<Vec<ModeDescriptor>> {
        Ok(self.find_output(display).await?.modes)
    }

    async fn current_mode(&self, display: &DisplayId) -> Result<ModeDescriptor> {
        self.find_output(display)
            .await?
            .current_mode
            .ok_or_else(|| anyhow::anyhow!("Display {} has no active mode", display))
    }

    /// Sway has no configuration transaction, so outputs are switched one by
    /// one and already switched outputs are restored if a later one fails.
    async fn commit(&self, plan: &ConfigurationPlan) -> Result<()> {
        let mut previous = Vec::with_capacity(plan.changes().len());
        for (display, _) in plan.changes() {
            previous.push(self.current_mode(display).await?.handle);
        }

        for (index, (display, mode)) in plan.changes().iter().enumerate() {
            if let Err(err) = self.set_output_mode(display, mode.handle.as_str()).await {
                for ((applied, _), prior) in plan.changes()[..index].iter().zip(&previous) {
                    if let Err(restore_err) = self.set_output_mode(applied, prior).await {
                        emit(
                            Level::Warn,
                            "platform.sway.rollback_failed",
                            &format!("Failed to restore {} to {}: {}", applied, prior, restore_err),
                            None,
                        );
                    }
                }
                return Err(err);
            }
        }

        Ok(())
    }
}

/// Format for swaymsg command (e.g., "1920x1080@60.008Hz")
fn mode_handle(width: u32, height: u32, refresh_mhz: u64) -> String {
    format!("{}x{}@{:.3}Hz", width, height, refresh_mhz as f64 / 1000.0)
}

/// Parse swaymsg -t get_outputs JSON
fn parse_outputs(json_str: &str) -> Result<Vec<SwayOutput>> {
    let outputs: Vec<serde_json::Value> =
        serde_json::from_str(json_str).context("Failed to parse swaymsg output JSON")?;

    outputs
        .into_iter()
        .filter(|output| output.get("active").and_then(|v| v.as_bool()).unwrap_or(true))
        .map(parse_output)
        .collect::<Result<Vec<_>>>()
}

fn parse_output(output: serde_json::Value) -> Result<SwayOutput> {
    let name = output
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("Missing output name"))?
        .to_string();

    let text = |key: &str| {
        output
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown")
            .to_string()
    };
    let make = text("make");
    let model = text("model");
    let focused = output
        .get("focused")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let current_mode = match output.get("current_mode") {
        Some(mode) => Some(parse_mode(mode).context("Invalid current_mode")?),
        None => None,
    };

    let modes = output
        .get("modes")
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow::anyhow!("Missing modes array for {}", name))?
        .iter()
        .map(|mode| parse_mode(mode).with_context(|| format!("Invalid mode for {}", name)))
        .collect::<Result<Vec<_>>>()?;

    Ok(SwayOutput {
        name,
        make,
        model,
        focused,
        current_mode,
        modes,
    })
}

/// Sway reports physical modes only, always in 32-bit XRGB.
fn parse_mode(mode_json: &serde_json::Value) -> Result<ModeDescriptor> {
    let field = |key: &str| {
        mode_json
            .get(key)
            .and_then(|v| v.as_u64())
            .ok_or_else(|| anyhow::anyhow!("Missing {}", key))
    };
    let width = u32::try_from(field("width")?).context("Mode width out of range")?;
    let height = u32::try_from(field("height")?).context("Mode height out of range")?;
    let refresh = field("refresh")?;

    Ok(ModeDescriptor::unscaled(
        width,
        height,
        refresh as f64 / 1000.0,
        mode_handle(width, height, refresh),
    ))
}
