//! User targets for mode searches

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::error::QueryError;
use super::mode::{AspectRatio, DisplayMode, HidpiScale, RefreshRate};

/// Which modes a search may consider with respect to HiDPI scaling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum HidpiPolicy {
    /// Scaled and unscaled modes
    #[default]
    Any,
    /// Only modes without HiDPI scaling
    ExcludeScaled,
    /// Only HiDPI scaled modes
    OnlyScaled,
}

impl HidpiPolicy {
    /// Combine the `--no-hidpi` / `--only-hidpi` switches, falling back to `default`
    pub fn from_flags(
        no_hidpi: bool,
        only_hidpi: bool,
        default: HidpiPolicy,
    ) -> Result<Self, QueryError> {
        match (no_hidpi, only_hidpi) {
            (true, true) => Err(QueryError::ConflictingHidpiFlags),
            (true, false) => Ok(HidpiPolicy::ExcludeScaled),
            (false, true) => Ok(HidpiPolicy::OnlyScaled),
            (false, false) => Ok(default),
        }
    }

    pub fn admits(self, mode: &DisplayMode) -> bool {
        match self {
            HidpiPolicy::Any => true,
            HidpiPolicy::ExcludeScaled => !mode.is_scaled(),
            HidpiPolicy::OnlyScaled => mode.is_scaled(),
        }
    }

    /// Whether the platform should be asked for duplicate low-resolution variants
    pub fn wants_low_resolution_duplicates(self) -> bool {
        !matches!(self, HidpiPolicy::ExcludeScaled)
    }

    pub fn hint(self) -> &'static str {
        match self {
            HidpiPolicy::Any => "",
            _ => "Try removing HiDPI flags to find a mode.",
        }
    }
}

/// Desired target for closest/exact searches. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    width: u32,
    height: u32,
    depth: u32,
    refresh: RefreshRate,
    ratio: AspectRatio,
    hidpi_scale: Option<HidpiScale>,
    policy: HidpiPolicy,
}

impl Query {
    pub fn new(
        width: u32,
        height: u32,
        depth: u32,
        refresh_hz: f64,
        policy: HidpiPolicy,
    ) -> Result<Self, QueryError> {
        let ratio = AspectRatio::new(width, height)
            .filter(|_| width != 0)
            .ok_or(QueryError::ZeroDimension { width, height })?;
        let refresh =
            RefreshRate::from_hz(refresh_hz).ok_or(QueryError::InvalidRefreshRate(refresh_hz))?;
        Ok(Self {
            width,
            height,
            depth,
            refresh,
            ratio,
            hidpi_scale: None,
            policy,
        })
    }

    /// A query carrying every comparable field of `mode`, scale included
    #[cfg(test)]
    pub(crate) fn for_mode(mode: &DisplayMode, policy: HidpiPolicy) -> Self {
        Self {
            width: mode.width,
            height: mode.height,
            depth: mode.bit_depth.bits(),
            refresh: mode.refresh,
            ratio: mode.ratio(),
            hidpi_scale: mode.hidpi_scale,
            policy,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn refresh(&self) -> RefreshRate {
        self.refresh
    }

    pub fn policy(&self) -> HidpiPolicy {
        self.policy
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn ratio(&self) -> AspectRatio {
        self.ratio
    }

    /// Exact-tier equality against the synthetic mode this query describes
    pub fn is_exactly(&self, mode: &DisplayMode) -> bool {
        mode.width == self.width
            && mode.height == self.height
            && mode.bit_depth.bits() == self.depth
            && mode.refresh == self.refresh
            && mode.hidpi_scale == self.hidpi_scale
    }

    /// Same width, height, depth and refresh; the scale is left to the policy
    pub fn same_setting(&self, mode: &DisplayMode) -> bool {
        mode.width == self.width
            && mode.height == self.height
            && mode.bit_depth.bits() == self.depth
            && mode.refresh == self.refresh
    }

    pub fn describe(&self) -> String {
        let refresh = if self.refresh == RefreshRate::VARIABLE {
            "any refresh rate".to_string()
        } else {
            format!("{} Hz", self.refresh)
        };
        format!(
            "{}x{} ({}); {} bpp; {}",
            self.width,
            self.height,
            self.ratio(),
            self.depth,
            refresh
        )
    }
}
