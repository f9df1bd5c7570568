//! Catalog builder
//!
//! Turns the raw mode list a platform reports for one display into a
//! deduplicated, canonically ordered [`Catalog`].

use serde::{Deserialize, Serialize};

use super::error::CatalogError;
use super::mode::{BitDepth, DisplayMode, HidpiScale, ModeHandle, RefreshRate};
use super::query::HidpiPolicy;

fn default_usable() -> bool {
    true
}

/// Mode as reported by the platform enumeration layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeDescriptor {
    pub width: u32,
    pub height: u32,
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// Pixel encoding tag (e.g. "--------RRRRRRRRGGGGGGGGBBBBBBBB")
    pub encoding: String,
    /// Refresh rate in Hz, 0 for variable
    pub refresh: f64,
    pub handle: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_usable")]
    pub usable: bool,
    #[serde(default)]
    pub low_resolution_duplicate: bool,
}

impl ModeDescriptor {
    /// Descriptor for an unscaled 32-bit mode
    pub fn unscaled(width: u32, height: u32, refresh: f64, handle: impl Into<String>) -> Self {
        Self {
            width,
            height,
            pixel_width: width,
            pixel_height: height,
            encoding: BitDepth::ENCODING_32.to_string(),
            refresh,
            handle: handle.into(),
            is_default: false,
            usable: true,
            low_resolution_duplicate: false,
        }
    }
}

impl TryFrom<&ModeDescriptor> for DisplayMode {
    type Error = CatalogError;

    fn try_from(raw: &ModeDescriptor) -> Result<Self, Self::Error> {
        let bit_depth = BitDepth::from_encoding(&raw.encoding)?;
        let hidpi_scale =
            HidpiScale::from_dimensions(raw.width, raw.height, raw.pixel_width, raw.pixel_height)?;
        let refresh = RefreshRate::from_hz(raw.refresh)
            .ok_or_else(|| CatalogError::InvalidRefreshRate(raw.refresh, raw.handle.clone()))?;

        Ok(DisplayMode {
            width: raw.width,
            height: raw.height,
            pixel_width: raw.pixel_width,
            pixel_height: raw.pixel_height,
            bit_depth,
            refresh,
            hidpi_scale,
            handle: ModeHandle::new(raw.handle.clone()),
        })
    }
}

/// Canonically ordered modes of a single display, snapshot at query time
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    modes: Vec<DisplayMode>,
}

impl Catalog {
    pub fn modes(&self) -> &[DisplayMode] {
        &self.modes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DisplayMode> {
        self.modes.iter()
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a DisplayMode;
    type IntoIter = std::slice::Iter<'a, DisplayMode>;

    fn into_iter(self) -> Self::IntoIter {
        self.modes.iter()
    }
}

/// Build the catalog of one display.
///
/// Every descriptor is converted before anything is filtered, so a single bad
/// encoding or scale fails the whole build.
pub fn build_catalog(
    descriptors: &[ModeDescriptor],
    policy: HidpiPolicy,
) -> Result<Catalog, CatalogError> {
    let converted = descriptors
        .iter()
        .map(|raw| DisplayMode::try_from(raw).map(|mode| (mode, raw)))
        .collect::<Result<Vec<_>, _>>()?;

    let show_duplicates = policy.wants_low_resolution_duplicates();
    let mut kept: Vec<(DisplayMode, bool)> = Vec::with_capacity(converted.len());

    for (mode, raw) in converted {
        if !raw.usable || (raw.low_resolution_duplicate && !show_duplicates) {
            continue;
        }
        if !policy.admits(&mode) {
            continue;
        }

        match kept.iter_mut().find(|(existing, _)| *existing == mode) {
            Some(slot) => {
                if raw.is_default && !slot.1 {
                    *slot = (mode, true);
                }
            }
            None => kept.push((mode, raw.is_default)),
        }
    }

    let mut modes: Vec<DisplayMode> = kept.into_iter().map(|(mode, _)| mode).collect();
    modes.sort_by(DisplayMode::canonical_cmp);

    Ok(Catalog { modes })
}

#[cfg(test)]
pub(crate) fn catalog_of(modes: Vec<DisplayMode>) -> Catalog {
    let mut modes = modes;
    modes.sort_by(DisplayMode::canonical_cmp);
    Catalog { modes }
}
