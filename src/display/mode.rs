//! Display mode value types
//!
//! Everything the matcher compares is held as integers or reduced rationals so
//! equality between ratios and scales is exact.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use super::error::CatalogError;

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Colour depth derived from a pixel encoding tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u32")]
pub enum BitDepth {
    Eight,
    Sixteen,
    Thirty,
    ThirtyTwo,
}

impl BitDepth {
    pub const ENCODING_8: &'static str = "PPPPPPPP";
    pub const ENCODING_16: &'static str = "-RRRRRGGGGGBBBBB";
    pub const ENCODING_30: &'static str = "--RRRRRRRRRRGGGGGGGGGGBBBBBBBBBB";
    pub const ENCODING_32: &'static str = "--------RRRRRRRRGGGGGGGGBBBBBBBB";

    /// Map a platform pixel encoding to a depth. Unknown encodings are an error.
    pub fn from_encoding(encoding: &str) -> Result<Self, CatalogError> {
        match encoding {
            Self::ENCODING_8 => Ok(BitDepth::Eight),
            Self::ENCODING_16 => Ok(BitDepth::Sixteen),
            Self::ENCODING_30 => Ok(BitDepth::Thirty),
            Self::ENCODING_32 => Ok(BitDepth::ThirtyTwo),
            other => Err(CatalogError::UnknownEncoding {
                encoding: other.to_string(),
            }),
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
            BitDepth::Thirty => 30,
            BitDepth::ThirtyTwo => 32,
        }
    }
}

impl From<BitDepth> for u32 {
    fn from(depth: BitDepth) -> Self {
        depth.bits()
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// Refresh rate in milliHz (e.g., 59940 = 59.94 Hz). Zero means variable/unspecified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "f64")]
pub struct RefreshRate(u32);

impl RefreshRate {
    pub const VARIABLE: RefreshRate = RefreshRate(0);

    pub fn from_millihertz(millihertz: u32) -> Self {
        RefreshRate(millihertz)
    }

    /// Convert a rate in Hz, rounding to the nearest milliHz
    pub fn from_hz(hz: f64) -> Option<Self> {
        if !hz.is_finite() || hz < 0.0 {
            return None;
        }
        let millihertz = (hz * 1000.0).round();
        if millihertz > u32::MAX as f64 {
            return None;
        }
        Some(Self::from_millihertz(millihertz as u32))
    }

    pub fn millihertz(self) -> u32 {
        self.0
    }

    pub fn hz(self) -> f64 {
        self.0 as f64 / 1000.0
    }
}

impl From<RefreshRate> for f64 {
    fn from(rate: RefreshRate) -> Self {
        rate.hz()
    }
}

impl fmt::Display for RefreshRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 1000;
        let frac = self.0 % 1000;
        if frac == 0 {
            write!(f, "{whole}")
        } else {
            let digits = format!("{frac:03}");
            write!(f, "{whole}.{}", digits.trim_end_matches('0'))
        }
    }
}

/// Width:height as a reduced fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AspectRatio {
    num: u32,
    den: u32,
}

impl AspectRatio {
    /// Returns `None` for a zero height.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if height == 0 {
            return None;
        }
        let divisor = gcd(width as u64, height as u64).max(1) as u32;
        Some(AspectRatio {
            num: width / divisor,
            den: height / divisor,
        })
    }

    pub fn as_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// |self - other| as an exact fraction
    pub fn distance(self, other: AspectRatio) -> RatioDistance {
        let lhs = self.num as u64 * other.den as u64;
        let rhs = other.num as u64 * self.den as u64;
        RatioDistance {
            num: lhs.abs_diff(rhs),
            den: self.den as u64 * other.den as u64,
        }
    }
}

impl Ord for AspectRatio {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.num as u64 * other.den as u64;
        let rhs = other.num as u64 * self.den as u64;
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for AspectRatio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}:1", self.as_f64())
    }
}

/// Non-negative fraction produced by [`AspectRatio::distance`]
#[derive(Debug, Clone, Copy)]
pub struct RatioDistance {
    num: u64,
    den: u64,
}

impl Ord for RatioDistance {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.num as u128 * other.den as u128;
        let rhs = other.num as u128 * self.den as u128;
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for RatioDistance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RatioDistance {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RatioDistance {}

/// Physical-to-logical pixel factor of a scaled (HiDPI) mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "f64")]
pub struct HidpiScale {
    num: u32,
    den: u32,
}

impl HidpiScale {
    /// Derive the scale of a mode from its logical and physical sizes.
    ///
    /// Returns `Ok(None)` for an unscaled mode and fails when the two axes
    /// are scaled by different factors.
    pub fn from_dimensions(
        width: u32,
        height: u32,
        pixel_width: u32,
        pixel_height: u32,
    ) -> Result<Option<Self>, CatalogError> {
        if width == 0 || height == 0 || pixel_width < width || pixel_height < height {
            return Err(CatalogError::InvalidGeometry {
                width,
                height,
                pixel_width,
                pixel_height,
            });
        }
        if pixel_width == width && pixel_height == height {
            return Ok(None);
        }
        if pixel_width as u64 * height as u64 != pixel_height as u64 * width as u64 {
            return Err(CatalogError::ScalingInconsistency {
                width,
                height,
                pixel_width,
                pixel_height,
            });
        }
        let divisor = gcd(pixel_width as u64, width as u64) as u32;
        Ok(Some(HidpiScale {
            num: pixel_width / divisor,
            den: width / divisor,
        }))
    }

    pub fn as_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl From<HidpiScale> for f64 {
    fn from(scale: HidpiScale) -> Self {
        scale.as_f64()
    }
}

impl fmt::Display for HidpiScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "x{}", self.num)
        } else {
            write!(f, "x{}", self.as_f64())
        }
    }
}

/// Opaque reference to the platform's own mode object. Never compared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ModeHandle(String);

impl ModeHandle {
    pub fn new(raw: impl Into<String>) -> Self {
        ModeHandle(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One supported configuration of one display
///
/// Equality covers width, height, depth, refresh rate and HiDPI scale. The
/// platform handle is carried along untouched and ignored by comparisons.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayMode {
    pub width: u32,
    pub height: u32,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub bit_depth: BitDepth,
    pub refresh: RefreshRate,
    pub hidpi_scale: Option<HidpiScale>,
    pub handle: ModeHandle,
}

impl DisplayMode {
    /// Total logical pixels
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn ratio(&self) -> AspectRatio {
        // Construction guarantees a non-zero height.
        AspectRatio::new(self.width, self.height).unwrap_or(AspectRatio { num: 1, den: 1 })
    }

    pub fn is_scaled(&self) -> bool {
        self.hidpi_scale.is_some()
    }

    /// Canonical catalog order: pixel count, then depth, then refresh, all descending
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        other
            .pixel_count()
            .cmp(&self.pixel_count())
            .then(other.bit_depth.cmp(&self.bit_depth))
            .then(other.refresh.cmp(&self.refresh))
    }

    /// Short label (e.g., "1920x1080 @ 60Hz")
    pub fn short_label(&self) -> String {
        format!("{}x{} @ {}Hz", self.width, self.height, self.refresh)
    }
}

impl PartialEq for DisplayMode {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.bit_depth == other.bit_depth
            && self.refresh == other.refresh
            && self.hidpi_scale == other.hidpi_scale
    }
}

impl Eq for DisplayMode {}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}; pixel depth: {}; refresh rate: {}; ratio: {}",
            self.width,
            self.height,
            self.bit_depth,
            self.refresh,
            self.ratio()
        )?;
        if let Some(scale) = self.hidpi_scale {
            write!(f, "; [HiDPI: {scale}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_mode(width: u32, height: u32, depth: BitDepth, refresh_hz: u32) -> DisplayMode {
    DisplayMode {
        width,
        height,
        pixel_width: width,
        pixel_height: height,
        bit_depth: depth,
        refresh: RefreshRate::from_millihertz(refresh_hz * 1000),
        hidpi_scale: None,
        handle: ModeHandle::new(format!("{width}x{height}-{}-{refresh_hz}", depth.bits())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_encoding_is_rejected() {
        let err = BitDepth::from_encoding("RRRRGGGGBBBB").unwrap_err();
        assert!(matches!(err, CatalogError::UnknownEncoding { .. }));
        assert_eq!(
            BitDepth::from_encoding(BitDepth::ENCODING_30).unwrap(),
            BitDepth::Thirty
        );
    }

    #[test]
    fn refresh_rate_rounds_to_millihertz() {
        let rate = RefreshRate::from_hz(59.94).unwrap();
        assert_eq!(rate.millihertz(), 59940);
        assert_eq!(rate.to_string(), "59.94");
        assert_eq!(RefreshRate::from_hz(60.0).unwrap().to_string(), "60");
        assert!(RefreshRate::from_hz(-1.0).is_none());
        assert!(RefreshRate::from_hz(f64::NAN).is_none());
    }

    #[test]
    fn aspect_ratio_is_reduced_and_exact() {
        let a = AspectRatio::new(1920, 1080).unwrap();
        let b = AspectRatio::new(1280, 720).unwrap();
        assert_eq!(a, b);
        assert!(AspectRatio::new(1920, 1200).unwrap() < a);
        assert!(AspectRatio::new(10, 0).is_none());
    }

    #[test]
    fn ratio_distance_compares_fractions() {
        let target = AspectRatio::new(16, 10).unwrap();
        let wide = AspectRatio::new(16, 9).unwrap();
        let square = AspectRatio::new(4, 3).unwrap();
        // 16/9 - 16/10 = 0.177.., 16/10 - 4/3 = 0.266..
        assert!(wide.distance(target) < square.distance(target));
        assert_eq!(wide.distance(wide), square.distance(square));
    }

    #[test]
    fn hidpi_scale_detection() {
        assert_eq!(HidpiScale::from_dimensions(1920, 1080, 1920, 1080).unwrap(), None);

        let scale = HidpiScale::from_dimensions(1440, 900, 2880, 1800)
            .unwrap()
            .unwrap();
        assert_eq!(scale.as_f64(), 2.0);
        assert_eq!(scale.to_string(), "x2");

        let err = HidpiScale::from_dimensions(1440, 900, 2880, 1700).unwrap_err();
        assert!(matches!(err, CatalogError::ScalingInconsistency { .. }));

        let err = HidpiScale::from_dimensions(1440, 900, 1000, 900).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidGeometry { .. }));
    }

    #[test]
    fn equality_ignores_handle() {
        let a = test_mode(1920, 1080, BitDepth::ThirtyTwo, 60);
        let mut b = a.clone();
        b.handle = ModeHandle::new("other");
        assert_eq!(a, b);

        b.refresh = RefreshRate::from_millihertz(59940);
        assert_ne!(a, b);
    }

    #[test]
    fn canonical_order_prefers_pixels_then_depth_then_refresh() {
        let mut modes = vec![
            test_mode(1280, 720, BitDepth::ThirtyTwo, 60),
            test_mode(1920, 1080, BitDepth::Sixteen, 75),
            test_mode(1920, 1080, BitDepth::ThirtyTwo, 50),
            test_mode(1920, 1080, BitDepth::ThirtyTwo, 60),
        ];
        modes.sort_by(DisplayMode::canonical_cmp);
        let labels: Vec<_> = modes
            .iter()
            .map(|m| format!("{}:{}", m.short_label(), m.bit_depth))
            .collect();
        assert_eq!(
            labels,
            vec![
                "1920x1080 @ 60Hz:32",
                "1920x1080 @ 50Hz:32",
                "1920x1080 @ 75Hz:16",
                "1280x720 @ 60Hz:32",
            ]
        );
    }
}
