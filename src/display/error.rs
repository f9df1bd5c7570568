use thiserror::Error;

/// Failures that abort building a catalog. No partial catalog is produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("Unknown pixel encoding: {encoding}")]
    UnknownEncoding { encoding: String },

    #[error(
        "Vertical and horizontal dimensions aren't scaled equally: \
         {width}x{height} logical, {pixel_width}x{pixel_height} physical"
    )]
    ScalingInconsistency {
        width: u32,
        height: u32,
        pixel_width: u32,
        pixel_height: u32,
    },

    #[error(
        "Invalid mode geometry: {width}x{height} logical, {pixel_width}x{pixel_height} physical"
    )]
    InvalidGeometry {
        width: u32,
        height: u32,
        pixel_width: u32,
        pixel_height: u32,
    },

    #[error("Invalid refresh rate {0} Hz reported for mode {1}")]
    InvalidRefreshRate(f64, String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Width and height must both be greater than zero (got {width}x{height})")]
    ZeroDimension { width: u32, height: u32 },

    #[error("Must have both width and height for {0} matching")]
    MissingDimensions(&'static str),

    #[error("Cannot require both no HiDPI and only HiDPI")]
    ConflictingHidpiFlags,

    #[error("Invalid refresh rate: {0}")]
    InvalidRefreshRate(f64),
}
