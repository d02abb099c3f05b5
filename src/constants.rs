//! Named constants carried over from the original mosaic tool's headers.
//!
//! These are "magic caps" the original hard-codes in a handful of scattered
//! `#define`s; we surface them here as a single, documented table instead.

/// Maximum number of tiles accepted on one mosaic run (36 horizontal x 10
/// vertical rows of margin, rounded the way the original tool's input cap is).
pub const NUM_ISIN_TILES: usize = 360;

/// Maximum length, in bytes, of a single filename token in a file list.
pub const FILENAME_LENGTH: usize = 1024;

/// Maximum length, in bytes, of one line read while parsing a file list or a
/// sidecar header.
pub const HUGE_STRING: usize = 4096;

/// Maximum length of a "small" string field (band names, grid names, ...).
pub const SMALL_STRING: usize = 256;

/// Maximum length of a "large" string field (full paths, descriptions, ...).
pub const LARGE_STRING: usize = 1024;

/// Longitude, in degrees, used to clamp a wrapped-around inverse projection
/// result at the antimeridian.
pub const BOUND_LONG: f64 = 180.0;

/// HDF version 4's hard file-size ceiling: `2^31 - 1` bytes.
pub const HDF_V4_SIZE_LIMIT: u64 = i32::MAX as u64;

/// Margin, in bytes, below [`HDF_V4_SIZE_LIMIT`] at which the size estimator
/// still succeeds but warns.
pub const SIZE_WARNING_MARGIN: u64 = 150 * 1024;

/// Valid horizontal tile index range for the MODIS SIN/ISIN grid, inclusive.
pub const MAX_HORIZ: u32 = 35;

/// Valid vertical tile index range for the MODIS SIN/ISIN grid, inclusive.
pub const MAX_VERT: u32 = 17;

/// Tolerance used when comparing pixel sizes across tiles.
pub const PIXEL_SIZE_EPSILON: f64 = 1e-6;
