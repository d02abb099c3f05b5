//! Core library for stitching MODIS Sinusoidal/Integerized Sinusoidal tiles
//! (HDF-EOS or raw binary) into a single mosaicked raster product.
//!
//! This crate implements the geometry assembly, compatibility checking, and
//! streaming execution; reprojection math and the real HDF-EOS binary
//! format are external collaborators (see [`io::hdfeos`] for the
//! self-contained stand-in used here).

pub mod band;
pub mod compat;
pub mod constants;
pub mod descriptor;
pub mod error;
pub mod executor;
pub mod filelist;
pub mod hdr;
pub mod io;
pub mod metadata;
pub mod planner;
pub mod size;
pub mod tilename;
pub mod types;

pub use error::{MosaicError, MosaicResult};
