//! The error taxonomy shared by every component of the engine.

use std::path::PathBuf;

use thiserror::Error;

/// A field found to disagree between two otherwise-comparable tiles.
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum MismatchField {
  #[error("file type")]
  FileType,
  #[error("band count")]
  BandCount,
  #[error("dimensions")]
  Dims,
  #[error("data type")]
  Datatype,
  #[error("pixel size")]
  PixelSize,
  #[error("rank")]
  Rank,
  #[error("projection parameters")]
  ProjectionParams,
  #[error("datum")]
  Datum,
  #[error("projection")]
  Projection,
}

/// Every way a mosaic run can fail, surfaced to `main` as a single exit path.
#[derive(Error, Debug)]
pub enum MosaicError {
  #[error("usage: mrtmosaic -i <filelist> [-o <output>] [-s <bandstr>] [-t] [-h] [-g <log>]")]
  Usage,

  #[error("unable to open '{path}' for reading")]
  OpenRead { path: PathBuf },

  #[error("unable to open '{path}' for writing")]
  OpenWrite { path: PathBuf },

  #[error("read failed on '{path}'")]
  Read { path: PathBuf },

  #[error("write failed on '{path}'")]
  Write { path: PathBuf },

  #[error("syntax error: {reason}")]
  Syntax { reason: String },

  #[error("memory allocation failed: {reason}")]
  Memory { reason: String },

  #[error(
    "{field} mismatch between '{left}' and '{right}'{}",
    band.map(|b| format!(" (band {b})")).unwrap_or_default()
  )]
  Mismatch {
    field: MismatchField,
    band: Option<usize>,
    left: PathBuf,
    right: PathBuf,
  },

  #[error("geometry error: {reason}")]
  Geometry { reason: String },

  #[error("estimated output size {bytes} bytes exceeds the {limit} byte HDF v4 limit")]
  SizeExceeded { bytes: u64, limit: u64 },

  #[error("could not determine (h, v) tile indices for '{path}'")]
  TileParse { path: PathBuf },

  #[error("{reason}")]
  General { reason: String },
}

impl MosaicError {
  pub fn syntax<S: Into<String>>(reason: S) -> Self {
    MosaicError::Syntax { reason: reason.into() }
  }

  pub fn general<S: Into<String>>(reason: S) -> Self {
    MosaicError::General { reason: reason.into() }
  }
}

pub type MosaicResult<T> = Result<T, MosaicError>;
