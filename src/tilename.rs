//! Extracts `(horiz, vert)` tile indices from a raw-binary filename.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::constants::{MAX_HORIZ, MAX_VERT};
use crate::error::MosaicError;

fn pattern() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"[hH](\d{2})[vV](\d{2})").expect("static tile pattern is valid"))
}

/// Parses the first `h<HH>v<VV>` fragment found anywhere in `path`'s file
/// name, per the MODIS raw-binary naming convention.
pub fn parse_tile_indices(path: &Path) -> Result<(u32, u32), MosaicError> {
  let name = path
    .file_name()
    .and_then(|n| n.to_str())
    .ok_or_else(|| MosaicError::TileParse { path: path.to_path_buf() })?;

  let caps = pattern().captures(name).ok_or_else(|| MosaicError::TileParse { path: path.to_path_buf() })?;
  let h: u32 = caps[1].parse().map_err(|_| MosaicError::TileParse { path: path.to_path_buf() })?;
  let v: u32 = caps[2].parse().map_err(|_| MosaicError::TileParse { path: path.to_path_buf() })?;
  if h > MAX_HORIZ || v > MAX_VERT {
    return Err(MosaicError::TileParse { path: path.to_path_buf() });
  }
  Ok((h, v))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::PathBuf;

  #[test]
  fn parses_tile_indices_from_typical_filename() {
    let p = PathBuf::from("MOD09.A2020001.h10v05.hdf");
    assert_eq!(parse_tile_indices(&p).unwrap(), (10, 5));
  }

  #[test]
  fn rejects_filename_without_tile_fragment() {
    let p = PathBuf::from("no_tile_here.dat");
    assert!(parse_tile_indices(&p).is_err());
  }

  #[test]
  fn rejects_out_of_range_indices() {
    let p = PathBuf::from("h99v99.dat");
    assert!(parse_tile_indices(&p).is_err());
  }
}
