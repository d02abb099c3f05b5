//! Verifies that a set of tiles can legally be mosaicked together.

use crate::constants::PIXEL_SIZE_EPSILON;
use crate::descriptor::TileDescriptor;
use crate::error::{MismatchField, MosaicError};

/// Compares every tile at index `i > 0` against tile 0, in the same field
/// order the original `CompareProducts` uses, returning the first mismatch.
pub fn check_compatibility(tiles: &[TileDescriptor]) -> Result<(), MosaicError> {
  if tiles.is_empty() {
    return Err(MosaicError::general("no input tiles to check"));
  }
  let base = &tiles[0];

  for other in &tiles[1..] {
    if other.file_type != base.file_type {
      return mismatch(MismatchField::FileType, None, base, other);
    }
    if other.bands.len() != base.bands.len() {
      return mismatch(MismatchField::BandCount, None, base, other);
    }
    for (band_idx, (b0, bi)) in base.bands.iter().zip(other.bands.iter()).enumerate() {
      if b0.nlines != bi.nlines || b0.nsamples != bi.nsamples {
        return mismatch(MismatchField::Dims, Some(band_idx), base, other);
      }
      if b0.input_datatype != bi.input_datatype {
        return mismatch(MismatchField::Datatype, Some(band_idx), base, other);
      }
      if (b0.pixel_size - bi.pixel_size).abs() > PIXEL_SIZE_EPSILON {
        return mismatch(MismatchField::PixelSize, Some(band_idx), base, other);
      }
      if b0.rank != bi.rank {
        return mismatch(MismatchField::Rank, Some(band_idx), base, other);
      }
    }
    if !base.projection.is_modis_grid() || !other.projection.is_modis_grid() {
      return mismatch(MismatchField::Projection, None, base, other);
    }
    if other.projection != base.projection {
      return mismatch(MismatchField::Projection, None, base, other);
    }
    if other.projection_params != base.projection_params {
      return mismatch(MismatchField::ProjectionParams, None, base, other);
    }
    if other.datum != base.datum {
      return mismatch(MismatchField::Datum, None, base, other);
    }
  }
  Ok(())
}

fn mismatch(
  field: MismatchField,
  band: Option<usize>,
  base: &TileDescriptor,
  other: &TileDescriptor,
) -> Result<(), MosaicError> {
  Err(MosaicError::Mismatch {
    field,
    band,
    left: base.path.clone(),
    right: other.path.clone(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::band::BandInfo;
  use crate::types::{DataType, DatumCode, FileType, GeoBoundingBox, ProjectionCode};
  use std::path::PathBuf;

  fn band(pixel_size: f64) -> BandInfo {
    BandInfo {
      name: "b".into(),
      grid_name: "g".into(),
      nlines: 10,
      nsamples: 10,
      input_datatype: DataType::Uint8,
      output_datatype: DataType::Uint8,
      pixel_size,
      rank: 2,
      pos: [0; 4],
      fieldnum: 0,
      min: None,
      max: None,
      background_fill: 0.0,
      scale: 1.0,
      offset: 0.0,
      selected: true,
    }
  }

  fn tile(path: &str, pixel_size: f64) -> TileDescriptor {
    TileDescriptor {
      path: PathBuf::from(path),
      file_type: FileType::RawBinary,
      horiz: 10,
      vert: 5,
      bands: vec![band(pixel_size)],
      projection: ProjectionCode::Sinusoidal,
      datum: DatumCode::NoDatum,
      zone: -1,
      projection_params: [0.0; 15],
      proj_corners: [(0.0, 0.0); 4],
      geo_corners: [(0.0, 0.0); 4],
      bounding_box: GeoBoundingBox::default(),
    }
  }

  #[test]
  fn identical_tiles_are_compatible() {
    let tiles = vec![tile("a", 1000.0), tile("b", 1000.0)];
    assert!(check_compatibility(&tiles).is_ok());
  }

  #[test]
  fn pixel_size_mismatch_names_band_and_both_paths() {
    let tiles = vec![tile("a", 1000.0), tile("b", 1000.01)];
    let err = check_compatibility(&tiles).unwrap_err();
    match err {
      MosaicError::Mismatch { field, band, left, right } => {
        assert_eq!(field, MismatchField::PixelSize);
        assert_eq!(band, Some(0));
        assert_eq!(left, PathBuf::from("a"));
        assert_eq!(right, PathBuf::from("b"));
      }
      _ => panic!("expected Mismatch"),
    }
  }

  #[test]
  fn non_modis_projection_is_rejected() {
    let mut t = tile("a", 1000.0);
    t.projection = ProjectionCode::Utm;
    let tiles = vec![t, tile("b", 1000.0)];
    let err = check_compatibility(&tiles).unwrap_err();
    assert!(matches!(
      err,
      MosaicError::Mismatch { field: MismatchField::Projection, .. }
    ));
  }
}
