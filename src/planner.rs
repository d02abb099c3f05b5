//! Computes the tile grid and output descriptor for a compatible set of
//! tiles.

use std::path::PathBuf;

use crate::constants::{BOUND_LONG, MAX_HORIZ, MAX_VERT};
use crate::descriptor::{MosaicDescriptor, TileDescriptor, TileGrid};
use crate::error::MosaicError;
use crate::types::{Corner, ProjectionCode};

/// Why an inverse projection call could not produce a geographic position.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ProjectionFailure {
  RangeError,
  InterruptionBreak,
}

/// The external projection library's inverse transform, injected so the
/// planner's fallback logic can be exercised without linking a real
/// projector. `params` is the tile's 15 GCTP projection parameters.
///
/// On failure the projector still reports the latitude and (wrapped)
/// longitude it computed before hitting the error, the way GCTP writes its
/// out-parameters before returning an error code: the caller needs that
/// partial result to apply the antimeridian clamp correctly.
pub trait InverseProjector {
  fn inverse(
    &self,
    projection: ProjectionCode,
    params: &[f64; 15],
    x: f64,
    y: f64,
  ) -> Result<(f64, f64), (ProjectionFailure, f64, f64)>;
}

impl<F> InverseProjector for F
where
  F: Fn(ProjectionCode, &[f64; 15], f64, f64) -> Result<(f64, f64), (ProjectionFailure, f64, f64)>,
{
  fn inverse(
    &self,
    projection: ProjectionCode,
    params: &[f64; 15],
    x: f64,
    y: f64,
  ) -> Result<(f64, f64), (ProjectionFailure, f64, f64)> {
    self(projection, params, x, y)
  }
}

/// The grid and descriptor produced by [`plan_mosaic`].
pub struct MosaicPlan {
  pub grid: TileGrid,
  pub descriptor: MosaicDescriptor,
  pub min_horiz: u32,
  pub min_vert: u32,
}

/// Computes the bounding H x V grid, the sparse tile array, and the output
/// descriptor, following `SortProducts`.
pub fn plan_mosaic(
  tiles: &[TileDescriptor],
  output_path: PathBuf,
  projector: &impl InverseProjector,
) -> Result<MosaicPlan, MosaicError> {
  if tiles.is_empty() {
    return Err(MosaicError::general("no input tiles to plan"));
  }

  // 1. Bounding box over (horiz, vert), remembering a representative tile
  // index for each of the four extremes.
  let mut minh = tiles[0].horiz;
  let mut maxh = tiles[0].horiz;
  let mut minv = tiles[0].vert;
  let mut maxv = tiles[0].vert;
  let (mut minh_i, mut maxh_i, mut minv_i, mut maxv_i) = (0usize, 0usize, 0usize, 0usize);
  for (i, t) in tiles.iter().enumerate() {
    if t.horiz < minh {
      minh = t.horiz;
      minh_i = i;
    }
    if t.horiz > maxh {
      maxh = t.horiz;
      maxh_i = i;
    }
    if t.vert < minv {
      minv = t.vert;
      minv_i = i;
    }
    if t.vert > maxv {
      maxv = t.vert;
      maxv_i = i;
    }
  }
  if maxh > MAX_HORIZ || maxv > MAX_VERT {
    return Err(MosaicError::Geometry {
      reason: format!("tile index out of range: h<=35 v<=17 required, got h={maxh} v={maxv}"),
    });
  }

  let h = (maxh - minh + 1) as usize;
  let v = (maxv - minv + 1) as usize;

  // 2. TileGrid.
  let mut grid = TileGrid::new(h, v);
  for (i, t) in tiles.iter().enumerate() {
    grid.set((t.vert - minv) as usize, (t.horiz - minh) as usize, i);
  }

  // 3. Descriptor copy, scaling per-band dimensions to mosaic totals.
  let mut descriptor = MosaicDescriptor::from_tile(&tiles[0], output_path);
  for band in &mut descriptor.bands {
    band.nlines *= v as u32;
    band.nsamples *= h as u32;
  }

  // 4. Geographic bounds: component-wise extremum across all inputs.
  let mut bbox = tiles[0].bounding_box;
  for t in &tiles[1..] {
    bbox.north = bbox.north.max(t.bounding_box.north);
    bbox.south = bbox.south.min(t.bounding_box.south);
    bbox.east = bbox.east.max(t.bounding_box.east);
    bbox.west = bbox.west.min(t.bounding_box.west);
  }
  descriptor.bounding_box = bbox;

  // 5. Projected corners, taken from the representative extreme tiles.
  let ul = (tiles[minh_i].proj_corner(Corner::Ul).0, tiles[minv_i].proj_corner(Corner::Ul).1);
  let ur = (tiles[maxh_i].proj_corner(Corner::Ur).0, tiles[minv_i].proj_corner(Corner::Ur).1);
  let ll = (tiles[minh_i].proj_corner(Corner::Ll).0, tiles[maxv_i].proj_corner(Corner::Ll).1);
  let lr = (tiles[maxh_i].proj_corner(Corner::Lr).0, tiles[maxv_i].proj_corner(Corner::Lr).1);
  descriptor.proj_corners = [ul, ur, ll, lr];

  // 6. Geographic corners: invert each projected corner, with the two
  // fallback rules for range errors / interruption breaks.
  let mut geo_corners = [(0.0, 0.0); 4];
  let mut any_failed = false;
  for (idx, corner) in Corner::ALL.iter().enumerate() {
    let (x, y) = descriptor.proj_corners[*corner as usize];
    match projector.inverse(descriptor.projection, &descriptor.projection_params, x, y) {
      Ok(latlon) => geo_corners[idx] = latlon,
      Err((_, lat, raw_lon)) => {
        any_failed = true;
        if descriptor.projection.is_modis_grid() {
          // Keep the projector's own computed latitude; clamp the
          // longitude to the antimeridian per the sign of the raw
          // (wrapped) longitude it computed before failing.
          let lon = if raw_lon > 0.0 { -BOUND_LONG } else { BOUND_LONG };
          geo_corners[idx] = (lat, lon);
        }
      }
    }
  }

  if any_failed && !descriptor.projection.is_modis_grid() {
    if bbox.is_all_zero() {
      return Err(MosaicError::Geometry {
        reason: "no geographic bounding box available to fall back to".into(),
      });
    }
    geo_corners = [
      (bbox.north, bbox.west),
      (bbox.north, bbox.east),
      (bbox.south, bbox.west),
      (bbox.south, bbox.east),
    ];
  }
  descriptor.geo_corners = geo_corners;

  Ok(MosaicPlan { grid, descriptor, min_horiz: minh, min_vert: minv })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::band::BandInfo;
  use crate::types::{DataType, DatumCode, FileType, GeoBoundingBox};

  fn band() -> BandInfo {
    BandInfo {
      name: "b".into(),
      grid_name: "g".into(),
      nlines: 10,
      nsamples: 10,
      input_datatype: DataType::Uint8,
      output_datatype: DataType::Uint8,
      pixel_size: 1000.0,
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

  fn tile(h: u32, v: u32) -> TileDescriptor {
    TileDescriptor {
      path: PathBuf::from(format!("h{h:02}v{v:02}")),
      file_type: FileType::RawBinary,
      horiz: h,
      vert: v,
      bands: vec![band()],
      projection: ProjectionCode::Sinusoidal,
      datum: DatumCode::NoDatum,
      zone: -1,
      projection_params: [0.0; 15],
      proj_corners: [(0.0, 0.0); 4],
      geo_corners: [(0.0, 0.0); 4],
      bounding_box: GeoBoundingBox { north: 10.0, south: 0.0, east: 10.0, west: 0.0 },
    }
  }

  fn always_ok(_p: ProjectionCode, _params: &[f64; 15], _x: f64, _y: f64) -> Result<(f64, f64), (ProjectionFailure, f64, f64)> {
    Ok((0.0, 0.0))
  }

  #[test]
  fn grid_dimensions_match_tile_span() {
    let tiles = vec![tile(10, 5), tile(11, 5), tile(10, 6), tile(11, 6)];
    let plan = plan_mosaic(&tiles, PathBuf::from("out"), &always_ok).unwrap();
    assert_eq!(plan.grid.h, 2);
    assert_eq!(plan.grid.v, 2);
    assert_eq!(plan.descriptor.bands[0].nsamples, 20);
    assert_eq!(plan.descriptor.bands[0].nlines, 20);
  }

  #[test]
  fn sparse_grid_leaves_absent_positions_empty() {
    let tiles = vec![tile(10, 5), tile(11, 5), tile(10, 6)];
    let plan = plan_mosaic(&tiles, PathBuf::from("out"), &always_ok).unwrap();
    assert!(plan.grid.is_empty_at(1, 1));
    assert!(!plan.grid.is_empty_at(0, 0));
  }

  #[test]
  fn range_error_keeps_computed_latitude_and_clamps_longitude_by_sign() {
    fn failing(
      _p: ProjectionCode,
      _params: &[f64; 15],
      _x: f64,
      _y: f64,
    ) -> Result<(f64, f64), (ProjectionFailure, f64, f64)> {
      Err((ProjectionFailure::RangeError, 12.5, 200.0))
    }

    let tiles = vec![tile(10, 5)];
    let plan = plan_mosaic(&tiles, PathBuf::from("out"), &failing).unwrap();
    for corner in plan.descriptor.geo_corners {
      assert_eq!(corner, (12.5, -BOUND_LONG));
    }
  }

  #[test]
  fn range_error_clamps_to_positive_bound_for_negative_raw_longitude() {
    fn failing(
      _p: ProjectionCode,
      _params: &[f64; 15],
      _x: f64,
      _y: f64,
    ) -> Result<(f64, f64), (ProjectionFailure, f64, f64)> {
      Err((ProjectionFailure::RangeError, -5.0, -200.0))
    }

    let tiles = vec![tile(10, 5)];
    let plan = plan_mosaic(&tiles, PathBuf::from("out"), &failing).unwrap();
    for corner in plan.descriptor.geo_corners {
      assert_eq!(corner, (-5.0, BOUND_LONG));
    }
  }
}
