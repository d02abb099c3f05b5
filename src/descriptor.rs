//! `TileDescriptor`, `MosaicDescriptor`, and the sparse `TileGrid` that maps
//! tile positions to input indices.

use std::path::PathBuf;

use crate::band::BandInfo;
use crate::types::{Corner, DatumCode, FileType, GeoBoundingBox, ProjectionCode};

/// Metadata describing one input tile, as populated by the (external)
/// metadata reader.
#[derive(Debug, Clone)]
pub struct TileDescriptor {
  pub path: PathBuf,
  pub file_type: FileType,
  pub horiz: u32,
  pub vert: u32,
  pub bands: Vec<BandInfo>,
  pub projection: ProjectionCode,
  pub datum: DatumCode,
  pub zone: i32,
  pub projection_params: [f64; 15],
  /// Projected-coordinate corners, indexed by [`Corner`].
  pub proj_corners: [(f64, f64); 4],
  /// Geographic (lat, lon) corners, indexed by [`Corner`].
  pub geo_corners: [(f64, f64); 4],
  pub bounding_box: GeoBoundingBox,
}

impl TileDescriptor {
  pub fn proj_corner(&self, c: Corner) -> (f64, f64) {
    self.proj_corners[c as usize]
  }

  pub fn geo_corner(&self, c: Corner) -> (f64, f64) {
    self.geo_corners[c as usize]
  }
}

/// Descriptor for the assembled mosaic. Same shape as [`TileDescriptor`],
/// built by deep-copying a representative input and overriding the fields
/// that differ at mosaic scale.
#[derive(Debug, Clone)]
pub struct MosaicDescriptor {
  pub path: PathBuf,
  pub file_type: FileType,
  pub bands: Vec<BandInfo>,
  pub grid_names: Vec<String>,
  pub projection: ProjectionCode,
  pub datum: DatumCode,
  pub zone: i32,
  pub projection_params: [f64; 15],
  pub proj_corners: [(f64, f64); 4],
  pub geo_corners: [(f64, f64); 4],
  pub bounding_box: GeoBoundingBox,
}

impl MosaicDescriptor {
  /// Deep-copies `source` the way `CopyMosaicDescriptor` does, before the
  /// planner overrides the fields that change at mosaic scale.
  pub fn from_tile(source: &TileDescriptor, output_path: PathBuf) -> Self {
    let grid_names = source.bands.iter().map(|b| b.grid_name.clone()).collect();
    MosaicDescriptor {
      path: output_path,
      file_type: source.file_type,
      bands: source.bands.clone(),
      grid_names,
      projection: source.projection,
      datum: source.datum,
      zone: source.zone,
      projection_params: source.projection_params,
      proj_corners: source.proj_corners,
      geo_corners: source.geo_corners,
      bounding_box: source.bounding_box,
    }
  }

  pub fn proj_corner(&self, c: Corner) -> (f64, f64) {
    self.proj_corners[c as usize]
  }

  pub fn geo_corner(&self, c: Corner) -> (f64, f64) {
    self.geo_corners[c as usize]
  }
}

/// Sentinel-free sparse grid: `grid[v][h]` is the index into the input list
/// occupying that tile position, or `None` if absent.
#[derive(Debug, Clone)]
pub struct TileGrid {
  pub h: usize,
  pub v: usize,
  cells: Vec<Vec<Option<usize>>>,
}

impl TileGrid {
  pub fn new(h: usize, v: usize) -> Self {
    TileGrid { h, v, cells: vec![vec![None; h]; v] }
  }

  pub fn get(&self, v: usize, h: usize) -> Option<usize> {
    self.cells[v][h]
  }

  pub fn set(&mut self, v: usize, h: usize, input_index: usize) {
    self.cells[v][h] = Some(input_index);
  }

  pub fn is_empty_at(&self, v: usize, h: usize) -> bool {
    self.cells[v][h].is_none()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_grid_is_all_empty() {
    let g = TileGrid::new(3, 2);
    for v in 0..2 {
      for h in 0..3 {
        assert!(g.is_empty_at(v, h));
      }
    }
  }

  #[test]
  fn set_then_get_round_trips() {
    let mut g = TileGrid::new(2, 2);
    g.set(1, 0, 7);
    assert_eq!(g.get(1, 0), Some(7));
    assert!(g.is_empty_at(0, 0));
  }
}
