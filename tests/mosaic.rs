//! End-to-end scenarios driving the public API the way the CLI does:
//! compatibility check -> plan -> (optional header) -> execute.

use mrt_mosaic::band::BandInfo;
use mrt_mosaic::compat::check_compatibility;
use mrt_mosaic::descriptor::TileDescriptor;
use mrt_mosaic::error::{MismatchField, MosaicError};
use mrt_mosaic::executor::execute_mosaic;
use mrt_mosaic::io::raw::RawRasterIo;
use mrt_mosaic::planner::{plan_mosaic, ProjectionFailure};
use mrt_mosaic::size::{check_size, estimate_size};
use mrt_mosaic::tilename::parse_tile_indices;
use mrt_mosaic::types::{DataType, DatumCode, FileType, GeoBoundingBox, ProjectionCode};

fn band(nlines: u32, nsamples: u32, background_fill: f64) -> BandInfo {
  BandInfo {
    name: "sur_refl_b01".into(),
    grid_name: "MOD_Grid_500m".into(),
    nlines,
    nsamples,
    input_datatype: DataType::Uint8,
    output_datatype: DataType::Uint8,
    pixel_size: 500.0,
    rank: 2,
    pos: [0; 4],
    fieldnum: 0,
    min: None,
    max: None,
    background_fill,
    scale: 1.0,
    offset: 0.0,
    selected: true,
  }
}

fn tile(dir: &std::path::Path, h: u32, v: u32, value: u8, band_info: BandInfo) -> TileDescriptor {
  let path = dir.join(format!("h{h:02}v{v:02}.raw"));
  std::fs::write(&path, vec![value; (band_info.nlines * band_info.nsamples) as usize]).unwrap();
  TileDescriptor {
    path,
    file_type: FileType::RawBinary,
    horiz: h,
    vert: v,
    bands: vec![band_info],
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
fn four_present_tiles_mosaic_into_one_seamless_grid() {
  let dir = tempfile::tempdir().unwrap();
  let b = band(10, 10, 255.0);
  let tiles = vec![
    tile(dir.path(), 10, 5, 1, b.clone()),
    tile(dir.path(), 11, 5, 2, b.clone()),
    tile(dir.path(), 10, 6, 3, b.clone()),
    tile(dir.path(), 11, 6, 4, b.clone()),
  ];
  check_compatibility(&tiles).unwrap();

  let out_path = dir.path().join("mosaic.raw");
  let plan = plan_mosaic(&tiles, out_path.clone(), &always_ok).unwrap();
  assert_eq!(plan.grid.h, 2);
  assert_eq!(plan.grid.v, 2);

  execute_mosaic(&tiles, &plan.grid, &plan.descriptor, &RawRasterIo).unwrap();

  let out = std::fs::read(&out_path).unwrap();
  assert_eq!(out.len(), 400);
  // Every quadrant carries its own tile's constant value, not the
  // background fill: there is no gap to fill in this scenario.
  assert_eq!(out[0], 1); // top-left
  assert_eq!(out[15], 2); // top-right (col 15 is in the second tile's span)
  assert_eq!(out[10 * 20], 3); // bottom-left
  assert_eq!(out[10 * 20 + 15], 4); // bottom-right
}

#[test]
fn missing_tile_position_is_filled_with_band_background() {
  let dir = tempfile::tempdir().unwrap();
  let b = band(10, 10, 200.0);
  let tiles = vec![
    tile(dir.path(), 10, 5, 9, b.clone()),
    tile(dir.path(), 11, 6, 9, b.clone()),
  ];
  check_compatibility(&tiles).unwrap();

  let out_path = dir.path().join("sparse.raw");
  let plan = plan_mosaic(&tiles, out_path.clone(), &always_ok).unwrap();
  execute_mosaic(&tiles, &plan.grid, &plan.descriptor, &RawRasterIo).unwrap();

  let out = std::fs::read(&out_path).unwrap();
  // Top-right and bottom-left quadrants have no input tile.
  assert_eq!(out[15], 200);
  assert_eq!(out[10 * 20], 200);
}

#[test]
fn band_subset_selection_skips_unselected_bands_in_output() {
  let dir = tempfile::tempdir().unwrap();
  let mut selected = band(5, 5, 0.0);
  selected.name = "keep".into();
  let mut dropped = band(5, 5, 0.0);
  dropped.name = "drop".into();
  dropped.selected = false;

  let path = dir.path().join("h10v05.raw");
  std::fs::write(&path, vec![7u8; 25 * 2]).unwrap();
  let t = TileDescriptor {
    path,
    file_type: FileType::RawBinary,
    horiz: 10,
    vert: 5,
    bands: vec![selected, dropped],
    projection: ProjectionCode::Sinusoidal,
    datum: DatumCode::NoDatum,
    zone: -1,
    projection_params: [0.0; 15],
    proj_corners: [(0.0, 0.0); 4],
    geo_corners: [(0.0, 0.0); 4],
    bounding_box: GeoBoundingBox::default(),
  };
  let tiles = vec![t];

  let out_path = dir.path().join("out.raw");
  let plan = plan_mosaic(&tiles, out_path.clone(), &always_ok).unwrap();
  execute_mosaic(&tiles, &plan.grid, &plan.descriptor, &RawRasterIo).unwrap();

  // Only the selected band's 25 bytes were written; the dropped band
  // contributes nothing to the output file.
  let out = std::fs::read(&out_path).unwrap();
  assert_eq!(out.len(), 25);
}

#[test]
fn oversized_hdf_eos_estimate_is_rejected_before_writing() {
  let b = band(100_000, 100_000, 0.0);
  let bytes = estimate_size(&[b]);
  let err = check_size(bytes).unwrap_err();
  assert!(matches!(err, MosaicError::SizeExceeded { .. }));
}

#[test]
fn incompatible_pixel_sizes_are_rejected_before_planning() {
  let dir = tempfile::tempdir().unwrap();
  let b0 = band(10, 10, 0.0);
  let mut b1 = band(10, 10, 0.0);
  b1.pixel_size = 250.0;
  let tiles = vec![tile(dir.path(), 10, 5, 1, b0), tile(dir.path(), 11, 5, 2, b1)];

  let err = check_compatibility(&tiles).unwrap_err();
  match err {
    MosaicError::Mismatch { field, .. } => assert_eq!(field, MismatchField::PixelSize),
    _ => panic!("expected Mismatch"),
  }
}

#[test]
fn determine_tiles_reports_indices_without_mosaicking() {
  let dir = tempfile::tempdir().unwrap();
  let paths = vec![dir.path().join("h10v05.raw"), dir.path().join("h11v06.raw")];
  for p in &paths {
    std::fs::write(p, b"x").unwrap();
  }

  let indices: Vec<(u32, u32)> = paths.iter().map(|p| parse_tile_indices(p).unwrap()).collect();
  assert_eq!(indices, vec![(10, 5), (11, 6)]);

  // No mosaic output was produced by this scenario.
  assert!(!dir.path().join("tile.txt").exists());
}
