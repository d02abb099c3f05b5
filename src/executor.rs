//! The band-major, row-major streaming loop that composes and writes the
//! mosaic, one band and one horizontal strip of tiles at a time.

use crate::descriptor::{MosaicDescriptor, TileDescriptor, TileGrid};
use crate::error::MosaicError;
use crate::io::{RasterIo, ReaderGuard, WriterGuard};

/// Drives one output file across every selected band of `descriptor`,
/// reading from `tiles` positioned by `grid`.
pub fn execute_mosaic(
  tiles: &[TileDescriptor],
  grid: &TileGrid,
  descriptor: &MosaicDescriptor,
  io: &dyn RasterIo,
) -> Result<(), MosaicError> {
  // Open question (preserved as-is): starting at 0.0 guarantees the first
  // selected band always triggers a grid creation, matching the source's
  // initial `curr_resolution` convention.
  let mut curr_resolution = 0.0_f64;

  // HDF-EOS keeps every band in one file, so `output_path_for_band` always
  // returns `descriptor.path` and this writer persists across the whole
  // loop. Raw binary gives each band its own file once more than one band
  // is selected, so the path changes between bands and the writer for the
  // previous path is closed before the next is opened.
  let mut current_path: Option<std::path::PathBuf> = None;
  let mut writer: Option<WriterGuard> = None;

  for (band_idx, band) in descriptor.bands.iter().enumerate() {
    if !band.selected {
      continue;
    }

    let band_path = io.output_path_for_band(&descriptor.path, band, descriptor);
    if current_path.as_deref() != Some(band_path.as_path()) {
      if let Some(mut prev) = writer.take() {
        prev.close()?;
      }
      let mut opened = WriterGuard::new(io.open_writer(&band_path, descriptor)?);
      let source_paths: Vec<_> = tiles.iter().map(|t| t.path.clone()).collect();
      opened.record_lineage(&source_paths);
      writer = Some(opened);
      current_path = Some(band_path);
    }
    let writer = writer.as_mut().expect("opened above");

    let resolution_change = band.pixel_size != curr_resolution;
    curr_resolution = band.pixel_size;
    if resolution_change {
      writer.create_grid(descriptor, band)?;
    }
    writer.create_field(band)?;

    let nrows = band.nlines as usize / grid.v;
    let input_cols = band.nsamples as usize / grid.h;

    for v in 0..grid.v {
      let mut readers: Vec<Option<ReaderGuard>> = Vec::with_capacity(grid.h);
      for h in 0..grid.h {
        readers.push(match grid.get(v, h) {
          None => None,
          Some(input_idx) => {
            let tile = &tiles[input_idx];
            let tile_band = &tile.bands[band_idx];
            Some(ReaderGuard::new(io.open_reader(&tile.path, tile_band)?))
          }
        });
      }

      let mut last_pct = report_progress_start();

      for row in 0..nrows {
        let mut out_row = vec![0.0_f64; band.nsamples as usize];
        let mut outcol = 0usize;
        for h in 0..grid.h {
          match readers[h].as_mut() {
            None => {
              out_row[outcol..outcol + input_cols].fill(band.background_fill);
            }
            Some(reader) => {
              let in_row = reader.read_row(row)?;
              out_row[outcol..outcol + input_cols].copy_from_slice(&in_row[..input_cols]);
            }
          }
          outcol += input_cols;
        }
        writer.write_row(v * nrows + row, &out_row)?;

        last_pct = report_progress_step(band_idx, v, row, nrows, last_pct);
      }
      log::info!("band {band_idx} v={v} 100%");

      // Dropping each `ReaderGuard` closes its underlying reader; done
      // explicitly here (rather than waiting for `readers` to go out of
      // scope at the loop bottom) so the strip's resources are released
      // before the next strip is opened, per the ordering requirement.
      drop(readers);
    }
  }

  match writer {
    Some(mut w) => w.close(),
    None => Ok(()),
  }
}

fn report_progress_start() -> u32 {
  log::info!("0%");
  0
}

fn report_progress_step(band_idx: usize, v: usize, row: usize, nrows: usize, last_pct: u32) -> u32 {
  if nrows == 0 {
    return last_pct;
  }
  let pct = (((row + 1) * 100) / nrows) as u32;
  let step = (pct / 10) * 10;
  if step > last_pct && step < 100 {
    log::info!("band {band_idx} v={v} {step}%");
    step
  } else {
    last_pct
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::band::BandInfo;
  use crate::descriptor::MosaicDescriptor;
  use crate::io::raw::RawRasterIo;
  use crate::types::{DataType, DatumCode, FileType, GeoBoundingBox, ProjectionCode};
  use std::path::PathBuf;

  fn band(background_fill: f64) -> BandInfo {
    BandInfo {
      name: "b".into(),
      grid_name: "g".into(),
      nlines: 20,
      nsamples: 20,
      input_datatype: DataType::Uint8,
      output_datatype: DataType::Uint8,
      pixel_size: 1000.0,
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

  fn write_tile_file(dir: &std::path::Path, name: &str, value: u8) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, vec![value; 10 * 10]).unwrap();
    path
  }

  fn tile_descriptor(path: PathBuf, h: u32, v: u32, band: BandInfo) -> TileDescriptor {
    TileDescriptor {
      path,
      file_type: FileType::RawBinary,
      horiz: h,
      vert: v,
      bands: vec![band],
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
  fn sparse_mosaic_fills_absent_tile_with_background() {
    let dir = tempfile::tempdir().unwrap();
    let mut tile_band = band(255.0);
    tile_band.nlines = 10;
    tile_band.nsamples = 10;

    let p0 = write_tile_file(dir.path(), "h10v05.raw", 1);
    let p1 = write_tile_file(dir.path(), "h11v05.raw", 2);
    let p2 = write_tile_file(dir.path(), "h10v06.raw", 3);

    let tiles = vec![
      tile_descriptor(p0, 10, 5, tile_band.clone()),
      tile_descriptor(p1, 11, 5, tile_band.clone()),
      tile_descriptor(p2, 10, 6, tile_band.clone()),
    ];

    let mut grid = TileGrid::new(2, 2);
    grid.set(0, 0, 0);
    grid.set(0, 1, 1);
    grid.set(1, 0, 2);

    let mut out_band = band(255.0);
    out_band.nlines = 20;
    out_band.nsamples = 20;
    let descriptor = MosaicDescriptor {
      path: dir.path().join("out.raw"),
      file_type: FileType::RawBinary,
      bands: vec![out_band],
      grid_names: vec!["g".into()],
      projection: ProjectionCode::Sinusoidal,
      datum: DatumCode::NoDatum,
      zone: -1,
      projection_params: [0.0; 15],
      proj_corners: [(0.0, 0.0); 4],
      geo_corners: [(0.0, 0.0); 4],
      bounding_box: GeoBoundingBox::default(),
    };

    execute_mosaic(&tiles, &grid, &descriptor, &RawRasterIo).unwrap();

    let out = std::fs::read(&descriptor.path).unwrap();
    assert_eq!(out.len(), 400);
    // Bottom-right 10x10 block (rows 10..20, cols 10..20) is all 255.
    for row in 10..20 {
      for col in 10..20 {
        assert_eq!(out[row * 20 + col], 255);
      }
    }
    // Top-left block is tile 0's constant value 1.
    assert_eq!(out[0], 1);
  }
}
