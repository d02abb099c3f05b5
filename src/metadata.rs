//! Reconstructs a [`TileDescriptor`] for one input file.
//!
//! The real metadata reader — decoding a genuine HDF-EOS grid's attached
//! projection/geolocation metadata, or an arbitrary ENVI-style sidecar for
//! raw binary — is an external collaborator. This module is the minimal
//! glue the CLI needs to turn a path into a [`TileDescriptor`] at all: for
//! raw binary it parses the sidecar header in the same `key = value` format
//! [`crate::hdr::write_header`] emits (so a mosaic's header can itself be
//! read back as an input), and for the HDF-EOS stand-in it parses the
//! `GRID`/`FIELD` lines [`crate::io::hdfeos`] writes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::band::BandInfo;
use crate::constants::{LARGE_STRING, SMALL_STRING};
use crate::descriptor::TileDescriptor;
use crate::error::MosaicError;
use crate::types::{Corner, DataType, DatumCode, FileType, GeoBoundingBox, ProjectionCode};

fn parse_datatype(s: &str) -> Option<DataType> {
  Some(match s {
    "INT8" => DataType::Int8,
    "UINT8" => DataType::Uint8,
    "INT16" => DataType::Int16,
    "UINT16" => DataType::Uint16,
    "INT32" => DataType::Int32,
    "UINT32" => DataType::Uint32,
    "FLOAT32" => DataType::Float32,
    _ => return None,
  })
}

fn parse_projection(s: &str) -> Option<ProjectionCode> {
  Some(match s {
    "Sinusoidal" => ProjectionCode::Sinusoidal,
    "IntegerizedSinusoidal" => ProjectionCode::IntegerizedSinusoidal,
    "Geographic" => ProjectionCode::Geographic,
    "Utm" => ProjectionCode::Utm,
    _ => return None,
  })
}

fn parse_pair(s: &str) -> Option<(f64, f64)> {
  let s = s.trim().trim_start_matches('(').trim_end_matches(')');
  let mut parts = s.split(',').map(|p| p.trim().parse::<f64>());
  let a = parts.next()?.ok()?;
  let b = parts.next()?.ok()?;
  Some((a, b))
}

/// Parses a sidecar header written by [`crate::hdr::write_header`] into a
/// [`TileDescriptor`] for `data_path`. Bands are returned in header order,
/// each carrying its own `selected = true`.
pub fn read_raw_sidecar(data_path: &Path, sidecar_path: &Path) -> Result<TileDescriptor, MosaicError> {
  if sidecar_path.as_os_str().len() > LARGE_STRING {
    return Err(MosaicError::syntax(format!(
      "sidecar path exceeds {LARGE_STRING} characters: {}",
      sidecar_path.display()
    )));
  }
  let text = std::fs::read_to_string(sidecar_path).map_err(|_| MosaicError::OpenRead { path: sidecar_path.to_path_buf() })?;

  let mut proj_corners = [(0.0, 0.0); 4];
  let mut geo_corners = [(0.0, 0.0); 4];
  let mut projection = ProjectionCode::Sinusoidal;
  let mut datum = DatumCode::NoDatum;
  let mut zone = -1i32;
  let mut params = [0.0_f64; 15];
  let mut bands = Vec::new();

  let mut pending: HashMap<&str, String> = HashMap::new();
  for line in text.lines() {
    let Some((key, value)) = line.split_once('=') else { continue };
    let key = key.trim();
    let value = value.trim();
    match key {
      "PROJECTION_TYPE" => projection = parse_projection(value).unwrap_or(ProjectionCode::Sinusoidal),
      "DATUM" => datum = if value == "Wgs84" { DatumCode::Wgs84 } else { DatumCode::NoDatum },
      "UTM_ZONE" => zone = value.parse().unwrap_or(-1),
      "PROJECTION_PARAMETERS" => {
        let inner = value.trim_start_matches('(').trim_end_matches(')');
        for (i, tok) in inner.split_whitespace().enumerate().take(15) {
          params[i] = tok.parse().unwrap_or(0.0);
        }
      }
      _ if key.starts_with("UL_CORNER_PROJECTED") => proj_corners[Corner::Ul as usize] = parse_pair(value).unwrap_or_default(),
      _ if key.starts_with("UR_CORNER_PROJECTED") => proj_corners[Corner::Ur as usize] = parse_pair(value).unwrap_or_default(),
      _ if key.starts_with("LL_CORNER_PROJECTED") => proj_corners[Corner::Ll as usize] = parse_pair(value).unwrap_or_default(),
      _ if key.starts_with("LR_CORNER_PROJECTED") => proj_corners[Corner::Lr as usize] = parse_pair(value).unwrap_or_default(),
      _ if key.starts_with("UL_CORNER_LATLON") => geo_corners[Corner::Ul as usize] = parse_pair(value).unwrap_or_default(),
      _ if key.starts_with("UR_CORNER_LATLON") => geo_corners[Corner::Ur as usize] = parse_pair(value).unwrap_or_default(),
      _ if key.starts_with("LL_CORNER_LATLON") => geo_corners[Corner::Ll as usize] = parse_pair(value).unwrap_or_default(),
      _ if key.starts_with("LR_CORNER_LATLON") => geo_corners[Corner::Lr as usize] = parse_pair(value).unwrap_or_default(),
      "BAND_NAME" => {
        flush_band(&mut bands, &mut pending)?;
        pending.insert("BAND_NAME", value.to_string());
      }
      "BAND_NLINES" | "BAND_NSAMPLES" | "BAND_DATATYPE" | "BAND_PIXEL_SIZE" | "BAND_BACKGROUND_FILL" => {
        pending.insert(leak_key(key), value.to_string());
      }
      _ => {}
    }
  }
  flush_band(&mut bands, &mut pending)?;

  let (horiz, vert) = crate::tilename::parse_tile_indices(data_path).unwrap_or((0, 0));

  Ok(TileDescriptor {
    path: data_path.to_path_buf(),
    file_type: FileType::RawBinary,
    horiz,
    vert,
    bands,
    projection,
    datum,
    zone,
    projection_params: params,
    proj_corners,
    geo_corners,
    bounding_box: GeoBoundingBox::default(),
  })
}

// `HashMap<&'static str, _>` would need the matched key to outlive the
// function; since every key above is one of a small fixed set of literals,
// reusing the literal itself (rather than the borrowed line slice) keeps
// the map's keys `'static` without an allocation per line.
fn leak_key(key: &str) -> &'static str {
  match key {
    "BAND_NLINES" => "BAND_NLINES",
    "BAND_NSAMPLES" => "BAND_NSAMPLES",
    "BAND_DATATYPE" => "BAND_DATATYPE",
    "BAND_PIXEL_SIZE" => "BAND_PIXEL_SIZE",
    "BAND_BACKGROUND_FILL" => "BAND_BACKGROUND_FILL",
    _ => "",
  }
}

fn flush_band(bands: &mut Vec<BandInfo>, pending: &mut HashMap<&str, String>) -> Result<(), MosaicError> {
  let Some(name) = pending.remove("BAND_NAME") else { return Ok(()) };
  if name.len() > SMALL_STRING {
    return Err(MosaicError::syntax(format!("band name exceeds {SMALL_STRING} characters: {name:?}")));
  }
  let nlines = pending.remove("BAND_NLINES").and_then(|v| v.parse().ok()).unwrap_or(0);
  let nsamples = pending.remove("BAND_NSAMPLES").and_then(|v| v.parse().ok()).unwrap_or(0);
  let datatype = pending
    .remove("BAND_DATATYPE")
    .and_then(|v| parse_datatype(&v))
    .unwrap_or(DataType::Uint8);
  let pixel_size = pending.remove("BAND_PIXEL_SIZE").and_then(|v| v.parse().ok()).unwrap_or(0.0);
  let background_fill = pending.remove("BAND_BACKGROUND_FILL").and_then(|v| v.parse().ok()).unwrap_or(0.0);
  bands.push(BandInfo {
    name,
    grid_name: String::new(),
    nlines,
    nsamples,
    input_datatype: datatype,
    output_datatype: datatype,
    pixel_size,
    rank: 2,
    pos: [0; 4],
    fieldnum: 0,
    min: None,
    max: None,
    background_fill,
    scale: 1.0,
    offset: 0.0,
    selected: true,
  });
  Ok(())
}

/// The conventional sidecar path for a raw-binary data file: same stem,
/// `.hdr` extension, alongside the data file.
pub fn sidecar_path_for(data_path: &Path) -> PathBuf {
  data_path.with_extension("hdr")
}

/// Dispatches to the raw-binary sidecar reader or the HDF-EOS stand-in
/// reader based on `file_type`.
pub fn read_tile_descriptor(path: &Path, file_type: FileType) -> Result<TileDescriptor, MosaicError> {
  match file_type {
    FileType::RawBinary => read_raw_sidecar(path, &sidecar_path_for(path)),
    FileType::HdfEos => crate::io::hdfeos::read_descriptor(path),
  }
}
