//! Simplified stand-in for the real HDF-EOS/HDF4 library.
//!
//! The real HDF4 library is an external binary-format collaborator (see
//! PURPOSE & SCOPE): this module satisfies the same grid/field contract
//! (one file, one or more grids keyed by pixel size, each grid holding one
//! field per band) with a small self-describing container instead of
//! linking the actual HDF4 library. It is not bit-for-bit compatible with a
//! real `.hdf` file.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::band::BandInfo;
use crate::descriptor::MosaicDescriptor;
use crate::error::MosaicError;
use crate::types::{DataType, ProjectionCode};

use super::{RasterIo, RasterReader, RasterWriter};

const END_HEADER: &str = "ENDHEADER";

fn datatype_tag(dt: DataType) -> &'static str {
  match dt {
    DataType::Int8 => "INT8",
    DataType::Uint8 => "UINT8",
    DataType::Int16 => "INT16",
    DataType::Uint16 => "UINT16",
    DataType::Int32 => "INT32",
    DataType::Uint32 => "UINT32",
    DataType::Float32 => "FLOAT32",
  }
}

fn datatype_from_tag(tag: &str) -> Option<DataType> {
  Some(match tag {
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

struct FieldRecord {
  grid_name: String,
  name: String,
  datatype: DataType,
  nlines: u32,
  nsamples: u32,
  rows: Vec<Vec<f64>>,
}

struct GridRecord {
  name: String,
  xdim: u32,
  ydim: u32,
  ul: (f64, f64),
  lr: (f64, f64),
  projection: ProjectionCode,
  zone: i32,
}

/// Accumulates grids/fields in memory and serializes the whole container
/// on close; HDF4's own in-file structure updates incrementally, but doing
/// so here would mean hand-rolling a chunked file format for no behavioral
/// gain over buffering.
pub struct HdfEosWriter {
  path: PathBuf,
  grids: Vec<GridRecord>,
  fields: Vec<FieldRecord>,
  cur_grid: Option<usize>,
  cur_field: Option<usize>,
  old_attributes: Vec<(String, String)>,
}

impl HdfEosWriter {
  /// Records a per-input HDF attribute under an `"Old" + name` key, per the
  /// lineage-preservation requirement for HDF-EOS outputs.
  pub fn record_old_attribute(&mut self, name: &str, value: &str) {
    self.old_attributes.push((format!("Old{name}"), value.to_string()));
  }
}

impl RasterWriter for HdfEosWriter {
  fn create_grid(&mut self, descriptor: &MosaicDescriptor, band: &BandInfo) -> Result<(), MosaicError> {
    self.grids.push(GridRecord {
      name: band.grid_name.clone(),
      xdim: band.nsamples,
      ydim: band.nlines,
      ul: descriptor.proj_corner(crate::types::Corner::Ul),
      lr: descriptor.proj_corner(crate::types::Corner::Lr),
      projection: descriptor.projection,
      zone: descriptor.zone,
    });
    self.cur_grid = Some(self.grids.len() - 1);
    Ok(())
  }

  fn create_field(&mut self, band: &BandInfo) -> Result<(), MosaicError> {
    let grid_idx = self.cur_grid.ok_or_else(|| MosaicError::general("create_field called before create_grid"))?;
    let grid_name = self.grids[grid_idx].name.clone();
    self.fields.push(FieldRecord {
      grid_name,
      name: band.name.clone(),
      datatype: band.output_datatype,
      nlines: band.nlines,
      nsamples: band.nsamples,
      rows: vec![vec![0.0; band.nsamples as usize]; band.nlines as usize],
    });
    self.cur_field = Some(self.fields.len() - 1);
    Ok(())
  }

  fn record_lineage(&mut self, source_paths: &[PathBuf]) {
    for (i, p) in source_paths.iter().enumerate() {
      self.record_old_attribute(&format!("FileName{i}"), &p.display().to_string());
    }
  }

  fn write_row(&mut self, row: usize, data: &[f64]) -> Result<(), MosaicError> {
    let idx = self.cur_field.ok_or_else(|| MosaicError::Write { path: self.path.clone() })?;
    let field = &mut self.fields[idx];
    if row >= field.rows.len() {
      return Err(MosaicError::Write { path: self.path.clone() });
    }
    field.rows[row] = data.to_vec();
    Ok(())
  }

  fn close(&mut self) -> Result<(), MosaicError> {
    let file = File::create(&self.path).map_err(|_| MosaicError::OpenWrite { path: self.path.clone() })?;
    let mut w = BufWriter::new(file);

    let mut header = String::new();
    for g in &self.grids {
      header.push_str(&format!(
        "GRID {} {} {} {} {} {} {} {:?} {}\n",
        g.name, g.xdim, g.ydim, g.ul.0, g.ul.1, g.lr.0, g.lr.1, g.projection, g.zone
      ));
    }
    let mut offset: u64 = 0;
    let mut field_lines = Vec::with_capacity(self.fields.len());
    for f in &self.fields {
      let byte_len = f.nlines as u64 * f.nsamples as u64 * f.datatype.byte_len();
      field_lines.push(format!(
        "FIELD {} {} {} {} {} {} {}\n",
        f.grid_name,
        f.name,
        datatype_tag(f.datatype),
        f.nlines,
        f.nsamples,
        offset,
        byte_len
      ));
      offset += byte_len;
    }
    for line in &field_lines {
      header.push_str(line);
    }
    for (k, v) in &self.old_attributes {
      header.push_str(&format!("ATTR {k} {v}\n"));
    }
    header.push_str(END_HEADER);
    header.push('\n');

    w.write_all(header.as_bytes()).map_err(|_| MosaicError::Write { path: self.path.clone() })?;

    for f in &self.fields {
      for row in &f.rows {
        for &v in row {
          write_sample(&mut w, f.datatype, v).map_err(|_| MosaicError::Write { path: self.path.clone() })?;
        }
      }
    }
    w.flush().map_err(|_| MosaicError::Write { path: self.path.clone() })
  }
}

fn write_sample(w: &mut impl Write, dt: DataType, v: f64) -> std::io::Result<()> {
  match dt {
    DataType::Int8 => w.write_i8(v.clamp(i8::MIN as f64, i8::MAX as f64) as i8),
    DataType::Uint8 => w.write_u8(v.clamp(u8::MIN as f64, u8::MAX as f64) as u8),
    DataType::Int16 => w.write_i16::<LittleEndian>(v.clamp(i16::MIN as f64, i16::MAX as f64) as i16),
    DataType::Uint16 => w.write_u16::<LittleEndian>(v.clamp(u16::MIN as f64, u16::MAX as f64) as u16),
    DataType::Int32 => w.write_i32::<LittleEndian>(v.clamp(i32::MIN as f64, i32::MAX as f64) as i32),
    DataType::Uint32 => w.write_u32::<LittleEndian>(v.clamp(u32::MIN as f64, u32::MAX as f64) as u32),
    DataType::Float32 => w.write_f32::<LittleEndian>(v as f32),
  }
}

fn read_sample(r: &mut impl Read, dt: DataType) -> std::io::Result<f64> {
  Ok(match dt {
    DataType::Int8 => r.read_i8()? as f64,
    DataType::Uint8 => r.read_u8()? as f64,
    DataType::Int16 => r.read_i16::<LittleEndian>()? as f64,
    DataType::Uint16 => r.read_u16::<LittleEndian>()? as f64,
    DataType::Int32 => r.read_i32::<LittleEndian>()? as f64,
    DataType::Uint32 => r.read_u32::<LittleEndian>()? as f64,
    DataType::Float32 => r.read_f32::<LittleEndian>()? as f64,
  })
}

/// Reads one band's rows back out of a container written by
/// [`HdfEosWriter`].
pub struct HdfEosReader {
  file: BufReader<File>,
  path: PathBuf,
  data_start: u64,
  field_offset: u64,
  nsamples: u32,
  datatype: DataType,
}

impl RasterReader for HdfEosReader {
  fn read_row(&mut self, row: usize) -> Result<Vec<f64>, MosaicError> {
    let row_bytes = self.nsamples as u64 * self.datatype.byte_len();
    let pos = self.data_start + self.field_offset + row as u64 * row_bytes;
    self.file.seek(SeekFrom::Start(pos)).map_err(|_| MosaicError::Read { path: self.path.clone() })?;
    let mut out = Vec::with_capacity(self.nsamples as usize);
    for _ in 0..self.nsamples {
      out.push(read_sample(&mut self.file, self.datatype).map_err(|_| MosaicError::Read { path: self.path.clone() })?);
    }
    Ok(out)
  }

  fn close(&mut self) -> Result<(), MosaicError> {
    Ok(())
  }
}

struct ParsedField {
  name: String,
  nlines: u32,
  nsamples: u32,
  datatype: DataType,
  offset: u64,
}

fn parse_header(path: &Path) -> Result<(u64, Vec<ParsedField>), MosaicError> {
  let mut file = File::open(path).map_err(|_| MosaicError::OpenRead { path: path.to_path_buf() })?;
  let mut buf = Vec::new();
  file.read_to_end(&mut buf).map_err(|_| MosaicError::Read { path: path.to_path_buf() })?;
  let text = String::from_utf8_lossy(&buf);

  let mut fields = Vec::new();
  let mut header_len = 0usize;
  for line in text.lines() {
    header_len += line.len() + 1;
    if line == END_HEADER {
      break;
    }
    if let Some(rest) = line.strip_prefix("FIELD ") {
      let parts: Vec<&str> = rest.split(' ').collect();
      if parts.len() != 7 {
        return Err(MosaicError::Read { path: path.to_path_buf() });
      }
      let datatype = datatype_from_tag(parts[2]).ok_or_else(|| MosaicError::Read { path: path.to_path_buf() })?;
      let nlines: u32 = parts[3].parse().map_err(|_| MosaicError::Read { path: path.to_path_buf() })?;
      let nsamples: u32 = parts[4].parse().map_err(|_| MosaicError::Read { path: path.to_path_buf() })?;
      let offset: u64 = parts[5].parse().map_err(|_| MosaicError::Read { path: path.to_path_buf() })?;
      fields.push(ParsedField { name: parts[1].to_string(), nlines, nsamples, datatype, offset });
    }
  }
  Ok((header_len as u64, fields))
}

struct ParsedGrid {
  xdim: u32,
  ydim: u32,
  ul: (f64, f64),
  lr: (f64, f64),
  zone: i32,
}

fn parse_grid_line(path: &Path, text: &str) -> Result<Option<ParsedGrid>, MosaicError> {
  for line in text.lines() {
    if line == END_HEADER {
      break;
    }
    if let Some(rest) = line.strip_prefix("GRID ") {
      let parts: Vec<&str> = rest.split(' ').collect();
      if parts.len() != 9 {
        return Err(MosaicError::Read { path: path.to_path_buf() });
      }
      let xdim: u32 = parts[1].parse().map_err(|_| MosaicError::Read { path: path.to_path_buf() })?;
      let ydim: u32 = parts[2].parse().map_err(|_| MosaicError::Read { path: path.to_path_buf() })?;
      let ulx: f64 = parts[3].parse().map_err(|_| MosaicError::Read { path: path.to_path_buf() })?;
      let uly: f64 = parts[4].parse().map_err(|_| MosaicError::Read { path: path.to_path_buf() })?;
      let lrx: f64 = parts[5].parse().map_err(|_| MosaicError::Read { path: path.to_path_buf() })?;
      let lry: f64 = parts[6].parse().map_err(|_| MosaicError::Read { path: path.to_path_buf() })?;
      let zone: i32 = parts[8].parse().map_err(|_| MosaicError::Read { path: path.to_path_buf() })?;
      return Ok(Some(ParsedGrid { xdim, ydim, ul: (ulx, uly), lr: (lrx, lry), zone }));
    }
  }
  Ok(None)
}

/// Reconstructs a [`crate::descriptor::TileDescriptor`] from a container
/// written by [`HdfEosWriter`]: band shape/datatype from the `FIELD` lines,
/// projected extent and zone from the first `GRID` line, and `(horiz,
/// vert)` from the filename (the stand-in container has no embedded tile
/// index field of its own). Datum, the 15 projection parameters, and
/// geographic corners are not recoverable from this simplified format and
/// are left at their defaults; a real HDF-EOS reader would recover them
/// from the file's attached geolocation metadata.
pub fn read_descriptor(path: &Path) -> Result<crate::descriptor::TileDescriptor, MosaicError> {
  use crate::descriptor::TileDescriptor;
  use crate::types::{DatumCode, FileType, GeoBoundingBox};

  let mut file = File::open(path).map_err(|_| MosaicError::OpenRead { path: path.to_path_buf() })?;
  let mut buf = Vec::new();
  file.read_to_end(&mut buf).map_err(|_| MosaicError::Read { path: path.to_path_buf() })?;
  let text = String::from_utf8_lossy(&buf);

  let (_, fields) = parse_header(path)?;
  let grid = parse_grid_line(path, &text)?.ok_or_else(|| MosaicError::Read { path: path.to_path_buf() })?;

  let bands = fields
    .into_iter()
    .map(|f| BandInfo {
      name: f.name,
      grid_name: String::new(),
      nlines: f.nlines,
      nsamples: f.nsamples,
      input_datatype: f.datatype,
      output_datatype: f.datatype,
      pixel_size: 0.0,
      rank: 2,
      pos: [0; 4],
      fieldnum: 0,
      min: None,
      max: None,
      background_fill: 0.0,
      scale: 1.0,
      offset: 0.0,
      selected: true,
    })
    .collect();

  let (horiz, vert) = crate::tilename::parse_tile_indices(path).unwrap_or((0, 0));
  let _ = (grid.xdim, grid.ydim);

  Ok(TileDescriptor {
    path: path.to_path_buf(),
    file_type: FileType::HdfEos,
    horiz,
    vert,
    bands,
    projection: ProjectionCode::Sinusoidal,
    datum: DatumCode::NoDatum,
    zone: grid.zone,
    projection_params: [0.0; 15],
    proj_corners: [grid.ul, (grid.lr.0, grid.ul.1), (grid.ul.0, grid.lr.1), grid.lr],
    geo_corners: [(0.0, 0.0); 4],
    bounding_box: GeoBoundingBox::default(),
  })
}

/// The HDF-EOS [`RasterIo`] implementation, backed by [`HdfEosWriter`] and
/// [`HdfEosReader`].
pub struct HdfEosRasterIo;

impl RasterIo for HdfEosRasterIo {
  fn open_reader(&self, path: &Path, band: &BandInfo) -> Result<Box<dyn RasterReader>, MosaicError> {
    let (data_start, fields) = parse_header(path)?;
    let field = fields
      .into_iter()
      .find(|f| f.name == band.name)
      .ok_or_else(|| MosaicError::Read { path: path.to_path_buf() })?;
    let file = File::open(path).map_err(|_| MosaicError::OpenRead { path: path.to_path_buf() })?;
    let _ = field.nlines;
    Ok(Box::new(HdfEosReader {
      file: BufReader::new(file),
      path: path.to_path_buf(),
      data_start,
      field_offset: field.offset,
      nsamples: field.nsamples,
      datatype: field.datatype,
    }))
  }

  fn open_writer(&self, path: &Path, _descriptor: &MosaicDescriptor) -> Result<Box<dyn RasterWriter>, MosaicError> {
    Ok(Box::new(HdfEosWriter {
      path: path.to_path_buf(),
      grids: Vec::new(),
      fields: Vec::new(),
      cur_grid: None,
      cur_field: None,
      old_attributes: Vec::new(),
    }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::descriptor::MosaicDescriptor;
  use crate::types::{DatumCode, FileType};

  fn band() -> BandInfo {
    BandInfo {
      name: "sur_refl_b01".into(),
      grid_name: "MOD_Grid_500m".into(),
      nlines: 4,
      nsamples: 3,
      input_datatype: DataType::Int16,
      output_datatype: DataType::Int16,
      pixel_size: 500.0,
      rank: 2,
      pos: [0; 4],
      fieldnum: 0,
      min: None,
      max: None,
      background_fill: -28672.0,
      scale: 1.0,
      offset: 0.0,
      selected: true,
    }
  }

  fn descriptor(b: BandInfo) -> MosaicDescriptor {
    MosaicDescriptor {
      path: PathBuf::from("out.hdf"),
      file_type: FileType::HdfEos,
      bands: vec![b],
      grid_names: vec!["MOD_Grid_500m".into()],
      projection: ProjectionCode::Sinusoidal,
      datum: DatumCode::NoDatum,
      zone: -1,
      projection_params: [0.0; 15],
      proj_corners: [(0.0, 0.0); 4],
      geo_corners: [(0.0, 0.0); 4],
      bounding_box: Default::default(),
    }
  }

  #[test]
  fn writes_then_reads_back_a_field() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("m.hdf");
    let io = HdfEosRasterIo;
    let desc = descriptor(band());

    let mut writer = io.open_writer(&path, &desc).unwrap();
    writer.create_grid(&desc, &desc.bands[0]).unwrap();
    writer.create_field(&desc.bands[0]).unwrap();
    for row in 0..4 {
      writer.write_row(row, &[1.0, 2.0, 3.0]).unwrap();
    }
    writer.close().unwrap();

    let mut reader = io.open_reader(&path, &desc.bands[0]).unwrap();
    assert_eq!(reader.read_row(0).unwrap(), vec![1.0, 2.0, 3.0]);
    assert_eq!(reader.read_row(3).unwrap(), vec![1.0, 2.0, 3.0]);
  }
}
