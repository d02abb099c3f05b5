//! Real implementation of raw-binary row-major tile I/O: one flat file of
//! samples per band, described by the ENVI-like sidecar header ([`crate::hdr`]).

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::band::BandInfo;
use crate::descriptor::MosaicDescriptor;
use crate::error::MosaicError;
use crate::types::DataType;

use super::{RasterIo, RasterReader, RasterWriter};

/// Reads successive rows of one band from a flat raw-binary tile file.
pub struct RawReader {
  file: BufReader<File>,
  path: PathBuf,
  nsamples: u32,
  datatype: DataType,
}

impl RawReader {
  fn row_bytes(&self) -> u64 {
    self.nsamples as u64 * self.datatype.byte_len()
  }
}

impl RasterReader for RawReader {
  fn read_row(&mut self, row: usize) -> Result<Vec<f64>, MosaicError> {
    let offset = row as u64 * self.row_bytes();
    self.file.seek(SeekFrom::Start(offset)).map_err(|_| MosaicError::Read { path: self.path.clone() })?;

    let mut out = Vec::with_capacity(self.nsamples as usize);
    for _ in 0..self.nsamples {
      let v = match self.datatype {
        DataType::Int8 => self.file.read_i8().map(|x| x as f64),
        DataType::Uint8 => self.file.read_u8().map(|x| x as f64),
        DataType::Int16 => self.file.read_i16::<LittleEndian>().map(|x| x as f64),
        DataType::Uint16 => self.file.read_u16::<LittleEndian>().map(|x| x as f64),
        DataType::Int32 => self.file.read_i32::<LittleEndian>().map(|x| x as f64),
        DataType::Uint32 => self.file.read_u32::<LittleEndian>().map(|x| x as f64),
        DataType::Float32 => self.file.read_f32::<LittleEndian>().map(|x| x as f64),
      }
      .map_err(|_| MosaicError::Read { path: self.path.clone() })?;
      out.push(v);
    }
    Ok(out)
  }

  fn close(&mut self) -> Result<(), MosaicError> {
    Ok(())
  }
}

/// Writes successive rows of one band into a flat raw-binary output file,
/// narrowing from the accumulated `f64` row buffer to the band's output
/// datatype.
pub struct RawWriter {
  file: BufWriter<File>,
  path: PathBuf,
  datatype: DataType,
}

impl RasterWriter for RawWriter {
  fn create_grid(&mut self, _descriptor: &MosaicDescriptor, _band: &BandInfo) -> Result<(), MosaicError> {
    Ok(())
  }

  fn create_field(&mut self, band: &BandInfo) -> Result<(), MosaicError> {
    self.datatype = band.output_datatype;
    Ok(())
  }

  fn write_row(&mut self, _row: usize, data: &[f64]) -> Result<(), MosaicError> {
    for &v in data {
      let result = match self.datatype {
        DataType::Int8 => self.file.write_i8(narrow_i8(v)),
        DataType::Uint8 => self.file.write_u8(narrow_u8(v)),
        DataType::Int16 => self.file.write_i16::<LittleEndian>(narrow_i16(v)),
        DataType::Uint16 => self.file.write_u16::<LittleEndian>(narrow_u16(v)),
        DataType::Int32 => self.file.write_i32::<LittleEndian>(narrow_i32(v)),
        DataType::Uint32 => self.file.write_u32::<LittleEndian>(narrow_u32(v)),
        DataType::Float32 => self.file.write_f32::<LittleEndian>(v as f32),
      };
      result.map_err(|_| MosaicError::Write { path: self.path.clone() })?;
    }
    Ok(())
  }

  fn close(&mut self) -> Result<(), MosaicError> {
    self.file.flush().map_err(|_| MosaicError::Write { path: self.path.clone() })
  }
}

fn narrow_i8(v: f64) -> i8 {
  v.clamp(i8::MIN as f64, i8::MAX as f64) as i8
}
fn narrow_u8(v: f64) -> u8 {
  v.clamp(u8::MIN as f64, u8::MAX as f64) as u8
}
fn narrow_i16(v: f64) -> i16 {
  v.clamp(i16::MIN as f64, i16::MAX as f64) as i16
}
fn narrow_u16(v: f64) -> u16 {
  v.clamp(u16::MIN as f64, u16::MAX as f64) as u16
}
fn narrow_i32(v: f64) -> i32 {
  v.clamp(i32::MIN as f64, i32::MAX as f64) as i32
}
fn narrow_u32(v: f64) -> u32 {
  v.clamp(u32::MIN as f64, u32::MAX as f64) as u32
}

/// The raw-binary [`RasterIo`] implementation. Raw binary has no internal
/// grid/field structure, so `create_grid`/`create_field` are no-ops; the
/// caller opens a fresh writer per band/file instead.
pub struct RawRasterIo;

impl RasterIo for RawRasterIo {
  fn open_reader(&self, path: &Path, band: &BandInfo) -> Result<Box<dyn RasterReader>, MosaicError> {
    let file = File::open(path).map_err(|_| MosaicError::OpenRead { path: path.to_path_buf() })?;
    Ok(Box::new(RawReader {
      file: BufReader::new(file),
      path: path.to_path_buf(),
      nsamples: band.nsamples,
      datatype: band.input_datatype,
    }))
  }

  fn open_writer(&self, path: &Path, descriptor: &MosaicDescriptor) -> Result<Box<dyn RasterWriter>, MosaicError> {
    let file = OpenOptions::new()
      .create(true)
      .write(true)
      .truncate(true)
      .open(path)
      .map_err(|_| MosaicError::OpenWrite { path: path.to_path_buf() })?;
    let datatype = descriptor
      .bands
      .iter()
      .find(|b| b.selected)
      .map(|b| b.output_datatype)
      .unwrap_or(DataType::Uint8);
    Ok(Box::new(RawWriter { file: BufWriter::new(file), path: path.to_path_buf(), datatype }))
  }

  fn output_path_for_band(&self, base: &Path, band: &BandInfo, descriptor: &MosaicDescriptor) -> PathBuf {
    let selected_count = descriptor.bands.iter().filter(|b| b.selected).count();
    if selected_count <= 1 {
      return base.to_path_buf();
    }
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let ext = base.extension().and_then(|e| e.to_str());
    let filename = match ext {
      Some(ext) => format!("{stem}.{}.{ext}", band.name),
      None => format!("{stem}.{}", band.name),
    };
    base.with_file_name(filename)
  }
}
