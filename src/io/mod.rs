//! Capability interface abstracting over the two concrete tile storage
//! formats, so the executor can stay format-agnostic.

pub mod hdfeos;
pub mod raw;

use crate::band::BandInfo;
use crate::descriptor::MosaicDescriptor;
use crate::error::MosaicError;

/// A single open input band reader for one tile, positioned to read
/// successive rows.
pub trait RasterReader {
  /// Reads one row of `nsamples` values, widened to `f64` regardless of the
  /// underlying on-disk datatype.
  fn read_row(&mut self, row: usize) -> Result<Vec<f64>, MosaicError>;

  /// Releases the underlying file handle. Called on every exit path,
  /// success or failure, by the owning [`ReaderGuard`].
  fn close(&mut self) -> Result<(), MosaicError>;
}

/// A single open output band writer, positioned to write successive rows.
pub trait RasterWriter {
  /// Writes one row, narrowing from `f64` back to the band's output
  /// datatype.
  fn write_row(&mut self, row: usize, data: &[f64]) -> Result<(), MosaicError>;

  /// Declares a new grid geometry for a resolution change. A no-op for
  /// formats without an internal grid concept (raw binary).
  fn create_grid(&mut self, descriptor: &MosaicDescriptor, band: &BandInfo) -> Result<(), MosaicError>;

  /// Declares a new field (band) within the current grid.
  fn create_field(&mut self, band: &BandInfo) -> Result<(), MosaicError>;

  /// Records each input tile's path as lineage, under an `"Old" + name`
  /// attribute the way HDF-EOS output preserves per-file metadata forward.
  /// A no-op for formats with no attribute concept (raw binary).
  fn record_lineage(&mut self, _source_paths: &[std::path::PathBuf]) {}

  fn close(&mut self) -> Result<(), MosaicError>;
}

/// Format-specific factory: opens readers/writers for one concrete storage
/// format.
pub trait RasterIo {
  fn open_reader(&self, path: &std::path::Path, band: &BandInfo) -> Result<Box<dyn RasterReader>, MosaicError>;

  fn open_writer(
    &self,
    path: &std::path::Path,
    descriptor: &MosaicDescriptor,
  ) -> Result<Box<dyn RasterWriter>, MosaicError>;

  /// The file a given band's output belongs in. HDF-EOS holds every band
  /// in one file (the default); raw binary has no multi-band container, so
  /// its implementation gives each band its own file when there is more
  /// than one selected band.
  fn output_path_for_band(&self, base: &std::path::Path, _band: &BandInfo, _descriptor: &MosaicDescriptor) -> std::path::PathBuf {
    base.to_path_buf()
  }
}

/// Guarantees `close()` runs on every exit path, including early returns
/// via `?`, the way the scoped acquisition/release discipline requires.
pub struct ReaderGuard {
  inner: Option<Box<dyn RasterReader>>,
}

impl ReaderGuard {
  pub fn new(inner: Box<dyn RasterReader>) -> Self {
    ReaderGuard { inner: Some(inner) }
  }

  pub fn read_row(&mut self, row: usize) -> Result<Vec<f64>, MosaicError> {
    self.inner.as_mut().expect("reader used after close").read_row(row)
  }
}

impl Drop for ReaderGuard {
  fn drop(&mut self) {
    if let Some(mut r) = self.inner.take() {
      if let Err(e) = r.close() {
        log::warn!("error closing input reader: {e}");
      }
    }
  }
}

/// Same discipline as [`ReaderGuard`], for the output side.
pub struct WriterGuard {
  inner: Option<Box<dyn RasterWriter>>,
}

impl WriterGuard {
  pub fn new(inner: Box<dyn RasterWriter>) -> Self {
    WriterGuard { inner: Some(inner) }
  }

  pub fn write_row(&mut self, row: usize, data: &[f64]) -> Result<(), MosaicError> {
    self.inner.as_mut().expect("writer used after close").write_row(row, data)
  }

  pub fn create_grid(&mut self, descriptor: &MosaicDescriptor, band: &BandInfo) -> Result<(), MosaicError> {
    self.inner.as_mut().expect("writer used after close").create_grid(descriptor, band)
  }

  pub fn create_field(&mut self, band: &BandInfo) -> Result<(), MosaicError> {
    self.inner.as_mut().expect("writer used after close").create_field(band)
  }

  pub fn record_lineage(&mut self, source_paths: &[std::path::PathBuf]) {
    self.inner.as_mut().expect("writer used after close").record_lineage(source_paths);
  }

  /// Closes explicitly, surfacing the error instead of only logging it.
  /// Safe to call before drop; drop becomes a no-op afterwards.
  pub fn close(&mut self) -> Result<(), MosaicError> {
    match self.inner.take() {
      Some(mut w) => w.close(),
      None => Ok(()),
    }
  }
}

impl Drop for WriterGuard {
  fn drop(&mut self) {
    if let Some(mut w) = self.inner.take() {
      if let Err(e) = w.close() {
        log::warn!("error closing output writer: {e}");
      }
    }
  }
}
