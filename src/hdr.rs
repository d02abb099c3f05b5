//! Writes the raw-binary sidecar header (`TmpHdr.hdr` by default), ported
//! from `output_hdr_mosaic.c`'s ENVI-style `key = value` format.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::descriptor::MosaicDescriptor;
use crate::error::MosaicError;
use crate::types::Corner;

fn corner_name(corner: Corner) -> &'static str {
  match corner {
    Corner::Ul => "UL",
    Corner::Ur => "UR",
    Corner::Ll => "LL",
    Corner::Lr => "LR",
  }
}

/// Writes `descriptor`'s projection, datum, corners, and per-band attributes
/// to `path` as a plain-text sidecar header.
pub fn write_header(descriptor: &MosaicDescriptor, path: &Path) -> Result<(), MosaicError> {
  let mut out = String::new();

  out.push_str("PROJECTION_TYPE = ");
  out.push_str(&descriptor.projection.to_string());
  out.push('\n');
  out.push_str(&format!("DATUM = {:?}\n", descriptor.datum));
  out.push_str(&format!("UTM_ZONE = {}\n", descriptor.zone));

  out.push_str("PROJECTION_PARAMETERS = (");
  for (i, p) in descriptor.projection_params.iter().enumerate() {
    if i > 0 {
      out.push(' ');
    }
    out.push_str(&p.to_string());
  }
  out.push_str(")\n");

  for corner in Corner::ALL {
    let (x, y) = descriptor.proj_corner(corner);
    out.push_str(&format!("{}_CORNER_PROJECTED = ({x}, {y})\n", corner_name(corner)));
  }
  for corner in Corner::ALL {
    let (lat, lon) = descriptor.geo_corner(corner);
    out.push_str(&format!("{}_CORNER_LATLON = ({lat}, {lon})\n", corner_name(corner)));
  }

  out.push_str(&format!("NBANDS = {}\n", descriptor.bands.iter().filter(|b| b.selected).count()));
  for band in descriptor.bands.iter().filter(|b| b.selected) {
    out.push_str(&format!(
      "BAND_NAME = {}\nBAND_NLINES = {}\nBAND_NSAMPLES = {}\nBAND_DATATYPE = {}\nBAND_PIXEL_SIZE = {}\nBAND_BACKGROUND_FILL = {}\n",
      band.name, band.nlines, band.nsamples, band.output_datatype, band.pixel_size, band.background_fill
    ));
  }

  let mut file = File::create(path).map_err(|_| MosaicError::OpenWrite { path: path.to_path_buf() })?;
  file.write_all(out.as_bytes()).map_err(|_| MosaicError::Write { path: path.to_path_buf() })
}
