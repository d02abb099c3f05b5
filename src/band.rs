//! Per-band metadata shared by tile and mosaic descriptors.

use crate::types::DataType;

/// Attributes of a single band, as read from one tile on input or
/// accumulated for the mosaic on output.
#[derive(Debug, Clone, PartialEq)]
pub struct BandInfo {
  pub name: String,
  pub grid_name: String,
  pub nlines: u32,
  pub nsamples: u32,
  pub input_datatype: DataType,
  pub output_datatype: DataType,
  pub pixel_size: f64,
  pub rank: u8,
  pub pos: [i32; 4],
  pub fieldnum: i32,
  pub min: Option<f64>,
  pub max: Option<f64>,
  pub background_fill: f64,
  pub scale: f64,
  pub offset: f64,
  pub selected: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> BandInfo {
    BandInfo {
      name: "sur_refl_b01".into(),
      grid_name: "MOD_Grid_500m".into(),
      nlines: 2400,
      nsamples: 2400,
      input_datatype: DataType::Int16,
      output_datatype: DataType::Int16,
      pixel_size: 463.312716525,
      rank: 2,
      pos: [0, 0, 0, 0],
      fieldnum: 0,
      min: Some(-100.0),
      max: Some(16000.0),
      background_fill: -28672.0,
      scale: 1.0,
      offset: 0.0,
      selected: true,
    }
  }

  #[test]
  fn sample_band_round_trips_field_values() {
    let b = sample();
    assert_eq!(b.name, "sur_refl_b01");
    assert_eq!(b.nlines, 2400);
    assert_eq!(b.background_fill, -28672.0);
  }
}
