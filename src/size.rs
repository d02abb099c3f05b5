//! Predicts an HDF-EOS output's byte size and checks it against the HDF v4
//! file-size ceiling.

use crate::band::BandInfo;
use crate::constants::{HDF_V4_SIZE_LIMIT, SIZE_WARNING_MARGIN};
use crate::error::MosaicError;

/// Sums `nlines * nsamples * bytes_per_sample` over the selected bands.
pub fn estimate_size(bands: &[BandInfo]) -> u64 {
  bands
    .iter()
    .filter(|b| b.selected)
    .map(|b| b.nlines as u64 * b.nsamples as u64 * b.output_datatype.byte_len())
    .sum()
}

/// Checks an estimated size against the HDF v4 ceiling, logging a warning
/// when close to the limit and failing when over it.
pub fn check_size(bytes: u64) -> Result<(), MosaicError> {
  if bytes > HDF_V4_SIZE_LIMIT {
    return Err(MosaicError::SizeExceeded { bytes, limit: HDF_V4_SIZE_LIMIT });
  }
  if HDF_V4_SIZE_LIMIT - bytes < SIZE_WARNING_MARGIN {
    log::warn!(
      "estimated output size {} is within {} bytes of the HDF v4 limit",
      format_with_commas(bytes),
      SIZE_WARNING_MARGIN
    );
  }
  Ok(())
}

/// Renders a byte count with thousands separators, e.g. `3,221,225,472`.
pub fn format_with_commas(bytes: u64) -> String {
  let digits = bytes.to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  let total = digits.len();
  for (i, ch) in digits.chars().enumerate() {
    if i > 0 && (total - i) % 3 == 0 {
      out.push(',');
    }
    out.push(ch);
  }
  out
}
