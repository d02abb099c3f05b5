//! Small value types shared across the descriptor, planner, and I/O layers.

use std::fmt;

/// Which of the two concrete storage formats a tile or mosaic uses.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FileType {
  RawBinary,
  HdfEos,
}

impl fmt::Display for FileType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FileType::RawBinary => write!(f, "raw binary"),
      FileType::HdfEos => write!(f, "HDF-EOS"),
    }
  }
}

/// Index into the four corners of a tile or mosaic's projected/geographic
/// extent. `Corner as usize` gives the array position.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Corner {
  Ul = 0,
  Ur = 1,
  Ll = 2,
  Lr = 3,
}

impl Corner {
  pub const ALL: [Corner; 4] = [Corner::Ul, Corner::Ur, Corner::Ll, Corner::Lr];
}

/// GCTP projection codes, enumerated the way `proj_prn.c` switches over them.
/// Only `Sinusoidal` and `IntegerizedSinusoidal` are legal mosaic inputs; the
/// rest exist so compatibility checking and mismatch reporting have a real
/// enum to compare rather than a bare integer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ProjectionCode {
  Geographic,
  Utm,
  StatePlane,
  Albers,
  LambertConformalConic,
  Mercator,
  PolarStereographic,
  Polyconic,
  EquidistantConic,
  TransverseMercator,
  Stereographic,
  LambertAzimuthal,
  AzimuthalEquidistant,
  Gnomonic,
  Orthographic,
  GeneralVerticalNearSidePerspective,
  Sinusoidal,
  Equirectangular,
  MillerCylindrical,
  VanDerGrinten,
  ObliqueMercator,
  Robinson,
  SpaceObliqueMercator,
  AlaskaConformal,
  InterruptedGoode,
  Mollweide,
  InterruptedMollweide,
  Hammer,
  WagnerIv,
  WagnerVii,
  ObliqueEqualArea,
  IntegerizedSinusoidal,
}

impl ProjectionCode {
  /// Whether this projection is one of the two the mosaic engine accepts.
  pub fn is_modis_grid(self) -> bool {
    matches!(self, ProjectionCode::Sinusoidal | ProjectionCode::IntegerizedSinusoidal)
  }
}

impl fmt::Display for ProjectionCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}

/// GCTP datum codes. The tool only ever compares these for equality across
/// inputs, so the exact enumeration order is not load-bearing.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DatumCode {
  Clarke1866,
  Clarke1880,
  Bessel,
  InternationalEllipsoid1924,
  Wgs72,
  Everest,
  Wgs66,
  Grs1980,
  Airy,
  ModifiedEverest,
  ModifiedAiry,
  Wgs84,
  Sphere,
  NoDatum,
}

/// On-disk/in-memory pixel data type, per band.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DataType {
  Int8,
  Uint8,
  Int16,
  Uint16,
  Int32,
  Uint32,
  Float32,
}

impl DataType {
  /// Size of one sample in bytes.
  pub fn byte_len(self) -> u64 {
    match self {
      DataType::Int8 | DataType::Uint8 => 1,
      DataType::Int16 | DataType::Uint16 => 2,
      DataType::Int32 | DataType::Uint32 | DataType::Float32 => 4,
    }
  }
}

impl fmt::Display for DataType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      DataType::Int8 => "INT8",
      DataType::Uint8 => "UINT8",
      DataType::Int16 => "INT16",
      DataType::Uint16 => "UINT16",
      DataType::Int32 => "INT32",
      DataType::Uint32 => "UINT32",
      DataType::Float32 => "FLOAT32",
    };
    write!(f, "{s}")
  }
}

/// Geographic bounding box, degrees.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct GeoBoundingBox {
  pub north: f64,
  pub south: f64,
  pub east: f64,
  pub west: f64,
}

impl GeoBoundingBox {
  /// The degenerate all-zero box the planner treats as "unavailable".
  pub fn is_all_zero(&self) -> bool {
    self.north == 0.0 && self.south == 0.0 && self.east == 0.0 && self.west == 0.0
  }
}
