use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

use structopt::clap::AppSettings;
use structopt::StructOpt;

use mrtmosaiclib::compat::check_compatibility;
use mrtmosaiclib::descriptor::TileDescriptor;
use mrtmosaiclib::error::MosaicError;
use mrtmosaiclib::executor::execute_mosaic;
use mrtmosaiclib::filelist::{parse_file_list, ProcessEnv};
use mrtmosaiclib::hdr::write_header;
use mrtmosaiclib::io::raw::RawRasterIo;
use mrtmosaiclib::io::RasterIo;
use mrtmosaiclib::metadata::read_tile_descriptor;
use mrtmosaiclib::planner::{plan_mosaic, ProjectionFailure};
use mrtmosaiclib::size::{check_size, estimate_size, format_with_commas};
use mrtmosaiclib::tilename::parse_tile_indices;
use mrtmosaiclib::types::{FileType, ProjectionCode};

#[derive(Debug, StructOpt)]
#[structopt(
  name = "mrtmosaic",
  global_settings = &[AppSettings::DisableHelpFlags, AppSettings::ColoredHelp]
)]
/// Stitches MODIS Sinusoidal/Integerized Sinusoidal tiles (HDF-EOS or raw
/// binary) into a single mosaicked product.
struct Args {
  #[structopt(short = "i", long = "input_filename", parse(from_os_str))]
  /// Path to a text file listing the input tile filenames.
  input: Option<PathBuf>,

  #[structopt(short = "o", long = "output_filename", parse(from_os_str))]
  /// Output filename. Its extension determines the output file type.
  output: Option<PathBuf>,

  #[structopt(short = "s", long = "spectral_subset")]
  /// Spectral subset as a string of 0/1, e.g. "1 0 1". Defaults to all bands.
  bandstr: Option<String>,

  #[structopt(short = "t")]
  /// Determine tiles: write tile.txt and exit without mosaicking.
  determine_tiles: bool,

  #[structopt(short = "h")]
  /// Write the mosaic header (TmpHdr.hdr, or the -o path) and exit.
  write_header: bool,

  #[structopt(short = "g", long = "log_filename", parse(from_os_str))]
  /// Additional log file to mirror diagnostics into.
  log: Option<PathBuf>,
}

fn main() {
  let args = Args::from_args();
  init_logging(args.log.as_deref());

  if let Err(e) = run(args) {
    log::error!("{e}");
    std::process::exit(1);
  }
}

fn init_logging(log_path: Option<&std::path::Path>) {
  use std::io::Write as _;

  let mut builder = env_logger::Builder::from_default_env();
  builder.format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()));

  if let Some(path) = log_path {
    if let Ok(file) = File::create(path) {
      let target = std::sync::Arc::new(std::sync::Mutex::new(file));
      builder.target(env_logger::Target::Pipe(Box::new(MirrorToFile { file: target })));
    }
  }
  builder.init();
}

/// Writes every log record to stderr (via the default env_logger pipe
/// contract) and mirrors a copy into the `-g` log file.
struct MirrorToFile {
  file: std::sync::Arc<std::sync::Mutex<File>>,
}

impl std::io::Write for MirrorToFile {
  fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
    std::io::stderr().write_all(buf)?;
    if let Ok(mut f) = self.file.lock() {
      let _ = f.write_all(buf);
    }
    Ok(buf.len())
  }

  fn flush(&mut self) -> std::io::Result<()> {
    std::io::stderr().flush()
  }
}

fn detect_file_type(path: &std::path::Path) -> FileType {
  match path.extension().and_then(|e| e.to_str()) {
    Some(ext) if ext.eq_ignore_ascii_case("hdf") => FileType::HdfEos,
    _ => FileType::RawBinary,
  }
}

fn raster_io_for(file_type: FileType) -> Box<dyn RasterIo> {
  match file_type {
    FileType::RawBinary => Box::new(RawRasterIo),
    FileType::HdfEos => Box::new(mrtmosaiclib::io::hdfeos::HdfEosRasterIo),
  }
}

/// Parses the `-s` spectral subset string into a mask over band indices.
/// Any character other than `0`/`1`/whitespace is a syntax error.
fn parse_band_subset(s: &str) -> Result<Vec<bool>, MosaicError> {
  let mut mask = Vec::new();
  for c in s.chars() {
    match c {
      '0' => mask.push(false),
      '1' => mask.push(true),
      c if c.is_whitespace() => continue,
      other => return Err(MosaicError::syntax(format!("invalid character in band subset: {other:?}"))),
    }
  }
  Ok(mask)
}

fn apply_band_subset(tiles: &mut [TileDescriptor], mask: &[bool]) {
  for tile in tiles.iter_mut() {
    for (i, band) in tile.bands.iter_mut().enumerate() {
      band.selected = mask.get(i).copied().unwrap_or(true);
    }
  }
}

fn read_input_paths(list_path: &std::path::Path) -> Result<Vec<PathBuf>, MosaicError> {
  let content = std::fs::read_to_string(list_path).map_err(|_| MosaicError::OpenRead { path: list_path.to_path_buf() })?;
  let names = parse_file_list(&content, &ProcessEnv)?;
  Ok(names.into_iter().map(PathBuf::from).collect())
}

/// A no-op inverse projector: the real GCTP library is an external
/// collaborator (see PURPOSE & SCOPE). Always reports a range error so the
/// planner exercises its documented fallback. With no real projection
/// available, the partial lat/lon a failing GCTP call would have written is
/// reported as the origin rather than fabricated from unrelated data.
fn no_projector(
  _p: ProjectionCode,
  _params: &[f64; 15],
  _x: f64,
  _y: f64,
) -> Result<(f64, f64), (ProjectionFailure, f64, f64)> {
  Err((ProjectionFailure::RangeError, 0.0, 0.0))
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
  let has_input = args.input.is_some();
  let has_output = args.output.is_some();

  // Valid combinations: (-i + -o), (-i + -t), (-h alone or with -i).
  let valid = args.write_header || (has_input && (has_output || args.determine_tiles));
  if !valid {
    return Err(Box::new(MosaicError::Usage));
  }

  if !has_input {
    // `-h` without `-i`: nothing to plan a header from.
    return Err(Box::new(MosaicError::Usage));
  }

  let input_paths = read_input_paths(args.input.as_ref().expect("checked above"))?;
  if input_paths.is_empty() {
    return Err(Box::new(MosaicError::general("input file list is empty")));
  }

  let file_type = detect_file_type(&input_paths[0]);
  if let Some(output) = &args.output {
    if detect_file_type(output) != file_type {
      return Err(Box::new(MosaicError::Mismatch {
        field: mrtmosaiclib::error::MismatchField::FileType,
        band: None,
        left: input_paths[0].clone(),
        right: output.clone(),
      }));
    }
  }

  if args.determine_tiles {
    run_determine_tiles(&input_paths)?;
    return Ok(());
  }

  let mut tiles = Vec::with_capacity(input_paths.len());
  for path in &input_paths {
    tiles.push(read_tile_descriptor(path, file_type)?);
  }
  check_compatibility(&tiles)?;

  if let Some(bandstr) = &args.bandstr {
    let mask = parse_band_subset(bandstr)?;
    apply_band_subset(&mut tiles, &mask);
  }

  let output_path = args.output.clone().unwrap_or_else(|| PathBuf::from("TmpHdr.hdr"));
  let plan = plan_mosaic(&tiles, output_path.clone(), &no_projector)?;

  if args.write_header {
    write_header(&plan.descriptor, &output_path)?;
    log::info!("wrote mosaic header to {}", output_path.display());
  }

  if args.output.is_none() {
    return Ok(());
  }

  if file_type == FileType::HdfEos {
    let bytes = estimate_size(&plan.descriptor.bands);
    check_size(bytes)?;
    log::info!("estimated output size: {} bytes", format_with_commas(bytes));
  }

  let io = raster_io_for(file_type);
  execute_mosaic(&tiles, &plan.grid, &plan.descriptor, io.as_ref())?;
  log::info!("wrote mosaic to {}", plan.descriptor.path.display());

  Ok(())
}

fn run_determine_tiles(paths: &[PathBuf]) -> Result<(), MosaicError> {
  let mut out = String::new();
  for path in paths {
    let (h, v) = parse_tile_indices(path)?;
    out.push_str(&format!("{h}, {v}\n"));
  }
  std::fs::write("tile.txt", out).map_err(|_| MosaicError::OpenWrite { path: PathBuf::from("tile.txt") })
}
