//! Read and write gate-level designs to files

mod bench;
mod blif;
mod utils;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub use bench::read_bench;
pub use blif::{read_blif, write_blif};

use crate::error::{Error, Result};
use crate::netlist::Design;

fn extension(path: &Path) -> String {
    path.extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Read a design from a file
///
/// Following extensions are supported: .blif, .bench.
/// The module read from a .bench file is named after the file stem.
pub fn read_design_file(path: &Path) -> Result<Design> {
    match extension(path).as_str() {
        "blif" => read_blif(File::open(path)?),
        "bench" => {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "top".to_owned());
            read_bench(File::open(path)?, &name)
        }
        ext => Err(Error::UnknownExtension(ext.to_owned())),
    }
}

/// Write a design to a file
///
/// Following extensions are supported: .blif
pub fn write_design_file(path: &Path, design: &Design) -> Result<()> {
    match extension(path).as_str() {
        "blif" => {
            let mut f = BufWriter::new(File::create(path)?);
            write_blif(&mut f, design)?;
            f.flush()?;
            Ok(())
        }
        ext => Err(Error::UnknownExtension(ext.to_owned())),
    }
}
