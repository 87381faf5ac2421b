//! Command line interface

use std::path::{Path, PathBuf};

use cellmatch::io::{read_design_file, write_design_file};
use cellmatch::netlist::stats::stats;
use cellmatch::netlist::{Design, Module};
use cellmatch::sim::{derive_function_tables, module_inputs, module_outputs};
use cellmatch::techmap::{canonical_label, LUT_ATTR, MAP_DESIGN, P_CLASS_ATTR};
use cellmatch::{CellMatch, DesignRegistry, Error, FunctionTable, LibraryIndex, Result};
use clap::{Args, Parser, Subcommand};
use kdam::{tqdm, BarExt};

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Command line arguments
#[derive(Subcommand)]
pub enum Commands {
    /// Match the modules of a design against a cell library
    ///
    /// Each combinational module with up to 6 single-bit inputs is compared to
    /// the library modules. A techmap rule is written for every library module
    /// computing the same functions up to a permutation of inputs and outputs.
    #[clap()]
    Match(MatchArgs),

    /// Show statistics about the modules of a design
    ///
    /// Will print the number of inputs, outputs and cells of each kind.
    #[clap()]
    Show(ShowArgs),

    /// Show the function tables of the modules of a design
    ///
    /// Will print the truth table and canonical label of each output, in hexadecimal.
    #[clap(alias = "tables")]
    Luts(LutsArgs),
}

impl Commands {
    /// Run the command
    pub fn run(&self) -> Result<()> {
        match self {
            Commands::Match(a) => a.run(),
            Commands::Show(a) => a.run(),
            Commands::Luts(a) => a.run(),
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Index the modules of a library, with a progress bar
fn index_library(library: &Design) -> Result<LibraryIndex> {
    let mut index = LibraryIndex::new();
    let mut progress = tqdm!(total = library.nb_modules());
    progress.set_description("Library modules indexed");
    for m in library.modules() {
        index.insert(m)?;
        progress.update(1)?;
    }
    if index.is_empty() {
        progress.write("No combinational module found in the library".to_owned())?;
    } else {
        progress.write(format!(
            "Indexed {} library modules with {} distinct fingerprints",
            index.nb_targets(),
            index.nb_fingerprints()
        ))?;
    }
    Ok(index)
}

/// Command arguments for library matching
#[derive(Args)]
pub struct MatchArgs {
    /// Design whose modules are matched
    design: PathBuf,

    /// Cell library, registered under its file stem
    #[arg(short = 'l', long)]
    lib: Option<PathBuf>,

    /// Output file for the techmap rules
    #[arg(short = 'o', long, default_value = "cellmatch_map.blif")]
    output: PathBuf,

    /// Only match the modules with these names. All modules by default
    #[arg(short = 'm', long = "module")]
    modules: Vec<String>,

    /// Annotate the outputs with their function table and canonical label
    #[arg(long)]
    lut_attrs: bool,

    /// Add the rules to an existing output file
    #[arg(long)]
    append: bool,
}

impl MatchArgs {
    fn is_selected(&self, m: &Module) -> bool {
        self.modules.is_empty() || self.modules.iter().any(|n| n == m.name())
    }

    pub fn run(&self) -> Result<()> {
        let mut design = read_design_file(&self.design)?;
        let mut registry = DesignRegistry::new();
        if self.append && self.output.exists() {
            registry.insert(MAP_DESIGN, read_design_file(&self.output)?);
        }

        let index = match &self.lib {
            Some(path) => {
                let name = file_stem(path);
                registry.insert(&name, read_design_file(path)?);
                let library = registry
                    .get(&name)
                    .ok_or_else(|| Error::MissingDesign(name.clone()))?;
                index_library(library)?
            }
            None if self.lut_attrs => LibraryIndex::new(),
            None => return Err(Error::MissingLibrary),
        };

        let pass = CellMatch {
            lut_attrs: self.lut_attrs,
        };
        let report =
            pass.run_with_index(&mut design, |m| self.is_selected(m), &index, &mut registry)?;
        print!("{}", report);

        if self.lut_attrs {
            for m in design.modules().filter(|m| self.is_selected(m)) {
                print_output_attrs(m)?;
            }
        }

        write_design_file(&self.output, registry.get_or_create(MAP_DESIGN))
    }
}

/// Print the annotations left on the outputs by the pass
fn print_output_attrs(m: &Module) -> Result<()> {
    let nb_inputs = module_inputs(m)?.len();
    for w in module_outputs(m)? {
        let wire = m.wire(w);
        let (Some(lut), Some(p_class)) = (
            wire.attributes.get(LUT_ATTR).and_then(|v| v.as_int()),
            wire.attributes.get(P_CLASS_ATTR).and_then(|v| v.as_int()),
        ) else {
            continue;
        };
        println!(
            "{}.{}: lut={} p_class={}",
            m.name(),
            wire.name(),
            FunctionTable::new(nb_inputs, lut),
            FunctionTable::new(nb_inputs, p_class)
        );
    }
    Ok(())
}

/// Command arguments for design statistics
#[derive(Args)]
pub struct ShowArgs {
    /// Design to show
    file: PathBuf,
}

impl ShowArgs {
    pub fn run(&self) -> Result<()> {
        let design = read_design_file(&self.file)?;
        for m in design.modules() {
            println!("Module {}:\n{}", m.name(), stats(m));
        }
        Ok(())
    }
}

/// Command arguments for function tables
#[derive(Args)]
pub struct LutsArgs {
    /// Design to analyze
    file: PathBuf,
}

impl LutsArgs {
    pub fn run(&self) -> Result<()> {
        let design = read_design_file(&self.file)?;
        for m in design.modules() {
            let Some(tables) = derive_function_tables(m)? else {
                println!("Module {}: skipped", m.name());
                continue;
            };
            println!("Module {}:", m.name());
            for (w, t) in module_outputs(m)?.into_iter().zip(&tables) {
                println!(
                    "  {}: lut={} p_class={}",
                    m.wire(w).name(),
                    t,
                    canonical_label(t)
                );
            }
        }
        Ok(())
    }
}
