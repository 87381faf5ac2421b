//! Functional matching of gate-level modules against a cell library
//!
//! This crate finds, for each small combinational module of a design, the cells of a library
//! that compute the same functions up to a permutation of their inputs and outputs.
//! Every match is recorded as a techmap rule: a module with the same ports as the matched
//! module, instantiating the library cell with the right connections.
//!
//! # Usage
//!
//! ```bash
//! # Show available commands
//! # .blif and .bench files are supported
//! cellmatch help
//! # Write the rules mapping the modules of a design to a library
//! cellmatch match mydesign.blif --lib cells.blif -o map.blif
//! # Show the truth tables of the modules
//! cellmatch luts mydesign.blif
//! ```
//!
//! # Development
//!
//! ## Datastructures
//!
//! A [`Design`] is a set of [`Module`]s, each made of named wires, cell instances and alias
//! connections between single bits. Only inverters (`$_NOT_`) and 2-input And gates (`$_AND_`)
//! are simulated: modules are expected to be mapped to this subset before matching.
//!
//! Truth tables are held in a [`FunctionTable`], with one bit per input pattern, so that modules
//! are limited to 6 inputs. Tables are compared up to input permutation through their canonical
//! label, the smallest table among all permutations of the inputs.
//!
//! ## Example
//!
//! Here is a design module matched against a library And gate, with its inputs swapped:
//! ```
//! # use cellmatch::{CellMatch, DesignRegistry};
//! use cellmatch::io::read_blif;
//!
//! let library = read_blif(".model AND2\n.inputs A B\n.outputs Y\n.names A B Y\n11 1\n.end\n".as_bytes()).unwrap();
//! let mut design = read_blif(".model my_and\n.inputs p q\n.outputs y\n.names q p y\n11 1\n.end\n".as_bytes()).unwrap();
//!
//! let mut registry = DesignRegistry::new();
//! let report = CellMatch::default()
//!     .run(&mut design, |_| true, Some(&library), &mut registry)
//!     .unwrap();
//! assert_eq!(report.targets_of("my_and"), vec!["AND2"]);
//! assert_eq!(report.matches[0].rule, "_60_my_and_AND2");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod io;
pub mod netlist;
pub mod sim;
pub mod techmap;

pub use error::{Error, Result};
pub use netlist::{Design, DesignRegistry, Module};
pub use sim::FunctionTable;
pub use techmap::{CellMatch, LibraryIndex};
