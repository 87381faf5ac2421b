//! Representation of gate-level netlists: designs, modules, wires and cells

mod design;
pub mod generators;
mod module;
mod sigmap;
mod signal;
pub mod stats;

pub use design::{Design, DesignRegistry};
pub use module::{AttrValue, Attributes, Cell, Module, PortDirection, Wire};
pub use sigmap::SigMap;
pub use signal::{CellId, SigBit, SigSpec, State, WireId};
