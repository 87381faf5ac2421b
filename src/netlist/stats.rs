//! Compute cell statistics
//!
//! ```
//! # use cellmatch::netlist::Module;
//! # let module = Module::new("top");
//! use cellmatch::netlist::stats::stats;
//! let stats = stats(&module);
//!
//! // Check that there is no flip-flop
//! assert_eq!(stats.nb_sequential, 0);
//!
//! // Show the statistics
//! println!("{}", stats);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use crate::netlist::Module;
use crate::sim::CellKind;

/// Number of ports and cells in a module
#[derive(Clone, Debug)]
pub struct ModuleStats {
    /// Number of input bits
    pub nb_inputs: usize,
    /// Number of output bits
    pub nb_outputs: usize,
    /// Number of ports wider than one bit
    pub nb_wide_ports: usize,
    /// Number of 2-input And gates
    pub nb_and: usize,
    /// Number of inverters
    pub nb_not: usize,
    /// Number of flip-flops and latches
    pub nb_sequential: usize,
    /// Number of timing annotations
    pub nb_annotation: usize,
    /// Number of alias connections (buffers)
    pub nb_alias: usize,
    /// Number of cells of other types, by type
    pub other: BTreeMap<String, usize>,
}

impl ModuleStats {
    /// Total number of cells, including annotations
    pub fn nb_cells(&self) -> usize {
        self.nb_and
            + self.nb_not
            + self.nb_sequential
            + self.nb_annotation
            + self.other.values().sum::<usize>()
    }
}

impl fmt::Display for ModuleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stats:")?;
        writeln!(f, "  Inputs: {}", self.nb_inputs)?;
        writeln!(f, "  Outputs: {}", self.nb_outputs)?;
        if self.nb_wide_ports != 0 {
            writeln!(f, "  Wide ports: {}", self.nb_wide_ports)?;
        }
        writeln!(f, "  Cells: {}", self.nb_cells())?;
        if self.nb_and != 0 {
            writeln!(f, "  And: {}", self.nb_and)?;
        }
        if self.nb_not != 0 {
            writeln!(f, "  Not: {}", self.nb_not)?;
        }
        if self.nb_sequential != 0 {
            writeln!(f, "  Sequential: {}", self.nb_sequential)?;
        }
        if self.nb_annotation != 0 {
            writeln!(f, "  Annotations: {}", self.nb_annotation)?;
        }
        if self.nb_alias != 0 {
            writeln!(f, "  Buf: {}", self.nb_alias)?;
        }
        for (tp, nb) in &self.other {
            writeln!(f, "  {}: {}", tp, nb)?;
        }
        fmt::Result::Ok(())
    }
}

/// Compute the statistics of the module
pub fn stats(m: &Module) -> ModuleStats {
    let mut ret = ModuleStats {
        nb_inputs: 0,
        nb_outputs: 0,
        nb_wide_ports: 0,
        nb_and: 0,
        nb_not: 0,
        nb_sequential: 0,
        nb_annotation: 0,
        nb_alias: m.connections().len(),
        other: BTreeMap::new(),
    };
    for w in m.ports() {
        let wire = m.wire(*w);
        if wire.is_input() {
            ret.nb_inputs += wire.width();
        }
        if wire.is_output() {
            ret.nb_outputs += wire.width();
        }
        if wire.width() > 1 {
            ret.nb_wide_ports += 1;
        }
    }
    for (_, c) in m.cells() {
        match CellKind::classify(c.cell_type()) {
            CellKind::And => ret.nb_and += 1,
            CellKind::Not => ret.nb_not += 1,
            CellKind::Sequential => ret.nb_sequential += 1,
            CellKind::Annotation => ret.nb_annotation += 1,
            CellKind::Unsupported => *ret.other.entry(c.cell_type().to_owned()).or_default() += 1,
        }
    }
    ret
}

#[cfg(test)]
mod tests {
    use super::stats;
    use crate::netlist::{Module, PortDirection};

    #[test]
    fn test_stats() {
        let mut m = Module::new("m");
        m.add_port("a", 1, PortDirection::Input);
        m.add_port("b", 4, PortDirection::Input);
        m.add_port("y", 1, PortDirection::Output);
        m.add_cell("g0", "$_AND_");
        m.add_cell("g1", "$_NOT_");
        m.add_cell("g2", "$_NOT_");
        m.add_cell("ff", "$_DFF_P_");
        m.add_cell("s", "$specify2");
        m.add_cell("l", "$lut");
        let s = stats(&m);
        assert_eq!(s.nb_inputs, 5);
        assert_eq!(s.nb_outputs, 1);
        assert_eq!(s.nb_wide_ports, 1);
        assert_eq!(s.nb_and, 1);
        assert_eq!(s.nb_not, 2);
        assert_eq!(s.nb_sequential, 1);
        assert_eq!(s.nb_annotation, 1);
        assert_eq!(s.other["$lut"], 1);
        assert_eq!(s.nb_cells(), 6);
    }
}
