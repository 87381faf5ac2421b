use fxhash::FxHashMap;

use crate::error::{Error, Result};
use crate::netlist::{CellId, Module, SigBit, SigMap, WireId};
use crate::sim::function_table::FunctionTable;
use crate::sim::order::{port_bit, CellKind};

/// Simulation of all input patterns at once, one bit of a 64-bit word per pattern
///
/// Each primary input gets the table of its variable, so that every gate
/// evaluates the whole truth table in a single bitwise operation.
pub struct TruthTableSimulator<'a> {
    module: &'a Module,
    sigmap: &'a SigMap,
    nb_vars: usize,
    values: FxHashMap<SigBit, FunctionTable>,
}

impl<'a> TruthTableSimulator<'a> {
    /// Create a simulator for a module with the given number of input variables
    pub fn new(module: &'a Module, sigmap: &'a SigMap, nb_vars: usize) -> TruthTableSimulator<'a> {
        let mut values = FxHashMap::default();
        values.insert(SigBit::zero(), FunctionTable::zero(nb_vars));
        values.insert(SigBit::one(), FunctionTable::one(nb_vars));
        TruthTableSimulator {
            module,
            sigmap,
            nb_vars,
            values,
        }
    }

    /// Assign each primary input the table of its position
    pub fn set_inputs(&mut self, inputs: &[WireId]) {
        assert_eq!(inputs.len(), self.nb_vars);
        for (i, w) in inputs.iter().enumerate() {
            let bit = self.sigmap.map_bit(SigBit::from_wire(*w));
            self.values
                .insert(bit, FunctionTable::nth_var(self.nb_vars, i));
        }
    }

    /// Current value of a cell input
    fn get_value(&self, c: CellId, port: &str) -> Result<FunctionTable> {
        let cell = self.module.cell(c);
        port_bit(self.sigmap, cell, port)
            .and_then(|b| self.values.get(&b).copied())
            .ok_or_else(|| Error::UndrivenInput {
                module: self.module.name().to_owned(),
                cell: cell.name().to_owned(),
            })
    }

    /// Evaluate the cells in the given order; drivers must come first
    pub fn run(&mut self, order: &[CellId]) -> Result<()> {
        let module = self.module;
        for c in order {
            let cell = module.cell(*c);
            let val = match CellKind::classify(cell.cell_type()) {
                CellKind::And => self.get_value(*c, "A")? & self.get_value(*c, "B")?,
                CellKind::Not => !self.get_value(*c, "A")?,
                _ => continue,
            };
            if let Some(y) = port_bit(self.sigmap, cell, "Y") {
                self.values.insert(y, val);
            }
        }
        Ok(())
    }

    /// Tables of the given outputs, in order
    pub fn output_values(&self, outputs: &[WireId]) -> Result<Vec<FunctionTable>> {
        let mut ret = Vec::new();
        for w in outputs {
            let bit = self.sigmap.map_bit(SigBit::from_wire(*w));
            match self.values.get(&bit) {
                Some(v) => ret.push(*v),
                None => {
                    return Err(Error::UndrivenOutput {
                        module: self.module.name().to_owned(),
                        port: self.module.wire(*w).name().to_owned(),
                    })
                }
            }
        }
        Ok(ret)
    }
}
