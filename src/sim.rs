//! Derivation of truth tables for combinational modules
//!
//! Modules made of inverters and 2-input And gates are simulated on all input
//! patterns at once, with one bit of a 64-bit word per pattern. This limits the
//! modules to 6 inputs.

mod function_table;
mod order;
mod ports;
mod simple_sim;

use log::warn;

use crate::error::Result;
use crate::netlist::{Module, SigMap};

pub use function_table::{FunctionTable, MAX_VARS};
pub use order::{combinational_order, CellKind, DependencyGraph};
pub use ports::{module_inputs, module_outputs};
pub use simple_sim::TruthTableSimulator;

/// Compute the truth table of each output of a module, in output order
///
/// Returns `None` if the module is not purely combinational or has more than 6
/// inputs. Unsupported cells, combinational loops and undriven signals are errors.
pub fn derive_function_tables(m: &Module) -> Result<Option<Vec<FunctionTable>>> {
    let sigmap = SigMap::new(m);
    let Some(order) = combinational_order(m, &sigmap)? else {
        return Ok(None);
    };

    let inputs = module_inputs(m)?;
    if inputs.len() > MAX_VARS {
        warn!(
            "Skipping module {} with more than {} inputs bits.",
            m.name(),
            MAX_VARS
        );
        return Ok(None);
    }
    let outputs = module_outputs(m)?;

    let mut sim = TruthTableSimulator::new(m, &sigmap, inputs.len());
    sim.set_inputs(&inputs);
    sim.run(&order)?;
    sim.output_values(&outputs).map(Some)
}
