use crate::error::{Error, Result};
use crate::netlist::{Module, Wire, WireId};

/// Return the module's single-bit ports matching a predicate, in declaration order
fn module_ports<F: Fn(&Wire) -> bool>(m: &Module, pred: F) -> Result<Vec<WireId>> {
    let mut ret = Vec::new();
    for w in m.ports() {
        let wire = m.wire(*w);
        if !pred(wire) {
            continue;
        }
        if wire.width() != 1 {
            return Err(Error::WidePort {
                module: m.name().to_owned(),
                wire: wire.name().to_owned(),
                width: wire.width(),
            });
        }
        ret.push(*w);
    }
    Ok(ret)
}

/// Return the module's inputs in canonical order
pub fn module_inputs(m: &Module) -> Result<Vec<WireId>> {
    module_ports(m, |w| w.is_input())
}

/// Return the module's outputs in canonical order
pub fn module_outputs(m: &Module) -> Result<Vec<WireId>> {
    module_ports(m, |w| w.is_output())
}
