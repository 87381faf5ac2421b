//! Generation of techmap rules for matched modules

use log::warn;

use crate::error::{Error, Result};
use crate::netlist::{AttrValue, Design, Module, PortDirection, SigBit};
use crate::sim::{module_inputs, module_outputs};
use crate::techmap::Target;

/// Name of the cell replaced by the downstream techmap pass
pub const REPLACE_CELL: &str = "_TECHMAP_REPLACE_";

/// Attribute naming the cell type a rule applies to
pub const CELLTYPE_ATTR: &str = "techmap_celltype";

/// Name of the rule mapping a module to a library target
pub fn rule_name(module: &str, target: &str) -> String {
    format!("_60_{module}_{target}")
}

/// Add a port to a rule module, with the name and position it has in the matched module
fn add_rule_port(rule: &mut Module, name: &str, port_id: usize, direction: PortDirection) -> SigBit {
    let w = match rule.wire_by_name(name) {
        // Inout ports are seen both as inputs and outputs
        Some(w) => {
            rule.set_port(w, PortDirection::InOut, port_id);
            w
        }
        None => {
            let w = rule.add_wire(name, 1);
            rule.set_port(w, direction, port_id);
            w
        }
    };
    SigBit::from(w)
}

/// Returns whether a rule was generated for this module and target
fn is_rule_for(rule: &Module, module: &str, target: &str) -> bool {
    let celltype = rule.attributes.get(CELLTYPE_ATTR).and_then(|v| v.as_str());
    let replaced = rule
        .cell_by_name(REPLACE_CELL)
        .map(|c| rule.cell(c).cell_type());
    celltype == Some(module) && replaced == Some(target)
}

/// Create the rule replacing a module by a library target
///
/// The rule has the same ports as the module and a single cell instantiating
/// the target, with the ports connected according to the permutations found by
/// [`crate::techmap::find_match`].
///
/// A rule previously generated for the same module and target is replaced. A
/// rule of the same name coming from another pair (`a_b` mapped to `c`, and `a`
/// mapped to `b_c`) is an error.
pub fn emit_rule<'a>(
    map_design: &'a mut Design,
    m: &Module,
    target: &Target,
    in_perm: &[usize],
    out_perm: &[usize],
) -> Result<&'a Module> {
    let inputs = module_inputs(m)?;
    let outputs = module_outputs(m)?;
    assert_eq!(inputs.len(), in_perm.len());
    assert_eq!(outputs.len(), out_perm.len());

    let name = rule_name(m.name(), &target.module);
    if let Some(existing) = map_design.module(&name) {
        if !is_rule_for(existing, m.name(), &target.module) {
            return Err(Error::DuplicateRule(name));
        }
    }
    let mut rule = Module::new(&name);
    rule.attributes
        .insert(CELLTYPE_ATTR.to_owned(), AttrValue::from(m.name()));
    let cell = rule.add_cell(REPLACE_CELL, &target.module);

    for (w, o) in outputs.iter().zip(out_perm) {
        let wire = m.wire(*w);
        let bit = add_rule_port(&mut rule, wire.name(), wire.port_id(), PortDirection::Output);
        rule.cell_mut(cell).set_port(&target.outputs[*o], vec![bit]);
    }
    for (w, i) in inputs.iter().zip(in_perm) {
        let wire = m.wire(*w);
        let bit = add_rule_port(&mut rule, wire.name(), wire.port_id(), PortDirection::Input);
        rule.cell_mut(cell).set_port(&target.inputs[*i], vec![bit]);
    }
    rule.fixup_ports();

    let (rule, replaced) = map_design.replace_module(rule);
    if replaced {
        warn!("Replacing existing rule {}", name);
    }
    Ok(rule)
}
