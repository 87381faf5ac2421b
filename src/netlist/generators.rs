//! Module generators and templates, built from And and inverter gates

use crate::netlist::{Module, PortDirection, SigBit};

/// Add single-bit input ports with the given names
fn add_inputs(m: &mut Module, names: &[&str]) -> Vec<SigBit> {
    names
        .iter()
        .map(|n| SigBit::from(m.add_port(n, 1, PortDirection::Input)))
        .collect()
}

/// Add a single-bit output port driven by a signal
fn add_output(m: &mut Module, name: &str, s: SigBit) {
    let w = m.add_port(name, 1, PortDirection::Output);
    m.connect(SigBit::from(w), s);
}

/// Simple gates
pub mod gates {
    use super::{add_inputs, add_output};
    use crate::netlist::Module;

    /// An n-input And gate, with inputs named by the caller
    pub fn and(name: &str, inputs: &[&str]) -> Module {
        let mut ret = Module::new(name);
        let i = add_inputs(&mut ret, inputs);
        let y = ret.and_n(&i);
        add_output(&mut ret, "y", y);
        ret
    }

    /// An n-input Or gate, with inputs named by the caller
    pub fn or(name: &str, inputs: &[&str]) -> Module {
        let mut ret = Module::new(name);
        let i = add_inputs(&mut ret, inputs);
        let y = ret.or_n(&i);
        add_output(&mut ret, "y", y);
        ret
    }

    /// A 2-input Nand gate
    pub fn nand2(name: &str) -> Module {
        let mut ret = Module::new(name);
        let i = add_inputs(&mut ret, &["a", "b"]);
        let x = ret.and(i[0], i[1]);
        let y = ret.not(x);
        add_output(&mut ret, "y", y);
        ret
    }

    /// An n-input Xor gate
    pub fn xor(name: &str, inputs: &[&str]) -> Module {
        let mut ret = Module::new(name);
        let i = add_inputs(&mut ret, inputs);
        let y = ret.xor_n(&i);
        add_output(&mut ret, "y", y);
        ret
    }

    /// A multiplexer y = s ? b : a, with inputs declared as (a, b, s)
    pub fn mux2(name: &str) -> Module {
        let mut ret = Module::new(name);
        let i = add_inputs(&mut ret, &["a", "b", "s"]);
        let ns = ret.not(i[2]);
        let x0 = ret.and(i[0], ns);
        let x1 = ret.and(i[1], i[2]);
        let y = ret.or(x0, x1);
        add_output(&mut ret, "y", y);
        ret
    }

    /// A 2-input And whose output ignores a third input
    pub fn and2_unused(name: &str) -> Module {
        let mut ret = Module::new(name);
        let i = add_inputs(&mut ret, &["a", "b", "unused"]);
        let y = ret.and(i[0], i[1]);
        add_output(&mut ret, "y", y);
        ret
    }
}

/// Adder generators
pub mod adder {
    use super::{add_inputs, add_output};
    use crate::netlist::Module;

    /// A half adder, with outputs in the given order
    pub fn half_adder(name: &str, sum_first: bool) -> Module {
        let mut ret = Module::new(name);
        let i = add_inputs(&mut ret, &["a", "b"]);
        let s = ret.xor(i[0], i[1]);
        let c = ret.and(i[0], i[1]);
        if sum_first {
            add_output(&mut ret, "s", s);
            add_output(&mut ret, "c", c);
        } else {
            add_output(&mut ret, "c", c);
            add_output(&mut ret, "s", s);
        }
        ret
    }

    /// A full adder, with inputs named by the caller and outputs (sum, carry)
    pub fn full_adder(name: &str, inputs: [&str; 3]) -> Module {
        let mut ret = Module::new(name);
        let i = add_inputs(&mut ret, &inputs);
        let s = ret.xor_n(&i);
        let ab = ret.and(i[0], i[1]);
        let ac = ret.and(i[0], i[2]);
        let bc = ret.and(i[1], i[2]);
        let c = ret.or_n(&[ab, ac, bc]);
        add_output(&mut ret, "s", s);
        add_output(&mut ret, "co", c);
        ret
    }
}

/// Simple generators to test functionality
pub mod testcases {
    use crate::netlist::{Module, PortDirection, SigBit};

    /// A flip-flop with an inverter on its output
    pub fn dff(name: &str) -> Module {
        let mut ret = Module::new(name);
        let d = ret.add_port("d", 1, PortDirection::Input);
        let clk = ret.add_port("clk", 1, PortDirection::Input);
        let q = ret.add_wire("q", 1);
        let ff = ret.add_cell("ff", "$_DFF_P_");
        let cell = ret.cell_mut(ff);
        cell.set_port("C", vec![clk.into()]);
        cell.set_port("D", vec![d.into()]);
        cell.set_port("Q", vec![q.into()]);
        let y = ret.not(q.into());
        let out = ret.add_port("y", 1, PortDirection::Output);
        ret.connect(SigBit::from(out), y);
        ret
    }

    /// A module with a constant output and a feedthrough
    pub fn constants(name: &str) -> Module {
        let mut ret = Module::new(name);
        let a = ret.add_port("a", 1, PortDirection::Input);
        let y0 = ret.add_port("zero", 1, PortDirection::Output);
        let y1 = ret.add_port("one", 1, PortDirection::Output);
        let y2 = ret.add_port("feed", 1, PortDirection::Output);
        ret.connect(y0.into(), SigBit::zero());
        ret.connect(y1.into(), SigBit::one());
        ret.connect(y2.into(), a.into());
        ret
    }
}
