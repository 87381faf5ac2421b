use std::io::Read;

use fxhash::FxHashMap;

use crate::error::{Error, Result};
use crate::netlist::{AttrValue, Design, Module, PortDirection, SigBit};

use super::utils::{declare_port, net, parse_lut, read_lines};

/// A gate statement `name = TYPE(inputs)`
struct GateStatement {
    line: usize,
    output: String,
    gate_type: String,
    inputs: Vec<String>,
}

fn parse_gate(line: usize, t: &str) -> Result<GateStatement> {
    let Some((output, rhs)) = t.split_once('=') else {
        return Err(Error::parse(line, format!("Invalid statement {t}")));
    };
    let output = output.trim().to_owned();
    let rhs = rhs.trim();
    let (gate_type, args) = match rhs.split_once('(') {
        Some((g, a)) => {
            let Some(a) = a.trim_end().strip_suffix(')') else {
                return Err(Error::parse(line, format!("Missing parenthesis in {t}")));
            };
            (g.trim(), a)
        }
        // Constants have no argument list
        None => (rhs, ""),
    };
    let inputs: Vec<String> = args
        .split(',')
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect();
    if output.is_empty() || gate_type.is_empty() {
        return Err(Error::parse(line, format!("Invalid statement {t}")));
    }
    Ok(GateStatement {
        line,
        output,
        gate_type: gate_type.to_owned(),
        inputs,
    })
}

fn check_arity(g: &GateStatement) -> Result<()> {
    let expected = match g.gate_type.to_uppercase().as_str() {
        "DFF" | "BUF" | "BUFF" | "NOT" => Some(1),
        "VDD" | "VSS" | "GND" => Some(0),
        "MUX" | "MAJ" => Some(3),
        _ => None,
    };
    match expected {
        Some(n) if n != g.inputs.len() => Err(Error::parse(
            g.line,
            format!(
                "{} expects {} inputs, got {}",
                g.gate_type,
                n,
                g.inputs.len()
            ),
        )),
        _ => Ok(()),
    }
}

/// Add a cell with single-bit ports
fn add_cell(m: &mut Module, cell_type: &str, ports: &[(&str, SigBit)]) {
    let c = m.add_cell(&m.fresh_name("bench"), cell_type);
    let cell = m.cell_mut(c);
    for (p, b) in ports {
        cell.set_port(p, vec![*b]);
    }
}

/// Build the logic of a gate, lowered to And and inverter gates when possible
fn add_gate(m: &mut Module, g: &GateStatement) -> Result<()> {
    let y = net(m, &g.output);
    let deps: Vec<SigBit> = g.inputs.iter().map(|n| net(m, n)).collect();
    let value = match g.gate_type.to_uppercase().as_str() {
        "AND" => m.and_n(&deps),
        "NAND" => {
            let x = m.and_n(&deps);
            m.not(x)
        }
        "OR" => m.or_n(&deps),
        "NOR" => {
            let x = m.or_n(&deps);
            m.not(x)
        }
        "XOR" => m.xor_n(&deps),
        "XNOR" => {
            let x = m.xor_n(&deps);
            m.not(x)
        }
        "NOT" => m.not(deps[0]),
        "BUF" | "BUFF" => deps[0],
        "VDD" => SigBit::one(),
        "VSS" | "GND" => SigBit::zero(),
        "DFF" => {
            add_cell(m, "$_DFF_P_", &[("D", deps[0]), ("Q", y)]);
            return Ok(());
        }
        "MUX" => {
            // MUX(s, a, b) selects a when s is set
            add_cell(
                m,
                "$_MUX_",
                &[("S", deps[0]), ("B", deps[1]), ("A", deps[2]), ("Y", y)],
            );
            return Ok(());
        }
        "MAJ" => {
            add_cell(
                m,
                "$_MAJ_",
                &[("A", deps[0]), ("B", deps[1]), ("C", deps[2]), ("Y", y)],
            );
            return Ok(());
        }
        _ => {
            let Some(hex) = g.gate_type.strip_prefix("LUT 0x") else {
                return Err(Error::parse(
                    g.line,
                    format!("Unknown gate type {}", g.gate_type),
                ));
            };
            let lut = parse_lut(deps.len(), hex.trim(), g.line)?;
            let c = m.add_cell(&m.fresh_name("bench"), "$lut");
            let cell = m.cell_mut(c);
            cell.parameters
                .insert("LUT".to_owned(), AttrValue::Str(lut.to_hex_string()));
            cell.parameters
                .insert("WIDTH".to_owned(), AttrValue::Int(deps.len() as u64));
            cell.set_port("A", deps);
            cell.set_port("Y", vec![y]);
            return Ok(());
        }
    };
    m.connect(y, value);
    Ok(())
}

/// Read a module in .bench format, as used by the ISCAS benchmarks
///
/// These files describe the design with simple statements like:
/// ```text
///     # This is a comment
///     INPUT(i0)
///     INPUT(i1)
///     x0 = AND(i0, i1)
///     x1 = NAND(x0, i1)
///     x2 = OR(x0, i0)
///     x3 = NOR(i0, x1)
///     x4 = XOR(x3, x2)
///     x5 = BUF(x4)
///     x6 = NOT(x5)
///     x7 = gnd
///     x8 = vdd
///     OUTPUT(x0)
/// ```
///
/// The result is a design with a single module. N-ary gates are lowered to
/// And and inverter gates, flip-flops become `$_DFF_P_` cells, and `MUX`/`MAJ`
/// are kept as `$_MUX_`/`$_MAJ_` cells.
pub fn read_bench<R: Read>(r: R, module_name: &str) -> Result<Design> {
    let mut m = Module::new(module_name);
    let mut gates = Vec::new();
    let mut outputs = Vec::new();
    for (line, t) in read_lines(r)? {
        if !t.contains('=') {
            let parts: Vec<&str> = t
                .split(['(', ')'])
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect();
            if parts.len() != 2 {
                return Err(Error::parse(line, format!("Invalid statement {t}")));
            }
            match parts[0] {
                "INPUT" | "PINPUT" => declare_port(&mut m, parts[1], PortDirection::Input, line)?,
                "OUTPUT" | "POUTPUT" => outputs.push((line, parts[1].to_owned())),
                _ => return Err(Error::parse(line, format!("Unknown keyword {}", parts[0]))),
            }
        } else {
            gates.push(parse_gate(line, &t)?);
        }
    }

    // Check that every signal is defined exactly once
    let mut defined: FxHashMap<&str, usize> = FxHashMap::default();
    for (_, w) in m.wires() {
        defined.insert(w.name(), 0);
    }
    for g in &gates {
        check_arity(g)?;
        if defined.insert(g.output.as_str(), g.line).is_some() {
            return Err(Error::parse(g.line, format!("{} is defined twice", g.output)));
        }
    }
    // ABC-style naming for constant signals
    let reads = |name: &str| gates.iter().any(|g| g.inputs.iter().any(|i| i == name));
    let vdd = !defined.contains_key("vdd") && reads("vdd");
    let gnd = !defined.contains_key("gnd") && reads("gnd");
    for g in &gates {
        for dep in &g.inputs {
            let is_const = (dep == "vdd" && vdd) || (dep == "gnd" && gnd);
            if !is_const && !defined.contains_key(dep.as_str()) {
                return Err(Error::parse(
                    g.line,
                    format!("Gate input {dep} is not generated anywhere"),
                ));
            }
        }
    }
    for (line, o) in &outputs {
        if !defined.contains_key(o.as_str()) {
            return Err(Error::parse(*line, format!("Output {o} is not generated anywhere")));
        }
    }
    drop(defined);

    if vdd {
        let s = net(&mut m, "vdd");
        m.connect(s, SigBit::one());
    }
    if gnd {
        let s = net(&mut m, "gnd");
        m.connect(s, SigBit::zero());
    }
    for (line, o) in &outputs {
        declare_port(&mut m, o, PortDirection::Output, *line)?;
    }
    for g in &gates {
        add_gate(&mut m, g)?;
    }

    let mut ret = Design::new();
    ret.add_module(m);
    Ok(ret)
}
