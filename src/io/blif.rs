use std::collections::BTreeMap;
use std::io::{Read, Write};

use volute::Lut;

use crate::error::{Error, Result};
use crate::netlist::{AttrValue, CellId, Design, Module, PortDirection, SigBit, State};

use super::utils::{declare_port, format_attr_value, net, parse_attr_value, parse_lut, read_lines};

/// Names of the nets used for constants in the generated files
const FALSE_NET: &str = "$false";
const TRUE_NET: &str = "$true";

enum Statement {
    Model(String),
    End,
    Exdc,
    Inputs(Vec<String>),
    Outputs(Vec<String>),
    Latch {
        input: String,
        output: String,
        kind: Option<String>,
        control: Option<String>,
    },
    Names(Vec<String>),
    Cube(String),
    Subckt {
        cell_type: String,
        connections: Vec<(String, String)>,
    },
    Cname(String),
    Attr(String, String),
    Param(String, String),
}

fn read_single_statement(line: usize, tokens: &[&str]) -> Result<Statement> {
    let expect = |n: usize| -> Result<()> {
        if tokens.len() < n {
            Err(Error::parse(
                line,
                format!("{} expects at least {} arguments", tokens[0], n - 1),
            ))
        } else {
            Ok(())
        }
    };
    let names = || -> Vec<String> { tokens[1..].iter().map(|s| (*s).to_owned()).collect() };
    match tokens[0] {
        ".model" => {
            expect(2)?;
            Ok(Statement::Model(tokens[1].to_owned()))
        }
        ".inputs" => Ok(Statement::Inputs(names())),
        ".outputs" => Ok(Statement::Outputs(names())),
        ".latch" => {
            expect(3)?;
            Ok(Statement::Latch {
                input: tokens[1].to_owned(),
                output: tokens[2].to_owned(),
                kind: tokens.get(3).map(|s| (*s).to_owned()),
                control: tokens.get(4).map(|s| (*s).to_owned()),
            })
        }
        ".names" => {
            expect(2)?;
            Ok(Statement::Names(names()))
        }
        ".subckt" | ".gate" => {
            expect(2)?;
            let mut connections = Vec::new();
            for t in &tokens[2..] {
                let Some((formal, actual)) = t.split_once('=') else {
                    return Err(Error::parse(line, format!("Invalid connection {t}")));
                };
                connections.push((formal.to_owned(), actual.to_owned()));
            }
            Ok(Statement::Subckt {
                cell_type: tokens[1].to_owned(),
                connections,
            })
        }
        ".cname" => {
            expect(2)?;
            Ok(Statement::Cname(tokens[1].to_owned()))
        }
        ".attr" | ".param" => {
            expect(3)?;
            let name = tokens[1].to_owned();
            let value = tokens[2..].join(" ");
            if tokens[0] == ".attr" {
                Ok(Statement::Attr(name, value))
            } else {
                Ok(Statement::Param(name, value))
            }
        }
        ".end" => Ok(Statement::End),
        ".exdc" => Ok(Statement::Exdc),
        _ => {
            if tokens[0].starts_with('.') {
                Err(Error::parse(
                    line,
                    format!("{} construct is not supported", tokens[0]),
                ))
            } else {
                Ok(Statement::Cube(tokens.join(" ")))
            }
        }
    }
}

fn read_statements<R: Read>(r: R) -> Result<Vec<(usize, Statement)>> {
    let mut ret = Vec::new();
    for (line, s) in read_lines(r)? {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        ret.push((line, read_single_statement(line, &tokens)?));
    }
    Ok(ret)
}

/// Function of a .names cover, as a lookup table over its inputs
fn cover_function(nb_vars: usize, cubes: &[(usize, &str)]) -> Result<Lut> {
    let mut ret = Lut::zero(nb_vars);
    let mut polarity = None;
    for (line, s) in cubes {
        let t: Vec<&str> = s.split_whitespace().collect();
        let (cube_inputs, cube_pol) = match t.as_slice() {
            [i, p] => (*i, *p),
            [p] => ("", *p),
            _ => return Err(Error::parse(*line, format!("Invalid cube: {s}"))),
        };
        if cube_inputs.len() != nb_vars {
            return Err(Error::parse(
                *line,
                format!(
                    "Invalid cube: {} has {} inputs, expected {}",
                    s,
                    cube_inputs.len(),
                    nb_vars
                ),
            ));
        }
        let pol = match cube_pol {
            "0" => false,
            "1" => true,
            _ => return Err(Error::parse(*line, format!("Invalid cube: {s}"))),
        };
        if *polarity.get_or_insert(pol) != pol {
            return Err(Error::parse(*line, "Inconsistent polarities in cubes"));
        }
        let mut cube = Lut::one(nb_vars);
        for (i, c) in cube_inputs.chars().enumerate() {
            let v = Lut::nth_var(nb_vars, i);
            cube = match c {
                '1' => cube & v,
                '0' => cube & !v,
                '-' => cube,
                _ => return Err(Error::parse(*line, format!("Invalid cube: {s}"))),
            };
        }
        ret = ret | cube;
    }
    Ok(if polarity == Some(false) { !ret } else { ret })
}

/// Add the logic for a .names statement
///
/// Constants, buffers, inverters and 2-input Ands are recognized. Other functions
/// become generic `$lut` cells. Returns the cell created, if any.
fn add_names(
    m: &mut Module,
    names: &[String],
    cubes: &[(usize, &str)],
    line: usize,
) -> Result<Option<CellId>> {
    let (output, inputs) = names
        .split_last()
        .ok_or_else(|| Error::parse(line, ".names statement with no output"))?;
    let y = net(m, output);
    let deps: Vec<SigBit> = inputs.iter().map(|n| net(m, n)).collect();

    if deps.is_empty() {
        // Constant: a single "1" line for the constant one
        let one = cubes.iter().any(|(_, s)| s.trim() == "1");
        m.connect(y, SigBit::from(one));
        return Ok(None);
    }

    let lut = cover_function(deps.len(), cubes)?;
    let n = deps.len();
    if lut == Lut::zero(n) || lut == Lut::one(n) {
        m.connect(y, SigBit::from(lut == Lut::one(n)));
        return Ok(None);
    }
    if n == 1 && lut == Lut::nth_var(1, 0) {
        m.connect(y, deps[0]);
        return Ok(None);
    }

    let cell_type = if n == 1 && lut == !Lut::nth_var(1, 0) {
        "$_NOT_"
    } else if n == 2 && lut == Lut::nth_var(2, 0) & Lut::nth_var(2, 1) {
        "$_AND_"
    } else {
        "$lut"
    };
    let c = m.add_cell(&m.fresh_name("blif"), cell_type);
    let cell = m.cell_mut(c);
    match cell_type {
        "$_NOT_" => cell.set_port("A", vec![deps[0]]),
        "$_AND_" => {
            cell.set_port("A", vec![deps[0]]);
            cell.set_port("B", vec![deps[1]]);
        }
        _ => {
            cell.parameters
                .insert("LUT".to_owned(), AttrValue::Str(lut.to_hex_string()));
            cell.parameters
                .insert("WIDTH".to_owned(), AttrValue::Int(n as u64));
            cell.set_port("A", deps);
        }
    }
    cell.set_port("Y", vec![y]);
    Ok(Some(c))
}

/// Split a formal port name like `A[3]` into its name and bit index
fn split_port_bit(formal: &str) -> (&str, usize) {
    if let Some(s) = formal.strip_suffix(']') {
        if let Some((name, index)) = s.rsplit_once('[') {
            if let Ok(i) = index.parse::<usize>() {
                return (name, i);
            }
        }
    }
    (formal, 0)
}

/// Add a cell instance for a .subckt or .gate statement
fn add_subckt(
    m: &mut Module,
    cell_type: &str,
    connections: &[(String, String)],
    line: usize,
) -> Result<CellId> {
    let mut ports: BTreeMap<&str, BTreeMap<usize, SigBit>> = BTreeMap::new();
    for (formal, actual) in connections {
        let (name, index) = split_port_bit(formal);
        let bit = net(m, actual);
        if ports.entry(name).or_default().insert(index, bit).is_some() {
            return Err(Error::parse(line, format!("Port {formal} is connected twice")));
        }
    }
    let c = m.add_cell(&m.fresh_name("blif"), cell_type);
    let cell = m.cell_mut(c);
    for (name, bits) in ports {
        if bits.keys().enumerate().any(|(i, k)| i != *k) {
            return Err(Error::parse(line, format!("Port {name} has missing bits")));
        }
        cell.set_port(name, bits.into_values().collect());
    }
    Ok(c)
}

/// Build one module from its statements, up to the corresponding .end
fn build_module(name: &str, statements: &[(usize, Statement)]) -> Result<Module> {
    let mut m = Module::new(name);
    let mut last_cell: Option<CellId> = None;
    let mut in_exdc = false;

    for (i, (line, statement)) in statements.iter().enumerate() {
        let line = *line;
        if in_exdc {
            continue;
        }
        match statement {
            Statement::Inputs(names) => {
                for n in names {
                    declare_port(&mut m, n, PortDirection::Input, line)?;
                }
            }
            Statement::Outputs(names) => {
                for n in names {
                    declare_port(&mut m, n, PortDirection::Output, line)?;
                }
            }
            Statement::Latch {
                input,
                output,
                kind,
                control,
            } => {
                let cell_type = match kind.as_deref() {
                    Some("fe") => "$_DFF_N_",
                    Some("ah") => "$_DLATCH_P_",
                    Some("al") => "$_DLATCH_N_",
                    _ => "$_DFF_P_",
                };
                let d = net(&mut m, input);
                let q = net(&mut m, output);
                let clk = match control.as_deref() {
                    None | Some("NIL") => None,
                    Some(c) => Some(net(&mut m, c)),
                };
                let c = m.add_cell(&m.fresh_name("blif"), cell_type);
                let cell = m.cell_mut(c);
                let clk_port = if cell_type.starts_with("$_DLATCH") {
                    "E"
                } else {
                    "C"
                };
                cell.set_port("D", vec![d]);
                cell.set_port("Q", vec![q]);
                if let Some(clk) = clk {
                    cell.set_port(clk_port, vec![clk]);
                }
                last_cell = Some(c);
            }
            Statement::Names(names) => {
                let cubes: Vec<(usize, &str)> = statements[i + 1..]
                    .iter()
                    .map_while(|(l, s)| match s {
                        Statement::Cube(c) => Some((*l, c.as_str())),
                        _ => None,
                    })
                    .collect();
                last_cell = add_names(&mut m, names, &cubes, line)?;
            }
            Statement::Cube(_) => {
                if !matches!(
                    statements[..i].last(),
                    Some((_, Statement::Names(_) | Statement::Cube(_)))
                ) {
                    return Err(Error::parse(line, "Cube outside of a .names statement"));
                }
            }
            Statement::Subckt {
                cell_type,
                connections,
            } => {
                last_cell = Some(add_subckt(&mut m, cell_type, connections, line)?);
            }
            Statement::Cname(n) => {
                if let Some(c) = last_cell {
                    if m.cell(c).name() != n.as_str() && !m.rename_cell(c, n) {
                        return Err(Error::parse(line, format!("Cell {n} is defined twice")));
                    }
                }
            }
            Statement::Attr(n, v) => {
                let value = parse_attr_value(v);
                match last_cell {
                    Some(c) => m.cell_mut(c).attributes.insert(n.clone(), value),
                    None => m.attributes.insert(n.clone(), value),
                };
            }
            Statement::Param(n, v) => {
                let Some(c) = last_cell else {
                    return Err(Error::parse(line, ".param without a cell"));
                };
                m.cell_mut(c).parameters.insert(n.clone(), parse_attr_value(v));
            }
            Statement::Exdc => in_exdc = true,
            Statement::Model(_) | Statement::End => {}
        }
    }
    Ok(m)
}

/// Read a design in .blif format
///
/// The format specification is available [here](https://course.ece.cmu.edu/~ee760/760docs/blif.pdf),
/// with extensions introduced by [Yosys](https://yosyshq.readthedocs.io/projects/yosys/en/latest/cmd/write_blif.html).
///
/// Each `.model` becomes a module. Covers of `.names` statements are recognized
/// as constants, buffers, inverters (`$_NOT_`) or 2-input Ands (`$_AND_`), and
/// other functions are kept as `$lut` cells. `.subckt` and `.gate` instantiate a
/// cell of the given type, `.latch` a flip-flop. The Yosys extensions `.cname`,
/// `.attr` and `.param` apply to the last cell.
pub fn read_blif<R: Read>(r: R) -> Result<Design> {
    let statements = read_statements(r)?;
    let mut ret = Design::new();

    let mut begin: Option<(usize, &str)> = None;
    for (i, (line, statement)) in statements.iter().enumerate() {
        match statement {
            Statement::Model(name) => {
                if begin.is_some() {
                    return Err(Error::parse(*line, "Nested .model statement"));
                }
                begin = Some((i + 1, name.as_str()));
            }
            Statement::End => {
                let Some((start, name)) = begin.take() else {
                    return Err(Error::parse(*line, ".end statement outside of a model"));
                };
                if ret.contains(name) {
                    return Err(Error::parse(*line, format!("Model {name} is defined twice")));
                }
                ret.add_module(build_module(name, &statements[start..i])?);
            }
            _ => {
                if begin.is_none() {
                    return Err(Error::parse(*line, "Statement outside of a model"));
                }
            }
        }
    }

    // A missing .end closes the last model
    if let Some((start, name)) = begin {
        if ret.contains(name) {
            return Err(Error::parse(0, format!("Model {name} is defined twice")));
        }
        ret.add_module(build_module(name, &statements[start..])?);
    }
    Ok(ret)
}

/// Write a lookup table as a .names cover of its on-set
fn write_cover<W: Write>(w: &mut W, lut: &Lut) -> Result<()> {
    let n = lut.num_vars();
    for mask in 0..lut.num_bits() {
        if !lut.value(mask) {
            continue;
        }
        for i in 0..n {
            write!(w, "{}", if (mask >> i) & 1 != 0 { "1" } else { "0" })?;
        }
        writeln!(w, " 1")?;
    }
    Ok(())
}

/// Name of a net in the generated file
fn net_name(m: &Module, b: SigBit) -> String {
    match b {
        SigBit::Const(State::S0) => FALSE_NET.to_owned(),
        SigBit::Const(State::S1) => TRUE_NET.to_owned(),
        _ => m.bit_name(b),
    }
}

/// Single-bit names of the bits of a port
fn port_bit_names(m: &Module, port: &[SigBit]) -> Vec<String> {
    port.iter().map(|b| net_name(m, *b)).collect()
}

fn write_attributes<W: Write>(
    w: &mut W,
    keyword: &str,
    attrs: &BTreeMap<String, AttrValue>,
) -> Result<()> {
    for (name, value) in attrs {
        writeln!(w, "{} {} {}", keyword, name, format_attr_value(value))?;
    }
    Ok(())
}

fn write_module<W: Write>(w: &mut W, m: &Module) -> Result<()> {
    writeln!(w, ".model {}", m.name())?;

    // Consecutive ports with the same direction share a statement, to keep the order
    let mut groups: Vec<(&str, Vec<String>)> = Vec::new();
    for p in m.ports() {
        let wire = m.wire(*p);
        let keywords: &[&str] = match wire.direction() {
            Some(PortDirection::Input) => &[".inputs"],
            Some(PortDirection::Output) => &[".outputs"],
            _ => &[".inputs", ".outputs"],
        };
        for &kw in keywords {
            let bits = (0..wire.width() as u32).map(|o| m.bit_name(SigBit::Wire(*p, o)));
            match groups.last_mut() {
                Some((k, names)) if *k == kw => names.extend(bits),
                _ => groups.push((kw, bits.collect())),
            }
        }
    }
    for (kw, names) in groups {
        writeln!(w, "{} {}", kw, names.join(" "))?;
    }
    write_attributes(w, ".attr", &m.attributes)?;

    let mut uses_constants = false;
    for (_, cell) in m.cells() {
        let conns: Vec<(&str, Vec<String>)> = cell
            .connections()
            .map(|(p, s)| (p, port_bit_names(m, s)))
            .collect();
        uses_constants |= cell.connections().any(|(_, s)| s.iter().any(|b| b.is_constant()));
        let port = |name: &str| -> Option<&Vec<String>> {
            conns.iter().find(|(p, _)| *p == name).map(|(_, s)| s)
        };

        let lut = match (cell.cell_type(), port("A"), port("B"), port("Y")) {
            ("$_AND_", Some(a), Some(b), Some(y)) if a.len() == 1 && b.len() == 1 && y.len() == 1 => {
                writeln!(w, ".names {} {} {}", a[0], b[0], y[0])?;
                writeln!(w, "11 1")?;
                true
            }
            ("$_NOT_", Some(a), None, Some(y)) if a.len() == 1 && y.len() == 1 => {
                writeln!(w, ".names {} {}", a[0], y[0])?;
                writeln!(w, "0 1")?;
                true
            }
            ("$lut", Some(a), None, Some(y)) if y.len() == 1 => {
                let lut = match cell.parameters.get("LUT") {
                    Some(AttrValue::Str(hex)) => parse_lut(a.len(), hex, 0)?,
                    Some(AttrValue::Int(v)) => {
                        let width = std::cmp::max(1, (1usize << a.len()) / 4);
                        parse_lut(a.len(), &format!("{v:0width$x}"), 0)?
                    }
                    None => {
                        return Err(Error::parse(
                            0,
                            format!("Cell {} has no LUT parameter", cell.name()),
                        ))
                    }
                };
                writeln!(w, ".names {} {}", a.join(" "), y[0])?;
                write_cover(w, &lut)?;
                true
            }
            _ => false,
        };
        if lut {
            writeln!(w, ".cname {}", cell.name())?;
            write_attributes(w, ".attr", &cell.attributes)?;
            continue;
        }

        write!(w, ".subckt {}", cell.cell_type())?;
        for (p, bits) in &conns {
            if bits.len() == 1 {
                write!(w, " {}={}", p, bits[0])?;
            } else {
                for (i, b) in bits.iter().enumerate() {
                    write!(w, " {}[{}]={}", p, i, b)?;
                }
            }
        }
        writeln!(w)?;
        writeln!(w, ".cname {}", cell.name())?;
        write_attributes(w, ".attr", &cell.attributes)?;
        write_attributes(w, ".param", &cell.parameters)?;
    }

    // Alias connections as buffers
    for (lhs, rhs) in m.connections() {
        let lhs_name = net_name(m, *lhs);
        match rhs {
            SigBit::Const(State::S0) => writeln!(w, ".names {}", lhs_name)?,
            SigBit::Const(State::S1) => writeln!(w, ".names {}\n1", lhs_name)?,
            SigBit::Wire(..) => writeln!(w, ".names {} {}\n1 1", net_name(m, *rhs), lhs_name)?,
        }
    }
    if uses_constants {
        writeln!(w, ".names {}", FALSE_NET)?;
        writeln!(w, ".names {}\n1", TRUE_NET)?;
    }
    writeln!(w, ".end")?;
    Ok(())
}

/// Write a design in .blif format
///
/// Ands, inverters, lookup tables and alias connections are written as `.names`,
/// other cells as `.subckt` with their name, attributes and parameters. The
/// result can be read back with [`read_blif`].
pub fn write_blif<W: Write>(w: &mut W, design: &Design) -> Result<()> {
    writeln!(w, "# .blif file")?;
    writeln!(w, "# Generated by cellmatch")?;
    for m in design.modules() {
        writeln!(w)?;
        write_module(w, m)?;
    }
    Ok(())
}
