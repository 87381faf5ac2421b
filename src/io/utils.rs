use std::io::{BufRead, BufReader, Read};

use volute::Lut;

use crate::error::{Error, Result};
use crate::netlist::{AttrValue, Module, PortDirection, SigBit};

/// Net of the given name, created as a single-bit wire if it does not exist yet
pub fn net(m: &mut Module, name: &str) -> SigBit {
    let w = match m.wire_by_name(name) {
        Some(w) => w,
        None => m.add_wire(name, 1),
    };
    SigBit::from(w)
}

/// Declare a named net as a port, after the existing ports
///
/// A net declared both as input and output becomes an inout port.
pub fn declare_port(
    m: &mut Module,
    name: &str,
    direction: PortDirection,
    line: usize,
) -> Result<()> {
    let w = match m.wire_by_name(name) {
        Some(w) => w,
        None => m.add_wire(name, 1),
    };
    let wire = m.wire(w);
    let dir = match wire.direction() {
        None => direction,
        Some(d) if d == direction => {
            return Err(Error::parse(line, format!("Port {name} is declared twice")))
        }
        Some(_) => PortDirection::InOut,
    };
    let port_id = if wire.is_port() {
        wire.port_id()
    } else {
        m.ports().len() + 1
    };
    m.set_port(w, dir, port_id);
    m.fixup_ports();
    Ok(())
}

/// Read non-empty lines with their line number, starting at 1
///
/// Comments starting with `#` are removed, and lines ending with `\` are joined
/// with the next one. The line number is the one of the first line of the statement.
pub fn read_lines<R: Read>(r: R) -> Result<Vec<(usize, String)>> {
    let mut ret = Vec::new();

    // Buffer for multi-line statements
    let mut ss = String::new();
    let mut start = 0;

    for (i, l) in BufReader::new(r).lines().enumerate() {
        let s = l?;
        if ss.is_empty() {
            start = i + 1;
        }
        let comment_pos = s.find('#');
        ss += " ";
        ss += &s[0..comment_pos.unwrap_or(s.len())];

        let is_continuation = comment_pos.is_none() && ss.ends_with('\\');
        if is_continuation {
            ss.pop();
            continue;
        }
        let t = ss.trim();
        if !t.is_empty() {
            ret.push((start, t.to_owned()));
        }
        ss.clear();
    }

    // Line continuation at the end of the file
    let t = ss.trim();
    if !t.is_empty() {
        ret.push((start, t.to_owned()));
    }
    Ok(ret)
}

/// Parse an attribute or parameter value: quoted string, or binary constant
pub fn parse_attr_value(s: &str) -> AttrValue {
    if let Some(q) = s.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        return AttrValue::Str(q.to_owned());
    }
    if !s.is_empty() && s.bytes().all(|c| c == b'0' || c == b'1') {
        if let Ok(v) = u64::from_str_radix(s, 2) {
            return AttrValue::Int(v);
        }
    }
    AttrValue::Str(s.to_owned())
}

/// Format an attribute or parameter value for [`parse_attr_value`]
pub fn format_attr_value(v: &AttrValue) -> String {
    match v {
        AttrValue::Int(i) => format!("{i:b}"),
        AttrValue::Str(s) => format!("\"{s}\""),
    }
}

/// Parse the hexadecimal representation of a lookup table
pub fn parse_lut(nb_vars: usize, hex: &str, line: usize) -> Result<Lut> {
    Lut::from_hex_string(nb_vars, hex)
        .map_err(|_| Error::parse(line, format!("Invalid {nb_vars}-input LUT 0x{hex}")))
}

#[cfg(test)]
mod tests {
    use super::{declare_port, format_attr_value, parse_attr_value, read_lines};
    use crate::netlist::{AttrValue, Module, PortDirection};

    #[test]
    fn test_read_lines() {
        let text = "# header\n a b \\\n c # comment\n\n d\\\n";
        let lines = read_lines(text.as_bytes()).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0, 2);
        let tokens: Vec<&str> = lines[0].1.split_whitespace().collect();
        assert_eq!(tokens, vec!["a", "b", "c"]);
        assert_eq!(lines[1], (5, "d".to_owned()));
    }

    #[test]
    fn test_attr_values() {
        assert_eq!(parse_attr_value("\"foo\""), AttrValue::from("foo"));
        assert_eq!(parse_attr_value("101"), AttrValue::Int(5));
        assert_eq!(parse_attr_value("abc"), AttrValue::from("abc"));
        for v in [AttrValue::Int(0), AttrValue::Int(42), AttrValue::from("x y")] {
            assert_eq!(parse_attr_value(&format_attr_value(&v)), v);
        }
    }

    #[test]
    fn test_declare_port() {
        let mut m = Module::new("m");
        declare_port(&mut m, "y", PortDirection::Output, 1).unwrap();
        declare_port(&mut m, "a", PortDirection::Input, 1).unwrap();
        declare_port(&mut m, "y", PortDirection::Input, 2).unwrap();
        assert!(declare_port(&mut m, "a", PortDirection::Input, 3).is_err());
        let y = m.wire_by_name("y").unwrap();
        let a = m.wire_by_name("a").unwrap();
        assert_eq!(m.ports(), &[y, a]);
        assert_eq!(m.wire(y).direction(), Some(PortDirection::InOut));
    }
}
