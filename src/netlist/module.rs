use std::collections::BTreeMap;
use std::fmt;

use fxhash::FxHashMap;

use crate::netlist::signal::{CellId, SigBit, SigSpec, WireId};

/// Direction of a module port
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum PortDirection {
    /// Primary input
    Input,
    /// Primary output
    Output,
    /// Bidirectional port
    InOut,
}

/// Value of an attribute or of a cell parameter
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum AttrValue {
    /// Integer constant, up to 64 bits
    Int(u64),
    /// String
    Str(String),
}

/// Attributes or parameters, sorted by name
pub type Attributes = BTreeMap<String, AttrValue>;

impl AttrValue {
    /// Integer value, if this is an integer
    pub fn as_int(&self) -> Option<u64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            AttrValue::Str(_) => None,
        }
    }

    /// String value, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Int(_) => None,
            AttrValue::Str(s) => Some(s),
        }
    }
}

impl From<u64> for AttrValue {
    fn from(v: u64) -> AttrValue {
        AttrValue::Int(v)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> AttrValue {
        AttrValue::Str(s.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> AttrValue {
        AttrValue::Str(s)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(v) => write!(f, "{v}"),
            AttrValue::Str(s) => write!(f, "\"{s}\""),
        }
    }
}

/// A named wire, possibly a port of its module
#[derive(Debug, Clone)]
pub struct Wire {
    name: String,
    width: usize,
    direction: Option<PortDirection>,
    port_id: usize,
    /// Attributes attached to the wire
    pub attributes: Attributes,
}

impl Wire {
    /// Name of the wire
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of bits
    pub fn width(&self) -> usize {
        self.width
    }

    /// Port direction, if the wire is a port
    pub fn direction(&self) -> Option<PortDirection> {
        self.direction
    }

    /// Position in the port list, starting at 1; 0 if not a port
    pub fn port_id(&self) -> usize {
        self.port_id
    }

    /// Returns whether the wire is a port
    pub fn is_port(&self) -> bool {
        self.direction.is_some()
    }

    /// Returns whether the wire is an input (or inout) port
    pub fn is_input(&self) -> bool {
        matches!(
            self.direction,
            Some(PortDirection::Input) | Some(PortDirection::InOut)
        )
    }

    /// Returns whether the wire is an output (or inout) port
    pub fn is_output(&self) -> bool {
        matches!(
            self.direction,
            Some(PortDirection::Output) | Some(PortDirection::InOut)
        )
    }
}

/// A cell instance, with named ports bound to signals
///
/// The cell type follows Yosys conventions: internal gates start with `$`
/// (`$_AND_`, `$_NOT_`, `$_DFF_P_`...), other types name a module.
#[derive(Debug, Clone)]
pub struct Cell {
    name: String,
    cell_type: String,
    connections: Vec<(String, SigSpec)>,
    /// Parameters of the instance
    pub parameters: Attributes,
    /// Attributes attached to the instance
    pub attributes: Attributes,
}

impl Cell {
    /// Name of the instance
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type of the instance
    pub fn cell_type(&self) -> &str {
        &self.cell_type
    }

    /// Signal connected to a port, if any
    pub fn port(&self, port: &str) -> Option<&SigSpec> {
        self.connections
            .iter()
            .find(|(p, _)| p == port)
            .map(|(_, s)| s)
    }

    /// Connect a port, replacing the previous connection if it exists
    pub fn set_port(&mut self, port: &str, sig: SigSpec) {
        match self.connections.iter_mut().find(|(p, _)| p == port) {
            Some((_, s)) => *s = sig,
            None => self.connections.push((port.to_owned(), sig)),
        }
    }

    /// All port connections, in the order they were made
    pub fn connections(&self) -> impl Iterator<Item = (&str, &SigSpec)> {
        self.connections.iter().map(|(p, s)| (p.as_str(), s))
    }
}

/// Representation of a module: ports, wires, cell instances and alias connections
///
/// Wires and cells are addressed by index, and can be looked up by name.
/// Ports are kept in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Module {
    name: String,
    wires: Vec<Wire>,
    wire_names: FxHashMap<String, WireId>,
    ports: Vec<WireId>,
    cells: Vec<Cell>,
    cell_names: FxHashMap<String, CellId>,
    connections: Vec<(SigBit, SigBit)>,
    /// Attributes attached to the module
    pub attributes: Attributes,
}

impl Module {
    /// Create a new empty module
    pub fn new(name: &str) -> Self {
        Module {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    /// Name of the module
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the number of wires
    pub fn nb_wires(&self) -> usize {
        self.wires.len()
    }

    /// Return the number of cells
    pub fn nb_cells(&self) -> usize {
        self.cells.len()
    }

    /// Get a wire
    pub fn wire(&self, w: WireId) -> &Wire {
        &self.wires[w.index()]
    }

    /// Get a wire for modification
    pub fn wire_mut(&mut self, w: WireId) -> &mut Wire {
        &mut self.wires[w.index()]
    }

    /// Look up a wire by name
    pub fn wire_by_name(&self, name: &str) -> Option<WireId> {
        self.wire_names.get(name).copied()
    }

    /// Iterate over all wires
    pub fn wires(&self) -> impl Iterator<Item = (WireId, &Wire)> {
        self.wires
            .iter()
            .enumerate()
            .map(|(i, w)| (WireId(i as u32), w))
    }

    /// Port wires, in declaration order
    pub fn ports(&self) -> &[WireId] {
        &self.ports
    }

    /// Get a cell
    pub fn cell(&self, c: CellId) -> &Cell {
        &self.cells[c.index()]
    }

    /// Get a cell for modification
    pub fn cell_mut(&mut self, c: CellId) -> &mut Cell {
        &mut self.cells[c.index()]
    }

    /// Look up a cell by name
    pub fn cell_by_name(&self, name: &str) -> Option<CellId> {
        self.cell_names.get(name).copied()
    }

    /// Iterate over all cells
    pub fn cells(&self) -> impl Iterator<Item = (CellId, &Cell)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, c)| (CellId(i as u32), c))
    }

    /// Alias connections between bits: each pair is the same net
    pub fn connections(&self) -> &[(SigBit, SigBit)] {
        &self.connections
    }

    /// Add a new wire, not a port
    pub fn add_wire(&mut self, name: &str, width: usize) -> WireId {
        assert!(width >= 1, "Wire {name} must have at least one bit");
        let id = WireId(self.wires.len() as u32);
        let present = self.wire_names.insert(name.to_owned(), id).is_some();
        assert!(!present, "{} is defined twice in module {}", name, self.name);
        self.wires.push(Wire {
            name: name.to_owned(),
            width,
            direction: None,
            port_id: 0,
            attributes: Attributes::new(),
        });
        id
    }

    /// Add a new port after the existing ones
    pub fn add_port(&mut self, name: &str, width: usize, direction: PortDirection) -> WireId {
        let id = self.add_wire(name, width);
        self.ports.push(id);
        let port_id = self.ports.len();
        let w = self.wire_mut(id);
        w.direction = Some(direction);
        w.port_id = port_id;
        id
    }

    /// Turn an existing wire into a port; call [`Module::fixup_ports`] afterwards
    pub fn set_port(&mut self, w: WireId, direction: PortDirection, port_id: usize) {
        let wire = self.wire_mut(w);
        wire.direction = Some(direction);
        wire.port_id = port_id;
    }

    /// Rebuild the port list from the wires, ordered by port id, and renumber it
    pub fn fixup_ports(&mut self) {
        let mut ports: Vec<WireId> = self
            .wires()
            .filter(|(_, w)| w.is_port())
            .map(|(i, _)| i)
            .collect();
        ports.sort_by_key(|w| (self.wire(*w).port_id == 0, self.wire(*w).port_id));
        for (i, w) in ports.iter().enumerate() {
            self.wires[w.index()].port_id = i + 1;
        }
        self.ports = ports;
    }

    /// Add a new cell instance
    pub fn add_cell(&mut self, name: &str, cell_type: &str) -> CellId {
        let id = CellId(self.cells.len() as u32);
        let present = self.cell_names.insert(name.to_owned(), id).is_some();
        assert!(!present, "{} is defined twice in module {}", name, self.name);
        self.cells.push(Cell {
            name: name.to_owned(),
            cell_type: cell_type.to_owned(),
            connections: Vec::new(),
            parameters: Attributes::new(),
            attributes: Attributes::new(),
        });
        id
    }

    /// Rename a cell; returns false if the name is already taken
    pub fn rename_cell(&mut self, c: CellId, name: &str) -> bool {
        if self.cell_names.contains_key(name) {
            return false;
        }
        let old = std::mem::replace(&mut self.cells[c.index()].name, name.to_owned());
        self.cell_names.remove(&old);
        self.cell_names.insert(name.to_owned(), c);
        true
    }

    /// Declare two bits as the same net
    pub fn connect(&mut self, lhs: SigBit, rhs: SigBit) {
        self.connections.push((lhs, rhs));
    }

    /// Generate a name not used by any wire or cell
    pub(crate) fn fresh_name(&self, prefix: &str) -> String {
        let mut i = self.wires.len() + self.cells.len();
        loop {
            let name = format!("${prefix}${i}");
            if !self.wire_names.contains_key(&name) && !self.cell_names.contains_key(&name) {
                return name;
            }
            i += 1;
        }
    }

    /// Create a gate of the given type driving a new single-bit wire
    fn add_gate(&mut self, cell_type: &str, inputs: &[(&str, SigBit)]) -> SigBit {
        let y = self.add_wire(&self.fresh_name("auto"), 1);
        let c = self.add_cell(&self.fresh_name("auto"), cell_type);
        let cell = self.cell_mut(c);
        for (port, bit) in inputs {
            cell.set_port(port, vec![*bit]);
        }
        cell.set_port("Y", vec![y.into()]);
        y.into()
    }

    /// Create an And2 gate (`$_AND_`)
    pub fn and(&mut self, a: SigBit, b: SigBit) -> SigBit {
        self.add_gate("$_AND_", &[("A", a), ("B", b)])
    }

    /// Create an inverter (`$_NOT_`)
    pub fn not(&mut self, a: SigBit) -> SigBit {
        self.add_gate("$_NOT_", &[("A", a)])
    }

    /// Create an Or2 from And and inverter gates
    pub fn or(&mut self, a: SigBit, b: SigBit) -> SigBit {
        let na = self.not(a);
        let nb = self.not(b);
        let n = self.and(na, nb);
        self.not(n)
    }

    /// Create a Xor2 from And and inverter gates
    pub fn xor(&mut self, a: SigBit, b: SigBit) -> SigBit {
        let na = self.not(a);
        let nb = self.not(b);
        let x0 = self.and(a, nb);
        let x1 = self.and(na, b);
        self.or(x0, x1)
    }

    /// Create an n-ary And as a tree
    pub fn and_n(&mut self, sigs: &[SigBit]) -> SigBit {
        self.reduce_tree(sigs, SigBit::one(), Module::and)
    }

    /// Create an n-ary Or as a tree
    pub fn or_n(&mut self, sigs: &[SigBit]) -> SigBit {
        self.reduce_tree(sigs, SigBit::zero(), Module::or)
    }

    /// Create an n-ary Xor as a tree
    pub fn xor_n(&mut self, sigs: &[SigBit]) -> SigBit {
        self.reduce_tree(sigs, SigBit::zero(), Module::xor)
    }

    /// Balanced reduction of a list of signals with a binary gate
    fn reduce_tree<F: Fn(&mut Module, SigBit, SigBit) -> SigBit>(
        &mut self,
        sigs: &[SigBit],
        empty: SigBit,
        f: F,
    ) -> SigBit {
        if sigs.is_empty() {
            empty
        } else if sigs.len() == 1 {
            sigs[0]
        } else {
            let mut next_sigs = Vec::new();
            for i in (0..sigs.len()).step_by(2) {
                if i + 1 < sigs.len() {
                    next_sigs.push(f(self, sigs[i], sigs[i + 1]));
                } else {
                    next_sigs.push(sigs[i]);
                }
            }
            self.reduce_tree(&next_sigs, empty, f)
        }
    }

    /// Human-readable name of a bit
    pub fn bit_name(&self, b: SigBit) -> String {
        match b {
            SigBit::Const(s) => s.to_string(),
            SigBit::Wire(w, o) => {
                let wire = self.wire(w);
                if wire.width == 1 {
                    wire.name.clone()
                } else {
                    format!("{}[{}]", wire.name, o)
                }
            }
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Module {} with {} ports, {} cells:",
            self.name(),
            self.ports.len(),
            self.nb_cells()
        )?;
        for w in &self.ports {
            let wire = self.wire(*w);
            let dir = match wire.direction {
                Some(PortDirection::Input) => "input",
                Some(PortDirection::Output) => "output",
                _ => "inout",
            };
            writeln!(f, "\t{} {} [{}]", dir, wire.name, wire.width)?;
        }
        for (_, c) in self.cells() {
            let st = c
                .connections()
                .map(|(p, s)| {
                    let bits: Vec<String> = s.iter().map(|b| self.bit_name(*b)).collect();
                    format!("{}={}", p, bits.join(","))
                })
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(f, "\t{} = {}({})", c.name, c.cell_type, st)?;
        }
        for (a, b) in &self.connections {
            writeln!(f, "\t{} = {}", self.bit_name(*a), self.bit_name(*b))?;
        }
        Ok(())
    }
}
