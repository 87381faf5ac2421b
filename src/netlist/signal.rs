use std::fmt;

/// Value of a constant driver
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub enum State {
    /// Constant zero
    S0,
    /// Constant one
    S1,
}

/// Index of a wire in its module
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct WireId(pub(crate) u32);

impl WireId {
    /// Position of the wire in the module
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Index of a cell in its module
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct CellId(pub(crate) u32);

impl CellId {
    /// Position of the cell in the module
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Representation of a single signal bit
///
/// May be a constant, or one bit of a wire.
/// Bits are only meaningful inside their module. Aliasing between wires is not
/// resolved here: see [`SigMap`](crate::netlist::SigMap).
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub enum SigBit {
    /// Constant bit
    Const(State),
    /// Bit `offset` of a wire
    Wire(WireId, u32),
}

/// Ordered vector of signal bits, lsb first
pub type SigSpec = Vec<SigBit>;

impl SigBit {
    /// Constant zero signal
    pub fn zero() -> SigBit {
        SigBit::Const(State::S0)
    }

    /// Constant one signal
    pub fn one() -> SigBit {
        SigBit::Const(State::S1)
    }

    /// First bit of a wire; the whole wire for single-bit wires
    pub fn from_wire(w: WireId) -> SigBit {
        SigBit::Wire(w, 0)
    }

    /// Returns true if the bit is a constant
    pub fn is_constant(&self) -> bool {
        matches!(self, SigBit::Const(_))
    }

    /// Returns true if the bit belongs to a wire
    pub fn is_wire(&self) -> bool {
        matches!(self, SigBit::Wire(_, _))
    }

    /// Obtain the wire this bit belongs to, if any
    pub fn wire(&self) -> Option<WireId> {
        match self {
            SigBit::Wire(w, _) => Some(*w),
            SigBit::Const(_) => None,
        }
    }
}

impl From<bool> for SigBit {
    fn from(b: bool) -> SigBit {
        if b {
            SigBit::one()
        } else {
            SigBit::zero()
        }
    }
}

impl From<State> for SigBit {
    fn from(s: State) -> SigBit {
        SigBit::Const(s)
    }
}

impl From<WireId> for SigBit {
    fn from(w: WireId) -> SigBit {
        SigBit::from_wire(w)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::S0 => write!(f, "1'0"),
            State::S1 => write!(f, "1'1"),
        }
    }
}

impl fmt::Display for SigBit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigBit::Const(s) => write!(f, "{s}"),
            SigBit::Wire(w, o) => write!(f, "w{}[{}]", w.0, o),
        }
    }
}
