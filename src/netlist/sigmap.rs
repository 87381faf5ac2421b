use fxhash::FxHashMap;

use crate::netlist::module::Module;
use crate::netlist::signal::SigBit;

/// Resolution of wire aliasing
///
/// Every set of bits joined by the module connections gets a single canonical
/// bit. Constants are preferred as representatives; otherwise the first bit
/// seen in the set is kept.
#[derive(Debug, Clone, Default)]
pub struct SigMap {
    parent: FxHashMap<SigBit, SigBit>,
}

impl SigMap {
    /// Build the mapping from the alias connections of a module
    pub fn new(module: &Module) -> SigMap {
        let mut ret = SigMap::default();
        for (a, b) in module.connections() {
            ret.merge(*a, *b);
        }
        ret
    }

    /// Declare two bits as aliases
    pub fn merge(&mut self, a: SigBit, b: SigBit) {
        let ra = self.map_bit(a);
        let rb = self.map_bit(b);
        if ra == rb {
            return;
        }
        if rb.is_constant() && !ra.is_constant() {
            self.parent.insert(ra, rb);
        } else {
            self.parent.insert(rb, ra);
        }
    }

    /// Canonical bit for a bit
    pub fn map_bit(&self, b: SigBit) -> SigBit {
        let mut cur = b;
        while let Some(p) = self.parent.get(&cur) {
            cur = *p;
        }
        cur
    }
}
