//! Index of library modules by fingerprint

use fxhash::FxHashMap;
use log::debug;

use crate::error::Result;
use crate::netlist::{Design, Module, WireId};
use crate::sim::{derive_function_tables, module_inputs, module_outputs, FunctionTable};
use crate::techmap::canon::{fingerprint, Fingerprint};

/// A library module that is a viable matching target
///
/// The target owns the names it needs, so that the index does not borrow the
/// library design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Name of the library module
    pub module: String,
    /// Input port names, in declaration order
    pub inputs: Vec<String>,
    /// Output port names, in declaration order
    pub outputs: Vec<String>,
    /// Function table of each output
    pub tables: Vec<FunctionTable>,
}

impl Target {
    /// Build a target from a module, or None if the module is not combinational or too large
    pub fn from_module(m: &Module) -> Result<Option<Target>> {
        let Some(tables) = derive_function_tables(m)? else {
            return Ok(None);
        };
        let names = |wires: Vec<WireId>| -> Vec<String> {
            wires
                .into_iter()
                .map(|w| m.wire(w).name().to_owned())
                .collect()
        };
        Ok(Some(Target {
            module: m.name().to_owned(),
            inputs: names(module_inputs(m)?),
            outputs: names(module_outputs(m)?),
            tables,
        }))
    }

    /// Fingerprint of the target
    pub fn fingerprint(&self) -> Fingerprint {
        fingerprint(&self.tables)
    }
}

/// Library modules grouped by fingerprint
///
/// Within a group, targets are kept in insertion order, which is the order in
/// which they are tried by the matcher.
#[derive(Debug, Clone, Default)]
pub struct LibraryIndex {
    targets: FxHashMap<Fingerprint, Vec<Target>>,
    nb_targets: usize,
}

impl LibraryIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Index all modules of a library design
    pub fn build(library: &Design) -> Result<LibraryIndex> {
        let mut ret = LibraryIndex::new();
        for m in library.modules() {
            ret.insert(m)?;
        }
        Ok(ret)
    }

    /// Add a module to the index; returns whether it is a viable target
    pub fn insert(&mut self, m: &Module) -> Result<bool> {
        let Some(target) = Target::from_module(m)? else {
            debug!("Excluding library module {} from matching", m.name());
            return Ok(false);
        };
        let fp = target.fingerprint();
        debug!("Library module {} has fingerprint {}", m.name(), fp);
        self.targets.entry(fp).or_default().push(target);
        self.nb_targets += 1;
        Ok(true)
    }

    /// Targets sharing a fingerprint, in insertion order
    pub fn candidates(&self, fp: &Fingerprint) -> &[Target] {
        self.targets.get(fp).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of targets
    pub fn nb_targets(&self) -> usize {
        self.nb_targets
    }

    /// Number of distinct fingerprints
    pub fn nb_fingerprints(&self) -> usize {
        self.targets.len()
    }

    /// Returns whether the index has no target
    pub fn is_empty(&self) -> bool {
        self.nb_targets == 0
    }
}

#[cfg(test)]
mod tests {
    use super::{LibraryIndex, Target};
    use crate::netlist::generators::{adder, gates, testcases};
    use crate::netlist::{Design, Module, PortDirection};
    use crate::techmap::canon::fingerprint;

    fn library() -> Design {
        let mut lib = Design::new();
        lib.add_module(gates::and("AND2", &["A", "B"]));
        lib.add_module(gates::nand2("NAND2"));
        lib.add_module(gates::and("AND2B", &["X", "Y"]));
        lib.add_module(testcases::dff("DFF"));
        lib.add_module(gates::and("AND7", &["a", "b", "c", "d", "e", "f", "g"]));
        lib.add_module(adder::full_adder("FA", ["A", "B", "CI"]));
        lib
    }

    #[test]
    fn test_target() {
        let m = gates::and("AND2", &["A", "B"]);
        let t = Target::from_module(&m).unwrap().unwrap();
        assert_eq!(t.module, "AND2");
        assert_eq!(t.inputs, vec!["A", "B"]);
        assert_eq!(t.outputs, vec!["y"]);
        assert_eq!(t.tables[0].bits(), 0b1000);
    }

    #[test]
    fn test_build() {
        let index = LibraryIndex::build(&library()).unwrap();
        // DFF and AND7 are excluded
        assert_eq!(index.nb_targets(), 4);
        assert_eq!(index.nb_fingerprints(), 3);
        assert!(!index.is_empty());

        let and2 = gates::and("x", &["p", "q"]);
        let fp = Target::from_module(&and2).unwrap().unwrap().fingerprint();
        let cands = index.candidates(&fp);
        let names: Vec<&str> = cands.iter().map(|t| t.module.as_str()).collect();
        assert_eq!(names, vec!["AND2", "AND2B"]);
    }

    #[test]
    fn test_missing_fingerprint() {
        let index = LibraryIndex::build(&library()).unwrap();
        let xor = gates::xor("x", &["a", "b"]);
        let fp = Target::from_module(&xor).unwrap().unwrap().fingerprint();
        assert!(index.candidates(&fp).is_empty());
        assert!(LibraryIndex::new().candidates(&fingerprint(&[])).is_empty());
    }

    #[test]
    fn test_fatal_error() {
        let mut lib = Design::new();
        let mut m = Module::new("bad");
        m.add_port("a", 1, PortDirection::Input);
        m.add_cell("u", "$_XOR_");
        lib.add_module(m);
        assert!(LibraryIndex::build(&lib).is_err());
    }
}
