//! The cellmatch pass: match design modules to library cells and emit techmap rules

use std::fmt;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::netlist::{AttrValue, Design, DesignRegistry, Module};
use crate::sim::{derive_function_tables, module_inputs, module_outputs};
use crate::techmap::canon::{canonical_label, fingerprint};
use crate::techmap::library::LibraryIndex;
use crate::techmap::rule::emit_rule;
use crate::techmap::search::find_match;

/// Name of the design receiving the generated rules
pub const MAP_DESIGN: &str = "$cellmatch_map";

/// Attribute holding the canonical label of an output, with `lut_attrs`
pub const P_CLASS_ATTR: &str = "p_class";

/// Attribute holding the function table of an output, with `lut_attrs`
pub const LUT_ATTR: &str = "lut";

/// A rule generated by the pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    /// Design module that was matched
    pub module: String,
    /// Library module it maps to
    pub target: String,
    /// Name of the rule module in the map design
    pub rule: String,
}

/// Summary of a cellmatch run
#[derive(Debug, Clone, Default)]
pub struct MatchReport {
    /// Rules generated, in order
    pub matches: Vec<RuleMatch>,
    /// Selected modules that were not purely combinational or had too many inputs
    pub skipped: Vec<String>,
    /// Number of selected modules whose function tables were computed
    pub nb_analyzed: usize,
}

impl MatchReport {
    /// Number of rules generated
    pub fn nb_matches(&self) -> usize {
        self.matches.len()
    }

    /// Library modules matched to a design module, in order
    pub fn targets_of(&self, module: &str) -> Vec<&str> {
        self.matches
            .iter()
            .filter(|r| r.module == module)
            .map(|r| r.target.as_str())
            .collect()
    }
}

impl fmt::Display for MatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} modules analyzed, {} skipped, {} rules generated",
            self.nb_analyzed,
            self.skipped.len(),
            self.matches.len()
        )?;
        for r in &self.matches {
            writeln!(f, "\t{} -> {} ({})", r.module, r.target, r.rule)?;
        }
        Ok(())
    }
}

/// Options of the cellmatch pass
///
/// Each selected combinational module of the design is compared to the modules
/// of the library. For each library module that is equivalent up to a
/// permutation of inputs and outputs, a rule module is added to the
/// [`MAP_DESIGN`] entry of the registry, created if needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellMatch {
    /// Annotate each output wire with its function table and canonical label
    pub lut_attrs: bool,
}

impl CellMatch {
    /// Run the pass against a library design
    ///
    /// A library is required unless `lut_attrs` is set.
    pub fn run<F: Fn(&Module) -> bool>(
        &self,
        design: &mut Design,
        selection: F,
        library: Option<&Design>,
        registry: &mut DesignRegistry,
    ) -> Result<MatchReport> {
        let index = match library {
            Some(lib) => LibraryIndex::build(lib)?,
            None if self.lut_attrs => LibraryIndex::new(),
            None => return Err(Error::MissingLibrary),
        };
        self.run_with_index(design, selection, &index, registry)
    }

    /// Run the pass against a library design stored in the registry
    pub fn run_with_library_name<F: Fn(&Module) -> bool>(
        &self,
        design: &mut Design,
        selection: F,
        library: Option<&str>,
        registry: &mut DesignRegistry,
    ) -> Result<MatchReport> {
        let index = match library {
            Some(name) => {
                let lib = registry
                    .get(name)
                    .ok_or_else(|| Error::MissingDesign(name.to_owned()))?;
                LibraryIndex::build(lib)?
            }
            None if self.lut_attrs => LibraryIndex::new(),
            None => return Err(Error::MissingLibrary),
        };
        self.run_with_index(design, selection, &index, registry)
    }

    /// Run the pass against an already indexed library
    pub fn run_with_index<F: Fn(&Module) -> bool>(
        &self,
        design: &mut Design,
        selection: F,
        index: &LibraryIndex,
        registry: &mut DesignRegistry,
    ) -> Result<MatchReport> {
        let map_design = registry.get_or_create(MAP_DESIGN);
        let mut report = MatchReport::default();

        for m in design.modules_mut().filter(|m| selection(&**m)) {
            let Some(tables) = derive_function_tables(m)? else {
                report.skipped.push(m.name().to_owned());
                continue;
            };
            report.nb_analyzed += 1;
            let nb_inputs = module_inputs(m)?.len();

            if self.lut_attrs {
                for (w, t) in module_outputs(m)?.into_iter().zip(&tables) {
                    let attrs = &mut m.wire_mut(w).attributes;
                    attrs.insert(
                        P_CLASS_ATTR.to_owned(),
                        AttrValue::Int(canonical_label(t).bits()),
                    );
                    attrs.insert(LUT_ATTR.to_owned(), AttrValue::Int(t.bits()));
                }
            }

            let fp = fingerprint(&tables);
            for target in index.candidates(&fp) {
                debug!("Candidate {} for matching to {}", target.module, m.name());
                let Some((in_perm, out_perm)) = find_match(&tables, nb_inputs, target) else {
                    continue;
                };
                info!("Module {} matches {}", m.name(), target.module);
                let rule = emit_rule(map_design, m, target, &in_perm, &out_perm)?;
                report.matches.push(RuleMatch {
                    module: m.name().to_owned(),
                    target: target.module.clone(),
                    rule: rule.name().to_owned(),
                });
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::{CellMatch, LUT_ATTR, MAP_DESIGN, P_CLASS_ATTR};
    use crate::error::Error;
    use crate::netlist::generators::{adder, gates, testcases};
    use crate::netlist::{Design, DesignRegistry, Module, PortDirection, SigBit};
    use crate::techmap::{CELLTYPE_ATTR, REPLACE_CELL};

    fn and_library() -> Design {
        let mut lib = Design::new();
        lib.add_module(gates::and("AND2", &["A", "B"]));
        lib
    }

    fn all(_: &Module) -> bool {
        true
    }

    /// And2 computed as Not(Not(a) | Not(b)), with the ports declared as (b, a)
    fn swapped_and(name: &str) -> Module {
        let mut m = Module::new(name);
        let b = SigBit::from(m.add_port("b", 1, PortDirection::Input));
        let a = SigBit::from(m.add_port("a", 1, PortDirection::Input));
        let na = m.not(a);
        let nb = m.not(b);
        let o = m.or(na, nb);
        let y = m.not(o);
        let out = m.add_port("y", 1, PortDirection::Output);
        m.connect(out.into(), y);
        m
    }

    /// Connections of the replacement cell of a rule, as (target port, rule wire)
    fn rule_connections(registry: &DesignRegistry, rule: &str) -> Vec<(String, String)> {
        let rule = registry.get(MAP_DESIGN).unwrap().module(rule).unwrap();
        let cell = rule.cell(rule.cell_by_name(REPLACE_CELL).unwrap());
        let mut ret: Vec<(String, String)> = cell
            .connections()
            .map(|(p, s)| (p.to_owned(), rule.bit_name(s[0])))
            .collect();
        ret.sort();
        ret
    }

    #[test]
    fn test_and_match() {
        let mut design = Design::new();
        design.add_module(gates::and("my_and", &["p", "q"]));
        let mut registry = DesignRegistry::new();
        let report = CellMatch::default()
            .run(&mut design, all, Some(&and_library()), &mut registry)
            .unwrap();
        assert_eq!(report.nb_matches(), 1);
        assert_eq!(report.matches[0].rule, "_60_my_and_AND2");
        let conns = rule_connections(&registry, "_60_my_and_AND2");
        assert_eq!(
            conns,
            vec![
                ("A".to_owned(), "p".to_owned()),
                ("B".to_owned(), "q".to_owned()),
                ("y".to_owned(), "y".to_owned())
            ]
        );
    }

    #[test]
    fn test_swapped_inputs() {
        let mut design = Design::new();
        design.add_module(swapped_and("swapped"));
        let mut registry = DesignRegistry::new();
        let report = CellMatch::default()
            .run(&mut design, all, Some(&and_library()), &mut registry)
            .unwrap();
        assert_eq!(report.targets_of("swapped"), vec!["AND2"]);
        // The And is symmetric: the identity is found first
        let conns = rule_connections(&registry, "_60_swapped_AND2");
        assert_eq!(conns[0], ("A".to_owned(), "b".to_owned()));

        // An asymmetric function exposes the swap
        let mut lib = Design::new();
        let mut t = Module::new("ANDN");
        let a = SigBit::from(t.add_port("A", 1, PortDirection::Input));
        let b = SigBit::from(t.add_port("B", 1, PortDirection::Input));
        let nb = t.not(b);
        let y = t.and(a, nb);
        let out = t.add_port("Y", 1, PortDirection::Output);
        t.connect(out.into(), y);
        lib.add_module(t);

        let mut m = Module::new("andn_swapped");
        let b = SigBit::from(m.add_port("b", 1, PortDirection::Input));
        let a = SigBit::from(m.add_port("a", 1, PortDirection::Input));
        let nb = m.not(b);
        let y = m.and(a, nb);
        let out = m.add_port("y", 1, PortDirection::Output);
        m.connect(out.into(), y);
        let mut design = Design::new();
        design.add_module(m);

        let report = CellMatch::default()
            .run(&mut design, all, Some(&lib), &mut registry)
            .unwrap();
        assert_eq!(report.nb_matches(), 1);
        let conns = rule_connections(&registry, "_60_andn_swapped_ANDN");
        assert_eq!(
            conns,
            vec![
                ("A".to_owned(), "a".to_owned()),
                ("B".to_owned(), "b".to_owned()),
                ("Y".to_owned(), "y".to_owned())
            ]
        );
    }

    #[test]
    fn test_two_equivalent_targets() {
        let mut lib = and_library();
        lib.add_module(gates::and("AND2_X2", &["I0", "I1"]));
        lib.add_module(gates::nand2("NAND2"));
        let mut design = Design::new();
        design.add_module(gates::and("my_and", &["p", "q"]));
        let mut registry = DesignRegistry::new();
        let report = CellMatch::default()
            .run(&mut design, all, Some(&lib), &mut registry)
            .unwrap();
        assert_eq!(report.targets_of("my_and"), vec!["AND2", "AND2_X2"]);
        let map = registry.get(MAP_DESIGN).unwrap();
        assert_eq!(map.nb_modules(), 2);
        assert!(map.contains("_60_my_and_AND2_X2"));
    }

    #[test]
    fn test_nand_match() {
        let mut lib = and_library();
        lib.add_module(gates::nand2("NAND2"));
        let mut design = Design::new();
        design.add_module(gates::nand2("my_nand"));
        let mut registry = DesignRegistry::new();
        let report = CellMatch::default()
            .run(&mut design, all, Some(&lib), &mut registry)
            .unwrap();
        assert_eq!(report.targets_of("my_nand"), vec!["NAND2"]);
    }

    #[test]
    fn test_full_adder() {
        let mut lib = Design::new();
        lib.add_module(adder::full_adder("FA", ["A", "B", "CI"]));
        lib.add_module(adder::half_adder("HA", true));

        // Permuted inputs and outputs
        let mut m = Module::new("my_fa");
        let c = SigBit::from(m.add_port("c", 1, PortDirection::Input));
        let a = SigBit::from(m.add_port("a", 1, PortDirection::Input));
        let b = SigBit::from(m.add_port("b", 1, PortDirection::Input));
        let ab = m.and(a, b);
        let bc = m.and(b, c);
        let ac = m.and(a, c);
        let co = m.or_n(&[ab, bc, ac]);
        let s = m.xor_n(&[c, b, a]);
        let w_co = m.add_port("cout", 1, PortDirection::Output);
        let w_s = m.add_port("sum", 1, PortDirection::Output);
        m.connect(w_co.into(), co);
        m.connect(w_s.into(), s);
        let mut design = Design::new();
        design.add_module(m);
        design.add_module(adder::half_adder("my_ha", false));

        let mut registry = DesignRegistry::new();
        let report = CellMatch::default()
            .run(&mut design, all, Some(&lib), &mut registry)
            .unwrap();
        assert_eq!(report.targets_of("my_fa"), vec!["FA"]);
        assert_eq!(report.targets_of("my_ha"), vec!["HA"]);
        let conns = rule_connections(&registry, "_60_my_fa_FA");
        assert!(conns.contains(&("co".to_owned(), "cout".to_owned())));
        assert!(conns.contains(&("s".to_owned(), "sum".to_owned())));
        let conns = rule_connections(&registry, "_60_my_ha_HA");
        assert!(conns.contains(&("c".to_owned(), "c".to_owned())));
        assert!(conns.contains(&("s".to_owned(), "s".to_owned())));
    }

    #[test]
    fn test_unused_input() {
        let mut lib = Design::new();
        lib.add_module(gates::and2_unused("AND2_DUMMY"));
        let mut design = Design::new();
        let mut m = Module::new("my_and");
        m.add_port("x", 1, PortDirection::Input);
        let y = SigBit::from(m.add_port("y", 1, PortDirection::Input));
        let z = SigBit::from(m.add_port("z", 1, PortDirection::Input));
        let o = m.and(y, z);
        let out = m.add_port("o", 1, PortDirection::Output);
        m.connect(out.into(), o);
        design.add_module(m);

        let mut registry = DesignRegistry::new();
        let report = CellMatch::default()
            .run(&mut design, all, Some(&lib), &mut registry)
            .unwrap();
        assert_eq!(report.nb_matches(), 1);
        let conns = rule_connections(&registry, "_60_my_and_AND2_DUMMY");
        assert!(conns.contains(&("unused".to_owned(), "x".to_owned())));
    }

    #[test]
    fn test_skipped() {
        let mut lib = and_library();
        lib.add_module(gates::and("AND7", &["a", "b", "c", "d", "e", "f", "g"]));
        let mut design = Design::new();
        design.add_module(gates::and("my_and7", &["a", "b", "c", "d", "e", "f", "g"]));
        design.add_module(testcases::dff("my_dff"));
        let mut registry = DesignRegistry::new();
        let report = CellMatch::default()
            .run(&mut design, all, Some(&lib), &mut registry)
            .unwrap();
        assert_eq!(report.nb_matches(), 0);
        assert_eq!(report.skipped, vec!["my_and7", "my_dff"]);
        assert_eq!(report.nb_analyzed, 0);
        assert_eq!(registry.get(MAP_DESIGN).unwrap().nb_modules(), 0);
    }

    #[test]
    fn test_selection() {
        let mut design = Design::new();
        design.add_module(gates::and("and_a", &["p", "q"]));
        design.add_module(gates::and("and_b", &["p", "q"]));
        let mut registry = DesignRegistry::new();
        let report = CellMatch::default()
            .run(
                &mut design,
                |m| m.name() == "and_b",
                Some(&and_library()),
                &mut registry,
            )
            .unwrap();
        assert_eq!(report.targets_of("and_a"), Vec::<&str>::new());
        assert_eq!(report.targets_of("and_b"), vec!["AND2"]);
    }

    #[test]
    fn test_rules_accumulate() {
        let mut registry = DesignRegistry::new();
        for name in ["first", "second"] {
            let mut design = Design::new();
            design.add_module(gates::and(name, &["p", "q"]));
            CellMatch::default()
                .run(&mut design, all, Some(&and_library()), &mut registry)
                .unwrap();
        }
        let names: Vec<&str> = registry
            .get(MAP_DESIGN)
            .unwrap()
            .modules()
            .map(|m| m.name())
            .collect();
        assert_eq!(names, vec!["_60_first_AND2", "_60_second_AND2"]);
    }

    #[test]
    fn test_lut_attrs() {
        let mut design = Design::new();
        design.add_module(gates::nand2("my_nand"));
        let mut registry = DesignRegistry::new();
        let pass = CellMatch { lut_attrs: true };
        let report = pass.run(&mut design, all, None, &mut registry).unwrap();
        assert_eq!(report.nb_matches(), 0);
        assert_eq!(report.nb_analyzed, 1);
        let m = design.module("my_nand").unwrap();
        let y = m.wire(m.wire_by_name("y").unwrap());
        assert_eq!(y.attributes[LUT_ATTR].as_int(), Some(0b0111));
        assert_eq!(y.attributes[P_CLASS_ATTR].as_int(), Some(0b0111));
    }

    #[test]
    fn test_missing_library() {
        let mut design = Design::new();
        let mut registry = DesignRegistry::new();
        let err = CellMatch::default()
            .run(&mut design, all, None, &mut registry)
            .unwrap_err();
        assert!(matches!(err, Error::MissingLibrary));
    }

    #[test]
    fn test_library_name() {
        let mut design = Design::new();
        design.add_module(gates::and("my_and", &["p", "q"]));
        let mut registry = DesignRegistry::new();
        let err = CellMatch::default()
            .run_with_library_name(&mut design, all, Some("cells"), &mut registry)
            .unwrap_err();
        assert!(matches!(err, Error::MissingDesign(ref n) if n == "cells"));

        registry.insert("cells", and_library());
        let report = CellMatch::default()
            .run_with_library_name(&mut design, all, Some("cells"), &mut registry)
            .unwrap();
        assert_eq!(report.nb_matches(), 1);
    }

    #[test]
    fn test_fatal_errors() {
        let mut design = Design::new();
        let mut m = Module::new("loop");
        let a = SigBit::from(m.add_port("a", 1, PortDirection::Input));
        let w = SigBit::from(m.add_wire("w", 1));
        let x = m.and(a, w);
        let y = m.not(x);
        m.connect(w, y);
        let out = m.add_port("y", 1, PortDirection::Output);
        m.connect(out.into(), y);
        design.add_module(m);
        let mut registry = DesignRegistry::new();
        let err = CellMatch::default()
            .run(&mut design, all, Some(&and_library()), &mut registry)
            .unwrap_err();
        assert!(matches!(err, Error::CombinationalLoop { .. }));
    }

    #[test]
    fn test_ambiguous_rule_names() {
        let mut lib = Design::new();
        lib.add_module(gates::and("L", &["A", "B"]));
        lib.add_module(gates::and("M_L", &["A", "B"]));
        let mut design = Design::new();
        design.add_module(gates::and("D_M", &["a", "b"]));
        design.add_module(gates::and("D", &["a", "b"]));
        let mut registry = DesignRegistry::new();
        // D_M -> L and D -> M_L would both be named _60_D_M_L
        let err = CellMatch::default()
            .run(&mut design, all, Some(&lib), &mut registry)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRule(ref n) if n == "_60_D_M_L"));
        let map = registry.get(MAP_DESIGN).unwrap();
        let rule = map.module("_60_D_M_L").unwrap();
        assert_eq!(rule.attributes[CELLTYPE_ATTR].as_str(), Some("D_M"));
    }

    #[test]
    fn test_rerun_replaces_rules() {
        let mut design = Design::new();
        design.add_module(gates::and("my_and", &["p", "q"]));
        let mut registry = DesignRegistry::new();
        for _ in 0..2 {
            let report = CellMatch::default()
                .run(&mut design, all, Some(&and_library()), &mut registry)
                .unwrap();
            assert_eq!(report.nb_matches(), 1);
        }
        assert_eq!(registry.get(MAP_DESIGN).unwrap().nb_modules(), 1);
    }
}
