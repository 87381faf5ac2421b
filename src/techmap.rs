//! Technology mapping by functional matching against a cell library
//!
//! Each combinational module of a design is reduced to the truth tables of its
//! outputs. Library modules are indexed by the canonical labels of their tables,
//! and candidates sharing the same labels are searched for a permutation of
//! inputs and outputs that makes both modules identical. Every match produces a
//! rule module, consumed by a downstream techmap pass to replace instances of
//! the design module by instances of the library cell.

mod canon;
mod library;
mod pass;
mod rule;
mod search;

pub use canon::{canonical_label, fingerprint, Fingerprint};
pub use library::{LibraryIndex, Target};
pub use pass::{CellMatch, MatchReport, RuleMatch, LUT_ATTR, MAP_DESIGN, P_CLASS_ATTR};
pub use rule::{emit_rule, rule_name, CELLTYPE_ATTR, REPLACE_CELL};
pub use search::find_match;
