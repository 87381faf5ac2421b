//! Canonical labels of function tables under input permutation

use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;

use crate::sim::FunctionTable;

/// Smallest table obtained by permuting the inputs of a function (its P-class)
///
/// All k! permutations are enumerated in lexicographic order. Ties are resolved
/// in favour of the last permutation seen, which does not change the label but
/// keeps the enumeration identical to the search in [`crate::techmap::find_match`].
/// Input and output polarities are not considered: a function and its
/// complement usually have different labels.
pub fn canonical_label(table: &FunctionTable) -> FunctionTable {
    let k = table.nb_vars();
    let mut best = *table;
    for perm in (0..k).permutations(k) {
        let t = table.permute(&perm);
        if t <= best {
            best = t;
        }
    }
    best
}

/// Set of the canonical labels of the outputs of a module
///
/// Two modules equivalent up to a permutation of inputs and outputs always have
/// the same fingerprint. The converse is not true, so it is only used as a filter.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Default)]
pub struct Fingerprint(BTreeSet<FunctionTable>);

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0.iter().join(", "))
    }
}

/// Compute the fingerprint of a module from its output tables
pub fn fingerprint(tables: &[FunctionTable]) -> Fingerprint {
    Fingerprint(tables.iter().map(canonical_label).collect())
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use rand::rngs::SmallRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    use super::{canonical_label, fingerprint};
    use crate::sim::FunctionTable;

    fn random_table(rng: &mut SmallRng, k: usize) -> FunctionTable {
        FunctionTable::new(k, rng.gen())
    }

    #[test]
    fn test_basic_labels() {
        let a = FunctionTable::nth_var(3, 0);
        let b = FunctionTable::nth_var(3, 1);
        let c = FunctionTable::nth_var(3, 2);
        assert_eq!(canonical_label(&a), a);
        assert_eq!(canonical_label(&b), a);
        assert_eq!(canonical_label(&c), a);
        assert_eq!(canonical_label(&(b & c)), a & b);
        assert_eq!(canonical_label(&FunctionTable::zero(3)), FunctionTable::zero(3));
        assert_eq!(canonical_label(&FunctionTable::one(3)), FunctionTable::one(3));
    }

    #[test]
    fn test_no_polarity() {
        let a = FunctionTable::nth_var(2, 0);
        let b = FunctionTable::nth_var(2, 1);
        assert_ne!(canonical_label(&(a & b)), canonical_label(&!(a & b)));
        assert_ne!(canonical_label(&(a & !b)), canonical_label(&(a & b)));
    }

    #[test]
    fn test_zero_vars() {
        let t = FunctionTable::one(0);
        assert_eq!(canonical_label(&t), t);
        assert_eq!(canonical_label(&FunctionTable::zero(0)), FunctionTable::zero(0));
    }

    #[test]
    fn test_exhaustive_two_vars() {
        for bits in 0..16 {
            let t = FunctionTable::new(2, bits);
            let l = canonical_label(&t);
            assert!(l <= t);
            assert_eq!(canonical_label(&t.permute(&[1, 0])), l);
        }
    }

    #[test]
    fn test_permutation_invariance() {
        let mut rng = SmallRng::seed_from_u64(1);
        for k in 0..=6 {
            for _ in 0..20 {
                let t = random_table(&mut rng, k);
                let label = canonical_label(&t);
                let mut perm: Vec<usize> = (0..k).collect();
                perm.shuffle(&mut rng);
                assert_eq!(canonical_label(&t.permute(&perm)), label);
                assert_eq!(canonical_label(&label), label);
            }
        }
    }

    #[test]
    fn test_all_permutations() {
        let mut rng = SmallRng::seed_from_u64(2);
        let t = random_table(&mut rng, 4);
        let label = canonical_label(&t);
        for perm in (0..4).permutations(4) {
            assert_eq!(canonical_label(&t.permute(&perm)), label);
        }
    }

    #[test]
    fn test_fingerprint_invariance() {
        let mut rng = SmallRng::seed_from_u64(3);
        for k in 1..=5 {
            let tables: Vec<FunctionTable> = (0..3).map(|_| random_table(&mut rng, k)).collect();
            let fp = fingerprint(&tables);
            let mut in_perm: Vec<usize> = (0..k).collect();
            in_perm.shuffle(&mut rng);
            let mut permuted: Vec<FunctionTable> =
                tables.iter().map(|t| t.permute(&in_perm)).collect();
            permuted.shuffle(&mut rng);
            assert_eq!(fingerprint(&permuted), fp);
        }
    }

    #[test]
    fn test_fingerprint_set() {
        let a = FunctionTable::nth_var(2, 0);
        let b = FunctionTable::nth_var(2, 1);
        // Both outputs have the same label
        let fp = fingerprint(&[a, b]);
        assert_eq!(fp, fingerprint(&[a]));
        assert_eq!(fp.to_string(), "{a}");
        assert_eq!(fingerprint(&[]).to_string(), "{}");
        assert_eq!(fingerprint(&[a & b]).to_string(), "{8}");
    }
}
