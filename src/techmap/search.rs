//! Exhaustive search for the port permutations between two modules

use itertools::Itertools;
use log::trace;

use crate::sim::FunctionTable;
use crate::techmap::Target;

/// Find permutations of the inputs and outputs of a target that reproduce a module
///
/// Input permutations are the outer loop and output permutations the inner
/// loop, both in lexicographic order. The first matching pair is returned: for
/// each output i, `target.tables[out_perm[i]].permute(&in_perm) == tables[i]`.
/// Input i of the module then connects to `target.inputs[in_perm[i]]`, and
/// output i to `target.outputs[out_perm[i]]`.
pub fn find_match(
    tables: &[FunctionTable],
    nb_inputs: usize,
    target: &Target,
) -> Option<(Vec<usize>, Vec<usize>)> {
    if target.inputs.len() != nb_inputs || target.outputs.len() != tables.len() {
        trace!(
            "Target {} has {} inputs and {} outputs, expected {} and {}",
            target.module,
            target.inputs.len(),
            target.outputs.len(),
            nb_inputs,
            tables.len()
        );
        return None;
    }
    let nb_outputs = tables.len();
    for in_perm in (0..nb_inputs).permutations(nb_inputs) {
        // Permute the target tables once for all output permutations
        let permuted: Vec<FunctionTable> =
            target.tables.iter().map(|t| t.permute(&in_perm)).collect();
        for out_perm in (0..nb_outputs).permutations(nb_outputs) {
            let matched = tables
                .iter()
                .zip(out_perm.iter())
                .all(|(t, o)| permuted[*o] == *t);
            if matched {
                trace!(
                    "Target {} matches with inputs {:?} and outputs {:?}",
                    target.module,
                    in_perm,
                    out_perm
                );
                return Some((in_perm, out_perm));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::find_match;
    use crate::sim::FunctionTable;
    use crate::techmap::Target;

    fn target(nb_inputs: usize, tables: Vec<FunctionTable>) -> Target {
        Target {
            module: "t".to_owned(),
            inputs: (0..nb_inputs).map(|i| format!("i{i}")).collect(),
            outputs: (0..tables.len()).map(|i| format!("o{i}")).collect(),
            tables,
        }
    }

    #[test]
    fn test_identity() {
        let a = FunctionTable::nth_var(2, 0);
        let b = FunctionTable::nth_var(2, 1);
        let t = target(2, vec![a & b]);
        assert_eq!(find_match(&[a & b], 2, &t), Some((vec![0, 1], vec![0])));
    }

    #[test]
    fn test_input_swap() {
        let a = FunctionTable::nth_var(2, 0);
        let b = FunctionTable::nth_var(2, 1);
        let t = target(2, vec![a & !b]);
        assert_eq!(find_match(&[!a & b], 2, &t), Some((vec![1, 0], vec![0])));
    }

    #[test]
    fn test_output_swap() {
        let a = FunctionTable::nth_var(2, 0);
        let b = FunctionTable::nth_var(2, 1);
        let t = target(2, vec![a & b, !(a & b)]);
        assert_eq!(
            find_match(&[!(a & b), a & b], 2, &t),
            Some((vec![0, 1], vec![1, 0]))
        );
    }

    #[test]
    fn test_combined() {
        let a = FunctionTable::nth_var(3, 0);
        let b = FunctionTable::nth_var(3, 1);
        let c = FunctionTable::nth_var(3, 2);
        let t = target(3, vec![a & !b, !c]);
        let tables = [!a, c & !b];
        let (in_perm, out_perm) = find_match(&tables, 3, &t).unwrap();
        for (i, o) in out_perm.iter().enumerate() {
            assert_eq!(t.tables[*o].permute(&in_perm), tables[i]);
        }
        assert_eq!(out_perm, vec![1, 0]);
    }

    #[test]
    fn test_count_mismatch() {
        let a = FunctionTable::nth_var(2, 0);
        let t = target(2, vec![a]);
        assert_eq!(find_match(&[a, a], 2, &t), None);
        let a3 = FunctionTable::nth_var(3, 0);
        assert_eq!(find_match(&[a3], 3, &t), None);
    }

    #[test]
    fn test_no_match() {
        let a = FunctionTable::nth_var(2, 0);
        let b = FunctionTable::nth_var(2, 1);
        let t = target(2, vec![a & b]);
        assert_eq!(find_match(&[!(a & b)], 2, &t), None);
    }

    #[test]
    fn test_unused_input() {
        let a = FunctionTable::nth_var(3, 0);
        let b = FunctionTable::nth_var(3, 1);
        let c = FunctionTable::nth_var(3, 2);
        let t = target(3, vec![b & c]);
        let (in_perm, out_perm) = find_match(&[a & b], 3, &t).unwrap();
        assert_eq!(t.tables[out_perm[0]].permute(&in_perm), a & b);
        // First permutation in lexicographic order that works
        assert_eq!(in_perm, vec![1, 2, 0]);
    }
}
