use std::fmt;
use std::ops::{BitAnd, Not};

/// Maximum number of variables of a [`FunctionTable`]
pub const MAX_VARS: usize = 6;

/// Input patterns of each variable: bit j of the i-th sieve is bit i of j
const SIEVES: [u64; MAX_VARS] = [
    0xaaaa_aaaa_aaaa_aaaa,
    0xcccc_cccc_cccc_cccc,
    0xf0f0_f0f0_f0f0_f0f0,
    0xff00_ff00_ff00_ff00,
    0xffff_0000_ffff_0000,
    0xffff_ffff_0000_0000,
];

/// Truth table of a boolean function with up to 6 inputs, packed in a 64-bit word
///
/// Bit j holds the value of the function when its inputs take the values of the
/// binary representation of j, input 0 being the least significant bit.
/// Bits above 2^k are always zero for a k-input function, so that tables can
/// be compared directly.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct FunctionTable {
    nb_vars: u8,
    bits: u64,
}

impl FunctionTable {
    /// Create a table from its bits; bits outside of the active width are dropped
    pub fn new(nb_vars: usize, bits: u64) -> FunctionTable {
        assert!(nb_vars <= MAX_VARS, "At most {MAX_VARS} variables are supported");
        FunctionTable {
            nb_vars: nb_vars as u8,
            bits: bits & Self::mask(nb_vars),
        }
    }

    /// Mask of the bits used by a table with this number of variables
    pub fn mask(nb_vars: usize) -> u64 {
        if nb_vars >= MAX_VARS {
            !0
        } else {
            (1u64 << (1 << nb_vars)) - 1
        }
    }

    /// Constant zero function
    pub fn zero(nb_vars: usize) -> FunctionTable {
        FunctionTable::new(nb_vars, 0)
    }

    /// Constant one function
    pub fn one(nb_vars: usize) -> FunctionTable {
        FunctionTable::new(nb_vars, !0)
    }

    /// Function returning the value of one of the variables
    pub fn nth_var(nb_vars: usize, var: usize) -> FunctionTable {
        assert!(var < nb_vars);
        FunctionTable::new(nb_vars, SIEVES[var])
    }

    /// Number of variables
    pub fn nb_vars(&self) -> usize {
        self.nb_vars as usize
    }

    /// Number of rows in the table
    pub fn num_bits(&self) -> usize {
        1 << self.nb_vars
    }

    /// Raw bits
    pub fn bits(&self) -> u64 {
        self.bits
    }

    /// Value of the function for a given input assignment
    pub fn value(&self, mask: usize) -> bool {
        assert!(mask < self.num_bits());
        (self.bits >> mask) & 1 != 0
    }

    /// Relabel the variables
    ///
    /// Row j of the result is row m of this table, where m is obtained by moving
    /// each set bit l of j to position `perm[l]`.
    pub fn permute(&self, perm: &[usize]) -> FunctionTable {
        assert_eq!(perm.len(), self.nb_vars());
        let mut ret = 0u64;
        for j in 0..self.num_bits() {
            let mut m = 0;
            for (l, p) in perm.iter().enumerate() {
                if (j >> l) & 1 != 0 {
                    m |= 1 << p;
                }
            }
            if self.value(m) {
                ret |= 1u64 << j;
            }
        }
        FunctionTable::new(self.nb_vars(), ret)
    }
}

impl Not for FunctionTable {
    type Output = FunctionTable;
    fn not(self) -> FunctionTable {
        FunctionTable::new(self.nb_vars(), !self.bits)
    }
}

impl BitAnd for FunctionTable {
    type Output = FunctionTable;
    fn bitand(self, rhs: FunctionTable) -> FunctionTable {
        assert_eq!(self.nb_vars, rhs.nb_vars);
        FunctionTable::new(self.nb_vars(), self.bits & rhs.bits)
    }
}

impl fmt::Display for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = std::cmp::max(1, self.num_bits() / 4);
        write!(f, "{:0width$x}", self.bits, width = width)
    }
}

#[cfg(test)]
mod tests {
    use super::FunctionTable;

    #[test]
    fn test_sieves() {
        assert_eq!(FunctionTable::nth_var(2, 0).bits(), 0b1010);
        assert_eq!(FunctionTable::nth_var(2, 1).bits(), 0b1100);
        assert_eq!(FunctionTable::nth_var(3, 2).bits(), 0xf0);
        assert_eq!(FunctionTable::nth_var(6, 5).bits(), 0xffff_ffff_0000_0000);
        for k in 1..=6 {
            for i in 0..k {
                let t = FunctionTable::nth_var(k, i);
                for j in 0..t.num_bits() {
                    assert_eq!(t.value(j), (j >> i) & 1 != 0);
                }
            }
        }
    }

    #[test]
    fn test_masking() {
        assert_eq!(FunctionTable::mask(0), 0x1);
        assert_eq!(FunctionTable::mask(2), 0xf);
        assert_eq!(FunctionTable::mask(6), !0);
        assert_eq!(FunctionTable::one(2).bits(), 0xf);
        assert_eq!(FunctionTable::one(0).bits(), 0x1);
        let a = FunctionTable::nth_var(2, 0);
        assert_eq!((!a).bits(), 0b0101);
        assert_eq!(!!a, a);
    }

    #[test]
    fn test_and() {
        let a = FunctionTable::nth_var(2, 0);
        let b = FunctionTable::nth_var(2, 1);
        assert_eq!((a & b).bits(), 0b1000);
        assert_eq!((!(a & b)).bits(), 0b0111);
    }

    #[test]
    fn test_permute() {
        let a = FunctionTable::nth_var(3, 0);
        let c = FunctionTable::nth_var(3, 2);
        // Variable 0 of the result reads variable 2 of the original
        assert_eq!(c.permute(&[2, 1, 0]), a);
        assert_eq!(a.permute(&[0, 1, 2]), a);
        let f = a & !c;
        assert_eq!(f.permute(&[2, 1, 0]), c & !a);
        // Cyclic relabeling
        let b = FunctionTable::nth_var(3, 1);
        assert_eq!(a.permute(&[1, 2, 0]), c);
        assert_eq!(b.permute(&[1, 2, 0]), a);
    }

    #[test]
    fn test_display() {
        let a = FunctionTable::nth_var(2, 0);
        let b = FunctionTable::nth_var(2, 1);
        assert_eq!((a & b).to_string(), "8");
        assert_eq!(FunctionTable::nth_var(4, 3).to_string(), "ff00");
        assert_eq!(FunctionTable::zero(0).to_string(), "0");
    }
}
