//! Fixed-width unsigned integers as vectors of BDD bits.

use std::collections::HashMap;

use crate::bdd::Bdd;
use crate::reference::Ref;

/// A symbolic unsigned integer. Bits are stored most significant first.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BddInteger {
    bits: Vec<Ref>,
}

impl BddInteger {
    /// An integer whose bits are the variables `first_var..first_var + width`.
    pub fn vars(bdd: &Bdd, first_var: u32, width: usize) -> Self {
        let bits = (0..width as u32).map(|i| bdd.mk_var(first_var + i)).collect();
        Self { bits }
    }

    pub fn constant(bdd: &Bdd, width: usize, value: u64) -> Self {
        assert!(width <= 64);
        assert!(
            width == 64 || value < (1u64 << width),
            "Value {} does not fit in {} bits",
            value,
            width
        );
        let bits = (0..width)
            .map(|i| bdd.constant((value >> (width - 1 - i)) & 1 == 1))
            .collect();
        Self { bits }
    }

    pub fn zero(bdd: &Bdd, width: usize) -> Self {
        Self::constant(bdd, width, 0)
    }

    pub fn width(&self) -> usize {
        self.bits.len()
    }

    pub fn bits(&self) -> &[Ref] {
        &self.bits
    }

    pub fn max_value(&self) -> u64 {
        if self.width() == 64 {
            u64::MAX
        } else {
            (1u64 << self.width()) - 1
        }
    }

    fn bit_of(&self, value: u64, i: usize) -> bool {
        (value >> (self.width() - 1 - i)) & 1 == 1
    }

    /// Condition under which the integer equals `value`.
    pub fn value(&self, bdd: &Bdd, value: u64) -> Ref {
        if value > self.max_value() {
            return bdd.zero;
        }
        self.bits.iter().enumerate().rev().fold(bdd.one, |acc, (i, &b)| {
            let lit = if self.bit_of(value, i) { b } else { -b };
            bdd.apply_and(lit, acc)
        })
    }

    /// Condition under which the integer is at least `value`.
    pub fn geq(&self, bdd: &Bdd, value: u64) -> Ref {
        if value > self.max_value() {
            return bdd.zero;
        }
        self.bits.iter().enumerate().rev().fold(bdd.one, |acc, (i, &b)| {
            if self.bit_of(value, i) {
                bdd.apply_and(b, acc)
            } else {
                bdd.apply_or(b, acc)
            }
        })
    }

    /// Condition under which the integer is at most `value`.
    pub fn leq(&self, bdd: &Bdd, value: u64) -> Ref {
        if value >= self.max_value() {
            return bdd.one;
        }
        self.bits.iter().enumerate().rev().fold(bdd.one, |acc, (i, &b)| {
            if self.bit_of(value, i) {
                bdd.apply_or(-b, acc)
            } else {
                bdd.apply_and(-b, acc)
            }
        })
    }

    pub fn gt(&self, bdd: &Bdd, value: u64) -> Ref {
        if value >= self.max_value() {
            bdd.zero
        } else {
            self.geq(bdd, value + 1)
        }
    }

    pub fn lt(&self, bdd: &Bdd, value: u64) -> Ref {
        if value == 0 {
            bdd.zero
        } else {
            self.leq(bdd, value - 1)
        }
    }

    /// Condition under which `lo <= self <= hi`.
    pub fn range(&self, bdd: &Bdd, lo: u64, hi: u64) -> Ref {
        bdd.apply_and(self.geq(bdd, lo), self.leq(bdd, hi))
    }

    /// Condition under which the first `len` bits equal those of `value`.
    pub fn first_bits_equal(&self, bdd: &Bdd, value: u64, len: usize) -> Ref {
        assert!(len <= self.width());
        self.bits[..len]
            .iter()
            .enumerate()
            .rev()
            .fold(bdd.one, |acc, (i, &b)| {
                let lit = if self.bit_of(value, i) { b } else { -b };
                bdd.apply_and(lit, acc)
            })
    }

    /// Bitwise `ite(cond, then, else)`.
    pub fn ite(bdd: &Bdd, cond: Ref, then: &Self, other: &Self) -> Self {
        assert_eq!(then.width(), other.width(), "Width mismatch");
        let bits = then
            .bits
            .iter()
            .zip(&other.bits)
            .map(|(&t, &e)| bdd.apply_ite(cond, t, e))
            .collect();
        Self { bits }
    }

    /// Concrete value under an assignment; missing variables are false.
    pub fn eval(&self, bdd: &Bdd, assignment: &HashMap<u32, bool>) -> u64 {
        self.bits
            .iter()
            .fold(0, |acc, &b| (acc << 1) | bdd.evaluate(b, assignment) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn assignment_for(x: &BddInteger, bdd: &Bdd, value: u64) -> HashMap<u32, bool> {
        let width = x.width();
        x.bits()
            .iter()
            .enumerate()
            .map(|(i, &b)| (bdd.variable(b.index()), (value >> (width - 1 - i)) & 1 == 1))
            .collect()
    }

    #[test]
    fn test_value_and_eval() {
        let bdd = Bdd::default();
        let x = BddInteger::vars(&bdd, 1, 4);

        let eq = x.value(&bdd, 5);
        assert_eq!(eq, bdd.cube([-1, 2, -3, 4]));
        assert_eq!(x.value(&bdd, 16), bdd.zero);

        let assignment = assignment_for(&x, &bdd, 11);
        assert_eq!(x.eval(&bdd, &assignment), 11);
    }

    #[test]
    fn test_comparisons_exhaustive() {
        let bdd = Bdd::default();
        let x = BddInteger::vars(&bdd, 1, 4);

        for v in 0..16u64 {
            let geq = x.geq(&bdd, v);
            let leq = x.leq(&bdd, v);
            let gt = x.gt(&bdd, v);
            let lt = x.lt(&bdd, v);
            for n in 0..16u64 {
                let a = assignment_for(&x, &bdd, n);
                assert_eq!(bdd.evaluate(geq, &a), n >= v, "{} >= {}", n, v);
                assert_eq!(bdd.evaluate(leq, &a), n <= v, "{} <= {}", n, v);
                assert_eq!(bdd.evaluate(gt, &a), n > v, "{} > {}", n, v);
                assert_eq!(bdd.evaluate(lt, &a), n < v, "{} < {}", n, v);
            }
        }
    }

    #[test]
    fn test_range() {
        let bdd = Bdd::default();
        let x = BddInteger::vars(&bdd, 1, 6);

        let r = x.range(&bdd, 16, 24);
        let expected = bdd.apply_or_many((16..=24).map(|v| x.value(&bdd, v)));
        assert_eq!(r, expected);
        assert_eq!(x.range(&bdd, 0, 63), bdd.one);
    }

    #[test]
    fn test_first_bits_equal() {
        let bdd = Bdd::default();
        let x = BddInteger::vars(&bdd, 1, 8);

        assert_eq!(x.first_bits_equal(&bdd, 0b1010_0000, 3), bdd.cube([1, -2, 3]));
        assert_eq!(x.first_bits_equal(&bdd, 0xFF, 0), bdd.one);
    }

    #[test]
    fn test_ite_and_constant() {
        let bdd = Bdd::default();
        let c = bdd.mk_var(10);
        let a = BddInteger::constant(&bdd, 8, 42);
        let b = BddInteger::constant(&bdd, 8, 7);

        let x = BddInteger::ite(&bdd, c, &a, &b);
        assert_eq!(BddInteger::ite(&bdd, bdd.one, &a, &b), a);
        assert_eq!(x.value(&bdd, 42), c);
        assert_eq!(x.value(&bdd, 7), -c);
        assert_eq!(BddInteger::zero(&bdd, 8).value(&bdd, 0), bdd.one);
    }
}
