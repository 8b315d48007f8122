//! Finite enumerated domains encoded in a [`BddInteger`].

use std::collections::HashMap;

use crate::bdd::Bdd;
use crate::integer::BddInteger;
use crate::reference::Ref;

/// Number of bits needed to encode `n` distinct values (at least one).
pub fn bits_for(n: usize) -> usize {
    let mut bits = 1;
    while (1usize << bits) < n {
        bits += 1;
    }
    bits
}

/// A symbolic choice among a fixed list of values, encoded by index.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BddDomain<T> {
    values: Vec<T>,
    integer: BddInteger,
}

impl<T> BddDomain<T>
where
    T: Eq,
{
    /// A domain over fresh variables starting at `first_var`.
    pub fn vars(bdd: &Bdd, values: Vec<T>, first_var: u32) -> Self {
        assert!(!values.is_empty(), "Domain must not be empty");
        let integer = BddInteger::vars(bdd, first_var, bits_for(values.len()));
        Self { values, integer }
    }

    /// A domain fixed to the value at `index`.
    pub fn constant(bdd: &Bdd, values: Vec<T>, index: usize) -> Self {
        assert!(index < values.len());
        let integer = BddInteger::constant(bdd, bits_for(values.len()), index as u64);
        Self { values, integer }
    }

    pub fn num_bits(&self) -> usize {
        self.integer.width()
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn integer(&self) -> &BddInteger {
        &self.integer
    }

    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.values.iter().position(|v| v == value)
    }

    /// Condition under which the domain holds `value`; zero for foreign values.
    pub fn value(&self, bdd: &Bdd, value: &T) -> Ref {
        match self.index_of(value) {
            Some(index) => self.integer.value(bdd, index as u64),
            None => bdd.zero,
        }
    }

    /// The same domain with its value overwritten by `value`. Returns `None` for foreign values.
    pub fn with_value(&self, bdd: &Bdd, value: &T) -> Option<Self>
    where
        T: Clone,
    {
        let index = self.index_of(value)?;
        let integer = BddInteger::constant(bdd, self.num_bits(), index as u64);
        Some(Self {
            values: self.values.clone(),
            integer,
        })
    }

    /// The encoding holds the index of an actual value.
    pub fn is_valid(&self, bdd: &Bdd) -> Ref {
        self.integer.leq(bdd, (self.values.len() - 1) as u64)
    }

    pub fn ite(bdd: &Bdd, cond: Ref, then: &Self, other: &Self) -> Self
    where
        T: Clone,
    {
        assert!(then.values == other.values, "Domain mismatch");
        Self {
            values: then.values.clone(),
            integer: BddInteger::ite(bdd, cond, &then.integer, &other.integer),
        }
    }

    /// Concrete value under an assignment; `None` for an invalid encoding.
    pub fn eval(&self, bdd: &Bdd, assignment: &HashMap<u32, bool>) -> Option<&T> {
        let index = self.integer.eval(bdd, assignment) as usize;
        self.values.get(index)
    }
}
