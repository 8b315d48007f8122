use std::fmt::{Display, Formatter};
use std::ops::Neg;

use crate::utils::MyHash;

/// Handle to a node in a [`Bdd`][crate::bdd::Bdd] pool.
///
/// The sign carries the complement bit: `-r` is the negation of `r`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Ref(i32);

impl Ref {
    pub(crate) const fn positive(index: u32) -> Self {
        Self(index as i32)
    }

    pub const fn is_negated(self) -> bool {
        self.0 < 0
    }

    pub const fn negate(self) -> Self {
        Self(-self.0)
    }

    /// Index of the underlying node, ignoring the complement bit.
    pub const fn index(self) -> u32 {
        self.0.unsigned_abs()
    }

    /// Regular (non-complemented) version of this reference.
    pub const fn regular(self) -> Self {
        Self(self.0.abs())
    }

    pub(crate) fn as_lit(self) -> u64 {
        ((self.0.unsigned_abs() as u64) << 1) | self.is_negated() as u64
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", if self.is_negated() { "~" } else { "" }, self.index())
    }
}

impl MyHash for Ref {
    fn hash(&self) -> u64 {
        self.as_lit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_negation() {
        let r = Ref::positive(5);
        assert!(!r.is_negated());
        assert!((-r).is_negated());
        assert_eq!(-(-r), r);
        assert_eq!((-r).index(), 5);
        assert_eq!((-r).regular(), r);
    }

    #[test]
    fn test_display() {
        let r = Ref::positive(3);
        assert_eq!(r.to_string(), "@3");
        assert_eq!((-r).to_string(), "~@3");
    }

    #[test]
    fn test_lit_is_distinct_per_sign() {
        let r = Ref::positive(7);
        assert_ne!(r.as_lit(), (-r).as_lit());
    }
}
