//! Type-safe wrappers for BDD variables and literals.
use std::fmt;
use std::ops::Neg;

/// A variable identifier (1-indexed).
///
/// # Invariants
///
/// - Variable IDs must be >= 1 (0 is reserved for terminals)
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(u32);

impl Var {
    /// Creates a new variable with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if `id == 0`. Variables must be 1-indexed.
    pub fn new(id: u32) -> Self {
        assert_ne!(id, 0, "Variable IDs must be >= 1");
        Var(id)
    }

    /// Returns the raw variable ID as a `u32`.
    pub fn id(self) -> u32 {
        self.0
    }

    /// Positive literal of this variable.
    pub fn pos(self) -> Lit {
        Lit::new(self, true)
    }

    /// Negative literal of this variable.
    pub fn neg(self) -> Lit {
        Lit::new(self, false)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.0
    }
}

/// A variable together with a polarity.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Lit {
    var: Var,
    positive: bool,
}

impl Lit {
    pub fn new(var: Var, positive: bool) -> Self {
        Lit { var, positive }
    }

    pub fn var(self) -> Var {
        self.var
    }

    pub fn is_positive(self) -> bool {
        self.positive
    }

    /// Signed DIMACS-style encoding: `v` or `-v`.
    pub fn to_dimacs(self) -> i32 {
        let v = self.var.id() as i32;
        if self.positive {
            v
        } else {
            -v
        }
    }

    pub fn from_dimacs(lit: i32) -> Self {
        Lit::new(Var::new(lit.unsigned_abs()), lit > 0)
    }
}

impl From<i32> for Lit {
    fn from(lit: i32) -> Self {
        Lit::from_dimacs(lit)
    }
}

impl Neg for Lit {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Lit::new(self.var, !self.positive)
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.positive {
            write!(f, "{}", self.var)
        } else {
            write!(f, "~{}", self.var)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_var_literals() {
        let v = Var::new(3);
        assert_eq!(v.pos().to_dimacs(), 3);
        assert_eq!(v.neg().to_dimacs(), -3);
        assert_eq!(-v.pos(), v.neg());
        assert_eq!(v.neg().to_string(), "~x3");
    }

    #[test]
    fn test_from_dimacs() {
        let lit = Lit::from(-5);
        assert_eq!(lit.var(), Var::new(5));
        assert!(!lit.is_positive());
        assert_eq!(Lit::from_dimacs(lit.to_dimacs()), lit);
    }

    #[test]
    #[should_panic(expected = "Variable IDs must be >= 1")]
    fn test_zero_var_panics() {
        Var::new(0);
    }
}
