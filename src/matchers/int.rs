use crate::ast::{IntComparator, IntComparison};
use crate::bdd::Bdd;
use crate::integer::BddInteger;
use crate::reference::Ref;

/// Condition under which `value` satisfies the comparison.
pub fn compare(bdd: &Bdd, value: &BddInteger, cmp: IntComparison) -> Ref {
    match cmp.cmp {
        IntComparator::Eq => value.value(bdd, cmp.value),
        IntComparator::Ge => value.geq(bdd, cmp.value),
        IntComparator::Gt => value.gt(bdd, cmp.value),
        IntComparator::Le => value.leq(bdd, cmp.value),
        IntComparator::Lt => value.lt(bdd, cmp.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_compare() {
        let bdd = Bdd::default();
        let x = BddInteger::vars(&bdd, 1, 8);
        let ge = compare(&bdd, &x, IntComparison::new(IntComparator::Ge, 100));
        let lt = compare(&bdd, &x, IntComparison::new(IntComparator::Lt, 100));
        assert_eq!(ge, -lt);
        let le = compare(&bdd, &x, IntComparison::new(IntComparator::Le, 100));
        let gt = compare(&bdd, &x, IntComparison::new(IntComparator::Gt, 100));
        assert_eq!(le, -gt);
        let eq = compare(&bdd, &x, IntComparison::eq(100));
        assert_eq!(eq, bdd.apply_and(ge, le));
        assert_eq!(compare(&bdd, &x, IntComparison::eq(300)), bdd.zero);
    }
}
