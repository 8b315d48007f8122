//! Interpreter state and path results.

use crate::bdd::Bdd;
use crate::reference::Ref;
use crate::route::BddRoute;

/// The symbolic state threaded through a statement list.
///
/// Every condition is over the variables of the input route. Effects are only
/// applied to *live* routes: those inside `reach` that have neither exited nor
/// returned.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TransferResult {
    /// The output route with every committed write.
    pub route: BddRoute,
    /// The output route with buffered writes applied as well.
    pub pending: BddRoute,
    /// The value returned (or exited with) so far. After top-level
    /// finalization, the accept condition.
    pub value: Ref,
    pub exited: Ref,
    pub returned: Ref,
    pub fallthrough: Ref,
    pub suppressed: Ref,
    /// Condition under which this state is reached.
    pub reach: Ref,
    pub default_accept: Ref,
    pub default_accept_local: Ref,
}

impl TransferResult {
    pub fn new(bdd: &Bdd, input: &BddRoute) -> Self {
        TransferResult {
            route: input.clone(),
            pending: input.clone(),
            value: bdd.zero,
            exited: bdd.zero,
            returned: bdd.zero,
            fallthrough: bdd.zero,
            suppressed: bdd.zero,
            reach: bdd.one,
            default_accept: bdd.zero,
            default_accept_local: bdd.zero,
        }
    }

    /// Routes still affected by the next statement.
    pub fn live(&self, bdd: &Bdd) -> Ref {
        let terminated = bdd.apply_or(self.exited, self.returned);
        bdd.apply_diff(self.reach, terminated)
    }

    pub fn accept(&self) -> Ref {
        self.value
    }

    /// Field-wise `ite(cond, then, other)`.
    pub fn ite(bdd: &Bdd, cond: Ref, then: &Self, other: &Self) -> Self {
        if cond == bdd.one {
            return then.clone();
        }
        if cond == bdd.zero {
            return other.clone();
        }
        let ite = |a: Ref, b: Ref| bdd.apply_ite(cond, a, b);
        TransferResult {
            route: BddRoute::ite(bdd, cond, &then.route, &other.route),
            pending: BddRoute::ite(bdd, cond, &then.pending, &other.pending),
            value: ite(then.value, other.value),
            exited: ite(then.exited, other.exited),
            returned: ite(then.returned, other.returned),
            fallthrough: ite(then.fallthrough, other.fallthrough),
            suppressed: ite(then.suppressed, other.suppressed),
            reach: ite(then.reach, other.reach),
            default_accept: ite(then.default_accept, other.default_accept),
            default_accept_local: ite(then.default_accept_local, other.default_accept_local),
        }
    }

    /// Fold path states with disjoint `reach` into one state.
    pub fn merge_paths(bdd: &Bdd, states: Vec<Self>) -> Option<Self> {
        let mut iter = states.into_iter().rev();
        let last = iter.next()?;
        Some(iter.fold(last, |acc, s| {
            let mut merged = TransferResult::ite(bdd, s.reach, &s, &acc);
            merged.reach = bdd.apply_or(s.reach, acc.reach);
            merged
        }))
    }

    /// Apply buffered writes. Routes that returned without exiting drop them.
    pub fn commit(&mut self, bdd: &Bdd) {
        let discard = bdd.apply_diff(self.returned, self.exited);
        self.route = BddRoute::ite(bdd, discard, &self.route, &self.pending);
        self.pending = self.route.clone();
    }
}

/// One control-flow path: where it leads, when it is taken, and its disposition.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TransferReturn {
    pub route: BddRoute,
    pub condition: Ref,
    pub accepted: bool,
}

impl TransferReturn {
    pub fn new(route: BddRoute, condition: Ref, accepted: bool) -> Self {
        TransferReturn {
            route,
            condition,
            accepted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integer::BddInteger;
    use crate::route::{RouteLayout, INT_BITS};
    use test_log::test;

    #[test]
    fn test_commit() {
        let bdd = Bdd::default();
        let input = BddRoute::new(&bdd, &RouteLayout::new(1, 1, []));
        let mut state = TransferResult::new(&bdd, &input);
        state.pending.tag = BddInteger::constant(&bdd, INT_BITS, 7);
        let x = input.prefix_length.value(&bdd, 8);
        state.returned = x;

        let mut committed = state.clone();
        committed.commit(&bdd);
        let seven = committed.route.tag.value(&bdd, 7);
        assert_eq!(bdd.apply_and(-x, seven), -x);
        assert!(!bdd.is_implies(x, seven));
        assert_eq!(committed.route, committed.pending);
    }

    #[test]
    fn test_merge_paths() {
        let bdd = Bdd::default();
        let input = BddRoute::new(&bdd, &RouteLayout::new(1, 1, []));
        let g = input.prefix_length.value(&bdd, 24);

        let mut a = TransferResult::new(&bdd, &input);
        a.reach = g;
        a.value = g;
        a.exited = g;
        let mut b = TransferResult::new(&bdd, &input);
        b.reach = -g;
        b.route.tag = BddInteger::constant(&bdd, INT_BITS, 1);

        let merged = TransferResult::merge_paths(&bdd, vec![a.clone(), b.clone()]).unwrap();
        assert_eq!(merged.reach, bdd.one);
        assert_eq!(merged.value, g);
        assert_eq!(merged.exited, g);
        assert_eq!(merged, {
            let mut m = TransferResult::ite(&bdd, g, &a, &b);
            m.reach = bdd.one;
            m
        });
        assert!(TransferResult::merge_paths(&bdd, vec![]).is_none());
    }
}
