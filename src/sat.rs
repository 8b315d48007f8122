use std::collections::HashMap;

use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::reference::Ref;
use crate::types::{Lit, Var};

impl Bdd {
    /// Returns one satisfying cube of `node`, if any exists.
    ///
    /// The walk prefers the high branch, so variables that are free along
    /// the chosen path are simply absent from the result.
    pub fn one_sat(&self, node: Ref) -> Option<Vec<Lit>> {
        if self.is_zero(node) {
            return None;
        }

        let mut path = Vec::new();
        let mut current = node;

        while !self.is_one(current) {
            let var = Var::new(self.variable(current.index()));
            let high = self.high_node(current);
            if !self.is_zero(high) {
                path.push(var.pos());
                current = high;
            } else {
                path.push(var.neg());
                current = self.low_node(current);
            }
        }

        Some(path)
    }

    /// Number of satisfying assignments of `node` over `num_vars` variables.
    pub fn sat_count(&self, node: Ref, num_vars: usize) -> BigUint {
        let mut cache = HashMap::new();
        let max = BigUint::from(1u32) << num_vars;
        self.sat_count_(node, &max, &mut cache)
    }

    fn sat_count_(&self, node: Ref, max: &BigUint, cache: &mut HashMap<Ref, BigUint>) -> BigUint {
        if self.is_zero(node) {
            return BigUint::ZERO;
        } else if self.is_one(node) {
            return max.clone();
        }

        let regular = node.regular();
        let count = match cache.get(&regular) {
            Some(count) => count.clone(),
            None => {
                let low = self.sat_count_(self.low(node.index()), max, cache);
                let high = self.sat_count_(self.high(node.index()), max, cache);
                let count: BigUint = (low + high) >> 1;
                cache.insert(regular, count.clone());
                count
            }
        };

        if node.is_negated() {
            max - count
        } else {
            count
        }
    }

    /// Value of `node` under a total assignment. Variables missing from
    /// `assignment` are taken as false.
    pub fn evaluate(&self, node: Ref, assignment: &HashMap<u32, bool>) -> bool {
        let mut current = node;
        while !self.is_terminal(current) {
            let var = self.variable(current.index());
            current = if assignment.get(&var).copied().unwrap_or(false) {
                self.high_node(current)
            } else {
                self.low_node(current)
            };
        }
        self.is_one(current)
    }
}
