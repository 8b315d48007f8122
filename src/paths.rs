//! Iterator over the satisfying cubes of a BDD.
//!
//! Every root-to-one path of a diagram is a partial assignment (a cube)
//! under which the function is true. Variables not mentioned on a path are
//! don't-cares. The number of cubes can be exponential, so callers usually
//! take only a prefix (see [`crate::model::examples`]).

use crate::bdd::Bdd;
use crate::reference::Ref;
use crate::types::{Lit, Var};

impl Bdd {
    /// Returns an iterator over all cubes (paths to one) of `f`.
    ///
    /// ```
    /// use route_bdd::bdd::Bdd;
    ///
    /// let bdd = Bdd::default();
    /// let f = bdd.apply_xor(bdd.mk_var(1), bdd.mk_var(2));
    /// assert_eq!(bdd.cubes(f).count(), 2);
    /// assert_eq!(bdd.cubes(bdd.zero).count(), 0);
    /// ```
    pub fn cubes(&self, f: Ref) -> BddCubes<'_> {
        BddCubes::new(self, f)
    }
}

#[derive(Debug, Clone, Copy)]
enum Branch {
    High,
    Low,
}

#[derive(Debug)]
struct Frame {
    node: Ref,
    /// Branch to explore next, `None` once both were explored.
    next_branch: Option<Branch>,
}

/// Depth-first cube enumeration, high branch first.
///
/// Created by [`Bdd::cubes()`].
pub struct BddCubes<'a> {
    bdd: &'a Bdd,
    stack: Vec<Frame>,
    current: Vec<Lit>,
}

impl<'a> BddCubes<'a> {
    pub fn new(bdd: &'a Bdd, f: Ref) -> Self {
        BddCubes {
            bdd,
            stack: vec![Frame {
                node: f,
                next_branch: Some(Branch::High),
            }],
            current: Vec::new(),
        }
    }

    fn backtrack(&mut self) {
        self.stack.pop();
        if !self.stack.is_empty() {
            self.current.pop();
        }
    }
}

impl Iterator for BddCubes<'_> {
    type Item = Vec<Lit>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let node = frame.node;

            if self.bdd.is_one(node) {
                let cube = self.current.clone();
                self.backtrack();
                return Some(cube);
            }
            if self.bdd.is_zero(node) {
                self.backtrack();
                continue;
            }

            let var = Var::new(self.bdd.variable(node.index()));
            match frame.next_branch {
                Some(Branch::High) => {
                    frame.next_branch = Some(Branch::Low);
                    self.current.push(var.pos());
                    self.stack.push(Frame {
                        node: self.bdd.high_node(node),
                        next_branch: Some(Branch::High),
                    });
                }
                Some(Branch::Low) => {
                    frame.next_branch = None;
                    self.current.push(var.neg());
                    self.stack.push(Frame {
                        node: self.bdd.low_node(node),
                        next_branch: Some(Branch::High),
                    });
                }
                None => self.backtrack(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn mk_cube(lits: impl IntoIterator<Item = i32>) -> Vec<Lit> {
        lits.into_iter().map(Lit::from).collect()
    }

    #[test]
    fn test_single_cube() {
        let bdd = Bdd::default();
        let f = bdd.cube([1, -2, 3]);

        let cubes: Vec<_> = bdd.cubes(f).collect();
        assert_eq!(cubes, vec![mk_cube([1, -2, 3])]);
    }

    #[test]
    fn test_two_cubes() {
        let bdd = Bdd::default();
        let f = bdd.apply_or(bdd.cube([1, -2, 3]), bdd.cube([1, 2, -3]));

        let cubes: Vec<_> = bdd.cubes(f).collect();
        assert_eq!(cubes.len(), 2);
        assert!(cubes.contains(&mk_cube([1, -2, 3])));
        assert!(cubes.contains(&mk_cube([1, 2, -3])));
    }

    #[test]
    fn test_constants() {
        let bdd = Bdd::default();

        let cubes: Vec<_> = bdd.cubes(bdd.one).collect();
        assert_eq!(cubes.len(), 1);
        assert!(cubes[0].is_empty());
        assert_eq!(bdd.cubes(bdd.zero).count(), 0);
    }

    #[test]
    fn test_cubes_cover_function() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let z = bdd.mk_var(3);
        let f = bdd.apply_ite(x, y, -z);

        let cover = bdd.apply_or_many(
            bdd.cubes(f)
                .map(|cube| bdd.cube(cube.into_iter().map(|lit| lit.to_dimacs()))),
        );
        assert_eq!(cover, f);
    }
}
