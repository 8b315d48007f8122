//! Compilers from match expressions to conditions over a symbolic route.
//!
//! These are pure: they read a route and never update it. String-valued
//! attributes are handled through atomic predicates only.

pub mod as_path;
pub mod community;
pub mod int;
pub mod prefix;

use crate::atomic_predicates::ConfigAtomicPredicates;
use crate::bdd::Bdd;
use crate::config::Configuration;

pub use community::Dispositions;

/// What a match compiler needs besides the route.
#[derive(Debug, Copy, Clone)]
pub struct MatchContext<'a> {
    pub bdd: &'a Bdd,
    pub config: &'a Configuration,
    pub aps: &'a ConfigAtomicPredicates,
}
