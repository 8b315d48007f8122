//! # route-bdd: symbolic execution of routing policies
//!
//! **`route-bdd`** compiles the routing policies of a router configuration
//! into **Binary Decision Diagrams**. Instead of running a policy on one
//! route at a time, it runs it on a *symbolic* route that stands for every
//! possible input at once, and answers questions such as "which routes does
//! this policy accept?" or "can any accepted route leave with local
//! preference 300?".
//!
//! ## How it works
//!
//! - Every input attribute is encoded as BDD variables: prefix and prefix
//!   length, local preference, metric, administrative distance, tag and
//!   next hop as fixed-width integers, the tunnel encapsulation as a finite
//!   domain.
//! - Communities and AS paths are strings. They are abstracted by
//!   **atomic predicates**: the literals and regexes used by the
//!   configuration partition the space of strings into disjoint classes,
//!   and each class gets one variable.
//! - The interpreter walks a policy, tracking for every input route whether
//!   it has exited, returned or fallen through, and what its output route
//!   looks like. Branches are merged with `ite`, or kept apart as paths.
//!
//! ## Basic Usage
//!
//! ```rust
//! use route_bdd::ast::{BooleanExpr, Statement};
//! use route_bdd::config::{Configuration, RoutingPolicy};
//! use route_bdd::prefix::{Prefix, PrefixRange};
//! use route_bdd::settings::AnalysisConfig;
//! use route_bdd::transfer::TransferBdd;
//!
//! let net: Prefix = "10.0.0.0/8".parse()?;
//! let config = Configuration::new("r1").with_policy(RoutingPolicy::new(
//!     "import",
//!     vec![Statement::if_then(
//!         BooleanExpr::match_destination(vec![PrefixRange::more_specifics(net)]),
//!         vec![Statement::set_local_preference(300), Statement::accept()],
//!     )],
//! ));
//!
//! let tbdd = TransferBdd::new(&config, AnalysisConfig::default())?;
//! let result = tbdd.interpret("import")?;
//! let bdd = tbdd.bdd();
//!
//! // Not every route is accepted...
//! assert!(!bdd.is_one(result.accept()) && !bdd.is_zero(result.accept()));
//! // ...but every accepted route leaves with local preference 300.
//! let lp300 = result.route.local_preference.value(bdd, 300);
//! assert!(bdd.is_implies(result.accept(), lp300));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Core Components
//!
//! - **[`bdd`]**: the [`Bdd`][crate::bdd::Bdd] manager, with hash-consed nodes and a
//!   computed table.
//! - **[`integer`]**, **[`domain`]**: fixed-width integers and finite domains over BDD bits.
//! - **[`regex`]**, **[`automata`]**: the regex dialect used by policies and the automata
//!   behind it.
//! - **[`atomic_predicates`]**: the partition of community and AS-path strings.
//! - **[`transfer`]**: the symbolic interpreter.
//! - **[`analysis`]**, **[`model`]**: queries over results and concrete witnesses.

pub mod analysis;
pub mod ast;
pub mod atomic_predicates;
pub mod automata;
pub mod bdd;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod integer;
pub mod matchers;
pub mod model;
pub mod paths;
pub mod prefix;
pub mod reference;
pub mod regex;
pub mod route;
pub mod sat;
pub mod settings;
pub mod table;
pub mod transfer;
pub mod types;
pub mod utils;
