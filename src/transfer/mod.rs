//! Symbolic execution of routing policies.
//!
//! [`TransferBdd`] compiles a routing policy into conditions over the
//! variables of an unconstrained input route. The result tells, for every
//! input route at once, whether the policy accepts it and what the route
//! looks like afterwards.
//!
//! ```
//! use route_bdd::ast::Statement;
//! use route_bdd::config::{Configuration, RoutingPolicy};
//! use route_bdd::settings::AnalysisConfig;
//! use route_bdd::transfer::TransferBdd;
//!
//! let config = Configuration::new("r1").with_policy(RoutingPolicy::new(
//!     "rm",
//!     vec![Statement::set_local_preference(42), Statement::accept()],
//! ));
//! let tbdd = TransferBdd::new(&config, AnalysisConfig::default())?;
//! let result = tbdd.interpret("rm")?;
//! let bdd = tbdd.bdd();
//! assert!(bdd.is_one(result.accept()));
//! assert!(bdd.is_one(result.route.local_preference.value(bdd, 42)));
//! # Ok::<(), route_bdd::error::Error>(())
//! ```

mod exprs;
pub mod param;
pub mod result;
mod statements;

use log::debug;

use crate::ast::Statement;
use crate::atomic_predicates::ConfigAtomicPredicates;
use crate::bdd::Bdd;
use crate::config::Configuration;
use crate::error::Result;
use crate::matchers::MatchContext;
use crate::route::{BddRoute, RouteLayout};
use crate::settings::{AnalysisConfig, ExplorationMode};

pub use param::{CallContext, ChainContext, TransferParam};
pub use result::{TransferResult, TransferReturn};

/// The symbolic interpreter for the policies of one configuration.
///
/// All results share the decision-diagram pool returned by [`TransferBdd::bdd`].
pub struct TransferBdd<'a> {
    config: &'a Configuration,
    settings: AnalysisConfig,
    bdd: Bdd,
    aps: ConfigAtomicPredicates,
    layout: RouteLayout,
    input: BddRoute,
    zeroed: BddRoute,
}

impl<'a> TransferBdd<'a> {
    pub fn new(config: &'a Configuration, settings: AnalysisConfig) -> Result<Self> {
        settings.validate()?;
        let aps = ConfigAtomicPredicates::new(
            config,
            &settings.extra_community_values,
            &settings.extra_as_path_regexes,
        );
        let layout = RouteLayout::new(
            aps.communities.num_predicates(),
            aps.as_paths.num_predicates(),
            aps.tunnels.iter().copied(),
        )
        .with_protocols(aps.protocols.iter().cloned());
        debug!(
            "{}: {} community predicates, {} as-path predicates, {} variables",
            config.hostname,
            layout.num_communities(),
            layout.num_as_paths(),
            layout.num_vars()
        );
        let bdd = Bdd::new(settings.storage_bits);
        let input = BddRoute::new(&bdd, &layout);
        let zeroed = BddRoute::zeroed(&bdd, &layout);
        bdd.check()?;
        Ok(TransferBdd {
            config,
            settings,
            bdd,
            aps,
            layout,
            input,
            zeroed,
        })
    }

    pub fn bdd(&self) -> &Bdd {
        &self.bdd
    }

    pub fn config(&self) -> &Configuration {
        self.config
    }

    pub fn settings(&self) -> &AnalysisConfig {
        &self.settings
    }

    pub fn atomic_predicates(&self) -> &ConfigAtomicPredicates {
        &self.aps
    }

    pub fn layout(&self) -> &RouteLayout {
        &self.layout
    }

    /// The unconstrained input route.
    pub fn input_route(&self) -> &BddRoute {
        &self.input
    }

    /// The route every rejected input is mapped to.
    pub fn zeroed_route(&self) -> &BddRoute {
        &self.zeroed
    }

    pub fn match_context(&self) -> MatchContext<'_> {
        MatchContext {
            bdd: &self.bdd,
            config: self.config,
            aps: &self.aps,
        }
    }

    /// Interpret policy `name` into a single merged result.
    pub fn interpret(&self, name: &str) -> Result<TransferResult> {
        let states = self.explore(name)?;
        let result = self.merge(states, self.initial_state());
        self.bdd.check()?;
        Ok(result)
    }

    /// The control-flow paths of policy `name`, each split by disposition.
    pub fn paths(&self, name: &str) -> Result<Vec<TransferReturn>> {
        let states = self.explore_with(name, ExplorationMode::Paths)?;
        let bdd = &self.bdd;
        let mut paths = Vec::new();
        for state in states {
            let accepted = bdd.apply_and(state.reach, state.value);
            let denied = bdd.apply_diff(state.reach, state.value);
            if !bdd.is_zero(accepted) {
                paths.push(TransferReturn::new(state.route.clone(), accepted, true));
            }
            if !bdd.is_zero(denied) {
                paths.push(TransferReturn::new(state.route, denied, false));
            }
        }
        self.bdd.check()?;
        debug!("{}: {} paths", name, paths.len());
        Ok(paths)
    }

    /// Finalized states of policy `name`, using the configured exploration mode.
    pub fn explore(&self, name: &str) -> Result<Vec<TransferResult>> {
        self.explore_with(name, self.settings.mode)
    }

    pub fn explore_with(&self, name: &str, mode: ExplorationMode) -> Result<Vec<TransferResult>> {
        let policy = self.config.policy(name)?;
        debug!("interpret {} ({:?})", name, mode);
        let param = TransferParam::new(self.settings.use_output_attributes)
            .with_mode(mode)
            .enter_scope(name)?;
        let states = self.policy_body(&param, vec![self.initial_state()], &policy.statements)?;
        let states = states
            .into_iter()
            .map(|state| self.finalize(state))
            .collect();
        self.bdd.check()?;
        Ok(states)
    }

    /// Run `statements` from the initial state without top-level finalization.
    pub fn compute(
        &self,
        statements: &[Statement],
        param: &TransferParam,
    ) -> Result<TransferResult> {
        let states = self.policy_body(param, vec![self.initial_state()], statements)?;
        let result = self.merge(states, self.initial_state());
        self.bdd.check()?;
        Ok(result)
    }

    fn initial_state(&self) -> TransferResult {
        TransferResult::new(&self.bdd, &self.input)
    }

    fn merge(&self, states: Vec<TransferResult>, empty: TransferResult) -> TransferResult {
        TransferResult::merge_paths(&self.bdd, states).unwrap_or(empty)
    }

    /// Statements of a policy body, followed by the commit of buffered writes.
    fn policy_body(
        &self,
        param: &TransferParam,
        states: Vec<TransferResult>,
        statements: &[Statement],
    ) -> Result<Vec<TransferResult>> {
        let mut states = self.statements(param, states, statements)?;
        for state in &mut states {
            state.commit(&self.bdd);
        }
        Ok(states)
    }

    /// Top-level semantics: fall off the end with the default action, forget
    /// updates of routes that only returned, and zero the rejected routes.
    fn finalize(&self, mut state: TransferResult) -> TransferResult {
        let bdd = &self.bdd;
        let fell_off = -bdd.apply_or(state.exited, state.returned);
        state.value = bdd.apply_ite(fell_off, state.default_accept, state.value);
        state.exited = bdd.apply_or(state.exited, fell_off);
        let returned_only = bdd.apply_diff(state.returned, state.exited);
        let route = BddRoute::ite(bdd, returned_only, &self.input, &state.route);
        let accept = bdd.apply_diff(state.value, state.suppressed);
        state.route = BddRoute::ite(bdd, accept, &route, &self.zeroed);
        state.pending = state.route.clone();
        state.value = accept;
        state
    }
}
