use log::{debug, trace};

use crate::ast::{
    BooleanExpr, LongExpr, NextHopExpr, Statement, StaticStatement, TunnelEncapsulation,
};
use crate::error::{Error, Result};
use crate::integer::BddInteger;
use crate::matchers::community::{apply_dispositions, community_set_dispositions};
use crate::reference::Ref;
use crate::route::{BddRoute, TunnelValue, ADDRESS_BITS, INT_BITS};
use crate::settings::ExplorationMode;

use super::param::{CallContext, ChainContext, TransferParam};
use super::result::TransferResult;
use super::TransferBdd;

impl TransferBdd<'_> {
    pub(super) fn statements(
        &self,
        param: &TransferParam,
        states: Vec<TransferResult>,
        statements: &[Statement],
    ) -> Result<Vec<TransferResult>> {
        let mut param = param.clone();
        let mut states = states;
        for statement in statements {
            if let Statement::SetDefaultPolicy(name) = statement {
                debug!("{}SetDefaultPolicy({})", param.pad(), name);
                param = param.with_default_policy(Some(name.clone()));
                continue;
            }
            let mut next = Vec::with_capacity(states.len());
            for state in states {
                next.extend(self.statement(&param, state, statement)?);
            }
            states = next;
        }
        Ok(states)
    }

    fn statement(
        &self,
        param: &TransferParam,
        state: TransferResult,
        statement: &Statement,
    ) -> Result<Vec<TransferResult>> {
        self.bdd.check()?;
        let live = state.live(&self.bdd);
        if self.bdd.is_zero(live) {
            trace!("{}skip {}", param.pad(), statement.kind());
            return Ok(vec![state]);
        }
        debug!("{}{}", param.pad(), statement.kind());

        match statement {
            Statement::Static(s) => Ok(vec![self.static_statement(param, state, *s, live)?]),
            Statement::If {
                guard,
                true_statements,
                false_statements,
            } => self.if_statement(param, state, guard, true_statements, false_statements),
            Statement::CallStatement(name) => self.call_statement(param, state, name),
            Statement::Buffered(inner) => Ok(vec![self.write(state, inner, live, true)?]),
            Statement::Traceable { statements, .. } => {
                self.statements(param, vec![state], statements)
            }
            // Handled by `statements`, since it changes the context.
            Statement::SetDefaultPolicy(_) => Ok(vec![state]),
            Statement::SetLocalPreference(_)
            | Statement::SetMetric(_)
            | Statement::SetTag(_)
            | Statement::SetAdministrativeCost(_)
            | Statement::SetNextHop(_)
            | Statement::SetCommunities(_)
            | Statement::SetTunnelEncapsulation(_) => {
                Ok(vec![self.write(state, statement, live, false)?])
            }
            Statement::PrependAsPath(_) | Statement::SetOrigin(_) => {
                Err(Error::unsupported(statement.kind()))
            }
        }
    }

    fn static_statement(
        &self,
        param: &TransferParam,
        mut state: TransferResult,
        statement: StaticStatement,
        live: Ref,
    ) -> Result<TransferResult> {
        let bdd = &self.bdd;
        let assign = |old: Ref, value: Ref| bdd.apply_ite(live, value, old);
        match statement {
            StaticStatement::ExitAccept | StaticStatement::ExitReject => {
                let accept = statement == StaticStatement::ExitAccept;
                state.value = assign(state.value, bdd.constant(accept));
                state.exited = bdd.apply_or(state.exited, live);
            }
            StaticStatement::ReturnTrue | StaticStatement::ReturnFalse => {
                let accept = statement == StaticStatement::ReturnTrue;
                state.value = assign(state.value, bdd.constant(accept));
                state.returned = bdd.apply_or(state.returned, live);
            }
            StaticStatement::Return => {
                state.returned = bdd.apply_or(state.returned, live);
            }
            StaticStatement::ReturnLocalDefaultAction => {
                state.value = assign(state.value, state.default_accept_local);
                state.returned = bdd.apply_or(state.returned, live);
            }
            StaticStatement::DefaultAction => {
                state.value = assign(state.value, state.default_accept);
                state.exited = bdd.apply_or(state.exited, live);
            }
            StaticStatement::SetDefaultActionAccept => {
                state.default_accept = assign(state.default_accept, bdd.one);
            }
            StaticStatement::SetDefaultActionReject => {
                state.default_accept = assign(state.default_accept, bdd.zero);
            }
            StaticStatement::SetLocalDefaultActionAccept => {
                state.default_accept_local = assign(state.default_accept_local, bdd.one);
            }
            StaticStatement::SetLocalDefaultActionReject => {
                state.default_accept_local = assign(state.default_accept_local, bdd.zero);
            }
            StaticStatement::FallThrough => {
                if !param.chain_context.is_policy_chain() {
                    return Err(Error::unsupported("fall-through outside a policy chain"));
                }
                state.value = assign(state.value, bdd.zero);
                state.fallthrough = bdd.apply_or(state.fallthrough, live);
                state.returned = bdd.apply_or(state.returned, live);
            }
            StaticStatement::Suppress => {
                state.suppressed = bdd.apply_or(state.suppressed, live);
            }
            StaticStatement::Unsuppress => {
                state.suppressed = bdd.apply_diff(state.suppressed, live);
            }
        }
        Ok(state)
    }

    fn if_statement(
        &self,
        param: &TransferParam,
        state: TransferResult,
        guard: &BooleanExpr,
        true_statements: &[Statement],
        false_statements: &[Statement],
    ) -> Result<Vec<TransferResult>> {
        let bdd = &self.bdd;
        let inner = param.indented();
        let (state, guard) = self.boolean_expr(&inner, state, guard)?;
        trace!("{}guard: {}", param.pad(), bdd.to_bracket_string(guard));

        let mut then_state = state.clone();
        then_state.reach = bdd.apply_and(state.reach, guard);
        let mut else_state = state.clone();
        else_state.reach = bdd.apply_diff(state.reach, guard);

        match param.mode {
            ExplorationMode::Merged => {
                let then_states =
                    self.statements(&inner, vec![then_state.clone()], true_statements)?;
                let else_states =
                    self.statements(&inner, vec![else_state.clone()], false_statements)?;
                let then_state = self.merge(then_states, then_state);
                let else_state = self.merge(else_states, else_state);
                let mut merged = TransferResult::ite(bdd, guard, &then_state, &else_state);
                merged.reach = state.reach;
                Ok(vec![merged])
            }
            ExplorationMode::Paths => {
                let mut paths = Vec::new();
                if !bdd.is_zero(then_state.reach) {
                    paths.extend(self.statements(&inner, vec![then_state], true_statements)?);
                }
                if !bdd.is_zero(else_state.reach) {
                    paths.extend(self.statements(&inner, vec![else_state], false_statements)?);
                }
                Ok(paths)
            }
        }
    }

    /// Run a policy as a statement. Its exits become exits of the caller.
    fn call_statement(
        &self,
        param: &TransferParam,
        mut state: TransferResult,
        name: &str,
    ) -> Result<Vec<TransferResult>> {
        let bdd = &self.bdd;
        let policy = self.config.policy(name)?;
        let callee_param = param
            .enter_scope(name)?
            .with_call_context(CallContext::StmtCall)
            .with_chain_context(ChainContext::None)
            .with_default_policy(None);

        state.commit(bdd);
        let terminated = bdd.apply_or(state.exited, state.returned);
        let mut callee = state.clone();
        callee.exited = terminated;
        callee.returned = bdd.zero;

        let results = self.policy_body(&callee_param, vec![callee], &policy.statements)?;
        Ok(results
            .into_iter()
            .map(|mut result| {
                let new_exits = bdd.apply_diff(result.exited, terminated);
                result.exited = bdd.apply_or(state.exited, new_exits);
                result.returned = state.returned;
                result.fallthrough = state.fallthrough;
                result
            })
            .collect())
    }

    /// Apply an attribute write to every live route.
    fn write(
        &self,
        mut state: TransferResult,
        statement: &Statement,
        live: Ref,
        buffered: bool,
    ) -> Result<TransferResult> {
        let bdd = &self.bdd;
        let pending = self.assign(statement, &state.pending)?;
        state.pending = BddRoute::ite(bdd, live, &pending, &state.pending);
        if !buffered {
            let route = self.assign(statement, &state.route)?;
            state.route = BddRoute::ite(bdd, live, &route, &state.route);
        }
        Ok(state)
    }

    /// A copy of `route` with the attribute written by `statement` overwritten.
    fn assign(&self, statement: &Statement, route: &BddRoute) -> Result<BddRoute> {
        let bdd = &self.bdd;
        let mut route = route.clone();
        match statement {
            Statement::SetLocalPreference(e) => route.local_preference = self.long_expr(e)?,
            Statement::SetMetric(e) => route.metric = self.long_expr(e)?,
            Statement::SetTag(e) => route.tag = self.long_expr(e)?,
            Statement::SetAdministrativeCost(e) => route.admin_distance = self.long_expr(e)?,
            Statement::SetNextHop(NextHopExpr::Ip(ip)) => {
                route.next_hop = BddInteger::constant(bdd, ADDRESS_BITS, u32::from(*ip) as u64);
                route.next_hop_set = bdd.one;
                route.next_hop_discarded = bdd.zero;
            }
            Statement::SetNextHop(NextHopExpr::Discard) => {
                route.next_hop_set = bdd.one;
                route.next_hop_discarded = bdd.one;
            }
            Statement::SetNextHop(NextHopExpr::SelfNextHop) => {
                return Err(Error::unsupported("set next-hop self"));
            }
            Statement::SetCommunities(e) => {
                let ctx = self.match_context();
                let dispositions = community_set_dispositions(&ctx, e)?;
                route.communities = apply_dispositions(&ctx, &dispositions, &route.communities);
            }
            Statement::SetTunnelEncapsulation(tunnel) => {
                let value = tunnel_value(*tunnel);
                route.tunnel = route.tunnel.with_value(bdd, &value).ok_or_else(|| {
                    Error::unsupported(format!("untracked tunnel value {}", value))
                })?;
            }
            other => return Err(Error::unsupported(format!("write {}", other.kind()))),
        }
        Ok(route)
    }

    fn long_expr(&self, expr: &LongExpr) -> Result<BddInteger> {
        match *expr {
            LongExpr::Literal(value) if value <= u32::MAX as u64 => {
                Ok(BddInteger::constant(&self.bdd, INT_BITS, value))
            }
            LongExpr::Literal(value) => Err(Error::unsupported(format!(
                "value {} does not fit in {} bits",
                value, INT_BITS
            ))),
            LongExpr::Increment(_) | LongExpr::Decrement(_) => {
                Err(Error::unsupported(format!("{:?}", expr)))
            }
        }
    }
}

pub(super) fn tunnel_value(tunnel: Option<TunnelEncapsulation>) -> TunnelValue {
    match tunnel {
        Some(t) => TunnelValue::Literal(t),
        None => TunnelValue::Absent,
    }
}
