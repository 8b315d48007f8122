use log::debug;

use crate::ast::BooleanExpr;
use crate::error::{Error, Result};
use crate::matchers::as_path::as_path_match;
use crate::matchers::community::community_set_match;
use crate::matchers::int::compare;
use crate::matchers::prefix::prefix_set;
use crate::reference::Ref;
use crate::route::ProtocolValue;

use super::param::{CallContext, ChainContext, TransferParam};
use super::result::TransferResult;
use super::statements::tunnel_value;
use super::TransferBdd;

impl TransferBdd<'_> {
    /// Evaluate a guard. Returns the updated state and the guard's value.
    pub(super) fn boolean_expr(
        &self,
        param: &TransferParam,
        state: TransferResult,
        expr: &BooleanExpr,
    ) -> Result<(TransferResult, Ref)> {
        self.bdd.check()?;
        let bdd = &self.bdd;
        debug!("{}{}", param.pad(), expr.kind());

        let ctx = self.match_context();
        let route = if param.use_output_attributes {
            &state.route
        } else {
            &self.input
        };

        let value = match expr {
            BooleanExpr::True => bdd.one,
            BooleanExpr::False => bdd.zero,
            BooleanExpr::CallExprContext => {
                bdd.constant(param.call_context == CallContext::ExprCall)
            }
            BooleanExpr::CallStatementContext => {
                bdd.constant(param.call_context == CallContext::StmtCall)
            }
            BooleanExpr::Conjunction(exprs) => return self.connective(param, state, exprs, true),
            BooleanExpr::Disjunction(exprs) => return self.connective(param, state, exprs, false),
            BooleanExpr::Not(inner) => {
                let (state, value) = self.boolean_expr(param, state, inner)?;
                return Ok((state, -value));
            }
            BooleanExpr::ConjunctionChain(exprs) => {
                return self.chain(param, state, exprs, ChainContext::ConjunctionChain)
            }
            BooleanExpr::FirstMatchChain(exprs) => {
                return self.chain(param, state, exprs, ChainContext::FirstMatchChain)
            }
            BooleanExpr::CallExpr(name) => {
                let (state, value, _) = self.call_expr(param, state, name)?;
                return Ok((state, value));
            }
            BooleanExpr::MatchPrefixSet { prefix, prefix_set: set } => {
                prefix_set(&ctx, *prefix, set, route)?
            }
            BooleanExpr::MatchCommunities(e) => community_set_match(&ctx, e, route)?,
            BooleanExpr::MatchAsPath(e) => as_path_match(&ctx, e, route)?,
            BooleanExpr::MatchTag(cmp) => compare(bdd, &route.tag, *cmp),
            BooleanExpr::MatchMetric(cmp) => compare(bdd, &route.metric, *cmp),
            BooleanExpr::MatchLocalPreference(cmp) => compare(bdd, &route.local_preference, *cmp),
            BooleanExpr::MatchTunnelEncapsulation(tunnel) => {
                route.tunnel.value(bdd, &tunnel_value(*tunnel))
            }
            BooleanExpr::MatchProtocol(protocols) => bdd.apply_or_many(
                protocols
                    .iter()
                    .map(|p| self.input.protocol.value(bdd, &ProtocolValue::Named(p.clone()))),
            ),
        };
        Ok((state, value))
    }

    /// Short-circuit conjunction (`is_and`) or disjunction. Each operand only
    /// affects the routes for which the result is still open.
    fn connective(
        &self,
        param: &TransferParam,
        mut state: TransferResult,
        exprs: &[BooleanExpr],
        is_and: bool,
    ) -> Result<(TransferResult, Ref)> {
        let bdd = &self.bdd;
        let context = if is_and {
            ChainContext::Conjunction
        } else {
            ChainContext::Disjunction
        };
        let inner = param.with_chain_context(context).indented();

        let mut value = bdd.constant(is_and);
        for expr in exprs {
            let open = if is_and { value } else { -value };
            let mut gated = state.clone();
            gated.reach = bdd.apply_and(state.reach, open);
            if bdd.is_zero(gated.live(bdd)) {
                break;
            }
            let (out, v) = self.boolean_expr(&inner, gated, expr)?;
            let mut merged = TransferResult::ite(bdd, open, &out, &state);
            merged.reach = state.reach;
            state = merged;
            value = if is_and {
                bdd.apply_and(value, v)
            } else {
                bdd.apply_or(value, v)
            };
        }
        Ok((state, value))
    }

    /// A policy chain. Fall-through moves on to the next policy; the default
    /// policy, if any, is called last.
    fn chain(
        &self,
        param: &TransferParam,
        mut state: TransferResult,
        exprs: &[BooleanExpr],
        kind: ChainContext,
    ) -> Result<(TransferResult, Ref)> {
        let bdd = &self.bdd;
        let mut policies = exprs.to_vec();
        if let Some(default) = &param.default_policy {
            policies.push(BooleanExpr::CallExpr(default.clone()));
        }
        let conjunctive = kind == ChainContext::ConjunctionChain;
        if policies.is_empty() {
            return if conjunctive {
                Ok((state, bdd.one))
            } else {
                Err(Error::unsupported("empty first-match chain without a default policy"))
            };
        }

        let inner = param
            .with_default_policy(None)
            .with_chain_context(kind)
            .indented();
        let mut decided = bdd.zero;
        let mut value = bdd.zero;
        for expr in &policies {
            let open = -decided;
            let mut gated = state.clone();
            gated.reach = bdd.apply_and(state.reach, open);
            if bdd.is_zero(gated.live(bdd)) {
                break;
            }
            let exited = gated.exited;
            let (out, v, fallthrough) = match expr {
                BooleanExpr::CallExpr(name) => self.call_expr(&inner, gated, name)?,
                other => {
                    let (out, v) = self.boolean_expr(&inner, gated, other)?;
                    (out, v, bdd.zero)
                }
            };
            let new_exits = bdd.apply_diff(out.exited, exited);
            let stop = if conjunctive {
                bdd.apply_or(-v, new_exits)
            } else {
                bdd.one
            };
            let decide = bdd.apply_and(open, bdd.apply_diff(stop, fallthrough));
            value = bdd.apply_ite(decide, v, value);
            decided = bdd.apply_or(decided, decide);

            let mut merged = TransferResult::ite(bdd, open, &out, &state);
            merged.reach = state.reach;
            state = merged;
        }
        let value = bdd.apply_ite(decided, value, bdd.constant(conjunctive));
        Ok((state, value))
    }

    /// Run a policy as an expression. Returns the caller's state, the policy's
    /// value and the routes that fell through.
    pub(super) fn call_expr(
        &self,
        param: &TransferParam,
        mut state: TransferResult,
        name: &str,
    ) -> Result<(TransferResult, Ref, Ref)> {
        let bdd = &self.bdd;
        let policy = self.config.policy(name)?;
        let callee_param = param
            .enter_scope(name)?
            .with_call_context(CallContext::ExprCall)
            .with_default_policy(None);

        state.commit(bdd);
        let terminated = bdd.apply_or(state.exited, state.returned);
        let mut callee = state.clone();
        callee.exited = terminated;
        callee.returned = bdd.zero;
        callee.fallthrough = bdd.zero;

        let results = self.policy_body(&callee_param, vec![callee.clone()], &policy.statements)?;
        let result = self.merge(results, callee);

        let done = bdd.apply_or(result.exited, result.returned);
        let value = bdd.apply_ite(done, result.value, result.default_accept);
        let new_exits = bdd.apply_diff(result.exited, terminated);

        let mut out = result.clone();
        out.value = bdd.apply_ite(new_exits, result.value, state.value);
        out.exited = bdd.apply_or(state.exited, new_exits);
        out.returned = state.returned;
        out.fallthrough = state.fallthrough;
        out.reach = state.reach;
        Ok((out, value, result.fallthrough))
    }
}
