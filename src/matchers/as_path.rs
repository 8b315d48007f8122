use crate::ast::AsPathMatchExpr;
use crate::atomic_predicates::TrackedValue;
use crate::error::{Error, Result};
use crate::reference::Ref;
use crate::route::BddRoute;

use super::MatchContext;

fn regex_condition(ctx: &MatchContext<'_>, regex: &str, route: &BddRoute) -> Result<Ref> {
    let preds = ctx.aps.as_paths.matching(&TrackedValue::regex(regex))?;
    Ok(ctx
        .bdd
        .apply_or_many(preds.iter().map(|&i| route.as_paths[i])))
}

/// Condition on the route's AS-path bits.
pub fn as_path_match(
    ctx: &MatchContext<'_>,
    expr: &AsPathMatchExpr,
    route: &BddRoute,
) -> Result<Ref> {
    let bdd = ctx.bdd;
    match expr {
        AsPathMatchExpr::Regex(regex) => regex_condition(ctx, regex, route),
        AsPathMatchExpr::List(name) => {
            let list = ctx.config.as_path_access_list(name)?;
            let mut acc = bdd.zero;
            for line in list.lines.iter().rev() {
                let matched = regex_condition(ctx, &line.regex, route)?;
                acc = bdd.apply_ite(matched, bdd.constant(line.action.is_permit()), acc);
            }
            Ok(acc)
        }
        AsPathMatchExpr::All(exprs) => {
            let mut result = bdd.one;
            for e in exprs {
                result = bdd.apply_and(result, as_path_match(ctx, e, route)?);
            }
            Ok(result)
        }
        AsPathMatchExpr::Any(exprs) => {
            let mut result = bdd.zero;
            for e in exprs {
                result = bdd.apply_or(result, as_path_match(ctx, e, route)?);
            }
            Ok(result)
        }
        AsPathMatchExpr::Not(e) => Ok(-as_path_match(ctx, e, route)?),
        AsPathMatchExpr::Length(cmp) => Err(Error::unsupported(format!(
            "as-path length comparison {:?} {}",
            cmp.cmp, cmp.value
        ))),
    }
}
