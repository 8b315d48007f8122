use std::collections::BTreeSet;

use crate::ast::{CommunityMatchExpr, CommunitySetExpr, CommunitySetMatchExpr};
use crate::atomic_predicates::{half_regex, TrackedValue};
use crate::error::{Error, Result};
use crate::reference::Ref;
use crate::route::BddRoute;

use super::MatchContext;

/// The community atomic predicates whose strings satisfy `expr`.
pub fn community_predicates(
    ctx: &MatchContext<'_>,
    expr: &CommunityMatchExpr,
) -> Result<BTreeSet<usize>> {
    let aps = &ctx.aps.communities;
    let all = || (0..aps.num_predicates()).collect::<BTreeSet<_>>();
    let tracked = |value: TrackedValue| aps.matching(&value).cloned();
    match expr {
        CommunityMatchExpr::Is(community) => tracked(TrackedValue::literal(community.to_string())),
        CommunityMatchExpr::Regex(regex) => tracked(TrackedValue::regex(regex)),
        CommunityMatchExpr::HighMatch(cmp) => match half_regex(true, cmp.cmp, cmp.value) {
            Some(regex) => tracked(TrackedValue::Regex(regex)),
            None => Err(Error::unsupported(format!(
                "community high-half comparison {:?}",
                cmp.cmp
            ))),
        },
        CommunityMatchExpr::LowMatch(cmp) => match half_regex(false, cmp.cmp, cmp.value) {
            Some(regex) => tracked(TrackedValue::Regex(regex)),
            None => Err(Error::unsupported(format!(
                "community low-half comparison {:?}",
                cmp.cmp
            ))),
        },
        CommunityMatchExpr::All(exprs) => {
            let mut result = all();
            for e in exprs {
                let preds = community_predicates(ctx, e)?;
                result.retain(|i| preds.contains(i));
            }
            Ok(result)
        }
        CommunityMatchExpr::Any(exprs) => {
            let mut result = BTreeSet::new();
            for e in exprs {
                result.extend(community_predicates(ctx, e)?);
            }
            Ok(result)
        }
        CommunityMatchExpr::Not(e) => {
            let preds = community_predicates(ctx, e)?;
            Ok(all().difference(&preds).copied().collect())
        }
        CommunityMatchExpr::Acl(lines) => {
            let mut permitted = BTreeSet::new();
            let mut decided = BTreeSet::new();
            for (action, e) in lines {
                let preds = community_predicates(ctx, e)?;
                for i in preds.difference(&decided).copied().collect::<Vec<_>>() {
                    if action.is_permit() {
                        permitted.insert(i);
                    }
                    decided.insert(i);
                }
            }
            Ok(permitted)
        }
    }
}

/// Condition on the route's community bits.
pub fn community_set_match(
    ctx: &MatchContext<'_>,
    expr: &CommunitySetMatchExpr,
    route: &BddRoute,
) -> Result<Ref> {
    let bdd = ctx.bdd;
    match expr {
        CommunitySetMatchExpr::Has(e) => {
            let preds = community_predicates(ctx, e)?;
            Ok(bdd.apply_or_many(preds.into_iter().map(|i| route.communities[i])))
        }
        CommunitySetMatchExpr::All(exprs) => {
            let mut result = bdd.one;
            for e in exprs {
                result = bdd.apply_and(result, community_set_match(ctx, e, route)?);
            }
            Ok(result)
        }
        CommunitySetMatchExpr::Any(exprs) => {
            let mut result = bdd.zero;
            for e in exprs {
                result = bdd.apply_or(result, community_set_match(ctx, e, route)?);
            }
            Ok(result)
        }
        CommunitySetMatchExpr::Not(e) => Ok(-community_set_match(ctx, e, route)?),
        CommunitySetMatchExpr::SetRegex(regex) => Err(Error::unsupported(format!(
            "community set regex '{}'",
            regex
        ))),
    }
}

/// Effect of a community set expression on each atomic predicate.
///
/// Predicates in neither set keep the value they have on the route being updated.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Dispositions {
    pub must_exist: BTreeSet<usize>,
    pub must_not_exist: BTreeSet<usize>,
}

pub fn community_set_dispositions(
    ctx: &MatchContext<'_>,
    expr: &CommunitySetExpr,
) -> Result<Dispositions> {
    match expr {
        CommunitySetExpr::Input => Ok(Dispositions::default()),
        CommunitySetExpr::Literal(communities) => {
            let mut must_exist = BTreeSet::new();
            for community in communities {
                let is = CommunityMatchExpr::Is(*community);
                must_exist.extend(community_predicates(ctx, &is)?);
            }
            let must_not_exist = (0..ctx.aps.communities.num_predicates())
                .filter(|i| !must_exist.contains(i))
                .collect();
            Ok(Dispositions {
                must_exist,
                must_not_exist,
            })
        }
        CommunitySetExpr::Union(exprs) => {
            let mut result: Option<Dispositions> = None;
            for e in exprs {
                let d = community_set_dispositions(ctx, e)?;
                result = Some(match result {
                    None => d,
                    Some(acc) => Dispositions {
                        must_exist: acc.must_exist.union(&d.must_exist).copied().collect(),
                        must_not_exist: acc
                            .must_not_exist
                            .intersection(&d.must_not_exist)
                            .copied()
                            .collect(),
                    },
                });
            }
            // The empty union is the empty set.
            Ok(result.unwrap_or_else(|| Dispositions {
                must_exist: BTreeSet::new(),
                must_not_exist: (0..ctx.aps.communities.num_predicates()).collect(),
            }))
        }
        CommunitySetExpr::Difference(left, removed) => {
            let d = community_set_dispositions(ctx, left)?;
            let removed = community_predicates(ctx, removed)?;
            Ok(Dispositions {
                must_exist: d.must_exist.difference(&removed).copied().collect(),
                must_not_exist: d.must_not_exist.union(&removed).copied().collect(),
            })
        }
    }
}

/// The community bits after applying `dispositions` to `current`.
pub fn apply_dispositions(
    ctx: &MatchContext<'_>,
    dispositions: &Dispositions,
    current: &[Ref],
) -> Vec<Ref> {
    current
        .iter()
        .enumerate()
        .map(|(i, &bit)| {
            if dispositions.must_exist.contains(&i) {
                ctx.bdd.one
            } else if dispositions.must_not_exist.contains(&i) {
                ctx.bdd.zero
            } else {
                bit
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BooleanExpr, Community, IntComparison, LineAction, Statement};
    use crate::atomic_predicates::ConfigAtomicPredicates;
    use crate::bdd::Bdd;
    use crate::config::{Configuration, RoutingPolicy};
    use crate::route::RouteLayout;
    use test_log::test;

    struct Fixture {
        bdd: Bdd,
        config: Configuration,
        aps: ConfigAtomicPredicates,
    }

    impl Fixture {
        fn new(communities: &[&str], regexes: &[&str]) -> Self {
            let guards = regexes
                .iter()
                .map(|r| {
                    Statement::if_then(
                        BooleanExpr::has_community(CommunityMatchExpr::regex(*r)),
                        vec![],
                    )
                })
                .collect();
            let config = Configuration::new("r1").with_policy(RoutingPolicy::new("p", guards));
            let extra: Vec<String> = communities.iter().map(|c| c.to_string()).collect();
            let aps = ConfigAtomicPredicates::new(&config, &extra, &[]);
            Fixture {
                bdd: Bdd::default(),
                config,
                aps,
            }
        }

        fn ctx(&self) -> MatchContext<'_> {
            MatchContext {
                bdd: &self.bdd,
                config: &self.config,
                aps: &self.aps,
            }
        }

        fn class_of(&self, s: &str) -> usize {
            self.aps.communities.classify(s).unwrap()
        }
    }

    #[test]
    fn test_half_matches() {
        let f = Fixture::new(&["30:20"], &[]);
        let high = CommunityMatchExpr::HighMatch(IntComparison::eq(30));
        assert!(matches!(
            community_predicates(&f.ctx(), &high),
            Err(Error::Unsupported(_))
        ));

        let f = Fixture::new(&[], &["^30:", ":20$"]);
        let ctx = f.ctx();
        let high = CommunityMatchExpr::HighMatch(IntComparison::eq(30));
        let high = community_predicates(&ctx, &high).unwrap();
        let low = CommunityMatchExpr::LowMatch(IntComparison::eq(20));
        let low = community_predicates(&ctx, &low).unwrap();
        assert!(high.contains(&f.class_of("30:20")));
        assert!(high.contains(&f.class_of("30:1")));
        assert!(!high.contains(&f.class_of("1:20")));
        assert!(low.contains(&f.class_of("1:20")));

        let ge = IntComparison::new(crate::ast::IntComparator::Ge, 30);
        let ge = CommunityMatchExpr::HighMatch(ge);
        assert!(community_predicates(&ctx, &ge).is_err());
    }

    #[test]
    fn test_combinators() {
        let f = Fixture::new(&[], &["^30:", ":20$"]);
        let ctx = f.ctx();
        let high = CommunityMatchExpr::regex("^30:");
        let low = CommunityMatchExpr::regex(":20$");
        let both = CommunityMatchExpr::All(vec![high.clone(), low.clone()]);
        let both = community_predicates(&ctx, &both).unwrap();
        assert_eq!(both, [f.class_of("30:20")].into_iter().collect());
        let either = CommunityMatchExpr::Any(vec![high.clone(), low.clone()]);
        let either = community_predicates(&ctx, &either).unwrap();
        assert_eq!(either.len(), 3);
        let none = community_predicates(&ctx, &high.clone().not()).unwrap();
        assert!(none.contains(&f.class_of("1:1")));
        assert!(!none.contains(&f.class_of("30:1")));
        assert_eq!(community_predicates(&ctx, &CommunityMatchExpr::Any(vec![])).unwrap().len(), 0);
        assert_eq!(community_predicates(&ctx, &CommunityMatchExpr::All(vec![])).unwrap().len(), 4);

        let acl =
            CommunityMatchExpr::Acl(vec![(LineAction::Deny, low), (LineAction::Permit, high)]);
        let acl = community_predicates(&ctx, &acl).unwrap();
        assert_eq!(acl, [f.class_of("30:1")].into_iter().collect());
    }

    #[test]
    fn test_set_match() {
        let f = Fixture::new(&[], &["^30:"]);
        let ctx = f.ctx();
        let route = BddRoute::new(&f.bdd, &RouteLayout::new(2, 1, []));
        let has = CommunitySetMatchExpr::Has(CommunityMatchExpr::regex("^30:"));
        let cond = community_set_match(&ctx, &has, &route).unwrap();
        assert_eq!(cond, route.communities[f.class_of("30:30")]);
        assert_eq!(
            community_set_match(&ctx, &CommunitySetMatchExpr::Not(Box::new(has)), &route).unwrap(),
            -cond
        );
        let all = community_set_match(&ctx, &CommunitySetMatchExpr::All(vec![]), &route);
        assert_eq!(all.unwrap(), f.bdd.one);
        let any = community_set_match(&ctx, &CommunitySetMatchExpr::Any(vec![]), &route);
        assert_eq!(any.unwrap(), f.bdd.zero);
        let set_regex = CommunitySetMatchExpr::SetRegex("x".into());
        assert!(community_set_match(&ctx, &set_regex, &route).is_err());
    }

    #[test]
    fn test_dispositions() {
        let f = Fixture::new(&["10:10", "20:20"], &["^30:"]);
        let ctx = f.ctx();
        let n = f.aps.communities.num_predicates();
        assert_eq!(n, 4);

        let lit = CommunitySetExpr::Literal(vec![Community::standard(10, 10)]);
        let d = community_set_dispositions(&ctx, &lit).unwrap();
        assert_eq!(d.must_exist, [f.class_of("10:10")].into_iter().collect());
        assert_eq!(d.must_not_exist.len(), n - 1);

        let add = CommunitySetExpr::Union(vec![CommunitySetExpr::Input, lit.clone()]);
        let d = community_set_dispositions(&ctx, &add).unwrap();
        assert_eq!(d.must_exist, [f.class_of("10:10")].into_iter().collect());
        assert!(d.must_not_exist.is_empty());

        let delete = CommunitySetExpr::Difference(
            Box::new(CommunitySetExpr::Input),
            CommunityMatchExpr::regex("^30:"),
        );
        let d = community_set_dispositions(&ctx, &delete).unwrap();
        assert!(d.must_exist.is_empty());
        assert_eq!(d.must_not_exist, [f.class_of("30:1")].into_iter().collect());

        let route = BddRoute::new(&f.bdd, &RouteLayout::new(n, 1, []));
        let updated = apply_dispositions(&ctx, &d, &route.communities);
        assert_eq!(updated[f.class_of("30:1")], f.bdd.zero);
        assert_eq!(updated[f.class_of("10:10")], route.communities[f.class_of("10:10")]);
    }
}
