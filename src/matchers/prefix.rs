use log::debug;

use crate::ast::{PrefixExpr, PrefixSetExpr};
use crate::bdd::Bdd;
use crate::error::Result;
use crate::integer::BddInteger;
use crate::prefix::PrefixRange;
use crate::reference::Ref;
use crate::route::{BddRoute, ADDRESS_BITS, PREFIX_LENGTH_BITS};

use super::MatchContext;

/// Routes whose prefix falls in `range`: the first bits agree with the range's
/// prefix and the length lies within the range's bounds.
pub fn prefix_range(
    bdd: &Bdd,
    address: &BddInteger,
    length: &BddInteger,
    range: &PrefixRange,
) -> Ref {
    let bits = range.prefix.length() as usize;
    let lo = range.lengths.start as u64;
    let hi = range.lengths.end as u64;
    if lo > hi {
        return bdd.zero;
    }
    let first = address.first_bits_equal(bdd, range.prefix.bits() as u64, bits);
    let len = length.range(bdd, lo, hi);
    bdd.apply_and(first, len)
}

/// Condition for a prefix set, matched against the destination or next-hop address.
pub fn prefix_set(
    ctx: &MatchContext<'_>,
    prefix: PrefixExpr,
    set: &PrefixSetExpr,
    route: &BddRoute,
) -> Result<Ref> {
    let bdd = ctx.bdd;
    let host_length;
    let (address, length) = match prefix {
        PrefixExpr::DestinationNetwork => (&route.prefix, &route.prefix_length),
        PrefixExpr::NextHopIp => {
            host_length = BddInteger::constant(bdd, PREFIX_LENGTH_BITS, ADDRESS_BITS as u64);
            (&route.next_hop, &host_length)
        }
    };
    match set {
        PrefixSetExpr::Explicit(ranges) => Ok(bdd.apply_or_many(
            ranges
                .iter()
                .map(|range| prefix_range(bdd, address, length, range)),
        )),
        PrefixSetExpr::Named(name) => {
            let list = ctx.config.route_filter_list(name)?;
            debug!("route filter list {} with {} lines", name, list.lines.len());
            // First matching line wins, so fold from the last line.
            Ok(list.lines.iter().rev().fold(bdd.zero, |acc, line| {
                let matched = prefix_range(bdd, address, length, &line.range);
                bdd.apply_ite(matched, bdd.constant(line.action.is_permit()), acc)
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::LineAction;
    use crate::atomic_predicates::ConfigAtomicPredicates;
    use crate::config::{Configuration, RouteFilterList};
    use crate::prefix::Prefix;
    use crate::route::RouteLayout;
    use test_log::test;

    fn range(s: &str, lo: u8, hi: u8) -> PrefixRange {
        PrefixRange::new(s.parse::<Prefix>().unwrap(), lo, hi)
    }

    #[test]
    fn test_prefix_range() {
        let bdd = Bdd::default();
        let route = BddRoute::new(&bdd, &RouteLayout::new(1, 1, []));
        let matches = |r: &PrefixRange| prefix_range(&bdd, &route.prefix, &route.prefix_length, r);
        let r = matches(&range("1.0.0.0/8", 16, 24));
        // The first 8 address bits are fixed to 00000001.
        assert!(bdd.is_implies(r, route.prefix.bits()[7]));
        assert!(bdd.is_implies(r, -route.prefix.bits()[0]));
        assert!(bdd.is_implies(r, route.prefix_length.geq(&bdd, 16)));
        assert!(bdd.is_implies(r, route.prefix_length.leq(&bdd, 24)));
        assert!(!bdd.is_implies(r, route.prefix.bits()[8]));

        let any = matches(&range("0.0.0.0/0", 0, 32));
        assert_eq!(any, route.prefix_length.leq(&bdd, 32));
    }

    #[test]
    fn test_route_filter_list_first_match() {
        let bdd = Bdd::default();
        let config = Configuration::new("r1").with_route_filter_list(RouteFilterList::new(
            "rfl",
            vec![
                (LineAction::Deny, range("1.2.0.0/16", 16, 32)),
                (LineAction::Permit, range("1.0.0.0/8", 8, 32)),
            ],
        ));
        let aps = ConfigAtomicPredicates::new(&config, &[], &[]);
        let ctx = MatchContext {
            bdd: &bdd,
            config: &config,
            aps: &aps,
        };
        let route = BddRoute::new(&bdd, &RouteLayout::new(1, 1, []));
        let cond = prefix_set(
            &ctx,
            PrefixExpr::DestinationNetwork,
            &PrefixSetExpr::Named("rfl".to_string()),
            &route,
        )
        .unwrap();

        let matches = |r: &PrefixRange| prefix_range(&bdd, &route.prefix, &route.prefix_length, r);
        let deny = matches(&range("1.2.0.0/16", 16, 32));
        let permit = matches(&range("1.0.0.0/8", 8, 32));
        assert_eq!(cond, bdd.apply_diff(permit, deny));

        let missing = prefix_set(
            &ctx,
            PrefixExpr::DestinationNetwork,
            &PrefixSetExpr::Named("nope".to_string()),
            &route,
        );
        assert!(missing.is_err());
    }

    #[test]
    fn test_next_hop_prefix() {
        let bdd = Bdd::default();
        let config = Configuration::default();
        let aps = ConfigAtomicPredicates::new(&config, &[], &[]);
        let ctx = MatchContext {
            bdd: &bdd,
            config: &config,
            aps: &aps,
        };
        let route = BddRoute::new(&bdd, &RouteLayout::new(1, 1, []));
        let host = PrefixSetExpr::Explicit(vec![range("10.0.0.0/8", 32, 32)]);
        let short = PrefixSetExpr::Explicit(vec![range("10.0.0.0/8", 8, 24)]);
        let cond = prefix_set(&ctx, PrefixExpr::NextHopIp, &host, &route).unwrap();
        assert_eq!(cond, route.next_hop.first_bits_equal(&bdd, 10 << 24, 8));
        assert_eq!(prefix_set(&ctx, PrefixExpr::NextHopIp, &short, &route).unwrap(), bdd.zero);
    }
}
