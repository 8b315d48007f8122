//! Queries over the paths of a policy.

use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::reference::Ref;
use crate::route::{BddRoute, RouteLayout};
use crate::transfer::TransferReturn;

/// Input routes that are accepted and whose output satisfies `post`.
///
/// Denying paths never contribute, whatever their output route.
pub fn weakest_precondition<F>(bdd: &Bdd, paths: &[TransferReturn], post: F) -> Ref
where
    F: Fn(&BddRoute) -> Ref,
{
    bdd.apply_or_many(
        paths
            .iter()
            .filter(|path| path.accepted)
            .map(|path| bdd.apply_and(path.condition, post(&path.route))),
    )
}

pub fn accepted_routes(bdd: &Bdd, paths: &[TransferReturn]) -> Ref {
    bdd.apply_or_many(paths.iter().filter(|p| p.accepted).map(|p| p.condition))
}

pub fn denied_routes(bdd: &Bdd, paths: &[TransferReturn]) -> Ref {
    bdd.apply_or_many(paths.iter().filter(|p| !p.accepted).map(|p| p.condition))
}

/// Number of input-variable assignments satisfying `cond`.
pub fn count_routes(bdd: &Bdd, layout: &RouteLayout, cond: Ref) -> BigUint {
    bdd.sat_count(cond, layout.num_vars())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integer::BddInteger;
    use crate::route::INT_BITS;
    use test_log::test;

    #[test]
    fn test_queries() {
        let bdd = Bdd::default();
        let layout = RouteLayout::new(1, 1, []);
        let input = BddRoute::new(&bdd, &layout);
        let g = input.prefix_length.value(&bdd, 24);
        let mut updated = input.clone();
        updated.tag = BddInteger::constant(&bdd, INT_BITS, 5);

        let paths = vec![
            TransferReturn::new(updated.clone(), g, true),
            TransferReturn::new(BddRoute::zeroed(&bdd, &layout), -g, false),
        ];
        assert_eq!(accepted_routes(&bdd, &paths), g);
        assert_eq!(denied_routes(&bdd, &paths), -g);

        let tag5 = weakest_precondition(&bdd, &paths, |r| r.tag.value(&bdd, 5));
        assert_eq!(tag5, g);
        // The zeroed route has tag 0, but denying paths are excluded.
        let tag0 = weakest_precondition(&bdd, &paths, |r| r.tag.value(&bdd, 0));
        assert_eq!(tag0, bdd.zero);

        let total = BigUint::from(1u32) << layout.num_vars();
        assert_eq!(count_routes(&bdd, &layout, bdd.one), total);
        assert_eq!(count_routes(&bdd, &layout, g), total >> 6);
    }
}
