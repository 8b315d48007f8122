//! Concrete witnesses for symbolic conditions.

use std::collections::HashMap;
use std::fmt;
use std::net::Ipv4Addr;

use crate::atomic_predicates::ConfigAtomicPredicates;
use crate::bdd::Bdd;
use crate::integer::BddInteger;
use crate::prefix::Prefix;
use crate::reference::Ref;
use crate::route::{BddRoute, ProtocolValue, TunnelValue, ADDRESS_BITS};
use crate::transfer::{TransferBdd, TransferReturn};
use crate::types::Lit;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum NextHop {
    /// The next hop of the input route.
    Original(Ipv4Addr),
    Ip(Ipv4Addr),
    Discard,
}

/// One concrete route.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ConcreteRoute {
    pub prefix: Prefix,
    pub local_preference: u32,
    pub metric: u32,
    pub admin_distance: u32,
    pub tag: u32,
    pub next_hop: NextHop,
    /// One representative community per class present on the route.
    pub communities: Vec<String>,
    pub as_path: Option<String>,
    pub tunnel: TunnelValue,
    pub protocol: ProtocolValue,
}

/// Turn a cube into an assignment. Absent variables are false.
pub fn assignment(cube: &[Lit]) -> HashMap<u32, bool> {
    cube.iter()
        .map(|lit| (lit.var().id(), lit.is_positive()))
        .collect()
}

impl ConcreteRoute {
    pub fn from_assignment(
        bdd: &Bdd,
        aps: &ConfigAtomicPredicates,
        route: &BddRoute,
        assignment: &HashMap<u32, bool>,
    ) -> Self {
        let int = |x: &BddInteger| x.eval(bdd, assignment) as u32;
        let holds = |r: Ref| bdd.evaluate(r, assignment);

        let length = (route.prefix_length.eval(bdd, assignment) as u8).min(ADDRESS_BITS as u8);
        let prefix = Prefix::new(Ipv4Addr::from(int(&route.prefix)), length);
        let next_hop = if holds(route.next_hop_discarded) {
            NextHop::Discard
        } else if holds(route.next_hop_set) {
            NextHop::Ip(Ipv4Addr::from(int(&route.next_hop)))
        } else {
            NextHop::Original(Ipv4Addr::from(int(&route.next_hop)))
        };
        let communities = route
            .communities
            .iter()
            .enumerate()
            .filter(|&(_, &bit)| holds(bit))
            .filter_map(|(i, _)| aps.communities.witness(i))
            .collect();
        let as_path = route
            .as_paths
            .iter()
            .position(|&bit| holds(bit))
            .and_then(|i| aps.as_paths.witness(i));
        let tunnel = route
            .tunnel
            .eval(bdd, assignment)
            .copied()
            .unwrap_or(TunnelValue::Unknown);
        let protocol = route
            .protocol
            .eval(bdd, assignment)
            .cloned()
            .unwrap_or(ProtocolValue::Other);

        ConcreteRoute {
            prefix,
            local_preference: int(&route.local_preference),
            metric: int(&route.metric),
            admin_distance: int(&route.admin_distance),
            tag: int(&route.tag),
            next_hop,
            communities,
            as_path,
            tunnel,
            protocol,
        }
    }
}

impl fmt::Display for ConcreteRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lp={} metric={} ad={} tag={}",
            self.prefix, self.local_preference, self.metric, self.admin_distance, self.tag
        )?;
        match self.next_hop {
            NextHop::Original(ip) => write!(f, " nh={}", ip)?,
            NextHop::Ip(ip) => write!(f, " nh={} (set)", ip)?,
            NextHop::Discard => write!(f, " nh=discard")?,
        }
        write!(f, " communities=[{}]", self.communities.join(" "))?;
        if let Some(as_path) = &self.as_path {
            write!(f, " as-path=\"{}\"", as_path)?;
        }
        write!(f, " tunnel={} protocol={}", self.tunnel, self.protocol)
    }
}

/// A well-formed input route satisfying `cond`.
pub fn example(tbdd: &TransferBdd<'_>, cond: Ref) -> Option<ConcreteRoute> {
    examples(tbdd, cond, 1).into_iter().next()
}

/// Up to `n` well-formed input routes satisfying `cond`, one per cube.
pub fn examples(tbdd: &TransferBdd<'_>, cond: Ref, n: usize) -> Vec<ConcreteRoute> {
    let bdd = tbdd.bdd();
    let input = tbdd.input_route();
    let cond = bdd.apply_and(cond, input.well_formed(bdd));
    bdd.cubes(cond)
        .take(n)
        .map(|cube| {
            ConcreteRoute::from_assignment(bdd, tbdd.atomic_predicates(), input, &assignment(&cube))
        })
        .collect()
}

/// An input route taking `path` together with the route the policy produces for it.
pub fn example_path(
    tbdd: &TransferBdd<'_>,
    path: &TransferReturn,
) -> Option<(ConcreteRoute, ConcreteRoute)> {
    let bdd = tbdd.bdd();
    let cond = bdd.apply_and(path.condition, tbdd.input_route().well_formed(bdd));
    let cube = bdd.one_sat(cond)?;
    let assignment = assignment(&cube);
    let aps = tbdd.atomic_predicates();
    Some((
        ConcreteRoute::from_assignment(bdd, aps, tbdd.input_route(), &assignment),
        ConcreteRoute::from_assignment(bdd, aps, &path.route, &assignment),
    ))
}
