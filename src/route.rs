//! Symbolic routes.
//!
//! A [`BddRoute`] stands for a set of concrete routes: each attribute is a
//! vector of conditions over the input variables. The input route of an
//! analysis has one fresh variable per attribute bit, laid out by a
//! [`RouteLayout`].

use std::fmt;

use crate::ast::TunnelEncapsulation;
use crate::bdd::Bdd;
use crate::domain::{bits_for, BddDomain};
use crate::integer::BddInteger;
use crate::reference::Ref;

pub const PREFIX_LENGTH_BITS: usize = 6;
pub const ADDRESS_BITS: usize = 32;
pub const INT_BITS: usize = 32;

/// Value of the tunnel-encapsulation attribute.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum TunnelValue {
    Absent,
    /// Present, but none of the values mentioned by the configuration.
    Unknown,
    Literal(TunnelEncapsulation),
}

impl fmt::Display for TunnelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TunnelValue::Absent => write!(f, "absent"),
            TunnelValue::Unknown => write!(f, "unknown"),
            TunnelValue::Literal(t) => write!(f, "{}", t),
        }
    }
}

/// Source protocol of a route.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ProtocolValue {
    /// None of the protocols mentioned by the configuration.
    Other,
    Named(String),
}

impl fmt::Display for ProtocolValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolValue::Other => write!(f, "other"),
            ProtocolValue::Named(name) => write!(f, "{}", name),
        }
    }
}

/// Variable allocation of the input route.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RouteLayout {
    num_communities: usize,
    num_as_paths: usize,
    tunnels: Vec<TunnelValue>,
    protocols: Vec<ProtocolValue>,
}

impl RouteLayout {
    pub fn new(
        num_communities: usize,
        num_as_paths: usize,
        tunnels: impl IntoIterator<Item = TunnelEncapsulation>,
    ) -> Self {
        let tunnels = [TunnelValue::Absent, TunnelValue::Unknown]
            .into_iter()
            .chain(tunnels.into_iter().map(TunnelValue::Literal))
            .collect();
        RouteLayout {
            num_communities,
            num_as_paths,
            tunnels,
            protocols: vec![ProtocolValue::Other],
        }
    }

    /// The same layout, with a protocol domain over `protocols`.
    pub fn with_protocols(mut self, protocols: impl IntoIterator<Item = String>) -> Self {
        self.protocols = std::iter::once(ProtocolValue::Other)
            .chain(protocols.into_iter().map(ProtocolValue::Named))
            .collect();
        self
    }

    pub fn num_communities(&self) -> usize {
        self.num_communities
    }

    pub fn num_as_paths(&self) -> usize {
        self.num_as_paths
    }

    pub fn tunnel_values(&self) -> &[TunnelValue] {
        &self.tunnels
    }

    pub fn tunnel_bits(&self) -> usize {
        bits_for(self.tunnels.len())
    }

    pub fn protocol_values(&self) -> &[ProtocolValue] {
        &self.protocols
    }

    pub fn protocol_bits(&self) -> usize {
        bits_for(self.protocols.len())
    }

    /// Total number of input variables.
    pub fn num_vars(&self) -> usize {
        PREFIX_LENGTH_BITS
            + ADDRESS_BITS
            + 4 * INT_BITS
            + ADDRESS_BITS
            + self.num_communities
            + self.num_as_paths
            + self.tunnel_bits()
            + self.protocol_bits()
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BddRoute {
    pub prefix_length: BddInteger,
    pub prefix: BddInteger,
    pub local_preference: BddInteger,
    pub metric: BddInteger,
    pub admin_distance: BddInteger,
    pub tag: BddInteger,
    pub next_hop: BddInteger,
    pub next_hop_set: Ref,
    pub next_hop_discarded: Ref,
    /// One condition per community atomic predicate.
    pub communities: Vec<Ref>,
    /// One condition per AS-path atomic predicate.
    pub as_paths: Vec<Ref>,
    pub tunnel: BddDomain<TunnelValue>,
    /// Never written by policies.
    pub protocol: BddDomain<ProtocolValue>,
}

struct VarAllocator {
    next: u32,
}

impl VarAllocator {
    fn integer(&mut self, bdd: &Bdd, width: usize) -> BddInteger {
        let integer = BddInteger::vars(bdd, self.next, width);
        self.next += width as u32;
        integer
    }

    fn bits(&mut self, bdd: &Bdd, n: usize) -> Vec<Ref> {
        (0..n)
            .map(|_| {
                let v = bdd.mk_var(self.next);
                self.next += 1;
                v
            })
            .collect()
    }

    fn domain<T: Eq>(&mut self, bdd: &Bdd, values: Vec<T>) -> BddDomain<T> {
        let domain = BddDomain::vars(bdd, values, self.next);
        self.next += domain.num_bits() as u32;
        domain
    }
}

impl BddRoute {
    /// The unconstrained input route.
    pub fn new(bdd: &Bdd, layout: &RouteLayout) -> Self {
        let mut vars = VarAllocator { next: 1 };
        let prefix_length = vars.integer(bdd, PREFIX_LENGTH_BITS);
        let prefix = vars.integer(bdd, ADDRESS_BITS);
        let local_preference = vars.integer(bdd, INT_BITS);
        let metric = vars.integer(bdd, INT_BITS);
        let admin_distance = vars.integer(bdd, INT_BITS);
        let tag = vars.integer(bdd, INT_BITS);
        let next_hop = vars.integer(bdd, ADDRESS_BITS);
        let communities = vars.bits(bdd, layout.num_communities);
        let as_paths = vars.bits(bdd, layout.num_as_paths);
        let tunnel = vars.domain(bdd, layout.tunnels.clone());
        let protocol = vars.domain(bdd, layout.protocols.clone());
        BddRoute {
            prefix_length,
            prefix,
            local_preference,
            metric,
            admin_distance,
            tag,
            next_hop,
            next_hop_set: bdd.zero,
            next_hop_discarded: bdd.zero,
            communities,
            as_paths,
            tunnel,
            protocol,
        }
    }

    /// The route with every field zero. Rejected routes are mapped to it.
    pub fn zeroed(bdd: &Bdd, layout: &RouteLayout) -> Self {
        BddRoute {
            prefix_length: BddInteger::zero(bdd, PREFIX_LENGTH_BITS),
            prefix: BddInteger::zero(bdd, ADDRESS_BITS),
            local_preference: BddInteger::zero(bdd, INT_BITS),
            metric: BddInteger::zero(bdd, INT_BITS),
            admin_distance: BddInteger::zero(bdd, INT_BITS),
            tag: BddInteger::zero(bdd, INT_BITS),
            next_hop: BddInteger::zero(bdd, ADDRESS_BITS),
            next_hop_set: bdd.zero,
            next_hop_discarded: bdd.zero,
            communities: vec![bdd.zero; layout.num_communities],
            as_paths: vec![bdd.zero; layout.num_as_paths],
            tunnel: BddDomain::constant(bdd, layout.tunnels.clone(), 0),
            protocol: BddDomain::constant(bdd, layout.protocols.clone(), 0),
        }
    }

    /// Field-wise `ite(cond, then, other)`.
    pub fn ite(bdd: &Bdd, cond: Ref, then: &BddRoute, other: &BddRoute) -> BddRoute {
        if cond == bdd.one {
            return then.clone();
        }
        if cond == bdd.zero {
            return other.clone();
        }
        let refs = |a: &[Ref], b: &[Ref]| -> Vec<Ref> {
            a.iter()
                .zip(b)
                .map(|(&x, &y)| bdd.apply_ite(cond, x, y))
                .collect()
        };
        BddRoute {
            prefix_length: BddInteger::ite(bdd, cond, &then.prefix_length, &other.prefix_length),
            prefix: BddInteger::ite(bdd, cond, &then.prefix, &other.prefix),
            local_preference: BddInteger::ite(
                bdd,
                cond,
                &then.local_preference,
                &other.local_preference,
            ),
            metric: BddInteger::ite(bdd, cond, &then.metric, &other.metric),
            admin_distance: BddInteger::ite(bdd, cond, &then.admin_distance, &other.admin_distance),
            tag: BddInteger::ite(bdd, cond, &then.tag, &other.tag),
            next_hop: BddInteger::ite(bdd, cond, &then.next_hop, &other.next_hop),
            next_hop_set: bdd.apply_ite(cond, then.next_hop_set, other.next_hop_set),
            next_hop_discarded: bdd.apply_ite(
                cond,
                then.next_hop_discarded,
                other.next_hop_discarded,
            ),
            communities: refs(&then.communities, &other.communities),
            as_paths: refs(&then.as_paths, &other.as_paths),
            tunnel: BddDomain::ite(bdd, cond, &then.tunnel, &other.tunnel),
            protocol: BddDomain::ite(bdd, cond, &then.protocol, &other.protocol),
        }
    }

    /// Constraints every concrete input route satisfies.
    pub fn well_formed(&self, bdd: &Bdd) -> Ref {
        let length_ok = self.prefix_length.leq(bdd, ADDRESS_BITS as u64);
        let as_path_ok = bdd.exactly_one(&self.as_paths);
        let tunnel_ok = self.tunnel.is_valid(bdd);
        let protocol_ok = self.protocol.is_valid(bdd);
        bdd.apply_and_many([length_ok, as_path_ok, tunnel_ok, protocol_ok])
    }

    /// Every condition handle of this route.
    pub fn handles(&self) -> Vec<Ref> {
        let mut handles = Vec::new();
        for integer in [
            &self.prefix_length,
            &self.prefix,
            &self.local_preference,
            &self.metric,
            &self.admin_distance,
            &self.tag,
            &self.next_hop,
        ] {
            handles.extend_from_slice(integer.bits());
        }
        handles.push(self.next_hop_set);
        handles.push(self.next_hop_discarded);
        handles.extend_from_slice(&self.communities);
        handles.extend_from_slice(&self.as_paths);
        handles.extend_from_slice(self.tunnel.integer().bits());
        handles.extend_from_slice(self.protocol.integer().bits());
        handles
    }

    /// Names of the fields that differ from `other`.
    pub fn diff(&self, other: &BddRoute) -> Vec<&'static str> {
        let mut fields = Vec::new();
        let mut check = |name, same: bool| {
            if !same {
                fields.push(name);
            }
        };
        check("prefix_length", self.prefix_length == other.prefix_length);
        check("prefix", self.prefix == other.prefix);
        check("local_preference", self.local_preference == other.local_preference);
        check("metric", self.metric == other.metric);
        check("admin_distance", self.admin_distance == other.admin_distance);
        check("tag", self.tag == other.tag);
        check("next_hop", self.next_hop == other.next_hop);
        check("next_hop_set", self.next_hop_set == other.next_hop_set);
        check("next_hop_discarded", self.next_hop_discarded == other.next_hop_discarded);
        check("communities", self.communities == other.communities);
        check("as_paths", self.as_paths == other.as_paths);
        check("tunnel", self.tunnel == other.tunnel);
        check("protocol", self.protocol == other.protocol);
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn layout() -> RouteLayout {
        let tunnel = TunnelEncapsulation {
            endpoint: "1.1.1.1".parse().unwrap(),
        };
        RouteLayout::new(2, 3, [tunnel]).with_protocols(["bgp".to_string(), "ospf".to_string()])
    }

    #[test]
    fn test_layout() {
        let layout = layout();
        assert_eq!(layout.tunnel_values().len(), 3);
        assert_eq!(layout.tunnel_bits(), 2);
        assert_eq!(layout.protocol_values().len(), 3);
        assert_eq!(layout.protocol_bits(), 2);
        assert_eq!(layout.num_vars(), 6 + 32 * 6 + 2 + 3 + 2 + 2);
        assert_eq!(RouteLayout::new(0, 1, []).protocol_bits(), 1);
    }

    #[test]
    fn test_fresh_route_uses_all_variables() {
        let bdd = Bdd::default();
        let layout = layout();
        let route = BddRoute::new(&bdd, &layout);
        let support = bdd.support(bdd.apply_and_many(route.handles().into_iter().filter(|&h| {
            !bdd.is_terminal(h)
        })));
        assert_eq!(support.len(), layout.num_vars());
        assert_eq!(route.next_hop_set, bdd.zero);
    }

    #[test]
    fn test_ite_is_field_wise() {
        let bdd = Bdd::default();
        let layout = layout();
        let input = BddRoute::new(&bdd, &layout);
        let mut updated = input.clone();
        updated.local_preference = BddInteger::constant(&bdd, INT_BITS, 42);

        let cond = input.prefix_length.value(&bdd, 24);
        let merged = BddRoute::ite(&bdd, cond, &updated, &input);
        assert_eq!(merged.diff(&input), vec!["local_preference"]);
        assert_eq!(
            bdd.apply_and(cond, merged.local_preference.value(&bdd, 42)),
            cond
        );
        assert_eq!(BddRoute::ite(&bdd, bdd.one, &updated, &input), updated);
        assert_eq!(BddRoute::ite(&bdd, bdd.zero, &updated, &input), input);
    }

    #[test]
    fn test_well_formed() {
        let bdd = Bdd::default();
        let layout = layout();
        let route = BddRoute::new(&bdd, &layout);
        let wf = route.well_formed(&bdd);
        assert!(bdd.is_implies(wf, route.prefix_length.leq(&bdd, 32)));
        assert!(bdd.is_implies(wf, -route.tunnel.integer().value(&bdd, 3)));
        assert!(bdd.is_implies(wf, -route.protocol.integer().value(&bdd, 3)));
        assert!(bdd.is_implies(wf, bdd.apply_or_many(route.as_paths.clone())));
        assert!(bdd.is_zero(bdd.apply_and_many([wf, route.as_paths[0], route.as_paths[1]])));
        assert!(bdd.is_zero(BddRoute::zeroed(&bdd, &layout).well_formed(&bdd)));
    }
}
