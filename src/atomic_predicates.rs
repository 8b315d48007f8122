//! Atomic predicates over community and AS-path strings.
//!
//! Every literal and regex tracked by an analysis is a constraint over the
//! universe of strings. The universe is refined into classes such that each
//! class lies entirely inside or entirely outside every constraint. Each
//! class then becomes one boolean variable of a symbolic route, and each
//! constraint is the disjunction of its classes.
//!
//! A regex that cannot be parsed gets an opaque class of its own, disjoint
//! from every other class. Building the partition never fails; matching
//! against such a regex does.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::ast::{
    AsPathMatchExpr, BooleanExpr, CommunityMatchExpr, CommunitySetExpr, CommunitySetMatchExpr,
    IntComparator, Statement, TunnelEncapsulation,
};
use crate::automata::Dfa;
use crate::config::Configuration;
use crate::error::{Error, Result};
use crate::regex::{embed, literal_language, search_language, universe, unembed};

/// A string constraint whose match set must be expressible by atomic predicates.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum TrackedValue {
    /// Exactly this string.
    Literal(String),
    /// Strings containing a match of this regex.
    Regex(String),
}

impl TrackedValue {
    pub fn literal(value: impl Into<String>) -> Self {
        TrackedValue::Literal(value.into())
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        TrackedValue::Regex(pattern.into())
    }

    pub fn language(&self) -> Result<Dfa> {
        match self {
            TrackedValue::Literal(value) => Ok(literal_language(value)),
            TrackedValue::Regex(pattern) => search_language(pattern),
        }
    }
}

/// A partition of the string universe refining a set of tracked values.
#[derive(Debug, Clone)]
pub struct RegexAtomicPredicates {
    classes: Vec<Dfa>,
    /// Values without a language, with the parse error. Their classes follow `classes`.
    opaque: BTreeMap<TrackedValue, String>,
    mapping: BTreeMap<TrackedValue, BTreeSet<usize>>,
}

impl RegexAtomicPredicates {
    pub fn new(values: impl IntoIterator<Item = TrackedValue>) -> Self {
        let values: BTreeSet<TrackedValue> = values.into_iter().collect();

        let mut languages = Vec::with_capacity(values.len());
        let mut opaque = BTreeMap::new();
        for value in values {
            match value.language() {
                Ok(language) => languages.push((value, language)),
                Err(e) => {
                    debug!("opaque class for {:?}: {}", value, e);
                    let reason = match e {
                        Error::Unsupported(reason) => reason,
                        e => e.to_string(),
                    };
                    opaque.insert(value, reason);
                }
            }
        }

        let mut classes = vec![universe()];
        for (value, language) in &languages {
            let mut refined = Vec::with_capacity(classes.len() + 1);
            for class in &classes {
                let inside = class.intersection(language);
                let outside = class.difference(language);
                if !inside.is_empty() {
                    refined.push(inside);
                }
                if !outside.is_empty() {
                    refined.push(outside);
                }
            }
            debug!("refine by {:?}: {} -> {} classes", value, classes.len(), refined.len());
            classes = refined;
        }

        let mut mapping: BTreeMap<_, _> = languages
            .into_iter()
            .map(|(value, language)| {
                let members = classes
                    .iter()
                    .enumerate()
                    .filter(|(_, class)| !class.intersection(&language).is_empty())
                    .map(|(i, _)| i)
                    .collect();
                (value, members)
            })
            .collect();
        for (i, value) in opaque.keys().enumerate() {
            mapping.insert(value.clone(), BTreeSet::from([classes.len() + i]));
        }

        RegexAtomicPredicates {
            classes,
            opaque,
            mapping,
        }
    }

    pub fn num_predicates(&self) -> usize {
        self.classes.len() + self.opaque.len()
    }

    /// The language of class `index`, over embedded strings. `None` for opaque classes.
    pub fn class(&self, index: usize) -> Option<&Dfa> {
        self.classes.get(index)
    }

    /// The parse error of `value`, if it only has an opaque class.
    pub fn unreadable(&self, value: &TrackedValue) -> Option<&str> {
        self.opaque.get(value).map(String::as_str)
    }

    pub fn mapping(&self) -> &BTreeMap<TrackedValue, BTreeSet<usize>> {
        &self.mapping
    }

    pub fn predicates(&self, value: &TrackedValue) -> Option<&BTreeSet<usize>> {
        self.mapping.get(value)
    }

    /// The classes of `value`, for compiling a match against it.
    pub fn matching(&self, value: &TrackedValue) -> Result<&BTreeSet<usize>> {
        if let Some(reason) = self.unreadable(value) {
            return Err(Error::unsupported(reason));
        }
        self.predicates(value)
            .ok_or_else(|| Error::unsupported(format!("untracked value {:?}", value)))
    }

    /// The class containing `value`, if it is a valid string.
    pub fn classify(&self, value: &str) -> Option<usize> {
        let word = embed(value);
        self.classes.iter().position(|class| class.accepts(&word))
    }

    /// A shortest string in class `index`.
    pub fn witness(&self, index: usize) -> Option<String> {
        self.classes
            .get(index)
            .and_then(|class| class.shortest_path())
            .map(|word| unembed(&word))
    }
}

/// Atomic predicates and literal domains collected from a whole configuration.
#[derive(Debug, Clone)]
pub struct ConfigAtomicPredicates {
    pub communities: RegexAtomicPredicates,
    pub as_paths: RegexAtomicPredicates,
    /// Tunnel encapsulations mentioned anywhere, in sorted order.
    pub tunnels: Vec<TunnelEncapsulation>,
    /// Source protocols mentioned anywhere, in sorted order.
    pub protocols: Vec<String>,
}

impl ConfigAtomicPredicates {
    pub fn new(
        config: &Configuration,
        extra_communities: &[String],
        extra_as_paths: &[String],
    ) -> Self {
        let mut collector = Collector::default();
        for policy in config.routing_policies.values() {
            collector.statements(&policy.statements);
        }
        for list in config.as_path_access_lists.values() {
            for line in &list.lines {
                collector.as_paths.insert(TrackedValue::regex(&line.regex));
            }
        }
        collector
            .communities
            .extend(extra_communities.iter().map(TrackedValue::literal));
        collector
            .as_paths
            .extend(extra_as_paths.iter().map(TrackedValue::regex));

        debug!(
            "tracking {} community values, {} as-path regexes, {} tunnels, {} protocols",
            collector.communities.len(),
            collector.as_paths.len(),
            collector.tunnels.len(),
            collector.protocols.len()
        );

        ConfigAtomicPredicates {
            communities: RegexAtomicPredicates::new(collector.communities),
            as_paths: RegexAtomicPredicates::new(collector.as_paths),
            tunnels: collector.tunnels.into_iter().collect(),
            protocols: collector.protocols.into_iter().collect(),
        }
    }
}

/// The regex standing for a comparison on one half of a standard community.
pub(crate) fn half_regex(high: bool, cmp: IntComparator, value: u64) -> Option<String> {
    match cmp {
        IntComparator::Eq if high => Some(format!("^{}:", value)),
        IntComparator::Eq => Some(format!(":{}$", value)),
        _ => None,
    }
}

#[derive(Default)]
struct Collector {
    communities: BTreeSet<TrackedValue>,
    as_paths: BTreeSet<TrackedValue>,
    tunnels: BTreeSet<TunnelEncapsulation>,
    protocols: BTreeSet<String>,
}

impl Collector {
    fn statements(&mut self, statements: &[Statement]) {
        for statement in statements {
            self.statement(statement);
        }
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::If {
                guard,
                true_statements,
                false_statements,
            } => {
                self.boolean(guard);
                self.statements(true_statements);
                self.statements(false_statements);
            }
            Statement::Buffered(inner) => self.statement(inner),
            Statement::Traceable { statements, .. } => self.statements(statements),
            Statement::SetCommunities(expr) => self.community_set(expr),
            Statement::SetTunnelEncapsulation(Some(tunnel)) => {
                self.tunnels.insert(*tunnel);
            }
            _ => {}
        }
    }

    fn boolean(&mut self, expr: &BooleanExpr) {
        match expr {
            BooleanExpr::Conjunction(exprs)
            | BooleanExpr::Disjunction(exprs)
            | BooleanExpr::ConjunctionChain(exprs)
            | BooleanExpr::FirstMatchChain(exprs) => {
                for e in exprs {
                    self.boolean(e);
                }
            }
            BooleanExpr::Not(e) => self.boolean(e),
            BooleanExpr::MatchCommunities(expr) => self.community_set_match(expr),
            BooleanExpr::MatchAsPath(expr) => self.as_path(expr),
            BooleanExpr::MatchTunnelEncapsulation(Some(tunnel)) => {
                self.tunnels.insert(*tunnel);
            }
            BooleanExpr::MatchProtocol(protocols) => {
                self.protocols.extend(protocols.iter().cloned());
            }
            _ => {}
        }
    }

    fn community_set_match(&mut self, expr: &CommunitySetMatchExpr) {
        match expr {
            CommunitySetMatchExpr::Has(e) => self.community_match(e),
            CommunitySetMatchExpr::All(exprs) | CommunitySetMatchExpr::Any(exprs) => {
                for e in exprs {
                    self.community_set_match(e);
                }
            }
            CommunitySetMatchExpr::Not(e) => self.community_set_match(e),
            CommunitySetMatchExpr::SetRegex(_) => {}
        }
    }

    fn community_match(&mut self, expr: &CommunityMatchExpr) {
        match expr {
            CommunityMatchExpr::Is(c) => {
                self.communities.insert(TrackedValue::literal(c.to_string()));
            }
            CommunityMatchExpr::Regex(r) => {
                self.communities.insert(TrackedValue::regex(r));
            }
            CommunityMatchExpr::HighMatch(cmp) | CommunityMatchExpr::LowMatch(cmp) => {
                let high = matches!(expr, CommunityMatchExpr::HighMatch(_));
                if let Some(r) = half_regex(high, cmp.cmp, cmp.value) {
                    self.communities.insert(TrackedValue::Regex(r));
                }
            }
            CommunityMatchExpr::All(exprs) | CommunityMatchExpr::Any(exprs) => {
                for e in exprs {
                    self.community_match(e);
                }
            }
            CommunityMatchExpr::Not(e) => self.community_match(e),
            CommunityMatchExpr::Acl(lines) => {
                for (_, e) in lines {
                    self.community_match(e);
                }
            }
        }
    }

    fn community_set(&mut self, expr: &CommunitySetExpr) {
        match expr {
            CommunitySetExpr::Input => {}
            CommunitySetExpr::Literal(communities) => {
                self.communities
                    .extend(communities.iter().map(|c| TrackedValue::literal(c.to_string())));
            }
            CommunitySetExpr::Union(exprs) => {
                for e in exprs {
                    self.community_set(e);
                }
            }
            CommunitySetExpr::Difference(left, removed) => {
                self.community_set(left);
                self.community_match(removed);
            }
        }
    }

    fn as_path(&mut self, expr: &AsPathMatchExpr) {
        match expr {
            AsPathMatchExpr::Regex(r) => {
                self.as_paths.insert(TrackedValue::regex(r));
            }
            AsPathMatchExpr::All(exprs) | AsPathMatchExpr::Any(exprs) => {
                for e in exprs {
                    self.as_path(e);
                }
            }
            AsPathMatchExpr::Not(e) => self.as_path(e),
            AsPathMatchExpr::List(_) | AsPathMatchExpr::Length(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Community, IntComparison, LineAction};
    use crate::config::{AsPathAccessList, RoutingPolicy};
    use test_log::test;

    fn union_of(aps: &RegexAtomicPredicates, members: &BTreeSet<usize>) -> Dfa {
        members
            .iter()
            .fold(Dfa::trivial(false), |acc, &i| acc.union(aps.class(i).unwrap()))
    }

    #[test]
    fn test_no_values_single_class() {
        let aps = RegexAtomicPredicates::new(vec![]);
        assert_eq!(aps.num_predicates(), 1);
        assert_eq!(aps.classify("anything"), Some(0));
    }

    #[test]
    fn test_disjoint_regexes() {
        let aps = RegexAtomicPredicates::new(vec![
            TrackedValue::regex("^1:"),
            TrackedValue::regex("^2:"),
        ]);
        assert_eq!(aps.num_predicates(), 3);
        let one = aps.predicates(&TrackedValue::regex("^1:")).unwrap();
        let two = aps.predicates(&TrackedValue::regex("^2:")).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(two.len(), 1);
        assert!(one.is_disjoint(two));
    }

    #[test]
    fn test_literal_gets_own_class() {
        let aps = RegexAtomicPredicates::new(vec![
            TrackedValue::literal("1:1"),
            TrackedValue::regex("^1:"),
        ]);
        assert_eq!(aps.num_predicates(), 3);
        let lit = aps.predicates(&TrackedValue::literal("1:1")).unwrap();
        let regex = aps.predicates(&TrackedValue::regex("^1:")).unwrap();
        assert_eq!(lit.len(), 1);
        assert_eq!(regex.len(), 2);
        assert!(lit.is_subset(regex));
        let class = *lit.iter().next().unwrap();
        assert_eq!(aps.witness(class).as_deref(), Some("1:1"));
        assert_eq!(aps.classify("1:1"), Some(class));
    }

    #[test]
    fn test_partition_soundness() {
        let values = vec![
            TrackedValue::literal("30:20"),
            TrackedValue::regex("^30:"),
            TrackedValue::regex(":20$"),
            TrackedValue::regex("(^| )40( |$)"),
        ];
        let aps = RegexAtomicPredicates::new(values.clone());
        for value in &values {
            let members = aps.predicates(value).unwrap();
            let language = value.language().unwrap();
            assert!(union_of(&aps, members).equivalent(&language), "{:?}", value);
        }
        for s in ["30:20", "30:1", "1:20", "40", "1 40 2", "7:7", ""] {
            let class = aps.classify(s).unwrap();
            for value in &values {
                let matches = value.language().unwrap().accepts(&embed(s));
                assert_eq!(aps.predicates(value).unwrap().contains(&class), matches);
            }
        }
    }

    #[test]
    fn test_order_independence() {
        let values = vec![
            TrackedValue::regex("^30:"),
            TrackedValue::regex(":20$"),
            TrackedValue::literal("30:20"),
        ];
        let a = RegexAtomicPredicates::new(values.clone());
        let b = RegexAtomicPredicates::new(values.into_iter().rev());
        assert_eq!(a.num_predicates(), b.num_predicates());
        assert_eq!(a.mapping(), b.mapping());
    }

    #[test]
    fn test_collect_from_config() {
        let policy = RoutingPolicy::new(
            "p",
            vec![
                Statement::if_then(
                    BooleanExpr::has_community(CommunityMatchExpr::HighMatch(
                        IntComparison::eq(30),
                    )),
                    vec![Statement::accept()],
                ),
                Statement::SetCommunities(CommunitySetExpr::Literal(vec![Community::standard(
                    10, 10,
                )])),
                Statement::SetTunnelEncapsulation(Some(TunnelEncapsulation {
                    endpoint: "10.0.0.1".parse().unwrap(),
                })),
            ],
        );
        let config = Configuration::new("r1")
            .with_policy(policy)
            .with_as_path_access_list(AsPathAccessList::new(
                "l",
                vec![(LineAction::Permit, "^40 ")],
            ));
        let aps = ConfigAtomicPredicates::new(&config, &["20:20".to_string()], &[]);
        assert!(aps.communities.predicates(&TrackedValue::regex("^30:")).is_some());
        assert!(aps.communities.predicates(&TrackedValue::literal("10:10")).is_some());
        assert!(aps.communities.predicates(&TrackedValue::literal("20:20")).is_some());
        assert_eq!(aps.communities.num_predicates(), 4);
        assert_eq!(aps.as_paths.num_predicates(), 2);
        assert_eq!(aps.tunnels.len(), 1);
        assert!(aps.protocols.is_empty());
    }

    #[test]
    fn test_unparseable_regex_gets_opaque_class() {
        let broken = TrackedValue::regex("^65000:(?=1)");
        let values = vec![
            TrackedValue::regex("^65000:"),
            broken.clone(),
            TrackedValue::literal("65000:1"),
        ];
        let aps = RegexAtomicPredicates::new(values.clone());
        assert_eq!(aps.num_predicates(), 4);

        let opaque = aps.predicates(&broken).unwrap();
        assert_eq!(opaque, &BTreeSet::from([3]));
        assert!(aps.class(3).is_none());
        assert!(aps.witness(3).is_none());
        assert!(aps.unreadable(&broken).is_some());
        assert!(matches!(aps.matching(&broken), Err(Error::Unsupported(_))));

        // The readable values are partitioned as if the broken one were absent.
        let readable = RegexAtomicPredicates::new(vec![values[0].clone(), values[2].clone()]);
        assert_eq!(readable.num_predicates(), 3);
        for value in [&values[0], &values[2]] {
            assert_eq!(aps.predicates(value), readable.predicates(value));
            assert!(aps.matching(value).unwrap().is_disjoint(opaque));
        }
        assert_eq!(aps.classify("65000:1"), readable.classify("65000:1"));
    }

    #[test]
    fn test_collect_protocols() {
        let policy = RoutingPolicy::new(
            "p",
            vec![Statement::if_then(
                BooleanExpr::Not(Box::new(BooleanExpr::match_protocol(["ospf", "connected"]))),
                vec![Statement::accept()],
            )],
        );
        let config = Configuration::new("r1").with_policy(policy);
        let aps = ConfigAtomicPredicates::new(&config, &[], &[]);
        assert_eq!(aps.protocols, vec!["connected".to_string(), "ospf".to_string()]);
    }
}
