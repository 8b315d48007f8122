//! Named definitions that policies refer to.

use std::collections::BTreeMap;

use crate::ast::{LineAction, Statement};
use crate::error::{Error, ReferenceKind, Result};
use crate::prefix::PrefixRange;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RoutingPolicy {
    pub name: String,
    pub statements: Vec<Statement>,
}

impl RoutingPolicy {
    pub fn new(name: impl Into<String>, statements: Vec<Statement>) -> Self {
        RoutingPolicy {
            name: name.into(),
            statements,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RouteFilterLine {
    pub action: LineAction,
    pub range: PrefixRange,
}

/// An ordered prefix list. The first matching line decides; no match denies.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RouteFilterList {
    pub name: String,
    pub lines: Vec<RouteFilterLine>,
}

impl RouteFilterList {
    pub fn new(name: impl Into<String>, lines: Vec<(LineAction, PrefixRange)>) -> Self {
        RouteFilterList {
            name: name.into(),
            lines: lines
                .into_iter()
                .map(|(action, range)| RouteFilterLine { action, range })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AsPathAccessListLine {
    pub action: LineAction,
    pub regex: String,
}

/// An ordered list of AS-path regexes. The first matching line decides; no match denies.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AsPathAccessList {
    pub name: String,
    pub lines: Vec<AsPathAccessListLine>,
}

impl AsPathAccessList {
    pub fn new(name: impl Into<String>, lines: Vec<(LineAction, &str)>) -> Self {
        AsPathAccessList {
            name: name.into(),
            lines: lines
                .into_iter()
                .map(|(action, regex)| AsPathAccessListLine {
                    action,
                    regex: regex.to_string(),
                })
                .collect(),
        }
    }
}

/// The parsed configuration of one device, as far as routing policies are concerned.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Configuration {
    pub hostname: String,
    pub routing_policies: BTreeMap<String, RoutingPolicy>,
    pub route_filter_lists: BTreeMap<String, RouteFilterList>,
    pub as_path_access_lists: BTreeMap<String, AsPathAccessList>,
}

impl Configuration {
    pub fn new(hostname: impl Into<String>) -> Self {
        Configuration {
            hostname: hostname.into(),
            ..Default::default()
        }
    }

    pub fn with_policy(mut self, policy: RoutingPolicy) -> Self {
        self.add_policy(policy);
        self
    }

    pub fn with_route_filter_list(mut self, list: RouteFilterList) -> Self {
        self.route_filter_lists.insert(list.name.clone(), list);
        self
    }

    pub fn with_as_path_access_list(mut self, list: AsPathAccessList) -> Self {
        self.as_path_access_lists.insert(list.name.clone(), list);
        self
    }

    pub fn add_policy(&mut self, policy: RoutingPolicy) {
        self.routing_policies.insert(policy.name.clone(), policy);
    }

    pub fn policy(&self, name: &str) -> Result<&RoutingPolicy> {
        self.routing_policies
            .get(name)
            .ok_or_else(|| Error::undefined(ReferenceKind::RoutingPolicy, name))
    }

    pub fn route_filter_list(&self, name: &str) -> Result<&RouteFilterList> {
        self.route_filter_lists
            .get(name)
            .ok_or_else(|| Error::undefined(ReferenceKind::RouteFilterList, name))
    }

    pub fn as_path_access_list(&self, name: &str) -> Result<&AsPathAccessList> {
        self.as_path_access_lists
            .get(name)
            .ok_or_else(|| Error::undefined(ReferenceKind::AsPathAccessList, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_lookup() {
        let config = Configuration::new("r1")
            .with_policy(RoutingPolicy::new("p", vec![Statement::accept()]))
            .with_as_path_access_list(AsPathAccessList::new(
                "a",
                vec![(LineAction::Permit, "^40 ")],
            ));
        assert_eq!(config.policy("p").unwrap().statements.len(), 1);
        assert_eq!(config.as_path_access_list("a").unwrap().lines[0].regex, "^40 ");
        assert!(matches!(
            config.policy("q"),
            Err(Error::MalformedReference {
                kind: ReferenceKind::RoutingPolicy,
                ..
            })
        ));
        assert!(config.route_filter_list("q").is_err());
    }
}
