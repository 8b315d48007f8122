//! Vendor-neutral routing policy syntax.
//!
//! A routing policy is a list of [`Statement`]s. Guards are [`BooleanExpr`]s
//! built from matches over route attributes. The tree is produced by a
//! configuration front end and is never modified by the analysis.

use std::fmt;
use std::net::Ipv4Addr;

use crate::prefix::PrefixRange;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LineAction {
    Permit,
    Deny,
}

impl LineAction {
    pub fn is_permit(self) -> bool {
        self == LineAction::Permit
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum IntComparator {
    Eq,
    Ge,
    Gt,
    Le,
    Lt,
}

/// Comparison of an integer attribute against a literal.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct IntComparison {
    pub cmp: IntComparator,
    pub value: u64,
}

impl IntComparison {
    pub fn new(cmp: IntComparator, value: u64) -> Self {
        IntComparison { cmp, value }
    }

    pub fn eq(value: u64) -> Self {
        IntComparison::new(IntComparator::Eq, value)
    }
}

/// Right-hand side of an integer attribute assignment.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LongExpr {
    Literal(u64),
    Increment(u64),
    Decrement(u64),
}

// ---------------------------------------------------------------------------
// Communities
// ---------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Community {
    Standard { high: u16, low: u16 },
    Large { global: u32, local1: u32, local2: u32 },
}

impl Community {
    pub fn standard(high: u16, low: u16) -> Self {
        Community::Standard { high, low }
    }
}

impl fmt::Display for Community {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Community::Standard { high, low } => write!(f, "{}:{}", high, low),
            Community::Large {
                global,
                local1,
                local2,
            } => write!(f, "large:{}:{}:{}", global, local1, local2),
        }
    }
}

/// A predicate over a single community.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CommunityMatchExpr {
    Is(Community),
    /// Regex over the community's string form.
    Regex(String),
    /// Comparison on the high 16 bits of a standard community.
    HighMatch(IntComparison),
    /// Comparison on the low 16 bits of a standard community.
    LowMatch(IntComparison),
    All(Vec<CommunityMatchExpr>),
    Any(Vec<CommunityMatchExpr>),
    Not(Box<CommunityMatchExpr>),
    /// First matching line decides.
    Acl(Vec<(LineAction, CommunityMatchExpr)>),
}

impl CommunityMatchExpr {
    pub fn regex(pattern: impl Into<String>) -> Self {
        CommunityMatchExpr::Regex(pattern.into())
    }

    pub fn not(self) -> Self {
        CommunityMatchExpr::Not(Box::new(self))
    }
}

/// A predicate over the set of communities carried by a route.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CommunitySetMatchExpr {
    /// Some community in the set satisfies the predicate.
    Has(CommunityMatchExpr),
    All(Vec<CommunitySetMatchExpr>),
    Any(Vec<CommunitySetMatchExpr>),
    Not(Box<CommunitySetMatchExpr>),
    /// Regex over the rendered set. Not modelled.
    SetRegex(String),
}

/// A community set value, used on the right-hand side of set-communities.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CommunitySetExpr {
    /// The communities of the input route.
    Input,
    Literal(Vec<Community>),
    Union(Vec<CommunitySetExpr>),
    /// The left set without communities matching the predicate.
    Difference(Box<CommunitySetExpr>, CommunityMatchExpr),
}

// ---------------------------------------------------------------------------
// AS paths
// ---------------------------------------------------------------------------

/// A predicate over the AS path of a route.
///
/// AS paths are matched as strings of space-separated AS numbers.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum AsPathMatchExpr {
    Regex(String),
    /// A named AS-path access list from the configuration.
    List(String),
    All(Vec<AsPathMatchExpr>),
    Any(Vec<AsPathMatchExpr>),
    Not(Box<AsPathMatchExpr>),
    /// Number of ASes in the path. Not modelled.
    Length(IntComparison),
}

impl AsPathMatchExpr {
    pub fn regex(pattern: impl Into<String>) -> Self {
        AsPathMatchExpr::Regex(pattern.into())
    }

    pub fn list(name: impl Into<String>) -> Self {
        AsPathMatchExpr::List(name.into())
    }
}

// ---------------------------------------------------------------------------
// Prefixes, next hops and tunnels
// ---------------------------------------------------------------------------

/// Which address of the route a prefix set is matched against.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PrefixExpr {
    DestinationNetwork,
    /// The next-hop address, as a /32.
    NextHopIp,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PrefixSetExpr {
    Explicit(Vec<PrefixRange>),
    /// A named route-filter list from the configuration.
    Named(String),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum NextHopExpr {
    Ip(Ipv4Addr),
    Discard,
    /// The address of the local router. Not modelled.
    SelfNextHop,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TunnelEncapsulation {
    pub endpoint: Ipv4Addr,
}

impl fmt::Display for TunnelEncapsulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tunnel-endpoint:{}", self.endpoint)
    }
}

// ---------------------------------------------------------------------------
// Expressions and statements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum BooleanExpr {
    True,
    False,
    /// True when evaluated inside a policy called as an expression.
    CallExprContext,
    /// True when evaluated inside a policy called as a statement.
    CallStatementContext,
    Conjunction(Vec<BooleanExpr>),
    Disjunction(Vec<BooleanExpr>),
    Not(Box<BooleanExpr>),
    /// Call sub-policies in order until one returns false.
    ConjunctionChain(Vec<BooleanExpr>),
    /// Call sub-policies in order until one does not fall through.
    FirstMatchChain(Vec<BooleanExpr>),
    CallExpr(String),
    MatchPrefixSet {
        prefix: PrefixExpr,
        prefix_set: PrefixSetExpr,
    },
    MatchCommunities(CommunitySetMatchExpr),
    MatchAsPath(AsPathMatchExpr),
    MatchTag(IntComparison),
    MatchMetric(IntComparison),
    MatchLocalPreference(IntComparison),
    /// `None` matches routes without a tunnel encapsulation attribute.
    MatchTunnelEncapsulation(Option<TunnelEncapsulation>),
    /// The route was learned through any of these protocols.
    MatchProtocol(Vec<String>),
}

impl BooleanExpr {
    pub fn and(conjuncts: Vec<BooleanExpr>) -> Self {
        BooleanExpr::Conjunction(conjuncts)
    }

    pub fn or(disjuncts: Vec<BooleanExpr>) -> Self {
        BooleanExpr::Disjunction(disjuncts)
    }

    pub fn not(self) -> Self {
        BooleanExpr::Not(Box::new(self))
    }

    pub fn call(policy: impl Into<String>) -> Self {
        BooleanExpr::CallExpr(policy.into())
    }

    pub fn match_destination(ranges: Vec<PrefixRange>) -> Self {
        BooleanExpr::MatchPrefixSet {
            prefix: PrefixExpr::DestinationNetwork,
            prefix_set: PrefixSetExpr::Explicit(ranges),
        }
    }

    pub fn match_route_filter(name: impl Into<String>) -> Self {
        BooleanExpr::MatchPrefixSet {
            prefix: PrefixExpr::DestinationNetwork,
            prefix_set: PrefixSetExpr::Named(name.into()),
        }
    }

    pub fn has_community(expr: CommunityMatchExpr) -> Self {
        BooleanExpr::MatchCommunities(CommunitySetMatchExpr::Has(expr))
    }

    pub fn match_protocol<S: Into<String>>(protocols: impl IntoIterator<Item = S>) -> Self {
        BooleanExpr::MatchProtocol(protocols.into_iter().map(Into::into).collect())
    }

    /// Short name used in debug logs.
    pub fn kind(&self) -> &'static str {
        match self {
            BooleanExpr::True => "True",
            BooleanExpr::False => "False",
            BooleanExpr::CallExprContext => "CallExprContext",
            BooleanExpr::CallStatementContext => "CallStatementContext",
            BooleanExpr::Conjunction(_) => "Conjunction",
            BooleanExpr::Disjunction(_) => "Disjunction",
            BooleanExpr::Not(_) => "Not",
            BooleanExpr::ConjunctionChain(_) => "ConjunctionChain",
            BooleanExpr::FirstMatchChain(_) => "FirstMatchChain",
            BooleanExpr::CallExpr(_) => "CallExpr",
            BooleanExpr::MatchPrefixSet { .. } => "MatchPrefixSet",
            BooleanExpr::MatchCommunities(_) => "MatchCommunities",
            BooleanExpr::MatchAsPath(_) => "MatchAsPath",
            BooleanExpr::MatchTag(_) => "MatchTag",
            BooleanExpr::MatchMetric(_) => "MatchMetric",
            BooleanExpr::MatchLocalPreference(_) => "MatchLocalPreference",
            BooleanExpr::MatchTunnelEncapsulation(_) => "MatchTunnelEncapsulation",
            BooleanExpr::MatchProtocol(_) => "MatchProtocol",
        }
    }
}

/// Statements without operands.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StaticStatement {
    ExitAccept,
    ExitReject,
    ReturnTrue,
    ReturnFalse,
    /// Return without a value.
    Return,
    ReturnLocalDefaultAction,
    /// Exit with the current default action.
    DefaultAction,
    SetDefaultActionAccept,
    SetDefaultActionReject,
    SetLocalDefaultActionAccept,
    SetLocalDefaultActionReject,
    /// Leave the current policy and continue with the next one of a chain.
    FallThrough,
    Suppress,
    Unsuppress,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Statement {
    Static(StaticStatement),
    If {
        guard: BooleanExpr,
        true_statements: Vec<Statement>,
        false_statements: Vec<Statement>,
    },
    CallStatement(String),
    /// The inner write is held back until the end of the policy body.
    Buffered(Box<Statement>),
    /// Annotation for explanations; semantically transparent.
    Traceable {
        element: String,
        statements: Vec<Statement>,
    },
    SetDefaultPolicy(String),
    SetLocalPreference(LongExpr),
    SetMetric(LongExpr),
    SetTag(LongExpr),
    SetAdministrativeCost(LongExpr),
    SetNextHop(NextHopExpr),
    SetCommunities(CommunitySetExpr),
    /// `None` removes the attribute.
    SetTunnelEncapsulation(Option<TunnelEncapsulation>),
    /// Not modelled.
    PrependAsPath(Vec<u32>),
    /// Not modelled.
    SetOrigin(String),
}

// Constructors
impl Statement {
    pub fn if_then(guard: BooleanExpr, true_statements: Vec<Statement>) -> Self {
        Statement::If {
            guard,
            true_statements,
            false_statements: vec![],
        }
    }

    pub fn if_then_else(
        guard: BooleanExpr,
        true_statements: Vec<Statement>,
        false_statements: Vec<Statement>,
    ) -> Self {
        Statement::If {
            guard,
            true_statements,
            false_statements,
        }
    }

    pub fn call(policy: impl Into<String>) -> Self {
        Statement::CallStatement(policy.into())
    }

    pub fn buffered(statement: Statement) -> Self {
        Statement::Buffered(Box::new(statement))
    }

    pub fn traceable(element: impl Into<String>, statements: Vec<Statement>) -> Self {
        Statement::Traceable {
            element: element.into(),
            statements,
        }
    }

    pub fn accept() -> Self {
        Statement::Static(StaticStatement::ExitAccept)
    }

    pub fn reject() -> Self {
        Statement::Static(StaticStatement::ExitReject)
    }

    pub fn return_true() -> Self {
        Statement::Static(StaticStatement::ReturnTrue)
    }

    pub fn return_false() -> Self {
        Statement::Static(StaticStatement::ReturnFalse)
    }

    pub fn set_local_preference(value: u64) -> Self {
        Statement::SetLocalPreference(LongExpr::Literal(value))
    }

    pub fn set_metric(value: u64) -> Self {
        Statement::SetMetric(LongExpr::Literal(value))
    }

    pub fn set_tag(value: u64) -> Self {
        Statement::SetTag(LongExpr::Literal(value))
    }

    /// Short name used in debug logs.
    pub fn kind(&self) -> String {
        match self {
            Statement::Static(s) => format!("{:?}", s),
            Statement::If { .. } => "If".to_string(),
            Statement::CallStatement(name) => format!("Call({})", name),
            Statement::Buffered(_) => "Buffered".to_string(),
            Statement::Traceable { element, .. } => format!("Traceable({})", element),
            Statement::SetDefaultPolicy(name) => format!("SetDefaultPolicy({})", name),
            Statement::SetLocalPreference(_) => "SetLocalPreference".to_string(),
            Statement::SetMetric(_) => "SetMetric".to_string(),
            Statement::SetTag(_) => "SetTag".to_string(),
            Statement::SetAdministrativeCost(_) => "SetAdministrativeCost".to_string(),
            Statement::SetNextHop(_) => "SetNextHop".to_string(),
            Statement::SetCommunities(_) => "SetCommunities".to_string(),
            Statement::SetTunnelEncapsulation(_) => "SetTunnelEncapsulation".to_string(),
            Statement::PrependAsPath(_) => "PrependAsPath".to_string(),
            Statement::SetOrigin(_) => "SetOrigin".to_string(),
        }
    }
}
