//! Errors raised while compiling routing policies.

use std::fmt;

/// Kind of a named definition looked up in a [`Configuration`][crate::config::Configuration].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ReferenceKind {
    RoutingPolicy,
    RouteFilterList,
    AsPathAccessList,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::RoutingPolicy => write!(f, "routing policy"),
            ReferenceKind::RouteFilterList => write!(f, "route filter list"),
            ReferenceKind::AsPathAccessList => write!(f, "as-path access list"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A construct that has no symbolic semantics and is reachable.
    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("undefined {kind} '{name}'")]
    MalformedReference { kind: ReferenceKind, name: String },

    /// The node pool ran out of space. The pool is unusable afterwards.
    #[error("decision diagram pool exhausted (capacity {capacity} nodes)")]
    ResourceExhausted { capacity: usize },

    #[error("recursive call to routing policy '{0}'")]
    RecursiveCall(String),

    #[error("invalid analysis config: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn unsupported(what: impl Into<String>) -> Self {
        Error::Unsupported(what.into())
    }

    pub fn undefined(kind: ReferenceKind, name: impl Into<String>) -> Self {
        Error::MalformedReference {
            kind,
            name: name.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
