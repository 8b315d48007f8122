//! The immutable context of the interpreter.

use crate::error::{Error, Result};
use crate::settings::ExplorationMode;

/// How the policy being interpreted was entered.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CallContext {
    TopLevel,
    /// Called from a boolean expression.
    ExprCall,
    /// Called from a call statement.
    StmtCall,
}

/// The enclosing short-circuiting construct, if any.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ChainContext {
    None,
    Conjunction,
    Disjunction,
    ConjunctionChain,
    FirstMatchChain,
}

impl ChainContext {
    /// Inside a policy chain, where fall-through has a meaning.
    pub fn is_policy_chain(self) -> bool {
        matches!(self, ChainContext::ConjunctionChain | ChainContext::FirstMatchChain)
    }
}

/// Context passed down the recursive descent. Every modifier returns a new value.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TransferParam {
    pub call_context: CallContext,
    pub chain_context: ChainContext,
    /// Policy invoked at the end of a chain.
    pub default_policy: Option<String>,
    /// Guards read the route as updated so far rather than the input route.
    pub use_output_attributes: bool,
    pub mode: ExplorationMode,
    /// Policies currently being interpreted, outermost first.
    scope: Vec<String>,
    indent: usize,
}

impl TransferParam {
    pub fn new(use_output_attributes: bool) -> Self {
        TransferParam {
            call_context: CallContext::TopLevel,
            chain_context: ChainContext::None,
            default_policy: None,
            use_output_attributes,
            mode: ExplorationMode::Merged,
            scope: Vec::new(),
            indent: 0,
        }
    }

    pub fn with_call_context(&self, call_context: CallContext) -> Self {
        TransferParam {
            call_context,
            ..self.clone()
        }
    }

    pub fn with_chain_context(&self, chain_context: ChainContext) -> Self {
        TransferParam {
            chain_context,
            ..self.clone()
        }
    }

    pub fn with_mode(&self, mode: ExplorationMode) -> Self {
        TransferParam {
            mode,
            ..self.clone()
        }
    }

    pub fn with_default_policy(&self, default_policy: Option<String>) -> Self {
        TransferParam {
            default_policy,
            ..self.clone()
        }
    }

    /// Enter the body of policy `name`.
    pub fn enter_scope(&self, name: &str) -> Result<Self> {
        if self.scope.iter().any(|s| s == name) {
            return Err(Error::RecursiveCall(name.to_string()));
        }
        let mut scope = self.scope.clone();
        scope.push(name.to_string());
        Ok(TransferParam {
            scope,
            indent: self.indent + 1,
            ..self.clone()
        })
    }

    pub fn indented(&self) -> Self {
        TransferParam {
            indent: self.indent + 1,
            ..self.clone()
        }
    }

    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    pub fn is_top_level(&self) -> bool {
        self.call_context == CallContext::TopLevel
    }

    /// Prefix for debug output at the current depth.
    pub fn pad(&self) -> String {
        "  ".repeat(self.indent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_scope() {
        let p = TransferParam::new(false);
        let p = p.enter_scope("a").unwrap();
        let p = p.enter_scope("b").unwrap();
        assert_eq!(p.scope(), ["a".to_string(), "b".to_string()]);
        assert_eq!(p.pad(), "    ");
        assert!(matches!(p.enter_scope("a"), Err(Error::RecursiveCall(name)) if name == "a"));
    }

    #[test]
    fn test_modifiers_do_not_mutate() {
        let p = TransferParam::new(true);
        let q = p
            .with_call_context(CallContext::ExprCall)
            .with_chain_context(ChainContext::FirstMatchChain)
            .with_default_policy(Some("d".to_string()));
        assert!(p.is_top_level());
        assert!(!q.is_top_level());
        assert!(q.chain_context.is_policy_chain());
        assert!(!ChainContext::Conjunction.is_policy_chain());
        assert_eq!(p.default_policy, None);
        assert!(q.use_output_attributes);
    }
}
