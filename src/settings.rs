//! Analysis settings.

use crate::error::{Error, Result};

/// How the interpreter treats control-flow branches.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum ExplorationMode {
    /// Merge both sides of every `If` into a single symbolic state.
    #[default]
    Merged,
    /// Keep a separate state per feasible control-flow path.
    Paths,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AnalysisConfig {
    /// The node pool holds `2^storage_bits` nodes.
    pub storage_bits: usize,
    /// Match guards against the route as updated so far rather than the input route.
    pub use_output_attributes: bool,
    pub mode: ExplorationMode,
    /// Community strings tracked in addition to those found in the policies.
    pub extra_community_values: Vec<String>,
    /// AS-path regexes tracked in addition to those found in the policies.
    pub extra_as_path_regexes: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            storage_bits: 20,
            use_output_attributes: false,
            mode: ExplorationMode::Merged,
            extra_community_values: Vec::new(),
            extra_as_path_regexes: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    pub fn with_storage_bits(mut self, storage_bits: usize) -> Self {
        self.storage_bits = storage_bits;
        self
    }

    pub fn with_output_attributes(mut self, use_output_attributes: bool) -> Self {
        self.use_output_attributes = use_output_attributes;
        self
    }

    pub fn with_mode(mut self, mode: ExplorationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_community_value(mut self, value: impl Into<String>) -> Self {
        self.extra_community_values.push(value.into());
        self
    }

    pub fn with_as_path_regex(mut self, regex: impl Into<String>) -> Self {
        self.extra_as_path_regexes.push(regex.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage_bits < 4 || self.storage_bits > 31 {
            return Err(Error::InvalidConfig(format!(
                "storage_bits must be within 4..=31, got {}",
                self.storage_bits
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_validate() {
        assert!(AnalysisConfig::default().validate().is_ok());
        assert!(matches!(
            AnalysisConfig::default().with_storage_bits(40).validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(AnalysisConfig::default().with_storage_bits(2).validate().is_err());
    }
}
