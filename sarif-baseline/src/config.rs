//! Baselining configuration, loadable from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MAX_REMAPPING_CANDIDATES;
use crate::error::Result;
use crate::matching::{AmbiguityPolicy, MatcherKind, StructuralKinds};

/// How results are paired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// Run the matcher chain.
    #[default]
    Full,
    /// Only ask whether each rule id occurs on the other side.
    RuleId,
}

/// Which run's property bag the log matcher keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyBagMergeBehavior {
    /// The last current run's properties.
    #[default]
    MostRecent,
    /// The first baseline run's properties, else the first current run's.
    Oldest,
}

/// Path remapping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemappingConfig {
    pub enabled: bool,
    /// Upper bound on candidates tried per unmatched result.
    pub max_candidates: usize,
}

impl Default for RemappingConfig {
    fn default() -> Self {
        RemappingConfig {
            enabled: true,
            max_candidates: DEFAULT_MAX_REMAPPING_CANDIDATES,
        }
    }
}

/// Settings for one baselining pass.
///
/// Every field has a default, so an empty file is a valid configuration:
///
/// ```toml
/// matchers = ["partial-fingerprint", "context-region"]
/// ambiguity = "defer"
///
/// [remapping]
/// max_candidates = 4
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Matchers to run, highest priority first.
    pub matchers: Vec<MatcherKind>,
    pub ambiguity: AmbiguityPolicy,
    pub remapping: RemappingConfig,
    /// Collections the structural-data matcher compares.
    pub structural_kinds: StructuralKinds,
    pub property_bag_merge: PropertyBagMergeBehavior,
    pub mode: MatchMode,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        BaselineConfig {
            matchers: MatcherKind::DEFAULT_ORDER.to_vec(),
            ambiguity: AmbiguityPolicy::default(),
            remapping: RemappingConfig::default(),
            structural_kinds: StructuralKinds::default(),
            property_bag_merge: PropertyBagMergeBehavior::default(),
            mode: MatchMode::default(),
        }
    }
}

impl BaselineConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: BaselineConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Max remapping candidates to compute, zero when remapping is off.
    pub fn remapping_budget(&self) -> usize {
        if self.remapping.enabled {
            self.remapping.max_candidates
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = BaselineConfig::from_toml_str("").unwrap();

        assert_eq!(config.matchers, MatcherKind::DEFAULT_ORDER.to_vec());
        assert_eq!(config.ambiguity, AmbiguityPolicy::FirstByInputOrder);
        assert!(config.remapping.enabled);
        assert_eq!(config.remapping_budget(), DEFAULT_MAX_REMAPPING_CANDIDATES);
        assert_eq!(config.structural_kinds, StructuralKinds::all());
        assert_eq!(config.mode, MatchMode::Full);
    }

    #[test]
    fn test_parse_full_config() {
        let config = BaselineConfig::from_toml_str(
            r#"
            matchers = ["partial-fingerprint", "context-region"]
            ambiguity = "defer"
            structural_kinds = "STACKS | CODE_FLOWS"
            property_bag_merge = "oldest"
            mode = "rule-id"

            [remapping]
            enabled = false
            max_candidates = 3
            "#,
        )
        .unwrap();

        assert_eq!(
            config.matchers,
            vec![MatcherKind::PartialFingerprint, MatcherKind::ContextRegion]
        );
        assert_eq!(config.ambiguity, AmbiguityPolicy::Defer);
        assert_eq!(
            config.structural_kinds,
            StructuralKinds::STACKS | StructuralKinds::CODE_FLOWS
        );
        assert_eq!(config.property_bag_merge, PropertyBagMergeBehavior::Oldest);
        assert_eq!(config.mode, MatchMode::RuleId);
        assert_eq!(config.remapping_budget(), 0);
    }

    #[test]
    fn test_unknown_matcher_rejected() {
        let err = BaselineConfig::from_toml_str(r#"matchers = ["fuzzy"]"#).unwrap_err();
        assert!(matches!(err, crate::error::Error::Config(_)));
    }
}
