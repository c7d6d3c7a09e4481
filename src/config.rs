//! Engine configuration, loadable from JSON.

use crate::codec::DEFAULT_MAX_DEPTH;
use crate::error::ConfigError;
use crate::fields::PatternFilter;
use crate::replacer::ReplacerRule;
use serde::{Deserialize, Serialize};
use std::fs;

/// Attribute paths that describe presentation rather than content.
pub const DEFAULT_SKIP_ATTRIBUTE_PATTERNS: &[&str] =
    &["^type$", "^providerNameSlug$", "^align$", "^className$"];

/// Entity fields and metadata keys that are bookkeeping, never translated.
pub const DEFAULT_SKIP_FIELD_PATTERNS: &[&str] = &[
    "^entity/(ID|guid|post_author|post_date|post_date_gmt|post_modified|post_modified_gmt|post_status|post_type|post_parent|post_mime_type|menu_order|comment_status|ping_status|comment_count)$",
    "^meta/_edit_(lock|last)$",
    "^meta/_wp_old_(slug|date)$",
];

/// A replacer rule as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub block: String,
    pub path: String,
    pub replacer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_prefix: Option<String>,
}

impl RuleConfig {
    pub fn to_rule(&self) -> Result<ReplacerRule, ConfigError> {
        let rule = ReplacerRule::new(&self.block, &self.path, &self.replacer)?;
        Ok(match &self.class_prefix {
            Some(prefix) => rule.with_class_prefix(prefix),
            None => rule,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deepest block nesting accepted by the codec and the exchange reader.
    pub max_depth: usize,
    pub skip_attribute_patterns: Vec<String>,
    pub skip_field_patterns: Vec<String>,
    pub rules: Vec<RuleConfig>,
    /// Adds the built-in media identifier rules when a resolver is available.
    pub media_rules: bool,
    pub clean_metadata_on_download: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            skip_attribute_patterns: to_strings(DEFAULT_SKIP_ATTRIBUTE_PATTERNS),
            skip_field_patterns: to_strings(DEFAULT_SKIP_FIELD_PATTERNS),
            rules: Vec::new(),
            media_rules: true,
            clean_metadata_on_download: false,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    pub fn skip_attribute_filter(&self) -> Result<PatternFilter, ConfigError> {
        PatternFilter::from_patterns(&self.skip_attribute_patterns)
    }

    pub fn skip_field_filter(&self) -> Result<PatternFilter, ConfigError> {
        PatternFilter::from_patterns(&self.skip_field_patterns)
    }

    pub fn replacer_rules(&self) -> Result<Vec<ReplacerRule>, ConfigError> {
        self.rules.iter().map(RuleConfig::to_rule).collect()
    }
}

fn to_strings(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| p.to_string()).collect()
}
