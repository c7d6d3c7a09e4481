//! Registry of attribute replacers and the rules that select them.

mod builtin;

pub use builtin::{CopyReplacer, ExcludeReplacer, RELATED_PREFIX, RelatedReplacer};

use crate::context::SubmissionContext;
use crate::error::ConfigError;
use crate::fields::compile_pattern;
use ahash::AHashMap;
use builtin::register_default_replacers;
use regex::Regex;
use serde_json::Value;

/// Outcome of running a replacer on import.
#[derive(Debug, Clone, PartialEq)]
pub enum Replacement {
    Value(Value),
    /// The value could not be mapped; the caller keeps the original.
    Unresolved,
}

/// Transforms one attribute value on export and/or import.
pub trait Replacer: Send + Sync {
    fn id(&self) -> &str;

    /// Whether the value is still sent for translation. Most replacers own the value instead.
    fn is_translatable(&self) -> bool {
        false
    }

    fn process_on_upload(&self, value: &Value, _ctx: &SubmissionContext) -> Value {
        value.clone()
    }

    fn process_on_download(&self, original: &Value, ctx: &SubmissionContext) -> Replacement;
}

/// Binds a replacer to the attributes whose block name and flattened path match.
#[derive(Debug, Clone)]
pub struct ReplacerRule {
    block: Regex,
    path: Regex,
    replacer_id: String,
    class_prefix: Option<String>,
}

impl ReplacerRule {
    pub fn new(block_pattern: &str, path_pattern: &str, replacer_id: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            block: compile_pattern(block_pattern)?,
            path: compile_pattern(path_pattern)?,
            replacer_id: replacer_id.to_string(),
            class_prefix: None,
        })
    }

    /// When the rule remaps a value, `<prefix><old>` in the block content becomes `<prefix><new>`.
    pub fn with_class_prefix(mut self, prefix: &str) -> Self {
        self.class_prefix = Some(prefix.to_string());
        self
    }

    pub fn matches(&self, block_name: &str, path: &str) -> bool {
        self.block.is_match(block_name) && self.path.is_match(path)
    }

    pub fn replacer_id(&self) -> &str {
        &self.replacer_id
    }

    pub fn class_prefix(&self) -> Option<&str> {
        self.class_prefix.as_deref()
    }

    pub fn describe(&self) -> String {
        format!("{} {} -> {}", self.block.as_str(), self.path.as_str(), self.replacer_id)
    }
}

/// Rules for media identifiers inside image-like blocks.
pub fn default_media_rules() -> Result<Vec<ReplacerRule>, ConfigError> {
    let attachment = format!("{}attachment", RELATED_PREFIX);
    Ok(vec![
        ReplacerRule::new("^(core/)?image$", "^id$", &attachment)?.with_class_prefix("wp-image-"),
        ReplacerRule::new("^(core/)?media-text$", "^mediaId$", &attachment)?
            .with_class_prefix("wp-image-"),
    ])
}

pub struct ReplacerRegistry {
    replacers: AHashMap<String, Box<dyn Replacer>>,
    rules: Vec<ReplacerRule>,
}

impl Default for ReplacerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplacerRegistry {
    /// Creates a registry holding the built-in `copy` and `exclude` replacers and no rules.
    pub fn new() -> Self {
        let mut replacers: AHashMap<String, Box<dyn Replacer>> = AHashMap::new();
        register_default_replacers(&mut replacers);
        Self {
            replacers,
            rules: Vec::new(),
        }
    }

    /// Registers a replacer under its own id, replacing any previous one.
    pub fn register(&mut self, replacer: Box<dyn Replacer>) {
        log::debug!("Registered replacer '{}'", replacer.id());
        self.replacers.insert(replacer.id().to_string(), replacer);
    }

    pub fn add_rule(&mut self, rule: ReplacerRule) {
        self.rules.push(rule);
    }

    pub fn has_replacer(&self, id: &str) -> bool {
        self.replacers.contains_key(id)
    }

    pub fn rules(&self) -> &[ReplacerRule] {
        &self.rules
    }

    /// The first matching rule whose replacer is registered, with that replacer.
    pub fn rule_for(&self, block_name: &str, path: &str) -> Option<(&ReplacerRule, &dyn Replacer)> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(block_name, path))
            .find_map(|rule| {
                self.replacers
                    .get(rule.replacer_id())
                    .map(|replacer| (rule, replacer.as_ref()))
            })
    }

    pub fn get_replacer(&self, block_name: &str, path: &str) -> Option<&dyn Replacer> {
        self.rule_for(block_name, path).map(|(_, replacer)| replacer)
    }

    /// Fails on the first rule that names an unregistered replacer.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.rules.iter().find(|rule| !self.has_replacer(rule.replacer_id())) {
            Some(rule) => Err(ConfigError::UnknownReplacer {
                rule: rule.describe(),
                replacer_id: rule.replacer_id().to_string(),
            }),
            None => Ok(()),
        }
    }
}
