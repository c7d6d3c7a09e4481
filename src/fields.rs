//! Entity field maps and the pattern filters applied to them.

use crate::block::{Block, named_blocks};
use crate::error::ConfigError;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;

pub const ENTITY_PREFIX: &str = "entity";
pub const META_PREFIX: &str = "meta";

/// The translatable surface of one CMS entity: its own fields plus its metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityFields {
    #[serde(default)]
    pub entity: IndexMap<String, String>,
    #[serde(default)]
    pub meta: IndexMap<String, String>,
}

/// A qualified field address such as `entity/post_content` or `meta/subtitle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPath<'a> {
    Entity(&'a str),
    Meta(&'a str),
}

impl<'a> FieldPath<'a> {
    pub fn parse(path: &'a str) -> Option<Self> {
        let (prefix, name) = path.split_once('/')?;
        if name.is_empty() {
            return None;
        }
        match prefix {
            ENTITY_PREFIX => Some(FieldPath::Entity(name)),
            META_PREFIX => Some(FieldPath::Meta(name)),
            _ => None,
        }
    }

    pub fn qualified(&self) -> String {
        match self {
            FieldPath::Entity(name) => format!("{}/{}", ENTITY_PREFIX, name),
            FieldPath::Meta(name) => format!("{}/{}", META_PREFIX, name),
        }
    }
}

impl EntityFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, name: &str, value: &str) -> Self {
        self.entity.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_meta(mut self, key: &str, value: &str) -> Self {
        self.meta.insert(key.to_string(), value.to_string());
        self
    }

    /// Load entity fields from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let fields = serde_json::from_str(&content)?;
        Ok(fields)
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        match FieldPath::parse(path)? {
            FieldPath::Entity(name) => self.entity.get(name).map(String::as_str),
            FieldPath::Meta(key) => self.meta.get(key).map(String::as_str),
        }
    }

    /// Sets a field by its qualified path. Returns false for an unknown prefix.
    pub fn set(&mut self, path: &str, value: impl Into<String>) -> bool {
        match FieldPath::parse(path) {
            Some(FieldPath::Entity(name)) => {
                self.entity.insert(name.to_string(), value.into());
                true
            }
            Some(FieldPath::Meta(key)) => {
                self.meta.insert(key.to_string(), value.into());
                true
            }
            None => false,
        }
    }

    /// All fields with their qualified paths, entity fields first.
    pub fn iter(&self) -> impl Iterator<Item = (String, &str)> {
        let entity = self
            .entity
            .iter()
            .map(|(name, value)| (FieldPath::Entity(name).qualified(), value.as_str()));
        let meta = self
            .meta
            .iter()
            .map(|(key, value)| (FieldPath::Meta(key).qualified(), value.as_str()));
        entity.chain(meta)
    }

    pub fn len(&self) -> usize {
        self.entity.len() + self.meta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entity.is_empty() && self.meta.is_empty()
    }
}

/// A list of regular expressions; a string is filtered when any of them matches.
#[derive(Debug, Clone, Default)]
pub struct PatternFilter {
    patterns: Vec<Regex>,
}

impl PatternFilter {
    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|pattern| compile_pattern(pattern.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(candidate))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Lists the lockable block paths of a parsed field, e.g. `entity/post_content/blocks/0`.
///
/// Indices count named blocks only, at every level. Freeform runs are skipped even at the top
/// level, where a plain listing of parsed entries would number them, so every path listed here
/// is one that lock merging resolves to the same block.
pub fn content_block_paths(field: &str, blocks: &[Block]) -> Vec<(String, String)> {
    let mut paths = Vec::new();
    collect_block_paths(field, blocks, &mut paths);
    paths
}

fn collect_block_paths(prefix: &str, blocks: &[Block], out: &mut Vec<(String, String)>) {
    for (index, block) in named_blocks(blocks) {
        let path = format!("{}/blocks/{}", prefix, index);
        out.push((path.clone(), block.name_or_empty().to_string()));
        collect_block_paths(&path, &block.inner_blocks, out);
    }
}
