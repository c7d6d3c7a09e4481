//! Collaborator interfaces the engine is wired to, plus in-memory implementations.

use crate::error::StoreError;
use crate::fields::EntityFields;
use ahash::AHashMap;

/// Per-submission settings handed to every engine operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionContext {
    pub source_locale: String,
    pub target_locale: String,
    pub locked_paths: Vec<String>,
    pub clean_metadata: bool,
}

impl SubmissionContext {
    pub fn new(source_locale: &str, target_locale: &str) -> Self {
        Self {
            source_locale: source_locale.to_string(),
            target_locale: target_locale.to_string(),
            ..Self::default()
        }
    }

    pub fn with_locked_path(mut self, path: &str) -> Self {
        self.locked_paths.push(path.to_string());
        self
    }

    pub fn with_locked_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locked_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn with_clean_metadata(mut self, clean: bool) -> Self {
        self.clean_metadata = clean;
        self
    }
}

/// Maps an identifier of a source-locale entity to its target-locale counterpart.
pub trait IdentifierResolver: Send + Sync {
    fn resolve(&self, entity_type: &str, source_id: &str, ctx: &SubmissionContext) -> Option<String>;
}

/// Resolver backed by a fixed `(entity type, source id) -> target id` table.
#[derive(Debug, Clone, Default)]
pub struct MapResolver {
    mappings: AHashMap<(String, String), String>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mapping(mut self, entity_type: &str, source_id: &str, target_id: &str) -> Self {
        self.insert(entity_type, source_id, target_id);
        self
    }

    pub fn insert(&mut self, entity_type: &str, source_id: &str, target_id: &str) {
        self.mappings.insert(
            (entity_type.to_string(), source_id.to_string()),
            target_id.to_string(),
        );
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl IdentifierResolver for MapResolver {
    fn resolve(&self, entity_type: &str, source_id: &str, _ctx: &SubmissionContext) -> Option<String> {
        self.mappings
            .get(&(entity_type.to_string(), source_id.to_string()))
            .cloned()
    }
}

/// Storage of CMS entities. Only caller-side glue talks to a store; the engine never does.
pub trait ContentStore {
    fn read_entity(&self, id: &str) -> Result<EntityFields, StoreError>;

    /// Writes `fields`, creating the entity when `id` is `None`. Returns the entity id.
    fn write_entity(&mut self, id: Option<&str>, fields: EntityFields) -> Result<String, StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entities: AHashMap<String, EntityFields>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, id: &str, fields: EntityFields) -> Self {
        self.entities.insert(id.to_string(), fields);
        self
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl ContentStore for MemoryStore {
    fn read_entity(&self, id: &str) -> Result<EntityFields, StoreError> {
        self.entities
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn write_entity(&mut self, id: Option<&str>, fields: EntityFields) -> Result<String, StoreError> {
        let id = match id {
            Some(id) => id.to_string(),
            None => loop {
                self.next_id += 1;
                let candidate = self.next_id.to_string();
                if !self.entities.contains_key(&candidate) {
                    break candidate;
                }
            },
        };
        self.entities.insert(id.clone(), fields);
        Ok(id)
    }
}
