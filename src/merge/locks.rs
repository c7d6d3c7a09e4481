use crate::diagnostics::{Diagnostics, Recovery};
use crate::fields::{ENTITY_PREFIX, FieldPath, META_PREFIX};
use indexmap::{IndexMap, IndexSet};

const BLOCKS_SEGMENT: &str = "blocks";

/// A block position relative to a field: `blocks/1/blocks/0` is `[1, 0]`.
pub type BlockLock = Vec<usize>;

/// The locked paths of one submission, sorted by what they protect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LockedPaths {
    blocks: IndexMap<String, Vec<BlockLock>>,
    fields: IndexSet<String>,
    meta: IndexSet<String>,
}

impl LockedPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses lock strings such as `entity/post_content/blocks/1`, `entity/post_title` or
    /// `meta/subtitle`. Strings that fit none of these are recorded and ignored.
    pub fn parse<S: AsRef<str>>(paths: &[S], diagnostics: &mut Diagnostics) -> Self {
        let mut locks = Self::new();
        for path in paths {
            let path = path.as_ref();
            if !locks.insert(path) {
                diagnostics.record(Recovery::InvalidLockPath, format!("ignoring lock '{}'", path));
            }
        }
        locks
    }

    /// Adds one lock string. Returns false if it is not a valid lock path.
    pub fn insert(&mut self, path: &str) -> bool {
        match FieldPath::parse(path) {
            Some(FieldPath::Meta(key)) => {
                self.meta.insert(key.to_string());
                true
            }
            Some(FieldPath::Entity(rest)) => match rest.split_once('/') {
                None => {
                    self.fields.insert(rest.to_string());
                    true
                }
                Some((field, block_path)) => match parse_block_path(block_path) {
                    Some(lock) if !field.is_empty() => {
                        self.blocks
                            .entry(format!("{}/{}", ENTITY_PREFIX, field))
                            .or_default()
                            .push(lock);
                        true
                    }
                    _ => false,
                },
            },
            None => false,
        }
    }

    /// Block locks for a qualified field such as `entity/post_content`.
    pub fn block_locks(&self, field: &str) -> &[BlockLock] {
        self.blocks.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the whole entity field `name` (without the `entity/` prefix) is locked.
    pub fn is_field_locked(&self, name: &str) -> bool {
        self.fields.contains(name)
    }

    pub fn locked_fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    pub fn is_meta_locked(&self, key: &str) -> bool {
        self.meta.contains(key)
    }

    pub fn meta_keys(&self) -> impl Iterator<Item = &str> {
        self.meta.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.fields.is_empty() && self.meta.is_empty()
    }

    /// Renders every lock back into its string form.
    pub fn to_strings(&self) -> Vec<String> {
        let blocks = self.blocks.iter().flat_map(|(field, locks)| {
            locks.iter().map(move |lock| format!("{}/{}", field, render_block_path(lock)))
        });
        let meta = self.meta.iter().map(|key| format!("{}/{}", META_PREFIX, key));
        let fields = self.fields.iter().map(|name| format!("{}/{}", ENTITY_PREFIX, name));
        fields.chain(blocks).chain(meta).collect()
    }
}

/// Parses `blocks/<i>[/blocks/<j>...]` into its index chain.
pub fn parse_block_path(path: &str) -> Option<BlockLock> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.is_empty() || segments.len() % 2 != 0 {
        return None;
    }
    segments
        .chunks(2)
        .map(|pair| match pair {
            [BLOCKS_SEGMENT, index] => index.parse::<usize>().ok(),
            _ => None,
        })
        .collect()
}

pub fn render_block_path(lock: &[usize]) -> String {
    itertools::join(lock.iter().map(|index| format!("{}/{}", BLOCKS_SEGMENT, index)), "/")
}
