//! Flattening of nested attribute values into `/`-separated string leaves.
//!
//! A flattened set remembers the JSON type of every leaf and the kind of every container it
//! passed through, so [`unflatten`] restores exactly what [`flatten`] consumed, including empty
//! containers, one-element lists and mappings whose keys look like numbers.

use crate::block::{Attributes, value_kind};
use ahash::AHashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const PATH_SEPARATOR: char = '/';

/// JSON type of a flattened leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeafKind {
    String,
    Number,
    Bool,
    Null,
    EmptyList,
    EmptyMap,
}

impl LeafKind {
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::String(_) => Some(LeafKind::String),
            Value::Number(_) => Some(LeafKind::Number),
            Value::Bool(_) => Some(LeafKind::Bool),
            Value::Null => Some(LeafKind::Null),
            Value::Array(items) if items.is_empty() => Some(LeafKind::EmptyList),
            Value::Object(map) if map.is_empty() => Some(LeafKind::EmptyMap),
            _ => None,
        }
    }

    /// Reads `text` back as a value of this kind, or `None` if it does not fit.
    pub fn parse(self, text: &str) -> Option<Value> {
        match self {
            LeafKind::String => Some(Value::String(text.to_string())),
            LeafKind::Number => match serde_json::from_str::<Value>(text.trim()) {
                Ok(number @ Value::Number(_)) => Some(number),
                _ => None,
            },
            LeafKind::Bool => match text.trim() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" | "" => Some(Value::Bool(false)),
                _ => None,
            },
            LeafKind::Null => text.is_empty().then_some(Value::Null),
            LeafKind::EmptyList => text.is_empty().then(|| Value::Array(Vec::new())),
            LeafKind::EmptyMap => text.is_empty().then(|| Value::Object(Map::new())),
        }
    }
}

/// The string form and type of one flattened leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatLeaf {
    pub value: String,
    pub kind: LeafKind,
}

impl FlatLeaf {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: LeafKind::String,
        }
    }

    /// The typed value of this leaf. Text that no longer fits its kind stays a string.
    pub fn to_value(&self) -> Value {
        self.kind
            .parse(&self.value)
            .unwrap_or_else(|| Value::String(self.value.clone()))
    }

    fn from_scalar(value: &Value) -> Option<Self> {
        let kind = LeafKind::of(value)?;
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => String::new(),
        };
        Some(Self { value: text, kind })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    List,
    Map,
}

/// An ordered set of flattened leaves plus the container shapes they came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatAttributes {
    leaves: IndexMap<String, FlatLeaf>,
    shapes: AHashMap<String, Shape>,
}

impl FlatAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a shape-less set of string leaves from externally supplied paths.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let leaves = pairs
            .into_iter()
            .map(|(path, value)| (path.into(), FlatLeaf::string(value)))
            .collect();
        Self {
            leaves,
            shapes: AHashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&FlatLeaf> {
        self.leaves.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.leaves.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlatLeaf)> {
        self.leaves.iter().map(|(path, leaf)| (path.as_str(), leaf))
    }

    /// Leaves holding a string, in document order.
    pub fn strings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter()
            .filter(|(_, leaf)| leaf.kind == LeafKind::String)
            .map(|(path, leaf)| (path, leaf.value.as_str()))
    }

    pub fn shape(&self, path: &str) -> Option<Shape> {
        self.shapes.get(path).copied()
    }

    /// Overwrites the text of an existing leaf, keeping its kind.
    pub fn set_text(&mut self, path: &str, text: impl Into<String>) -> bool {
        match self.leaves.get_mut(path) {
            Some(leaf) => {
                leaf.value = text.into();
                true
            }
            None => false,
        }
    }

    /// Replaces the leaf at `path` with `value`, splicing in nested leaves for containers.
    pub fn set_value(&mut self, path: &str, value: &Value) {
        if let Some(leaf) = FlatLeaf::from_scalar(value) {
            match self.leaves.get_mut(path) {
                Some(existing) => *existing = leaf,
                None => {
                    self.leaves.insert(path.to_string(), leaf);
                }
            }
            return;
        }

        let position = self
            .leaves
            .shift_remove_full(path)
            .map(|(index, _, _)| index)
            .unwrap_or(self.leaves.len());
        let nested = flatten(value, path);
        for (offset, (nested_path, leaf)) in nested.leaves.into_iter().enumerate() {
            self.leaves.shift_insert(position + offset, nested_path, leaf);
        }
        self.shapes.extend(nested.shapes);
    }

    pub fn insert(&mut self, path: impl Into<String>, leaf: FlatLeaf) {
        self.leaves.insert(path.into(), leaf);
    }
}

/// Segment standing for the empty mapping key, which would otherwise vanish from a path.
const EMPTY_KEY_SEGMENT: &str = "~2";

/// Escapes a mapping key so it can be used as a single path segment.
pub fn escape_segment(key: &str) -> String {
    if key.is_empty() {
        return EMPTY_KEY_SEGMENT.to_string();
    }
    key.replace('~', "~0").replace(PATH_SEPARATOR, "~1")
}

pub fn unescape_segment(segment: &str) -> String {
    if segment == EMPTY_KEY_SEGMENT {
        return String::new();
    }
    segment.replace("~1", "/").replace("~0", "~")
}

pub fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}{}{}", prefix, PATH_SEPARATOR, segment)
    }
}

/// Flattens `value` into leaves whose paths start with `prefix`.
pub fn flatten(value: &Value, prefix: &str) -> FlatAttributes {
    let mut flat = FlatAttributes::new();
    flatten_into(value, prefix, &mut flat);
    flat
}

/// Flattens a block attribute map with bare (unprefixed) paths.
pub fn flatten_attributes(attributes: &Attributes) -> FlatAttributes {
    let mut flat = FlatAttributes::new();
    flat.shapes.insert(String::new(), Shape::Map);
    for (key, value) in attributes {
        flatten_into(value, &escape_segment(key), &mut flat);
    }
    flat
}

/// Rebuilds a block attribute map. A non-mapping result yields an empty map.
pub fn unflatten_attributes(flat: &FlatAttributes) -> Attributes {
    match unflatten(flat) {
        Value::Object(map) => map,
        Value::Null => Attributes::new(),
        other => {
            log::warn!("Flattened attributes rebuilt to a {}, not a mapping", value_kind(&other));
            Attributes::new()
        }
    }
}

fn flatten_into(value: &Value, path: &str, flat: &mut FlatAttributes) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            flat.shapes.insert(path.to_string(), Shape::Map);
            for (key, child) in map {
                flatten_into(child, &join_path(path, &escape_segment(key)), flat);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            flat.shapes.insert(path.to_string(), Shape::List);
            for (index, child) in items.iter().enumerate() {
                flatten_into(child, &join_path(path, &index.to_string()), flat);
            }
        }
        scalar => {
            if let Some(leaf) = FlatLeaf::from_scalar(scalar) {
                flat.leaves.insert(path.to_string(), leaf);
            }
        }
    }
}

/// Rebuilds the nested value described by `flat`.
///
/// A group without a recorded shape becomes a list only when its keys are exactly `0..n`;
/// any other key makes it a mapping. When a path is both a leaf and a container prefix, the
/// container wins.
pub fn unflatten(flat: &FlatAttributes) -> Value {
    let items: Vec<(Vec<String>, &FlatLeaf)> = flat
        .leaves
        .iter()
        .map(|(path, leaf)| (split_path(path), leaf))
        .collect();
    let refs: Vec<(&[String], &FlatLeaf)> = items
        .iter()
        .map(|(segments, leaf)| (segments.as_slice(), *leaf))
        .collect();
    build(flat, "", refs)
}

fn split_path(path: &str) -> Vec<String> {
    if path.is_empty() {
        return Vec::new();
    }
    path.split(PATH_SEPARATOR).map(unescape_segment).collect()
}

fn build(flat: &FlatAttributes, path: &str, items: Vec<(&[String], &FlatLeaf)>) -> Value {
    let mut leaf_here = None;
    let mut groups: IndexMap<&str, Vec<(&[String], &FlatLeaf)>> = IndexMap::new();
    for (segments, leaf) in items {
        match segments.split_first() {
            None => leaf_here = leaf_here.or(Some(leaf)),
            Some((head, rest)) => groups.entry(head.as_str()).or_default().push((rest, leaf)),
        }
    }

    if groups.is_empty() {
        return leaf_here.map(FlatLeaf::to_value).unwrap_or(Value::Null);
    }
    if leaf_here.is_some() {
        log::debug!("Path '{}' is both a leaf and a container; keeping the container", path);
    }

    let as_list = match flat.shape(path) {
        Some(Shape::List) => groups.keys().all(|key| key.parse::<usize>().is_ok()),
        Some(Shape::Map) => false,
        None => is_index_sequence(groups.keys().copied()),
    };

    if as_list {
        let mut indexed: Vec<(usize, Value)> = groups
            .into_iter()
            .map(|(key, group)| {
                let child_path = join_path(path, key);
                (key.parse::<usize>().unwrap_or(usize::MAX), build(flat, &child_path, group))
            })
            .collect();
        indexed.sort_by_key(|(index, _)| *index);
        Value::Array(indexed.into_iter().map(|(_, value)| value).collect())
    } else {
        let map: Map<String, Value> = groups
            .into_iter()
            .map(|(key, group)| {
                let child_path = join_path(path, &escape_segment(key));
                (key.to_string(), build(flat, &child_path, group))
            })
            .collect();
        Value::Object(map)
    }
}

/// Whether the keys are the canonical decimal indices `0..n`, in any order.
fn is_index_sequence<'a>(keys: impl Iterator<Item = &'a str>) -> bool {
    let mut seen = Vec::new();
    for key in keys {
        let canonical = key == "0" || (!key.starts_with('0') && key.bytes().all(|b| b.is_ascii_digit()));
        if key.is_empty() || !canonical {
            return false;
        }
        match key.parse::<usize>() {
            Ok(index) => seen.push(index),
            Err(_) => return false,
        }
    }
    seen.sort_unstable();
    seen.iter().enumerate().all(|(position, index)| position == *index)
}
