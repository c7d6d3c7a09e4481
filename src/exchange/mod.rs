//! The exchange representation sent to and received from translators.
//!
//! An [`ExchangeDocument`] is an ordered list of fields. A field holds either plain text or a
//! tree of [`ExchangeNode`]s mirroring the block tree: literal chunks and child nodes in document
//! order, plus the translatable attribute strings of the block and a capsule with its full
//! attribute map.

pub mod capsule;
mod decoder;
mod encoder;
mod xml;

pub use capsule::{decode_capsule, encode_capsule};
pub use decoder::Decoder;
pub use encoder::{Encoder, is_numeric};
pub use xml::{ATTRIBUTE_ELEMENT, CHUNK_ELEMENT, FIELD_ELEMENT, NODE_ELEMENT, ROOT_ELEMENT};

use crate::codec::DEFAULT_MAX_DEPTH;
use crate::error::ExchangeError;
use md5::{Digest, Md5};

/// Hex md5 of `text`, used to fingerprint every exchanged string.
pub fn content_hash(text: &str) -> String {
    format!("{:x}", Md5::digest(text.as_bytes()))
}

/// A literal run of block content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeText {
    pub text: String,
    pub hash: String,
}

impl ExchangeText {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            hash: content_hash(text),
        }
    }
}

/// A translatable attribute string addressed by its flattened path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockAttribute {
    pub path: String,
    pub text: String,
    pub hash: String,
}

impl BlockAttribute {
    pub fn new(path: &str, text: &str) -> Self {
        Self {
            path: path.to_string(),
            text: text.to_string(),
            hash: content_hash(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentItem {
    Chunk(ExchangeText),
    Node(ExchangeNode),
}

/// One block in exchange form. An empty `block_name` marks a freeform run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExchangeNode {
    pub block_name: String,
    pub original_attributes: String,
    pub content: Vec<ContentItem>,
    pub block_attributes: Vec<BlockAttribute>,
}

impl ExchangeNode {
    pub fn chunks(&self) -> impl Iterator<Item = &ExchangeText> {
        self.content.iter().filter_map(|item| match item {
            ContentItem::Chunk(chunk) => Some(chunk),
            ContentItem::Node(_) => None,
        })
    }

    pub fn children(&self) -> impl Iterator<Item = &ExchangeNode> {
        self.content.iter().filter_map(|item| match item {
            ContentItem::Node(node) => Some(node),
            ContentItem::Chunk(_) => None,
        })
    }

    pub fn attribute(&self, path: &str) -> Option<&BlockAttribute> {
        self.block_attributes.iter().find(|attr| attr.path == path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldContent {
    Text(String),
    Blocks(Vec<ExchangeNode>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeField {
    pub name: String,
    pub content: FieldContent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExchangeDocument {
    pub fields: Vec<ExchangeField>,
}

impl ExchangeDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&mut self, name: &str, text: &str) {
        self.fields.push(ExchangeField {
            name: name.to_string(),
            content: FieldContent::Text(text.to_string()),
        });
    }

    pub fn push_blocks(&mut self, name: &str, nodes: Vec<ExchangeNode>) {
        self.fields.push(ExchangeField {
            name: name.to_string(),
            content: FieldContent::Blocks(nodes),
        });
    }

    pub fn field(&self, name: &str) -> Option<&ExchangeField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut ExchangeField> {
        self.fields.iter_mut().find(|field| field.name == name)
    }

    pub fn to_xml(&self) -> Result<String, ExchangeError> {
        xml::write_document(self)
    }

    /// Parses a document with the default nesting limit.
    pub fn from_xml(input: &str) -> Result<Self, ExchangeError> {
        xml::read_document(input, DEFAULT_MAX_DEPTH)
    }

    pub fn from_xml_with_depth(input: &str, max_depth: usize) -> Result<Self, ExchangeError> {
        xml::read_document(input, max_depth)
    }
}
