use super::Attributes;
use serde::{Deserialize, Serialize};

/// One entry of a block's inner content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Chunk {
    /// Literal markup or text, kept verbatim.
    Text(String),
    /// The position where the next child block is rendered.
    Gap,
}

/// A node in the content tree.
///
/// A block without a name is a freeform run of text between delimited blocks. A named block
/// with an empty `inner_content` is self-closing; a paired block with an empty body holds a
/// single empty text chunk instead.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    pub name: Option<String>,
    pub attributes: Attributes,
    pub inner_content: Vec<Chunk>,
    pub inner_blocks: Vec<Block>,
}

impl Block {
    /// Creates a nameless block holding `text` verbatim.
    pub fn freeform(text: impl Into<String>) -> Self {
        Self {
            name: None,
            attributes: Attributes::new(),
            inner_content: vec![Chunk::Text(text.into())],
            inner_blocks: Vec::new(),
        }
    }

    /// Creates a named, self-closing block.
    pub fn named(name: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            name: Some(name.into()),
            attributes,
            inner_content: Vec::new(),
            inner_blocks: Vec::new(),
        }
    }

    /// Appends literal text, merging it into a trailing text chunk.
    pub fn push_text(&mut self, text: &str) {
        match self.inner_content.last_mut() {
            Some(Chunk::Text(last)) => last.push_str(text),
            _ => self.inner_content.push(Chunk::Text(text.to_string())),
        }
    }

    /// Appends a child block at the current content position.
    pub fn push_child(&mut self, child: Block) {
        self.inner_content.push(Chunk::Gap);
        self.inner_blocks.push(child);
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.push_text(text);
        self
    }

    pub fn with_child(mut self, child: Block) -> Self {
        self.push_child(child);
        self
    }

    pub fn is_freeform(&self) -> bool {
        self.name.is_none()
    }

    pub fn is_self_closing(&self) -> bool {
        self.name.is_some() && self.inner_content.is_empty()
    }

    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// The concatenated literal text of this block, without its children.
    pub fn inner_html(&self) -> String {
        self.inner_content
            .iter()
            .filter_map(|chunk| match chunk {
                Chunk::Text(text) => Some(text.as_str()),
                Chunk::Gap => None,
            })
            .collect()
    }

    /// Whether the gap markers line up with the child list, recursively.
    pub fn is_consistent(&self) -> bool {
        let gaps = self
            .inner_content
            .iter()
            .filter(|chunk| matches!(chunk, Chunk::Gap))
            .count();
        gaps == self.inner_blocks.len() && self.inner_blocks.iter().all(Block::is_consistent)
    }

    /// Depth of the subtree rooted at this block (a leaf has depth 1).
    pub fn depth(&self) -> usize {
        1 + self
            .inner_blocks
            .iter()
            .map(Block::depth)
            .max()
            .unwrap_or(0)
    }
}

/// Iterates over the named blocks of a sequence in order, with their named index.
pub fn named_blocks(blocks: &[Block]) -> impl Iterator<Item = (usize, &Block)> {
    blocks.iter().filter(|b| !b.is_freeform()).enumerate()
}
