use super::{BlockAttribute, ContentItem, ExchangeNode, ExchangeText, encode_capsule};
use crate::block::{Block, Chunk};
use crate::context::SubmissionContext;
use crate::fields::PatternFilter;
use crate::flatten::flatten_attributes;
use crate::replacer::ReplacerRegistry;
use serde_json::Value;

/// Whether `text` is a plain number, which is never worth translating.
pub fn is_numeric(text: &str) -> bool {
    text.trim().parse::<f64>().is_ok_and(f64::is_finite)
}

/// Turns block trees into exchange nodes.
pub struct Encoder<'a> {
    registry: &'a ReplacerRegistry,
    skip: &'a PatternFilter,
    ctx: &'a SubmissionContext,
}

impl<'a> Encoder<'a> {
    pub fn new(registry: &'a ReplacerRegistry, skip: &'a PatternFilter, ctx: &'a SubmissionContext) -> Self {
        Self { registry, skip, ctx }
    }

    pub fn encode_blocks(&self, blocks: &[Block]) -> Vec<ExchangeNode> {
        blocks.iter().map(|block| self.encode_block(block)).collect()
    }

    pub fn encode_block(&self, block: &Block) -> ExchangeNode {
        let mut content = Vec::with_capacity(block.inner_content.len());
        let mut children = block.inner_blocks.iter();
        for chunk in &block.inner_content {
            match chunk {
                Chunk::Text(text) => content.push(ContentItem::Chunk(ExchangeText::new(text))),
                Chunk::Gap => {
                    if let Some(child) = children.next() {
                        content.push(ContentItem::Node(self.encode_block(child)));
                    }
                }
            }
        }

        ExchangeNode {
            block_name: block.name_or_empty().to_string(),
            original_attributes: encode_capsule(&block.attributes),
            content,
            block_attributes: self.translatable_attributes(block),
        }
    }

    /// The attribute strings of `block` that are sent for translation, after upload hooks.
    pub fn translatable_attributes(&self, block: &Block) -> Vec<BlockAttribute> {
        if block.attributes.is_empty() {
            return Vec::new();
        }
        let name = block.name_or_empty();
        let flat = flatten_attributes(&block.attributes);

        flat.strings()
            .filter(|(path, text)| !text.trim().is_empty() && !is_numeric(text) && !self.skip.is_match(path))
            .filter_map(|(path, text)| {
                let text = match self.registry.get_replacer(name, path) {
                    Some(replacer) if !replacer.is_translatable() => return None,
                    Some(replacer) => {
                        match replacer.process_on_upload(&Value::String(text.to_string()), self.ctx) {
                            Value::String(processed) => processed,
                            Value::Null => return None,
                            other => other.to_string(),
                        }
                    }
                    None => text.to_string(),
                };
                Some(BlockAttribute::new(path, &text))
            })
            .collect()
    }
}
