use super::{ContentItem, ExchangeNode, decode_capsule};
use crate::block::{Attributes, Block, Chunk};
use crate::codec::DEFAULT_MAX_DEPTH;
use crate::context::SubmissionContext;
use crate::diagnostics::{Diagnostics, Recovery};
use crate::error::EngineError;
use crate::flatten::{LeafKind, flatten_attributes, unflatten_attributes};
use crate::replacer::{Replacement, ReplacerRegistry};
use regex::Regex;
use serde_json::Value;

/// A `<prefix><old id>` to `<prefix><new id>` rewrite for the text of one block.
struct ClassRewrite {
    pattern: Regex,
    replacement: String,
}

/// Rebuilds block trees from translated exchange nodes.
pub struct Decoder<'a> {
    registry: &'a ReplacerRegistry,
    ctx: &'a SubmissionContext,
    max_depth: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(registry: &'a ReplacerRegistry, ctx: &'a SubmissionContext) -> Self {
        Self {
            registry,
            ctx,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn decode_blocks(
        &self,
        nodes: &[ExchangeNode],
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<Block>, EngineError> {
        nodes
            .iter()
            .map(|node| self.decode_at(node, 1, diagnostics))
            .collect()
    }

    pub fn decode_block(&self, node: &ExchangeNode, diagnostics: &mut Diagnostics) -> Result<Block, EngineError> {
        self.decode_at(node, 1, diagnostics)
    }

    fn decode_at(&self, node: &ExchangeNode, depth: usize, diagnostics: &mut Diagnostics) -> Result<Block, EngineError> {
        if depth > self.max_depth {
            return Err(EngineError::NestingTooDeep {
                limit: self.max_depth,
            });
        }

        let (name, attributes, rewrites) = if node.block_name.is_empty() {
            (None, Attributes::new(), Vec::new())
        } else {
            let (attributes, rewrites) = self.decode_attributes(node, diagnostics);
            (Some(node.block_name.clone()), attributes, rewrites)
        };

        let mut block = Block {
            name,
            attributes,
            inner_content: Vec::with_capacity(node.content.len()),
            inner_blocks: Vec::new(),
        };
        for item in &node.content {
            match item {
                ContentItem::Chunk(chunk) => {
                    let text = rewrites.iter().fold(chunk.text.clone(), |text, rewrite| {
                        rewrite
                            .pattern
                            .replace_all(&text, rewrite.replacement.as_str())
                            .into_owned()
                    });
                    block.inner_content.push(Chunk::Text(text));
                }
                ContentItem::Node(child) => {
                    let child = self.decode_at(child, depth + 1, diagnostics)?;
                    block.push_child(child);
                }
            }
        }
        Ok(block)
    }

    /// Overlays translations on the capsule attributes, then lets replacers have the last word.
    fn decode_attributes(&self, node: &ExchangeNode, diagnostics: &mut Diagnostics) -> (Attributes, Vec<ClassRewrite>) {
        let name = node.block_name.as_str();
        let original = match decode_capsule(&node.original_attributes) {
            Ok(attributes) => attributes,
            Err(e) => {
                diagnostics.record(Recovery::CapsuleDecode, format!("block '{}': {}", name, e));
                Attributes::new()
            }
        };
        let original = flatten_attributes(&original);
        let mut merged = original.clone();

        for translated in &node.block_attributes {
            match original.get(&translated.path) {
                None => diagnostics.record(
                    Recovery::UnknownAttributePath,
                    format!("block '{}' has no attribute '{}'", name, translated.path),
                ),
                Some(leaf) if leaf.kind == LeafKind::String => {
                    merged.set_text(&translated.path, translated.text.as_str());
                }
                Some(leaf) => match leaf.kind.parse(&translated.text) {
                    Some(value) => merged.set_value(&translated.path, &value),
                    None => diagnostics.record(
                        Recovery::LeafCoercion,
                        format!(
                            "block '{}' attribute '{}' keeps its {:?} value; '{}' does not fit",
                            name, translated.path, leaf.kind, translated.text
                        ),
                    ),
                },
            }
        }

        let mut rewrites = Vec::new();
        for (path, leaf) in original.iter() {
            let Some((rule, replacer)) = self.registry.rule_for(name, path) else {
                continue;
            };
            let before = leaf.to_value();
            match replacer.process_on_download(&before, self.ctx) {
                Replacement::Value(after) => {
                    if let Some(prefix) = rule.class_prefix().filter(|_| after != before) {
                        if let Some(rewrite) = class_rewrite(prefix, &leaf.value, &after) {
                            rewrites.push(rewrite);
                        }
                    }
                    merged.set_value(path, &after);
                }
                Replacement::Unresolved => {
                    diagnostics.record(
                        Recovery::UnresolvedReference,
                        format!("block '{}' attribute '{}' keeps '{}'", name, path, leaf.value),
                    );
                    merged.set_value(path, &before);
                }
            }
        }

        (unflatten_attributes(&merged), rewrites)
    }
}

fn class_rewrite(prefix: &str, old: &str, new: &Value) -> Option<ClassRewrite> {
    let new = match new {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let pattern = format!(r"{}\b", regex::escape(&format!("{}{}", prefix, old)));
    match Regex::new(&pattern) {
        Ok(pattern) => Some(ClassRewrite {
            pattern,
            replacement: format!("{}{}", prefix, new).replace('$', "$$"),
        }),
        Err(e) => {
            log::warn!("Skipping class rewrite for '{}{}': {}", prefix, old, e);
            None
        }
    }
}
