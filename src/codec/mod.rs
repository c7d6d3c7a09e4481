//! Block tree codec: delimited markup to [`Block`] trees and back.

mod scanner;
mod serializer;

pub use scanner::has_blocks;
pub use serializer::{serialize_block, serialize_blocks};

use crate::block::{Block, Chunk};
use crate::diagnostics::{Diagnostics, Recovery};
use crate::error::EngineError;
use scanner::{DelimiterKind, Token, tokenize};

/// Nesting limit used when none is configured.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Parses delimited markup into a block tree.
///
/// Malformed delimiters never fail a parse; they are kept as literal text and recorded in the
/// supplied [`Diagnostics`]. Only invalid UTF-8 and nesting beyond `max_depth` are errors.
#[derive(Debug, Clone, Copy)]
pub struct BlockParser {
    max_depth: usize,
}

impl Default for BlockParser {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

struct Frame<'a> {
    block: Block,
    opener: &'a str,
}

impl BlockParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Parses raw bytes, rejecting anything that is not UTF-8.
    pub fn parse_bytes(
        &self,
        raw: &[u8],
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<Block>, EngineError> {
        let text = std::str::from_utf8(raw).map_err(|e| EngineError::InvalidUtf8(e.to_string()))?;
        self.parse(text, diagnostics)
    }

    pub fn parse(&self, raw: &str, diagnostics: &mut Diagnostics) -> Result<Vec<Block>, EngineError> {
        let mut output: Vec<Block> = Vec::new();
        let mut stack: Vec<Frame<'_>> = Vec::new();

        for token in tokenize(raw, diagnostics) {
            match token {
                Token::Text(text) => emit_text(&mut stack, &mut output, text),
                Token::Delimiter(delimiter) => match delimiter.kind {
                    DelimiterKind::SelfClosing(attributes) => {
                        self.check_depth(stack.len() + 1)?;
                        emit_block(&mut stack, &mut output, Block::named(delimiter.name, attributes));
                    }
                    DelimiterKind::Opener(attributes) => {
                        self.check_depth(stack.len() + 1)?;
                        stack.push(Frame {
                            block: Block::named(delimiter.name, attributes),
                            opener: delimiter.raw,
                        });
                    }
                    DelimiterKind::Closer => {
                        let matches_open = stack
                            .last()
                            .is_some_and(|frame| frame.block.name.as_deref() == Some(delimiter.name.as_str()));
                        let closed = if matches_open { stack.pop() } else { None };
                        if let Some(frame) = closed {
                            let mut block = frame.block;
                            if block.inner_content.is_empty() {
                                block.inner_content.push(Chunk::Text(String::new()));
                            }
                            emit_block(&mut stack, &mut output, block);
                        } else {
                            diagnostics.record(
                                Recovery::MalformedDelimiter,
                                format!("closing delimiter for '{}' has no matching opener", delimiter.name),
                            );
                            emit_text(&mut stack, &mut output, delimiter.raw);
                        }
                    }
                },
            }
        }

        // Unclosed openers become literal text; their content is spliced into the parent.
        while let Some(frame) = stack.pop() {
            diagnostics.record(
                Recovery::MalformedDelimiter,
                format!("block '{}' is never closed", frame.block.name_or_empty()),
            );
            emit_text(&mut stack, &mut output, frame.opener);
            let mut children = frame.block.inner_blocks.into_iter();
            for chunk in frame.block.inner_content {
                match chunk {
                    Chunk::Text(text) => emit_text(&mut stack, &mut output, &text),
                    Chunk::Gap => {
                        if let Some(child) = children.next() {
                            emit_block(&mut stack, &mut output, child);
                        }
                    }
                }
            }
        }

        log::debug!("Parsed {} top-level blocks", output.len());
        Ok(output)
    }

    fn check_depth(&self, depth: usize) -> Result<(), EngineError> {
        if depth > self.max_depth {
            return Err(EngineError::NestingTooDeep {
                limit: self.max_depth,
            });
        }
        Ok(())
    }
}

fn emit_text(stack: &mut [Frame<'_>], output: &mut Vec<Block>, text: &str) {
    if text.is_empty() {
        return;
    }
    match stack.last_mut() {
        Some(frame) => frame.block.push_text(text),
        None => match output.last_mut() {
            Some(last) if last.is_freeform() => last.push_text(text),
            _ => output.push(Block::freeform(text)),
        },
    }
}

fn emit_block(stack: &mut [Frame<'_>], output: &mut Vec<Block>, block: Block) {
    match stack.last_mut() {
        Some(frame) => frame.block.push_child(block),
        None => output.push(block),
    }
}

/// Parses with the default depth limit, discarding recovery notes.
pub fn parse_blocks(raw: &str) -> Result<Vec<Block>, EngineError> {
    BlockParser::default().parse(raw, &mut Diagnostics::new())
}
