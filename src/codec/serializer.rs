use crate::block::{Block, Chunk, render_attributes};

/// Renders a block sequence back into delimited markup.
pub fn serialize_blocks(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        write_block(block, &mut out);
    }
    out
}

/// Renders a single block, including its delimiters when it is named.
pub fn serialize_block(block: &Block) -> String {
    let mut out = String::new();
    write_block(block, &mut out);
    out
}

fn write_block(block: &Block, out: &mut String) {
    let Some(name) = &block.name else {
        write_inner(block, out);
        return;
    };

    out.push_str("<!-- wp:");
    out.push_str(name);
    if !block.attributes.is_empty() {
        out.push(' ');
        out.push_str(&render_attributes(&block.attributes));
    }

    if block.inner_content.is_empty() {
        out.push_str(" /-->");
        return;
    }

    out.push_str(" -->");
    write_inner(block, out);
    out.push_str("<!-- /wp:");
    out.push_str(name);
    out.push_str(" -->");
}

fn write_inner(block: &Block, out: &mut String) {
    let mut children = block.inner_blocks.iter();
    for chunk in &block.inner_content {
        match chunk {
            Chunk::Text(text) => out.push_str(text),
            Chunk::Gap => {
                if let Some(child) = children.next() {
                    write_block(child, out);
                }
            }
        }
    }
}
