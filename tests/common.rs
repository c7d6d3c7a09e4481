//! Common test fixtures for content, entities and engines.
use blockport::prelude::*;
use serde_json::json;
use std::sync::Arc;

/// Content the translator returned: three paragraphs separated by plain HTML runs.
#[allow(dead_code)]
pub const TRANSLATED_PARAGRAPHS: &str = r#"<!-- wp:paragraph {"placeholder":"Translated first paragraph","fontSize":"large"} -->
<p class="has-large-font-size">Translated first paragraph</p>
<!-- /wp:paragraph -->
<p>Translated not Gutenberg block</p>
<!-- wp:paragraph {"placeholder":"Translated second paragraph","fontSize":"large"} -->
<p class="has-large-font-size">Translated second paragraph</p>
<!-- /wp:paragraph -->
<p>Translated other non-Gutenberg content</p>
<!-- wp:paragraph {"placeholder":"Translated third paragraph","fontSize":"large"} -->
<p class="has-large-font-size">Translated third paragraph</p>
<!-- /wp:paragraph -->"#;

/// The target as edited by hand after an earlier translation.
#[allow(dead_code)]
pub const TARGET_PARAGRAPHS: &str = r#"<!-- wp:paragraph {"placeholder":"Translated first paragraph","fontSize":"large"} -->
<p class="has-large-font-size">Translated first paragraph with changes (not locked)</p>
<!-- /wp:paragraph -->
<p>Translated not Gutenberg block</p>
<!-- wp:paragraph {"placeholder":"Translated second paragraph","fontSize":"large"} -->
<p class="has-large-font-size">Translated second paragraph with changes (locked)</p>
<!-- /wp:paragraph -->
<p>Translated other non-Gutenberg content</p>
<!-- wp:paragraph {"placeholder":"Translated third paragraph","fontSize":"large"} -->
<p class="has-large-font-size">Translated third paragraph</p>
<!-- /wp:paragraph -->"#;

/// Translated content with the hand-edited second paragraph kept.
#[allow(dead_code)]
pub const EXPECTED_LOCKED_PARAGRAPHS: &str = r#"<!-- wp:paragraph {"placeholder":"Translated first paragraph","fontSize":"large"} -->
<p class="has-large-font-size">Translated first paragraph</p>
<!-- /wp:paragraph -->
<p>Translated not Gutenberg block</p>
<!-- wp:paragraph {"placeholder":"Translated second paragraph","fontSize":"large"} -->
<p class="has-large-font-size">Translated second paragraph with changes (locked)</p>
<!-- /wp:paragraph -->
<p>Translated other non-Gutenberg content</p>
<!-- wp:paragraph {"placeholder":"Translated third paragraph","fontSize":"large"} -->
<p class="has-large-font-size">Translated third paragraph</p>
<!-- /wp:paragraph -->"#;

/// A group with three children; only the middle one carries text worth translating.
#[allow(dead_code)]
pub const NESTED_GROUP: &str = r#"<!-- wp:group {"layout":{"type":"constrained"}} --><div class="wp-block-group"><!-- wp:heading {"level":2} --><h2>Title</h2><!-- /wp:heading --><!-- wp:paragraph --><p>Middle</p><!-- /wp:paragraph --><!-- wp:separator /--></div><!-- /wp:group -->"#;

/// An image block whose id and class refer to attachment 17.
#[allow(dead_code)]
pub const IMAGE_BLOCK: &str = r#"<!-- wp:image {"id":17,"sizeSlug":"large","alt":"A red car"} --><figure class="wp-block-image size-large"><img src="car.jpg" alt="A red car" class="wp-image-17"/></figure><!-- /wp:image -->"#;

#[allow(dead_code)]
pub fn attributes(value: serde_json::Value) -> Attributes {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("fixture attributes must be an object, got {}", other),
    }
}

#[allow(dead_code)]
pub fn paragraph(text: &str) -> Block {
    Block::named("paragraph", Attributes::new()).with_text(&format!("<p>{}</p>", text))
}

/// A source post with block content, a title and some metadata.
#[allow(dead_code)]
pub fn source_post() -> EntityFields {
    EntityFields::new()
        .with_entity("ID", "7")
        .with_entity("post_title", "Hello world")
        .with_entity("post_content", NESTED_GROUP)
        .with_meta("subtitle", "A short subtitle")
        .with_meta("_edit_lock", "1700000000:1")
}

#[allow(dead_code)]
pub fn context() -> SubmissionContext {
    SubmissionContext::new("en", "de")
}

#[allow(dead_code)]
pub fn default_engine() -> TranslationEngine {
    TranslationEngine::builder(EngineConfig::default())
        .build()
        .expect("default configuration is valid")
}

/// An engine that maps attachment 17 to 42.
#[allow(dead_code)]
pub fn media_engine() -> TranslationEngine {
    let resolver = MapResolver::new().with_mapping("attachment", "17", "42");
    TranslationEngine::builder(EngineConfig::default())
        .with_resolver(Arc::new(resolver))
        .build()
        .expect("media configuration is valid")
}

/// Replaces the text of the first exchange attribute or chunk equal to `from`.
#[allow(dead_code)]
pub fn translate_in_place(node: &mut ExchangeNode, from: &str, to: &str) -> bool {
    use blockport::exchange::ContentItem;

    for attribute in &mut node.block_attributes {
        if attribute.text == from {
            attribute.text = to.to_string();
            return true;
        }
    }
    for item in &mut node.content {
        match item {
            ContentItem::Chunk(chunk) if chunk.text == from => {
                chunk.text = to.to_string();
                return true;
            }
            ContentItem::Node(child) => {
                if translate_in_place(child, from, to) {
                    return true;
                }
            }
            ContentItem::Chunk(_) => {}
        }
    }
    false
}

#[allow(dead_code)]
pub fn sample_attributes() -> Attributes {
    attributes(json!({
        "id": 42,
        "boolean": true,
        "data": {"texts": ["lorem", "ipsum"], "empty": [], "nothing": null}
    }))
}
