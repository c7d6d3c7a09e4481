//! Tests for replacer rules, built-in replacers and identifier remapping.
mod common;
use blockport::prelude::*;
use common::{IMAGE_BLOCK, context, media_engine};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;

/// Exports `content` as a post body and imports the untouched document onto an empty target.
fn round_trip(engine: &TranslationEngine, content: &str) -> (String, Diagnostics) {
    let source = EntityFields::new().with_entity("post_content", content);
    let ctx = context();
    let export = engine.export(&source, &ctx).expect("export succeeds");
    let outcome = engine
        .import_document(&export.document, &source, &EntityFields::new(), &ctx)
        .expect("import succeeds");
    let content = outcome
        .fields
        .get("entity/post_content")
        .expect("content is written")
        .to_string();
    (content, outcome.diagnostics)
}

/// Writes the target locale into every matching attribute.
struct LocaleStamp;

impl Replacer for LocaleStamp {
    fn id(&self) -> &str {
        "locale-stamp"
    }

    fn process_on_download(&self, _original: &Value, ctx: &SubmissionContext) -> Replacement {
        Replacement::Value(Value::String(ctx.target_locale.clone()))
    }
}

#[test]
fn test_media_id_and_class_are_remapped() {
    let (content, diagnostics) = round_trip(&media_engine(), IMAGE_BLOCK);
    assert!(diagnostics.is_clean(), "{}", diagnostics);
    assert_eq!(
        content,
        r#"<!-- wp:image {"id":42,"sizeSlug":"large","alt":"A red car"} --><figure class="wp-block-image size-large"><img src="car.jpg" alt="A red car" class="wp-image-42"/></figure><!-- /wp:image -->"#
    );
}

#[test]
fn test_class_rewrite_respects_word_boundaries() {
    let content = r#"<!-- wp:image {"id":17} --><img class="wp-image-17 wp-image-170"/><!-- /wp:image -->"#;
    let (content, _) = round_trip(&media_engine(), content);
    assert_eq!(
        content,
        r#"<!-- wp:image {"id":42} --><img class="wp-image-42 wp-image-170"/><!-- /wp:image -->"#
    );
}

#[test]
fn test_unresolved_identifier_is_kept_and_recorded() {
    let content = r#"<!-- wp:image {"id":99} --><img class="wp-image-99"/><!-- /wp:image -->"#;
    let (imported, diagnostics) = round_trip(&media_engine(), content);
    assert_eq!(imported, content);
    assert_eq!(diagnostics.count(Recovery::UnresolvedReference), 1);
    assert_eq!(diagnostics.total(), 1);
}

#[test]
fn test_already_remapped_content_is_stable() {
    let (once, _) = round_trip(&media_engine(), IMAGE_BLOCK);
    let (twice, diagnostics) = round_trip(&media_engine(), &once);
    assert_eq!(twice, once);
    assert_eq!(diagnostics.count(Recovery::UnresolvedReference), 1);
}

#[test]
fn test_zero_and_empty_identifiers_are_untouched() {
    let content = r#"<!-- wp:image {"id":0} /--><!-- wp:media-text {"mediaId":""} /-->"#;
    let (imported, diagnostics) = round_trip(&media_engine(), content);
    assert_eq!(imported, content);
    assert!(diagnostics.is_clean());
}

#[test]
fn test_string_identifiers_stay_strings() {
    let content = r#"<!-- wp:core/media-text {"mediaId":"17"} /-->"#;
    let (imported, _) = round_trip(&media_engine(), content);
    assert_eq!(imported, r#"<!-- wp:core/media-text {"mediaId":"42"} /-->"#);
}

#[test]
fn test_media_rules_need_a_resolver() {
    let engine = common::default_engine();
    assert!(engine.registry().rules().is_empty());
    let (content, _) = round_trip(&engine, IMAGE_BLOCK);
    assert_eq!(content, IMAGE_BLOCK);
}

#[test]
fn test_first_matching_rule_wins() {
    let config = EngineConfig::from_json(
        r#"{"rules": [{"block": "^image$", "path": "^id$", "replacer": "copy"}]}"#,
    )
    .expect("config parses");
    let engine = TranslationEngine::builder(config)
        .with_resolver(Arc::new(MapResolver::new().with_mapping("attachment", "17", "42")))
        .build()
        .expect("engine builds");

    assert_eq!(engine.registry().rules().len(), 3);
    let (content, _) = round_trip(&engine, IMAGE_BLOCK);
    assert_eq!(content, IMAGE_BLOCK);
}

#[test]
fn test_exclude_drops_the_value_and_hides_it_from_translators() {
    let engine = TranslationEngine::builder(EngineConfig::default())
        .with_rule(ReplacerRule::new("^image$", "^alt$", "exclude").expect("rule compiles"))
        .build()
        .expect("engine builds");

    let source = EntityFields::new().with_entity("post_content", IMAGE_BLOCK);
    let export = engine.export(&source, &context()).expect("export succeeds");
    let Some(FieldContent::Blocks(nodes)) = export.document.field("entity/post_content").map(|f| &f.content) else {
        panic!("content should be exported as blocks");
    };
    assert!(nodes[0].attribute("alt").is_none());
    assert!(nodes[0].attribute("sizeSlug").is_some());

    let (content, _) = round_trip(&engine, IMAGE_BLOCK);
    assert!(content.starts_with(r#"<!-- wp:image {"id":17,"sizeSlug":"large","alt":null} -->"#));
}

#[test]
fn test_custom_replacer_sees_the_submission() {
    let engine = TranslationEngine::builder(EngineConfig::default())
        .with_replacer(Box::new(LocaleStamp))
        .with_rule(ReplacerRule::new(".*", "^lang$", "locale-stamp").expect("rule compiles"))
        .build()
        .expect("engine builds");

    let content = r#"<!-- wp:code {"lang":"en","title":"Snippet"} /-->"#;
    let (content, _) = round_trip(&engine, content);
    assert_eq!(content, r#"<!-- wp:code {"lang":"de","title":"Snippet"} /-->"#);
}

#[test]
fn test_rules_must_name_registered_replacers() {
    let mut registry = ReplacerRegistry::new();
    assert!(registry.has_replacer("copy"));
    assert!(registry.has_replacer("exclude"));
    registry.add_rule(ReplacerRule::new(".*", "^x$", "missing").expect("rule compiles"));
    assert_eq!(
        registry.validate(),
        Err(ConfigError::UnknownReplacer {
            rule: ".* ^x$ -> missing".to_string(),
            replacer_id: "missing".to_string(),
        })
    );

    let config = EngineConfig::from_json(
        r#"{"rules": [{"block": "^image$", "path": "^id$", "replacer": "related|attachment"}]}"#,
    )
    .expect("config parses");
    assert!(matches!(
        TranslationEngine::builder(config).build(),
        Err(ConfigError::UnknownReplacer { .. })
    ));
}

#[test]
fn test_invalid_rule_pattern_is_rejected() {
    assert!(matches!(
        ReplacerRule::new("(", "^id$", "copy"),
        Err(ConfigError::InvalidPattern { .. })
    ));
}

#[test]
fn test_registry_lookup() {
    let mut registry = ReplacerRegistry::new();
    registry.add_rule(ReplacerRule::new("^image$", "^id$", "copy").expect("rule compiles"));
    assert_eq!(registry.get_replacer("image", "id").map(|r| r.id()), Some("copy"));
    assert!(registry.get_replacer("image", "alt").is_none());
    assert!(registry.get_replacer("gallery", "id").is_none());

    let resolver = Arc::new(MapResolver::new().with_mapping("attachment", "5", "6"));
    let related = RelatedReplacer::new("attachment", resolver);
    assert_eq!(related.id(), "related|attachment");
    assert_eq!(
        related.process_on_download(&json!(5), &context()),
        Replacement::Value(json!(6))
    );
    assert_eq!(
        related.process_on_download(&json!("7"), &context()),
        Replacement::Unresolved
    );
}
