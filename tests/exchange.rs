//! Tests for the exchange encoder, decoder, capsule and XML form.
mod common;
use blockport::config::DEFAULT_SKIP_ATTRIBUTE_PATTERNS;
use blockport::exchange::{
    ContentItem, Decoder, Encoder, ExchangeText, content_hash, decode_capsule, encode_capsule,
};
use blockport::fields::PatternFilter;
use blockport::prelude::*;
use common::{NESTED_GROUP, attributes, context, sample_attributes, translate_in_place};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

fn skip_filter() -> PatternFilter {
    PatternFilter::from_patterns(DEFAULT_SKIP_ATTRIBUTE_PATTERNS).expect("default patterns compile")
}

fn encode(block: &Block) -> ExchangeNode {
    let registry = ReplacerRegistry::new();
    let skip = skip_filter();
    let ctx = context();
    Encoder::new(&registry, &skip, &ctx).encode_block(block)
}

fn decode(node: &ExchangeNode) -> (Block, Diagnostics) {
    let registry = ReplacerRegistry::new();
    let ctx = context();
    let mut diagnostics = Diagnostics::new();
    let block = Decoder::new(&registry, &ctx)
        .decode_block(node, &mut diagnostics)
        .expect("decode succeeds");
    (block, diagnostics)
}

#[test]
fn test_capsule_round_trip() {
    let original = sample_attributes();
    assert_eq!(decode_capsule(&encode_capsule(&original)), Ok(original));
}

#[rstest]
#[case::empty_object("e30=", json!({}))]
#[case::empty_list("W10=", json!({}))]
#[case::blank("", json!({}))]
#[case::legacy_string_map("YToxOntzOjQ6InRlc3QiO3M6NToidmFsdWUiO30=", json!({"test": "value"}))]
#[case::legacy_nested(
    "YTozOntzOjI6ImlkIjtpOjE3O3M6NToic2l6ZXMiO2E6Mjp7aTowO3M6NToibGFyZ2UiO2k6MTtzOjQ6ImZ1bGwiO31zOjY6ImFjdGl2ZSI7YjoxO30=",
    json!({"id": 17, "sizes": ["large", "full"], "active": true})
)]
#[case::legacy_exported_block(
    "YToxOntzOjQ6ImRhdGEiO2E6Mzp7czo2OiJ0ZXh0X2EiO3M6NzoiVGl0bGUgMSI7czo2OiJ0ZXh0X2IiO3M6NzoiVGl0bGUgMiI7czo1OiJ0ZXh0cyI7YToyOntpOjA7czo1OiJsb3JlbSI7aToxO3M6NToiaXBzdW0iO319fQ==",
    json!({"data": {"text_a": "Title 1", "text_b": "Title 2", "texts": ["lorem", "ipsum"]}})
)]
fn test_decode_capsule(#[case] capsule: &str, #[case] expected: serde_json::Value) {
    assert_eq!(decode_capsule(capsule), Ok(attributes(expected)));
}

#[test]
fn test_decode_capsule_failures() {
    assert!(matches!(decode_capsule("!!not base64!!"), Err(CapsuleError::Base64(_))));
    assert_eq!(
        decode_capsule("WzFd"),
        Err(CapsuleError::NotAMapping {
            found: "list".to_string()
        })
    );
    assert!(matches!(
        decode_capsule("YToxOntzOjQ6InRlc3QiO3M6OToidG9vIGxvbmciO30="),
        Err(CapsuleError::Payload { .. })
    ));
}

#[test]
fn test_attribute_types_survive_encode_decode() {
    let block = Block::named("test", attributes(json!({"id": 42, "boolean": true})));
    let (decoded, diagnostics) = decode(&encode(&block));
    assert!(diagnostics.is_clean());
    assert_eq!(serialize_blocks(&[decoded]), r#"<!-- wp:test {"id":42,"boolean":true} /-->"#);
}

#[test]
fn test_translatable_attribute_selection() {
    let block = Block::named(
        "paragraph",
        attributes(json!({
            "placeholder": "Hello",
            "className": "is-style-wide",
            "align": "wide",
            "count": "5",
            "blank": "  ",
            "level": 2,
            "data": {"texts": ["lorem"]}
        })),
    );
    let node = encode(&block);
    let paths: Vec<&str> = node.block_attributes.iter().map(|a| a.path.as_str()).collect();
    assert_eq!(paths, vec!["placeholder", "data/texts/0"]);
    assert_eq!(node.block_attributes[0].hash, content_hash("Hello"));
}

#[test]
fn test_content_chunks_carry_md5_hashes() {
    let block = Block::named("paragraph", Attributes::new()).with_text("<p>Hello</p>");
    let node = encode(&block);
    assert_eq!(
        node.content,
        vec![ContentItem::Chunk(ExchangeText {
            text: "<p>Hello</p>".to_string(),
            hash: "5bf3d2f5234fee3abf8d993b25e899c3".to_string(),
        })]
    );
    assert_eq!(node.original_attributes, "e30=");
}

#[test]
fn test_translated_attributes_overlay_original_types() {
    let block = Block::named("cover", sample_attributes());
    let mut node = encode(&block);
    assert!(translate_in_place(&mut node, "lorem", "Lorem (de)"));

    let (decoded, diagnostics) = decode(&node);
    assert!(diagnostics.is_clean());
    assert_eq!(
        decoded.attributes,
        attributes(json!({
            "id": 42,
            "boolean": true,
            "data": {"texts": ["Lorem (de)", "ipsum"], "empty": [], "nothing": null}
        }))
    );
}

#[test]
fn test_unknown_paths_and_bad_coercions_are_recorded() {
    let block = Block::named("test", attributes(json!({"id": 42, "title": "Hi"})));
    let mut node = encode(&block);
    node.block_attributes.push(blockport::exchange::BlockAttribute::new("missing/path", "x"));
    node.block_attributes.push(blockport::exchange::BlockAttribute::new("id", "forty-two"));

    let (decoded, diagnostics) = decode(&node);
    assert_eq!(diagnostics.count(Recovery::UnknownAttributePath), 1);
    assert_eq!(diagnostics.count(Recovery::LeafCoercion), 1);
    assert_eq!(decoded.attributes, attributes(json!({"id": 42, "title": "Hi"})));

    node.block_attributes.pop();
    node.block_attributes.push(blockport::exchange::BlockAttribute::new("id", "43"));
    let (decoded, _) = decode(&node);
    assert_eq!(decoded.attributes.get("id"), Some(&json!(43)));
}

#[test]
fn test_undecodable_capsule_falls_back_to_empty_attributes() {
    let mut node = encode(&Block::named("test", attributes(json!({"title": "Hi"}))).with_text("body"));
    node.original_attributes = "%%%".to_string();

    let (decoded, diagnostics) = decode(&node);
    assert_eq!(diagnostics.count(Recovery::CapsuleDecode), 1);
    assert!(decoded.attributes.is_empty());
    assert_eq!(decoded.inner_content, vec![Chunk::Text("body".to_string())]);
}

#[test]
fn test_translating_one_child_leaves_siblings_untouched() {
    let blocks = parse_blocks(NESTED_GROUP).expect("fixture parses");
    let mut node = encode(&blocks[0]);
    assert_eq!(node.children().count(), 3);
    assert!(translate_in_place(&mut node, "<p>Middle</p>", "<p>Mitte</p>"));

    let (decoded, _) = decode(&node);
    assert_eq!(decoded.inner_blocks.len(), 3);
    assert_eq!(decoded.inner_blocks[0], blocks[0].inner_blocks[0]);
    assert_eq!(decoded.inner_blocks[2], blocks[0].inner_blocks[2]);
    assert_eq!(decoded.inner_blocks[1].inner_html(), "<p>Mitte</p>");
    assert_eq!(
        serialize_blocks(&[decoded]),
        NESTED_GROUP.replace("<p>Middle</p>", "<p>Mitte</p>")
    );
}

#[test]
fn test_xml_round_trip() {
    let blocks = parse_blocks(NESTED_GROUP).expect("fixture parses");
    let mut document = ExchangeDocument::new();
    document.push_text("entity/post_title", "Hello & <world>");
    document.push_blocks("entity/post_content", vec![encode(&blocks[0])]);

    let xml = document.to_xml().expect("document writes");
    assert!(xml.contains(r#"<string name="entity/post_title"><![CDATA[Hello & <world>]]></string>"#));
    assert!(xml.contains(r#"<block blockName="heading" originalAttributes=""#));
    assert_eq!(ExchangeDocument::from_xml(&xml), Ok(document));
}

#[test]
fn test_cdata_terminator_is_split() {
    let mut document = ExchangeDocument::new();
    document.push_text("meta/code", "a]]>b");
    let xml = document.to_xml().expect("document writes");
    assert!(xml.contains("<![CDATA[a]]]]><![CDATA[>b]]>"));

    let parsed = ExchangeDocument::from_xml(&xml).expect("document parses");
    assert_eq!(
        parsed.field("meta/code").map(|f| &f.content),
        Some(&FieldContent::Text("a]]>b".to_string()))
    );
}

#[test]
fn test_reads_hand_written_xml_without_hashes() {
    let xml = r#"<?xml version="1.0"?>
<data>
  <string name="entity/post_content">
    <block blockName="paragraph" originalAttributes="e30=">
      <contentChunk><![CDATA[<p>Hallo</p>]]></contentChunk>
    </block>
  </string>
  <string name="meta/subtitle">Untertitel &amp; mehr</string>
</data>"#;
    let document = ExchangeDocument::from_xml(xml).expect("document parses");
    let Some(FieldContent::Blocks(nodes)) = document.field("entity/post_content").map(|f| &f.content) else {
        panic!("post_content should hold blocks");
    };
    assert_eq!(nodes[0].chunks().next().map(|c| c.hash.clone()), Some(content_hash("<p>Hallo</p>")));
    assert_eq!(
        document.field("meta/subtitle").map(|f| &f.content),
        Some(&FieldContent::Text("Untertitel & mehr".to_string()))
    );
}

#[rstest]
#[case::empty("", ExchangeError::MissingRoot)]
#[case::wrong_root("<root/>", ExchangeError::UnexpectedElement { parent: "document".into(), found: "root".into() })]
#[case::unknown_field_element("<data><foo/></data>", ExchangeError::UnexpectedElement { parent: "data".into(), found: "foo".into() })]
#[case::missing_name("<data><string>x</string></data>", ExchangeError::MissingAttribute { element: "string".into(), attribute: "name".into() })]
#[case::too_deep(
    r#"<data><string name="entity/c"><block blockName="a"><block blockName="b"><block blockName="c"/></block></block></string></data>"#,
    ExchangeError::NestingTooDeep { limit: 2 }
)]
fn test_xml_errors(#[case] xml: &str, #[case] expected: ExchangeError) {
    assert_eq!(ExchangeDocument::from_xml_with_depth(xml, 2), Err(expected));
}

#[test]
fn test_truncated_xml_is_an_error() {
    let result = ExchangeDocument::from_xml(r#"<data><string name="a">"#);
    assert!(matches!(result, Err(ExchangeError::Xml(_))));
}
