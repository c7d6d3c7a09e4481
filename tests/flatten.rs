//! Tests for attribute flattening and unflattening.
mod common;
use blockport::flatten::{
    FlatAttributes, LeafKind, flatten, flatten_attributes, unflatten, unflatten_attributes,
};
use common::{attributes, sample_attributes};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};

#[test]
fn test_flatten_paths_and_kinds() {
    let flat = flatten_attributes(&sample_attributes());
    let paths: Vec<&str> = flat.iter().map(|(path, _)| path).collect();
    assert_eq!(
        paths,
        vec!["id", "boolean", "data/texts/0", "data/texts/1", "data/empty", "data/nothing"]
    );
    assert_eq!(flat.get("id").map(|leaf| leaf.kind), Some(LeafKind::Number));
    assert_eq!(flat.get("id").map(|leaf| leaf.value.as_str()), Some("42"));
    assert_eq!(flat.get("boolean").map(|leaf| leaf.value.as_str()), Some("true"));
    assert_eq!(flat.get("data/empty").map(|leaf| leaf.kind), Some(LeafKind::EmptyList));

    let strings: Vec<(&str, &str)> = flat.strings().collect();
    assert_eq!(strings, vec![("data/texts/0", "lorem"), ("data/texts/1", "ipsum")]);
}

#[rstest]
#[case::string(json!("text"))]
#[case::number(json!(3.5))]
#[case::negative(json!(-7))]
#[case::boolean(json!(false))]
#[case::null(json!(null))]
#[case::empty_list(json!([]))]
#[case::empty_map(json!({}))]
#[case::single_element_list(json!(["only"]))]
#[case::single_key_map(json!({"k": "v"}))]
#[case::numeric_keys(json!({"0": "zero", "1": "one"}))]
#[case::sparse_numeric_keys(json!({"1": "one", "3": "three"}))]
#[case::slash_and_tilde_keys(json!({"a/b": 1, "c~d": [true], "~1": "x"}))]
#[case::lists_of_maps(json!([{"a": []}, {"b": {}}, [[], [null]]]))]
#[case::numeric_strings(json!({"n": "5", "f": "1.50"}))]
#[case::empty_key(json!({"": 1, "a": {"": [true]}}))]
#[case::empty_key_beside_sibling(json!({"": {"a": 1}, "a": 2}))]
#[case::literal_escape_tokens(json!({"~2": "x", "": "y", "~0": "z"}))]
fn test_flatten_unflatten_identity(#[case] value: Value) {
    assert_eq!(unflatten(&flatten(&value, "")), value);
}

#[test]
fn test_flatten_with_prefix() {
    let flat = flatten(&json!({"x": [1]}), "data");
    assert_eq!(flat.iter().map(|(p, _)| p).collect::<Vec<_>>(), vec!["data/x/0"]);
    assert_eq!(unflatten(&flat), json!({"data": {"x": [1]}}));
}

#[test]
fn test_keys_are_escaped() {
    let flat = flatten(&json!({"a/b": {"c~d": 1}}), "");
    assert_eq!(flat.iter().map(|(p, _)| p).collect::<Vec<_>>(), vec!["a~1b/c~0d"]);
}

#[test]
fn test_empty_key_keeps_its_own_path() {
    let nested = attributes(json!({"": {"a": 1}, "a": 2}));
    let flat = flatten_attributes(&nested);
    assert_eq!(flat.iter().map(|(p, _)| p).collect::<Vec<_>>(), vec!["~2/a", "a"]);
    assert_eq!(unflatten_attributes(&flat), nested);
}

#[rstest]
#[case::canonical_indices(vec![("list/0", "a"), ("list/1", "b")], json!({"list": ["a", "b"]}))]
#[case::out_of_order_indices(vec![("list/1", "b"), ("list/0", "a")], json!({"list": ["a", "b"]}))]
#[case::mixed_keys_are_a_mapping(vec![("g/0", "a"), ("g/name", "b")], json!({"g": {"0": "a", "name": "b"}}))]
#[case::gap_is_a_mapping(vec![("g/0", "a"), ("g/2", "b")], json!({"g": {"0": "a", "2": "b"}}))]
#[case::leading_zero_is_a_mapping(vec![("g/0", "a"), ("g/01", "b")], json!({"g": {"0": "a", "01": "b"}}))]
#[case::leaf_and_container_keeps_container(vec![("a", "x"), ("a/b", "y")], json!({"a": {"b": "y"}}))]
fn test_unflatten_without_shapes(#[case] pairs: Vec<(&str, &str)>, #[case] expected: Value) {
    assert_eq!(unflatten(&FlatAttributes::from_pairs(pairs)), expected);
}

#[test]
fn test_set_value_splices_containers() {
    let mut flat = flatten_attributes(&attributes(json!({"a": "x", "b": 1})));
    flat.set_value("a", &json!({"inner": [1, 2]}));
    flat.set_value("b", &json!(null));
    assert_eq!(
        unflatten_attributes(&flat),
        attributes(json!({"a": {"inner": [1, 2]}, "b": null}))
    );
}

#[rstest]
#[case(LeafKind::Number, "42", Some(json!(42)))]
#[case(LeafKind::Number, " 1.5 ", Some(json!(1.5)))]
#[case(LeafKind::Number, "forty-two", None)]
#[case(LeafKind::Bool, "false", Some(json!(false)))]
#[case(LeafKind::Bool, "yes", None)]
#[case(LeafKind::Null, "", Some(json!(null)))]
#[case(LeafKind::Null, "x", None)]
#[case(LeafKind::String, "42", Some(json!("42")))]
fn test_leaf_kind_parse(#[case] kind: LeafKind, #[case] text: &str, #[case] expected: Option<Value>) {
    assert_eq!(kind.parse(text), expected);
}

#[test]
fn test_empty_attributes_round_trip() {
    let empty = attributes(json!({}));
    let flat = flatten_attributes(&empty);
    assert!(flat.is_empty());
    assert_eq!(unflatten_attributes(&flat), empty);
}
