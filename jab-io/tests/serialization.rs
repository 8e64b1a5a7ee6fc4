//! Fluent serialization into writers

use jab_io::{Engine, JsonSerialization, Value};
use jab_test_utils::{lazy, order_schema, sample_customer, sample_order};
use std::io::Read;

#[test]
fn test_write_to_file() {
    let engine = Engine::builder(order_schema()).pretty_print().build().unwrap();
    let mut file = tempfile::NamedTempFile::new().unwrap();

    JsonSerialization::new(&engine)
        .from(sample_order())
        .include("customer")
        .unwrap()
        .serialize(file.as_file_mut())
        .unwrap();

    let mut written = String::new();
    file.reopen().unwrap().read_to_string(&mut written).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(parsed["customer"]["name"], "guilherme silveira");
    assert!(written.contains('\n'));
}

#[test]
fn test_alias_applies_with_root_wrapping() {
    let engine = Engine::builder(order_schema())
        .root_wrapping(true)
        .build()
        .unwrap();
    let json = JsonSerialization::new(&engine)
        .from_with_alias(sample_customer(), "client")
        .into_string()
        .unwrap();
    assert_eq!(json, r#"{"client":{"id":10,"name":"guilherme silveira"}}"#);
}

#[test]
fn test_proxy_root_output_is_identical() {
    let engine = Engine::builder(order_schema()).build().unwrap();
    let serialize = |value: Value| {
        JsonSerialization::new(&engine)
            .from(value)
            .recursive()
            .exclude("products")
            .unwrap()
            .into_string()
            .unwrap()
    };

    assert_eq!(
        serialize(sample_order().into()),
        serialize(lazy(sample_order()))
    );
}

#[test]
fn test_list_root_with_include() {
    let engine = Engine::builder(order_schema()).build().unwrap();
    let orders = Value::List(vec![sample_order().into()]);
    let json = JsonSerialization::new(&engine)
        .from(orders)
        .include("products")
        .unwrap()
        .into_string()
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed[0]["products"][1]["name"], "Product 2");
    assert!(parsed[0]["products"][1].get("group").is_none());
}

#[test]
fn test_whole_graph_helper() {
    let engine = Engine::builder(order_schema()).build().unwrap();
    let json = jab_io::to_json(&engine, &sample_customer().into()).unwrap();
    assert_eq!(
        json,
        r#"{"id":10,"name":"guilherme silveira","address":{"street":"Vergueiro","city":"São Paulo","zipCode":"04101-300"}}"#
    );
}
