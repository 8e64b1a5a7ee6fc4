//! Binding request bodies to method arguments

use jab_io::{
    Adapter, AdapterRegistration, ArgumentDeserializer, BindError, Engine, ErrorKind, FixedLocale,
    Instance, Locale, Localization, ParameterNameProvider, ResourceMethod, Result,
    StaticParameterNames, TypeRef, Value,
};
use jab_test_utils::{dog_schema, field, order_json, order_schema, NaiveDate, PayloadBuilder};
use serde_json::json;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

fn orders() -> Arc<Engine> {
    Arc::new(Engine::builder(order_schema()).build().unwrap())
}

fn dogs() -> Arc<Engine> {
    Arc::new(Engine::builder(dog_schema()).build().unwrap())
}

fn deserializer(engine: Arc<Engine>, names: StaticParameterNames) -> ArgumentDeserializer {
    ArgumentDeserializer::new(
        engine,
        Arc::new(names),
        Arc::new(FixedLocale(Locale::with_country("pt", "BR"))),
    )
}

fn list() -> ResourceMethod {
    ResourceMethod::new("OrderController", "list")
}

fn list_limit() -> ResourceMethod {
    ResourceMethod::new("OrderController", "list").param(TypeRef::INT)
}

fn add() -> ResourceMethod {
    ResourceMethod::new("OrderController", "add").param(TypeRef::named("Order"))
}

fn add_product() -> ResourceMethod {
    ResourceMethod::new("OrderController", "addProduct")
        .param(TypeRef::named("Order"))
        .param(TypeRef::named("Product"))
}

fn bark() -> ResourceMethod {
    ResourceMethod::new("DogController", "bark").param(TypeRef::named("Dog"))
}

fn jump() -> ResourceMethod {
    ResourceMethod::new("DogController", "jump")
        .param(TypeRef::named("Dog"))
        .param(TypeRef::INT)
}

fn drop_dead() -> ResourceMethod {
    ResourceMethod::new("DogController", "dropDead")
        .param(TypeRef::INT)
        .param(TypeRef::named("Dog"))
}

fn with_dogs() -> ResourceMethod {
    ResourceMethod::new("DogController", "withDogs").param(TypeRef::named("WithDogs"))
}

fn assert_order(order: &Value) {
    assert_eq!(order.as_object().unwrap().class().as_str(), "Order");
    assert_eq!(field(order, "id").as_i64(), Some(1));
    let products = field(order, "products").as_list().unwrap();
    assert_eq!(products.len(), 2);
    for (idx, product) in products.iter().enumerate() {
        let id = idx as i64 + 1;
        assert_eq!(field(product, "id").as_i64(), Some(id));
        assert_eq!(field(field(product, "group"), "id").as_i64(), Some(id));
    }
}

#[test]
fn test_method_without_parameters_is_rejected() {
    let deserializer = deserializer(orders(), StaticParameterNames::new());
    for payload in ["", "{}", r#"{"order":{"id":1}}"#, "not json"] {
        let err = deserializer
            .deserialize(Cursor::new(payload), &list())
            .unwrap_err();
        assert!(matches!(err, BindError::NoParameters { .. }));
        assert_eq!(err.kind(), ErrorKind::Argument);
    }
}

#[test]
fn test_parameters_missing_from_payload_are_absent() {
    let deserializer = deserializer(
        orders(),
        StaticParameterNames::new().with("OrderController.list", ["limit"]),
    );
    let payload = r#"{"product":{"id":1,"name":"Product 1"}}"#;

    let args = deserializer
        .deserialize(Cursor::new(payload), &list_limit())
        .unwrap();
    assert_eq!(args, vec![None]);
}

#[test]
fn test_order_for_single_parameter() {
    let deserializer = deserializer(
        orders(),
        StaticParameterNames::new().with("OrderController.add", ["order"]),
    );
    let payload = PayloadBuilder::new().param("order", order_json()).to_bytes();

    let args = deserializer.deserialize(payload.as_slice(), &add()).unwrap();
    assert_eq!(args.len(), 1);
    assert_order(args[0].as_ref().unwrap());
}

#[test]
fn test_order_and_product_for_two_parameters() {
    let deserializer = deserializer(
        orders(),
        StaticParameterNames::new().with("OrderController.addProduct", ["order", "product"]),
    );
    let payload = PayloadBuilder::new()
        .param("order", order_json())
        .param("product", json!({"id": 1, "name": "Product 1"}))
        .to_bytes();

    let args = deserializer
        .deserialize(payload.as_slice(), &add_product())
        .unwrap();
    assert_eq!(args.len(), 2);
    assert_order(args[0].as_ref().unwrap());

    let product = args[1].as_ref().unwrap();
    assert_eq!(product.as_object().unwrap().class().as_str(), "Product");
    assert_eq!(field(product, "id").as_i64(), Some(1));
    assert_eq!(field(product, "name").as_str(), Some("Product 1"));
}

#[test]
fn test_only_order_for_two_parameters() {
    let deserializer = deserializer(
        orders(),
        StaticParameterNames::new().with("OrderController.addProduct", ["order", "product"]),
    );
    let payload = PayloadBuilder::new().param("order", order_json()).to_bytes();

    let args = deserializer
        .deserialize(payload.as_slice(), &add_product())
        .unwrap();
    assert_eq!(args.len(), 2);
    assert_order(args[0].as_ref().unwrap());
    assert!(args[1].is_none());
}

#[test]
fn test_explicit_null_is_absent() {
    let deserializer = deserializer(
        orders(),
        StaticParameterNames::new().with("OrderController.addProduct", ["order", "product"]),
    );
    let payload = PayloadBuilder::new()
        .null("order")
        .param("product", json!({"id": 4}))
        .to_bytes();

    let args = deserializer
        .deserialize(payload.as_slice(), &add_product())
        .unwrap();
    assert!(args[0].is_none());
    assert!(args[1].is_some());
}

#[test]
fn test_dog_is_bound_by_name() {
    let deserializer = deserializer(
        dogs(),
        StaticParameterNames::new().with("DogController.bark", ["dog"]),
    );
    let args = deserializer
        .deserialize(
            Cursor::new(r#"{"dog":{"name":"Brutus","age":7}}"#),
            &bark(),
        )
        .unwrap();

    let dog = args[0].as_ref().unwrap();
    assert_eq!(field(dog, "name").as_str(), Some("Brutus"));
    assert_eq!(field(dog, "age").as_i64(), Some(7));
}

#[test]
fn test_dog_named_differently() {
    let deserializer = deserializer(
        dogs(),
        StaticParameterNames::new().with("DogController.bark", ["pet"]),
    );
    let args = deserializer
        .deserialize(
            Cursor::new(r#"{"pet":{"name":"Brutus","age":7}}"#),
            &bark(),
        )
        .unwrap();
    assert_eq!(field(args[0].as_ref().unwrap(), "name").as_str(), Some("Brutus"));
}

#[test]
fn test_position_follows_parameter_names() {
    let payload = r#"{"dog":{"name":"Brutus","age":7}}"#;

    let first = deserializer(
        dogs(),
        StaticParameterNames::new().with("DogController.jump", ["dog", "times"]),
    )
    .deserialize(Cursor::new(payload), &jump())
    .unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(field(first[0].as_ref().unwrap(), "name").as_str(), Some("Brutus"));
    assert!(first[1].is_none());

    let last = deserializer(
        dogs(),
        StaticParameterNames::new().with("DogController.dropDead", ["times", "dog"]),
    )
    .deserialize(Cursor::new(payload), &drop_dead())
    .unwrap();
    assert_eq!(last.len(), 2);
    assert!(last[0].is_none());
    assert_eq!(field(last[1].as_ref().unwrap(), "age").as_i64(), Some(7));
}

#[test]
fn test_deserializer_adapter_replaces_payload() {
    let engine = Engine::builder(dog_schema())
        .register(AdapterRegistration::exact(
            "Dog",
            Adapter::deserializer_fn(|_, _, _| {
                Ok(Instance::new("Dog").with("name", "Renan").with("age", 25).into())
            }),
        ))
        .build()
        .unwrap();
    let deserializer = deserializer(
        Arc::new(engine),
        StaticParameterNames::new().with("DogController.bark", ["dog"]),
    );

    let args = deserializer
        .deserialize(
            Cursor::new(r#"{"dog":{"name":"Renan Reis","age":"0"}}"#),
            &bark(),
        )
        .unwrap();
    let dog = args[0].as_ref().unwrap();
    assert_eq!(field(dog, "name").as_str(), Some("Renan"));
    assert_eq!(field(dog, "age").as_i64(), Some(25));
}

#[test]
fn test_hierarchical_adapter_fills_subtype_slot() {
    let engine = Engine::builder(dog_schema())
        .register(AdapterRegistration::hierarchical(
            "Dog",
            Adapter::deserializer_fn(|json, _, _| {
                let color = json
                    .as_str()
                    .ok_or_else(|| BindError::adapter("Dog", "expected a color"))?;
                Ok(Instance::new("UglyDog").with("color", color).into())
            }),
        ))
        .build()
        .unwrap();
    let deserializer = deserializer(
        Arc::new(engine),
        StaticParameterNames::new().with("DogController.withDogs", ["withDogs"]),
    );

    let args = deserializer
        .deserialize(
            Cursor::new(r#"{"withDogs":{"dog":"black","uglyDog":"gray"}}"#),
            &with_dogs(),
        )
        .unwrap();
    let wrapper = args[0].as_ref().unwrap();
    let dog = field(wrapper, "dog");
    let ugly = field(wrapper, "uglyDog");
    assert_eq!(dog.as_object().unwrap().class().as_str(), "UglyDog");
    assert_eq!(ugly.as_object().unwrap().class().as_str(), "UglyDog");
    assert_eq!(field(ugly, "color").as_str(), Some("gray"));
}

#[test]
fn test_malformed_payloads() {
    let deserializer = deserializer(
        orders(),
        StaticParameterNames::new().with("OrderController.add", ["order"]),
    );

    let err = deserializer.deserialize(Cursor::new("  \n"), &add()).unwrap_err();
    assert!(matches!(err, BindError::EmptyPayload));

    let err = deserializer.deserialize(Cursor::new("{\"order\":"), &add()).unwrap_err();
    assert!(matches!(err, BindError::Json(_)));
    assert_eq!(err.kind(), ErrorKind::MalformedPayload);

    let err = deserializer.deserialize(Cursor::new("[1, 2]"), &add()).unwrap_err();
    assert!(matches!(err, BindError::NotAnObject { found: "array" }));

    let err = deserializer
        .deserialize(Cursor::new("{'order':{'id':1,'name':gray}}"), &add())
        .unwrap_err();
    assert!(matches!(err, BindError::Json(_)));
}

#[test]
fn test_coercion_failure_names_the_path() {
    let deserializer = deserializer(
        orders(),
        StaticParameterNames::new().with("OrderController.add", ["order"]),
    );
    let payload = r#"{"order":{"id":1,"products":[{"id":1},{"id":"two"}]}}"#;

    let err = deserializer
        .deserialize(Cursor::new(payload), &add())
        .unwrap_err();
    match err {
        BindError::TypeMismatch { path, expected, .. } => {
            assert_eq!(path, "$.order.products[1].id");
            assert_eq!(expected, "long");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_lenient_scalars() {
    let deserializer = deserializer(
        orders(),
        StaticParameterNames::new().with("OrderController.addProduct", ["order", "product"]),
    );
    let payload = r#"{"product":{"id":"12","name":34,"creationDate":"2010-09-15","image":[1,2,255]}}"#;

    let err = deserializer
        .deserialize(Cursor::new(payload), &add_product())
        .unwrap_err();
    // 255 does not fit a byte
    assert!(matches!(err, BindError::TypeMismatch { .. }));

    let payload = r#"{"product":{"id":"12","name":34,"creationDate":"2010-09-15","image":[1,2,-3]}}"#;
    let args = deserializer
        .deserialize(Cursor::new(payload), &add_product())
        .unwrap();
    let product = args[1].as_ref().unwrap();
    assert_eq!(field(product, "id").as_i64(), Some(12));
    assert_eq!(field(product, "name").as_str(), Some("34"));
    assert_eq!(
        field(product, "creationDate"),
        &Value::Date(chrono_date(2010, 9, 15))
    );
    assert_eq!(field(product, "image").as_list().map(<[Value]>::len), Some(3));
}

#[test]
fn test_integer_past_long_range_is_rejected() {
    let deserializer = deserializer(
        orders(),
        StaticParameterNames::new().with("OrderController.add", ["order"]),
    );

    let err = deserializer
        .deserialize(Cursor::new(r#"{"order":{"id":9223372036854775808}}"#), &add())
        .unwrap_err();
    match err {
        BindError::TypeMismatch { path, expected, .. } => {
            assert_eq!(path, "$.order.id");
            assert_eq!(expected, "long");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let args = deserializer
        .deserialize(Cursor::new(r#"{"order":{"id":-9223372036854775808}}"#), &add())
        .unwrap();
    let order = args[0].as_ref().unwrap();
    assert_eq!(field(order, "id").as_i64(), Some(i64::MIN));
}

fn chrono_date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_any_field_binds_naturally() {
    let deserializer = deserializer(
        orders(),
        StaticParameterNames::new().with("OrderController.addProduct", ["order", "product"]),
    );
    let payload = r#"{"product":{"data":{"tags":["a","b"],"weight":1.5,"count":3}}}"#;

    let args = deserializer
        .deserialize(Cursor::new(payload), &add_product())
        .unwrap();
    let data = field(args[1].as_ref().unwrap(), "data");
    let Value::Map(map) = data else {
        panic!("expected a map, got {data:?}");
    };
    assert_eq!(map["count"], Value::Int(3));
    assert_eq!(map["weight"], Value::Float(1.5));
    assert_eq!(
        map["tags"],
        Value::List(vec![Value::from("a"), Value::from("b")])
    );
}

#[test]
fn test_name_count_mismatch_is_a_configuration_error() {
    let deserializer = deserializer(
        orders(),
        StaticParameterNames::new().with("OrderController.add", ["order", "extra"]),
    );
    let err = deserializer
        .deserialize(Cursor::new(r#"{"order":{}}"#), &add())
        .unwrap_err();
    assert!(matches!(
        err,
        BindError::ParameterNameMismatch { names: 2, declared: 1, .. }
    ));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

/// Records the locale it was asked with
struct RecordingNames {
    seen: Mutex<Vec<Locale>>,
}

impl ParameterNameProvider for RecordingNames {
    fn parameter_names_for(&self, _method: &ResourceMethod, locale: &Locale) -> Result<Vec<String>> {
        self.seen.lock().unwrap().push(locale.clone());
        Ok(vec!["order".to_string()])
    }
}

struct Brazil;

impl Localization for Brazil {
    fn locale(&self) -> Locale {
        Locale::with_country("pt", "BR")
    }
}

#[test]
fn test_provider_receives_request_locale() {
    let names = Arc::new(RecordingNames {
        seen: Mutex::new(Vec::new()),
    });
    let deserializer = ArgumentDeserializer::new(orders(), names.clone(), Arc::new(Brazil));

    deserializer
        .deserialize(Cursor::new(r#"{"order":{"id":3}}"#), &add())
        .unwrap();
    assert_eq!(
        names.seen.lock().unwrap().as_slice(),
        &[Locale::with_country("pt", "BR")]
    );
}

#[test]
fn test_declared_names_are_used_by_default() {
    let method = ResourceMethod::new("OrderController", "add").named_param("order", TypeRef::named("Order"));
    let args = jab_io::bind_arguments(orders(), Cursor::new(r#"{"order":{"id":9}}"#), &method).unwrap();
    assert_eq!(field(args[0].as_ref().unwrap(), "id").as_i64(), Some(9));
}
