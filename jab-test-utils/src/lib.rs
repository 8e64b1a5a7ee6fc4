//! JAB Test Utilities
//!
//! Shared schemas, sample instances and payload builders used by the tests of
//! the JAB crates.

pub use chrono::NaiveDate;
use jab_model::{ClassDef, Instance, LazyValue, Schema, TypeRef, Value};
use serde_json::{json, Map, Value as JsonValue};
use std::sync::Arc;

/// Order/customer/product model
///
/// ```text
/// Customer { id: long, name: string, address: Address }
/// Address  { street: string, city: string, zipCode: string }
/// Order    { id: long, customer: Customer, delivery: Address, products: list<Product> }
/// Product  { id: long, name: string, creationDate: date, group: Group, data: any, image: byte[] }
/// Group    { id: long, name: string, products: list<Product> }
/// ```
pub fn order_schema() -> Schema {
    Schema::builder()
        .class(
            ClassDef::new("Customer")
                .field("id", TypeRef::LONG)
                .field("name", TypeRef::STRING)
                .field("address", TypeRef::named("Address")),
        )
        .class(
            ClassDef::new("Address")
                .field("street", TypeRef::STRING)
                .field("city", TypeRef::STRING)
                .field("zipCode", TypeRef::STRING),
        )
        .class(
            ClassDef::new("Order")
                .field("id", TypeRef::LONG)
                .field("customer", TypeRef::named("Customer"))
                .field("delivery", TypeRef::named("Address"))
                .field("products", TypeRef::list(TypeRef::named("Product"))),
        )
        .class(
            ClassDef::new("Product")
                .field("id", TypeRef::LONG)
                .field("name", TypeRef::STRING)
                .field("creationDate", TypeRef::DATE)
                .field("group", TypeRef::named("Group"))
                .field("data", TypeRef::Any)
                .field("image", TypeRef::list(TypeRef::BYTE)),
        )
        .class(
            ClassDef::new("Group")
                .field("id", TypeRef::LONG)
                .field("name", TypeRef::STRING)
                .field("products", TypeRef::list(TypeRef::named("Product"))),
        )
        .build()
        .unwrap_or_else(|e| panic!("order schema fixture is invalid: {}", e))
}

/// Dog model with one level of inheritance
///
/// ```text
/// Dog      { name: string, age: int }
/// UglyDog  extends Dog { color: string }
/// WithDogs { dog: Dog, uglyDog: UglyDog }
/// ```
pub fn dog_schema() -> Schema {
    Schema::builder()
        .class(
            ClassDef::new("Dog")
                .field("name", TypeRef::STRING)
                .field("age", TypeRef::INT),
        )
        .class(ClassDef::new("UglyDog").extends("Dog").field("color", TypeRef::STRING))
        .class(
            ClassDef::new("WithDogs")
                .field("dog", TypeRef::named("Dog"))
                .field("uglyDog", TypeRef::named("UglyDog")),
        )
        .build()
        .unwrap_or_else(|e| panic!("dog schema fixture is invalid: {}", e))
}

/// Address on Vergueiro street
pub fn sample_address() -> Instance {
    Instance::new("Address")
        .with("street", "Vergueiro")
        .with("city", "São Paulo")
        .with("zipCode", "04101-300")
}

/// Customer with an address
pub fn sample_customer() -> Instance {
    Instance::new("Customer")
        .with("id", 10i64)
        .with("name", "guilherme silveira")
        .with("address", sample_address())
}

/// Product in its own group
pub fn sample_product(id: i64, name: &str) -> Instance {
    Instance::new("Product")
        .with("id", id)
        .with("name", name)
        .with("creationDate", NaiveDate::from_ymd_opt(2010, 9, 15))
        .with(
            "group",
            Instance::new("Group")
                .with("id", id)
                .with("name", format!("Group {}", id)),
        )
}

/// Order with a customer, a delivery address and two products
pub fn sample_order() -> Instance {
    Instance::new("Order")
        .with("id", 1i64)
        .with("customer", sample_customer())
        .with("delivery", sample_address())
        .with(
            "products",
            vec![
                Value::from(sample_product(1, "Product 1")),
                Value::from(sample_product(2, "Product 2")),
            ],
        )
}

/// Lazy proxy that resolves to `value`
pub fn lazy(value: impl Into<Value>) -> Value {
    let value = value.into();
    Value::Lazy(Arc::new(LazyValue::new(move || Ok(value.clone()))))
}

/// Dog with a name and an age
pub fn sample_dog(name: &str, age: i32) -> Instance {
    Instance::new("Dog").with("name", name).with("age", age)
}

/// Builder for top-level request payloads keyed by parameter name
#[derive(Debug, Default)]
pub struct PayloadBuilder {
    params: Map<String, JsonValue>,
}

impl PayloadBuilder {
    /// Create an empty payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter
    pub fn param(mut self, name: &str, value: JsonValue) -> Self {
        self.params.insert(name.to_string(), value);
        self
    }

    /// Add a parameter with an explicit `null`
    pub fn null(self, name: &str) -> Self {
        self.param(name, JsonValue::Null)
    }

    /// Payload as a JSON tree
    pub fn build(self) -> JsonValue {
        JsonValue::Object(self.params)
    }

    /// Payload as request body bytes
    pub fn to_bytes(self) -> Vec<u8> {
        self.build().to_string().into_bytes()
    }
}

/// Order payload with two products, each in its own group
pub fn order_json() -> JsonValue {
    json!({
        "id": 1,
        "products": [
            {"id": 1, "name": "Product 1", "group": {"id": 1, "name": "Group 1"}},
            {"id": 2, "name": "Product 2", "group": {"id": 2, "name": "Group 2"}}
        ]
    })
}

/// Field of an object value, `Null` for anything else
pub fn field<'a>(value: &'a Value, name: &str) -> &'a Value {
    static NULL: Value = Value::Null;
    value.as_object().map_or(&NULL, |instance| instance.get(name))
}
