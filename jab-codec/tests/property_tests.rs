//! Property tests for field exclusion and primitive binding

use jab_codec::{Engine, Instance, Serializee, TypeRef, Value};
use jab_test_utils::order_schema;
use proptest::prelude::*;

const CUSTOMER_FIELDS: [&str; 2] = ["id", "name"];

proptest! {
    /// A field is written iff it is included, or it is not excluded
    #[test]
    fn test_include_beats_exclude(
        included in prop::array::uniform2(any::<bool>()),
        excluded in prop::array::uniform2(any::<bool>()),
    ) {
        let engine = Engine::builder(order_schema()).build().unwrap();
        let customer = Instance::new("Customer").with("id", 5i64).with("name", "Ana");

        let mut serializee = Serializee::new(customer);
        for (idx, name) in CUSTOMER_FIELDS.iter().enumerate() {
            if included[idx] {
                serializee = serializee.include("Customer", *name);
            }
            if excluded[idx] {
                serializee = serializee.exclude("Customer", *name);
            }
        }

        let json = engine.to_tree(&serializee).unwrap();
        for (idx, name) in CUSTOMER_FIELDS.iter().enumerate() {
            let expected = included[idx] || !excluded[idx];
            prop_assert_eq!(json.get(*name).is_some(), expected);
        }
    }

    /// Primitive fields survive a serialize/deserialize cycle unchanged
    #[test]
    fn test_primitive_fields_round_trip(
        id in any::<i64>(),
        name in "\\PC{0,24}",
        street in "[a-zA-Z0-9 ]{1,16}",
    ) {
        let engine = Engine::builder(order_schema()).build().unwrap();
        let customer = Instance::new("Customer")
            .with("id", id)
            .with("name", name.as_str())
            .with("address", Instance::new("Address").with("street", street.as_str()));

        let text = engine
            .serialize(&Serializee::new(customer.clone()).recursive(true))
            .unwrap();
        let bound = engine
            .deserialize_str(&text, &TypeRef::named("Customer"))
            .unwrap();
        prop_assert_eq!(bound, Value::from(customer));
    }
}
