//! Coercion matrix tests.

use crate::construct::{CoercionError, Primitive, ResolvedType, TypeRegistry, coerce};
use crate::value::Value;

fn prim(p: Primitive) -> ResolvedType {
    ResolvedType::Primitive(p)
}

#[test]
fn identity_coercions() {
    assert_eq!(
        coerce(&Value::Int(3), &prim(Primitive::Int)).unwrap().as_int(),
        Some(3)
    );
    assert_eq!(
        coerce(&Value::Bool(true), &prim(Primitive::Bool))
            .unwrap()
            .as_bool(),
        Some(true)
    );
    assert_eq!(
        coerce(&Value::Str("hi".into()), &prim(Primitive::Str))
            .unwrap()
            .as_str(),
        Some("hi")
    );
}

#[test]
fn text_coercions_parse_the_target() {
    assert_eq!(
        coerce(&Value::Str("41".into()), &prim(Primitive::Int))
            .unwrap()
            .as_int(),
        Some(41)
    );
    assert_eq!(
        coerce(&Value::Str("2.5".into()), &prim(Primitive::Double))
            .unwrap()
            .as_float(),
        Some(2.5)
    );
    assert_eq!(
        coerce(&Value::Str("true".into()), &prim(Primitive::Bool))
            .unwrap()
            .as_bool(),
        Some(true)
    );
    assert!(matches!(
        coerce(&Value::Str("abc".into()), &prim(Primitive::Int)),
        Err(CoercionError::Incompatible { .. })
    ));
}

#[test]
fn integers_widen_to_float_but_not_back() {
    assert_eq!(
        coerce(&Value::Int(4), &prim(Primitive::Float))
            .unwrap()
            .as_float(),
        Some(4.0)
    );
    assert!(matches!(
        coerce(&Value::Float(4.5), &prim(Primitive::Int)),
        Err(CoercionError::Incompatible { .. })
    ));
}

#[test]
fn int_is_range_checked_long_is_not() {
    let big = i64::from(i32::MAX) + 1;
    assert!(matches!(
        coerce(&Value::Int(big), &prim(Primitive::Int)),
        Err(CoercionError::OutOfRange { .. })
    ));
    assert_eq!(
        coerce(&Value::Int(big), &prim(Primitive::Long))
            .unwrap()
            .as_int(),
        Some(big)
    );
}

#[test]
fn numbers_do_not_become_strings() {
    assert!(matches!(
        coerce(&Value::Int(1), &prim(Primitive::Str)),
        Err(CoercionError::Incompatible { .. })
    ));
}

#[test]
fn null_is_valid_for_reference_targets_only() {
    let mut registry = TypeRegistry::new();
    registry.register("Node", |_| {});
    let class = registry.resolve("Node").unwrap();
    let list = registry.resolve("List<int>").unwrap();

    assert!(coerce(&Value::Null, &class).unwrap().is_null());
    assert!(coerce(&Value::Null, &list).unwrap().is_null());
    assert!(matches!(
        coerce(&Value::Null, &prim(Primitive::Int)),
        Err(CoercionError::NullPrimitive { .. })
    ));
}

#[test]
fn class_targets_check_the_instance_type() {
    let mut registry = TypeRegistry::new();
    registry.register("Node", |_| {});
    registry.register("Leaf", |_| {});

    let node_type = registry.resolve("Node").unwrap();
    let node = registry.construct(&node_type, &[]).unwrap();

    assert!(coerce(&node, &node_type).is_ok());
    let leaf_type = registry.resolve("Leaf").unwrap();
    assert!(matches!(
        coerce(&node, &leaf_type),
        Err(CoercionError::Incompatible { .. })
    ));
}

#[test]
fn sequences_match_on_declared_item_type() {
    let mut registry = TypeRegistry::new();
    registry.register("Node", |_| {});
    let int_list = registry.resolve("List<int>").unwrap();
    let long_list = registry.resolve("List<long>").unwrap();

    let empty_ints = int_list.default_value();
    assert!(coerce(&empty_ints, &int_list).is_ok());
    assert!(matches!(
        coerce(&empty_ints, &long_list),
        Err(CoercionError::Incompatible { .. })
    ));
}
