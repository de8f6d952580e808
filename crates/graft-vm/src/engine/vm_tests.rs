//! Execution tests: instruction streams in, object graphs out.
//!
//! Streams are written in the wire text form and tokenized, which keeps the
//! fixtures readable and exercises the tokenizer contract on the way in.

use indoc::indoc;

use graft_bytecode::tokenize;

use crate::construct::{CoercionError, ConstructError, TypeRegistry};
use crate::engine::{RuntimeError, VM};
use crate::value::{Value, deep_eq};

fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();

    registry.register("Point", |t| {
        t.field("x", "int").field("y", "int");
        t.ctor(&["int", "int"], |obj, args| {
            obj.set("x", args[0].clone());
            obj.set("y", args[1].clone());
            Ok(())
        });
    });

    registry.register("Node", |t| {
        t.field("next", "Node").field("name", "string");
    });

    registry.register("Box", |t| {
        t.field("nums", "List<int>")
            .field("nodes", "List<Node>")
            .field("table", "Map<string,int>");
    });

    registry.register("Counter", |t| {
        t.field("count", "int");
        t.method("bump", |obj, args| {
            let step = args.first().and_then(Value::as_int).unwrap_or(1);
            let current = obj.field("count").as_int().unwrap_or(0);
            obj.set("count", Value::Int(current + step));
            Ok(())
        });
    });

    registry.register("Circle", |t| {
        t.field("radius", "double");
        t.ctor(&["double"], |obj, args| {
            obj.set("radius", args[0].clone());
            Ok(())
        });
    });

    registry
}

fn run(registry: &TypeRegistry, text: &str) -> Result<Value, RuntimeError> {
    let stream = tokenize(text).expect("fixture tokenizes");
    VM::new(registry).execute(&stream)
}

fn field(value: &Value, name: &str) -> Value {
    value.as_object().expect("object value").borrow().field(name)
}

#[test]
fn flat_object_built_from_constructor_args() {
    let registry = registry();
    let root = run(&registry, indoc! {"
        PUSH 1
        PUSH 2
        DEFINE Point p1 2
        END p1
        RET p1
    "})
    .unwrap();
    assert_eq!(field(&root, "x").as_int(), Some(1));
    assert_eq!(field(&root, "y").as_int(), Some(2));
}

#[test]
fn self_reference_defers_until_own_end() {
    let registry = registry();
    let root = run(&registry, indoc! {"
        DEFINE Node n1 0
        SET next _ref(n1)
        END n1
        RET n1
    "})
    .unwrap();
    assert!(Value::same_object(&field(&root, "next"), &root));
}

#[test]
fn primitive_list_binds_through_the_stack() {
    let registry = registry();
    let root = run(&registry, indoc! {"
        DEFINE Box b 0
        LIST_START int
        ELEMENT 1
        ELEMENT 2
        ELEMENT 3
        LIST_END
        SET nums _stack()
        END b
        RET b
    "})
    .unwrap();
    let nums = field(&root, "nums");
    let seq = nums.as_seq().unwrap().borrow();
    let items: Vec<_> = seq.items.iter().map(|v| v.as_int().unwrap()).collect();
    assert_eq!(items, [1, 2, 3]);
}

#[test]
fn forward_reference_resolves_both_directions() {
    let registry = registry();
    let root = run(&registry, indoc! {"
        DEFINE Node a 0
        SET next _ref(b)
        END a
        DEFINE Node b 0
        SET next _ref(a)
        END b
        RET a
    "})
    .unwrap();
    let b = field(&root, "next");
    assert!(!b.is_null(), "forward reference must land");
    assert!(Value::same_object(&field(&b, "next"), &root));
}

#[test]
fn reference_to_open_ancestor_defers() {
    let registry = registry();
    let root = run(&registry, indoc! {"
        DEFINE Node outer 0
        DEFINE Node inner 0
        SET next _ref(outer)
        END inner
        SET next _ref(inner)
        END outer
        RET outer
    "})
    .unwrap();
    let inner = field(&root, "next");
    assert!(Value::same_object(&field(&inner, "next"), &root));
}

#[test]
fn empty_list_is_a_collection_not_null() {
    let registry = registry();
    let root = run(&registry, indoc! {"
        DEFINE Box b 0
        LIST_START int
        LIST_END
        SET nums _stack()
        END b
        RET b
    "})
    .unwrap();
    let nums = field(&root, "nums");
    assert!(!nums.is_null());
    assert_eq!(nums.as_seq().unwrap().borrow().items.len(), 0);
}

#[test]
fn two_type_list_pairs_into_a_map() {
    let registry = registry();
    let root = run(&registry, indoc! {r#"
        DEFINE Box b 0
        LIST_START string int
        ELEMENT "a"
        ELEMENT 1
        ELEMENT "b"
        ELEMENT 2
        LIST_END
        SET table _stack()
        END b
        RET b
    "#})
    .unwrap();
    let table = field(&root, "table");
    let map = table.as_map().unwrap().borrow();
    assert_eq!(map.entries.len(), 2);
    assert_eq!(map.entries[0].0.as_str(), Some("a"));
    assert_eq!(map.entries[0].1.as_int(), Some(1));
    assert_eq!(map.entries[1].0.as_str(), Some("b"));
    assert_eq!(map.entries[1].1.as_int(), Some(2));
}

#[test]
fn odd_map_element_count_is_fatal() {
    let registry = registry();
    let err = run(&registry, indoc! {r#"
        DEFINE Box b 0
        LIST_START string int
        ELEMENT "a"
        LIST_END
        SET table _stack()
        END b
        RET b
    "#})
    .unwrap_err();
    assert!(matches!(err, RuntimeError::OddMapElements(1)));
}

#[test]
fn deferred_element_lands_in_the_finished_sequence() {
    let registry = registry();
    let root = run(&registry, indoc! {"
        DEFINE Box b 0
        LIST_START Node
        ELEMENT _ref(n)
        LIST_END
        SET nodes _stack()
        DEFINE Node n 0
        SET name \"filled in later\"
        END n
        END b
        RET b
    "})
    .unwrap();
    let nodes = field(&root, "nodes");
    let seq = nodes.as_seq().unwrap().borrow();
    assert_eq!(seq.items.len(), 1);
    assert_eq!(field(&seq.items[0], "name").as_str(), Some("filled in later"));
}

#[test]
fn set_coerces_against_declared_member_type() {
    let registry = registry();
    // Text coercion into a declared int member.
    let root = run(&registry, indoc! {r#"
        DEFINE Point p 0
        SET x "12"
        END p
        RET p
    "#})
    .unwrap();
    assert_eq!(field(&root, "x").as_int(), Some(12));

    // A decimal cannot narrow into an int member.
    let err = run(&registry, indoc! {"
        DEFINE Point p 0
        SET x 1.5
        END p
        RET p
    "})
    .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Coercion(CoercionError::Incompatible { .. })
    ));
}

#[test]
fn null_into_primitive_member_is_fatal() {
    let registry = registry();
    let err = run(&registry, indoc! {"
        DEFINE Point p 0
        SET x null
        END p
        RET p
    "})
    .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Coercion(CoercionError::NullPrimitive { .. })
    ));
}

#[test]
fn default_marker_takes_the_declared_default() {
    let registry = registry();
    let root = run(&registry, indoc! {"
        DEFINE Node n 0
        SET name default
        SET next default
        END n
        RET n
    "})
    .unwrap();
    assert_eq!(field(&root, "name").as_str(), Some(""));
    assert!(field(&root, "next").is_null());
}

#[test]
fn constructor_arguments_pop_in_original_order() {
    let registry = registry();
    let root = run(&registry, indoc! {"
        PUSH 3
        PUSH 4
        DEFINE Point p 2
        END p
        RET p
    "})
    .unwrap();
    assert_eq!(field(&root, "x").as_int(), Some(3));
    assert_eq!(field(&root, "y").as_int(), Some(4));
}

#[test]
fn pushed_integer_widens_into_double_parameter() {
    let registry = registry();
    let root = run(&registry, indoc! {"
        PUSH 2
        DEFINE Circle c 1
        END c
        RET c
    "})
    .unwrap();
    assert_eq!(field(&root, "radius").as_float(), Some(2.0));
}

#[test]
fn call_invokes_registered_method_with_popped_args() {
    let registry = registry();
    let root = run(&registry, indoc! {"
        DEFINE Counter c 0
        PUSH 5
        CALL bump 1
        PUSH 2
        CALL bump 1
        END c
        RET c
    "})
    .unwrap();
    assert_eq!(field(&root, "count").as_int(), Some(7));
}

#[test]
fn call_to_unknown_method_is_fatal() {
    let registry = registry();
    let err = run(&registry, indoc! {"
        DEFINE Counter c 0
        CALL vanish 0
        END c
        RET c
    "})
    .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Construct(ConstructError::UnknownMethod { .. })
    ));
}

#[test]
fn ret_accepts_the_stack_marker() {
    let registry = registry();
    let root = run(&registry, indoc! {"
        DEFINE Point a 0
        END a
        DEFINE Point b 0
        END b
        LIST_START Point
        ELEMENT _ref(a)
        ELEMENT _ref(b)
        LIST_END
        RET _stack()
    "})
    .unwrap();
    assert_eq!(root.as_seq().unwrap().borrow().items.len(), 2);
}

#[test]
fn duplicate_define_is_fatal() {
    let registry = registry();
    let err = run(&registry, indoc! {"
        DEFINE Point p 0
        END p
        DEFINE Point p 0
        END p
        RET p
    "})
    .unwrap_err();
    assert!(matches!(err, RuntimeError::DuplicateDefine(id) if id == "p"));
}

#[test]
fn end_must_match_the_innermost_open_scope() {
    let registry = registry();
    let err = run(&registry, indoc! {"
        DEFINE Node a 0
        DEFINE Node b 0
        END a
        END b
        RET a
    "})
    .unwrap_err();
    let RuntimeError::ScopeMismatch { expected, found } = err else {
        panic!("expected a scope mismatch");
    };
    assert_eq!(expected, "b");
    assert_eq!(found, "a");

    let err = run(&registry, "END ghost\nRET ghost\n").unwrap_err();
    assert!(matches!(err, RuntimeError::EndWithoutScope(_)));
}

#[test]
fn ret_to_unknown_id_is_fatal() {
    let registry = registry();
    let err = run(&registry, "RET ghost\n").unwrap_err();
    assert!(matches!(err, RuntimeError::UnknownReturnId(id) if id == "ghost"));
}

#[test]
fn orphaned_dispatched_reference_is_fatal() {
    let registry = registry();
    let err = run(&registry, indoc! {"
        DEFINE Node n 0
        SET next _ref(ghost)
        END n
        RET n
    "})
    .unwrap_err();
    let RuntimeError::UnresolvedReferences { count, first } = err else {
        panic!("expected unresolved references");
    };
    assert_eq!(count, 1);
    assert_eq!(first, "ghost");
}

#[test]
fn stream_without_ret_is_fatal() {
    let registry = registry();
    let err = run(&registry, "DEFINE Point p 0\nEND p\n").unwrap_err();
    assert!(matches!(err, RuntimeError::MissingReturn));
}

#[test]
fn define_with_missing_stack_args_is_fatal() {
    let registry = registry();
    let err = run(&registry, "DEFINE Point p 2\nEND p\nRET p\n").unwrap_err();
    assert!(matches!(err, RuntimeError::StackUnderflow));
}

#[test]
fn no_matching_constructor_is_fatal() {
    let registry = registry();
    let err = run(&registry, indoc! {r#"
        PUSH "a"
        PUSH "b"
        DEFINE Point p 2
        END p
        RET p
    "#})
    .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Construct(ConstructError::NoMatch { .. })
    ));
}

#[test]
fn executing_twice_yields_equal_but_distinct_graphs() {
    let registry = registry();
    let text = indoc! {"
        DEFINE Node n1 0
        SET name \"head\"
        SET next _ref(n1)
        END n1
        RET n1
    "};
    let first = run(&registry, text).unwrap();
    let second = run(&registry, text).unwrap();
    assert!(deep_eq(&first, &second));
    assert!(!Value::same_object(&first, &second));
}
