//! Recursive schema tests

use schemata_ast::schema::{array, lazy, null, number, string, struct_of, tuple_of, union};
use schemata_ast::transforms::number_from_string;
use schemata_ast::{Ast, ParseOptions};
use schemata_parse::{decode, encode, format_expected};
use schemata_value::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};
use std::thread;

fn obj(members: Vec<(&str, Value)>) -> Value {
    Value::object(members)
}

static TREE_CALLS: AtomicUsize = AtomicUsize::new(0);

/// `{ a: string, as: Tree[] }`, counting thunk runs
fn tree() -> Ast {
    static TREE: LazyLock<Ast> = LazyLock::new(|| {
        lazy(|| {
            TREE_CALLS.fetch_add(1, Ordering::SeqCst);
            struct_of([("a", string()), ("as", array(tree()))]).unwrap()
        })
    });
    TREE.clone()
}

#[test]
fn test_thunk_runs_once() {
    let ast = tree();
    let leaf = obj(vec![("a", Value::from("a1")), ("as", Value::array([]))]);
    let nested = obj(vec![
        ("a", Value::from("a1")),
        (
            "as",
            Value::array([obj(vec![("a", Value::from("a2")), ("as", Value::array([]))])]),
        ),
    ]);
    assert!(decode(&ast, &leaf, ParseOptions::default()).is_ok());
    assert!(decode(&ast, &nested, ParseOptions::default()).is_ok());
    assert_eq!(TREE_CALLS.load(Ordering::SeqCst), 1);
}

static SHARED_CALLS: AtomicUsize = AtomicUsize::new(0);

fn shared() -> Ast {
    static SHARED: LazyLock<Ast> = LazyLock::new(|| {
        lazy(|| {
            SHARED_CALLS.fetch_add(1, Ordering::SeqCst);
            struct_of([("value", number()), ("next", union([shared(), null()]))]).unwrap()
        })
    });
    SHARED.clone()
}

#[test]
fn test_thunk_runs_once_across_threads() {
    let ast = Arc::new(shared());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let ast = Arc::clone(&ast);
            thread::spawn(move || {
                let input = obj(vec![
                    ("value", Value::from(i)),
                    (
                        "next",
                        obj(vec![("value", Value::from(i + 1)), ("next", Value::Null)]),
                    ),
                ]);
                decode(&ast, &input, ParseOptions::default()).is_ok()
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert_eq!(SHARED_CALLS.load(Ordering::SeqCst), 1);
}

/// `{ prop: NumberFromString | Node }`
fn node() -> Ast {
    static NODE: LazyLock<Ast> = LazyLock::new(|| {
        lazy(|| struct_of([("prop", union([number_from_string(string()), node()]))]).unwrap())
    });
    NODE.clone()
}

#[test]
fn test_from_side_of_recursive_schema() {
    let from = node().from_side();
    let flat = obj(vec![("prop", Value::from("a"))]);
    let deep = obj(vec![("prop", obj(vec![("prop", Value::from("a"))]))]);
    assert_eq!(decode(&from, &flat, ParseOptions::default()).unwrap(), flat);
    assert_eq!(decode(&from, &deep, ParseOptions::default()).unwrap(), deep);
}

#[test]
fn test_recursive_transform_round_trip() {
    let ast = node();
    let encoded = obj(vec![("prop", obj(vec![("prop", Value::from("1"))]))]);
    let decoded = decode(&ast, &encoded, ParseOptions::default()).unwrap();
    assert_eq!(
        decoded,
        obj(vec![("prop", obj(vec![("prop", Value::from(1))]))])
    );
    assert_eq!(encode(&ast, &decoded, ParseOptions::default()).unwrap(), encoded);
}

#[test]
fn test_anonymous_lazy_label() {
    let ast = lazy(|| tuple_of([number(), null()]));
    assert_eq!(format_expected(&ast), "<anonymous lazy schema>");
    assert_eq!(
        format_expected(&ast.with_identifier("List")),
        "List"
    );
}
