//! End-to-end matching against a configured route table.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use path_matcher::routing::{
    to_query_parameters, PathMatcher, RouteTable, SharedRouteTable, VariableBinding,
};

mod common;

fn operation(table: &RouteTable, method: &str, path: &str) -> Option<String> {
    table.lookup(method, path).map(|found| found.operation.name.clone())
}

#[test]
fn test_literal_routes_match_without_bindings() {
    let table = common::bookstore_table();

    let found = table.lookup("GET", "/v1/shelves").unwrap();
    assert_eq!(found.operation.name, "ListShelves");
    assert!(found.bindings.is_empty());

    let found = table.lookup("POST", "/v1/shelves").unwrap();
    assert_eq!(found.operation.name, "CreateShelf");
    assert_eq!(found.body_field_path, Some("shelf"));
}

#[test]
fn test_literal_shadows_capture() {
    let table = common::bookstore_table();
    assert_eq!(
        operation(&table, "GET", "/v1/shelves/featured").as_deref(),
        Some("GetFeaturedShelf")
    );

    let found = table.lookup("GET", "/v1/shelves/42").unwrap();
    assert_eq!(found.operation.name, "GetShelf");
    assert_eq!(found.bindings, vec![VariableBinding::new(["shelf"], "42")]);
}

#[test]
fn test_multi_segment_variable() {
    let table = common::bookstore_table();
    let found = table.lookup("GET", "/v1/shelves/s1/books/b2").unwrap();
    assert_eq!(found.operation.name, "GetBook");
    assert_eq!(found.query_parameters(), "name=shelves/s1/books/b2");
}

#[test]
fn test_custom_verb_routes() {
    let table = common::bookstore_table();
    let found = table.lookup("POST", "/v1/shelves/7:undelete").unwrap();
    assert_eq!(found.operation.name, "UndeleteShelf");
    assert_eq!(found.bindings, vec![VariableBinding::new(["shelf"], "7")]);

    assert_eq!(operation(&table, "POST", "/v1/shelves/7"), None);
    assert_eq!(operation(&table, "GET", "/v1/shelves/7:undelete"), None);
}

#[test]
fn test_static_tree() {
    let table = common::bookstore_table();
    let found = table.lookup("GET", "/static/css/site%20main.css").unwrap();
    assert_eq!(found.operation.name, "Static");
    assert_eq!(found.bindings, vec![VariableBinding::new(["path"], "css/site main.css")]);

    assert_eq!(operation(&table, "GET", "/static"), None);
}

#[test]
fn test_any_method_route() {
    let table = common::bookstore_table();
    for method in ["GET", "DELETE", "PATCH", "options"] {
        assert_eq!(operation(&table, method, "/v1/debug/a/b").as_deref(), Some("Anything"));
    }
}

#[test]
fn test_not_found() {
    let table = common::bookstore_table();
    assert_eq!(operation(&table, "GET", "/v2/shelves"), None);
    assert_eq!(operation(&table, "DELETE", "/v1/shelves"), None);
    assert_eq!(operation(&table, "GET", "/v1//shelves"), None);
    assert_eq!(operation(&table, "GET", "v1/shelves"), None);
}

#[test]
fn test_query_bindings() {
    let table = common::bookstore_table();
    let found = table
        .lookup("GET", "/v1/shelves/3?key=abc&shelf=9&view.mode=full%20text")
        .unwrap();
    assert_eq!(
        found.bindings,
        vec![
            VariableBinding::new(["shelf"], "3"),
            VariableBinding::new(["view", "mode"], "full text"),
        ]
    );
}

#[test]
fn test_bindings_by_construction() {
    let mut matcher = PathMatcher::new();
    matcher.register("/{a}/{b=*}/{c=**}", "GET", "op").unwrap();

    let heads = ["x", "item-1", "caf%C3%A9"];
    let tails: [&[&str]; 3] = [&["z1"], &["z1", "z2"], &["z1", "z2", "z3", "z4"]];
    for a in heads {
        for tail in tails {
            let path = format!("/{}/y/{}", a, tail.join("/"));
            let found = matcher.lookup("GET", &path).unwrap();
            let decoded_a = percent_encoding::percent_decode_str(a).decode_utf8().unwrap();
            assert_eq!(
                found.bindings,
                vec![
                    VariableBinding::new(["a"], decoded_a.into_owned()),
                    VariableBinding::new(["b"], "y"),
                    VariableBinding::new(["c"], tail.join("/")),
                ],
                "path {}",
                path
            );
        }
    }
}

#[test]
fn test_query_string_contract() {
    let bindings = vec![
        VariableBinding::new(["foo", "bar"], "42"),
        VariableBinding::new(["a", "b", "c"], "xyz"),
    ];
    assert_eq!(to_query_parameters(&bindings), "foo.bar=42&a.b.c=xyz");
    assert_eq!(to_query_parameters(&[]), "");
}

#[test]
fn test_concurrent_lookups_across_swaps() {
    let shared = Arc::new(SharedRouteTable::new(
        RouteTable::from_config(&common::single_route("Gen", "/items/{id}")).unwrap(),
    ));
    let stop = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            let stop = stop.clone();
            thread::spawn(move || {
                let mut lookups = 0u64;
                loop {
                    let table = shared.load();
                    let found = table
                        .lookup("GET", "/items/7")
                        .expect("every generation routes /items/{id}");
                    assert_eq!(found.bindings, vec![VariableBinding::new(["id"], "7")]);
                    lookups += 1;
                    if stop.load(Ordering::Relaxed) {
                        return lookups;
                    }
                }
            })
        })
        .collect();

    for i in 0..50 {
        let config = common::single_route(&format!("Gen{}", i), "/items/{id}");
        shared.reload_from(&config).unwrap();
    }
    stop.store(true, Ordering::Relaxed);

    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }
    assert_eq!(shared.generation(), 51);
    assert_eq!(shared.load().lookup("GET", "/items/1").unwrap().operation.name, "Gen49");
}
