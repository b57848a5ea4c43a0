//! Shared utilities for integration tests.

use std::path::PathBuf;
use path_matcher::config::loader::parse_config;
use path_matcher::config::GatewayConfig;
use path_matcher::routing::RouteTable;

/// A bookstore API route file.
pub const BOOKSTORE: &str = r#"
[matcher]
system_query_parameters = ["key"]

[[routes]]
operation = "ListShelves"
method = "GET"
template = "/v1/shelves"

[[routes]]
operation = "CreateShelf"
method = "POST"
template = "/v1/shelves"
body = "shelf"

[[routes]]
operation = "GetShelf"
method = "GET"
template = "/v1/shelves/{shelf}"

[[routes]]
operation = "GetFeaturedShelf"
method = "GET"
template = "/v1/shelves/featured"

[[routes]]
operation = "GetBook"
method = "GET"
template = "/v1/{name=shelves/*/books/*}"

[[routes]]
operation = "UndeleteShelf"
method = "POST"
template = "/v1/shelves/{shelf}:undelete"

[[routes]]
operation = "Static"
method = "GET"
template = "/static/{path=**}"

[[routes]]
operation = "Anything"
method = "*"
template = "/v1/debug/**"
"#;

pub fn bookstore_config() -> GatewayConfig {
    parse_config(BOOKSTORE).unwrap()
}

pub fn bookstore_table() -> RouteTable {
    RouteTable::from_config(&bookstore_config()).unwrap()
}

/// Config with a single route for `template`, named `operation`.
#[allow(dead_code)]
pub fn single_route(operation: &str, template: &str) -> GatewayConfig {
    parse_config(&format!(
        "[[routes]]\noperation = \"{}\"\nmethod = \"GET\"\ntemplate = \"{}\"\n",
        operation, template
    ))
    .unwrap()
}

/// Write `content` to a file under the temp dir and return its path.
#[allow(dead_code)]
pub fn write_temp_config(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(name);
    std::fs::write(&path, content).unwrap();
    path
}
