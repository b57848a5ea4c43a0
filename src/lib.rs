//! API gateway path matcher.
//!
//! Compiles URL path templates (`/v1/{name=shelves/*}/books/{book}:publish`)
//! into a segment trie and matches request paths against it, extracting
//! variable bindings.

pub mod config;
pub mod observability;
pub mod routing;

pub use config::schema::GatewayConfig;
pub use routing::{PathMatch, PathMatcher, RouteTable, SharedRouteTable, VariableBinding};
