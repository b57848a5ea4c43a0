//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup or reload):
//!     RouteConfig[]
//!     → template.rs (parse templates into segment keys + variable spans)
//!     → trie.rs (insert under literal / * / ** children)
//!     → router.rs (freeze as RouteTable, publish via atomic swap)
//!
//! Incoming Request (method, path?query):
//!     → segments.rs (strip query, split, extract custom verb, decode)
//!     → matcher.rs (backtracking trie descent)
//!     → bindings.rs (variable bindings, query-string form)
//!     → Return: PathMatch or None
//! ```
//!
//! # Design Decisions
//! - Routes compiled up front, immutable at lookup time
//! - No regex; one trie step per path segment
//! - Deterministic: literal beats `*` beats `**` at every segment

pub mod bindings;
pub mod matcher;
pub mod method;
pub mod router;
pub mod segments;
pub mod template;
mod trie;

pub use bindings::{from_query_string, to_query_parameters, VariableBinding};
pub use matcher::{MatcherOptions, PathMatch, PathMatcher, RegistrationError};
pub use method::Method;
pub use router::{BuildError, RouteOperation, RouteTable, SharedRouteTable};
pub use template::{ParseError, ParseErrorKind, PathSegment, Template};
