//! Template registration and request lookup.
//!
//! # Responsibilities
//! - Compile and register templates under a method and custom verb
//! - Unregister templates, keeping the trie pruned
//! - Match a request path and extract variable bindings
//!
//! # Design Decisions
//! - Lookups take `&self` and never allocate trie state (safe to share)
//! - No match is `None`, not an error
//! - Request paths longer than `max_segments` are not matched; this bounds
//!   the recursion depth
//! - A custom verb is only split off a request path when some template
//!   registered it

use std::collections::{HashMap, HashSet};
use thiserror::Error;
use crate::routing::bindings::{from_query_string, to_query_parameters, VariableBinding};
use crate::routing::method::{InvalidMethod, Method};
use crate::routing::segments::{split_path, DecodedSegment};
use crate::routing::template::{ParseError, SpanEnd, Template};
use crate::routing::trie::{Entry, Node};

/// Default upper bound on request path segments.
pub const DEFAULT_MAX_SEGMENTS: usize = 64;

/// Errors raised while registering or unregistering a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Method(#[from] InvalidMethod),

    /// The `(template, method, verb)` slot already holds an operation.
    #[error("duplicate registration of {method} {template}")]
    Duplicate { template: String, method: String, verb: String },

    #[error("no operation registered for {method} {template}")]
    NotRegistered { template: String, method: String },
}

/// Lookup tuning.
#[derive(Debug, Clone)]
pub struct MatcherOptions {
    /// Paths with more segments than this never match.
    pub max_segments: usize,
    /// Query keys that never become bindings.
    pub system_query_parameters: HashSet<String>,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self {
            max_segments: DEFAULT_MAX_SEGMENTS,
            system_query_parameters: HashSet::new(),
        }
    }
}

/// A successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch<'a, T> {
    pub operation: &'a T,
    /// Bindings in template declaration order, then query bindings.
    pub bindings: Vec<VariableBinding>,
    pub body_field_path: Option<&'a str>,
}

impl<T> PathMatch<'_, T> {
    /// The bindings rendered by [`to_query_parameters`].
    pub fn query_parameters(&self) -> String {
        to_query_parameters(&self.bindings)
    }
}

/// Trie-based matcher from `(method, path)` to a registered operation.
#[derive(Debug)]
pub struct PathMatcher<T> {
    root: Node<T>,
    custom_verbs: HashMap<String, usize>,
    options: MatcherOptions,
    len: usize,
}

impl<T> Default for PathMatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PathMatcher<T> {
    pub fn new() -> Self {
        Self::with_options(MatcherOptions::default())
    }

    pub fn with_options(options: MatcherOptions) -> Self {
        Self {
            root: Node::default(),
            custom_verbs: HashMap::new(),
            options,
            len: 0,
        }
    }

    /// Register `operation` for `method` (`*` for any) on `template`.
    pub fn register(
        &mut self,
        template: &str,
        method: &str,
        operation: T,
    ) -> Result<(), RegistrationError> {
        self.register_with_body(template, method, None, operation)
    }

    /// Register with the field path the request body maps to (`*` for the whole message).
    pub fn register_with_body(
        &mut self,
        template: &str,
        method: &str,
        body_field_path: Option<&str>,
        operation: T,
    ) -> Result<(), RegistrationError> {
        let template = Template::parse(template)?;
        let method = Method::parse(method)?;
        let verb = template.verb().unwrap_or_default().to_string();
        let keys = template.keys().to_vec();
        let canonical = template.to_string();

        let entry = Entry {
            operation,
            template,
            body_field_path: body_field_path.map(str::to_string),
        };
        if self.root.insert(&keys, &method, &verb, entry).is_err() {
            return Err(RegistrationError::Duplicate {
                template: canonical,
                method: method.to_string(),
                verb,
            });
        }

        if !verb.is_empty() {
            *self.custom_verbs.entry(verb).or_insert(0) += 1;
        }
        self.len += 1;
        tracing::debug!(template = %canonical, method = %method, "Registered path template");
        Ok(())
    }

    /// Remove the operation registered for `method` on `template` and return it.
    pub fn unregister(&mut self, template: &str, method: &str) -> Result<T, RegistrationError> {
        let parsed = Template::parse(template)?;
        let method = Method::parse(method)?;
        let verb = parsed.verb().unwrap_or_default();

        let entry = self
            .root
            .remove(parsed.keys(), &method, verb)
            .ok_or_else(|| RegistrationError::NotRegistered {
                template: template.to_string(),
                method: method.to_string(),
            })?;

        if let Some(count) = self.custom_verbs.get_mut(verb) {
            *count -= 1;
            if *count == 0 {
                self.custom_verbs.remove(verb);
            }
        }
        self.len -= 1;
        tracing::debug!(template = %parsed, method = %method, "Unregistered path template");
        Ok(entry.operation)
    }

    /// Match a request path (query and fragment are ignored).
    pub fn lookup(&self, method: &str, path: &str) -> Option<PathMatch<'_, T>> {
        let (segments, verb) = split_path(path, |v| self.custom_verbs.contains_key(v))?;
        self.match_segments(method, &segments, verb)
    }

    /// Match a request path and also bind its query parameters.
    ///
    /// Query bindings follow the path bindings. A query key is dropped when
    /// the path or an earlier query pair already bound it, when it is a
    /// system parameter, or when it falls under the operation's body field
    /// path.
    pub fn lookup_with_query(
        &self,
        method: &str,
        path_and_query: &str,
    ) -> Option<PathMatch<'_, T>> {
        let mut found = self.lookup(method, path_and_query)?;
        let query = match path_and_query.split('#').next().and_then(|p| p.split_once('?')) {
            Some((_, query)) if !query.is_empty() => query,
            _ => return Some(found),
        };
        if found.body_field_path == Some("*") {
            return Some(found);
        }

        let body: Option<Vec<String>> = found
            .body_field_path
            .map(|b| b.split('.').map(str::to_string).collect());
        // First occurrence wins, and path bindings come before any query key.
        let mut bound: HashSet<Vec<String>> =
            found.bindings.iter().map(|b| b.field_path.clone()).collect();
        let extra: Vec<VariableBinding> =
            from_query_string(query, &self.options.system_query_parameters)
                .into_iter()
                .filter(|binding| body.as_ref().map_or(true, |body| !binding.is_under(body)))
                .filter(|binding| bound.insert(binding.field_path.clone()))
                .collect();
        found.bindings.extend(extra);
        Some(found)
    }

    /// Match already-split raw segments plus a custom verb ("" for none).
    pub fn match_segments(
        &self,
        method: &str,
        segments: &[&str],
        verb: &str,
    ) -> Option<PathMatch<'_, T>> {
        if segments.len() > self.options.max_segments {
            tracing::trace!(
                segments = segments.len(),
                max_segments = self.options.max_segments,
                "Request path too deep, not matching"
            );
            return None;
        }

        let decoded: Vec<DecodedSegment<'_>> =
            segments.iter().map(|s| DecodedSegment::new(s)).collect();
        let method = method.to_ascii_uppercase();
        let Some(entry) = self.root.find(&decoded, &method, verb) else {
            tracing::trace!(method = %method, segments = segments.len(), "No template matched");
            return None;
        };

        Some(PathMatch {
            operation: &entry.operation,
            bindings: bind_variables(&entry.template, &decoded),
            body_field_path: entry.body_field_path.as_deref(),
        })
    }

    /// Number of registered operations.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn options(&self) -> &MatcherOptions {
        &self.options
    }

    /// Whether some registered template uses `verb`.
    pub fn has_custom_verb(&self, verb: &str) -> bool {
        self.custom_verbs.contains_key(verb)
    }
}

/// Recover variable values from the segments a template matched.
fn bind_variables(template: &Template, segments: &[DecodedSegment<'_>]) -> Vec<VariableBinding> {
    template
        .variables()
        .iter()
        .map(|span| {
            let end = match span.end {
                SpanEnd::At(end) => end,
                SpanEnd::PathEnd => segments.len(),
            };
            let covered = &segments[span.start..end];
            let value = match (span.end, covered) {
                (SpanEnd::At(_), [single]) => single.capture().to_string(),
                (_, many) => many
                    .iter()
                    .map(DecodedSegment::capture_keeping_slash)
                    .collect::<Vec<_>>()
                    .join("/"),
            };
            VariableBinding {
                field_path: span.field_path.clone(),
                value,
            }
        })
        .collect()
}
