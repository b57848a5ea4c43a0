//! Variable bindings and their query-string form.
//!
//! # Design Decisions
//! - Output order is input order; callers pass bindings in template order
//! - Values are written as-is; path captures are already decoded
//! - Parsing a query string decodes keys and values (lossy UTF-8)

use std::collections::HashSet;
use percent_encoding::percent_decode_str;
use serde::Serialize;

/// A field path and the value extracted for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableBinding {
    pub field_path: Vec<String>,
    pub value: String,
}

impl VariableBinding {
    pub fn new<I, S>(field_path: I, value: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field_path: field_path.into_iter().map(Into::into).collect(),
            value: value.into(),
        }
    }

    /// True when this binding's field path starts with `prefix`.
    pub fn is_under(&self, prefix: &[String]) -> bool {
        self.field_path.starts_with(prefix)
    }
}

/// Render bindings as `a.b=value&c=value`.
///
/// `[{["foo","bar"],"42"}, {["a","b","c"],"xyz"}]` becomes
/// `foo.bar=42&a.b.c=xyz`; no bindings give an empty string.
pub fn to_query_parameters(bindings: &[VariableBinding]) -> String {
    let mut out = String::new();
    for (i, binding) in bindings.iter().enumerate() {
        if i > 0 {
            out.push('&');
        }
        for (j, component) in binding.field_path.iter().enumerate() {
            if j > 0 {
                out.push('.');
            }
            out.push_str(component);
        }
        out.push('=');
        out.push_str(&binding.value);
    }
    out
}

/// Parse a query string into bindings, skipping `system_params`.
///
/// Pairs without '=' or with an empty key are ignored.
pub fn from_query_string(query: &str, system_params: &HashSet<String>) -> Vec<VariableBinding> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter_map(|(key, value)| {
            let key = percent_decode_str(key).decode_utf8_lossy();
            if key.is_empty() || system_params.contains(&*key) {
                return None;
            }
            let value = percent_decode_str(value).decode_utf8_lossy();
            Some(VariableBinding::new(key.split('.'), value.into_owned()))
        })
        .collect()
}
