//! HTTP method keys for registered operations.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Token that registers an operation for every method.
pub const ANY_METHOD: &str = "*";

/// The method an operation is registered under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// Answers any request method without an exact registration of its own.
    Any,
    /// An upper-cased method name such as `GET`.
    Exact(String),
}

/// Rejected method token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid HTTP method `{0}`")]
pub struct InvalidMethod(pub String);

impl Method {
    /// Parse a method token; `*` is the any-method marker.
    pub fn parse(token: &str) -> Result<Self, InvalidMethod> {
        if token == ANY_METHOD {
            return Ok(Method::Any);
        }
        if token.is_empty() || !token.chars().all(is_tchar) {
            return Err(InvalidMethod(token.to_string()));
        }
        Ok(Method::Exact(token.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Any => ANY_METHOD,
            Method::Exact(name) => name,
        }
    }
}

impl FromStr for Method {
    type Err = InvalidMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// RFC 9110 token characters.
fn is_tchar(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}
