//! Configuration schema definitions.
//!
//! This module defines the route table file. All types derive Serde traits
//! for deserialization from TOML.

use serde::{Deserialize, Serialize};
use crate::routing::matcher::DEFAULT_MAX_SEGMENTS;

/// Root configuration for the path matcher.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Lookup tuning.
    pub matcher: MatcherConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,

    /// Registered operations, in registration order.
    pub routes: Vec<RouteConfig>,
}

/// Matcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Request paths with more segments than this never match.
    pub max_segments: usize,

    /// Query keys reserved by the gateway; never turned into bindings.
    pub system_query_parameters: Vec<String>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_segments: DEFAULT_MAX_SEGMENTS,
            system_query_parameters: vec!["api_key".to_string(), "key".to_string()],
        }
    }
}

/// One operation bound to a method and path template.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Operation name reported on match.
    pub operation: String,

    /// HTTP method, or `*` for any.
    #[serde(default = "default_method")]
    pub method: String,

    /// Path template, e.g. `/v1/shelves/{shelf}/books/{book=**}`.
    pub template: String,

    /// Field path the request body maps to (`*` for the whole message).
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "*".to_string()
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
