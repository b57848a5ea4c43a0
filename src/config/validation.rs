//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (`max_segments > 0`, known log level)
//! - Check each route's operation name, method token and body field path
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Template syntax and duplicate routes are caught when the route table is
//!   built, not here

use thiserror::Error;
use crate::config::schema::GatewayConfig;
use crate::routing::method::Method;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("matcher.max_segments must be greater than zero")]
    ZeroMaxSegments,

    #[error("unknown log level `{0}`")]
    InvalidLogLevel(String),

    #[error("route #{index} has an empty operation name")]
    EmptyOperation { index: usize },

    #[error("route `{operation}` has invalid method `{method}`")]
    InvalidMethod { operation: String, method: String },

    #[error("route `{operation}` has invalid body field path `{body}`")]
    InvalidBodyFieldPath { operation: String, body: String },
}

/// Validate a deserialized configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.matcher.max_segments == 0 {
        errors.push(ValidationError::ZeroMaxSegments);
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    for (index, route) in config.routes.iter().enumerate() {
        if route.operation.trim().is_empty() {
            errors.push(ValidationError::EmptyOperation { index });
        }
        if Method::parse(&route.method).is_err() {
            errors.push(ValidationError::InvalidMethod {
                operation: route.operation.clone(),
                method: route.method.clone(),
            });
        }
        if let Some(body) = &route.body {
            if !is_body_field_path(body) {
                errors.push(ValidationError::InvalidBodyFieldPath {
                    operation: route.operation.clone(),
                    body: body.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_body_field_path(body: &str) -> bool {
    body == "*"
        || body.split('.').all(|component| {
            !component.is_empty()
                && component.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteConfig;

    fn route(operation: &str, method: &str, body: Option<&str>) -> RouteConfig {
        RouteConfig {
            operation: operation.to_string(),
            method: method.to_string(),
            template: "/a".to_string(),
            body: body.map(str::to_string),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.matcher.max_segments = 0;
        config.observability.log_level = "loud".to_string();
        config.routes = vec![
            route("", "GET", None),
            route("Bad", "G T", Some("a..b")),
            route("Good", "*", Some("*")),
        ];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::ZeroMaxSegments,
                ValidationError::InvalidLogLevel("loud".to_string()),
                ValidationError::EmptyOperation { index: 0 },
                ValidationError::InvalidMethod {
                    operation: "Bad".to_string(),
                    method: "G T".to_string(),
                },
                ValidationError::InvalidBodyFieldPath {
                    operation: "Bad".to_string(),
                    body: "a..b".to_string(),
                },
            ]
        );
    }
}
