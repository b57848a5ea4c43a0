//! Route table construction and publication.
//!
//! # Responsibilities
//! - Build a path matcher from route configuration
//! - Reject the whole table if any route fails to register
//! - Publish tables through an atomic swap for concurrent readers
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - A new generation replaces the old one wholesale; readers holding a
//!   snapshot keep using it until they drop it
//! - A failed rebuild leaves the active table untouched

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use arc_swap::ArcSwap;
use serde::Serialize;
use thiserror::Error;
use crate::config::schema::GatewayConfig;
use crate::routing::matcher::{MatcherOptions, PathMatch, PathMatcher, RegistrationError};

/// The operation handle stored for each configured route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteOperation {
    pub name: String,
    pub method: String,
    pub template: String,
}

/// A route that failed to register.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("route `{operation}`: {source}")]
pub struct RouteError {
    pub operation: String,
    #[source]
    pub source: RegistrationError,
}

/// Every route that kept a table from being built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("route table rejected: {}", join_route_errors(.errors))]
pub struct BuildError {
    pub errors: Vec<RouteError>,
}

fn join_route_errors(errors: &[RouteError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// One immutable generation of compiled routes.
#[derive(Debug)]
pub struct RouteTable {
    matcher: PathMatcher<RouteOperation>,
}

impl RouteTable {
    /// Compile every configured route.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, BuildError> {
        let options = MatcherOptions {
            max_segments: config.matcher.max_segments,
            system_query_parameters: config
                .matcher
                .system_query_parameters
                .iter()
                .cloned()
                .collect(),
        };
        let mut matcher = PathMatcher::with_options(options);
        let mut errors = Vec::new();

        for route in &config.routes {
            let operation = RouteOperation {
                name: route.operation.clone(),
                method: route.method.to_ascii_uppercase(),
                template: route.template.clone(),
            };
            if let Err(source) = matcher.register_with_body(
                &route.template,
                &route.method,
                route.body.as_deref(),
                operation,
            ) {
                tracing::warn!(operation = %route.operation, error = %source, "Route rejected");
                errors.push(RouteError {
                    operation: route.operation.clone(),
                    source,
                });
            }
        }

        if !errors.is_empty() {
            return Err(BuildError { errors });
        }
        Ok(Self { matcher })
    }

    /// Match a request path, binding path variables and query parameters.
    pub fn lookup(
        &self,
        method: &str,
        path_and_query: &str,
    ) -> Option<PathMatch<'_, RouteOperation>> {
        self.matcher.lookup_with_query(method, path_and_query)
    }

    pub fn matcher(&self) -> &PathMatcher<RouteOperation> {
        &self.matcher
    }

    pub fn len(&self) -> usize {
        self.matcher.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matcher.is_empty()
    }
}

/// The currently active route table, swappable while lookups run.
pub struct SharedRouteTable {
    current: ArcSwap<RouteTable>,
    generation: AtomicU64,
}

impl SharedRouteTable {
    pub fn new(table: RouteTable) -> Self {
        tracing::info!(routes = table.len(), generation = 1, "Route table activated");
        Self {
            current: ArcSwap::from_pointee(table),
            generation: AtomicU64::new(1),
        }
    }

    /// Snapshot of the active table; stays valid across later swaps.
    pub fn load(&self) -> Arc<RouteTable> {
        self.current.load_full()
    }

    /// Publish a fully built table.
    pub fn store(&self, table: RouteTable) {
        let routes = table.len();
        self.current.store(Arc::new(table));
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::info!(routes, generation, "Route table activated");
    }

    /// Rebuild from `config` and publish; on failure the active table stays.
    pub fn reload_from(&self, config: &GatewayConfig) -> Result<(), BuildError> {
        match RouteTable::from_config(config) {
            Ok(table) => {
                self.store(table);
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    generation = self.generation(),
                    "Failed to rebuild route table: {}. Keeping current table.",
                    e
                );
                Err(e)
            }
        }
    }

    /// Number of tables published so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

impl fmt::Debug for SharedRouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedRouteTable")
            .field("generation", &self.generation())
            .field("routes", &self.current.load().len())
            .finish()
    }
}
