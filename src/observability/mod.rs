//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Routing and config subsystems produce:
//!     → tracing events (registration, reload, rejected routes, misses)
//!
//! Consumers:
//!     → logging.rs subscriber (stderr, filtered by RUST_LOG or config)
//! ```
//!
//! # Design Decisions
//! - Structured fields (template, method, generation) for machine parsing
//! - Lookup misses log at trace level only; they are the common case

pub mod logging;
