//! # Connector Layer
//!
//! External integrations implementing application ports:
//! - Storage (DuckDB, with an in-memory variant for dry runs and tests)
//! - Clocks and the JSON contract feed
//! - The CLI-facing API (container, router, controllers)

pub mod adapter;
pub mod api;

pub use adapter::*;
pub use api::*;
