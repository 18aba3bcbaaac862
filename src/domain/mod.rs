//! # Domain Layer
//!
//! Billing models, the month walker and the proration arithmetic.
//! This layer is independent of storage and the CLI.

pub mod error;
pub mod models;
pub mod services;

pub use error::*;
pub use models::*;
pub use services::*;
