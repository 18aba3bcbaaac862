//! # Application Layer
//!
//! Ports and the use cases that drive the billing domain through them.

pub mod interfaces;
pub mod use_cases;

pub use interfaces::*;
pub use use_cases::*;
