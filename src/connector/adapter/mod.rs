mod clock;
mod duckdb_contract_repository;
mod duckdb_invoice_repository;
mod in_memory_billing_repository;
mod json_contract_feed;

pub use clock::*;
pub use duckdb_contract_repository::*;
pub use duckdb_invoice_repository::*;
pub use in_memory_billing_repository::*;
pub use json_contract_feed::*;
