mod clock;
mod contract_repository;
mod invoice_repository;

pub use clock::*;
pub use contract_repository::*;
pub use invoice_repository::*;
