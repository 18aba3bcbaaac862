mod contract;
mod customer;
mod invoice;
mod reference_month;

pub use contract::*;
pub use customer::*;
pub use invoice::*;
pub use reference_month::*;
