mod generate_invoices;
mod import_contracts;
mod list_invoices;

pub use generate_invoices::*;
pub use import_contracts::*;
pub use list_invoices::*;
