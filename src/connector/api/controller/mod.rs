pub mod generate_controller;
pub mod import_controller;
pub mod invoices_controller;
pub mod stats_controller;

pub use generate_controller::GenerateController;
pub use import_controller::ImportController;
pub use invoices_controller::InvoicesController;
pub use stats_controller::StatsController;
