use chrono::NaiveDate;
use clap::Subcommand;

use crate::domain::ReferenceMonth;

#[derive(Subcommand)]
pub enum Commands {
    /// Create the invoices that are due for every stored contract
    Generate {
        /// Bill as of this date (YYYY-MM-DD) instead of the system date
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Show what would be invoiced without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Load customers, contracts and services from a JSON feed
    Import {
        path: String,
    },

    /// List stored invoices
    Invoices {
        #[arg(short, long)]
        contract: Option<String>,

        /// Reference month (YYYY-MM)
        #[arg(short, long)]
        month: Option<ReferenceMonth>,
    },

    Stats,
}
