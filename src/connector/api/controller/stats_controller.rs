use anyhow::Result;
use rust_decimal::Decimal;

use crate::InvoiceFilter;

use super::super::Container;

pub struct StatsController<'a> {
    container: &'a Container,
}

impl<'a> StatsController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn stats(&self) -> Result<String> {
        let use_case = self.container.list_invoices_use_case();
        let customers = use_case.customers().await?;
        let contracts = use_case.contracts().await?;
        let invoices = use_case.execute(&InvoiceFilter::new()).await?;

        let total_billed: Decimal = invoices.iter().map(|i| i.total_amount()).sum();
        let storage = if self.container.memory_storage() {
            "memory".to_string()
        } else {
            self.container.data_dir().to_string()
        };

        Ok(format!(
            "Billcycle Statistics\n====================\nCustomers:    {}\nContracts:    {}\nInvoices:     {}\nTotal Billed: {}\nData Dir:     {}",
            customers.len(),
            contracts.len(),
            invoices.len(),
            total_billed,
            storage
        ))
    }
}
