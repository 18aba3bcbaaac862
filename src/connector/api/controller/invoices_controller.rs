use anyhow::Result;

use crate::{Invoice, InvoiceFilter, ReferenceMonth};

use super::super::Container;

pub struct InvoicesController<'a> {
    container: &'a Container,
}

impl<'a> InvoicesController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn list(
        &self,
        contract: Option<String>,
        month: Option<ReferenceMonth>,
    ) -> Result<String> {
        let mut filter = InvoiceFilter::new();
        if let Some(contract) = contract {
            filter = filter.with_contract(contract);
        }
        if let Some(month) = month {
            filter = filter.with_month(month);
        }

        let invoices = self
            .container
            .list_invoices_use_case()
            .execute(&filter)
            .await?;
        Ok(self.format_invoice_list(&invoices))
    }

    fn format_invoice_list(&self, invoices: &[Invoice]) -> String {
        if invoices.is_empty() {
            return "No invoices found.".to_string();
        }

        let mut output = format!("{} invoices:\n\n", invoices.len());
        for invoice in invoices {
            output.push_str(&format!("  {}\n", invoice.summary()));
            output.push_str(&format!(
                "    Id: {}, Customer: {}\n",
                invoice.id(),
                invoice.customer_id()
            ));
            for item in invoice.items() {
                output.push_str(&format!(
                    "    - {}: {}\n",
                    item.service_name(),
                    item.service_amount()
                ));
            }
            output.push('\n');
        }

        output
    }
}
