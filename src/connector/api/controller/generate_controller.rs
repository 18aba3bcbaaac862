use anyhow::Result;

use crate::{GenerationReport, NewInvoice};

use super::super::Container;

pub struct GenerateController<'a> {
    container: &'a Container,
}

impl<'a> GenerateController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn generate(&self, dry_run: bool) -> Result<String> {
        let use_case = self.container.generate_use_case();

        if dry_run {
            let planned = use_case.preview().await?;
            return Ok(self.format_preview(&planned));
        }

        let report = use_case.execute().await?;
        Ok(self.format_report(&report))
    }

    fn format_report(&self, report: &GenerationReport) -> String {
        let mut output = format!(
            "Billed {} contracts as of {}: {} invoices created, {} months already invoiced",
            report.contracts_processed(),
            report.as_of(),
            report.invoices_created(),
            report.months_skipped()
        );

        for invoice in report.created() {
            output.push_str(&format!("\n  {}", describe(invoice)));
        }
        if report.invoices_created() > 0 {
            output.push_str(&format!("\nTotal billed: {}", report.total_billed()));
        }

        output
    }

    fn format_preview(&self, planned: &[NewInvoice]) -> String {
        if planned.is_empty() {
            return format!("Nothing to invoice as of {}.", self.container.today());
        }

        let mut output = format!(
            "Would create {} invoices as of {}:",
            planned.len(),
            self.container.today()
        );
        for invoice in planned {
            output.push_str(&format!("\n  {}", describe(invoice)));
        }
        output
    }
}

fn describe(invoice: &NewInvoice) -> String {
    let items: Vec<String> = invoice
        .items()
        .iter()
        .map(|item| format!("{} {}", item.service_name(), item.service_amount()))
        .collect();
    format!(
        "{} {} total {} [{}]",
        invoice.contract_id(),
        invoice.reference_month(),
        invoice.total_amount(),
        items.join(", ")
    )
}
