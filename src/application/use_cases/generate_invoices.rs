use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::application::{Clock, ContractRepository, InvoiceRepository};
use crate::domain::{
    months_to_bill, pending_months, BillingPeriod, Contract, DomainError, InvoiceItem, NewInvoice,
    ReferenceMonth,
};

/// Outcome of one generation pass.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    as_of: NaiveDate,
    contracts_processed: usize,
    months_skipped: usize,
    created: Vec<NewInvoice>,
}

impl GenerationReport {
    fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            contracts_processed: 0,
            months_skipped: 0,
            created: Vec::new(),
        }
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    pub fn contracts_processed(&self) -> usize {
        self.contracts_processed
    }

    /// Months that were due but already invoiced.
    pub fn months_skipped(&self) -> usize {
        self.months_skipped
    }

    pub fn created(&self) -> &[NewInvoice] {
        &self.created
    }

    pub fn invoices_created(&self) -> usize {
        self.created.len()
    }

    pub fn total_billed(&self) -> Decimal {
        self.created.iter().map(NewInvoice::total_amount).sum()
    }
}

/// Generates one invoice per contract per due calendar month.
pub struct GenerateInvoicesUseCase {
    contract_repo: Arc<dyn ContractRepository>,
    invoice_repo: Arc<dyn InvoiceRepository>,
    clock: Arc<dyn Clock>,
    show_progress: bool,
}

impl GenerateInvoicesUseCase {
    pub fn new(
        contract_repo: Arc<dyn ContractRepository>,
        invoice_repo: Arc<dyn InvoiceRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            contract_repo,
            invoice_repo,
            clock,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Bills every stored contract as of the clock's today.
    pub async fn execute(&self) -> Result<GenerationReport, DomainError> {
        let today = self.clock.today();
        let contracts = self.contract_repo.list_contracts().await?;
        self.generate(&contracts, today).await
    }

    /// Computes what [`execute`](Self::execute) would create, without writing.
    pub async fn preview(&self) -> Result<Vec<NewInvoice>, DomainError> {
        let today = self.clock.today();
        let contracts = self.contract_repo.list_contracts().await?;

        let mut planned = Vec::new();
        for contract in &contracts {
            let billed = self.invoice_repo.billed_months(contract.id()).await?;
            for month in due_months(contract, &billed, today) {
                planned.push(build_invoice(contract, month)?);
            }
        }
        Ok(planned)
    }

    /// Bills `contracts` as of `today`.
    ///
    /// Contracts are independent: months already invoiced are skipped, so a
    /// run that stopped halfway can simply be started again. The first
    /// storage or consistency error aborts the run; invoices committed before
    /// it stay valid.
    pub async fn generate(
        &self,
        contracts: &[Contract],
        today: NaiveDate,
    ) -> Result<GenerationReport, DomainError> {
        info!(
            "Generating invoices for {} contracts as of {}",
            contracts.len(),
            today
        );

        let start_time = Instant::now();
        let mut report = GenerationReport::new(today);

        let progress_bar = if self.show_progress {
            ProgressBar::new(contracts.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("#>-"),
        );

        for contract in contracts {
            progress_bar.set_message(contract.contract_number().to_string());
            self.bill_contract(contract, today, &mut report).await?;
            report.contracts_processed += 1;
            progress_bar.inc(1);
        }

        progress_bar.finish_with_message("done");

        info!(
            "Created {} invoices totalling {} ({} months already billed) in {:.2}s",
            report.invoices_created(),
            report.total_billed(),
            report.months_skipped(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(report)
    }

    async fn bill_contract(
        &self,
        contract: &Contract,
        today: NaiveDate,
        report: &mut GenerationReport,
    ) -> Result<(), DomainError> {
        if !contract.has_started(today) {
            debug!(
                "Contract {} starts on {}, nothing due yet",
                contract.contract_number(),
                contract.start_date()
            );
            return Ok(());
        }

        let billed = self.invoice_repo.billed_months(contract.id()).await?;
        let candidates: Vec<ReferenceMonth> =
            months_to_bill(contract.start_date(), contract.end_date(), today).collect();
        let due = pending_months(candidates.iter().copied(), &billed);
        report.months_skipped += candidates.len() - due.len();

        for month in due {
            let invoice = build_invoice(contract, month)?;
            if self.invoice_repo.create_invoice(&invoice).await? {
                debug!(
                    "Invoiced contract {} for {}: {}",
                    contract.contract_number(),
                    month,
                    invoice.total_amount()
                );
                report.created.push(invoice);
            } else {
                debug!(
                    "Contract {} was invoiced for {} concurrently, skipping",
                    contract.contract_number(),
                    month
                );
                report.months_skipped += 1;
            }
        }

        Ok(())
    }
}

fn due_months(
    contract: &Contract,
    billed: &BTreeSet<ReferenceMonth>,
    today: NaiveDate,
) -> Vec<ReferenceMonth> {
    pending_months(
        months_to_bill(contract.start_date(), contract.end_date(), today),
        billed,
    )
}

/// Builds the invoice for one contract month: one item per service, in
/// service order, each prorated and rounded on its own before summing.
pub fn build_invoice(contract: &Contract, month: ReferenceMonth) -> Result<NewInvoice, DomainError> {
    let period = BillingPeriod::for_contract(contract, month)?;

    let items = contract
        .services()
        .iter()
        .map(|service| {
            period
                .prorate(service.value())
                .map(|amount| InvoiceItem::new(service.name(), amount))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NewInvoice::new(
        contract.customer_id().to_string(),
        contract.id().to_string(),
        month,
        items,
    ))
}
