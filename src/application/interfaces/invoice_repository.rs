use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::domain::{DomainError, Invoice, InvoiceFilter, NewInvoice, ReferenceMonth};

/// Write-once persistence for invoices.
///
/// Implementations must enforce uniqueness of `(contract_id, reference_month)`
/// themselves; the generator relies on it when two runs race.
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Months already invoiced for a contract.
    async fn billed_months(&self, contract_id: &str)
        -> Result<BTreeSet<ReferenceMonth>, DomainError>;

    async fn invoice_exists(
        &self,
        contract_id: &str,
        month: ReferenceMonth,
    ) -> Result<bool, DomainError>;

    /// Persist an invoice and all of its items atomically.
    ///
    /// Returns `Ok(false)` without writing anything when the month is already
    /// invoiced for that contract.
    async fn create_invoice(&self, invoice: &NewInvoice) -> Result<bool, DomainError>;

    async fn find_invoice(
        &self,
        contract_id: &str,
        month: ReferenceMonth,
    ) -> Result<Option<Invoice>, DomainError>;

    /// Invoices matching `filter`, ordered by contract then month.
    async fn list_invoices(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>, DomainError>;
}
