use std::sync::Arc;

use crate::application::{ContractRepository, InvoiceRepository};
use crate::domain::{Contract, Customer, DomainError, Invoice, InvoiceFilter};

pub struct ListInvoicesUseCase {
    invoice_repo: Arc<dyn InvoiceRepository>,
    contract_repo: Arc<dyn ContractRepository>,
}

impl ListInvoicesUseCase {
    pub fn new(
        invoice_repo: Arc<dyn InvoiceRepository>,
        contract_repo: Arc<dyn ContractRepository>,
    ) -> Self {
        Self {
            invoice_repo,
            contract_repo,
        }
    }

    pub async fn execute(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>, DomainError> {
        if let Some(contract_id) = filter.contract_id() {
            self.contract_repo
                .find_contract(contract_id)
                .await?
                .ok_or_else(|| {
                    DomainError::not_found(format!("Contract not found: {}", contract_id))
                })?;
        }

        self.invoice_repo.list_invoices(filter).await
    }

    pub async fn contracts(&self) -> Result<Vec<Contract>, DomainError> {
        self.contract_repo.list_contracts().await
    }

    pub async fn customers(&self) -> Result<Vec<Customer>, DomainError> {
        self.contract_repo.list_customers().await
    }
}
