use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::{ContractRepository, InvoiceRepository};
use crate::domain::{
    current_timestamp, Contract, Customer, DomainError, Invoice, InvoiceFilter, NewInvoice,
    ReferenceMonth,
};

pub struct InMemoryContractRepository {
    customers: Arc<Mutex<HashMap<String, Customer>>>,
    contracts: Arc<Mutex<HashMap<String, Contract>>>,
}

impl InMemoryContractRepository {
    pub fn new() -> Self {
        Self {
            customers: Arc::new(Mutex::new(HashMap::new())),
            contracts: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryContractRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContractRepository for InMemoryContractRepository {
    async fn save_customer(&self, customer: &Customer) -> Result<(), DomainError> {
        let mut store = self.customers.lock().await;

        let email = customer.email().to_lowercase();
        if let Some(other) = store
            .values()
            .find(|c| c.id() != customer.id() && c.email().to_lowercase() == email)
        {
            return Err(DomainError::already_exists(format!(
                "Email {} already belongs to customer {}",
                customer.email(),
                other.id()
            )));
        }

        store.insert(customer.id().to_string(), customer.clone());
        Ok(())
    }

    async fn save_contract(&self, contract: &Contract) -> Result<(), DomainError> {
        let mut store = self.contracts.lock().await;
        store.insert(contract.id().to_string(), contract.clone());

        debug!(
            "Saved contract {} with {} services to memory",
            contract.contract_number(),
            contract.services().len()
        );
        Ok(())
    }

    async fn find_contract(&self, id: &str) -> Result<Option<Contract>, DomainError> {
        let store = self.contracts.lock().await;
        Ok(store.get(id).cloned())
    }

    async fn list_contracts(&self) -> Result<Vec<Contract>, DomainError> {
        let store = self.contracts.lock().await;
        let mut contracts: Vec<Contract> = store.values().cloned().collect();
        contracts.sort_by(|a, b| {
            a.contract_number()
                .cmp(b.contract_number())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(contracts)
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, DomainError> {
        let store = self.customers.lock().await;
        let mut customers: Vec<Customer> = store.values().cloned().collect();
        customers.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id().cmp(b.id())));
        Ok(customers)
    }
}

/// Invoices keyed by contract and month. The check and the insert in
/// `create_invoice` happen under one lock, so a month is never stored twice.
pub struct InMemoryInvoiceRepository {
    invoices: Arc<Mutex<BTreeMap<(String, ReferenceMonth), Invoice>>>,
}

impl InMemoryInvoiceRepository {
    pub fn new() -> Self {
        Self {
            invoices: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }
}

impl Default for InMemoryInvoiceRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn billed_months(
        &self,
        contract_id: &str,
    ) -> Result<BTreeSet<ReferenceMonth>, DomainError> {
        let store = self.invoices.lock().await;
        Ok(store
            .keys()
            .filter(|(id, _)| id == contract_id)
            .map(|(_, month)| *month)
            .collect())
    }

    async fn invoice_exists(
        &self,
        contract_id: &str,
        month: ReferenceMonth,
    ) -> Result<bool, DomainError> {
        let store = self.invoices.lock().await;
        Ok(store.contains_key(&(contract_id.to_string(), month)))
    }

    async fn create_invoice(&self, invoice: &NewInvoice) -> Result<bool, DomainError> {
        let mut store = self.invoices.lock().await;
        let key = (invoice.contract_id().to_string(), invoice.reference_month());
        if store.contains_key(&key) {
            return Ok(false);
        }

        store.insert(key, invoice.clone().into_invoice(current_timestamp()));
        Ok(true)
    }

    async fn find_invoice(
        &self,
        contract_id: &str,
        month: ReferenceMonth,
    ) -> Result<Option<Invoice>, DomainError> {
        let store = self.invoices.lock().await;
        Ok(store.get(&(contract_id.to_string(), month)).cloned())
    }

    async fn list_invoices(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>, DomainError> {
        let store = self.invoices.lock().await;
        // BTreeMap keys already give contract-then-month order.
        Ok(store
            .values()
            .filter(|invoice| filter.matches(invoice))
            .cloned()
            .collect())
    }
}
