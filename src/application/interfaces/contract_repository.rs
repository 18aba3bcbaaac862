use async_trait::async_trait;

use crate::domain::{Contract, Customer, DomainError};

/// Persistence for customers and their contracts.
#[async_trait]
pub trait ContractRepository: Send + Sync {
    async fn save_customer(&self, customer: &Customer) -> Result<(), DomainError>;

    /// Insert or replace a contract together with its services.
    async fn save_contract(&self, contract: &Contract) -> Result<(), DomainError>;

    async fn find_contract(&self, id: &str) -> Result<Option<Contract>, DomainError>;

    /// All contracts, ordered by contract number then id.
    async fn list_contracts(&self) -> Result<Vec<Contract>, DomainError>;

    async fn list_customers(&self) -> Result<Vec<Customer>, DomainError>;
}
