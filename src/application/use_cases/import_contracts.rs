use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::application::ContractRepository;
use crate::domain::{Contract, Customer, DomainError, Service};

/// Customers, contracts and services as supplied by an upstream system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractFeed {
    #[serde(default)]
    pub customers: Vec<CustomerRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub contracts: Vec<ContractRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractRecord {
    /// Defaults to `contract_number` when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub contract_number: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub services: Vec<ServiceRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub name: String,
    pub value: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub customers: usize,
    pub contracts: usize,
    pub services: usize,
}

/// Loads a [`ContractFeed`] into the contract store.
///
/// The whole feed is validated before anything is written, including amounts
/// against the storage range and emails against customers already stored, so
/// a single bad record leaves the store untouched.
pub struct ImportContractsUseCase {
    contract_repo: Arc<dyn ContractRepository>,
}

impl ImportContractsUseCase {
    pub fn new(contract_repo: Arc<dyn ContractRepository>) -> Self {
        Self { contract_repo }
    }

    pub async fn execute(&self, feed: ContractFeed) -> Result<ImportSummary, DomainError> {
        let (customers, contracts) = validate(feed)?;
        self.check_stored_emails(&customers).await?;

        for customer in &customers {
            self.contract_repo.save_customer(customer).await?;
        }
        for contract in &contracts {
            self.contract_repo.save_contract(contract).await?;
        }

        let summary = ImportSummary {
            customers: customers.len(),
            contracts: contracts.len(),
            services: contracts.iter().map(|c| c.services().len()).sum(),
        };

        info!(
            "Imported {} customers, {} contracts, {} services",
            summary.customers, summary.contracts, summary.services
        );

        Ok(summary)
    }

    async fn check_stored_emails(&self, customers: &[Customer]) -> Result<(), DomainError> {
        let stored: HashMap<String, String> = self
            .contract_repo
            .list_customers()
            .await?
            .into_iter()
            .map(|c| (c.email().to_lowercase(), c.id().to_string()))
            .collect();

        for customer in customers {
            if let Some(owner) = stored.get(&customer.email().to_lowercase()) {
                if owner != customer.id() {
                    return Err(DomainError::already_exists(format!(
                        "Email {} already belongs to customer {}",
                        customer.email(),
                        owner
                    )));
                }
            }
        }
        Ok(())
    }
}

fn validate(feed: ContractFeed) -> Result<(Vec<Customer>, Vec<Contract>), DomainError> {
    let mut emails = HashSet::new();
    let mut contract_ids = HashSet::new();
    let mut customers = Vec::with_capacity(feed.customers.len());
    let mut contracts = Vec::new();

    for record in feed.customers {
        if !emails.insert(record.email.to_lowercase()) {
            return Err(DomainError::already_exists(format!(
                "Duplicate customer email: {}",
                record.email
            )));
        }
        let customer = Customer::new(record.id, record.name, record.email)?;

        for contract in record.contracts {
            let services = contract
                .services
                .into_iter()
                .map(|s| Service::new(s.name, s.value))
                .collect::<Result<Vec<_>, _>>()?;

            let id = contract
                .id
                .unwrap_or_else(|| contract.contract_number.clone());
            if !contract_ids.insert(id.clone()) {
                return Err(DomainError::already_exists(format!(
                    "Duplicate contract id: {}",
                    id
                )));
            }

            contracts.push(Contract::new(
                id,
                customer.id().to_string(),
                contract.contract_number,
                contract.start_date,
                contract.end_date,
                services,
            )?);
        }

        customers.push(customer);
    }

    Ok((customers, contracts))
}
