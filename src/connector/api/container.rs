use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use tracing::debug;

use crate::application::{Clock, ContractRepository, InvoiceRepository};
use crate::{
    DuckdbContractRepository, DuckdbInvoiceRepository, FixedClock, GenerateInvoicesUseCase,
    ImportContractsUseCase, InMemoryContractRepository, InMemoryInvoiceRepository,
    ListInvoicesUseCase, SystemClock,
};

pub struct ContainerConfig {
    pub data_dir: String,
    pub memory_storage: bool,
    /// Bill as of this date instead of the system date.
    pub today: Option<NaiveDate>,
    pub show_progress: bool,
}

pub struct Container {
    contract_repo: Arc<dyn ContractRepository>,
    invoice_repo: Arc<dyn InvoiceRepository>,
    clock: Arc<dyn Clock>,
    config: ContainerConfig,
}

impl Container {
    pub async fn new(config: ContainerConfig) -> Result<Self> {
        let (contract_repo, invoice_repo): (Arc<dyn ContractRepository>, Arc<dyn InvoiceRepository>) =
            if config.memory_storage {
                debug!("Using in-memory billing storage");
                (
                    Arc::new(InMemoryContractRepository::new()),
                    Arc::new(InMemoryInvoiceRepository::new()),
                )
            } else {
                let db_path = PathBuf::from(&config.data_dir).join("billcycle.duckdb");
                debug!("Using DuckDB billing storage at {:?}", db_path);

                // DuckDB only allows one write connection per file, so both
                // adapters share the contract adapter's connection.
                let contract_repo = DuckdbContractRepository::new(&db_path)?;
                let invoice_repo =
                    DuckdbInvoiceRepository::with_connection(contract_repo.shared_connection())
                        .await?;
                (Arc::new(contract_repo), Arc::new(invoice_repo))
            };

        let clock: Arc<dyn Clock> = match config.today {
            Some(today) => {
                debug!("Billing as of {}", today);
                Arc::new(FixedClock::new(today))
            }
            None => Arc::new(SystemClock),
        };

        Ok(Self {
            contract_repo,
            invoice_repo,
            clock,
            config,
        })
    }

    pub fn generate_use_case(&self) -> GenerateInvoicesUseCase {
        GenerateInvoicesUseCase::new(
            self.contract_repo.clone(),
            self.invoice_repo.clone(),
            self.clock.clone(),
        )
        .with_progress(self.config.show_progress)
    }

    pub fn import_use_case(&self) -> ImportContractsUseCase {
        ImportContractsUseCase::new(self.contract_repo.clone())
    }

    pub fn list_invoices_use_case(&self) -> ListInvoicesUseCase {
        ListInvoicesUseCase::new(self.invoice_repo.clone(), self.contract_repo.clone())
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn data_dir(&self) -> &str {
        &self.config.data_dir
    }

    pub fn memory_storage(&self) -> bool {
        self.config.memory_storage
    }
}
