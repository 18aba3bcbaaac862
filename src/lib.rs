pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use cli::Commands;

pub use application::{
    Clock, ContractFeed, ContractRecord, ContractRepository, CustomerRecord, GenerateInvoicesUseCase,
    GenerationReport, ImportContractsUseCase, ImportSummary, InvoiceRepository,
    ListInvoicesUseCase, ServiceRecord,
};

pub use connector::{
    read_contract_feed, Container, ContainerConfig, DuckdbContractRepository,
    DuckdbInvoiceRepository, FixedClock, InMemoryContractRepository, InMemoryInvoiceRepository,
    Router, SystemClock,
};

pub use domain::{
    months_to_bill, pending_months, prorate, BillingPeriod, Contract, Customer, DomainError,
    Invoice, InvoiceFilter, InvoiceItem, InvoiceStatus, NewInvoice, ReferenceMonth, Service,
};
