use std::str::FromStr;
use std::sync::Arc;

use billcycle::{
    Contract, ContractRepository, Customer, DuckdbContractRepository, DuckdbInvoiceRepository,
    InvoiceFilter, InvoiceItem, InvoiceRepository, InvoiceStatus, NewInvoice, ReferenceMonth,
    Service,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tempfile::tempdir;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("date")
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).expect("decimal")
}

fn month(s: &str) -> ReferenceMonth {
    s.parse().expect("month")
}

fn contract(id: &str, number: &str) -> Contract {
    Contract::new(
        id.to_string(),
        "cust-1".to_string(),
        number.to_string(),
        date("2024-01-15"),
        date("2024-04-30"),
        vec![
            Service::new("Hosting".to_string(), dec("31.00")).expect("service"),
            Service::new("Support".to_string(), dec("9.99")).expect("service"),
        ],
    )
    .expect("contract")
}

fn invoice(contract_id: &str, reference: &str, amounts: &[&str]) -> NewInvoice {
    let items = amounts
        .iter()
        .enumerate()
        .map(|(i, a)| InvoiceItem::new(format!("S{}", i + 1), dec(a)))
        .collect();
    NewInvoice::new(
        "cust-1".to_string(),
        contract_id.to_string(),
        month(reference),
        items,
    )
}

async fn open(
    db_path: &std::path::Path,
) -> (Arc<DuckdbContractRepository>, Arc<DuckdbInvoiceRepository>) {
    let contracts = DuckdbContractRepository::new(db_path).expect("duckdb init");
    let invoices = DuckdbInvoiceRepository::with_connection(contracts.shared_connection())
        .await
        .expect("invoice init");
    (Arc::new(contracts), Arc::new(invoices))
}

#[tokio::test]
async fn duckdb_contract_repository_roundtrip_save_and_find() {
    let dir = tempdir().expect("tempdir");
    let (contracts, _) = open(&dir.path().join("billcycle.duckdb")).await;

    let saved = contract("c-1", "C1");
    contracts.save_contract(&saved).await.expect("save");

    let found = contracts
        .find_contract("c-1")
        .await
        .expect("find_contract")
        .expect("contract exists");
    assert_eq!(found, saved);
    assert_eq!(found.start_date(), date("2024-01-15"));
    assert_eq!(found.services()[1].value(), dec("9.99"));

    assert!(contracts
        .find_contract("missing")
        .await
        .expect("find_contract")
        .is_none());
}

#[tokio::test]
async fn duckdb_contract_repository_save_replaces_services_and_lists_in_order() {
    let dir = tempdir().expect("tempdir");
    let (contracts, _) = open(&dir.path().join("billcycle.duckdb")).await;

    contracts
        .save_contract(&contract("c-2", "B-100"))
        .await
        .expect("save c-2");
    contracts
        .save_contract(&contract("c-1", "A-100"))
        .await
        .expect("save c-1");

    let updated = Contract::new(
        "c-2".to_string(),
        "cust-1".to_string(),
        "B-100".to_string(),
        date("2024-01-15"),
        date("2024-06-30"),
        vec![Service::new("Hosting".to_string(), dec("40.00")).expect("service")],
    )
    .expect("contract");
    contracts.save_contract(&updated).await.expect("update");

    let listed = contracts.list_contracts().await.expect("list");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].contract_number(), "A-100");
    assert_eq!(listed[1].contract_number(), "B-100");
    assert_eq!(listed[1].end_date(), date("2024-06-30"));
    assert_eq!(listed[1].services().len(), 1);
    assert_eq!(listed[1].monthly_value(), dec("40.00"));
}

#[tokio::test]
async fn duckdb_contract_repository_rejects_email_of_another_customer() {
    let dir = tempdir().expect("tempdir");
    let (contracts, _) = open(&dir.path().join("billcycle.duckdb")).await;

    let acme = Customer::new(
        "cust-1".to_string(),
        "ACME".to_string(),
        "billing@acme.test".to_string(),
    )
    .expect("customer");
    contracts.save_customer(&acme).await.expect("save");
    contracts.save_customer(&acme).await.expect("resave");

    let other = Customer::new(
        "cust-2".to_string(),
        "Other".to_string(),
        "BILLING@acme.test".to_string(),
    )
    .expect("customer");
    let err = contracts.save_customer(&other).await.unwrap_err();
    assert!(err.is_already_exists());

    let customers = contracts.list_customers().await.expect("list");
    assert_eq!(customers, vec![acme]);
}

#[tokio::test]
async fn duckdb_invoice_repository_create_is_unique_per_contract_month() {
    let dir = tempdir().expect("tempdir");
    let (_, invoices) = open(&dir.path().join("billcycle.duckdb")).await;

    let first = invoice("c-1", "2024-01", &["17.00", "5.48"]);
    assert!(invoices.create_invoice(&first).await.expect("create"));

    // Same month under a fresh id: the unique key wins, items are not written.
    let twin = invoice("c-1", "2024-01", &["99.00"]);
    assert!(!invoices.create_invoice(&twin).await.expect("create twin"));

    assert!(invoices
        .invoice_exists("c-1", month("2024-01"))
        .await
        .expect("exists"));
    assert!(!invoices
        .invoice_exists("c-1", month("2024-02"))
        .await
        .expect("exists"));

    let stored = invoices
        .find_invoice("c-1", month("2024-01"))
        .await
        .expect("find")
        .expect("invoice exists");
    assert_eq!(stored.id(), first.id());
    assert_eq!(stored.total_amount(), dec("22.48"));
    assert_eq!(stored.status(), InvoiceStatus::PendingPayment);
    assert_eq!(stored.items().len(), 2);
    assert_eq!(stored.items()[0].service_name(), "S1");
    assert_eq!(stored.items()[1].service_amount(), dec("5.48"));
    assert!(stored.created_at() > 0);
}

#[tokio::test]
async fn duckdb_invoice_repository_billed_months_and_filters() {
    let dir = tempdir().expect("tempdir");
    let (_, invoices) = open(&dir.path().join("billcycle.duckdb")).await;

    for (contract_id, reference) in [
        ("c-2", "2024-01"),
        ("c-1", "2024-02"),
        ("c-1", "2024-01"),
    ] {
        invoices
            .create_invoice(&invoice(contract_id, reference, &["31.00"]))
            .await
            .expect("create");
    }

    let billed: Vec<String> = invoices
        .billed_months("c-1")
        .await
        .expect("billed")
        .into_iter()
        .map(|m| m.to_string())
        .collect();
    assert_eq!(billed, vec!["2024-01", "2024-02"]);

    let all = invoices
        .list_invoices(&InvoiceFilter::new())
        .await
        .expect("list");
    let keys: Vec<String> = all
        .iter()
        .map(|i| format!("{}:{}", i.contract_id(), i.reference_month()))
        .collect();
    assert_eq!(keys, vec!["c-1:2024-01", "c-1:2024-02", "c-2:2024-01"]);
    assert!(all.iter().all(|i| i.items().len() == 1));

    let january = invoices
        .list_invoices(&InvoiceFilter::new().with_month(month("2024-01")))
        .await
        .expect("list");
    assert_eq!(january.len(), 2);

    let narrowed = invoices
        .list_invoices(
            &InvoiceFilter::new()
                .with_contract("c-1")
                .with_month(month("2024-02")),
        )
        .await
        .expect("list");
    assert_eq!(narrowed.len(), 1);
    assert_eq!(narrowed[0].total_amount(), dec("31.00"));
}

#[tokio::test]
async fn duckdb_invoice_repository_rolls_back_header_when_an_item_fails() {
    let dir = tempdir().expect("tempdir");
    let (_, invoices) = open(&dir.path().join("billcycle.duckdb")).await;

    // The header total (1.00) fits DECIMAL(18, 2); the first item does not.
    let broken = invoice(
        "c-1",
        "2024-01",
        &["100000000000000000.00", "-99999999999999999.00"],
    );
    assert_eq!(broken.total_amount(), dec("1.00"));

    let err = invoices.create_invoice(&broken).await.unwrap_err();
    assert!(err.is_storage_error());
    assert!(!invoices
        .invoice_exists("c-1", month("2024-01"))
        .await
        .expect("exists"));
    assert!(invoices
        .list_invoices(&InvoiceFilter::new())
        .await
        .expect("list")
        .is_empty());

    // The month is free again once the failed insert is rolled back.
    assert!(invoices
        .create_invoice(&invoice("c-1", "2024-01", &["17.00"]))
        .await
        .expect("create"));
    let stored = invoices
        .find_invoice("c-1", month("2024-01"))
        .await
        .expect("find")
        .expect("invoice exists");
    assert_eq!(stored.items().len(), 1);
}

#[tokio::test]
async fn duckdb_billing_data_survives_reopen() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("billcycle.duckdb");

    {
        let (contracts, invoices) = open(&db_path).await;
        contracts
            .save_contract(&contract("c-1", "C1"))
            .await
            .expect("save");
        invoices
            .create_invoice(&invoice("c-1", "2024-01", &["17.00"]))
            .await
            .expect("create");
    }

    let (contracts, invoices) = open(&db_path).await;
    assert_eq!(contracts.list_contracts().await.expect("list").len(), 1);
    assert!(!invoices
        .create_invoice(&invoice("c-1", "2024-01", &["17.00"]))
        .await
        .expect("create"));
}
