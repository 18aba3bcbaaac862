use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use duckdb::{params, Connection};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::ContractRepository;
use crate::domain::{Contract, Customer, DomainError, Service};

pub struct DuckdbContractRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DuckdbContractRepository {
    pub fn new(db_path: &Path) -> Result<Self, DomainError> {
        let conn = Connection::open(db_path)
            .map_err(|e| DomainError::storage(format!("Failed to open DuckDB database: {}", e)))?;
        Self::initialize_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self, DomainError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            DomainError::storage(format!("Failed to open DuckDB in-memory DB: {}", e))
        })?;
        Self::initialize_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create a new adapter using an existing shared connection.
    /// DuckDB only allows one write connection per file, so the invoice
    /// adapter is built on top of this one's connection.
    pub async fn with_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, DomainError> {
        let conn_guard = conn.lock().await;
        Self::initialize_schema(&conn_guard)?;
        drop(conn_guard);

        Ok(Self { conn })
    }

    /// Returns a clone of the shared connection Arc.
    pub fn shared_connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    fn initialize_schema(conn: &Connection) -> Result<(), DomainError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS customers (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS contracts (
                id TEXT PRIMARY KEY,
                customer_id TEXT NOT NULL,
                contract_number TEXT NOT NULL,
                start_date DATE NOT NULL,
                end_date DATE NOT NULL
            );

            CREATE TABLE IF NOT EXISTS services (
                contract_id TEXT NOT NULL,
                ordinal INTEGER NOT NULL,
                name TEXT NOT NULL,
                monthly_value DECIMAL(18, 2) NOT NULL
            );
            "#,
        )
        .map_err(|e| DomainError::storage(format!("Failed to initialize contract schema: {}", e)))?;

        debug!("DuckDB contract schema initialized");
        Ok(())
    }

    fn load_services(
        conn: &Connection,
        contract_id: Option<&str>,
    ) -> Result<HashMap<String, Vec<Service>>, DomainError> {
        let sql = match contract_id {
            Some(_) => "SELECT contract_id, name, CAST(monthly_value AS VARCHAR) FROM services WHERE contract_id = ? ORDER BY contract_id, ordinal",
            None => "SELECT contract_id, name, CAST(monthly_value AS VARCHAR) FROM services ORDER BY contract_id, ordinal",
        };
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        let map_row = |row: &duckdb::Row<'_>| -> duckdb::Result<(String, String, String)> {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        };
        let rows = match contract_id {
            Some(id) => stmt.query_map(params![id], map_row),
            None => stmt.query_map([], map_row),
        }
        .map_err(|e| DomainError::storage(format!("Failed to query services: {}", e)))?;

        let mut services: HashMap<String, Vec<Service>> = HashMap::new();
        for row in rows {
            let (contract_id, name, value) =
                row.map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?;
            services
                .entry(contract_id)
                .or_default()
                .push(Service::reconstitute(name, parse_decimal(&value)?));
        }
        Ok(services)
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| DomainError::storage(format!("Invalid stored date '{}': {}", value, e)))
}

pub(crate) fn parse_decimal(value: &str) -> Result<Decimal, DomainError> {
    Decimal::from_str(value)
        .map_err(|e| DomainError::storage(format!("Invalid stored amount '{}': {}", value, e)))
}

type ContractRow = (String, String, String, String, String);

fn contract_from_row(row: ContractRow, services: Vec<Service>) -> Result<Contract, DomainError> {
    let (id, customer_id, contract_number, start_date, end_date) = row;
    Ok(Contract::reconstitute(
        id,
        customer_id,
        contract_number,
        parse_date(&start_date)?,
        parse_date(&end_date)?,
        services,
    ))
}

const CONTRACT_COLUMNS: &str = "id, customer_id, contract_number, CAST(start_date AS VARCHAR), CAST(end_date AS VARCHAR)";

#[async_trait]
impl ContractRepository for DuckdbContractRepository {
    async fn save_customer(&self, customer: &Customer) -> Result<(), DomainError> {
        let conn = self.conn.lock().await;

        let clash: Option<String> = match conn.query_row(
            "SELECT id FROM customers WHERE lower(email) = lower(?1) AND id <> ?2",
            params![customer.email(), customer.id()],
            |row| row.get(0),
        ) {
            Ok(id) => Some(id),
            Err(duckdb::Error::QueryReturnedNoRows) => None,
            Err(e) => {
                return Err(DomainError::storage(format!(
                    "Failed to check customer email: {}",
                    e
                )))
            }
        };
        if let Some(other) = clash {
            return Err(DomainError::already_exists(format!(
                "Email {} already belongs to customer {}",
                customer.email(),
                other
            )));
        }

        conn.execute(
            r#"
            INSERT INTO customers (id, name, email)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email
            "#,
            params![customer.id(), customer.name(), customer.email()],
        )
        .map_err(|e| DomainError::storage(format!("Failed to save customer: {}", e)))?;

        Ok(())
    }

    async fn save_contract(&self, contract: &Contract) -> Result<(), DomainError> {
        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        tx.execute(
            r#"
            INSERT INTO contracts (id, customer_id, contract_number, start_date, end_date)
            VALUES (?1, ?2, ?3, CAST(?4 AS DATE), CAST(?5 AS DATE))
            ON CONFLICT (id) DO UPDATE SET
                customer_id = excluded.customer_id,
                contract_number = excluded.contract_number,
                start_date = excluded.start_date,
                end_date = excluded.end_date
            "#,
            params![
                contract.id(),
                contract.customer_id(),
                contract.contract_number(),
                contract.start_date().to_string(),
                contract.end_date().to_string(),
            ],
        )
        .map_err(|e| DomainError::storage(format!("Failed to save contract: {}", e)))?;

        tx.execute(
            "DELETE FROM services WHERE contract_id = ?",
            params![contract.id()],
        )
        .map_err(|e| DomainError::storage(format!("Failed to clear services: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO services (contract_id, ordinal, name, monthly_value) \
                     VALUES (?, ?, ?, CAST(? AS DECIMAL(18, 2)))",
                )
                .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

            for (position, service) in contract.services().iter().enumerate() {
                stmt.execute(params![
                    contract.id(),
                    position as i32,
                    service.name(),
                    service.value().to_string(),
                ])
                .map_err(|e| DomainError::storage(format!("Failed to save service: {}", e)))?;
            }
        }

        tx.commit()
            .map_err(|e| DomainError::storage(format!("Failed to commit: {}", e)))?;

        debug!(
            "Saved contract {} with {} services",
            contract.contract_number(),
            contract.services().len()
        );
        Ok(())
    }

    async fn find_contract(&self, id: &str) -> Result<Option<Contract>, DomainError> {
        let conn = self.conn.lock().await;
        let sql = format!("SELECT {} FROM contracts WHERE id = ?1", CONTRACT_COLUMNS);
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        let row: ContractRow = match stmt.query_row(params![id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
        }) {
            Ok(row) => row,
            Err(duckdb::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => {
                return Err(DomainError::storage(format!(
                    "Failed to query contract: {}",
                    e
                )))
            }
        };

        let mut services = Self::load_services(&conn, Some(id))?;
        let services = services.remove(id).unwrap_or_default();
        contract_from_row(row, services).map(Some)
    }

    async fn list_contracts(&self) -> Result<Vec<Contract>, DomainError> {
        let conn = self.conn.lock().await;
        let sql = format!(
            "SELECT {} FROM contracts ORDER BY contract_number, id",
            CONTRACT_COLUMNS
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })
            .map_err(|e| DomainError::storage(format!("Failed to query contracts: {}", e)))?;

        let mut raw: Vec<ContractRow> = Vec::new();
        for row in rows {
            raw.push(row.map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?);
        }

        let mut services = Self::load_services(&conn, None)?;
        raw.into_iter()
            .map(|row| {
                let contract_services = services.remove(&row.0).unwrap_or_default();
                contract_from_row(row, contract_services)
            })
            .collect()
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT id, name, email FROM customers ORDER BY name, id")
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(Customer::reconstitute(row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .map_err(|e| DomainError::storage(format!("Failed to query customers: {}", e)))?;

        let mut customers = Vec::new();
        for row in rows {
            customers
                .push(row.map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?);
        }
        Ok(customers)
    }
}
