use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use duckdb::{params, params_from_iter, Connection};
use tokio::sync::Mutex;
use tracing::debug;

use super::duckdb_contract_repository::parse_decimal;
use crate::application::InvoiceRepository;
use crate::domain::{
    current_timestamp, DomainError, Invoice, InvoiceFilter, InvoiceItem, InvoiceStatus, NewInvoice,
    ReferenceMonth,
};

/// Invoices and their items. `UNIQUE (contract_id, reference_month)` is the
/// guard against double billing when two runs race.
pub struct DuckdbInvoiceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DuckdbInvoiceRepository {
    /// Create a new adapter using an existing shared connection.
    pub async fn with_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, DomainError> {
        let conn_guard = conn.lock().await;
        Self::initialize_schema(&conn_guard)?;
        drop(conn_guard);

        Ok(Self { conn })
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

    fn initialize_schema(conn: &Connection) -> Result<(), DomainError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS invoices (
                id TEXT PRIMARY KEY,
                customer_id TEXT NOT NULL,
                contract_id TEXT NOT NULL,
                reference_month TEXT NOT NULL,
                total_amount DECIMAL(18, 2) NOT NULL,
                status TEXT NOT NULL,
                created_at BIGINT NOT NULL,
                UNIQUE (contract_id, reference_month)
            );

            CREATE TABLE IF NOT EXISTS invoice_items (
                invoice_id TEXT NOT NULL,
                ordinal INTEGER NOT NULL,
                service_name TEXT NOT NULL,
                service_amount DECIMAL(18, 2) NOT NULL,
                PRIMARY KEY (invoice_id, ordinal)
            );
            "#,
        )
        .map_err(|e| DomainError::storage(format!("Failed to initialize invoice schema: {}", e)))?;

        debug!("DuckDB invoice schema initialized");
        Ok(())
    }

    fn where_clause(filter: &InvoiceFilter) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        if let Some(contract_id) = filter.contract_id() {
            clauses.push("contract_id = ?");
            values.push(contract_id.to_string());
        }
        if let Some(month) = filter.reference_month() {
            clauses.push("reference_month = ?");
            values.push(month.to_string());
        }

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!("WHERE {}", clauses.join(" AND ")), values)
        }
    }

    fn query_invoices(
        conn: &Connection,
        filter: &InvoiceFilter,
    ) -> Result<Vec<Invoice>, DomainError> {
        let (where_sql, values) = Self::where_clause(filter);

        let items_sql = format!(
            "SELECT invoice_id, service_name, CAST(service_amount AS VARCHAR) FROM invoice_items \
             WHERE invoice_id IN (SELECT id FROM invoices {}) ORDER BY invoice_id, ordinal",
            where_sql
        );
        let mut stmt = conn
            .prepare(&items_sql)
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| DomainError::storage(format!("Failed to query invoice items: {}", e)))?;

        let mut items: HashMap<String, Vec<InvoiceItem>> = HashMap::new();
        for row in rows {
            let (invoice_id, name, amount) =
                row.map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?;
            items
                .entry(invoice_id)
                .or_default()
                .push(InvoiceItem::new(name, parse_decimal(&amount)?));
        }

        let invoices_sql = format!(
            "SELECT id, customer_id, contract_id, reference_month, CAST(total_amount AS VARCHAR), status, created_at \
             FROM invoices {} ORDER BY contract_id, reference_month",
            where_sql
        );
        let mut stmt = conn
            .prepare(&invoices_sql)
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, i64>(6)?,
                ))
            })
            .map_err(|e| DomainError::storage(format!("Failed to query invoices: {}", e)))?;

        let mut invoices = Vec::new();
        for row in rows {
            let (id, customer_id, contract_id, month, total, status, created_at) =
                row.map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?;
            let invoice_items = items.remove(&id).unwrap_or_default();
            invoices.push(Invoice::reconstitute(
                id,
                customer_id,
                contract_id,
                parse_month(&month)?,
                parse_decimal(&total)?,
                InvoiceStatus::from_str(&status),
                created_at,
                invoice_items,
            ));
        }

        Ok(invoices)
    }
}

fn parse_month(value: &str) -> Result<ReferenceMonth, DomainError> {
    value
        .parse()
        .map_err(|e| DomainError::storage(format!("Invalid stored reference month: {}", e)))
}

#[async_trait]
impl InvoiceRepository for DuckdbInvoiceRepository {
    async fn billed_months(
        &self,
        contract_id: &str,
    ) -> Result<BTreeSet<ReferenceMonth>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT reference_month FROM invoices WHERE contract_id = ?")
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        let rows = stmt
            .query_map(params![contract_id], |row| row.get::<_, String>(0))
            .map_err(|e| DomainError::storage(format!("Failed to query billed months: {}", e)))?;

        let mut months = BTreeSet::new();
        for row in rows {
            let month =
                row.map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?;
            months.insert(parse_month(&month)?);
        }
        Ok(months)
    }

    async fn invoice_exists(
        &self,
        contract_id: &str,
        month: ReferenceMonth,
    ) -> Result<bool, DomainError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM invoices WHERE contract_id = ?1 AND reference_month = ?2",
                params![contract_id, month.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| DomainError::storage(format!("Failed to check invoice: {}", e)))?;

        Ok(count > 0)
    }

    async fn create_invoice(&self, invoice: &NewInvoice) -> Result<bool, DomainError> {
        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        let inserted = tx
            .execute(
                r#"
                INSERT OR IGNORE INTO invoices
                    (id, customer_id, contract_id, reference_month, total_amount, status, created_at)
                VALUES (?1, ?2, ?3, ?4, CAST(?5 AS DECIMAL(18, 2)), ?6, ?7)
                "#,
                params![
                    invoice.id(),
                    invoice.customer_id(),
                    invoice.contract_id(),
                    invoice.reference_month().to_string(),
                    invoice.total_amount().to_string(),
                    invoice.status().as_str(),
                    current_timestamp(),
                ],
            )
            .map_err(|e| DomainError::storage(format!("Failed to insert invoice: {}", e)))?;

        if inserted == 0 {
            // Dropping the transaction rolls it back.
            return Ok(false);
        }

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO invoice_items (invoice_id, ordinal, service_name, service_amount) \
                     VALUES (?, ?, ?, CAST(? AS DECIMAL(18, 2)))",
                )
                .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

            for (ordinal, item) in invoice.items().iter().enumerate() {
                stmt.execute(params![
                    invoice.id(),
                    ordinal as i32,
                    item.service_name(),
                    item.service_amount().to_string(),
                ])
                .map_err(|e| DomainError::storage(format!("Failed to insert invoice item: {}", e)))?;
            }
        }

        tx.commit()
            .map_err(|e| DomainError::storage(format!("Failed to commit: {}", e)))?;

        debug!(
            "Stored invoice {} for contract {} month {}",
            invoice.id(),
            invoice.contract_id(),
            invoice.reference_month()
        );
        Ok(true)
    }

    async fn find_invoice(
        &self,
        contract_id: &str,
        month: ReferenceMonth,
    ) -> Result<Option<Invoice>, DomainError> {
        let conn = self.conn.lock().await;
        let filter = InvoiceFilter::new()
            .with_contract(contract_id)
            .with_month(month);
        Ok(Self::query_invoices(&conn, &filter)?.into_iter().next())
    }

    async fn list_invoices(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>, DomainError> {
        let conn = self.conn.lock().await;
        Self::query_invoices(&conn, filter)
    }
}
