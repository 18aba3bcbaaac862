use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::ReferenceMonth;

/// Payment state of an invoice. Generation only ever creates
/// `PendingPayment`; the other states are written by downstream systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    PendingPayment,
    Paid,
    Canceled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::PendingPayment => "pending_payment",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Canceled => "canceled",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pending_payment" | "pending" | "waiting" => InvoiceStatus::PendingPayment,
            "paid" => InvoiceStatus::Paid,
            "canceled" | "cancelled" => InvoiceStatus::Canceled,
            unknown => {
                warn!(
                    "Unknown invoice status '{}', defaulting to pending payment",
                    unknown
                );
                InvoiceStatus::PendingPayment
            }
        }
    }
}

/// A line on an invoice. Snapshots the service name and the computed amount
/// so later edits to the live service never change issued invoices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItem {
    service_name: String,
    service_amount: Decimal,
}

impl InvoiceItem {
    pub fn new(service_name: impl Into<String>, service_amount: Decimal) -> Self {
        Self {
            service_name: service_name.into(),
            service_amount,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn service_amount(&self) -> Decimal {
        self.service_amount
    }
}

/// An invoice that has been computed but not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInvoice {
    id: String,
    customer_id: String,
    contract_id: String,
    reference_month: ReferenceMonth,
    total_amount: Decimal,
    items: Vec<InvoiceItem>,
}

impl NewInvoice {
    /// The total is the plain sum of the (already rounded) item amounts.
    pub fn new(
        customer_id: String,
        contract_id: String,
        reference_month: ReferenceMonth,
        items: Vec<InvoiceItem>,
    ) -> Self {
        let total_amount = items.iter().map(InvoiceItem::service_amount).sum();
        Self {
            id: Uuid::new_v4().to_string(),
            customer_id,
            contract_id,
            reference_month,
            total_amount,
            items,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    pub fn reference_month(&self) -> ReferenceMonth {
        self.reference_month
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn items(&self) -> &[InvoiceItem] {
        &self.items
    }

    pub fn status(&self) -> InvoiceStatus {
        InvoiceStatus::PendingPayment
    }

    /// The persisted form of this invoice, stamped with `created_at`.
    pub fn into_invoice(self, created_at: i64) -> Invoice {
        Invoice {
            id: self.id,
            customer_id: self.customer_id,
            contract_id: self.contract_id,
            reference_month: self.reference_month,
            total_amount: self.total_amount,
            status: InvoiceStatus::PendingPayment,
            created_at,
            items: self.items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    id: String,
    customer_id: String,
    contract_id: String,
    reference_month: ReferenceMonth,
    total_amount: Decimal,
    status: InvoiceStatus,
    created_at: i64,
    items: Vec<InvoiceItem>,
}

impl Invoice {
    /// Reconstitutes from persisted data (used by adapters).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: String,
        customer_id: String,
        contract_id: String,
        reference_month: ReferenceMonth,
        total_amount: Decimal,
        status: InvoiceStatus,
        created_at: i64,
        items: Vec<InvoiceItem>,
    ) -> Self {
        Self {
            id,
            customer_id,
            contract_id,
            reference_month,
            total_amount,
            status,
            created_at,
            items,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    pub fn reference_month(&self) -> ReferenceMonth {
        self.reference_month
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn items(&self) -> &[InvoiceItem] {
        &self.items
    }

    pub fn summary(&self) -> String {
        format!(
            "{} {} total {} ({})",
            self.contract_id,
            self.reference_month,
            self.total_amount,
            self.status.as_str()
        )
    }
}

/// Narrows invoice listings.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    contract_id: Option<String>,
    reference_month: Option<ReferenceMonth>,
}

impl InvoiceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contract(mut self, contract_id: impl Into<String>) -> Self {
        self.contract_id = Some(contract_id.into());
        self
    }

    pub fn with_month(mut self, month: ReferenceMonth) -> Self {
        self.reference_month = Some(month);
        self
    }

    pub fn contract_id(&self) -> Option<&str> {
        self.contract_id.as_deref()
    }

    pub fn reference_month(&self) -> Option<ReferenceMonth> {
        self.reference_month
    }

    pub fn matches(&self, invoice: &Invoice) -> bool {
        self.contract_id
            .as_deref()
            .map_or(true, |id| invoice.contract_id() == id)
            && self
                .reference_month
                .map_or(true, |month| invoice.reference_month() == month)
    }
}

pub fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_new_invoice_total_is_sum_of_items() {
        let invoice = NewInvoice::new(
            "cust-1".to_string(),
            "c-1".to_string(),
            ReferenceMonth::new(2024, 1).unwrap(),
            vec![
                InvoiceItem::new("Hosting", dec("17.00")),
                InvoiceItem::new("Support", dec("3.33")),
            ],
        );

        assert_eq!(invoice.total_amount(), dec("20.33"));
        assert_eq!(invoice.status(), InvoiceStatus::PendingPayment);
        assert_eq!(invoice.items().len(), 2);
    }

    #[test]
    fn test_new_invoice_without_items_totals_zero() {
        let invoice = NewInvoice::new(
            "cust-1".to_string(),
            "c-1".to_string(),
            ReferenceMonth::new(2024, 1).unwrap(),
            vec![],
        );

        assert!(invoice.total_amount().is_zero());
    }

    #[test]
    fn test_into_invoice_keeps_identity() {
        let new_invoice = NewInvoice::new(
            "cust-1".to_string(),
            "c-1".to_string(),
            ReferenceMonth::new(2024, 2).unwrap(),
            vec![InvoiceItem::new("Hosting", dec("31.00"))],
        );
        let id = new_invoice.id().to_string();

        let invoice = new_invoice.into_invoice(42);
        assert_eq!(invoice.id(), id);
        assert_eq!(invoice.created_at(), 42);
        assert_eq!(invoice.status(), InvoiceStatus::PendingPayment);
        assert_eq!(invoice.summary(), "c-1 2024-02 total 31.00 (pending_payment)");
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            InvoiceStatus::PendingPayment,
            InvoiceStatus::Paid,
            InvoiceStatus::Canceled,
        ] {
            assert_eq!(InvoiceStatus::from_str(status.as_str()), status);
        }
        assert_eq!(
            InvoiceStatus::from_str("something"),
            InvoiceStatus::PendingPayment
        );
    }

    #[test]
    fn test_filter_matches() {
        let invoice = NewInvoice::new(
            "cust-1".to_string(),
            "c-1".to_string(),
            ReferenceMonth::new(2024, 2).unwrap(),
            vec![],
        )
        .into_invoice(0);

        assert!(InvoiceFilter::new().matches(&invoice));
        assert!(InvoiceFilter::new().with_contract("c-1").matches(&invoice));
        assert!(!InvoiceFilter::new().with_contract("c-2").matches(&invoice));
        assert!(!InvoiceFilter::new()
            .with_month(ReferenceMonth::new(2024, 3).unwrap())
            .matches(&invoice));
    }
}
