use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Money is carried with two decimal places.
pub const CURRENCY_SCALE: u32 = 2;

/// Largest amount storage can hold: sixteen integer digits and two decimals.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_808_348_671, 232_830_643, 0, false, 2);

/// A recurring charge attached to a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    name: String,
    /// Full-month charge.
    value: Decimal,
}

impl Service {
    pub fn new(name: String, value: Decimal) -> Result<Self, DomainError> {
        if value < Decimal::ZERO {
            return Err(DomainError::invalid_input(format!(
                "Service '{}' has a negative value: {}",
                name, value
            )));
        }
        if value > MAX_AMOUNT {
            return Err(DomainError::invalid_input(format!(
                "Service '{}' value {} exceeds the maximum of {}",
                name, value, MAX_AMOUNT
            )));
        }
        if value.round_dp(CURRENCY_SCALE) != value {
            return Err(DomainError::invalid_input(format!(
                "Service '{}' value {} has more than {} decimal places",
                name, value, CURRENCY_SCALE
            )));
        }

        let mut value = value;
        value.rescale(CURRENCY_SCALE);
        Ok(Self { name, value })
    }

    /// Reconstitutes from persisted data (used by adapters).
    pub fn reconstitute(name: String, value: Decimal) -> Self {
        Self { name, value }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Decimal {
        self.value
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    id: String,
    customer_id: String,
    contract_number: String,
    /// First billable day, inclusive.
    start_date: NaiveDate,
    /// Last billable day, inclusive.
    end_date: NaiveDate,
    services: Vec<Service>,
}

impl Contract {
    /// Builds a contract from external input, rejecting inverted intervals.
    pub fn new(
        id: String,
        customer_id: String,
        contract_number: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        services: Vec<Service>,
    ) -> Result<Self, DomainError> {
        if id.trim().is_empty() {
            return Err(DomainError::invalid_input("Contract id must not be empty"));
        }
        if start_date > end_date {
            return Err(DomainError::invalid_input(format!(
                "Contract {} starts on {} after it ends on {}",
                contract_number, start_date, end_date
            )));
        }
        let monthly_value = services
            .iter()
            .try_fold(Decimal::ZERO, |sum, s| sum.checked_add(s.value()))
            .filter(|total| *total <= MAX_AMOUNT);
        if monthly_value.is_none() {
            return Err(DomainError::invalid_input(format!(
                "Contract {} services add up to more than {} a month",
                contract_number, MAX_AMOUNT
            )));
        }

        Ok(Self {
            id,
            customer_id,
            contract_number,
            start_date,
            end_date,
            services,
        })
    }

    /// Reconstitutes from persisted data (used by adapters).
    pub fn reconstitute(
        id: String,
        customer_id: String,
        contract_number: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        services: Vec<Service>,
    ) -> Self {
        Self {
            id,
            customer_id,
            contract_number,
            start_date,
            end_date,
            services,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn contract_number(&self) -> &str {
        &self.contract_number
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// The last day that can be billed as of `today`.
    pub fn effective_end(&self, today: NaiveDate) -> NaiveDate {
        self.end_date.min(today)
    }

    /// Whether any day of the contract has elapsed as of `today`.
    pub fn has_started(&self, today: NaiveDate) -> bool {
        self.effective_end(today) >= self.start_date
    }

    /// Sum of all full-month service values.
    pub fn monthly_value(&self) -> Decimal {
        self.services.iter().map(Service::value).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_contract_rejects_inverted_interval() {
        let err = Contract::new(
            "c-1".to_string(),
            "cust-1".to_string(),
            "C123".to_string(),
            date(2025, 12, 31),
            date(2025, 1, 1),
            vec![],
        )
        .unwrap_err();

        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn test_single_day_contract_is_valid() {
        let contract = Contract::new(
            "c-1".to_string(),
            "cust-1".to_string(),
            "C123".to_string(),
            date(2025, 1, 1),
            date(2025, 1, 1),
            vec![],
        )
        .unwrap();

        assert!(contract.has_started(date(2025, 1, 1)));
        assert!(!contract.has_started(date(2024, 12, 31)));
    }

    #[test]
    fn test_effective_end_is_capped_by_today() {
        let contract = Contract::new(
            "c-1".to_string(),
            "cust-1".to_string(),
            "C123".to_string(),
            date(2024, 1, 15),
            date(2024, 4, 30),
            vec![],
        )
        .unwrap();

        assert_eq!(contract.effective_end(date(2024, 3, 15)), date(2024, 3, 15));
        assert_eq!(contract.effective_end(date(2025, 1, 1)), date(2024, 4, 30));
    }

    #[test]
    fn test_service_value_is_scaled_to_cents() {
        let service = Service::new("Hosting".to_string(), dec("31")).unwrap();
        assert_eq!(service.value().to_string(), "31.00");

        let service = Service::new("Hosting".to_string(), dec("99.9")).unwrap();
        assert_eq!(service.value().to_string(), "99.90");
    }

    #[test]
    fn test_service_rejects_negative_and_sub_cent_values() {
        assert!(Service::new("S".to_string(), dec("-1.00")).is_err());
        assert!(Service::new("S".to_string(), dec("1.005")).is_err());
        assert!(Service::new("S".to_string(), dec("0")).is_ok());
    }

    #[test]
    fn test_service_rejects_values_beyond_storage_range() {
        assert_eq!(MAX_AMOUNT, dec("9999999999999999.99"));
        assert!(Service::new("S".to_string(), dec("9999999999999999.99")).is_ok());

        let err = Service::new("S".to_string(), dec("10000000000000000.00")).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn test_contract_rejects_monthly_total_beyond_storage_range() {
        let half = dec("5000000000000000.00");
        let services = vec![
            Service::new("A".to_string(), half).unwrap(),
            Service::new("B".to_string(), half).unwrap(),
        ];
        let err = Contract::new(
            "c-1".to_string(),
            "cust-1".to_string(),
            "C123".to_string(),
            date(2024, 1, 1),
            date(2024, 12, 31),
            services,
        )
        .unwrap_err();

        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn test_monthly_value_sums_services() {
        let contract = Contract::new(
            "c-1".to_string(),
            "cust-1".to_string(),
            "A1".to_string(),
            date(2025, 1, 1),
            date(2025, 12, 31),
            vec![
                Service::new("S1".to_string(), dec("1.00")).unwrap(),
                Service::new("S2".to_string(), dec("2.50")).unwrap(),
            ],
        )
        .unwrap();

        assert_eq!(contract.monthly_value(), dec("3.50"));
        assert_eq!(contract.services().len(), 2);
    }
}
