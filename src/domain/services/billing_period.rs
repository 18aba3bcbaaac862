use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::domain::{Contract, DomainError, ReferenceMonth};

/// Iterator over consecutive calendar months, both ends inclusive.
#[derive(Debug, Clone)]
pub struct MonthRange {
    next: Option<ReferenceMonth>,
    last: ReferenceMonth,
}

impl MonthRange {
    pub fn new(first: ReferenceMonth, last: ReferenceMonth) -> Self {
        Self {
            next: (first <= last).then_some(first),
            last,
        }
    }
}

impl Iterator for MonthRange {
    type Item = ReferenceMonth;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = (current < self.last).then(|| current.next());
        Some(current)
    }
}

/// Every month a contract running `start_date..=end_date` can be billed for
/// as of `today`: from the month of `start_date` through the month of
/// `min(end_date, today)`. Empty when the contract has not started yet.
pub fn months_to_bill(start_date: NaiveDate, end_date: NaiveDate, today: NaiveDate) -> MonthRange {
    let effective_end = end_date.min(today);
    let first = ReferenceMonth::containing(start_date);
    if effective_end < start_date {
        return MonthRange {
            next: None,
            last: first,
        };
    }
    MonthRange::new(first, ReferenceMonth::containing(effective_end))
}

/// Candidate months minus the months already invoiced, in calendar order.
pub fn pending_months(
    candidates: impl IntoIterator<Item = ReferenceMonth>,
    billed: &BTreeSet<ReferenceMonth>,
) -> Vec<ReferenceMonth> {
    candidates
        .into_iter()
        .filter(|month| !billed.contains(month))
        .collect()
}

/// The slice of a calendar month a contract is charged for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPeriod {
    reference: ReferenceMonth,
    charge_start: NaiveDate,
    charge_end: NaiveDate,
}

impl BillingPeriod {
    /// Clamps `month` to the contract term.
    ///
    /// `today` only decides which months are due; a month that is due is
    /// charged for every day of it the contract covers. Fails with
    /// `BillingInvariant` when the month does not overlap the term at all.
    pub fn for_contract(contract: &Contract, month: ReferenceMonth) -> Result<Self, DomainError> {
        let charge_start = contract.start_date().max(month.first_day());
        let charge_end = contract.end_date().min(month.last_day());

        if charge_start > charge_end {
            return Err(DomainError::billing_invariant(format!(
                "Month {} is outside the term of contract {}",
                month,
                contract.id()
            )));
        }

        Ok(Self {
            reference: month,
            charge_start,
            charge_end,
        })
    }

    pub fn reference(&self) -> ReferenceMonth {
        self.reference
    }

    pub fn month_start(&self) -> NaiveDate {
        self.reference.first_day()
    }

    pub fn month_end(&self) -> NaiveDate {
        self.reference.last_day()
    }

    pub fn days_in_month(&self) -> u32 {
        self.reference.days_in_month()
    }

    pub fn charge_start(&self) -> NaiveDate {
        self.charge_start
    }

    pub fn charge_end(&self) -> NaiveDate {
        self.charge_end
    }

    pub fn active_days(&self) -> i64 {
        (self.charge_end - self.charge_start).num_days() + 1
    }

    pub fn is_full_month(&self) -> bool {
        self.charge_start == self.month_start() && self.charge_end == self.month_end()
    }
}
