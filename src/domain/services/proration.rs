use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use super::BillingPeriod;
use crate::domain::{DomainError, CURRENCY_SCALE};

/// Rounding applied to prorated amounts.
///
/// Banker's rounding: a remainder of exactly half a cent goes to the even cent.
pub const PRORATION_ROUNDING: RoundingStrategy = RoundingStrategy::MidpointNearestEven;

/// Computes the charge for one service over the active part of a month.
///
/// A window covering the whole month returns `full_value` untouched. Any
/// narrower window is billed `full_value * active_days / days_in_month`,
/// rounded to cents with [`PRORATION_ROUNDING`].
pub fn prorate(
    full_value: Decimal,
    charge_start: NaiveDate,
    charge_end: NaiveDate,
    month_start: NaiveDate,
    month_end: NaiveDate,
    days_in_month: u32,
) -> Result<Decimal, DomainError> {
    if days_in_month == 0 {
        return Err(DomainError::billing_invariant("Proration over a month with zero days"));
    }
    if charge_start < month_start || charge_end > month_end {
        return Err(DomainError::billing_invariant(format!(
            "Charge window {}..{} lies outside month {}..{}",
            charge_start, charge_end, month_start, month_end
        )));
    }

    if charge_start == month_start && charge_end == month_end {
        return Ok(full_value);
    }

    let active_days = (charge_end - charge_start).num_days() + 1;
    if active_days < 1 || active_days > i64::from(days_in_month) {
        return Err(DomainError::billing_invariant(format!(
            "Active day count {} out of range 1..={} for window {}..{}",
            active_days, days_in_month, charge_start, charge_end
        )));
    }

    let amount = full_value * Decimal::from(active_days) / Decimal::from(days_in_month);
    Ok(amount.round_dp_with_strategy(CURRENCY_SCALE, PRORATION_ROUNDING))
}

impl BillingPeriod {
    /// Prorates `full_value` over this period's charge window.
    pub fn prorate(&self, full_value: Decimal) -> Result<Decimal, DomainError> {
        prorate(
            full_value,
            self.charge_start(),
            self.charge_end(),
            self.month_start(),
            self.month_end(),
            self.days_in_month(),
        )
    }
}
