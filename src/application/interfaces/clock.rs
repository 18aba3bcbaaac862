use chrono::NaiveDate;

/// Source of "today" for a billing run.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}
