mod billing_period;
mod proration;

pub use billing_period::*;
pub use proration::*;
