pub mod billing;
pub mod calculator;
pub mod fields;

pub use billing::BillingService;
pub use calculator::{calculate, round_half_up, InvoiceTotals};
