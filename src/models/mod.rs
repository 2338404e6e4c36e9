pub mod amount;
pub mod client;
pub mod invoice;
pub mod request;
pub mod tax_rate;

pub use client::Client;
pub use invoice::{
    BillingRecord, InvoiceChanges, NewBillingRecord, StatusTotal, BILLING_COLUMNS,
    STATUS_OVERDUE, STATUS_PAID, STATUS_PENDING,
};
pub use request::{InvoiceUpdateRequest, NewClientRequest, NewInvoiceRequest, TaxRateQuery};
pub use tax_rate::TaxRate;
