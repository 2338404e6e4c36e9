pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;

pub use config::AppConfig;
pub use db::{open_store, CsvStore, PgStore, RecordStore};
pub use error::BillingError;
pub use service::BillingService;
