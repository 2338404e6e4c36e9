pub mod handlers;

pub use handlers::*;

use crate::service::BillingService;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

/// 构建路由
pub fn router(service: Arc<BillingService>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/clients", get(list_clients))
        .route("/api/clients/:client_id", get(get_client))
        .route("/api/clients/:client_id/invoices", get(list_client_invoices))
        .route("/api/create-client", post(create_client))
        .route("/api/data", get(list_invoices))
        .route("/api/create-invoice", post(create_invoice))
        .route("/api/update-invoice", put(update_invoice))
        .route("/api/tax-rates", get(tax_rates))
        .route("/api/summary", get(summary))
        .route("/api/export/billing-records.csv", get(export_invoices))
        .with_state(service)
}
