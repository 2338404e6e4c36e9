use crate::db::export_to_csv;
use crate::error::BillingError;
use crate::models::{
    BillingRecord, Client, InvoiceUpdateRequest, NewClientRequest, NewInvoiceRequest,
    TaxRateQuery,
};
use crate::service::BillingService;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Json, Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

/// 创建客户响应
#[derive(Debug, Serialize)]
pub struct CreateClientResponse {
    pub message: String,
    #[serde(rename = "clientID")]
    pub client_id: i64,
    pub client: Client,
}

/// 创建 / 更新账单响应
#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub message: String,
    #[serde(rename = "invoiceID")]
    pub invoice_id: i64,
    pub invoice: BillingRecord,
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /api/clients
pub async fn list_clients(
    State(service): State<Arc<BillingService>>,
) -> Result<Json<Vec<Client>>, BillingError> {
    Ok(Json(service.list_clients().await?))
}

/// GET /api/clients/:client_id
pub async fn get_client(
    State(service): State<Arc<BillingService>>,
    client_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Client>, BillingError> {
    let Path(client_id) = client_id?;
    service
        .get_client(client_id)
        .await?
        .map(Json)
        .ok_or_else(|| BillingError::client_not_found(client_id))
}

/// GET /api/clients/:client_id/invoices
pub async fn list_client_invoices(
    State(service): State<Arc<BillingService>>,
    client_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<BillingRecord>>, BillingError> {
    let Path(client_id) = client_id?;
    Ok(Json(service.list_client_invoices(client_id).await?))
}

/// POST /api/create-client
pub async fn create_client(
    State(service): State<Arc<BillingService>>,
    payload: Result<Json<NewClientRequest>, JsonRejection>,
) -> Result<Response, BillingError> {
    let Json(req) = payload?;
    let client = service.create_client(req).await?;
    let response = CreateClientResponse {
        message: "Client created successfully".to_string(),
        client_id: client.client_id,
        client,
    };
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// GET /api/data
pub async fn list_invoices(
    State(service): State<Arc<BillingService>>,
) -> Result<Json<Vec<BillingRecord>>, BillingError> {
    Ok(Json(service.list_invoices().await?))
}

/// POST /api/create-invoice
pub async fn create_invoice(
    State(service): State<Arc<BillingService>>,
    payload: Result<Json<NewInvoiceRequest>, JsonRejection>,
) -> Result<Response, BillingError> {
    let Json(req) = payload?;
    let invoice = service.create_invoice(req).await?;
    let response = InvoiceResponse {
        message: "Invoice created successfully".to_string(),
        invoice_id: invoice.invoice_id,
        invoice,
    };
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// PUT /api/update-invoice
pub async fn update_invoice(
    State(service): State<Arc<BillingService>>,
    payload: Result<Json<InvoiceUpdateRequest>, JsonRejection>,
) -> Result<Response, BillingError> {
    let Json(req) = payload?;
    let invoice = service.update_invoice(req).await?;
    let response = InvoiceResponse {
        message: "Invoice updated successfully".to_string(),
        invoice_id: invoice.invoice_id,
        invoice,
    };
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// GET /api/tax-rates[?state=XX]
///
/// 指定 state 时返回单个税率 (未配置的州返回默认税率)，否则返回全部。
pub async fn tax_rates(
    State(service): State<Arc<BillingService>>,
    query: Result<Query<TaxRateQuery>, QueryRejection>,
) -> Result<Response, BillingError> {
    let Query(query) = query?;
    match query.state.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(state) => Ok(Json(service.tax_rate_for(state).await?).into_response()),
        None => Ok(Json(service.list_tax_rates().await?).into_response()),
    }
}

/// GET /api/summary
pub async fn summary(State(service): State<Arc<BillingService>>) -> Result<Response, BillingError> {
    Ok(Json(service.summarize().await?).into_response())
}

/// GET /api/export/billing-records.csv
pub async fn export_invoices(
    State(service): State<Arc<BillingService>>,
) -> Result<Response, BillingError> {
    let records = service.list_invoices().await?;
    let body = export_to_csv(&records, Vec::new())?;
    tracing::info!("Exported {} billing records", records.len());
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"billing_records.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}
