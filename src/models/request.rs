use serde::Deserialize;
use serde_json::Value;

// 请求体字段全部可选: 缺失字段由 service 层统一收集后报告。
// 数字字段保留为 Value，兼容表单提交的字符串 ("500")。

/// POST /api/create-client
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClientRequest {
    #[serde(rename = "clientID")]
    pub client_id: Option<Value>,
    pub business_name: Option<String>,
    pub contact_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub notes: Option<String>,
    pub industry: Option<String>,
}

/// POST /api/create-invoice
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoiceRequest {
    #[serde(rename = "clientID")]
    pub client_id: Option<Value>,
    pub service: Option<String>,
    #[serde(rename = "amountUSD")]
    pub amount_usd: Option<Value>,
    pub tax_rate: Option<Value>,
    pub discount_percent: Option<Value>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// PUT /api/update-invoice
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceUpdateRequest {
    #[serde(rename = "invoiceID")]
    pub invoice_id: Option<Value>,
    pub service: Option<String>,
    #[serde(rename = "amountUSD")]
    pub amount_usd: Option<Value>,
    pub tax_rate: Option<Value>,
    pub discount_percent: Option<Value>,
    pub status: Option<String>,
    pub tax_amount: Option<Value>,
    pub discount_amount: Option<Value>,
    pub final_total: Option<Value>,
    pub notes: Option<String>,
}

/// GET /api/tax-rates?state=XX
#[derive(Debug, Default, Deserialize)]
pub struct TaxRateQuery {
    pub state: Option<String>,
}
