use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 默认发票状态
pub const STATUS_PENDING: &str = "Pending";
pub const STATUS_PAID: &str = "Paid";
pub const STATUS_OVERDUE: &str = "Overdue";

/// billing_records.csv / 导出文件的列顺序 (与 BillingRecord 字段顺序一致)
pub const BILLING_COLUMNS: [&str; 14] = [
    "invoiceID",
    "clientID",
    "businessName",
    "service",
    "amountUSD",
    "taxRate",
    "discountPercent",
    "status",
    "dateUpdated",
    "timeUpdated",
    "taxAmount",
    "discountAmount",
    "finalTotal",
    "notes",
];

/// 账单记录 (billing_records 表)
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingRecord {
    #[serde(rename = "invoiceID")]
    pub invoice_id: i64,
    #[serde(rename = "clientID")]
    pub client_id: i64,
    pub business_name: String, // 创建时客户名称的快照
    pub service: String,
    #[serde(rename = "amountUSD", with = "crate::models::amount")]
    pub amount_usd: BigDecimal,
    #[serde(with = "crate::models::amount")]
    pub tax_rate: BigDecimal,
    #[serde(with = "crate::models::amount")]
    pub discount_percent: BigDecimal,
    pub status: String,
    pub date_updated: NaiveDate,
    pub time_updated: NaiveTime,
    #[serde(with = "crate::models::amount")]
    pub tax_amount: BigDecimal,
    #[serde(with = "crate::models::amount")]
    pub discount_amount: BigDecimal,
    #[serde(with = "crate::models::amount")]
    pub final_total: BigDecimal,
    #[serde(default)]
    pub notes: Option<String>,
}

/// 待插入的账单 (invoice_id 由存储层分配)
#[derive(Debug, Clone)]
pub struct NewBillingRecord {
    pub client_id: i64,
    pub business_name: String,
    pub service: String,
    pub amount_usd: BigDecimal,
    pub tax_rate: BigDecimal,
    pub discount_percent: BigDecimal,
    pub status: String,
    pub date_updated: NaiveDate,
    pub time_updated: NaiveTime,
    pub tax_amount: BigDecimal,
    pub discount_amount: BigDecimal,
    pub final_total: BigDecimal,
    pub notes: Option<String>,
}

impl NewBillingRecord {
    pub fn into_record(self, invoice_id: i64) -> BillingRecord {
        BillingRecord {
            invoice_id,
            client_id: self.client_id,
            business_name: self.business_name,
            service: self.service,
            amount_usd: self.amount_usd,
            tax_rate: self.tax_rate,
            discount_percent: self.discount_percent,
            status: self.status,
            date_updated: self.date_updated,
            time_updated: self.time_updated,
            tax_amount: self.tax_amount,
            discount_amount: self.discount_amount,
            final_total: self.final_total,
            notes: self.notes,
        }
    }
}

/// 更新账单时整体写入的字段 (派生金额由调用方提供，不重算)
#[derive(Debug, Clone)]
pub struct InvoiceChanges {
    pub service: String,
    pub amount_usd: BigDecimal,
    pub tax_rate: BigDecimal,
    pub discount_percent: BigDecimal,
    pub status: String,
    pub tax_amount: BigDecimal,
    pub discount_amount: BigDecimal,
    pub final_total: BigDecimal,
    pub notes: Option<String>, // None 表示保留原备注
    pub date_updated: NaiveDate,
    pub time_updated: NaiveTime,
}

impl InvoiceChanges {
    pub fn apply_to(&self, record: &mut BillingRecord) {
        record.service = self.service.clone();
        record.amount_usd = self.amount_usd.clone();
        record.tax_rate = self.tax_rate.clone();
        record.discount_percent = self.discount_percent.clone();
        record.status = self.status.clone();
        record.tax_amount = self.tax_amount.clone();
        record.discount_amount = self.discount_amount.clone();
        record.final_total = self.final_total.clone();
        if let Some(notes) = &self.notes {
            record.notes = Some(notes.clone());
        }
        record.date_updated = self.date_updated;
        record.time_updated = self.time_updated;
    }
}

/// 按状态汇总 (仪表盘)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusTotal {
    pub count: usize,
    #[serde(with = "crate::models::amount")]
    pub total: BigDecimal,
}
