use crate::db::RecordStore;
use crate::error::BillingError;
use crate::models::{
    BillingRecord, Client, InvoiceChanges, InvoiceUpdateRequest, NewBillingRecord,
    NewClientRequest, NewInvoiceRequest, StatusTotal, TaxRate, STATUS_OVERDUE, STATUS_PAID,
    STATUS_PENDING,
};
use crate::service::calculator::{self, round_half_up};
use crate::service::fields;
use bigdecimal::{BigDecimal, Zero};
use chrono::{Local, NaiveDate, NaiveTime, Timelike};
use indexmap::IndexMap;
use std::sync::Arc;

/// 当前本地日期与时间 (精确到秒)
fn now_stamp() -> (NaiveDate, NaiveTime) {
    let now = Local::now().naive_local();
    let time = now.time().with_nanosecond(0).unwrap_or_else(|| now.time());
    (now.date(), time)
}

/// 账单服务: 客户 / 账单 / 税率三类操作的校验与编排
pub struct BillingService {
    store: Arc<dyn RecordStore>,
    default_tax_rate: BigDecimal,
}

impl BillingService {
    pub fn new(store: Arc<dyn RecordStore>, default_tax_rate: BigDecimal) -> Self {
        Self {
            store,
            default_tax_rate,
        }
    }

    // ------------------------------------------------------------------
    // 客户
    // ------------------------------------------------------------------

    pub async fn list_clients(&self) -> Result<Vec<Client>, BillingError> {
        self.store.list_clients().await
    }

    /// 查询客户；不存在返回 None
    pub async fn get_client(&self, client_id: i64) -> Result<Option<Client>, BillingError> {
        self.store.get_client(client_id).await
    }

    /// 创建客户
    ///
    /// 一次性报告全部缺失的必填字段；clientID / email 重复时返回 DuplicateKey。
    pub async fn create_client(&self, req: NewClientRequest) -> Result<Client, BillingError> {
        let business_name = fields::text(&req.business_name);
        let contact_name = fields::text(&req.contact_name);
        let phone_number = fields::text(&req.phone_number);
        let email = fields::text(&req.email);
        let state = fields::text(&req.state);

        let missing = fields::missing([
            ("clientID", fields::is_blank(&req.client_id)),
            ("businessName", business_name.is_none()),
            ("contactName", contact_name.is_none()),
            ("phoneNumber", phone_number.is_none()),
            ("email", email.is_none()),
            ("state", state.is_none()),
        ]);
        if !missing.is_empty() {
            return Err(BillingError::MissingField(missing));
        }

        let client_id = match &req.client_id {
            Some(value) => fields::integer("clientID", value)?,
            None => return Err(BillingError::MissingField(vec!["clientID".to_string()])),
        };

        let client = Client {
            client_id,
            business_name: business_name.unwrap_or_default(),
            contact_name: contact_name.unwrap_or_default(),
            phone_number: phone_number.unwrap_or_default(),
            email: email.unwrap_or_default(),
            address: fields::text(&req.address).unwrap_or_default(),
            state: state.unwrap_or_default().to_ascii_uppercase(),
            zipcode: fields::text(&req.zipcode).unwrap_or_default(),
            notes: fields::text(&req.notes).unwrap_or_default(),
            industry: fields::text(&req.industry).unwrap_or_default(),
            created_date: Local::now().date_naive(),
        };

        self.store.insert_client(&client).await?;
        tracing::info!("Created client {} ({})", client.client_id, client.business_name);
        Ok(client)
    }

    // ------------------------------------------------------------------
    // 税率
    // ------------------------------------------------------------------

    /// 查询州税率，未配置时返回默认税率
    pub async fn tax_rate_for(&self, state: &str) -> Result<TaxRate, BillingError> {
        let state = state.trim().to_ascii_uppercase();
        let rate = match self.store.get_tax_rate(&state).await? {
            Some(rate) => rate,
            None => {
                tracing::debug!("No tax rate for state {:?}, using default", state);
                self.default_tax_rate.clone()
            }
        };
        Ok(TaxRate { state, rate })
    }

    pub async fn list_tax_rates(&self) -> Result<Vec<TaxRate>, BillingError> {
        self.store.list_tax_rates().await
    }

    // ------------------------------------------------------------------
    // 账单
    // ------------------------------------------------------------------

    pub async fn list_invoices(&self) -> Result<Vec<BillingRecord>, BillingError> {
        self.store.list_invoices().await
    }

    /// 客户名下的账单；客户不存在返回 NotFound
    pub async fn list_client_invoices(
        &self,
        client_id: i64,
    ) -> Result<Vec<BillingRecord>, BillingError> {
        if self.store.get_client(client_id).await?.is_none() {
            return Err(BillingError::client_not_found(client_id));
        }
        self.store.list_invoices_for_client(client_id).await
    }

    /// 创建账单
    ///
    /// 派生金额由服务端计算；请求未提供 taxRate 时按客户所在州查税率表。
    pub async fn create_invoice(
        &self,
        req: NewInvoiceRequest,
    ) -> Result<BillingRecord, BillingError> {
        let service = fields::text(&req.service);
        let missing = fields::missing([
            ("clientID", fields::is_blank(&req.client_id)),
            ("service", service.is_none()),
            ("amountUSD", fields::is_blank(&req.amount_usd)),
        ]);
        if !missing.is_empty() {
            return Err(BillingError::MissingField(missing));
        }

        let client_id = match &req.client_id {
            Some(value) => fields::integer("clientID", value)?,
            None => return Err(BillingError::MissingField(vec!["clientID".to_string()])),
        };
        let amount_usd = fields::optional_decimal("amountUSD", &req.amount_usd)?
            .ok_or_else(|| BillingError::MissingField(vec!["amountUSD".to_string()]))?;
        if amount_usd <= BigDecimal::zero() {
            return Err(BillingError::invalid(
                "amountUSD",
                format!("must be greater than 0, got {amount_usd}"),
            ));
        }
        let requested_rate = fields::optional_decimal("taxRate", &req.tax_rate)?;
        let discount_percent =
            fields::optional_decimal("discountPercent", &req.discount_percent)?
                .unwrap_or_else(BigDecimal::zero);

        let client = self
            .store
            .get_client(client_id)
            .await?
            .ok_or_else(|| BillingError::client_not_found(client_id))?;

        let tax_rate = match requested_rate {
            Some(rate) => rate,
            None => self.tax_rate_for(&client.state).await?.rate,
        };

        let totals = calculator::calculate(&amount_usd, &tax_rate, &discount_percent)?;
        let (date_updated, time_updated) = now_stamp();

        let draft = NewBillingRecord {
            client_id,
            business_name: client.business_name,
            service: service.unwrap_or_default(),
            amount_usd,
            tax_rate,
            discount_percent,
            status: fields::text(&req.status).unwrap_or_else(|| STATUS_PENDING.to_string()),
            date_updated,
            time_updated,
            tax_amount: totals.tax_amount,
            discount_amount: totals.discount_amount,
            final_total: totals.final_total,
            notes: fields::text(&req.notes),
        };

        let created = self.store.insert_invoice(&draft).await?;
        tracing::info!(
            "Created invoice {} for client {}: final total {}",
            created.invoice_id,
            created.client_id,
            created.final_total
        );
        Ok(created)
    }

    /// 更新账单
    ///
    /// 所有业务字段必须齐全；taxAmount / discountAmount / finalTotal 按调用方提交的值
    /// 原样保存，不根据金额和税率重算。
    pub async fn update_invoice(
        &self,
        req: InvoiceUpdateRequest,
    ) -> Result<BillingRecord, BillingError> {
        let service = fields::text(&req.service);
        let status = fields::text(&req.status);

        let missing = fields::missing([
            ("invoiceID", fields::is_blank(&req.invoice_id)),
            ("service", service.is_none()),
            ("amountUSD", fields::is_blank(&req.amount_usd)),
            ("taxRate", fields::is_blank(&req.tax_rate)),
            ("discountPercent", fields::is_blank(&req.discount_percent)),
            ("status", status.is_none()),
            ("taxAmount", fields::is_blank(&req.tax_amount)),
            ("discountAmount", fields::is_blank(&req.discount_amount)),
            ("finalTotal", fields::is_blank(&req.final_total)),
        ]);
        if !missing.is_empty() {
            return Err(BillingError::MissingField(missing));
        }

        let invoice_id = match &req.invoice_id {
            Some(value) => fields::integer("invoiceID", value)?,
            None => return Err(BillingError::MissingField(vec!["invoiceID".to_string()])),
        };
        let required = |field: &str,
                        value: &Option<serde_json::Value>|
         -> Result<BigDecimal, BillingError> {
            fields::optional_decimal(field, value)?
                .ok_or_else(|| BillingError::MissingField(vec![field.to_string()]))
        };

        let amount_usd = required("amountUSD", &req.amount_usd)?;
        let tax_rate = required("taxRate", &req.tax_rate)?;
        let discount_percent = required("discountPercent", &req.discount_percent)?;
        if amount_usd <= BigDecimal::zero() {
            return Err(BillingError::invalid(
                "amountUSD",
                format!("must be greater than 0, got {amount_usd}"),
            ));
        }
        for (field, value) in [("taxRate", &tax_rate), ("discountPercent", &discount_percent)] {
            if value < &BigDecimal::zero() {
                return Err(BillingError::invalid(field, format!("must not be negative, got {value}")));
            }
        }

        let (date_updated, time_updated) = now_stamp();
        let changes = InvoiceChanges {
            service: service.unwrap_or_default(),
            amount_usd,
            tax_rate,
            discount_percent,
            status: status.unwrap_or_default(),
            tax_amount: required("taxAmount", &req.tax_amount)?,
            discount_amount: required("discountAmount", &req.discount_amount)?,
            final_total: required("finalTotal", &req.final_total)?,
            notes: req.notes.clone(),
            date_updated,
            time_updated,
        };

        let updated = self.store.update_invoice(invoice_id, &changes).await?;
        tracing::info!("Updated invoice {} (status {})", updated.invoice_id, updated.status);
        Ok(updated)
    }

    /// 按状态汇总 finalTotal (Paid / Pending / Overdue 固定在前，其他状态按出现顺序)
    pub async fn summarize(&self) -> Result<IndexMap<String, StatusTotal>, BillingError> {
        let mut summary: IndexMap<String, StatusTotal> = [STATUS_PAID, STATUS_PENDING, STATUS_OVERDUE]
            .into_iter()
            .map(|status| {
                (
                    status.to_string(),
                    StatusTotal {
                        count: 0,
                        total: BigDecimal::zero(),
                    },
                )
            })
            .collect();

        for record in self.store.list_invoices().await? {
            let entry = summary.entry(record.status.clone()).or_insert_with(|| StatusTotal {
                count: 0,
                total: BigDecimal::zero(),
            });
            entry.count += 1;
            entry.total = &entry.total + &record.final_total;
        }

        for entry in summary.values_mut() {
            entry.total = round_half_up(&entry.total);
        }
        Ok(summary)
    }
}
