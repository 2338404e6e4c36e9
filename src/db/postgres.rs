use crate::db::store::{RecordStore, FIRST_INVOICE_ID};
use crate::error::BillingError;
use crate::models::{BillingRecord, Client, InvoiceChanges, NewBillingRecord, TaxRate};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use sqlx::PgPool;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// 建表语句 (幂等，仅保证空库可用；不做版本化迁移)
fn schema_statements() -> [String; 6] {
    [
        r#"
        CREATE TABLE IF NOT EXISTS clients (
            client_id     BIGINT PRIMARY KEY,
            business_name TEXT NOT NULL,
            contact_name  TEXT NOT NULL,
            phone_number  TEXT NOT NULL,
            email         TEXT NOT NULL,
            address       TEXT NOT NULL DEFAULT '',
            state         TEXT NOT NULL,
            zipcode       TEXT NOT NULL DEFAULT '',
            notes         TEXT NOT NULL DEFAULT '',
            industry      TEXT NOT NULL DEFAULT '',
            created_date  DATE NOT NULL
        )
        "#
        .to_string(),
        "CREATE UNIQUE INDEX IF NOT EXISTS clients_email_key ON clients (lower(email))".to_string(),
        format!(
            "CREATE SEQUENCE IF NOT EXISTS billing_records_invoice_id_seq START WITH {FIRST_INVOICE_ID}"
        ),
        r#"
        CREATE TABLE IF NOT EXISTS billing_records (
            invoice_id       BIGINT PRIMARY KEY DEFAULT nextval('billing_records_invoice_id_seq'),
            client_id        BIGINT NOT NULL REFERENCES clients (client_id),
            business_name    TEXT NOT NULL,
            service          TEXT NOT NULL,
            amount_usd       NUMERIC NOT NULL,
            tax_rate         NUMERIC NOT NULL,
            discount_percent NUMERIC NOT NULL,
            status           TEXT NOT NULL,
            date_updated     DATE NOT NULL,
            time_updated     TIME NOT NULL,
            tax_amount       NUMERIC NOT NULL,
            discount_amount  NUMERIC NOT NULL,
            final_total      NUMERIC NOT NULL,
            notes            TEXT
        )
        "#
        .to_string(),
        "CREATE INDEX IF NOT EXISTS billing_records_client_id_idx ON billing_records (client_id)"
            .to_string(),
        r#"
        CREATE TABLE IF NOT EXISTS tax_rates (
            state TEXT PRIMARY KEY,
            rate  NUMERIC NOT NULL
        )
        "#
        .to_string(),
    ]
}

const CLIENT_COLUMNS: &str = "client_id, business_name, contact_name, phone_number, email, \
     address, state, zipcode, notes, industry, created_date";

const INVOICE_COLUMNS: &str = "invoice_id, client_id, business_name, service, amount_usd, \
     tax_rate, discount_percent, status, date_updated, time_updated, \
     tax_amount, discount_amount, final_total, notes";

/// PostgreSQL 存储
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 创建缺失的表与索引
    pub async fn ensure_schema(&self) -> Result<(), BillingError> {
        for statement in schema_statements() {
            sqlx::query(&statement).execute(&self.pool).await?;
        }
        tracing::info!("Database schema ready");
        Ok(())
    }
}

/// 取出数据库错误码与约束名
fn db_violation(err: &sqlx::Error) -> Option<(String, Option<String>)> {
    match err {
        sqlx::Error::Database(db) => db
            .code()
            .map(|code| (code.into_owned(), db.constraint().map(str::to_string))),
        _ => None,
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn list_clients(&self) -> Result<Vec<Client>, BillingError> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients ORDER BY client_id");
        Ok(sqlx::query_as::<_, Client>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_client(&self, client_id: i64) -> Result<Option<Client>, BillingError> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE client_id = $1");
        Ok(sqlx::query_as::<_, Client>(&sql)
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_client(&self, client: &Client) -> Result<(), BillingError> {
        let sql = format!(
            "INSERT INTO clients ({CLIENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        );
        let result = sqlx::query(&sql)
            .bind(client.client_id)
            .bind(&client.business_name)
            .bind(&client.contact_name)
            .bind(&client.phone_number)
            .bind(&client.email)
            .bind(&client.address)
            .bind(&client.state)
            .bind(&client.zipcode)
            .bind(&client.notes)
            .bind(&client.industry)
            .bind(client.created_date)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => match db_violation(&err) {
                Some((code, constraint)) if code == UNIQUE_VIOLATION => {
                    if constraint.as_deref() == Some("clients_email_key") {
                        Err(BillingError::DuplicateKey {
                            field: "email",
                            value: client.email.clone(),
                        })
                    } else {
                        Err(BillingError::DuplicateKey {
                            field: "clientID",
                            value: client.client_id.to_string(),
                        })
                    }
                }
                _ => Err(err.into()),
            },
        }
    }

    async fn list_invoices(&self) -> Result<Vec<BillingRecord>, BillingError> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM billing_records ORDER BY invoice_id");
        Ok(sqlx::query_as::<_, BillingRecord>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_invoices_for_client(
        &self,
        client_id: i64,
    ) -> Result<Vec<BillingRecord>, BillingError> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM billing_records WHERE client_id = $1 ORDER BY invoice_id"
        );
        Ok(sqlx::query_as::<_, BillingRecord>(&sql)
            .bind(client_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert_invoice(
        &self,
        record: &NewBillingRecord,
    ) -> Result<BillingRecord, BillingError> {
        // 单条 INSERT: 外键保证客户存在，失败时不落任何数据
        let sql = format!(
            "INSERT INTO billing_records (
                client_id, business_name, service, amount_usd, tax_rate, discount_percent,
                status, date_updated, time_updated, tax_amount, discount_amount, final_total, notes
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING {INVOICE_COLUMNS}"
        );
        let result = sqlx::query_as::<_, BillingRecord>(&sql)
            .bind(record.client_id)
            .bind(&record.business_name)
            .bind(&record.service)
            .bind(&record.amount_usd)
            .bind(&record.tax_rate)
            .bind(&record.discount_percent)
            .bind(&record.status)
            .bind(record.date_updated)
            .bind(record.time_updated)
            .bind(&record.tax_amount)
            .bind(&record.discount_amount)
            .bind(&record.final_total)
            .bind(&record.notes)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(created) => Ok(created),
            Err(err) => match db_violation(&err) {
                Some((code, _)) if code == FOREIGN_KEY_VIOLATION => {
                    Err(BillingError::client_not_found(record.client_id))
                }
                _ => Err(err.into()),
            },
        }
    }

    async fn update_invoice(
        &self,
        invoice_id: i64,
        changes: &InvoiceChanges,
    ) -> Result<BillingRecord, BillingError> {
        // 单条 UPDATE 整行覆盖，并发更新时后写者整体生效
        let sql = format!(
            "UPDATE billing_records SET
                service = $2, amount_usd = $3, tax_rate = $4, discount_percent = $5,
                status = $6, tax_amount = $7, discount_amount = $8, final_total = $9,
                notes = COALESCE($10, notes), date_updated = $11, time_updated = $12
             WHERE invoice_id = $1
             RETURNING {INVOICE_COLUMNS}"
        );
        sqlx::query_as::<_, BillingRecord>(&sql)
            .bind(invoice_id)
            .bind(&changes.service)
            .bind(&changes.amount_usd)
            .bind(&changes.tax_rate)
            .bind(&changes.discount_percent)
            .bind(&changes.status)
            .bind(&changes.tax_amount)
            .bind(&changes.discount_amount)
            .bind(&changes.final_total)
            .bind(&changes.notes)
            .bind(changes.date_updated)
            .bind(changes.time_updated)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| BillingError::invoice_not_found(invoice_id))
    }

    async fn get_tax_rate(&self, state: &str) -> Result<Option<BigDecimal>, BillingError> {
        Ok(
            sqlx::query_scalar::<_, BigDecimal>("SELECT rate FROM tax_rates WHERE upper(state) = $1")
                .bind(state)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_tax_rates(&self) -> Result<Vec<TaxRate>, BillingError> {
        Ok(sqlx::query_as::<_, TaxRate>(
            "SELECT upper(state) AS state, rate FROM tax_rates ORDER BY upper(state)",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}
